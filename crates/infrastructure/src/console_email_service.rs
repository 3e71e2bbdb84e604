//! Development email delivery that writes messages to the log.

use async_trait::async_trait;
use feedesk_application::EmailService;
use feedesk_core::AppResult;
use tracing::info;

/// Email service for local development. Invitation links show up in the
/// API log instead of a mailbox.
#[derive(Clone, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates a new console email service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        _html_body: Option<&str>,
    ) -> AppResult<()> {
        info!(to, subject, "email (console)\n{text_body}");
        Ok(())
    }
}
