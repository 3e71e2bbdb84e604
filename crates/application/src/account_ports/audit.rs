use async_trait::async_trait;

use feedesk_core::AppResult;
use feedesk_domain::AuditAction;

/// Audit event payload appended by administrative use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Acting subject; `system` for unauthenticated flows.
    pub subject: String,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Resource type touched by the action.
    pub resource_type: String,
    /// Resource identifier touched by the action.
    pub resource_id: String,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

/// Repository port for audit event persistence.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends an audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
