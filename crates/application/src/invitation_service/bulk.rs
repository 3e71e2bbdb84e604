use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::*;

/// Per-row failure of a bulk import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkInvitationFailure {
    /// One-based row number in the submitted batch.
    pub row: usize,
    /// Email as submitted.
    pub email: String,
    /// User-facing reason.
    pub reason: String,
}

/// Tally of a bulk import. The batch always completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInvitationReport {
    /// Invitations issued, in row order.
    pub succeeded: Vec<Invitation>,
    /// Rows that failed, in row order.
    pub failed: Vec<BulkInvitationFailure>,
}

type RowOutcome = (usize, String, Result<Invitation, String>);

impl InvitationService {
    /// Issues invitations for many rows concurrently.
    ///
    /// Each row runs the department check of a single issue and delivers
    /// its email under its own timeout. A failing, slow or panicking row is
    /// reported, its stored invitation is retired and the rest of the batch
    /// carries on.
    pub async fn issue_bulk(
        &self,
        actor: &EffectiveUser,
        rows: Vec<NewInvitation>,
    ) -> AppResult<BulkInvitationReport> {
        actor.require(Capability::BulkInviteUsers, &AccessContext::unscoped())?;

        let semaphore = Arc::new(Semaphore::new(self.settings.bulk_concurrency.max(1)));
        let row_timeout = self.settings.bulk_row_timeout;
        let mut tasks = JoinSet::new();

        for (index, input) in rows.into_iter().enumerate() {
            let row = index + 1;
            let service = self.clone();
            let actor = actor.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let email = input.email.clone();
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (row, email, Err("batch was cancelled".to_owned()));
                };

                let (invitation, raw_token) = match service.create_pending(&actor, input).await {
                    Ok(created) => created,
                    Err(error) => return (row, email, Err(row_reason(&error))),
                };
                let invitation_id = invitation.id;

                let delivery = service.clone();
                let handle = tokio::spawn(async move {
                    delivery.deliver(&actor, invitation, &raw_token).await
                });
                let abort = handle.abort_handle();
                let outcome = match tokio::time::timeout(row_timeout, handle).await {
                    Ok(Ok(Ok(invitation))) => Ok(invitation),
                    Ok(Ok(Err(error))) => Err(row_reason(&error)),
                    Ok(Err(join_error)) => {
                        tracing::error!(row, error = %join_error, "bulk invitation row aborted");
                        service.retire_undelivered(invitation_id).await;
                        Err("row could not be processed".to_owned())
                    }
                    Err(_) => {
                        abort.abort();
                        service.retire_undelivered(invitation_id).await;
                        Err(format!("timed out after {}s", row_timeout.as_secs_f32()))
                    }
                };

                (row, email, outcome)
            });
        }

        let mut outcomes: Vec<RowOutcome> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => tracing::error!(%error, "bulk invitation worker failed"),
            }
        }
        outcomes.sort_by_key(|(row, _, _)| *row);

        let mut report = BulkInvitationReport::default();
        for (row, email, outcome) in outcomes {
            match outcome {
                Ok(invitation) => report.succeeded.push(invitation),
                Err(reason) => {
                    tracing::warn!(
                        row,
                        email = %email,
                        reason = %reason,
                        "bulk invitation row failed"
                    );
                    report.failed.push(BulkInvitationFailure { row, email, reason });
                }
            }
        }

        tracing::info!(
            subject = %actor.user_id(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "bulk invitation batch completed"
        );

        Ok(report)
    }
}

fn row_reason(error: &AppError) -> String {
    match error {
        AppError::Account(account) => account.to_string(),
        AppError::Validation(message) => message.clone(),
        other => other.to_string(),
    }
}
