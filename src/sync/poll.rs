//! Completion polling for a directory's batch of upload tickets.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::error::SyncError;
use crate::remote::{PhotoId, PhotoService, Ticket, TicketStatus};

/// Pause between status checks. Injected so tests do not wait.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_polls: 1000,
        }
    }
}

/// Poll until every ticket is processed, returning photo ids in ticket order.
///
/// A ticket the service failed to process fails the whole batch, as does a
/// status code outside the documented set. Tickets still pending once the
/// poll budget is spent are reported as [`SyncError::PollTimeout`]; nothing
/// from the batch counts as uploaded in that case. A transient error from a
/// status check uses up one poll and is otherwise ignored.
pub async fn await_completion(
    service: &dyn PhotoService,
    sleeper: &dyn Sleeper,
    config: &PollConfig,
    directory: &Path,
    tickets: &[Ticket],
) -> Result<Vec<PhotoId>, SyncError> {
    if tickets.is_empty() {
        return Ok(Vec::new());
    }

    let max_polls = config.max_polls.max(1);
    let mut unresolved = tickets.len();

    for poll in 1..=max_polls {
        match service.check_tickets(tickets).await {
            Ok(states) => {
                let by_ticket: HashMap<&Ticket, &TicketStatus> =
                    states.iter().map(|s| (&s.ticket, &s.status)).collect();

                let mut photos = Vec::with_capacity(tickets.len());
                let mut failed = Vec::new();
                let mut pending = 0;
                for ticket in tickets {
                    match by_ticket.get(ticket) {
                        None => return Err(SyncError::MissingTicket(ticket.clone())),
                        Some(TicketStatus::Complete(id)) => photos.push(id.clone()),
                        Some(TicketStatus::Pending) => pending += 1,
                        Some(TicketStatus::Failed) => failed.push(ticket.clone()),
                        Some(TicketStatus::Unexpected(code)) => {
                            return Err(SyncError::UnexpectedTicketStatus {
                                ticket: ticket.clone(),
                                code: *code,
                            });
                        }
                    }
                }

                if !failed.is_empty() {
                    return Err(SyncError::Processing {
                        directory: directory.to_path_buf(),
                        count: failed.len(),
                        tickets: failed,
                    });
                }
                if pending == 0 {
                    return Ok(photos);
                }
                unresolved = pending;
                tracing::debug!(
                    "Waiting for {} of {} uploads to complete (check {}/{})",
                    pending,
                    tickets.len(),
                    poll,
                    max_polls
                );
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!("Checking upload status failed (check {}/{}): {}", poll, max_polls, e);
            }
            Err(e) => return Err(e.into()),
        }

        if poll < max_polls {
            sleeper.sleep(config.interval).await;
        }
    }

    Err(SyncError::PollTimeout {
        directory: directory.to_path_buf(),
        unresolved,
        polls: max_polls,
    })
}
