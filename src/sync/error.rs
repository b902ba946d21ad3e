use std::path::PathBuf;

use thiserror::Error;

use crate::ledger::LedgerError;
use crate::remote::{RemoteError, Ticket};

/// Why a directory (or the whole run) could not be synced.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Submitting {path} failed after {attempts} attempt(s): {source}")]
    Submission {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: RemoteError,
    },

    #[error(
        "{count} upload(s) from {directory} could not be processed by the photo service \
         (probably an unsupported file)"
    )]
    Processing {
        directory: PathBuf,
        count: usize,
        tickets: Vec<Ticket>,
    },

    #[error("Got unexpected status {code} for ticket {ticket} while checking uploads")]
    UnexpectedTicketStatus { ticket: Ticket, code: i64 },

    #[error("{unresolved} upload(s) from {directory} still unprocessed after {polls} status checks")]
    PollTimeout {
        directory: PathBuf,
        unresolved: usize,
        polls: u32,
    },

    #[error("The photo service did not report on ticket {0}")]
    MissingTicket(Ticket),

    #[error("Could not add photos to album '{title}': {source}")]
    Album {
        title: String,
        #[source]
        source: RemoteError,
    },

    #[error(
        "Ledger is not in sync with the photo service: {ledger} recorded, {remote} remote. \
         Please synchronize"
    )]
    Drift { ledger: u64, remote: u64 },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
