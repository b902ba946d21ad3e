//! Upload ledger: the persisted record of what has already been uploaded.
//!
//! Keys are directory paths relative to the photo root; values are the
//! filenames the photo service has confirmed as processed. The ledger only
//! grows, except for a full wipe during delete-all.

pub mod db;
pub mod error;
pub mod lock;
pub mod schema;

pub use db::{Ledger, RecordedUploads, SqliteLedger};
pub use error::LedgerError;
pub use lock::LedgerLock;
