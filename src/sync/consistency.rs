//! Drift check between the ledger and the remote account.

use super::error::SyncError;
use crate::ledger::Ledger;
use crate::remote::PhotoService;

/// Compare the number of filenames in the ledger with the number of photos
/// in the account. A missing ledger counts as zero.
///
/// This only detects drift; fixing it is left to the user.
pub async fn check_consistency(
    ledger: &dyn Ledger,
    service: &dyn PhotoService,
) -> Result<(), SyncError> {
    let recorded = ledger.total_count().await?;
    let remote = service.search_photos(1).await?.total;
    tracing::debug!(
        "Checking ledger freshness against the photo service: ledger has {} entries, account has {}",
        recorded,
        remote
    );
    if recorded != remote {
        tracing::error!("Ledger is not in sync with the photo service. Please synchronize");
        return Err(SyncError::Drift {
            ledger: recorded,
            remote,
        });
    }
    Ok(())
}
