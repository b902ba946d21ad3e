//! Delete every remote photo, then wipe the ledger.

use futures_util::stream::{self, Stream, TryStreamExt};
use tokio_util::sync::CancellationToken;

use super::error::SyncError;
use crate::ledger::Ledger;
use crate::remote::{PhotoId, PhotoService, RemoteError, SearchPage};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub found: usize,
    pub deleted: usize,
    pub interrupted: bool,
}

/// Pages of the account's photo listing, starting at page 1.
fn photo_pages(
    service: &dyn PhotoService,
) -> impl Stream<Item = Result<SearchPage, RemoteError>> + '_ {
    stream::try_unfold(Some(1u32), move |next| async move {
        let Some(page) = next else {
            return Ok(None);
        };
        let result = service.search_photos(page).await?;
        let next = (page < result.pages).then_some(page + 1);
        Ok::<_, RemoteError>(Some((result, next)))
    })
}

/// Delete every photo in the account, then remove the ledger.
///
/// The full listing is collected before anything is deleted, since deleting
/// shifts later pages. The ledger is only removed once every photo is gone;
/// a failure or a stop request part way leaves it in place.
pub async fn delete_all(
    service: &dyn PhotoService,
    ledger: &dyn Ledger,
    shutdown_token: &CancellationToken,
) -> Result<DeleteReport, SyncError> {
    let photos: Vec<PhotoId> = photo_pages(service)
        .try_fold(Vec::new(), |mut acc, page| async move {
            acc.extend(page.photo_ids);
            Ok(acc)
        })
        .await?;

    let mut report = DeleteReport {
        found: photos.len(),
        ..DeleteReport::default()
    };
    tracing::info!("Deleting {} photos", photos.len());

    for photo in &photos {
        if shutdown_token.is_cancelled() {
            tracing::info!("Stopped after deleting {} of {} photos", report.deleted, report.found);
            report.interrupted = true;
            return Ok(report);
        }
        service.delete_photo(photo).await?;
        report.deleted += 1;
        tracing::info!("Deleted photo {}", photo);
    }

    ledger.delete_all().await?;
    tracing::info!("Removed ledger");
    Ok(report)
}
