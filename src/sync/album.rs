//! One remote album per local directory, matched by title.

use std::path::Path;

use super::error::SyncError;
use crate::remote::{AlbumIndex, PhotoId, PhotoService};

/// Album title for a directory: its base name.
pub fn album_title(directory: &Path) -> String {
    directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| directory.to_string_lossy().into_owned())
}

/// Put `photos` into the album titled `title`, creating it (with the first
/// photo as primary) when the index has no such album. A created album is
/// recorded in `index` so later directories with the same base name reuse it.
pub async fn assign_to_album(
    service: &dyn PhotoService,
    index: &mut AlbumIndex,
    title: &str,
    photos: &[PhotoId],
) -> Result<(), SyncError> {
    let Some((primary, rest)) = photos.split_first() else {
        return Ok(());
    };
    let album_error = |source| SyncError::Album {
        title: title.to_string(),
        source,
    };

    if let Some(album) = index.get(title) {
        tracing::debug!("Adding {} photos to album {} ({})", photos.len(), title, album);
        service
            .add_photos_to_album(album, photos)
            .await
            .map_err(album_error)?;
        return Ok(());
    }

    tracing::debug!("Creating album {} with {} photos", title, photos.len());
    let album = service
        .create_album(title, primary)
        .await
        .map_err(album_error)?;
    if !rest.is_empty() {
        service
            .add_photos_to_album(&album, rest)
            .await
            .map_err(album_error)?;
    }
    index.insert(title, album);
    Ok(())
}
