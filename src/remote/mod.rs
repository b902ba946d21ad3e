//! Photo service client.
//!
//! The sync engine only sees [`PhotoService`]; [`RestPhotoService`] is the
//! production implementation.

pub mod error;
#[cfg(test)]
pub mod fake;
pub mod responses;
pub mod rest;
pub mod types;

use std::path::Path;

use async_trait::async_trait;

pub use error::RemoteError;
pub use rest::RestPhotoService;
pub use types::{AlbumId, AlbumIndex, PhotoId, SearchPage, Ticket, TicketState, TicketStatus};

/// Remote operations the sync engine depends on.
#[async_trait]
pub trait PhotoService: Send + Sync {
    /// Submit a file for asynchronous processing, tagged with `tags`.
    async fn upload_async(&self, path: &Path, tags: &str) -> Result<Ticket, RemoteError>;

    /// Current state of each ticket.
    async fn check_tickets(&self, tickets: &[Ticket]) -> Result<Vec<TicketState>, RemoteError>;

    /// Every album owned by the account, keyed by title.
    async fn list_albums(&self) -> Result<AlbumIndex, RemoteError>;

    async fn create_album(&self, title: &str, primary: &PhotoId) -> Result<AlbumId, RemoteError>;

    async fn add_photos_to_album(
        &self,
        album: &AlbumId,
        photos: &[PhotoId],
    ) -> Result<(), RemoteError>;

    /// One page (1-based) of the account's photos, with the account total.
    async fn search_photos(&self, page: u32) -> Result<SearchPage, RemoteError>;

    async fn delete_photo(&self, photo: &PhotoId) -> Result<(), RemoteError>;
}
