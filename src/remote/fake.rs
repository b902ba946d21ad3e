//! In-memory [`PhotoService`] for tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::RemoteError;
use super::types::{AlbumId, AlbumIndex, PhotoId, SearchPage, Ticket, TicketState, TicketStatus};
use super::PhotoService;

#[derive(Default)]
struct State {
    // behaviour
    transient_failures: HashMap<String, u32>,
    permanent_failures: HashSet<String>,
    rejected: HashSet<String>,
    pending_polls: u32,
    check_failures: u32,
    unreported: HashSet<String>,
    unexpected_status: Option<i64>,
    failing_albums: bool,
    per_page: usize,

    // remote contents
    albums: AlbumIndex,
    inventory: Vec<PhotoId>,
    tickets: HashMap<String, (String, PhotoId)>,

    // call log
    upload_attempts: u32,
    uploads: Vec<(PathBuf, String)>,
    check_calls: u32,
    list_album_calls: u32,
    search_calls: u32,
    created_albums: Vec<(String, AlbumId, PhotoId)>,
    added: Vec<(AlbumId, Vec<PhotoId>)>,
    deleted: Vec<PhotoId>,
    next_id: u32,
}

pub struct FakePhotoService {
    state: Mutex<State>,
}

impl FakePhotoService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                per_page: 100,
                ..State::default()
            }),
        }
    }

    fn configure(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    /// Fail the first `times` submissions of `filename` with a 503.
    pub fn with_transient_failures(self, filename: &str, times: u32) -> Self {
        self.configure(|s| {
            s.transient_failures.insert(filename.to_string(), times);
        })
    }

    /// Reject every submission of `filename` with an API error.
    pub fn with_permanent_failure(self, filename: &str) -> Self {
        self.configure(|s| {
            s.permanent_failures.insert(filename.to_string());
        })
    }

    /// Accept `filename` but report its ticket as failed.
    pub fn with_rejected(self, filename: &str) -> Self {
        self.configure(|s| {
            s.rejected.insert(filename.to_string());
        })
    }

    /// Report every ticket as pending for the first `polls` status checks.
    pub fn with_pending_polls(self, polls: u32) -> Self {
        self.configure(|s| s.pending_polls = polls)
    }

    /// Fail the first `times` status checks with a 503.
    pub fn with_check_failures(self, times: u32) -> Self {
        self.configure(|s| s.check_failures = times)
    }

    /// Leave the ticket for `filename` out of every status report.
    pub fn with_unreported(self, filename: &str) -> Self {
        self.configure(|s| {
            s.unreported.insert(filename.to_string());
        })
    }

    pub fn with_unexpected_status(self, code: i64) -> Self {
        self.configure(|s| s.unexpected_status = Some(code))
    }

    pub fn with_failing_albums(self) -> Self {
        self.configure(|s| s.failing_albums = true)
    }

    pub fn with_album(self, title: &str, id: &str) -> Self {
        self.configure(|s| s.albums.insert(title, AlbumId(id.to_string())))
    }

    /// Seed the account with `count` existing photos.
    pub fn with_remote_photos(self, count: usize) -> Self {
        self.configure(|s| {
            for i in 0..count {
                s.inventory.push(PhotoId(format!("existing-{i}")));
            }
        })
    }

    pub fn with_per_page(self, per_page: usize) -> Self {
        self.configure(|s| s.per_page = per_page)
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        f(&self.state.lock().unwrap())
    }

    pub fn upload_attempts(&self) -> u32 {
        self.read(|s| s.upload_attempts)
    }

    /// Accepted submissions: (path, tags).
    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.read(|s| s.uploads.clone())
    }

    pub fn check_calls(&self) -> u32 {
        self.read(|s| s.check_calls)
    }

    pub fn list_album_calls(&self) -> u32 {
        self.read(|s| s.list_album_calls)
    }

    pub fn search_calls(&self) -> u32 {
        self.read(|s| s.search_calls)
    }

    /// Created albums: (title, album, primary photo).
    pub fn created_albums(&self) -> Vec<(String, AlbumId, PhotoId)> {
        self.read(|s| s.created_albums.clone())
    }

    pub fn added(&self) -> Vec<(AlbumId, Vec<PhotoId>)> {
        self.read(|s| s.added.clone())
    }

    pub fn deleted(&self) -> Vec<PhotoId> {
        self.read(|s| s.deleted.clone())
    }

    pub fn remote_total(&self) -> usize {
        self.read(|s| s.inventory.len())
    }

    /// Every photo placed in `album`, whether as primary or added later.
    pub fn album_photos(&self, album: &AlbumId) -> Vec<PhotoId> {
        self.read(|s| {
            let mut photos: Vec<PhotoId> = s
                .created_albums
                .iter()
                .filter(|(_, id, _)| id == album)
                .map(|(_, _, primary)| primary.clone())
                .collect();
            for (id, added) in &s.added {
                if id == album {
                    photos.extend(added.iter().cloned());
                }
            }
            photos
        })
    }
}

fn api_error(method: &str, message: &str) -> RemoteError {
    RemoteError::Api {
        method: method.to_string(),
        code: 1,
        message: message.to_string(),
    }
}

#[async_trait]
impl PhotoService for FakePhotoService {
    async fn upload_async(&self, path: &Path, tags: &str) -> Result<Ticket, RemoteError> {
        let mut s = self.state.lock().unwrap();
        s.upload_attempts += 1;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(remaining) = s.transient_failures.get_mut(&filename) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RemoteError::HttpStatus {
                    status: 503,
                    method: "upload".into(),
                });
            }
        }
        if s.permanent_failures.contains(&filename) {
            return Err(api_error("upload", "Filetype was not recognised"));
        }

        s.next_id += 1;
        let n = s.next_id;
        let ticket = format!("t{n}");
        s.tickets
            .insert(ticket.clone(), (filename, PhotoId(format!("p{n}"))));
        s.uploads.push((path.to_path_buf(), tags.to_string()));
        Ok(Ticket(ticket))
    }

    async fn check_tickets(&self, tickets: &[Ticket]) -> Result<Vec<TicketState>, RemoteError> {
        let mut s = self.state.lock().unwrap();
        s.check_calls += 1;
        if s.check_failures > 0 {
            s.check_failures -= 1;
            return Err(RemoteError::HttpStatus {
                status: 503,
                method: "flickr.photos.upload.checkTickets".into(),
            });
        }
        let still_pending = s.check_calls <= s.pending_polls;

        let mut states = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let status = match s.tickets.get(&ticket.0).cloned() {
                None => TicketStatus::Failed,
                Some((filename, _)) if s.unreported.contains(&filename) => continue,
                Some((filename, _)) if s.rejected.contains(&filename) => TicketStatus::Failed,
                Some(_) if s.unexpected_status.is_some() => {
                    TicketStatus::Unexpected(s.unexpected_status.unwrap_or_default())
                }
                Some(_) if still_pending => TicketStatus::Pending,
                Some((_, photo)) => {
                    if !s.inventory.contains(&photo) {
                        s.inventory.push(photo.clone());
                    }
                    TicketStatus::Complete(photo)
                }
            };
            states.push(TicketState {
                ticket: ticket.clone(),
                status,
            });
        }
        Ok(states)
    }

    async fn list_albums(&self) -> Result<AlbumIndex, RemoteError> {
        let mut s = self.state.lock().unwrap();
        s.list_album_calls += 1;
        Ok(s.albums.clone())
    }

    async fn create_album(&self, title: &str, primary: &PhotoId) -> Result<AlbumId, RemoteError> {
        let mut s = self.state.lock().unwrap();
        if s.failing_albums {
            return Err(api_error("flickr.photosets.create", "Album quota reached"));
        }
        s.next_id += 1;
        let id = AlbumId(format!("a{}", s.next_id));
        s.albums.insert(title, id.clone());
        s.created_albums
            .push((title.to_string(), id.clone(), primary.clone()));
        Ok(id)
    }

    async fn add_photos_to_album(
        &self,
        album: &AlbumId,
        photos: &[PhotoId],
    ) -> Result<(), RemoteError> {
        let mut s = self.state.lock().unwrap();
        if s.failing_albums {
            return Err(api_error("flickr.photosets.addPhoto", "Album not found"));
        }
        s.added.push((album.clone(), photos.to_vec()));
        Ok(())
    }

    async fn search_photos(&self, page: u32) -> Result<SearchPage, RemoteError> {
        let mut s = self.state.lock().unwrap();
        s.search_calls += 1;
        let total = s.inventory.len();
        let per_page = s.per_page.max(1);
        let pages = total.div_ceil(per_page);
        let start = (page.max(1) as usize - 1) * per_page;
        let photo_ids = s
            .inventory
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect();
        Ok(SearchPage {
            page,
            pages: pages as u32,
            total: total as u64,
            photo_ids,
        })
    }

    async fn delete_photo(&self, photo: &PhotoId) -> Result<(), RemoteError> {
        let mut s = self.state.lock().unwrap();
        let before = s.inventory.len();
        s.inventory.retain(|p| p != photo);
        if s.inventory.len() == before {
            return Err(api_error("flickr.photos.delete", "Photo not found"));
        }
        s.deleted.push(photo.clone());
        Ok(())
    }
}
