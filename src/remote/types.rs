use std::collections::HashMap;
use std::fmt;

/// Handle for an upload the service is still processing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticket(pub String);

/// Identifier the service assigns once an upload is processed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlbumId(pub String);

macro_rules! display_inner {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })*
    };
}

display_inner!(Ticket, PhotoId, AlbumId);

/// Processing state of one ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketStatus {
    /// Still being processed.
    Pending,
    /// Processed; the photo now exists remotely.
    Complete(PhotoId),
    /// The service could not process the file (e.g. unrecognized format),
    /// or does not know the ticket.
    Failed,
    /// A status code outside the documented set.
    Unexpected(i64),
}

impl TicketStatus {
    /// Map a `complete` code: 0 pending, 1 done, 2 failed.
    pub fn from_code(code: i64, photo_id: Option<PhotoId>) -> Self {
        match (code, photo_id) {
            (0, _) => TicketStatus::Pending,
            (1, Some(id)) => TicketStatus::Complete(id),
            (1, None) => TicketStatus::Unexpected(code),
            (2, _) => TicketStatus::Failed,
            (other, _) => TicketStatus::Unexpected(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketState {
    pub ticket: Ticket,
    pub status: TicketStatus,
}

/// Remote albums by title, fetched once per run.
///
/// Directories with the same base name share one album.
#[derive(Debug, Clone, Default)]
pub struct AlbumIndex {
    by_title: HashMap<String, AlbumId>,
}

impl AlbumIndex {
    pub fn get(&self, title: &str) -> Option<&AlbumId> {
        self.by_title.get(title)
    }

    pub fn insert(&mut self, title: impl Into<String>, id: AlbumId) {
        self.by_title.insert(title.into(), id);
    }

    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }
}

impl FromIterator<(String, AlbumId)> for AlbumIndex {
    fn from_iter<I: IntoIterator<Item = (String, AlbumId)>>(iter: I) -> Self {
        Self {
            by_title: iter.into_iter().collect(),
        }
    }
}

/// One page of the account's photo listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub page: u32,
    pub pages: u32,
    /// Photos in the whole account, not just this page.
    pub total: u64,
    pub photo_ids: Vec<PhotoId>,
}
