use serde::{Deserialize, Deserializer};

use super::types::{PhotoId, Ticket, TicketState, TicketStatus};

/// The service sends counters as either JSON numbers or strings.
fn number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn signed_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Envelope shared by every call: `stat` is `ok` or `fail`.
#[derive(Debug, Deserialize)]
pub struct Status {
    pub stat: String,
    #[serde(default, deserialize_with = "signed_number_or_string")]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Response to an asynchronous upload.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub ticketid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckTicketsResponse {
    pub uploader: Uploader,
}

#[derive(Debug, Deserialize)]
pub struct Uploader {
    #[serde(default)]
    pub ticket: Vec<TicketEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TicketEntry {
    pub id: String,
    #[serde(default, deserialize_with = "signed_number_or_string")]
    pub complete: i64,
    #[serde(default, deserialize_with = "signed_number_or_string")]
    pub invalid: i64,
    #[serde(default)]
    pub photoid: Option<String>,
}

impl From<TicketEntry> for TicketState {
    fn from(entry: TicketEntry) -> Self {
        let status = if entry.invalid != 0 {
            TicketStatus::Failed
        } else {
            TicketStatus::from_code(entry.complete, entry.photoid.map(PhotoId))
        };
        TicketState {
            ticket: Ticket(entry.id),
            status,
        }
    }
}

/// Content wrapper used for text fields such as album titles.
#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(rename = "_content", default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AlbumListResponse {
    pub photosets: AlbumList,
}

#[derive(Debug, Deserialize)]
pub struct AlbumList {
    #[serde(default = "one", deserialize_with = "number_or_string")]
    pub page: u64,
    #[serde(default = "one", deserialize_with = "number_or_string")]
    pub pages: u64,
    #[serde(default)]
    pub photoset: Vec<AlbumEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AlbumEntry {
    pub id: String,
    pub title: Content,
}

#[derive(Debug, Deserialize)]
pub struct CreateAlbumResponse {
    pub photoset: CreatedAlbum,
}

#[derive(Debug, Deserialize)]
pub struct CreatedAlbum {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub photos: PhotoList,
}

#[derive(Debug, Deserialize)]
pub struct PhotoList {
    #[serde(default = "one", deserialize_with = "number_or_string")]
    pub page: u64,
    #[serde(default = "one", deserialize_with = "number_or_string")]
    pub pages: u64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub total: u64,
    #[serde(default)]
    pub photo: Vec<PhotoEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoEntry {
    pub id: String,
}

fn one() -> u64 {
    1
}
