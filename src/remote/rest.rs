//! REST client for a Flickr-style photo service speaking JSON.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::error::RemoteError;
use super::responses::{
    AlbumListResponse, CheckTicketsResponse, CreateAlbumResponse, SearchResponse, Status,
    UploadResponse,
};
use super::types::{AlbumId, AlbumIndex, PhotoId, SearchPage, Ticket, TicketState};
use super::PhotoService;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const ALBUMS_PER_PAGE: &str = "500";

pub struct RestPhotoService {
    client: Client,
    api_url: String,
    upload_url: String,
    api_key: String,
    auth_token: String,
    owner: String,
}

impl std::fmt::Debug for RestPhotoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestPhotoService")
            .field("api_url", &self.api_url)
            .field("upload_url", &self.upload_url)
            .field("owner", &self.owner)
            .field("auth_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl RestPhotoService {
    pub fn new(
        api_url: impl Into<String>,
        upload_url: impl Into<String>,
        api_key: impl Into<String>,
        auth_token: impl Into<String>,
        owner: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("photosyncr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Http {
                method: "client setup".into(),
                source: e,
            })?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            upload_url: upload_url.into(),
            api_key: api_key.into(),
            auth_token: auth_token.into(),
            owner: owner.into(),
        })
    }

    /// Invoke a REST method and decode its JSON payload.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, RemoteError> {
        let mut query: Vec<(&str, &str)> = vec![
            ("method", method),
            ("api_key", self.api_key.as_str()),
            ("auth_token", self.auth_token.as_str()),
            ("format", "json"),
            ("nojsoncallback", "1"),
        ];
        query.extend_from_slice(params);

        tracing::debug!(method = %method, "Calling photo service");
        let resp = self
            .client
            .post(&self.api_url)
            .form(&query)
            .send()
            .await
            .map_err(|e| http_error(method, e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| http_error(method, e))?;
        parse_response(method, status, &body)
    }
}

fn http_error(method: &str, source: reqwest::Error) -> RemoteError {
    RemoteError::Http {
        method: method.to_string(),
        source,
    }
}

/// Check the HTTP status and the `stat` envelope, then decode `T`.
fn parse_response<T: DeserializeOwned>(
    method: &str,
    status: u16,
    body: &str,
) -> Result<T, RemoteError> {
    if !(200..300).contains(&status) {
        return Err(RemoteError::HttpStatus {
            status,
            method: method.to_string(),
        });
    }
    let json_error = |source| RemoteError::Json {
        method: method.to_string(),
        source,
    };
    let envelope: Status = serde_json::from_str(body).map_err(json_error)?;
    if envelope.stat != "ok" {
        return Err(RemoteError::Api {
            method: method.to_string(),
            code: envelope.code,
            message: envelope.message,
        });
    }
    serde_json::from_str(body).map_err(json_error)
}

#[async_trait]
impl PhotoService for RestPhotoService {
    async fn upload_async(&self, path: &Path, tags: &str) -> Result<Ticket, RemoteError> {
        const METHOD: &str = "upload";
        let bytes = tokio::fs::read(path).await.map_err(|e| RemoteError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("auth_token", self.auth_token.clone())
            .text("tags", tags.to_string())
            .text("async", "1")
            .text("format", "json")
            .text("nojsoncallback", "1")
            .part("photo", Part::bytes(bytes).file_name(file_name));

        tracing::debug!("Uploading {} with tag {}", path.display(), tags);
        let resp = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| http_error(METHOD, e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| http_error(METHOD, e))?;

        let upload: UploadResponse = parse_response(METHOD, status, &body)?;
        upload
            .ticketid
            .filter(|t| !t.is_empty())
            .map(Ticket)
            .ok_or(RemoteError::MissingField {
                method: METHOD.to_string(),
                field: "ticketid",
            })
    }

    async fn check_tickets(&self, tickets: &[Ticket]) -> Result<Vec<TicketState>, RemoteError> {
        let joined = tickets
            .iter()
            .map(|t| t.0.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let resp: CheckTicketsResponse = self
            .call("flickr.photos.upload.checkTickets", &[("tickets", joined.as_str())])
            .await?;
        Ok(resp.uploader.ticket.into_iter().map(Into::into).collect())
    }

    async fn list_albums(&self) -> Result<AlbumIndex, RemoteError> {
        let mut index = AlbumIndex::default();
        let mut page = 1u64;
        loop {
            let page_str = page.to_string();
            let resp: AlbumListResponse = self
                .call(
                    "flickr.photosets.getList",
                    &[
                        ("user_id", self.owner.as_str()),
                        ("page", page_str.as_str()),
                        ("per_page", ALBUMS_PER_PAGE),
                    ],
                )
                .await?;
            for album in resp.photosets.photoset {
                index.insert(album.title.content, AlbumId(album.id));
            }
            if page >= resp.photosets.pages {
                break;
            }
            page += 1;
        }
        tracing::debug!("Found {} existing albums", index.len());
        Ok(index)
    }

    async fn create_album(&self, title: &str, primary: &PhotoId) -> Result<AlbumId, RemoteError> {
        let resp: CreateAlbumResponse = self
            .call(
                "flickr.photosets.create",
                &[("title", title), ("primary_photo_id", primary.0.as_str())],
            )
            .await?;
        Ok(AlbumId(resp.photoset.id))
    }

    async fn add_photos_to_album(
        &self,
        album: &AlbumId,
        photos: &[PhotoId],
    ) -> Result<(), RemoteError> {
        for photo in photos {
            let _: Status = self
                .call(
                    "flickr.photosets.addPhoto",
                    &[
                        ("photoset_id", album.0.as_str()),
                        ("photo_id", photo.0.as_str()),
                    ],
                )
                .await?;
        }
        Ok(())
    }

    async fn search_photos(&self, page: u32) -> Result<SearchPage, RemoteError> {
        let page_str = page.to_string();
        let resp: SearchResponse = self
            .call(
                "flickr.photos.search",
                &[("user_id", self.owner.as_str()), ("page", page_str.as_str())],
            )
            .await?;
        Ok(SearchPage {
            page: resp.photos.page as u32,
            pages: resp.photos.pages as u32,
            total: resp.photos.total,
            photo_ids: resp.photos.photo.into_iter().map(|p| PhotoId(p.id)).collect(),
        })
    }

    async fn delete_photo(&self, photo: &PhotoId) -> Result<(), RemoteError> {
        let _: Status = self
            .call("flickr.photos.delete", &[("photo_id", photo.0.as_str())])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_ok() {
        let resp: UploadResponse =
            parse_response("upload", 200, r#"{"stat": "ok", "ticketid": "t1"}"#).unwrap();
        assert_eq!(resp.ticketid.as_deref(), Some("t1"));
    }

    #[test]
    fn test_parse_response_api_failure() {
        let err = parse_response::<Status>(
            "flickr.photos.delete",
            200,
            r#"{"stat": "fail", "code": 1, "message": "Photo not found"}"#,
        )
        .unwrap_err();
        match err {
            RemoteError::Api { code, message, .. } => {
                assert_eq!(code, 1);
                assert_eq!(message, "Photo not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_response_http_status() {
        let err = parse_response::<Status>("upload", 503, "Service Unavailable").unwrap_err();
        assert!(matches!(err, RemoteError::HttpStatus { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_parse_response_garbled_body() {
        let err = parse_response::<Status>("upload", 200, "<html>").unwrap_err();
        assert!(matches!(err, RemoteError::Json { .. }));
    }

    #[test]
    fn test_debug_redacts_token() {
        let svc = RestPhotoService::new(
            "https://api.example.com/rest/",
            "https://up.example.com/upload/",
            "key",
            "very-secret",
            "me",
        )
        .unwrap();
        let rendered = format!("{svc:?}");
        assert!(!rendered.contains("very-secret"));
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let svc = RestPhotoService::new(
            "http://127.0.0.1:1/rest/",
            "http://127.0.0.1:1/upload/",
            "key",
            "token",
            "me",
        )
        .unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let err = svc
            .upload_async(&tmp.path().join("missing.jpg"), "#/missing.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Io { .. }));
        assert!(!err.is_retryable());
    }
}
