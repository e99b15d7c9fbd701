//! A [`PhotoService`] speaking JSON over HTTP, authenticated with a bearer token.
//!
//! | operation     | request                                                   |
//! |---------------|-----------------------------------------------------------|
//! | list albums   | `GET  {base}/albums`                                      |
//! | upload photo  | `POST {base}/photos` (multipart)                          |
//! | create album  | `POST {base}/albums`                                      |
//! | add photo     | `POST {base}/albums/{id}/photos`                          |
//! | reorder album | `POST {base}/albums/{id}/reorder`                         |

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use log::debug;
use reqwest::{
    Client, Response, StatusCode,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Album, AlbumId, PhotoId, PhotoService};
use crate::{config::ServiceSettings, errors::ServiceError};

#[derive(Debug, Deserialize)]
struct AlbumResponse {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

/// How the service explains a request it refused.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "message")]
    error: String,
}

#[derive(Debug, Serialize)]
struct CreateAlbumRequest<'a> {
    title: &'a str,
    description: &'a str,
    cover_photo_id: &'a str,
}

#[derive(Debug, Serialize)]
struct AddPhotoRequest<'a> {
    photo_id: &'a str,
}

pub struct HttpPhotoService {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpPhotoService {
    /// Build a client from the service settings, reading the auth token from its file.
    ///
    /// # Errors
    ///
    /// Returns an error if the token file cannot be read or is empty,
    /// or if the HTTP client cannot be built.
    #[inline]
    pub fn new(settings: &ServiceSettings) -> Result<Self, ServiceError> {
        let token = read_token(&settings.token_file)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("ornitag/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

/// The token is the first non-blank line of the file.
fn read_token(path: &Path) -> Result<String, ServiceError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ServiceError::TokenFile {
        path: path.to_path_buf(),
        source,
    })?;

    contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ServiceError::EmptyToken(PathBuf::from(path)))
}

async fn check(response: Response) -> Result<Response, ServiceError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ServiceError::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => Err(ServiceError::RateLimited),
        status => {
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(ErrorResponse { error }) if status.is_client_error() => {
                    Err(ServiceError::Rejected(error))
                }
                _ => Err(ServiceError::Status {
                    status: status.as_u16(),
                    body,
                }),
            }
        }
    }
}

impl PhotoService for HttpPhotoService {
    #[instrument(skip(self))]
    async fn list_albums(&self) -> Result<Vec<Album>, ServiceError> {
        let response = self
            .client
            .get(self.url("albums"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let albums: Vec<AlbumResponse> = check(response).await?.json().await?;
        debug!("Photo service has {} albums", albums.len());

        Ok(albums
            .into_iter()
            .map(|album| Album {
                title: album.title,
                id: AlbumId(album.id),
            })
            .collect())
    }

    #[instrument(skip(self, description, tags))]
    async fn upload_photo(
        &self,
        file: &Path,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> Result<PhotoId, ServiceError> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .part("file", part)
            .text("title", title.to_string())
            .text("description", description.to_string())
            .text("tags", tags.join(","));

        let response = self
            .client
            .post(self.url("photos"))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;
        let IdResponse { id } = check(response).await?.json().await?;

        Ok(PhotoId(id))
    }

    #[instrument(skip(self, description))]
    async fn create_album(
        &self,
        title: &str,
        description: &str,
        cover: &PhotoId,
    ) -> Result<AlbumId, ServiceError> {
        let response = self
            .client
            .post(self.url("albums"))
            .bearer_auth(&self.token)
            .json(&CreateAlbumRequest {
                title,
                description,
                cover_photo_id: &cover.0,
            })
            .send()
            .await?;
        let IdResponse { id } = check(response).await?.json().await?;

        Ok(AlbumId(id))
    }

    #[instrument(skip(self))]
    async fn add_photo(&self, album: &AlbumId, photo: &PhotoId) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.url(&format!("albums/{album}/photos")))
            .bearer_auth(&self.token)
            .json(&AddPhotoRequest { photo_id: &photo.0 })
            .send()
            .await?;
        check(response).await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn reorder_album(&self, album: &AlbumId) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.url(&format!("albums/{album}/reorder")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check(response).await?;

        Ok(())
    }
}
