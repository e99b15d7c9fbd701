//! The remote photo service that photos are uploaded to.

pub mod http;

use std::{fmt, path::Path};

use crate::errors::ServiceError;

/// Placeholder handed out in place of real identifiers during a dry run.
pub const DRY_RUN_ID: &str = "dry-run";

/// The service's handle for an uploaded photo.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PhotoId(pub String);

/// The service's handle for an album.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AlbumId(pub String);

macro_rules! impl_id {
    ($id:ident) => {
        impl $id {
            /// The placeholder used when nothing was actually sent to the service.
            #[must_use]
            #[inline]
            pub fn dry_run() -> Self {
                Self(DRY_RUN_ID.to_string())
            }

            #[must_use]
            #[inline]
            pub fn is_dry_run(&self) -> bool {
                self.0 == DRY_RUN_ID
            }
        }

        impl fmt::Display for $id {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $id {
            #[inline]
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

impl_id!(PhotoId);
impl_id!(AlbumId);

/// An album as the service knows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Album {
    pub title: String,
    pub id: AlbumId,
}

/// The operations ornitag needs from a photo service.
///
/// None of these are transactional, and the service is the source of truth for which albums exist.
#[allow(async_fn_in_trait)]
pub trait PhotoService {
    /// Every album the authenticated user owns.
    async fn list_albums(&self) -> Result<Vec<Album>, ServiceError>;

    /// Upload a photo, giving it a title, description and tags.
    async fn upload_photo(
        &self,
        file: &Path,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> Result<PhotoId, ServiceError>;

    /// Create an album, with `cover` as its first photo.
    async fn create_album(
        &self,
        title: &str,
        description: &str,
        cover: &PhotoId,
    ) -> Result<AlbumId, ServiceError>;

    async fn add_photo(&self, album: &AlbumId, photo: &PhotoId) -> Result<(), ServiceError>;

    /// Re-sort the photos of an album. Always applies the full ordering, so repeating it is harmless.
    async fn reorder_album(&self, album: &AlbumId) -> Result<(), ServiceError>;
}
