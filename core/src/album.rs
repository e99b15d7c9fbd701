//! A local view of the albums that exist on the photo service, keyed by title.

use std::collections::HashMap;

use log::{debug, warn};
use tracing::instrument;

use crate::{
    errors::ServiceError,
    service::{Album, AlbumId, PhotoService},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlbumDirectory {
    albums: HashMap<String, Album>,
    /// Albums known to exist that the service has not listed yet
    unlisted: HashMap<String, Album>,
}

impl AlbumDirectory {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache with the service's current list of albums.
    ///
    /// If the service has several albums with the same title, the first one listed wins.
    /// Albums passed to [`AlbumDirectory::remember`] are kept until the service lists an album
    /// with the same title.
    ///
    /// # Errors
    ///
    /// Returns an error if the albums could not be listed; the cache is left untouched.
    #[instrument(skip_all)]
    #[inline]
    pub async fn fetch_all<S: PhotoService>(
        &mut self,
        service: &S,
    ) -> Result<&HashMap<String, Album>, ServiceError> {
        let listed = service.list_albums().await?;

        let mut albums: HashMap<String, Album> = HashMap::with_capacity(listed.len());
        for album in listed {
            if let Some(existing) = albums.get(&album.title) {
                warn!(
                    "Found several albums titled \"{}\", using {} and ignoring {}",
                    album.title, existing.id, album.id
                );
                continue;
            }
            albums.insert(album.title.clone(), album);
        }
        self.unlisted.retain(|title, _| !albums.contains_key(title.as_str()));
        for (title, album) in &self.unlisted {
            debug!("Album \"{title}\" is still not listed, keeping {}", album.id);
            albums.insert(title.clone(), album.clone());
        }
        debug!("Album directory now holds {} albums", albums.len());

        self.albums = albums;
        Ok(&self.albums)
    }

    #[must_use]
    #[inline]
    pub fn get(&self, title: &str) -> Option<&Album> {
        self.albums.get(title)
    }

    /// Remember an album without asking the service, e.g. one that was just created but isn't
    /// listed yet, or one that only exists for the duration of a dry run.
    #[inline]
    pub fn remember(&mut self, title: &str, id: AlbumId) -> &Album {
        self.albums.entry(title.to_string()).or_insert_with(|| {
            let album = Album {
                title: title.to_string(),
                id,
            };
            self.unlisted.insert(title.to_string(), album.clone());
            album
        })
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.albums.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockService;

    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_fetch_all() {
        let service = MockService::with_albums(&[
            ("Blåmes / Blue Tit", "a1"),
            ("Talgoxe / Great Tit", "a2"),
        ]);
        let mut albums = AlbumDirectory::new();

        let fetched = albums.fetch_all(&service).await.unwrap();

        assert_eq!(fetched.len(), 2);
        assert_eq!(
            albums.get("Blåmes / Blue Tit"),
            Some(&Album {
                title: "Blåmes / Blue Tit".into(),
                id: "a1".into(),
            })
        );
        assert_eq!(albums.get("Missing"), None);
    }

    #[tokio::test]
    async fn test_remembered_albums_survive_until_listed() {
        let service = MockService::with_albums(&[("Blåmes / Blue Tit", "a1")]);
        let mut albums = AlbumDirectory::new();
        albums.remember("Blåmes / Blue Tit", AlbumId::dry_run());
        albums.remember("Talgoxe / Great Tit", "a2".into());

        albums.fetch_all(&service).await.unwrap();

        assert_eq!(albums.len(), 2);
        assert_eq!(albums.get("Blåmes / Blue Tit").unwrap().id, AlbumId::from("a1"));
        assert_eq!(albums.get("Talgoxe / Great Tit").unwrap().id, AlbumId::from("a2"));

        // once listed, the service's version wins for good
        service.add_album("Talgoxe / Great Tit", "a3");
        albums.fetch_all(&service).await.unwrap();
        assert_eq!(albums.get("Talgoxe / Great Tit").unwrap().id, AlbumId::from("a3"));
    }

    #[tokio::test]
    async fn test_duplicate_titles_keep_first() {
        let service = MockService::with_albums(&[
            ("Blåmes / Blue Tit", "a1"),
            ("Blåmes / Blue Tit", "a2"),
        ]);
        let mut albums = AlbumDirectory::new();

        albums.fetch_all(&service).await.unwrap();

        assert_eq!(albums.len(), 1);
        assert_eq!(albums.get("Blåmes / Blue Tit").unwrap().id, AlbumId::from("a1"));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_cache() {
        let service = MockService::default();
        service.fail_listing();
        let mut albums = AlbumDirectory::new();
        albums.remember("Kept", "a9".into());

        assert!(albums.fetch_all(&service).await.is_err());
        assert!(albums.get("Kept").is_some());
    }

    #[test]
    fn test_remember_does_not_overwrite() {
        let mut albums = AlbumDirectory::new();
        albums.remember("Blåmes / Blue Tit", "a1".into());

        let album = albums.remember("Blåmes / Blue Tit", AlbumId::dry_run());

        assert_eq!(album.id, AlbumId::from("a1"));
        assert!(!albums.is_empty());
    }
}
