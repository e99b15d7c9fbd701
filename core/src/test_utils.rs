//! utilities used for testing
#![allow(clippy::missing_inline_in_public_items)]

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{
    errors::ServiceError,
    metadata::{BIRDS_SHEET, BirdEntry, MetadataStore, TAGS_SHEET, TagSet, workbook::MemoryWorkbook},
    photo::{PhotoDetails, PhotoRecord},
    service::{Album, AlbumId, PhotoId, PhotoService},
};

/// A `Birds` sheet: a header row followed by `rows`.
#[must_use]
pub fn birds_sheet(rows: &[&[&str]]) -> Vec<Vec<String>> {
    sheet(&[&["Code", "Name", "Name (en)", "Scientific name"]], rows)
}

/// A `Tags` sheet: two header rows followed by `rows`.
#[must_use]
pub fn tags_sheet(rows: &[&[&str]]) -> Vec<Vec<String>> {
    sheet(&[&["Code", "Tags"], &["", "(one per column)"]], rows)
}

fn sheet(header: &[&[&str]], rows: &[&[&str]]) -> Vec<Vec<String>> {
    header
        .iter()
        .chain(rows)
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect()
}

#[must_use]
pub fn blue_tit() -> BirdEntry {
    BirdEntry {
        code: "B1".into(),
        common_name_a: "Blåmes".into(),
        common_name_b: "Blue Tit".into(),
        scientific_name: "Cyanistes caeruleus".into(),
    }
}

#[must_use]
pub fn forest_winter() -> TagSet {
    TagSet {
        code: "T1".into(),
        tags: vec!["forest".into(), "winter".into()],
    }
}

/// A workbook with birds `B1` and `B2`, and tag codes `T1`, `T2`, and the empty `T0`.
#[must_use]
pub fn sample_workbook() -> MemoryWorkbook {
    MemoryWorkbook::new()
        .with_sheet(
            BIRDS_SHEET,
            birds_sheet(&[
                &["B1", "Blåmes", "Blue Tit", "Cyanistes caeruleus"],
                &["B2", "Talgoxe", "Great Tit", "Parus major"],
            ]),
        )
        .with_sheet(
            TAGS_SHEET,
            tags_sheet(&[&["T1", "forest", "winter"], &["T2", "garden"], &["T0"]]),
        )
}

/// # Panics
///
/// Panics if the sample workbook is rejected.
#[must_use]
pub fn sample_store() -> MetadataStore {
    MetadataStore::from_workbook(&mut sample_workbook()).unwrap()
}

/// The details of a `T1` photo of the given bird from [`sample_store`].
///
/// # Panics
///
/// Panics if `bird_code` isn't one of the sample birds.
#[must_use]
pub fn details(file: &str, bird_code: &str) -> PhotoDetails {
    let store = sample_store();
    PhotoRecord::from_metadata(
        file.into(),
        store.bird(bird_code).unwrap(),
        store.tag_set("T1").unwrap(),
    )
    .into_valid()
    .unwrap()
}

/// Create an empty file, along with any missing parent directories.
///
/// # Panics
///
/// Panics if the file cannot be created.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"").unwrap();
}

/// A call made to the [`MockService`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    ListAlbums,
    UploadPhoto {
        file: PathBuf,
        title: String,
    },
    CreateAlbum {
        title: String,
        description: String,
        cover: PhotoId,
    },
    AddPhoto {
        album: AlbumId,
        photo: PhotoId,
    },
    ReorderAlbum(AlbumId),
}

impl Call {
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        !matches!(self, Self::ListAlbums)
    }
}

#[derive(Debug, Default)]
struct MockState {
    albums: Vec<Album>,
    calls: Vec<Call>,
    photos_uploaded: usize,
    albums_created: usize,
    failing_uploads: HashSet<String>,
    fail_listing: bool,
    fail_adds: bool,
    fail_creates: bool,
    fail_reorders: bool,
    hide_created_albums: bool,
}

/// An in-memory photo service that records every call made to it.
///
/// Photos get the ids `photo-1`, `photo-2`, ... and created albums `album-1`, `album-2`, ...
#[derive(Debug, Default)]
pub struct MockService {
    state: Mutex<MockState>,
}

impl MockService {
    /// A service that already has the given `(title, id)` albums.
    #[must_use]
    pub fn with_albums(albums: &[(&str, &str)]) -> Self {
        let service = Self::default();
        for (title, id) in albums {
            service.add_album(title, id);
        }
        service
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Make an album appear on the service, as if created by someone else.
    pub fn add_album(&self, title: &str, id: &str) {
        self.state().albums.push(Album {
            title: title.into(),
            id: id.into(),
        });
    }

    /// Fail uploads of files with this file name.
    pub fn fail_upload_of(&self, file_name: &str) {
        self.state().failing_uploads.insert(file_name.into());
    }

    pub fn fail_listing(&self) {
        self.state().fail_listing = true;
    }

    pub fn fail_adds(&self) {
        self.state().fail_adds = true;
    }

    pub fn fail_creates(&self) {
        self.state().fail_creates = true;
    }

    pub fn fail_reorders(&self) {
        self.state().fail_reorders = true;
    }

    /// Albums created from now on are not returned by `list_albums`.
    pub fn hide_created_albums(&self) {
        self.state().hide_created_albums = true;
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    #[must_use]
    pub fn mutating_calls(&self) -> usize {
        self.state().calls.iter().filter(|c| c.is_mutating()).count()
    }

    /// Titles of every album creation attempted, in order.
    #[must_use]
    pub fn created_albums(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::CreateAlbum { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn reordered_albums(&self) -> Vec<AlbumId> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::ReorderAlbum(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }
}

impl PhotoService for MockService {
    async fn list_albums(&self) -> Result<Vec<Album>, ServiceError> {
        let mut state = self.state();
        state.calls.push(Call::ListAlbums);
        if state.fail_listing {
            return Err(ServiceError::Rejected("listing albums is broken".into()));
        }
        Ok(state.albums.clone())
    }

    async fn upload_photo(
        &self,
        file: &Path,
        title: &str,
        _description: &str,
        _tags: &[String],
    ) -> Result<PhotoId, ServiceError> {
        let mut state = self.state();
        state.calls.push(Call::UploadPhoto {
            file: file.to_path_buf(),
            title: title.into(),
        });
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if state.failing_uploads.contains(&file_name) {
            return Err(ServiceError::Rejected(format!("{file_name} is broken")));
        }
        state.photos_uploaded += 1;
        Ok(PhotoId(format!("photo-{}", state.photos_uploaded)))
    }

    async fn create_album(
        &self,
        title: &str,
        description: &str,
        cover: &PhotoId,
    ) -> Result<AlbumId, ServiceError> {
        let mut state = self.state();
        state.calls.push(Call::CreateAlbum {
            title: title.into(),
            description: description.into(),
            cover: cover.clone(),
        });
        if state.fail_creates {
            return Err(ServiceError::Status {
                status: 500,
                body: "creating albums is broken".into(),
            });
        }
        state.albums_created += 1;
        let id = AlbumId(format!("album-{}", state.albums_created));
        if !state.hide_created_albums {
            state.albums.push(Album {
                title: title.into(),
                id: id.clone(),
            });
        }
        Ok(id)
    }

    async fn add_photo(&self, album: &AlbumId, photo: &PhotoId) -> Result<(), ServiceError> {
        let mut state = self.state();
        state.calls.push(Call::AddPhoto {
            album: album.clone(),
            photo: photo.clone(),
        });
        if state.fail_adds {
            return Err(ServiceError::Rejected("adding photos is broken".into()));
        }
        Ok(())
    }

    async fn reorder_album(&self, album: &AlbumId) -> Result<(), ServiceError> {
        let mut state = self.state();
        state.calls.push(Call::ReorderAlbum(album.clone()));
        if state.fail_reorders {
            return Err(ServiceError::Rejected("reordering is broken".into()));
        }
        Ok(())
    }
}
