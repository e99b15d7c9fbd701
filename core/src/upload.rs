//! Uploading photos and filing them into per-species albums.
//!
//! File transfers may overlap (see [`RunOptions::max_concurrent_uploads`]), but everything that
//! touches albums happens one photo at a time, in input order, so two photos sharing a title
//! can never both decide to create its album.

use std::{collections::HashSet, fmt, path::PathBuf, pin::pin};

use futures::{StreamExt as _, stream};
use log::{debug, error, info, warn};
use tracing::instrument;

use crate::{
    album::AlbumDirectory,
    config::RunOptions,
    errors::ServiceError,
    photo::PhotoDetails,
    service::{AlbumId, PhotoId, PhotoService},
};

/// Titles of the albums touched during a run, in the order they were first touched.
///
/// A title only becomes pending once a photo was filed into its album. A photo whose upload or
/// album step failed leaves nothing to reorder, unless another photo with that title succeeds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingReorder {
    seen: HashSet<String>,
    titles: Vec<String>,
}

impl PendingReorder {
    /// Returns `false` if the title was already pending.
    #[inline]
    pub fn insert(&mut self, title: &str) -> bool {
        if self.seen.contains(title) {
            return false;
        }
        self.seen.insert(title.to_string());
        self.titles.push(title.to_string());
        true
    }

    #[must_use]
    #[inline]
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    #[must_use]
    #[inline]
    pub fn into_titles(self) -> Vec<String> {
        self.titles
    }
}

/// Something that went wrong during a run. None of these stop the rest of the batch.
#[derive(Debug)]
pub enum UploadFailure {
    Photo {
        filename: PathBuf,
        error: ServiceError,
    },
    MissingAlbum {
        title: String,
    },
    /// Creating the photo's album already failed earlier in the run, so it wasn't retried.
    AlbumNotCreated {
        filename: PathBuf,
        title: String,
    },
    Reorder {
        title: String,
        error: ServiceError,
    },
}

impl fmt::Display for UploadFailure {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photo { filename, error } => write!(f, "{}: {error}", filename.display()),
            Self::MissingAlbum { title } => {
                write!(f, "album \"{title}\" is missing, it was not reordered")
            }
            Self::AlbumNotCreated { filename, title } => write!(
                f,
                "{}: album \"{title}\" could not be created, the photo was not filed into it",
                filename.display()
            ),
            Self::Reorder { title, error } => {
                write!(f, "failed to reorder album \"{title}\": {error}")
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct UploadReport {
    /// Photos that were uploaded and filed into their album (or would have been, in a dry run)
    pub uploaded: usize,
    /// Titles of the albums created, in creation order
    pub albums_created: Vec<String>,
    /// Titles of every album a photo was filed into, each once
    pub reorder_candidates: Vec<String>,
    pub reordered: usize,
    pub failures: Vec<UploadFailure>,
}

impl UploadReport {
    #[must_use]
    #[inline]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for UploadReport {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} photos uploaded, {} albums created, {} of {} albums reordered, {} failures",
            self.uploaded,
            self.albums_created.len(),
            self.reordered,
            self.reorder_candidates.len(),
            self.failures.len()
        )
    }
}

pub struct UploadOrchestrator<'a, S> {
    service: &'a S,
    options: RunOptions,
}

impl<'a, S: PhotoService> UploadOrchestrator<'a, S> {
    #[must_use]
    #[inline]
    pub const fn new(service: &'a S, options: RunOptions) -> Self {
        Self { service, options }
    }

    /// Upload every photo, file each into the album named by its title, then reorder every
    /// album that was touched, once.
    ///
    /// `albums` should already hold the service's current albums
    /// (see [`AlbumDirectory::fetch_all`]).
    ///
    /// A title is queued for reordering once a photo has been filed into its album, so a title
    /// whose every photo failed is never reordered. If creating an album fails, the other photos
    /// with that title are reported as failures without another creation attempt.
    ///
    /// In a dry run nothing is changed on the service, but every decision is still made and
    /// logged, and the returned report lists the same albums as a real run would.
    #[instrument(skip_all, fields(photos = records.len(), dry_run = self.options.dry_run))]
    #[inline]
    pub async fn run(&self, records: &[PhotoDetails], albums: &mut AlbumDirectory) -> UploadReport {
        let mut report = UploadReport::default();
        let mut pending = PendingReorder::default();
        // creating an album is attempted at most once per title
        let mut failed_albums: HashSet<String> = HashSet::new();

        let mut uploads = pin!(
            stream::iter(records)
                .map(|record| async move { (record, self.upload(record).await) })
                .buffered(self.options.max_concurrent_uploads.max(1))
        );

        while let Some((record, uploaded)) = uploads.next().await {
            let photo = match uploaded {
                Ok(photo) => photo,
                Err(error) => {
                    error!("Failed to upload {}: {error}", record.filename.display());
                    report.failures.push(UploadFailure::Photo {
                        filename: record.filename.clone(),
                        error,
                    });
                    continue;
                }
            };

            if failed_albums.contains(&record.title) {
                error!(
                    "Not filing {} ({photo}): album \"{}\" could not be created",
                    record.filename.display(),
                    record.title
                );
                report.failures.push(UploadFailure::AlbumNotCreated {
                    filename: record.filename.clone(),
                    title: record.title.clone(),
                });
                continue;
            }

            if let Err(error) = self.file_into_album(record, &photo, albums, &mut report).await {
                if albums.get(&record.title).is_none() {
                    failed_albums.insert(record.title.clone());
                }
                error!(
                    "Failed to put {} into album \"{}\": {error}",
                    record.filename.display(),
                    record.title
                );
                report.failures.push(UploadFailure::Photo {
                    filename: record.filename.clone(),
                    error,
                });
                continue;
            }

            report.uploaded += 1;
            pending.insert(&record.title);
        }

        self.reorder(pending, albums, &mut report).await;

        info!("Upload finished: {report}");
        report
    }

    async fn upload(&self, record: &PhotoDetails) -> Result<PhotoId, ServiceError> {
        if self.options.dry_run {
            info!(
                "[dry run] Would upload {} as \"{}\"",
                record.filename.display(),
                record.title
            );
            return Ok(PhotoId::dry_run());
        }

        info!(
            "Uploading {} as \"{}\"",
            record.filename.display(),
            record.title
        );
        debug!("Tags: {:?}", record.tags);
        self.service
            .upload_photo(
                &record.filename,
                &record.title,
                &record.description,
                &record.tags,
            )
            .await
    }

    async fn file_into_album(
        &self,
        record: &PhotoDetails,
        photo: &PhotoId,
        albums: &mut AlbumDirectory,
        report: &mut UploadReport,
    ) -> Result<(), ServiceError> {
        if let Some(album) = albums.get(&record.title) {
            debug!("Adding photo {photo} to album \"{}\" ({})", album.title, album.id);
            if !self.options.dry_run {
                self.service.add_photo(&album.id, photo).await?;
            }
            return Ok(());
        }

        if self.options.dry_run {
            info!("[dry run] Would create album \"{}\"", record.title);
            albums.remember(&record.title, AlbumId::dry_run());
            report.albums_created.push(record.title.clone());
            return Ok(());
        }

        info!("Creating album \"{}\"", record.title);
        let id = self
            .service
            .create_album(&record.title, &record.album_description(), photo)
            .await?;
        report.albums_created.push(record.title.clone());

        // the service is the source of truth for album ids and titles, so look again
        match albums.fetch_all(self.service).await.map(|_| ()) {
            Ok(()) if albums.get(&record.title).is_some() => {}
            Ok(()) => {
                warn!(
                    "Album \"{}\" ({id}) was created but isn't listed by the service yet",
                    record.title
                );
                albums.remember(&record.title, id);
            }
            Err(e) => {
                warn!(
                    "Could not refresh albums after creating \"{}\" ({id}): {e}",
                    record.title
                );
                albums.remember(&record.title, id);
            }
        }

        Ok(())
    }

    async fn reorder(
        &self,
        pending: PendingReorder,
        albums: &AlbumDirectory,
        report: &mut UploadReport,
    ) {
        for title in pending.titles() {
            let Some(album) = albums.get(title) else {
                error!("Album \"{title}\" is missing from the album directory, not reordering it");
                report.failures.push(UploadFailure::MissingAlbum {
                    title: title.clone(),
                });
                continue;
            };

            if self.options.dry_run {
                info!("[dry run] Would reorder album \"{title}\"");
                continue;
            }

            debug!("Reordering album \"{title}\" ({})", album.id);
            match self.service.reorder_album(&album.id).await {
                Ok(()) => report.reordered += 1,
                Err(error) => {
                    error!("Failed to reorder album \"{title}\": {error}");
                    report.failures.push(UploadFailure::Reorder {
                        title: title.clone(),
                        error,
                    });
                }
            }
        }

        report.reorder_candidates = pending.into_titles();
    }
}
