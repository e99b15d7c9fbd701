//! Finding photos on disk and matching them to the metadata through their directory names.
//!
//! Photos live exactly two directories below the root: `<bird code>/<tag code>/photo.jpg`,
//! or `<tag code>/<bird code>/photo.jpg` when the roles are swapped.

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::{
    metadata::MetadataStore,
    photo::{InvalidReason, PhotoRecord},
};

/// File extensions (compared case-insensitively) considered to be photos.
pub const PHOTO_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

/// Find every `*/*/*.{jpg,jpeg}` below `root`, in a deterministic (sorted) order.
///
/// # Errors
///
/// Returns an error if `root` is not a directory.
#[inline]
pub fn discover(root: &Path) -> io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        ));
    }

    let photos = WalkDir::new(root)
        .min_depth(3)
        .max_depth(3)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| {
            entry
                .map_err(|e| warn!("Error reading path: {e}"))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file() && is_photo(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();

    Ok(photos)
}

fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            PHOTO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Resolves photo paths below `root` into [`PhotoRecord`]s.
#[derive(Debug)]
pub struct PathResolver<'a> {
    store: &'a MetadataStore,
    root: PathBuf,
    roles_swapped: bool,
}

impl<'a> PathResolver<'a> {
    #[must_use]
    #[inline]
    pub fn new(store: &'a MetadataStore, root: impl Into<PathBuf>, roles_swapped: bool) -> Self {
        Self {
            store,
            root: root.into(),
            roles_swapped,
        }
    }

    /// Resolve a single photo.
    ///
    /// `file` may be given relative to the root, or with the root as a prefix.
    #[must_use]
    #[inline]
    pub fn resolve(&self, file: &Path) -> PhotoRecord {
        let relative = file.strip_prefix(&self.root).unwrap_or(file);
        let filename = self.root.join(relative);

        let (first, second) = match code_segments(relative) {
            Ok(codes) => codes,
            Err(reason) => return PhotoRecord::Invalid { filename, reason },
        };
        let (bird_code, tag_code) = if self.roles_swapped {
            (second, first)
        } else {
            (first, second)
        };
        debug!(
            "{}: bird code \"{bird_code}\", tag code \"{tag_code}\"",
            relative.display()
        );

        let Some(bird) = self.store.bird(bird_code) else {
            return PhotoRecord::Invalid {
                filename,
                reason: InvalidReason::UnknownBird(bird_code.to_string()),
            };
        };
        let Some(tag_set) = self.store.tag_set(tag_code) else {
            return PhotoRecord::Invalid {
                filename,
                reason: InvalidReason::UnknownTagCode(tag_code.to_string()),
            };
        };

        PhotoRecord::from_metadata(filename, bird, tag_set)
    }

    #[must_use]
    #[inline]
    pub fn resolve_all(&self, files: &[PathBuf]) -> Vec<PhotoRecord> {
        files.iter().map(|file| self.resolve(file)).collect()
    }
}

/// The two directory names of a `<dir>/<dir>/<file>` path.
fn code_segments(relative: &Path) -> Result<(&str, &str), InvalidReason> {
    let mut components = relative.components();
    let (
        Some(Component::Normal(first)),
        Some(Component::Normal(second)),
        Some(Component::Normal(_)),
        None,
    ) = (
        components.next(),
        components.next(),
        components.next(),
        components.next(),
    )
    else {
        return Err(InvalidReason::UnexpectedLayout);
    };

    match (first.to_str(), second.to_str()) {
        (Some(first), Some(second)) => Ok((first, second)),
        _ => Err(InvalidReason::NonUtf8Code),
    }
}
