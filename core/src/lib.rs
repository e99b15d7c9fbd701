#![deny(clippy::missing_inline_in_public_items)]

use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use errors::DirectoryError;

pub mod album;
pub mod config;
pub mod errors;
pub mod logger;
pub mod metadata;
pub mod photo;
pub mod resolver;
pub mod service;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod upload;
pub mod validation;

use crate::{
    config::RunOptions, metadata::MetadataStore, photo::PhotoRecord, resolver::PathResolver,
};

/// Get the config directory for ornitag.
///
/// # Errors
///
/// Returns an error if the platform has no notion of a per-user config directory.
#[inline]
pub fn get_config_dir() -> Result<PathBuf, DirectoryError> {
    directories::ProjectDirs::from("", "", "ornitag")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(DirectoryError::Config)
}

/// Format a duration as `seconds.milliseconds`, e.g. `12.034`.
#[must_use]
#[inline]
pub fn format_duration(duration: &Duration) -> String {
    format!("{}.{:03}", duration.as_secs(), duration.subsec_millis())
}

/// Scan `root` for photos and resolve every one of them against the metadata.
///
/// Records come back in discovery order (sorted by path).
///
/// # Errors
///
/// Returns an error if `root` is not a readable directory.
#[inline]
pub fn collect_records(
    root: &Path,
    store: &MetadataStore,
    options: &RunOptions,
) -> io::Result<Vec<PhotoRecord>> {
    let files = resolver::discover(root)?;
    log::info!("Found {} photos under {}", files.len(), root.display());

    let resolver = PathResolver::new(store, root, options.roles_swapped);
    Ok(resolver.resolve_all(&files))
}
