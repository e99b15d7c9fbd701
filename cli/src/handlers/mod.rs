pub mod printing;
pub mod utils;

#[cfg(test)]
mod smoke_tests;

use std::{
    fmt::Write,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, bail};
use log::{debug, info};

use ornitag_core::{
    album::AlbumDirectory,
    collect_records,
    config::{RunOptions, Settings},
    format_duration,
    metadata::MetadataStore,
    photo::PhotoDetails,
    service::{PhotoService, http::HttpPhotoService},
    upload::UploadOrchestrator,
    validation,
};

use crate::Flags;

/// Run the whole pipeline the flags ask for.
///
/// Nothing is sent to the photo service unless every photo under the directory is valid.
pub async fn run<W1: Write + Send, W2: Write + Send>(
    flags: &Flags,
    settings: &Settings,
    stdout: &mut W1,
    stderr: &mut W2,
) -> anyhow::Result<()> {
    let options = settings.run_options(flags.dry_run, flags.swap);
    let spreadsheet = spreadsheet_path(flags, settings);

    let store = prepare(&flags.directory, &spreadsheet)?;
    let records = resolve_and_validate(&flags.directory, &store, &options, stderr)?;

    if flags.check {
        writeln!(stdout, "All {} photos are valid", records.len())?;
        return Ok(());
    }

    let service = HttpPhotoService::new(&settings.service)
        .context("Failed to set up the photo service client")?;
    upload(&service, &records, options, stdout, stderr).await
}

/// `--spreadsheet` wins over `upload.spreadsheet` from the config.
fn spreadsheet_path(flags: &Flags, settings: &Settings) -> PathBuf {
    flags
        .spreadsheet
        .clone()
        .unwrap_or_else(|| settings.spreadsheet_path(&flags.directory))
}

/// Check the photo directory exists and load the metadata spreadsheet.
pub fn prepare(directory: &Path, spreadsheet: &Path) -> anyhow::Result<MetadataStore> {
    if !directory.is_dir() {
        bail!("{} is not a directory", directory.display());
    }

    let start = Instant::now();
    let store = MetadataStore::load(spreadsheet)
        .with_context(|| format!("Failed to load metadata from {}", spreadsheet.display()))?;
    info!(
        "Loaded {} birds and {} tag codes from {} in {}s",
        store.birds().len(),
        store.tags().len(),
        spreadsheet.display(),
        format_duration(&start.elapsed())
    );

    Ok(store)
}

/// Resolve every photo under `directory`, reporting each invalid one to `stderr`.
///
/// # Errors
///
/// Fails if any photo is invalid, after all of them have been reported.
pub fn resolve_and_validate<W: Write>(
    directory: &Path,
    store: &MetadataStore,
    options: &RunOptions,
    stderr: &mut W,
) -> anyhow::Result<Vec<PhotoDetails>> {
    let records = collect_records(directory, store, options)
        .with_context(|| format!("Failed to scan {}", directory.display()))?;

    if !validation::aggregate(&records, stderr)? {
        let invalid = records.iter().filter(|record| !record.is_valid()).count();
        bail!(
            "{invalid} of {} photos are invalid, nothing was uploaded",
            records.len()
        );
    }

    debug!("All {} photos are valid", records.len());
    Ok(validation::into_uploadable(records))
}

/// Upload validated photos and sort them into albums.
///
/// # Errors
///
/// Fails if the existing albums could not be listed, or if anything in the batch failed.
/// A failure doesn't stop the rest of the batch.
pub async fn upload<S: PhotoService, W1: Write + Send, W2: Write + Send>(
    service: &S,
    records: &[PhotoDetails],
    options: RunOptions,
    stdout: &mut W1,
    stderr: &mut W2,
) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut albums = AlbumDirectory::new();
    albums
        .fetch_all(service)
        .await
        .context("Failed to list the existing albums")?;
    debug!("{} albums already exist", albums.len());

    let report = UploadOrchestrator::new(service, options)
        .run(records, &mut albums)
        .await;
    info!(
        "Finished in {}s: {report}",
        format_duration(&start.elapsed())
    );

    printing::failures(&report, stderr)?;
    printing::summary(&report, options.dry_run, stdout)?;

    if !report.is_success() {
        bail!("{} steps of the upload failed", report.failures.len());
    }
    Ok(())
}
