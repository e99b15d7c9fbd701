//! The gate between resolving photos and uploading them.

use std::fmt::Write;

use log::warn;

use crate::photo::{PhotoDetails, PhotoRecord};

/// Check that every record is valid.
///
/// Writes one line to `out` for each invalid record, naming the file and what is wrong with it,
/// so every problem can be fixed in one go. An empty set of records is valid.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
#[inline]
pub fn aggregate<W: Write>(records: &[PhotoRecord], out: &mut W) -> Result<bool, std::fmt::Error> {
    let mut valid = true;

    for record in records {
        if let PhotoRecord::Invalid { filename, reason } = record {
            warn!("Invalid photo {}: {reason}", filename.display());
            writeln!(out, "{}: {reason}", filename.display())?;
            valid = false;
        }
    }

    Ok(valid)
}

/// Unwrap the records of a run that passed [`aggregate`].
///
/// # Panics
///
/// In debug builds, panics if any record is invalid.
#[must_use]
#[inline]
pub fn into_uploadable(records: Vec<PhotoRecord>) -> Vec<PhotoDetails> {
    debug_assert!(
        records.iter().all(PhotoRecord::is_valid),
        "invalid records must be rejected before uploading"
    );
    records.into_iter().filter_map(PhotoRecord::into_valid).collect()
}
