use std::fmt::{self, Write};

use ornitag_core::upload::UploadReport;

/// One line per failure in the report.
pub fn failures<W: Write>(report: &UploadReport, out: &mut W) -> fmt::Result {
    for failure in &report.failures {
        writeln!(out, "{failure}")?;
    }
    Ok(())
}

pub fn summary<W: Write>(report: &UploadReport, dry_run: bool, out: &mut W) -> fmt::Result {
    if dry_run {
        write!(out, "Dry run, nothing was changed: ")?;
    }
    writeln!(out, "{report}")?;

    if !report.albums_created.is_empty() {
        writeln!(out, "New albums:")?;
        for title in &report.albums_created {
            writeln!(out, "\t{title}")?;
        }
    }
    Ok(())
}
