//! Access to the sheets of a spreadsheet, as rows of plain strings.

use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::Path,
};

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};

use crate::errors::MetadataError;

/// A grid of cells, row-major, every cell rendered as a trimmed string.
pub type Rows = Vec<Vec<String>>;

/// Something that can hand out the contents of a named sheet.
pub trait Workbook {
    /// The rows of the sheet named `sheet`, starting at the sheet's very first row,
    /// or `None` if the workbook has no such sheet.
    ///
    /// # Errors
    ///
    /// Returns an error if the sheet exists but could not be read.
    fn rows(&mut self, sheet: &str) -> Result<Option<Rows>, MetadataError>;
}

/// A workbook on disk (`.xlsx`, `.xlsm`, `.xls`, or `.ods`), read with [`calamine`].
pub struct CalamineWorkbook {
    sheets: Sheets<BufReader<File>>,
}

impl CalamineWorkbook {
    /// Open the workbook at `path`, picking the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not a spreadsheet calamine understands.
    #[inline]
    pub fn open(path: &Path) -> Result<Self, MetadataError> {
        if !path.is_file() {
            return Err(MetadataError::NotFound(path.to_path_buf()));
        }

        let sheets = open_workbook_auto(path).map_err(|e| MetadataError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(Self { sheets })
    }
}

impl Workbook for CalamineWorkbook {
    #[inline]
    fn rows(&mut self, sheet: &str) -> Result<Option<Rows>, MetadataError> {
        if !self.sheets.sheet_names().iter().any(|name| name == sheet) {
            return Ok(None);
        }

        let range = self
            .sheets
            .worksheet_range(sheet)
            .map_err(|e| MetadataError::Read {
                sheet: sheet.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Some(range_to_rows(&range)))
    }
}

/// A calamine range only covers the used area of a sheet, so pad it back out to start at `A1`,
/// keeping row and column positions meaningful.
fn range_to_rows(range: &Range<Data>) -> Rows {
    let (first_row, first_col) = range.start().unwrap_or((0, 0));

    let padding = std::iter::repeat_with(Vec::new).take(first_row as usize);
    let used = range.rows().map(|row| {
        std::iter::repeat_n(String::new(), first_col as usize)
            .chain(row.iter().map(|cell| cell.to_string().trim().to_string()))
            .collect()
    });

    padding.chain(used).collect()
}

/// A workbook held entirely in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryWorkbook {
    sheets: HashMap<String, Rows>,
}

impl MemoryWorkbook {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a sheet.
    #[must_use]
    #[inline]
    pub fn with_sheet<R, C>(mut self, name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.as_ref().trim().to_string())
                    .collect()
            })
            .collect();
        self.sheets.insert(name.to_string(), rows);
        self
    }
}

impl Workbook for MemoryWorkbook {
    #[inline]
    fn rows(&mut self, sheet: &str) -> Result<Option<Rows>, MetadataError> {
        Ok(self.sheets.get(sheet).cloned())
    }
}
