//! The metadata spreadsheet: which bird each bird code stands for, and which tags each tag
//! code expands to.
//!
//! The workbook needs two sheets:
//!
//! - `Birds`: one header row, then `code | common name | second common name | scientific name`.
//! - `Tags`: two header rows, then `code | tag | tag | ...` with as many tags as needed.
//!
//! A row whose first cell is `-` ends its sheet; everything below it is ignored.

pub mod workbook;

use std::{collections::HashMap, path::Path};

use log::{debug, info, warn};

use crate::errors::MetadataError;
use workbook::{CalamineWorkbook, Rows, Workbook};

pub const BIRDS_SHEET: &str = "Birds";
pub const TAGS_SHEET: &str = "Tags";
/// First-column value that marks the end of a sheet.
pub const END_OF_SHEET: &str = "-";

/// 0-based index of the first data row of the `Birds` sheet.
const BIRDS_FIRST_ROW: usize = 1;
/// 0-based index of the first data row of the `Tags` sheet.
const TAGS_FIRST_ROW: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BirdEntry {
    pub code: String,
    pub common_name_a: String,
    pub common_name_b: String,
    pub scientific_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagSet {
    pub code: String,
    pub tags: Vec<String>,
}

/// Lookup tables built from the metadata spreadsheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataStore {
    birds: HashMap<String, BirdEntry>,
    tags: HashMap<String, TagSet>,
}

impl MetadataStore {
    /// Read and validate the spreadsheet at `path`.
    ///
    /// # Errors
    ///
    /// Any malformed row, or a missing file or sheet, is fatal: see [`MetadataError`].
    #[inline]
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        info!("Loading metadata from {}", path.display());
        let mut workbook = CalamineWorkbook::open(path)?;
        Self::from_workbook(&mut workbook)
    }

    /// Build the lookup tables from an already opened workbook.
    ///
    /// # Errors
    ///
    /// See [`MetadataStore::load`].
    #[inline]
    pub fn from_workbook<W: Workbook>(workbook: &mut W) -> Result<Self, MetadataError> {
        let birds = workbook
            .rows(BIRDS_SHEET)?
            .ok_or_else(|| MetadataError::MissingSheet(BIRDS_SHEET.to_string()))?;
        let tags = workbook
            .rows(TAGS_SHEET)?
            .ok_or_else(|| MetadataError::MissingSheet(TAGS_SHEET.to_string()))?;

        let store = Self {
            birds: parse_birds(&birds)?,
            tags: parse_tags(&tags)?,
        };
        info!(
            "Loaded {} bird codes and {} tag codes",
            store.birds.len(),
            store.tags.len()
        );

        Ok(store)
    }

    #[must_use]
    #[inline]
    pub fn bird(&self, code: &str) -> Option<&BirdEntry> {
        self.birds.get(code)
    }

    #[must_use]
    #[inline]
    pub fn tag_set(&self, code: &str) -> Option<&TagSet> {
        self.tags.get(code)
    }

    #[must_use]
    #[inline]
    pub const fn birds(&self) -> &HashMap<String, BirdEntry> {
        &self.birds
    }

    #[must_use]
    #[inline]
    pub const fn tags(&self) -> &HashMap<String, TagSet> {
        &self.tags
    }
}

/// Iterate the data rows of a sheet as `(1-based row number, cells)`, stopping at the
/// [`END_OF_SHEET`] marker.
fn data_rows(rows: &Rows, first_row: usize) -> impl Iterator<Item = (usize, &[String])> {
    rows.iter()
        .enumerate()
        .skip(first_row)
        .map(|(i, row)| (i + 1, row.as_slice()))
        .take_while(|(row_number, row)| {
            let done = cell(row, 0) == END_OF_SHEET;
            if done {
                debug!("End of sheet marker at row {row_number}");
            }
            !done
        })
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map_or("", |cell| cell.trim())
}

fn parse_birds(rows: &Rows) -> Result<HashMap<String, BirdEntry>, MetadataError> {
    let mut birds = HashMap::new();

    for (row, cells) in data_rows(rows, BIRDS_FIRST_ROW) {
        let code = cell(cells, 0);
        let names = [
            ("first common name", cell(cells, 1)),
            ("second common name", cell(cells, 2)),
            ("scientific name", cell(cells, 3)),
        ];

        if code.is_empty() {
            if names.iter().any(|(_, name)| !name.is_empty()) {
                return Err(MetadataError::MissingBirdCode { row });
            }
            continue;
        }

        if let Some(&(field, _)) = names.iter().find(|(_, name)| name.is_empty()) {
            return Err(MetadataError::IncompleteBird {
                row,
                code: code.to_string(),
                field,
            });
        }

        let [(_, common_name_a), (_, common_name_b), (_, scientific_name)] = names;
        let entry = BirdEntry {
            code: code.to_string(),
            common_name_a: common_name_a.to_string(),
            common_name_b: common_name_b.to_string(),
            scientific_name: scientific_name.to_string(),
        };
        if birds.insert(code.to_string(), entry).is_some() {
            warn!(
                "Birds row {row}: bird code \"{code}\" is defined more than once, using this row"
            );
        }
    }

    Ok(birds)
}

fn parse_tags(rows: &Rows) -> Result<HashMap<String, TagSet>, MetadataError> {
    let mut tag_sets = HashMap::new();

    for (row, cells) in data_rows(rows, TAGS_FIRST_ROW) {
        let code = cell(cells, 0);
        let tags: Vec<String> = cells
            .iter()
            .skip(1)
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(ToString::to_string)
            .collect();

        if code.is_empty() {
            if !tags.is_empty() {
                return Err(MetadataError::MissingTagCode { row });
            }
            continue;
        }

        if tags.is_empty() {
            warn!("Tags row {row}: tag code \"{code}\" has no tags");
        }

        let tag_set = TagSet {
            code: code.to_string(),
            tags,
        };
        if tag_sets.insert(code.to_string(), tag_set).is_some() {
            warn!("Tags row {row}: tag code \"{code}\" is defined more than once, using this row");
        }
    }

    Ok(tag_sets)
}
