//! The outcome of resolving a single photo against the metadata.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::metadata::{BirdEntry, TagSet};

/// Separates the two common names in a photo title.
pub const TITLE_SEPARATOR: &str = " / ";

/// Everything needed to upload one photo and file it into its album.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoDetails {
    pub filename: PathBuf,
    pub bird_code: String,
    pub tag_code: String,
    /// `"{common name} / {second common name}"`, also the name of the photo's album
    pub title: String,
    pub description: String,
    pub scientific_name: String,
    /// The common names, then the tag code's tags, then the scientific name
    pub tags: Vec<String>,
}

impl PhotoDetails {
    /// The description given to an album created for this photo.
    #[must_use]
    #[inline]
    pub fn album_description(&self) -> String {
        format!("Scientific name: {}", self.scientific_name)
    }
}

/// Why a photo cannot be uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidReason {
    /// The path isn't `<code>/<code>/<file>` below the photo directory.
    UnexpectedLayout,
    UnknownBird(String),
    UnknownTagCode(String),
    EmptyTagSet(String),
    MissingName { code: String, field: &'static str },
    DegenerateTitle,
    /// A code directory name isn't valid UTF-8, so it can't be looked up.
    NonUtf8Code,
}

impl fmt::Display for InvalidReason {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedLayout => write!(
                f,
                "expected the photo to be exactly two directories deep"
            ),
            Self::UnknownBird(code) => write!(f, "bird code \"{code}\" is not in the spreadsheet"),
            Self::UnknownTagCode(code) => {
                write!(f, "tag code \"{code}\" is not in the spreadsheet")
            }
            Self::EmptyTagSet(code) => write!(f, "tag code \"{code}\" has no tags"),
            Self::MissingName { code, field } => write!(f, "bird \"{code}\" has no {field}"),
            Self::DegenerateTitle => write!(f, "both common names are empty"),
            Self::NonUtf8Code => write!(f, "a code directory name is not valid UTF-8"),
        }
    }
}

/// A photo, either ready to upload or with the reason it is not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhotoRecord {
    Valid(PhotoDetails),
    Invalid {
        filename: PathBuf,
        reason: InvalidReason,
    },
}

impl PhotoRecord {
    /// Combine a photo's bird and tag set into a record, checking that the result is uploadable.
    #[must_use]
    #[inline]
    pub fn from_metadata(filename: PathBuf, bird: &BirdEntry, tag_set: &TagSet) -> Self {
        let title = format!(
            "{}{TITLE_SEPARATOR}{}",
            bird.common_name_a, bird.common_name_b
        );
        let names = [
            ("first common name", &bird.common_name_a),
            ("second common name", &bird.common_name_b),
            ("scientific name", &bird.scientific_name),
        ];

        let problem = if title == TITLE_SEPARATOR {
            Some(InvalidReason::DegenerateTitle)
        } else if let Some(&(field, _)) = names.iter().find(|(_, name)| name.is_empty()) {
            Some(InvalidReason::MissingName {
                code: bird.code.clone(),
                field,
            })
        } else if tag_set.tags.is_empty() {
            Some(InvalidReason::EmptyTagSet(tag_set.code.clone()))
        } else {
            None
        };
        if let Some(reason) = problem {
            return Self::Invalid { filename, reason };
        }

        let tags: Vec<String> = [&bird.common_name_a, &bird.common_name_b]
            .into_iter()
            .chain(&tag_set.tags)
            .chain([&bird.scientific_name])
            .cloned()
            .collect();

        let original = filename
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let description = format!(
            "Scientific name: {}\nOriginal file: {original}",
            bird.scientific_name
        );

        Self::Valid(PhotoDetails {
            filename,
            bird_code: bird.code.clone(),
            tag_code: tag_set.code.clone(),
            title,
            description,
            scientific_name: bird.scientific_name.clone(),
            tags,
        })
    }

    #[must_use]
    #[inline]
    pub fn filename(&self) -> &Path {
        match self {
            Self::Valid(details) => &details.filename,
            Self::Invalid { filename, .. } => filename,
        }
    }

    #[must_use]
    #[inline]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    #[must_use]
    #[inline]
    pub const fn as_valid(&self) -> Option<&PhotoDetails> {
        match self {
            Self::Valid(details) => Some(details),
            Self::Invalid { .. } => None,
        }
    }

    #[must_use]
    #[inline]
    pub fn into_valid(self) -> Option<PhotoDetails> {
        match self {
            Self::Valid(details) => Some(details),
            Self::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{blue_tit, forest_winter};

    use pretty_assertions::{assert_eq, assert_str_eq};
    use rstest::rstest;

    #[test]
    fn test_valid_record() {
        let record = PhotoRecord::from_metadata(
            PathBuf::from("root/B1/T1/photo1.jpg"),
            &blue_tit(),
            &forest_winter(),
        );

        let details = record.as_valid().unwrap();
        assert_str_eq!(details.title, "Blåmes / Blue Tit");
        assert_eq!(
            details.tags,
            vec![
                "Blåmes".to_string(),
                "Blue Tit".to_string(),
                "forest".to_string(),
                "winter".to_string(),
                "Cyanistes caeruleus".to_string(),
            ]
        );
        assert!(details.description.contains("Scientific name: Cyanistes caeruleus"));
        assert!(details.description.contains("Original file: photo1"));
        assert_str_eq!(
            details.album_description(),
            "Scientific name: Cyanistes caeruleus"
        );
        assert_eq!(details.bird_code, "B1");
        assert_eq!(details.tag_code, "T1");
    }

    #[rstest]
    #[case::both_names("", "", "Cyanistes caeruleus", InvalidReason::DegenerateTitle)]
    #[case::first_name(
        "",
        "Blue Tit",
        "Cyanistes caeruleus",
        InvalidReason::MissingName { code: "B1".into(), field: "first common name" }
    )]
    #[case::second_name(
        "Blåmes",
        "",
        "Cyanistes caeruleus",
        InvalidReason::MissingName { code: "B1".into(), field: "second common name" }
    )]
    #[case::scientific_name(
        "Blåmes",
        "Blue Tit",
        "",
        InvalidReason::MissingName { code: "B1".into(), field: "scientific name" }
    )]
    fn test_invalid_names(
        #[case] common_name_a: &str,
        #[case] common_name_b: &str,
        #[case] scientific_name: &str,
        #[case] expected: InvalidReason,
    ) {
        let bird = BirdEntry {
            code: "B1".into(),
            common_name_a: common_name_a.into(),
            common_name_b: common_name_b.into(),
            scientific_name: scientific_name.into(),
        };

        let record = PhotoRecord::from_metadata("B1/T1/a.jpg".into(), &bird, &forest_winter());

        assert_eq!(
            record,
            PhotoRecord::Invalid {
                filename: "B1/T1/a.jpg".into(),
                reason: expected,
            }
        );
    }

    #[test]
    fn test_empty_tag_set() {
        let tag_set = TagSet {
            code: "T9".into(),
            tags: vec![],
        };

        let record = PhotoRecord::from_metadata("B1/T9/a.jpg".into(), &blue_tit(), &tag_set);

        assert!(!record.is_valid());
        assert_eq!(record.filename(), Path::new("B1/T9/a.jpg"));
        assert_eq!(record.into_valid(), None);
    }

    #[rstest]
    #[case(InvalidReason::UnknownBird("BX".into()), "bird code \"BX\" is not in the spreadsheet")]
    #[case(InvalidReason::EmptyTagSet("T9".into()), "tag code \"T9\" has no tags")]
    #[case(InvalidReason::NonUtf8Code, "a code directory name is not valid UTF-8")]
    #[case(
        InvalidReason::MissingName { code: "B1".into(), field: "scientific name" },
        "bird \"B1\" has no scientific name"
    )]
    fn test_reason_display(#[case] reason: InvalidReason, #[case] expected: &str) {
        assert_str_eq!(reason.to_string(), expected);
    }
}
