//! Defines the [`ContentItem`] type and the logic for parsing a manifest
//! document into a list of items. See [`parse_manifest`] for how malformed
//! entries are treated.

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fmt;
use tracing::warn;
use url::Url;

/// The date format used by manifest entries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The layout hint applied to cards whose entry has no `aspect`.
pub const DEFAULT_ASPECT: &str = "aspect-video";

/// Represents one entry in the content manifest.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// The title of the item.
    pub title: String,

    /// A short description shown under the title.
    pub description: String,

    /// The calendar date of the item. Only used for ordering and display.
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,

    /// The category tag. Matching against it is exact and case-sensitive.
    pub category: String,

    /// The external link the card points to.
    pub link_url: Url,

    /// The card image. It may be unreachable when the page is viewed.
    pub image_url: Url,

    /// An optional layout hint (a CSS class).
    #[serde(default)]
    pub aspect: Option<String>,
}

impl ContentItem {
    /// Returns the item's layout hint, falling back to [`DEFAULT_ASPECT`].
    pub fn aspect(&self) -> &str {
        match &self.aspect {
            Some(aspect) if !aspect.is_empty() => aspect,
            _ => DEFAULT_ASPECT,
        }
    }
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&s, DATE_FORMAT)
        .map_err(|e| D::Error::custom(format!("invalid date `{}`: {}", s, e)))
}

/// Parses a manifest document. The document must be a JSON array. Each entry
/// is validated against the [`ContentItem`] shape; in lenient mode
/// (`strict == false`) entries that don't fit are skipped with a warning,
/// while in strict mode the first such entry fails the whole manifest.
pub fn parse_manifest(input: &str, strict: bool) -> Result<Vec<ContentItem>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(input)?;
    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<ContentItem>(entry) {
            Ok(item) => items.push(item),
            Err(err) if strict => return Err(Error::Entry { index, err }),
            Err(err) => warn!(index, error = %err, "skipping malformed manifest entry"),
        }
    }
    Ok(items)
}

/// Represents the result of parsing a manifest.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a manifest document.
#[derive(Debug)]
pub enum Error {
    /// Returned when the document isn't a JSON array.
    Json(serde_json::Error),

    /// Returned in strict mode when an entry doesn't fit the item shape.
    Entry { index: usize, err: serde_json::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Json(err) => write!(f, "invalid manifest: {}", err),
            Error::Entry { index, err } => {
                write!(f, "invalid manifest entry {}: {}", index, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(err) => Some(err),
            Error::Entry { index: _, err } => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_json`] deserialization functions.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}
