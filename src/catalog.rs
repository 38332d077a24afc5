// src/catalog.rs
// =============================================================================
// The catalog: content items and the external resources they link to.
//
// The catalog is produced by other tools; we only ever read it. Both shapes
// those tools have written over time are accepted:
//   [ {item}, {item}, ... ]
//   { "items": [ {item}, ... ], ...anything else... }
//
// Field values are read leniently. A missing field, a `null`, or a value of
// the wrong type (say a number where a URL should be) becomes an empty value.
// An empty URL is reported as `invalid` later on, so one sloppy entry shows up
// in the report instead of stopping every other link from being checked.
// Only a document that is not JSON at all, or not one of the two shapes
// above, is rejected.
// =============================================================================

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::error::SentinelError;

/// An external reference attached to a catalog item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Resource {
    /// "video", "article", "interactive", ... kept verbatim
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub channel: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatalogItem {
    #[serde(deserialize_with = "lenient_chapter")]
    pub chapter: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub pattern: String,
    #[serde(deserialize_with = "lenient_resources")]
    pub resources: Vec<Resource>,
}

// Strings are kept, anything else (null, numbers, objects) becomes ""
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        _ => String::new(),
    })
}

// Chapters are numbers, but "3" written as a string is still chapter 3
fn lenient_chapter<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

// A non-array `resources` means no resources. Inside the array, every
// element stays a resource (so it still gets exactly one result); an element
// that is not even an object becomes an empty resource, i.e. an invalid URL.
fn lenient_resources<'de, D>(deserializer: D) -> Result<Vec<Resource>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(values)) => values
            .into_iter()
            .map(|value| Resource::deserialize(value).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

// The `{ "items": [...] }` shape. Other top-level keys are ignored.
#[derive(Deserialize)]
struct WrappedCatalog {
    #[serde(default)]
    items: Vec<CatalogItem>,
}

/// Parses a catalog document from JSON text.
///
/// The shape is picked from the first character, so a broken document is
/// reported with the line and column serde_json stopped at.
pub fn parse_catalog(text: &str) -> Result<Vec<CatalogItem>, serde_json::Error> {
    if text.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<CatalogItem>>(text)
    } else {
        serde_json::from_str::<WrappedCatalog>(text).map(|wrapped| wrapped.items)
    }
}

/// Reads and parses the catalog at `path`.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogItem>, SentinelError> {
    let text = std::fs::read_to_string(path).map_err(|source| SentinelError::CatalogMissing {
        path: path.to_path_buf(),
        source,
    })?;

    let items = parse_catalog(&text).map_err(|source| SentinelError::CatalogMalformed {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), items = items.len(), "catalog loaded");
    Ok(items)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why deserialize_with instead of Option<String>?
//    - Option<String> accepts null, but still fails on `"url": 42`
//    - Going through serde_json::Value first lets us look at whatever is
//      there and decide, without ever failing
//
// 2. Why keep broken resources instead of skipping them?
//    - Every resource in the catalog must show up in the report exactly once
//    - A resource with no usable URL is something the maintainers need to see
// -----------------------------------------------------------------------------
