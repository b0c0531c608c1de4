//! Parser for the relation-link (`Link`) header.
//!
//! # Design
//! The header is a comma-separated list of `<url>; rel="name"` entries.
//! `next`, `prev` and `first` map to their own slots; every other relation
//! name, `last` included, lands in `last`. Existing consumers rely on that
//! fold, so it is kept as is.
//!
//! Entries are validated strictly: anything that is not exactly
//! `<url>; rel="name"` is rejected instead of being sliced blindly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Navigation links extracted from a `Link` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    pub next: Option<String>,
    pub previous: Option<String>,
    pub first: Option<String>,
    pub last: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkParseError {
    #[error("link entry {0:?} is not of the form `<url>; rel=\"name\"`")]
    MissingSeparator(String),

    #[error("link target {0:?} is not wrapped in angle brackets")]
    UnbracketedUrl(String),

    #[error("relation {0:?} is not of the form rel=\"name\"")]
    MalformedRelation(String),
}

pub fn parse_link_header(value: &str) -> Result<PageLinks, LinkParseError> {
    let mut links = PageLinks::default();

    for entry in value.split(',') {
        let mut parts = entry.split(';');
        let (url_part, rel_part) = match (parts.next(), parts.next(), parts.next()) {
            (Some(url), Some(rel), None) => (url.trim(), rel.trim()),
            _ => return Err(LinkParseError::MissingSeparator(entry.trim().to_string())),
        };

        let url = url_part
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or_else(|| LinkParseError::UnbracketedUrl(url_part.to_string()))?;

        let rel = rel_part
            .strip_prefix("rel=\"")
            .and_then(|s| s.strip_suffix('"'))
            .ok_or_else(|| LinkParseError::MalformedRelation(rel_part.to_string()))?;

        let slot = match rel {
            "next" => &mut links.next,
            "prev" => &mut links.previous,
            "first" => &mut links.first,
            _ => &mut links.last,
        };
        *slot = Some(url.to_string());
    }

    Ok(links)
}
