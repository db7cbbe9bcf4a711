//! Normalization of user-supplied Chartmetric identifiers.
//!
//! Accepts bare ids (`123`), colon forms (`track:123`,
//! `chartmetric:track:123`) and URL/path forms
//! (`https://app.chartmetric.com/track/123?ref=x`).

use std::fmt;
use std::str::FromStr;

use log::warn;

/// Resource type embedded in a composite identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Artist,
    Track,
    Album,
    Playlist,
    Curator,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Artist => write!(f, "artist"),
            ResourceKind::Track => write!(f, "track"),
            ResourceKind::Album => write!(f, "album"),
            ResourceKind::Playlist => write!(f, "playlist"),
            ResourceKind::Curator => write!(f, "curator"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "artist" => Ok(ResourceKind::Artist),
            "track" => Ok(ResourceKind::Track),
            "album" => Ok(ResourceKind::Album),
            "playlist" => Ok(ResourceKind::Playlist),
            "curator" => Ok(ResourceKind::Curator),
            _ => anyhow::bail!(
                "Unknown resource kind: {}. Expected artist, track, album, playlist, or curator.",
                s
            ),
        }
    }
}

/// Extracts the trailing id from `raw`.
///
/// A type segment that does not match `kind` is logged as a warning; the id
/// is returned regardless.
pub fn normalize_id(kind: ResourceKind, raw: &str) -> String {
    let raw = raw.trim();

    let (found_kind, id) = if raw.contains('/') {
        let path = raw.split('?').next().unwrap_or(raw).trim_end_matches('/');
        match path.rsplit_once('/') {
            Some((prefix, id)) => (prefix.rsplit('/').next(), id),
            None => (None, path),
        }
    } else if let Some((prefix, id)) = raw.rsplit_once(':') {
        (prefix.rsplit(':').next(), id)
    } else {
        (None, raw)
    };

    if let Some(found) = found_kind.filter(|found| !found.is_empty()) {
        if !found.eq_ignore_ascii_case(&kind.to_string()) {
            warn!(
                "expected id of type {} but found type {} {}",
                kind, found, raw
            );
        }
    }

    id.to_string()
}
