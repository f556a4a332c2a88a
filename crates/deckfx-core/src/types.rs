//! Common types for Deckfx
//!
//! Track identity and the metadata contract supplied by the catalog layer.
//! Everything else in the engine derives from these plus user intent.

use std::fmt;

/// Track identifier, as assigned by the catalog layer
///
/// Opaque to the engine; used to key per-track BPM overrides and to guard
/// against stale rate updates after a track switch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(pub String);

impl TrackId {
    /// Create a track id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Track metadata supplied by the catalog/browsing layer
///
/// `original_bpm` is the intrinsic tempo of the loaded track and is
/// immutable for the track's lifetime; manual tempo adjustments live in the
/// tempo model, never here.
#[derive(Debug, Clone)]
pub struct TrackInfo {
    /// Catalog identifier
    pub id: TrackId,
    /// Intrinsic tempo as detected/stored by the catalog
    pub original_bpm: f64,
    /// Location of the audio asset (opaque to the engine)
    pub audio_url: String,
    /// Total duration in seconds
    pub duration_seconds: f64,
}

impl TrackInfo {
    /// Create new track metadata
    pub fn new(
        id: impl Into<TrackId>,
        original_bpm: f64,
        audio_url: impl Into<String>,
        duration_seconds: f64,
    ) -> Self {
        Self {
            id: id.into(),
            original_bpm,
            audio_url: audio_url.into(),
            duration_seconds,
        }
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
