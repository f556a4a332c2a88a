//! Hot-cue timeline service
//!
//! Stores named time markers per track, persisted as a single JSON blob
//! keyed by track filename and observable through subscriptions. Storage
//! failures degrade to in-memory state: a corrupt persisted blob never
//! crashes the caller, only durability is lost.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Hot-cue slot labels, one cue per label per track
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CueLabel {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl CueLabel {
    /// All labels in slot order
    pub const ALL: [CueLabel; 8] = [
        CueLabel::A,
        CueLabel::B,
        CueLabel::C,
        CueLabel::D,
        CueLabel::E,
        CueLabel::F,
        CueLabel::G,
        CueLabel::H,
    ];

    /// Single-character identifier
    pub fn as_char(&self) -> char {
        match self {
            CueLabel::A => 'A',
            CueLabel::B => 'B',
            CueLabel::C => 'C',
            CueLabel::D => 'D',
            CueLabel::E => 'E',
            CueLabel::F => 'F',
            CueLabel::G => 'G',
            CueLabel::H => 'H',
        }
    }

    /// Parse a single-character identifier
    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.as_char() == c.to_ascii_uppercase())
    }

    /// Default pad color for this slot (waveform overlay palette)
    pub fn default_color(&self) -> &'static str {
        match self {
            CueLabel::A => "#FF3B30",
            CueLabel::B => "#FF9500",
            CueLabel::C => "#FFCC00",
            CueLabel::D => "#34C759",
            CueLabel::E => "#00C7BE",
            CueLabel::F => "#007AFF",
            CueLabel::G => "#AF52DE",
            CueLabel::H => "#FF2D55",
        }
    }
}

/// A named time marker on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotCue {
    /// Slot label (A-H)
    pub label: CueLabel,
    /// Position in seconds
    pub time: f64,
    /// Display color as a hex string
    pub color: String,
}

impl HotCue {
    /// Create a cue with the slot's default color
    pub fn new(label: CueLabel, time: f64) -> Self {
        Self {
            label,
            time,
            color: label.default_color().to_string(),
        }
    }
}

/// The persisted shape: track filename -> cues
pub type CueMap = HashMap<String, Vec<HotCue>>;

/// Storage backend for the cue blob
pub trait CueStore {
    /// Load the full cue map
    fn load(&self) -> Result<CueMap>;
    /// Persist the full cue map
    fn save(&self, cues: &CueMap) -> Result<()>;
}

/// JSON file store under the platform data directory
pub struct JsonFileCueStore {
    path: PathBuf,
}

impl JsonFileCueStore {
    /// Store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the well-known location under the user data dir
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deckfx")
            .join("hotcues.json")
    }

    /// Path this store reads and writes
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CueStore for JsonFileCueStore {
    fn load(&self) -> Result<CueMap> {
        if !self.path.exists() {
            return Ok(CueMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cue data: {:?}", self.path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cue data: {:?}", self.path))
    }

    fn save(&self, cues: &CueMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cue data directory: {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(cues).context("Failed to serialize cue data")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cue data: {:?}", self.path))
    }
}

/// In-memory store for tests and storage-less environments
#[derive(Default)]
pub struct MemoryCueStore {
    data: RefCell<CueMap>,
}

impl CueStore for MemoryCueStore {
    fn load(&self) -> Result<CueMap> {
        Ok(self.data.borrow().clone())
    }

    fn save(&self, cues: &CueMap) -> Result<()> {
        *self.data.borrow_mut() = cues.clone();
        Ok(())
    }
}

/// Handle returned from `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&CueMap)>;

/// Hot-cue service: replace-by-label storage with fan-out notification
///
/// Every mutation persists immediately; persistence failures are logged
/// and the in-memory state stays authoritative for the session.
pub struct HotCueService {
    cues: CueMap,
    store: Box<dyn CueStore>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl HotCueService {
    /// Create a service backed by the given store
    ///
    /// A failed or corrupt load falls back to an empty map so the session
    /// stays functional.
    pub fn new(store: Box<dyn CueStore>) -> Self {
        let cues = match store.load() {
            Ok(cues) => cues,
            Err(e) => {
                log::error!("hot cues: failed to load stored data: {:#}", e);
                CueMap::new()
            }
        };
        Self {
            cues,
            store,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Service persisted at the well-known user-data location
    pub fn with_default_store() -> Self {
        Self::new(Box::new(JsonFileCueStore::new(
            JsonFileCueStore::default_path(),
        )))
    }

    /// Cues for a track, ordered by label (empty if none)
    pub fn get(&self, track_key: &str) -> &[HotCue] {
        self.cues.get(track_key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The full cue map (waveform overlays render from this)
    pub fn all(&self) -> &CueMap {
        &self.cues
    }

    /// Set or replace the cue at this label for a track, then persist
    pub fn set(&mut self, track_key: &str, cue: HotCue) {
        let cues = self.cues.entry(track_key.to_string()).or_default();
        cues.retain(|existing| existing.label != cue.label);
        cues.push(cue);
        cues.sort_by_key(|c| c.label);
        self.persist();
    }

    /// Remove the cue at this label if present, then persist
    pub fn remove(&mut self, track_key: &str, label: CueLabel) {
        if let Some(cues) = self.cues.get_mut(track_key) {
            cues.retain(|c| c.label != label);
            self.persist();
        }
    }

    /// `set` followed by a broadcast to subscribers
    pub fn set_notifying(&mut self, track_key: &str, cue: HotCue) {
        self.set(track_key, cue);
        self.notify();
    }

    /// `remove` followed by a broadcast to subscribers
    pub fn remove_notifying(&mut self, track_key: &str, label: CueLabel) {
        self.remove(track_key, label);
        self.notify();
    }

    /// Register a listener for notifying mutations
    pub fn subscribe(&mut self, listener: impl Fn(&CueMap) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a listener; unknown ids are a no-op
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.cues) {
            // Durability lost, session state intact
            log::error!("hot cues: failed to persist: {:#}", e);
        }
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.cues);
        }
    }
}
