//! Tempo model - effective BPM and beat-relative durations
//!
//! Owns the effective BPM for the loaded track (auto-detected, tap-tempo or
//! per-track manual override) and converts a beat-division selector into a
//! duration in seconds. Delay-based effects pull their primary delay time
//! from here, which is what makes them tempo-synced.

use std::collections::HashMap;

use crate::types::TrackId;

/// Rolling window for tap-tempo samples, in seconds
///
/// Taps older than this are discarded before each computation so a long
/// pause resets the measurement window instead of skewing the average.
pub const TAP_WINDOW_SECS: f64 = 2.0;

/// Minimum taps required before a BPM is produced (2 intervals)
pub const MIN_TAPS: usize = 3;

/// Manual BPM override range
pub const BPM_MIN: f64 = 60.0;
pub const BPM_MAX: f64 = 200.0;

/// Tempo source selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TempoMode {
    /// Use the track's original BPM (or a per-track override)
    #[default]
    Auto,
    /// Use the last tap-computed BPM
    Tap,
}

/// Beat-division selector
///
/// Fixed ordered list, navigable left/right with wraparound. The fractional
/// entries denote note values; the integer entries denote beat counts. Both
/// scale the quarter-note base, so "1/4" and "1" (and "1/2" and "2") yield
/// the same duration. That dual meaning is inherited from the original
/// product mapping and is preserved exactly for compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeatDivision {
    Sixteenth,
    Eighth,
    #[default]
    Quarter,
    Half,
    ThreeQuarter,
    One,
    Two,
    Four,
}

impl BeatDivision {
    /// All divisions in selector order
    pub const ALL: [BeatDivision; 8] = [
        BeatDivision::Sixteenth,
        BeatDivision::Eighth,
        BeatDivision::Quarter,
        BeatDivision::Half,
        BeatDivision::ThreeQuarter,
        BeatDivision::One,
        BeatDivision::Two,
        BeatDivision::Four,
    ];

    /// Display label as shown on the division selector
    pub fn label(&self) -> &'static str {
        match self {
            BeatDivision::Sixteenth => "1/16",
            BeatDivision::Eighth => "1/8",
            BeatDivision::Quarter => "1/4",
            BeatDivision::Half => "1/2",
            BeatDivision::ThreeQuarter => "3/4",
            BeatDivision::One => "1",
            BeatDivision::Two => "2",
            BeatDivision::Four => "4",
        }
    }

    /// Parse a selector label back into a division
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.label() == label)
    }

    /// Multiplier applied to one beat (a quarter note)
    pub fn multiplier(&self) -> f64 {
        match self {
            BeatDivision::Sixteenth => 0.25,
            BeatDivision::Eighth => 0.5,
            BeatDivision::Quarter => 1.0,
            BeatDivision::Half => 2.0,
            BeatDivision::ThreeQuarter => 3.0,
            BeatDivision::One => 1.0,
            BeatDivision::Two => 2.0,
            BeatDivision::Four => 4.0,
        }
    }

    /// Next entry in selector order, wrapping at the end
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|d| d == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous entry in selector order, wrapping at the start
    pub fn prev(&self) -> Self {
        let idx = Self::ALL.iter().position(|d| d == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Duration of one division at the given BPM, in seconds
pub fn beat_duration(division: BeatDivision, bpm: f64) -> f64 {
    let seconds_per_beat = 60.0 / bpm;
    seconds_per_beat * division.multiplier()
}

/// Duration for a raw selector label, falling back to one quarter note
///
/// Used at the UI boundary where the division arrives as a string. Unknown
/// labels are logged and treated as "1/4" rather than failing the caller.
pub fn beat_duration_for_label(label: &str, bpm: f64) -> f64 {
    match BeatDivision::from_label(label) {
        Some(division) => beat_duration(division, bpm),
        None => {
            log::warn!(
                "beat_duration: unknown division '{}', falling back to 1/4",
                label
            );
            beat_duration(BeatDivision::Quarter, bpm)
        }
    }
}

/// Tempo model for the loaded track
///
/// Resolution order for the effective BPM: per-track manual override, then
/// tap tempo (when in Tap mode and enough taps have accumulated), then the
/// track's original BPM. Overrides persist for the session and always win
/// while present.
#[derive(Debug)]
pub struct TempoModel {
    /// Intrinsic tempo of the loaded track (immutable for its lifetime)
    original_bpm: f64,
    /// Current tempo source
    mode: TempoMode,
    /// Per-track manual nudges, created on first adjustment
    overrides: HashMap<TrackId, f64>,
    /// Tap timestamps on a monotonic clock, in seconds
    taps: Vec<f64>,
    /// Last tap-computed BPM, if 3+ taps have landed inside the window
    tap_bpm: Option<f64>,
    /// Currently selected beat division
    division: BeatDivision,
}

impl TempoModel {
    /// Create a tempo model for a track with the given original BPM
    pub fn new(original_bpm: f64) -> Self {
        Self {
            original_bpm,
            mode: TempoMode::Auto,
            overrides: HashMap::new(),
            taps: Vec::new(),
            tap_bpm: None,
            division: BeatDivision::default(),
        }
    }

    /// The track's original BPM
    pub fn original_bpm(&self) -> f64 {
        self.original_bpm
    }

    /// Current tempo mode
    pub fn mode(&self) -> TempoMode {
        self.mode
    }

    /// Currently selected beat division
    pub fn division(&self) -> BeatDivision {
        self.division
    }

    /// Select a beat division directly
    pub fn set_division(&mut self, division: BeatDivision) {
        self.division = division;
    }

    /// Move the division selector one step (positive = right), wrapping
    pub fn shift_division(&mut self, direction: i32) {
        self.division = if direction >= 0 {
            self.division.next()
        } else {
            self.division.prev()
        };
    }

    /// Effective BPM for the given track
    ///
    /// Override if present, else tap BPM (Tap mode only), else original.
    /// Always positive: overrides are clamped on entry and tap BPM is
    /// derived from nonzero intervals.
    pub fn effective_bpm(&self, track: &TrackId) -> f64 {
        if let Some(&bpm) = self.overrides.get(track) {
            return bpm;
        }
        match self.mode {
            TempoMode::Tap => self.tap_bpm.unwrap_or(self.original_bpm),
            TempoMode::Auto => self.original_bpm,
        }
    }

    /// Record a tap at `now` seconds on a monotonic clock
    ///
    /// Prunes taps older than the rolling window, then recomputes the tap
    /// BPM from the mean of consecutive intervals once three taps remain.
    /// With fewer taps the previous value stands; no BPM is invented.
    pub fn record_tap(&mut self, now: f64) {
        self.taps.push(now);
        self.taps.retain(|&t| now - t <= TAP_WINDOW_SECS);

        if self.taps.len() >= MIN_TAPS {
            let intervals_ms: Vec<f64> = self
                .taps
                .windows(2)
                .map(|w| (w[1] - w[0]) * 1000.0)
                .collect();
            let mean_ms = intervals_ms.iter().sum::<f64>() / intervals_ms.len() as f64;
            if mean_ms > 0.0 {
                self.tap_bpm = Some((60_000.0 / mean_ms).round());
                log::debug!("record_tap: tap BPM now {:?}", self.tap_bpm);
            }
        }
    }

    /// Toggle between Auto and Tap mode
    ///
    /// Switching to Auto clears tap history and all manual overrides so the
    /// original BPM takes over deterministically. Switching to Tap does not
    /// retroactively invent a BPM; the effective value holds until three
    /// taps accumulate.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            TempoMode::Auto => TempoMode::Tap,
            TempoMode::Tap => {
                self.taps.clear();
                self.tap_bpm = None;
                self.overrides.clear();
                TempoMode::Auto
            }
        };
        log::debug!("toggle_mode: now {:?}", self.mode);
    }

    /// Nudge the BPM for a track by `delta`, clamped to [60, 200]
    ///
    /// Creates or replaces the per-track override, which wins over both
    /// Auto and Tap while present.
    pub fn adjust_bpm(&mut self, track: &TrackId, delta: f64) {
        let adjusted = (self.effective_bpm(track) + delta).clamp(BPM_MIN, BPM_MAX);
        self.overrides.insert(track.clone(), adjusted);
    }

    /// Duration of the selected division at the track's effective BPM
    pub fn beat_duration(&self, track: &TrackId) -> f64 {
        beat_duration(self.division, self.effective_bpm(track))
    }
}
