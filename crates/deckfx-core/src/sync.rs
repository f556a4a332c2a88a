//! Playback rate synchronizer
//!
//! Reconciles the transport's playback speed with the tempo model: the
//! rate is the ratio of effective to original BPM, clamped to a safe
//! range. Only the rate is ever written; position is owned elsewhere.

use crate::types::TrackId;

/// Safe playback rate range
pub const RATE_MIN: f64 = 0.5;
pub const RATE_MAX: f64 = 2.0;

/// Rates closer than this are considered equal (avoids redundant writes)
pub const RATE_EPSILON: f64 = 1e-3;

/// Transport handle supplied by the audio-playback layer
///
/// The synchronizer writes `set_rate` and reads `rate`; play/pause/seek
/// belong to the playback layer and are not part of this contract.
pub trait Transport {
    /// Current playback rate multiplier
    fn rate(&self) -> f64;
    /// Apply a new playback rate multiplier
    fn set_rate(&mut self, rate: f64);
}

/// Rate synchronizer bound to the currently loaded track
#[derive(Debug)]
pub struct RateSync {
    loaded_track: TrackId,
    original_bpm: f64,
}

impl RateSync {
    /// Bind the synchronizer to the loaded track
    pub fn new(loaded_track: TrackId, original_bpm: f64) -> Self {
        Self {
            loaded_track,
            original_bpm,
        }
    }

    /// Reconcile the transport with a BPM change for `track`
    ///
    /// A change for any other track is an expected race between
    /// track-switch and BPM-change events and is silently ignored. The
    /// write is skipped when the clamped rate already matches the
    /// transport within epsilon.
    pub fn on_bpm_change(
        &self,
        track: &TrackId,
        effective_bpm: f64,
        transport: &mut dyn Transport,
    ) {
        if *track != self.loaded_track {
            // Stale update from a previously loaded track
            return;
        }

        let rate = (effective_bpm / self.original_bpm).clamp(RATE_MIN, RATE_MAX);
        if (rate - transport.rate()).abs() > RATE_EPSILON {
            log::debug!(
                "rate sync: {} -> rate {:.3} ({} / {} BPM)",
                track,
                rate,
                effective_bpm,
                self.original_bpm
            );
            transport.set_rate(rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transport double that counts writes
    struct FakeTransport {
        rate: f64,
        writes: usize,
    }

    impl FakeTransport {
        fn new() -> Self {
            Self { rate: 1.0, writes: 0 }
        }
    }

    impl Transport for FakeTransport {
        fn rate(&self) -> f64 {
            self.rate
        }

        fn set_rate(&mut self, rate: f64) {
            self.rate = rate;
            self.writes += 1;
        }
    }

    #[test]
    fn test_rate_follows_bpm_ratio() {
        let track = TrackId::new("t1");
        let sync = RateSync::new(track.clone(), 120.0);
        let mut transport = FakeTransport::new();

        sync.on_bpm_change(&track, 150.0, &mut transport);
        assert_eq!(transport.rate, 1.25);
    }

    #[test]
    fn test_rate_clamped() {
        let track = TrackId::new("t1");
        let sync = RateSync::new(track.clone(), 120.0);
        let mut transport = FakeTransport::new();

        sync.on_bpm_change(&track, 30.0, &mut transport);
        assert_eq!(transport.rate, RATE_MIN);

        sync.on_bpm_change(&track, 600.0, &mut transport);
        assert_eq!(transport.rate, RATE_MAX);
    }

    #[test]
    fn test_redundant_writes_skipped() {
        let track = TrackId::new("t1");
        let sync = RateSync::new(track.clone(), 120.0);
        let mut transport = FakeTransport::new();

        sync.on_bpm_change(&track, 120.0, &mut transport);
        assert_eq!(transport.writes, 0); // already at 1.0

        sync.on_bpm_change(&track, 150.0, &mut transport);
        sync.on_bpm_change(&track, 150.0, &mut transport);
        assert_eq!(transport.writes, 1);
    }

    #[test]
    fn test_stale_track_is_ignored() {
        let sync = RateSync::new(TrackId::new("current"), 120.0);
        let mut transport = FakeTransport::new();

        sync.on_bpm_change(&TrackId::new("previous"), 180.0, &mut transport);
        assert_eq!(transport.writes, 0);
        assert_eq!(transport.rate, 1.0);
    }
}
