//! Audio session context - one loaded track, one engine state
//!
//! Owns the tempo model, FX chain and rate synchronizer for the currently
//! loaded track and exposes intent setters to the UI layer. Every intent
//! runs a synchronous refresh that rebuilds the chain for the current
//! `(kind, band)` selection at the current beat duration and reconciles
//! the transport rate, so callers never sequence those steps themselves.
//!
//! The context is created per track load and discarded on unload; nothing
//! here outlives the track it was built for.

use crate::fx::{Band, EffectKind, FxChain};
use crate::sync::{RateSync, Transport};
use crate::tempo::{BeatDivision, TempoMode, TempoModel};
use crate::types::TrackInfo;

/// Engine state for one loaded track
pub struct AudioSessionContext<T: Transport> {
    track: TrackInfo,
    tempo: TempoModel,
    chain: FxChain,
    sync: RateSync,
    transport: T,
    selected_kind: Option<EffectKind>,
    selected_band: Option<Band>,
}

impl<T: Transport> AudioSessionContext<T> {
    /// Load a track into a fresh session
    ///
    /// The chain starts in bypass and the transport rate is reconciled
    /// immediately (a no-op while no tempo adjustment exists).
    pub fn new(track: TrackInfo, transport: T) -> Self {
        let tempo = TempoModel::new(track.original_bpm);
        let sync = RateSync::new(track.id.clone(), track.original_bpm);
        let mut session = Self {
            track,
            tempo,
            chain: FxChain::new(),
            sync,
            transport,
            selected_kind: None,
            selected_band: None,
        };
        session.refresh();
        session
    }

    /// Metadata of the loaded track
    pub fn track(&self) -> &TrackInfo {
        &self.track
    }

    /// Read access to the FX chain
    pub fn chain(&self) -> &FxChain {
        &self.chain
    }

    /// Read access to the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Effect kind selected in the UI (may be armed without a band)
    pub fn selected_kind(&self) -> Option<EffectKind> {
        self.selected_kind
    }

    /// Band selected in the UI
    pub fn selected_band(&self) -> Option<Band> {
        self.selected_band
    }

    /// Effective BPM shown on the tempo display
    pub fn effective_bpm(&self) -> f64 {
        self.tempo.effective_bpm(&self.track.id)
    }

    /// Current tempo mode
    pub fn tempo_mode(&self) -> TempoMode {
        self.tempo.mode()
    }

    /// Currently selected beat division
    pub fn division(&self) -> BeatDivision {
        self.tempo.division()
    }

    /// Duration of the selected division at the effective BPM, in seconds
    pub fn beat_duration(&self) -> f64 {
        self.tempo.beat_duration(&self.track.id)
    }

    /// Select or clear the effect kind
    ///
    /// Selecting the kind that is already selected clears it (toggle off).
    pub fn select_effect(&mut self, kind: Option<EffectKind>) {
        self.selected_kind = if kind == self.selected_kind {
            None
        } else {
            kind
        };
        self.refresh();
    }

    /// Select or clear the band, with the same toggle-off behavior
    pub fn select_band(&mut self, band: Option<Band>) {
        self.selected_band = if band == self.selected_band {
            None
        } else {
            band
        };
        self.refresh();
    }

    /// Record a tap at `now` seconds on a monotonic clock
    pub fn record_tap(&mut self, now: f64) {
        self.tempo.record_tap(now);
        self.refresh();
    }

    /// Toggle between Auto and Tap tempo modes
    pub fn toggle_tempo_mode(&mut self) {
        self.tempo.toggle_mode();
        self.refresh();
    }

    /// Nudge the BPM by `delta`, clamped to the manual range
    pub fn adjust_bpm(&mut self, delta: f64) {
        let track = self.track.id.clone();
        self.tempo.adjust_bpm(&track, delta);
        self.refresh();
    }

    /// Move the division selector one step (positive = right), wrapping
    pub fn shift_division(&mut self, direction: i32) {
        self.tempo.shift_division(direction);
        self.refresh();
    }

    /// Select a beat division directly
    pub fn set_division(&mut self, division: BeatDivision) {
        self.tempo.set_division(division);
        self.refresh();
    }

    /// Unload the track: tear down the chain and close its context
    ///
    /// Consumes the session; a new track load builds a fresh one.
    pub fn unload(mut self) -> T {
        self.chain.shutdown();
        self.transport
    }

    /// Bring the chain and the transport in line with the current state
    ///
    /// Runs synchronously inside every intent setter; no other mutation
    /// can interleave, so the chain is never observed half-rebuilt.
    fn refresh(&mut self) {
        let beat_secs = self.beat_duration();
        self.chain
            .apply(self.selected_kind, self.selected_band, beat_secs);
        self.sync.on_bpm_change(
            &self.track.id,
            self.tempo.effective_bpm(&self.track.id),
            &mut self.transport,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

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

    fn session() -> AudioSessionContext<FakeTransport> {
        let track = TrackInfo::new("t1", 128.0, "/audio/t1.mp3", 240.0);
        AudioSessionContext::new(track, FakeTransport::new())
    }

    #[test]
    fn test_fresh_session_is_bypassed_at_unit_rate() {
        let session = session();
        assert!(session.chain().is_bypassed());
        assert_eq!(session.transport().rate, 1.0);
        assert_eq!(session.transport().writes, 0);
        assert_eq!(session.effective_bpm(), 128.0);
    }

    #[test]
    fn test_effect_requires_both_selections() {
        let mut session = session();

        session.select_effect(Some(EffectKind::Echo));
        assert!(session.chain().is_bypassed(), "kind armed, no band yet");

        session.select_band(Some(Band::Low));
        assert_eq!(session.chain().active_kind(), Some(EffectKind::Echo));
        assert_eq!(session.chain().active_band(), Some(Band::Low));
    }

    #[test]
    fn test_reselecting_toggles_off() {
        let mut session = session();
        session.select_effect(Some(EffectKind::Roll));
        session.select_band(Some(Band::Mid));
        assert!(!session.chain().is_bypassed());

        session.select_effect(Some(EffectKind::Roll));
        assert!(session.chain().is_bypassed());
        assert_eq!(session.selected_band(), Some(Band::Mid), "band stays armed");
    }

    #[test]
    fn test_tempo_change_rebuilds_synced_delay() {
        let mut session = session();
        session.select_effect(Some(EffectKind::Delay));
        session.select_band(Some(Band::Mid));

        // 128 BPM, quarter-note division: 60/128 seconds
        assert_eq!(primary_delay(&session), 60.0 / 128.0);

        // Nudging the tempo rewires the delay to the new beat duration
        session.adjust_bpm(32.0); // 160 BPM
        assert_eq!(primary_delay(&session), 60.0 / 160.0);

        // Widening the division doubles it
        session.set_division(BeatDivision::Half);
        assert_eq!(primary_delay(&session), 2.0 * 60.0 / 160.0);
    }

    fn primary_delay(session: &AudioSessionContext<FakeTransport>) -> f64 {
        let graph = session.chain().graph();
        graph
            .outputs_of(graph.input())
            .into_iter()
            .find_map(|n| match graph.node(n) {
                Some(NodeKind::Delay { time_secs }) => Some(*time_secs),
                _ => None,
            })
            .expect("no delay on the input")
    }

    #[test]
    fn test_tap_tempo_drives_playback_rate() {
        let mut session = session();
        session.toggle_tempo_mode(); // Auto -> Tap

        // Taps at 500ms spacing: 120 BPM against a 128 BPM original
        session.record_tap(0.0);
        session.record_tap(0.5);
        assert_eq!(session.transport().rate, 1.0, "two taps prove nothing");
        session.record_tap(1.0);

        assert_eq!(session.effective_bpm(), 120.0);
        assert_eq!(session.transport().rate, 120.0 / 128.0);
    }

    #[test]
    fn test_toggle_to_auto_restores_unit_rate() {
        let mut session = session();
        session.adjust_bpm(16.0); // 144 BPM
        assert_eq!(session.transport().rate, 144.0 / 128.0);

        session.toggle_tempo_mode(); // -> Tap, override still wins
        assert_eq!(session.transport().rate, 144.0 / 128.0);

        session.toggle_tempo_mode(); // -> Auto, override cleared
        assert_eq!(session.transport().rate, 1.0);
    }

    #[test]
    fn test_redundant_refreshes_do_not_rewrite_rate() {
        let mut session = session();
        session.adjust_bpm(16.0);
        let writes = session.transport().writes;

        // Selection changes do not move the tempo
        session.select_effect(Some(EffectKind::Filter));
        session.select_band(Some(Band::Hi));
        session.shift_division(1);
        assert_eq!(session.transport().writes, writes);
    }

    #[test]
    fn test_unload_tears_down_chain() {
        let mut session = session();
        session.select_effect(Some(EffectKind::Reverb));
        session.select_band(Some(Band::Hi));
        assert!(session.chain().graph().node_count() > 0);

        let transport = session.unload();
        assert_eq!(transport.rate, 1.0);
    }
}
