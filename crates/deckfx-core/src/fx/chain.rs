//! FX chain - owns the graph and drives topology transitions
//!
//! State machine over `(kind, band)`: bypass when either half is missing,
//! otherwise exactly one active topology. Transitions are atomic rebuilds
//! (teardown, then build-or-bypass) executed synchronously within one
//! update, so no other mutation can observe a half-wired chain.
//!
//! The chain is the sole owner of the graph's processing nodes. Wiring
//! failures never propagate: the chain degrades to direct bypass and the
//! audio keeps playing unprocessed.

use crate::graph::AudioGraph;

use super::params::band_params;
use super::{topology, Band, EffectKind, Topology};

/// The currently active effect and the nodes it owns
#[derive(Debug)]
struct ActiveFx {
    kind: EffectKind,
    band: Band,
    topology: Topology,
}

/// FX graph manager for one playback session
#[derive(Debug)]
pub struct FxChain {
    graph: AudioGraph,
    active: Option<ActiveFx>,
}

impl FxChain {
    /// Create a chain in the bypass state
    pub fn new() -> Self {
        let mut chain = Self {
            graph: AudioGraph::new(),
            active: None,
        };
        chain.connect_bypass();
        chain
    }

    /// Read access to the graph for introspection and display
    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    /// Kind of the active effect, if one is sonically active
    pub fn active_kind(&self) -> Option<EffectKind> {
        self.active.as_ref().map(|a| a.kind)
    }

    /// Band of the active effect, if one is sonically active
    pub fn active_band(&self) -> Option<Band> {
        self.active.as_ref().map(|a| a.band)
    }

    /// Whether the chain is passing audio through unprocessed
    pub fn is_bypassed(&self) -> bool {
        self.active.is_none()
    }

    /// Transition to the state selected by `(kind, band)`
    ///
    /// Triggered on any change to kind, band, effective BPM or beat
    /// division. An incomplete selection is a valid, audible bypass state;
    /// it is never upgraded to a default band. `beat_secs` is the current
    /// beat-division duration and becomes the primary delay time of
    /// tempo-synced kinds.
    pub fn apply(&mut self, kind: Option<EffectKind>, band: Option<Band>, beat_secs: f64) {
        self.teardown();

        let (Some(kind), Some(band)) = (kind, band) else {
            self.connect_bypass();
            return;
        };

        if let Err(e) = self.build(kind, band, beat_secs) {
            log::warn!(
                "fx chain: building {:?}/{:?} failed ({}), falling back to bypass",
                kind,
                band,
                e
            );
            self.connect_bypass();
        }
    }

    /// Tear down whatever the chain input currently feeds
    ///
    /// Stops the active effect's oscillators, disconnects and frees every
    /// node it owns. Idempotent: a second call with nothing active is a
    /// no-op. Switching away from an effect is the cancellation mechanism;
    /// there is no separate cancel call.
    pub fn teardown(&mut self) {
        let input = self.graph.input();
        self.graph.disconnect_outputs(input);

        if let Some(active) = self.active.take() {
            for osc in active.topology.oscillators() {
                self.graph.stop_oscillator(osc);
            }
            for id in active.topology.node_ids() {
                self.graph.remove_node(id);
            }
        }
    }

    /// Close the underlying context on track unload
    ///
    /// The chain goes to teardown first so nothing owns nodes afterwards.
    pub fn shutdown(&mut self) {
        self.teardown();
        self.graph.close();
    }

    fn connect_bypass(&mut self) {
        let (input, output) = (self.graph.input(), self.graph.output());
        if let Err(e) = self.graph.connect(input, output) {
            // Last resort failed: the context itself is gone, nothing left
            // to keep alive
            log::error!("fx chain: bypass connection failed: {}", e);
        }
    }

    fn build(
        &mut self,
        kind: EffectKind,
        band: Band,
        beat_secs: f64,
    ) -> crate::graph::GraphResult<()> {
        let mut params = band_params(kind, band);
        if kind.is_tempo_synced() && beat_secs > 0.0 {
            params.delay_secs = beat_secs;
        }

        let topology = topology::create(&mut self.graph, kind, &params);
        match topology::wire(&mut self.graph, &topology) {
            Ok(()) => {
                log::debug!("fx chain: {:?}/{:?} active", kind, band);
                self.active = Some(ActiveFx { kind, band, topology });
                Ok(())
            }
            Err(e) => {
                // Partial wiring must not leak: free everything we created
                for id in topology.node_ids() {
                    self.graph.remove_node(id);
                }
                Err(e)
            }
        }
    }
}

impl Default for FxChain {
    fn default() -> Self {
        Self::new()
    }
}
