//! Effect topology registry
//!
//! Defines, for each effect kind, the node set it requires and how those
//! nodes interconnect between the chain anchors. Every topology is a
//! dry/wet pair of parallel paths: input -> dry gain -> output alongside
//! input -> (wet processing) -> wet gain -> output. Multi-stage structures
//! (the phaser's all-pass cascade, the reverb's parallel delay bank) are
//! built as real node networks, not approximated with a single node.
//!
//! Node creation and wiring are split: `create` allocates the full node set
//! (infallible), `wire` makes the connections and can fail on a torn-down
//! context. The chain cleans up via `node_ids` when wiring fails.

use crate::graph::{AudioGraph, GraphResult, NodeId, Waveform};

use super::params::BandParams;
use super::EffectKind;

/// Number of cascaded all-pass stages in the phaser
pub const PHASER_STAGES: usize = 4;

/// Number of parallel delay lines in the algorithmic reverb
pub const REVERB_LINES: usize = 4;

/// Per-line delay spread for the reverb bank (prime-ish ratios to avoid
/// coincident resonances)
const REVERB_LINE_SPREAD: [f64; REVERB_LINES] = [1.0, 1.17, 1.31, 1.47];

/// One parallel reverb line: delay with its own feedback gain
#[derive(Debug, Clone, Copy)]
pub struct ReverbLine {
    pub delay: NodeId,
    pub feedback: NodeId,
}

/// The node set owned by the active effect, one variant per kind
///
/// Dropping the old variant and constructing the new one is the whole
/// teardown/build story; there are no shared nodes between variants and
/// oscillators are created fresh on every activation.
#[derive(Debug, Clone)]
pub enum Topology {
    Filter {
        filter: NodeId,
        wet: NodeId,
        dry: NodeId,
    },
    Flanger {
        delay: NodeId,
        feedback: NodeId,
        lfo: NodeId,
        lfo_depth: NodeId,
        wet: NodeId,
        dry: NodeId,
    },
    Phaser {
        stages: [NodeId; PHASER_STAGES],
        feedback: NodeId,
        lfo: NodeId,
        lfo_depth: NodeId,
        wet: NodeId,
        dry: NodeId,
    },
    Reverb {
        lines: [ReverbLine; REVERB_LINES],
        wet_bus: NodeId,
        dry: NodeId,
    },
    PingPong {
        delay_left: NodeId,
        delay_right: NodeId,
        cross_lr: NodeId,
        cross_rl: NodeId,
        pan_left: NodeId,
        pan_right: NodeId,
        wet: NodeId,
        dry: NodeId,
    },
    Echo {
        delay: NodeId,
        tone: NodeId,
        feedback: NodeId,
        wet: NodeId,
        dry: NodeId,
    },
    Roll {
        delay: NodeId,
        feedback: NodeId,
        wet: NodeId,
        dry: NodeId,
    },
    Helix {
        delay: NodeId,
        feedback: NodeId,
        lfo: NodeId,
        lfo_depth: NodeId,
        wet: NodeId,
        dry: NodeId,
    },
    Bubble {
        filter: NodeId,
        delay: NodeId,
        feedback: NodeId,
        lfo: NodeId,
        lfo_depth: NodeId,
        wet: NodeId,
        dry: NodeId,
    },
    Delay {
        delay: NodeId,
        feedback: NodeId,
        wet: NodeId,
        dry: NodeId,
    },
}

impl Topology {
    /// Every node id this topology owns
    pub fn node_ids(&self) -> Vec<NodeId> {
        match *self {
            Topology::Filter { filter, wet, dry } => vec![filter, wet, dry],
            Topology::Flanger {
                delay,
                feedback,
                lfo,
                lfo_depth,
                wet,
                dry,
            } => vec![delay, feedback, lfo, lfo_depth, wet, dry],
            Topology::Phaser {
                stages,
                feedback,
                lfo,
                lfo_depth,
                wet,
                dry,
            } => {
                let mut ids = stages.to_vec();
                ids.extend([feedback, lfo, lfo_depth, wet, dry]);
                ids
            }
            Topology::Reverb { lines, wet_bus, dry } => {
                let mut ids = Vec::with_capacity(REVERB_LINES * 2 + 2);
                for line in lines {
                    ids.push(line.delay);
                    ids.push(line.feedback);
                }
                ids.push(wet_bus);
                ids.push(dry);
                ids
            }
            Topology::PingPong {
                delay_left,
                delay_right,
                cross_lr,
                cross_rl,
                pan_left,
                pan_right,
                wet,
                dry,
            } => vec![
                delay_left,
                delay_right,
                cross_lr,
                cross_rl,
                pan_left,
                pan_right,
                wet,
                dry,
            ],
            Topology::Echo {
                delay,
                tone,
                feedback,
                wet,
                dry,
            } => vec![delay, tone, feedback, wet, dry],
            Topology::Roll {
                delay,
                feedback,
                wet,
                dry,
            }
            | Topology::Delay {
                delay,
                feedback,
                wet,
                dry,
            } => vec![delay, feedback, wet, dry],
            Topology::Helix {
                delay,
                feedback,
                lfo,
                lfo_depth,
                wet,
                dry,
            } => vec![delay, feedback, lfo, lfo_depth, wet, dry],
            Topology::Bubble {
                filter,
                delay,
                feedback,
                lfo,
                lfo_depth,
                wet,
                dry,
            } => vec![filter, delay, feedback, lfo, lfo_depth, wet, dry],
        }
    }

    /// Oscillator nodes that must be stopped on teardown
    pub fn oscillators(&self) -> Vec<NodeId> {
        match *self {
            Topology::Flanger { lfo, .. }
            | Topology::Phaser { lfo, .. }
            | Topology::Helix { lfo, .. }
            | Topology::Bubble { lfo, .. } => vec![lfo],
            _ => Vec::new(),
        }
    }
}

/// Allocate the node set an effect kind requires
///
/// Oscillator-bearing kinds get a fresh LFO here on every activation; the
/// platform cannot restart a stopped oscillator, so they are disposable by
/// design.
pub fn create(graph: &mut AudioGraph, kind: EffectKind, p: &BandParams) -> Topology {
    match kind {
        EffectKind::Filter => Topology::Filter {
            filter: graph.add_filter(p.filter_shape, p.filter_hz, p.filter_q),
            wet: graph.add_gain(p.wet),
            dry: graph.add_gain(p.dry),
        },
        EffectKind::Flanger => Topology::Flanger {
            delay: graph.add_delay(p.delay_secs),
            feedback: graph.add_gain(p.feedback),
            lfo: graph.add_oscillator(Waveform::Sine, p.lfo_hz),
            lfo_depth: graph.add_gain(p.lfo_depth),
            wet: graph.add_gain(p.wet),
            dry: graph.add_gain(p.dry),
        },
        EffectKind::Phaser => Topology::Phaser {
            stages: std::array::from_fn(|_| {
                graph.add_filter(p.filter_shape, p.filter_hz, p.filter_q)
            }),
            feedback: graph.add_gain(p.feedback),
            lfo: graph.add_oscillator(Waveform::Sine, p.lfo_hz),
            lfo_depth: graph.add_gain(p.lfo_depth),
            wet: graph.add_gain(p.wet),
            dry: graph.add_gain(p.dry),
        },
        EffectKind::Reverb => Topology::Reverb {
            lines: std::array::from_fn(|i| ReverbLine {
                delay: graph.add_delay(p.delay_secs * REVERB_LINE_SPREAD[i]),
                feedback: graph.add_gain(p.feedback),
            }),
            wet_bus: graph.add_gain(p.wet),
            dry: graph.add_gain(p.dry),
        },
        EffectKind::PingPong => Topology::PingPong {
            delay_left: graph.add_delay(p.delay_secs),
            delay_right: graph.add_delay(p.delay_secs),
            cross_lr: graph.add_gain(p.feedback),
            cross_rl: graph.add_gain(p.feedback),
            pan_left: graph.add_panner(-1.0),
            pan_right: graph.add_panner(1.0),
            wet: graph.add_gain(p.wet),
            dry: graph.add_gain(p.dry),
        },
        EffectKind::Echo => Topology::Echo {
            delay: graph.add_delay(p.delay_secs),
            tone: graph.add_filter(p.filter_shape, p.filter_hz, p.filter_q),
            feedback: graph.add_gain(p.feedback),
            wet: graph.add_gain(p.wet),
            dry: graph.add_gain(p.dry),
        },
        EffectKind::Roll => Topology::Roll {
            delay: graph.add_delay(p.delay_secs),
            feedback: graph.add_gain(p.feedback),
            wet: graph.add_gain(p.wet),
            dry: graph.add_gain(p.dry),
        },
        EffectKind::Helix => Topology::Helix {
            delay: graph.add_delay(p.delay_secs),
            feedback: graph.add_gain(p.feedback),
            lfo: graph.add_oscillator(Waveform::Triangle, p.lfo_hz),
            lfo_depth: graph.add_gain(p.lfo_depth),
            wet: graph.add_gain(p.wet),
            dry: graph.add_gain(p.dry),
        },
        EffectKind::Bubble => Topology::Bubble {
            filter: graph.add_filter(p.filter_shape, p.filter_hz, p.filter_q),
            delay: graph.add_delay(p.delay_secs),
            feedback: graph.add_gain(p.feedback),
            lfo: graph.add_oscillator(Waveform::Sine, p.lfo_hz),
            lfo_depth: graph.add_gain(p.lfo_depth),
            wet: graph.add_gain(p.wet),
            dry: graph.add_gain(p.dry),
        },
        EffectKind::Delay => Topology::Delay {
            delay: graph.add_delay(p.delay_secs),
            feedback: graph.add_gain(p.feedback),
            wet: graph.add_gain(p.wet),
            dry: graph.add_gain(p.dry),
        },
    }
}

/// Wire a created topology between the chain anchors and start its LFO
///
/// Any failed connection aborts the whole wiring; the chain falls back to
/// bypass and removes the created nodes.
pub fn wire(graph: &mut AudioGraph, topology: &Topology) -> GraphResult<()> {
    let input = graph.input();
    let output = graph.output();

    match *topology {
        Topology::Filter { filter, wet, dry } => {
            graph.connect(input, filter)?;
            graph.connect(filter, wet)?;
            graph.connect(wet, output)?;
            wire_dry(graph, dry)?;
        }
        Topology::Flanger {
            delay,
            feedback,
            lfo,
            lfo_depth,
            wet,
            dry,
        } => {
            graph.connect(input, delay)?;
            graph.connect(delay, feedback)?;
            graph.connect(feedback, delay)?;
            graph.connect(delay, wet)?;
            graph.connect(wet, output)?;
            wire_dry(graph, dry)?;
            // LFO modulates the delay time
            graph.connect(lfo, lfo_depth)?;
            graph.connect(lfo_depth, delay)?;
            graph.start_oscillator(lfo)?;
        }
        Topology::Phaser {
            stages,
            feedback,
            lfo,
            lfo_depth,
            wet,
            dry,
        } => {
            // Serial all-pass cascade with a feedback tap from the last
            // stage back to the first
            graph.connect(input, stages[0])?;
            for pair in stages.windows(2) {
                graph.connect(pair[0], pair[1])?;
            }
            let last = stages[PHASER_STAGES - 1];
            graph.connect(last, feedback)?;
            graph.connect(feedback, stages[0])?;
            graph.connect(last, wet)?;
            graph.connect(wet, output)?;
            wire_dry(graph, dry)?;
            // One shared LFO sweeps every stage's frequency
            graph.connect(lfo, lfo_depth)?;
            for stage in stages {
                graph.connect(lfo_depth, stage)?;
            }
            graph.start_oscillator(lfo)?;
        }
        Topology::Reverb { lines, wet_bus, dry } => {
            // Parallel delay lines, each with its own feedback gain,
            // summed into one wet bus
            for line in lines {
                graph.connect(input, line.delay)?;
                graph.connect(line.delay, line.feedback)?;
                graph.connect(line.feedback, line.delay)?;
                graph.connect(line.delay, wet_bus)?;
            }
            graph.connect(wet_bus, output)?;
            wire_dry(graph, dry)?;
        }
        Topology::PingPong {
            delay_left,
            delay_right,
            cross_lr,
            cross_rl,
            pan_left,
            pan_right,
            wet,
            dry,
        } => {
            // Cross-fed delay pair panned hard left/right
            graph.connect(input, delay_left)?;
            graph.connect(delay_left, cross_lr)?;
            graph.connect(cross_lr, delay_right)?;
            graph.connect(delay_right, cross_rl)?;
            graph.connect(cross_rl, delay_left)?;
            graph.connect(delay_left, pan_left)?;
            graph.connect(delay_right, pan_right)?;
            graph.connect(pan_left, wet)?;
            graph.connect(pan_right, wet)?;
            graph.connect(wet, output)?;
            wire_dry(graph, dry)?;
        }
        Topology::Echo {
            delay,
            tone,
            feedback,
            wet,
            dry,
        } => {
            // Tone filter sits in the feedback loop so repeats darken
            graph.connect(input, delay)?;
            graph.connect(delay, tone)?;
            graph.connect(tone, feedback)?;
            graph.connect(feedback, delay)?;
            graph.connect(delay, wet)?;
            graph.connect(wet, output)?;
            wire_dry(graph, dry)?;
        }
        Topology::Roll {
            delay,
            feedback,
            wet,
            dry,
        }
        | Topology::Delay {
            delay,
            feedback,
            wet,
            dry,
        } => {
            graph.connect(input, delay)?;
            graph.connect(delay, feedback)?;
            graph.connect(feedback, delay)?;
            graph.connect(delay, wet)?;
            graph.connect(wet, output)?;
            wire_dry(graph, dry)?;
        }
        Topology::Helix {
            delay,
            feedback,
            lfo,
            lfo_depth,
            wet,
            dry,
        } => {
            graph.connect(input, delay)?;
            graph.connect(delay, feedback)?;
            graph.connect(feedback, delay)?;
            graph.connect(delay, wet)?;
            graph.connect(wet, output)?;
            wire_dry(graph, dry)?;
            // LFO breathes the feedback level for the spiraling build-up
            graph.connect(lfo, lfo_depth)?;
            graph.connect(lfo_depth, feedback)?;
            graph.start_oscillator(lfo)?;
        }
        Topology::Bubble {
            filter,
            delay,
            feedback,
            lfo,
            lfo_depth,
            wet,
            dry,
        } => {
            graph.connect(input, filter)?;
            graph.connect(filter, delay)?;
            graph.connect(delay, feedback)?;
            graph.connect(feedback, delay)?;
            graph.connect(delay, wet)?;
            graph.connect(wet, output)?;
            wire_dry(graph, dry)?;
            // LFO wobbles the bandpass center
            graph.connect(lfo, lfo_depth)?;
            graph.connect(lfo_depth, filter)?;
            graph.start_oscillator(lfo)?;
        }
    }
    Ok(())
}

fn wire_dry(graph: &mut AudioGraph, dry: NodeId) -> GraphResult<()> {
    let input = graph.input();
    let output = graph.output();
    graph.connect(input, dry)?;
    graph.connect(dry, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::params::band_params;
    use crate::fx::Band;
    use crate::graph::{FilterShape, NodeKind, OscState};

    fn built(kind: EffectKind, band: Band) -> (AudioGraph, Topology) {
        let mut graph = AudioGraph::new();
        let params = band_params(kind, band);
        let topology = create(&mut graph, kind, &params);
        wire(&mut graph, &topology).unwrap();
        (graph, topology)
    }

    #[test]
    fn test_every_kind_wires_input_to_output() {
        for kind in EffectKind::ALL {
            for band in Band::ALL {
                let (graph, topology) = built(kind, band);
                assert!(
                    graph.input_reaches_output(),
                    "{:?}/{:?} must connect input to output",
                    kind,
                    band
                );
                assert_eq!(
                    graph.node_count(),
                    topology.node_ids().len(),
                    "{:?}/{:?} node accounting",
                    kind,
                    band
                );
            }
        }
    }

    #[test]
    fn test_every_kind_has_parallel_dry_path() {
        for kind in EffectKind::ALL {
            let (graph, _) = built(kind, Band::Mid);
            // Input fans out to at least the dry gain and one wet entry
            assert!(
                graph.outputs_of(graph.input()).len() >= 2,
                "{:?} must fan out into dry and wet paths",
                kind
            );
            assert!(!graph.is_direct_bypass());
        }
    }

    #[test]
    fn test_phaser_cascade_structure() {
        let (graph, topology) = built(EffectKind::Phaser, Band::Mid);
        let Topology::Phaser { stages, feedback, lfo_depth, .. } = topology else {
            panic!("wrong variant");
        };

        // Serial chain: each stage feeds the next
        for pair in stages.windows(2) {
            assert!(graph.outputs_of(pair[0]).contains(&pair[1]));
        }
        // Feedback tap from the last stage back to the first
        assert!(graph.outputs_of(stages[PHASER_STAGES - 1]).contains(&feedback));
        assert!(graph.outputs_of(feedback).contains(&stages[0]));
        // The shared LFO depth feeds every stage
        for stage in stages {
            assert!(graph.outputs_of(lfo_depth).contains(&stage));
            assert!(matches!(
                graph.node(stage),
                Some(NodeKind::Filter { shape: FilterShape::Allpass, .. })
            ));
        }
    }

    #[test]
    fn test_reverb_parallel_line_structure() {
        let (graph, topology) = built(EffectKind::Reverb, Band::Hi);
        let Topology::Reverb { lines, wet_bus, .. } = topology else {
            panic!("wrong variant");
        };

        let input = graph.input();
        for line in lines {
            // Each line is fed from the input in parallel...
            assert!(graph.outputs_of(input).contains(&line.delay));
            // ...carries its own feedback loop...
            assert!(graph.outputs_of(line.delay).contains(&line.feedback));
            assert!(graph.outputs_of(line.feedback).contains(&line.delay));
            // ...and sums into the single wet bus
            assert!(graph.outputs_of(line.delay).contains(&wet_bus));
        }
        assert!(graph.outputs_of(wet_bus).contains(&graph.output()));
    }

    #[test]
    fn test_reverb_line_delays_are_spread() {
        let (graph, topology) = built(EffectKind::Reverb, Band::Mid);
        let Topology::Reverb { lines, .. } = topology else {
            panic!("wrong variant");
        };

        let mut times: Vec<f64> = lines
            .iter()
            .map(|line| match graph.node(line.delay) {
                Some(NodeKind::Delay { time_secs }) => *time_secs,
                other => panic!("unexpected node {:?}", other),
            })
            .collect();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap());
        times.dedup();
        assert_eq!(times.len(), REVERB_LINES, "line delays must all differ");
    }

    #[test]
    fn test_lfo_started_on_wire() {
        for kind in [
            EffectKind::Flanger,
            EffectKind::Phaser,
            EffectKind::Helix,
            EffectKind::Bubble,
        ] {
            let (graph, topology) = built(kind, Band::Low);
            for osc in topology.oscillators() {
                assert!(matches!(
                    graph.node(osc),
                    Some(NodeKind::Oscillator { state: OscState::Running, .. })
                ));
            }
        }
    }
}
