//! Audio node graph - arena of processing nodes with explicit connections
//!
//! Models the shared processing pipeline between the fixed chain input and
//! chain output anchors. Effect topologies are built by creating nodes and
//! wiring directed connections; tearing an effect down removes its nodes.
//! The anchors themselves never change identity across effect switches.
//!
//! The graph is a structural model: it tracks which nodes exist, how they
//! are connected and what parameters they carry. Invariant checks (exactly
//! one signal path from input to output, no leaked nodes) run against this
//! structure; the platform's rendering thread is opaque to this layer.

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

/// Errors raised by graph mutations
#[derive(Error, Debug)]
pub enum GraphError {
    /// The owning context has been torn down; no wiring is possible
    #[error("graph context is closed")]
    Closed,

    /// Connection endpoint does not exist in the arena
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Oscillators cannot be restarted once stopped (platform constraint)
    #[error("oscillator {0:?} was stopped and cannot be restarted")]
    OscillatorStopped(NodeId),

    /// Node is not an oscillator
    #[error("node {0:?} is not an oscillator")]
    NotAnOscillator(NodeId),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Handle to a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

/// Biquad filter response type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterShape {
    Lowpass,
    Highpass,
    Bandpass,
    Allpass,
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

/// Oscillator lifecycle
///
/// `Stopped` is terminal: a stopped oscillator is disposed and recreated,
/// never restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscState {
    Idle,
    Running,
    Stopped,
}

/// Processing node kinds and their parameters
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Chain input/output anchor (permanent)
    Anchor,
    /// Gain stage (dry/wet levels, feedback taps, LFO depth)
    Gain { gain: f64 },
    /// Delay line
    Delay { time_secs: f64 },
    /// Biquad filter
    Filter { shape: FilterShape, frequency: f64, q: f64 },
    /// Low-frequency oscillator (modulation source)
    Oscillator { wave: Waveform, frequency: f64, state: OscState },
    /// Stereo panner (ping-pong taps)
    Panner { pan: f64 },
}

/// The audio processing graph
///
/// Exclusively owned and mutated by the FX chain; other components express
/// intent and read derived values but never touch nodes directly.
#[derive(Debug)]
pub struct AudioGraph {
    nodes: HashMap<NodeId, NodeKind>,
    edges: HashSet<(NodeId, NodeId)>,
    next_id: u64,
    input: NodeId,
    output: NodeId,
    closed: bool,
}

impl AudioGraph {
    /// Create a graph with its two permanent anchors
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        let input = NodeId(0);
        let output = NodeId(1);
        nodes.insert(input, NodeKind::Anchor);
        nodes.insert(output, NodeKind::Anchor);
        Self {
            nodes,
            edges: HashSet::new(),
            next_id: 2,
            input,
            output,
            closed: false,
        }
    }

    /// The chain input anchor
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// The chain output anchor
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Tear the context down: all subsequent wiring attempts fail
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether the context has been torn down
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, kind);
        id
    }

    /// Create a gain node
    pub fn add_gain(&mut self, gain: f64) -> NodeId {
        self.alloc(NodeKind::Gain { gain })
    }

    /// Create a delay node
    pub fn add_delay(&mut self, time_secs: f64) -> NodeId {
        self.alloc(NodeKind::Delay { time_secs })
    }

    /// Create a biquad filter node
    pub fn add_filter(&mut self, shape: FilterShape, frequency: f64, q: f64) -> NodeId {
        self.alloc(NodeKind::Filter { shape, frequency, q })
    }

    /// Create an oscillator node (idle until started)
    pub fn add_oscillator(&mut self, wave: Waveform, frequency: f64) -> NodeId {
        self.alloc(NodeKind::Oscillator {
            wave,
            frequency,
            state: OscState::Idle,
        })
    }

    /// Create a stereo panner node
    pub fn add_panner(&mut self, pan: f64) -> NodeId {
        self.alloc(NodeKind::Panner { pan })
    }

    /// Connect `from` to `to`
    ///
    /// Fails if the context is closed or either endpoint is gone; the FX
    /// chain catches this and degrades to bypass.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> GraphResult<()> {
        if self.closed {
            return Err(GraphError::Closed);
        }
        if !self.nodes.contains_key(&from) {
            return Err(GraphError::UnknownNode(from));
        }
        if !self.nodes.contains_key(&to) {
            return Err(GraphError::UnknownNode(to));
        }
        self.edges.insert((from, to));
        Ok(())
    }

    /// Disconnect `from` from `to`
    ///
    /// Idempotent: disconnecting an absent connection (or an unknown node)
    /// is a no-op, not an error.
    pub fn disconnect(&mut self, from: NodeId, to: NodeId) {
        self.edges.remove(&(from, to));
    }

    /// Remove every connection into and out of a node (idempotent)
    pub fn disconnect_all(&mut self, node: NodeId) {
        self.edges.retain(|&(a, b)| a != node && b != node);
    }

    /// Remove every outgoing connection of a node (idempotent)
    pub fn disconnect_outputs(&mut self, node: NodeId) {
        self.edges.retain(|&(a, _)| a != node);
    }

    /// Remove a node from the arena, disconnecting it first
    ///
    /// Anchors are never removed; removing an unknown node is a no-op.
    pub fn remove_node(&mut self, node: NodeId) {
        if node == self.input || node == self.output {
            return;
        }
        self.disconnect_all(node);
        self.nodes.remove(&node);
    }

    /// Start an oscillator
    ///
    /// A stopped oscillator cannot be restarted; callers must create a
    /// fresh node instead.
    pub fn start_oscillator(&mut self, node: NodeId) -> GraphResult<()> {
        match self.nodes.get_mut(&node) {
            Some(NodeKind::Oscillator { state, .. }) => match state {
                OscState::Stopped => Err(GraphError::OscillatorStopped(node)),
                _ => {
                    *state = OscState::Running;
                    Ok(())
                }
            },
            Some(_) => Err(GraphError::NotAnOscillator(node)),
            None => Err(GraphError::UnknownNode(node)),
        }
    }

    /// Stop an oscillator (idempotent; terminal)
    pub fn stop_oscillator(&mut self, node: NodeId) {
        if let Some(NodeKind::Oscillator { state, .. }) = self.nodes.get_mut(&node) {
            *state = OscState::Stopped;
        }
    }

    /// Update a gain node's level
    pub fn set_gain(&mut self, node: NodeId, gain: f64) {
        if let Some(NodeKind::Gain { gain: g }) = self.nodes.get_mut(&node) {
            *g = gain;
        }
    }

    /// Update a delay node's time
    pub fn set_delay_time(&mut self, node: NodeId, time_secs: f64) {
        if let Some(NodeKind::Delay { time_secs: t }) = self.nodes.get_mut(&node) {
            *t = time_secs;
        }
    }

    /// Update a filter or oscillator frequency
    pub fn set_frequency(&mut self, node: NodeId, frequency: f64) {
        match self.nodes.get_mut(&node) {
            Some(NodeKind::Filter { frequency: f, .. }) => *f = frequency,
            Some(NodeKind::Oscillator { frequency: f, .. }) => *f = frequency,
            _ => {}
        }
    }

    // --- Introspection ---

    /// Inspect a node's kind and parameters
    pub fn node(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&id)
    }

    /// Whether the node still exists in the arena
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of processing nodes, excluding the two anchors
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 2
    }

    /// Total number of connections
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether a direct input-to-output bypass connection exists
    pub fn is_direct_bypass(&self) -> bool {
        self.edges.contains(&(self.input, self.output))
    }

    /// Nodes fed by `node`
    pub fn outputs_of(&self, node: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .edges
            .iter()
            .filter(|&&(a, _)| a == node)
            .map(|&(_, b)| b)
            .collect();
        out.sort_by_key(|n| n.0);
        out
    }

    /// Nodes feeding `node`
    pub fn inputs_of(&self, node: NodeId) -> Vec<NodeId> {
        let mut inp: Vec<NodeId> = self
            .edges
            .iter()
            .filter(|&&(_, b)| b == node)
            .map(|&(a, _)| a)
            .collect();
        inp.sort_by_key(|n| n.0);
        inp
    }

    /// Whether a directed path exists from `from` to `to`
    ///
    /// Cycle-safe: feedback loops (delay -> gain -> delay) are expected.
    pub fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([from]);
        while let Some(node) = queue.pop_front() {
            for &(a, b) in &self.edges {
                if a == node && visited.insert(b) {
                    if b == to {
                        return true;
                    }
                    queue.push_back(b);
                }
            }
        }
        false
    }

    /// Whether input reaches output through at least one connection
    pub fn input_reaches_output(&self) -> bool {
        self.reaches(self.input, self.output)
    }
}

impl Default for AudioGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchors_are_permanent() {
        let mut graph = AudioGraph::new();
        let input = graph.input();
        let output = graph.output();

        graph.remove_node(input);
        graph.remove_node(output);

        assert!(graph.contains(input));
        assert!(graph.contains(output));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_connect_and_reachability() {
        let mut graph = AudioGraph::new();
        let gain = graph.add_gain(0.5);

        graph.connect(graph.input(), gain).unwrap();
        graph.connect(gain, graph.output()).unwrap();

        assert!(graph.input_reaches_output());
        assert!(!graph.is_direct_bypass());
        assert_eq!(graph.outputs_of(graph.input()), vec![gain]);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut graph = AudioGraph::new();
        let gain = graph.add_gain(1.0);
        graph.connect(graph.input(), gain).unwrap();

        graph.disconnect(graph.input(), gain);
        graph.disconnect(graph.input(), gain); // no-op, must not panic
        assert!(graph.outputs_of(graph.input()).is_empty());

        // Disconnecting a node that was never connected is also a no-op
        let orphan = graph.add_gain(1.0);
        graph.disconnect_all(orphan);
        graph.remove_node(orphan);
        graph.remove_node(orphan);
    }

    #[test]
    fn test_remove_node_disconnects() {
        let mut graph = AudioGraph::new();
        let gain = graph.add_gain(1.0);
        graph.connect(graph.input(), gain).unwrap();
        graph.connect(gain, graph.output()).unwrap();

        graph.remove_node(gain);

        assert!(!graph.contains(gain));
        assert_eq!(graph.edge_count(), 0);
        assert!(!graph.input_reaches_output());
    }

    #[test]
    fn test_closed_graph_rejects_connections() {
        let mut graph = AudioGraph::new();
        let gain = graph.add_gain(1.0);
        graph.close();

        let err = graph.connect(graph.input(), gain).unwrap_err();
        assert!(matches!(err, GraphError::Closed));
    }

    #[test]
    fn test_oscillator_cannot_restart() {
        let mut graph = AudioGraph::new();
        let lfo = graph.add_oscillator(Waveform::Sine, 0.5);

        graph.start_oscillator(lfo).unwrap();
        graph.stop_oscillator(lfo);
        graph.stop_oscillator(lfo); // idempotent

        let err = graph.start_oscillator(lfo).unwrap_err();
        assert!(matches!(err, GraphError::OscillatorStopped(_)));
    }

    #[test]
    fn test_reachability_with_feedback_cycle() {
        let mut graph = AudioGraph::new();
        let delay = graph.add_delay(0.25);
        let feedback = graph.add_gain(0.5);

        graph.connect(graph.input(), delay).unwrap();
        graph.connect(delay, feedback).unwrap();
        graph.connect(feedback, delay).unwrap(); // cycle
        graph.connect(delay, graph.output()).unwrap();

        assert!(graph.input_reaches_output());
    }

    #[test]
    fn test_param_setters() {
        let mut graph = AudioGraph::new();
        let delay = graph.add_delay(0.25);
        let filter = graph.add_filter(FilterShape::Bandpass, 800.0, 1.0);

        graph.set_delay_time(delay, 0.5);
        graph.set_frequency(filter, 1200.0);

        assert_eq!(graph.node(delay), Some(&NodeKind::Delay { time_secs: 0.5 }));
        match graph.node(filter) {
            Some(NodeKind::Filter { frequency, .. }) => assert_eq!(*frequency, 1200.0),
            other => panic!("unexpected node {:?}", other),
        }
    }
}
