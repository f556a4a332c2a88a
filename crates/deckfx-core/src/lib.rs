//! Deckfx Core - Beat-synchronized audio FX engine for the track-detail player

pub mod cue;
pub mod fx;
pub mod graph;
pub mod session;
pub mod sync;
pub mod tempo;
pub mod types;

pub use types::*;
