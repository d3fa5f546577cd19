//! Signal scoring: per-factor sub-scores, weighted confidence fusion,
//! and the emission gate.

pub mod confidence;
pub mod gating;
pub mod subscores;

pub use confidence::{score, Score};
pub use gating::{confirmation, should_emit, Confirmation, GateDecision, SignalQuality};
pub use subscores::{sub_scores, SubScores};
