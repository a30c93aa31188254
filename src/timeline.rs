//! Multi-track timeline built from encoded clips.
//!
//! Clips overlap on the timeline; each clip's video track fades out over a fixed window while
//! the next one is already playing underneath it.

/// Composition model and the [`compose`](compose::compose) entry point.
pub mod compose;
/// Opacity ramps attached to video tracks.
pub mod ramp;
/// Track identifiers and allocation.
pub mod track;
