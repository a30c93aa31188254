//! Time-synchronised layers drawn above the composition.

/// Host layer following the composition's time base.
pub mod sync;
/// Styled text layer and its rasterization.
pub mod text;
