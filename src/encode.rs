//! Clip encoding.
//!
//! A [`ClipEncoder`](clip::ClipEncoder) repeats one rasterized frame for a fixed duration and
//! streams it into a [`FrameSink`](sink::FrameSink). Sinks consume frames in timeline order.

/// Still-image to fixed-duration clip encoding.
pub mod clip;
/// `ffmpeg`-based sinks (`.mov`/`.mp4` output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
