//! fadereel turns a handful of still images into a short cross-faded reel.
//!
//! Each image becomes a fixed-length clip file. The clips are laid out on one timeline where
//! every clip fades out over the one that follows it, a text layer is attached on top, and the
//! result is handed back as a [`PlayableHandle`] that renders frames or exports a video.
//!
//! - Load [`SourceImage`]s
//! - Run a [`ReelGenerator`] request
//! - Render frames from the [`PlayableHandle`] or stream them into a [`FrameSink`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

/// Clip encoding and frame sinks.
pub mod encode;
/// Time-synchronised overlay layers.
pub mod overlay;
/// Generation requests.
pub mod pipeline;
/// Playable result handle.
pub mod player;
/// Image decoding into pixel buffers.
pub mod raster;
/// CPU compositing.
pub mod render;
/// Clip layout, tracks and opacity ramps.
pub mod timeline;

pub use crate::assets::{IMAGE_EXTENSIONS, SourceImage};
pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::core::{
    Canvas, Fps, FrameIndex, FrameRange, Point, Rect, Rgba8, TimeRange,
};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::encode::clip::{
    ClipEncoder, ClipEncoderOpts, ClipSinkFactory, EncodedClip, FfmpegSinkFactory,
};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig, SinkPixelFormat};
pub use crate::overlay::sync::SyncLayer;
pub use crate::overlay::text::{OverlayLayer, OverlayLayerBuilder, TextAlign, TextStyle};
pub use crate::pipeline::config::ReelConfig;
pub use crate::pipeline::{GenerateOpts, GeneratedReel, ReelGenerator};
pub use crate::player::{ExportStats, PlayableHandle, PlaybackSettings, VideoGravity};
pub use crate::raster::{PixelBuffer, PixelFormat, rasterize};
pub use crate::render::FrameRGBA;
pub use crate::render::source::{ClipFrameSource, FfmpegFrameSource, StillFrameSource};
pub use crate::timeline::compose::{
    ComposeOpts, Composition, DurationPolicy, TransitionLayout, compose,
};
pub use crate::timeline::ramp::{OpacityRamp, RampCurve};
