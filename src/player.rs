//! The playable result of a generation request.
//!
//! [`PlayableHandle`] pairs the composed timeline with its overlay host and the viewport it is
//! presented in. It renders frames on demand and carries the transport state a presentation
//! layer drives (play/pause, seek, volume).

use std::sync::Arc;

use image::imageops::{self, FilterType};

use crate::encode::sink::{FrameSink, SinkConfig, SinkPixelFormat};
use crate::foundation::core::{Canvas, FrameIndex, FrameRange, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::sync::SyncLayer;
use crate::render::FrameRGBA;
use crate::render::compositor::{CompositorOpts, render_composition_frame};
use crate::render::source::ClipFrameSource;
use crate::timeline::compose::Composition;

/// How a rendered frame is fitted into the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoGravity {
    /// Scale to cover the viewport, cropping the overflow around the centre.
    #[default]
    AspectFill,
    /// Scale to fit inside the viewport, letterboxed with the clear colour.
    AspectFit,
    /// Scale each axis independently.
    Stretch,
}

/// Playback settings applied when a handle is assembled.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Start in the playing state.
    pub autoplay: bool,
    /// Output volume in `0..=1`.
    pub volume: f32,
    /// Whether audio output is muted.
    pub muted: bool,
    /// Viewport fitting.
    pub gravity: VideoGravity,
    /// Colour behind the clips and around letterboxed frames.
    pub clear: Rgba8,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            autoplay: true,
            volume: 1.0,
            muted: false,
            gravity: VideoGravity::AspectFill,
            clear: Rgba8::BLACK,
        }
    }
}

/// Frames written by [`PlayableHandle::export`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Frames pushed into the sink.
    pub frames: u64,
}

/// A composed timeline ready to be presented.
#[derive(Clone, Debug)]
pub struct PlayableHandle {
    composition: Arc<Composition>,
    sync_layer: SyncLayer,
    viewport: Canvas,
    settings: PlaybackSettings,
    playing: bool,
    position_secs: f64,
}

impl PlayableHandle {
    /// Combine a composition and its overlay host into a handle for `viewport`.
    pub fn assemble(
        composition: Arc<Composition>,
        sync_layer: SyncLayer,
        viewport: Canvas,
    ) -> ReelResult<Self> {
        Self::assemble_with(composition, sync_layer, viewport, PlaybackSettings::default())
    }

    /// [`PlayableHandle::assemble`] with explicit playback settings.
    pub fn assemble_with(
        composition: Arc<Composition>,
        sync_layer: SyncLayer,
        viewport: Canvas,
        settings: PlaybackSettings,
    ) -> ReelResult<Self> {
        if viewport.is_empty() {
            return Err(ReelError::validation("viewport must be non-empty"));
        }
        if !(0.0..=1.0).contains(&settings.volume) {
            return Err(ReelError::validation("volume must be within 0..=1"));
        }
        Ok(Self {
            composition,
            sync_layer,
            viewport,
            playing: settings.autoplay,
            settings,
            position_secs: 0.0,
        })
    }

    /// The composed timeline.
    pub fn composition(&self) -> &Arc<Composition> {
        &self.composition
    }

    /// The overlay host.
    pub fn sync_layer(&self) -> &SyncLayer {
        &self.sync_layer
    }

    /// Presentation size.
    pub fn viewport(&self) -> Canvas {
        self.viewport
    }

    /// Playback settings the handle was assembled with, with current volume and mute state.
    pub fn settings(&self) -> PlaybackSettings {
        self.settings
    }

    /// Render frame `idx` at the composition's render size, overlay included.
    pub fn render_frame(
        &self,
        idx: FrameIndex,
        source: &mut dyn ClipFrameSource,
    ) -> ReelResult<FrameRGBA> {
        if idx.0 >= self.composition.frame_count() {
            return Err(ReelError::validation(format!(
                "frame {} is past the end of the composition ({} frames)",
                idx.0,
                self.composition.frame_count()
            )));
        }
        self.render_at(self.composition.frame_time(idx), source)
    }

    /// Render the frame shown at composition time `t` seconds.
    pub fn render_at(&self, t: f64, source: &mut dyn ClipFrameSource) -> ReelResult<FrameRGBA> {
        let opts = CompositorOpts {
            clear: self.settings.clear,
        };
        let mut frame = render_composition_frame(&self.composition, t, source, opts)?;
        self.sync_layer.composite_onto(&mut frame, t)?;
        Ok(frame)
    }

    /// Render frame `idx` fitted into the viewport per the handle's [`VideoGravity`].
    pub fn render_viewport_frame(
        &self,
        idx: FrameIndex,
        source: &mut dyn ClipFrameSource,
    ) -> ReelResult<FrameRGBA> {
        let frame = self.render_frame(idx, source)?;
        fit_to_viewport(
            frame,
            self.viewport,
            self.settings.gravity,
            self.settings.clear,
        )
    }

    /// Stream every composition frame into `sink`.
    pub fn export(
        &self,
        sink: &mut dyn FrameSink,
        source: &mut dyn ClipFrameSource,
    ) -> ReelResult<ExportStats> {
        let range = FrameRange::new(
            FrameIndex(0),
            FrameIndex(self.composition.frame_count()),
        )?;
        self.export_range(sink, source, range)
    }

    /// Stream frames `range` into `sink`. The sink is aborted when a frame fails.
    #[tracing::instrument(skip(self, sink, source), fields(start = range.start.0, end = range.end.0))]
    pub fn export_range(
        &self,
        sink: &mut dyn FrameSink,
        source: &mut dyn ClipFrameSource,
        range: FrameRange,
    ) -> ReelResult<ExportStats> {
        if range.is_empty() {
            return Err(ReelError::validation("export range must be non-empty"));
        }
        if range.end.0 > self.composition.frame_count() {
            return Err(ReelError::validation(
                "export range must be within composition duration",
            ));
        }

        let size = self.composition.render_size();
        sink.begin(SinkConfig {
            width: size.width,
            height: size.height,
            fps: self.composition.frame_rate(),
            pixel_format: SinkPixelFormat::Rgba8Premul,
        })?;

        let mut stats = ExportStats::default();
        for f in range.start.0..range.end.0 {
            let idx = FrameIndex(f);
            let pushed = self
                .render_frame(idx, source)
                .and_then(|frame| sink.push_frame(idx, &frame.data));
            if let Err(e) = pushed {
                sink.abort();
                return Err(e);
            }
            stats.frames += 1;
        }
        sink.end()?;
        tracing::info!(frames = stats.frames, "exported composition");
        Ok(stats)
    }

    /// Start or resume playback.
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Pause playback, keeping the position.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Whether the handle is in the playing state.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Move the playhead to `secs`, clamped to the composition duration.
    pub fn seek(&mut self, secs: f64) {
        let secs = if secs.is_finite() { secs } else { 0.0 };
        self.position_secs = secs.clamp(0.0, self.composition.duration_secs());
    }

    /// Playhead position in seconds.
    pub fn position(&self) -> f64 {
        self.position_secs
    }

    /// Frame under the playhead, clamped to the last frame.
    pub fn position_frame(&self) -> FrameIndex {
        let fps = self.composition.frame_rate();
        let last = self.composition.frame_count().saturating_sub(1);
        FrameIndex(fps.secs_to_frames_floor(self.position_secs).min(last))
    }

    /// Output volume.
    pub fn volume(&self) -> f32 {
        self.settings.volume
    }

    /// Set the output volume, clamped to `0..=1`.
    pub fn set_volume(&mut self, volume: f32) {
        self.settings.volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
    }

    /// Whether audio output is muted.
    pub fn is_muted(&self) -> bool {
        self.settings.muted
    }

    /// Mute or unmute audio output.
    pub fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
    }
}

fn fit_to_viewport(
    frame: FrameRGBA,
    viewport: Canvas,
    gravity: VideoGravity,
    clear: Rgba8,
) -> ReelResult<FrameRGBA> {
    if frame.width == viewport.width && frame.height == viewport.height {
        return Ok(frame);
    }
    let premultiplied = frame.premultiplied;
    let src = image::RgbaImage::from_raw(frame.width, frame.height, frame.data)
        .ok_or_else(|| ReelError::evaluation("frame buffer does not match its size"))?;

    let (vw, vh) = (viewport.width, viewport.height);
    let sx = f64::from(vw) / f64::from(src.width());
    let sy = f64::from(vh) / f64::from(src.height());

    let out = match gravity {
        VideoGravity::Stretch => imageops::resize(&src, vw, vh, FilterType::Triangle),
        VideoGravity::AspectFill => {
            let scale = sx.max(sy);
            let w = ((f64::from(src.width()) * scale).ceil() as u32).max(vw);
            let h = ((f64::from(src.height()) * scale).ceil() as u32).max(vh);
            let scaled = imageops::resize(&src, w, h, FilterType::Triangle);
            imageops::crop_imm(&scaled, (w - vw) / 2, (h - vh) / 2, vw, vh).to_image()
        }
        VideoGravity::AspectFit => {
            let scale = sx.min(sy);
            let w = ((f64::from(src.width()) * scale).round() as u32).clamp(1, vw);
            let h = ((f64::from(src.height()) * scale).round() as u32).clamp(1, vh);
            let scaled = imageops::resize(&src, w, h, FilterType::Triangle);
            let mut canvas = image::RgbaImage::from_pixel(vw, vh, image::Rgba(clear.to_premul()));
            imageops::replace(
                &mut canvas,
                &scaled,
                i64::from((vw - w) / 2),
                i64::from((vh - h) / 2),
            );
            canvas
        }
    };

    Ok(FrameRGBA {
        width: vw,
        height: vh,
        data: out.into_raw(),
        premultiplied,
    })
}

#[cfg(test)]
#[path = "../tests/unit/player/player.rs"]
mod tests;
