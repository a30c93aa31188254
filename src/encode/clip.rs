use std::path::{Path, PathBuf};

use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{FrameSink, SinkConfig, SinkPixelFormat};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::raster::{PixelBuffer, PixelFormat};

/// Default clip length in seconds.
pub const DEFAULT_CLIP_SECS: u32 = 3;
/// Default clip frame rate.
pub const DEFAULT_CLIP_FPS: Fps = Fps::whole(30);

/// A file-backed clip produced by [`ClipEncoder::encode`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EncodedClip {
    /// Name of the image the clip was generated from.
    pub name: String,
    /// Location of the encoded file.
    pub path: PathBuf,
    /// Clip length in seconds.
    pub duration_secs: f64,
    /// Encoded frame rate.
    pub fps: Fps,
    /// Number of frames written.
    pub frame_count: u64,
    /// Pixel size inherited from the source image.
    pub natural_size: Canvas,
}

/// Opens the writer for one clip file.
///
/// The default [`FfmpegSinkFactory`] pipes into `ffmpeg`; tests and alternative encoders plug
/// in here.
pub trait ClipSinkFactory: Send + Sync {
    /// Open a sink that will write to `out_path`.
    fn open(&self, out_path: &Path) -> ReelResult<Box<dyn FrameSink>>;
}

/// [`ClipSinkFactory`] backed by [`FfmpegSink`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegSinkFactory;

impl ClipSinkFactory for FfmpegSinkFactory {
    fn open(&self, out_path: &Path) -> ReelResult<Box<dyn FrameSink>> {
        Ok(Box::new(FfmpegSink::new(FfmpegSinkOpts::new(out_path))))
    }
}

/// Options for [`ClipEncoder`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClipEncoderOpts {
    /// Scratch directory clips are written to.
    pub out_dir: PathBuf,
    /// Clip length in whole seconds.
    pub duration_secs: u32,
    /// Clip frame rate.
    pub fps: Fps,
    /// Output file extension (container).
    pub extension: String,
}

impl Default for ClipEncoderOpts {
    fn default() -> Self {
        Self {
            out_dir: std::env::temp_dir().join("fadereel"),
            duration_secs: DEFAULT_CLIP_SECS,
            fps: DEFAULT_CLIP_FPS,
            extension: "mov".to_string(),
        }
    }
}

impl ClipEncoderOpts {
    /// Options writing into `out_dir` with default timing.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Self::default()
        }
    }

    /// Check that the clip length and frame rate describe at least one frame.
    pub fn validate(&self) -> ReelResult<()> {
        if self.duration_secs == 0 {
            return Err(ReelError::validation("clip duration must be > 0 seconds"));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        Ok(())
    }

    /// Number of frames each clip holds.
    pub fn frame_count(&self) -> u64 {
        self.fps.secs_to_frames_round(f64::from(self.duration_secs))
    }
}

/// Turns one still frame into a fixed-duration clip file.
pub struct ClipEncoder {
    opts: ClipEncoderOpts,
    sinks: Box<dyn ClipSinkFactory>,
}

impl std::fmt::Debug for ClipEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipEncoder")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl ClipEncoder {
    /// Encoder writing through `ffmpeg`.
    pub fn new(opts: ClipEncoderOpts) -> Self {
        Self::with_sink_factory(opts, FfmpegSinkFactory)
    }

    /// Encoder writing through a custom sink factory.
    pub fn with_sink_factory(opts: ClipEncoderOpts, sinks: impl ClipSinkFactory + 'static) -> Self {
        Self {
            opts,
            sinks: Box::new(sinks),
        }
    }

    /// Encoder options.
    pub fn opts(&self) -> &ClipEncoderOpts {
        &self.opts
    }

    /// Derive `<out_dir>/<root>.<ext>` for `image_name`, creating `out_dir` if needed.
    ///
    /// `root` is the first non-empty `.`-separated segment of the name, so `sunset.jpg` maps to
    /// `sunset.mov`.
    pub fn clip_path(&self, image_name: &str) -> ReelResult<PathBuf> {
        let root = clip_root(image_name)?;
        std::fs::create_dir_all(&self.opts.out_dir).map_err(|e| {
            ReelError::invalid_url(
                image_name,
                format!(
                    "cannot create output directory '{}': {e}",
                    self.opts.out_dir.display()
                ),
            )
        })?;
        Ok(self
            .opts
            .out_dir
            .join(format!("{root}.{}", self.opts.extension)))
    }

    /// Encode `buffer` repeated for the configured duration.
    ///
    /// Returns once the writer has finished flushing. Any previous clip at the target path is
    /// removed first. On failure or cancellation the partial file is removed.
    #[tracing::instrument(skip(self, buffer, cancel), fields(width = buffer.width, height = buffer.height))]
    pub fn encode(
        &self,
        buffer: &PixelBuffer,
        image_name: &str,
        cancel: &CancelToken,
    ) -> ReelResult<EncodedClip> {
        self.opts.validate()?;
        if buffer.width == 0 || buffer.height == 0 {
            return Err(ReelError::invalid_image(image_name, "empty pixel buffer"));
        }
        let expected = (buffer.width as usize) * (buffer.height as usize) * 4;
        if buffer.data.len() != expected {
            return Err(ReelError::invalid_image(
                image_name,
                format!("pixel buffer holds {} bytes, expected {expected}", buffer.data.len()),
            ));
        }
        cancel.check()?;

        let path = self.clip_path(image_name)?;
        remove_previous_clip(&path);

        let mut sink = self
            .sinks
            .open(&path)
            .map_err(|e| ReelError::encoder_init(&path, e.to_string()))?;
        let cfg = SinkConfig {
            width: buffer.width,
            height: buffer.height,
            fps: self.opts.fps,
            pixel_format: match buffer.format {
                PixelFormat::Bgra8 => SinkPixelFormat::Bgra8,
            },
        };
        if let Err(e) = sink.begin(cfg) {
            sink.abort();
            discard_partial(&path);
            return Err(ReelError::encoder_init(&path, e.to_string()));
        }

        let frame_count = self.opts.frame_count();
        if let Err(e) = write_frames(sink.as_mut(), buffer, frame_count, cancel) {
            sink.abort();
            discard_partial(&path);
            return Err(e);
        }
        if let Err(e) = sink.end() {
            discard_partial(&path);
            return Err(e);
        }

        tracing::debug!(path = %path.display(), frame_count, "clip written");
        Ok(EncodedClip {
            name: image_name.to_string(),
            path,
            duration_secs: f64::from(self.opts.duration_secs),
            fps: self.opts.fps,
            frame_count,
            natural_size: buffer.size(),
        })
    }
}

pub(crate) fn clip_root(image_name: &str) -> ReelResult<&str> {
    let root = image_name
        .split('.')
        .find(|s| !s.is_empty())
        .ok_or_else(|| ReelError::invalid_url(image_name, "image name has no usable root"))?;
    if root.contains(['/', '\\']) {
        return Err(ReelError::invalid_url(
            image_name,
            "image name must not contain path separators",
        ));
    }
    Ok(root)
}

fn write_frames(
    sink: &mut dyn FrameSink,
    buffer: &PixelBuffer,
    frame_count: u64,
    cancel: &CancelToken,
) -> ReelResult<()> {
    for k in 0..frame_count {
        cancel.check()?;
        sink.push_frame(FrameIndex(k), &buffer.data)?;
    }
    Ok(())
}

fn remove_previous_clip(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed previous clip"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not remove previous clip")
        }
    }
}

fn discard_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "could not remove partial clip");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/clip.rs"]
mod tests;
