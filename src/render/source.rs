use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::encode::clip::EncodedClip;
use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::raster::PixelBuffer;

/// Decoded clip picture in the compositor's working format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedFrame {
    /// Picture size.
    pub size: Canvas,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Vec<u8>,
}

impl PreparedFrame {
    /// Prepare a rasterized still for compositing.
    pub fn from_pixel_buffer(buffer: &PixelBuffer) -> Self {
        Self {
            size: buffer.size(),
            rgba8_premul: buffer.to_rgba8_premul(),
        }
    }
}

/// Supplies clip pictures to the compositor.
pub trait ClipFrameSource {
    /// Picture of `clip` at clip-local time `local_secs`.
    fn frame_at(&mut self, clip: &EncodedClip, local_secs: f64) -> ReelResult<Arc<PreparedFrame>>;
}

/// In-memory stills keyed by clip path.
///
/// Clips built from one image hold the same picture for their whole duration, so the
/// rasterized buffer stands in for decoding the file.
#[derive(Clone, Debug, Default)]
pub struct StillFrameSource {
    stills: HashMap<PathBuf, Arc<PreparedFrame>>,
}

impl StillFrameSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the still for the clip written to `clip_path`.
    pub fn insert(&mut self, clip_path: impl Into<PathBuf>, buffer: &PixelBuffer) {
        self.stills.insert(
            clip_path.into(),
            Arc::new(PreparedFrame::from_pixel_buffer(buffer)),
        );
    }

    /// Number of registered stills.
    pub fn len(&self) -> usize {
        self.stills.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.stills.is_empty()
    }
}

impl ClipFrameSource for StillFrameSource {
    fn frame_at(&mut self, clip: &EncodedClip, _local_secs: f64) -> ReelResult<Arc<PreparedFrame>> {
        self.stills.get(&clip.path).cloned().ok_or_else(|| {
            ReelError::evaluation(format!("no still registered for '{}'", clip.path.display()))
        })
    }
}

const DEFAULT_DECODE_CACHE: usize = 32;

type DecodeFn = fn(&Path, Canvas) -> ReelResult<Vec<u8>>;

/// Decodes clip pictures from their files with the system `ffmpeg`.
///
/// Clips hold one still for their whole duration, so each file is decoded once and cached by
/// path; the oldest clips are evicted first.
#[derive(Debug)]
pub struct FfmpegFrameSource {
    capacity: usize,
    clips: HashMap<PathBuf, Arc<PreparedFrame>>,
    order: VecDeque<PathBuf>,
    decode: DecodeFn,
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_DECODE_CACHE)
    }
}

impl FfmpegFrameSource {
    /// Create a source with the default cache size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source caching at most `capacity` decoded clips.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            clips: HashMap::new(),
            order: VecDeque::new(),
            decode: decode_first_frame_rgba8,
        }
    }

    fn insert(&mut self, path: PathBuf, frame: Arc<PreparedFrame>) {
        while self.clips.len() >= self.capacity {
            let Some(old) = self.order.pop_front() else {
                break;
            };
            self.clips.remove(&old);
        }
        self.order.push_back(path.clone());
        self.clips.insert(path, frame);
    }
}

impl ClipFrameSource for FfmpegFrameSource {
    fn frame_at(&mut self, clip: &EncodedClip, _local_secs: f64) -> ReelResult<Arc<PreparedFrame>> {
        if let Some(hit) = self.clips.get(&clip.path) {
            return Ok(hit.clone());
        }

        let mut rgba = (self.decode)(&clip.path, clip.natural_size)?;
        premultiply_rgba8_in_place(&mut rgba);
        let prepared = Arc::new(PreparedFrame {
            size: clip.natural_size,
            rgba8_premul: rgba,
        });
        self.insert(clip.path.clone(), prepared.clone());
        Ok(prepared)
    }
}

fn decode_first_frame_rgba8(path: &Path, size: Canvas) -> ReelResult<Vec<u8>> {
    // Odd-sized clips were padded to even on encode; crop back to the natural size.
    let crop = format!("crop={}:{}:0:0", size.width, size.height);
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-frames:v",
            "1",
            "-vf",
            &crop,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::evaluation(format!("failed to run ffmpeg for clip decode: {e}")))?;

    if !out.status.success() {
        return Err(ReelError::evaluation(format!(
            "ffmpeg clip decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    if out.stdout.len() != size.rgba_len() {
        return Err(ReelError::evaluation(format!(
            "decoded frame has {} bytes, expected {}",
            out.stdout.len(),
            size.rgba_len()
        )));
    }
    Ok(out.stdout)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/source.rs"]
mod tests;
