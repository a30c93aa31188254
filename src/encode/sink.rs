use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};

/// Pixel layout of the bytes handed to [`FrameSink::push_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkPixelFormat {
    /// Straight-alpha BGRA8, as produced by [`crate::rasterize`].
    Bgra8,
    /// Premultiplied RGBA8, as produced by the compositor.
    Rgba8Premul,
}

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames-per-second; frame `k` is presented at `k / fps` seconds.
    pub fps: Fps,
    /// Layout of pushed frame bytes.
    pub pixel_format: SinkPixelFormat,
}

impl SinkConfig {
    /// Expected byte length of one pushed frame.
    pub fn frame_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }

    /// Presentation timestamp of frame `idx` in seconds.
    pub fn pts_secs(&self, idx: FrameIndex) -> f64 {
        self.fps.frames_to_secs(idx.0)
    }
}

/// Sink contract for consuming frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
/// `push_frame` may block until the sink is ready for more data.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &[u8]) -> ReelResult<()>;
    /// Flush and finalize. Returns only once the output is complete.
    fn end(&mut self) -> ReelResult<()>;
    /// Tear down after a failure or cancellation without finalizing.
    fn abort(&mut self) {}
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, Vec<u8>)>,
    finished: bool,
    aborted: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, Vec<u8>)] {
        &self.frames
    }

    /// `true` once `end` succeeded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// `true` once `abort` was called.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &[u8]) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::evaluation("in-memory sink not started"))?;
        if frame.len() != cfg.frame_len() {
            return Err(ReelError::validation(format!(
                "frame byte length {} does not match {}x{}x4",
                frame.len(),
                cfg.width,
                cfg.height
            )));
        }
        if let Some((last, _)) = self.frames.last()
            && idx.0 <= last.0
        {
            return Err(ReelError::evaluation(
                "in-memory sink received out-of-order frame index",
            ));
        }
        self.frames.push((idx, frame.to_vec()));
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
