use std::sync::{Arc, Mutex};

use super::*;
use crate::foundation::core::Rgba8;

#[derive(Default)]
struct Log {
    pts: Vec<f64>,
    distinct_payloads: usize,
    aborted: bool,
}

/// Appends a summary line to the output file on `end`, so a leftover file would be visible.
struct AppendingSink {
    path: PathBuf,
    cfg: Option<SinkConfig>,
    frames: u64,
    last_payload: Option<Vec<u8>>,
    log: Arc<Mutex<Log>>,
}

impl FrameSink for AppendingSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &[u8]) -> ReelResult<()> {
        let cfg = self.cfg.as_ref().unwrap();
        let mut log = self.log.lock().unwrap();
        log.pts.push(cfg.pts_secs(idx));
        if self.last_payload.as_deref() != Some(frame) {
            log.distinct_payloads += 1;
            self.last_payload = Some(frame.to_vec());
        }
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        use std::io::Write as _;
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .unwrap();
        writeln!(f, "frames={}", self.frames).unwrap();
        Ok(())
    }

    fn abort(&mut self) {
        self.log.lock().unwrap().aborted = true;
    }
}

#[derive(Clone, Default)]
struct AppendingFactory {
    log: Arc<Mutex<Log>>,
}

impl ClipSinkFactory for AppendingFactory {
    fn open(&self, out_path: &Path) -> ReelResult<Box<dyn FrameSink>> {
        Ok(Box::new(AppendingSink {
            path: out_path.to_path_buf(),
            cfg: None,
            frames: 0,
            last_payload: None,
            log: self.log.clone(),
        }))
    }
}

struct FailingFactory;

impl ClipSinkFactory for FailingFactory {
    fn open(&self, _out_path: &Path) -> ReelResult<Box<dyn FrameSink>> {
        Err(ReelError::evaluation("writer unavailable"))
    }
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fadereel_clip_{tag}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn encode_writes_ninety_identical_frames_at_thirty_fps() {
    let dir = scratch_dir("frames");
    let factory = AppendingFactory::default();
    let encoder = ClipEncoder::with_sink_factory(ClipEncoderOpts::new(&dir), factory.clone());
    let buffer = PixelBuffer::solid(4, 2, Rgba8::CYAN);

    let clip = encoder.encode(&buffer, "1", &CancelToken::new()).unwrap();

    assert_eq!(clip.frame_count, 90);
    assert_eq!(clip.duration_secs, 3.0);
    assert_eq!(clip.natural_size, Canvas::new(4, 2));
    assert_eq!(clip.path, dir.join("1.mov"));

    let log = factory.log.lock().unwrap();
    assert_eq!(log.pts.len(), 90);
    for (k, pts) in log.pts.iter().enumerate() {
        assert!((pts - k as f64 / 30.0).abs() < 1e-9);
    }
    assert_eq!(log.distinct_payloads, 1);
}

#[test]
fn encode_replaces_existing_clip() {
    let dir = scratch_dir("replace");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("2.mov"), "stale\n").unwrap();

    let encoder =
        ClipEncoder::with_sink_factory(ClipEncoderOpts::new(&dir), AppendingFactory::default());
    let buffer = PixelBuffer::solid(2, 2, Rgba8::YELLOW);
    encoder.encode(&buffer, "2", &CancelToken::new()).unwrap();
    encoder.encode(&buffer, "2", &CancelToken::new()).unwrap();

    let body = std::fs::read_to_string(dir.join("2.mov")).unwrap();
    assert_eq!(body, "frames=90\n");
}

#[test]
fn clip_path_uses_name_root() {
    let dir = scratch_dir("root");
    let encoder = ClipEncoder::with_sink_factory(ClipEncoderOpts::new(&dir), FailingFactory);
    assert_eq!(
        encoder.clip_path("sunset.final.jpg").unwrap(),
        dir.join("sunset.mov")
    );
    assert_eq!(encoder.clip_path(".hidden").unwrap(), dir.join("hidden.mov"));
}

#[test]
fn unusable_names_are_invalid_url() {
    let dir = scratch_dir("url");
    let encoder = ClipEncoder::with_sink_factory(ClipEncoderOpts::new(&dir), FailingFactory);
    for name in ["", "...", "../escape", "a/b"] {
        let err = encoder.clip_path(name).unwrap_err();
        assert!(
            matches!(err, ReelError::InvalidUrl { .. }),
            "{name:?} gave {err}"
        );
    }
}

#[test]
fn writer_failure_is_encoder_init_failed() {
    let dir = scratch_dir("init");
    let encoder = ClipEncoder::with_sink_factory(ClipEncoderOpts::new(&dir), FailingFactory);
    let buffer = PixelBuffer::solid(2, 2, Rgba8::BLACK);
    let err = encoder
        .encode(&buffer, "3", &CancelToken::new())
        .unwrap_err();
    match err {
        ReelError::EncoderInitFailed { path, reason } => {
            assert_eq!(path, dir.join("3.mov"));
            assert!(reason.contains("writer unavailable"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn cancelled_encode_writes_nothing() {
    let dir = scratch_dir("cancel");
    let factory = AppendingFactory::default();
    let encoder = ClipEncoder::with_sink_factory(ClipEncoderOpts::new(&dir), factory.clone());
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = encoder
        .encode(&PixelBuffer::solid(2, 2, Rgba8::BLACK), "4", &cancel)
        .unwrap_err();
    assert!(matches!(err, ReelError::Cancelled));
    assert!(!dir.join("4.mov").exists());
    assert!(factory.log.lock().unwrap().pts.is_empty());
}

#[test]
fn mismatched_buffer_is_invalid_image() {
    let dir = scratch_dir("mismatch");
    let encoder =
        ClipEncoder::with_sink_factory(ClipEncoderOpts::new(&dir), AppendingFactory::default());
    let mut buffer = PixelBuffer::solid(2, 2, Rgba8::BLACK);
    buffer.data.pop();
    let err = encoder
        .encode(&buffer, "5", &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ReelError::InvalidImage { .. }));
}

#[test]
fn zero_rate_or_duration_is_rejected_before_writing() {
    let dir = scratch_dir("timing");
    let buffer = PixelBuffer::solid(2, 2, Rgba8::BLACK);

    let mut opts = ClipEncoderOpts::new(&dir);
    opts.fps = Fps { num: 30, den: 0 };
    let factory = AppendingFactory::default();
    let encoder = ClipEncoder::with_sink_factory(opts, factory.clone());
    let err = encoder
        .encode(&buffer, "6", &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));

    let mut opts = ClipEncoderOpts::new(&dir);
    opts.duration_secs = 0;
    let encoder = ClipEncoder::with_sink_factory(opts, factory.clone());
    let err = encoder
        .encode(&buffer, "6", &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));

    assert!(!dir.join("6.mov").exists());
    assert!(factory.log.lock().unwrap().pts.is_empty());
}
