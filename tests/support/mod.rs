#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fadereel::{ClipSinkFactory, FrameIndex, FrameSink, ReelError, ReelResult, SinkConfig};

/// Fresh directory under `target/` for one test.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("fadereel-tests").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write `<dir>/<name>.png` solid-colour fixtures, one per entry.
pub fn write_pngs(dir: &Path, fixtures: &[(&str, u32, u32, [u8; 3])]) {
    std::fs::create_dir_all(dir).unwrap();
    for (name, w, h, rgb) in fixtures {
        let img = image::RgbaImage::from_pixel(*w, *h, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
        img.save(dir.join(format!("{name}.png"))).unwrap();
    }
}

/// The five-image demo set: `1.png` .. `5.png`, 100x100, distinct colours.
pub fn write_demo_set(dir: &Path) {
    write_pngs(
        dir,
        &[
            ("1", 100, 100, [200, 0, 0]),
            ("2", 100, 100, [0, 200, 0]),
            ("3", 100, 100, [0, 0, 200]),
            ("4", 100, 100, [200, 200, 0]),
            ("5", 100, 100, [0, 200, 200]),
        ],
    );
}

/// What the recording sinks saw, shared across all clips of a request.
#[derive(Debug, Default)]
pub struct Recorded {
    pub opened: Vec<PathBuf>,
    pub frames: Vec<(PathBuf, u64)>,
    pub configs: Vec<SinkConfig>,
    pub aborted: usize,
}

struct RecordingSink {
    path: PathBuf,
    frames: u64,
    last: Option<FrameIndex>,
    log: Arc<Mutex<Recorded>>,
}

impl FrameSink for RecordingSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.log.lock().unwrap().configs.push(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &[u8]) -> ReelResult<()> {
        if let Some(last) = self.last
            && idx.0 != last.0 + 1
        {
            return Err(ReelError::evaluation("frames out of order"));
        }
        self.last = Some(idx);
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        std::fs::write(&self.path, format!("frames={}\n", self.frames))
            .map_err(|e| ReelError::evaluation(e.to_string()))?;
        self.log
            .lock()
            .unwrap()
            .frames
            .push((self.path.clone(), self.frames));
        Ok(())
    }

    fn abort(&mut self) {
        self.log.lock().unwrap().aborted += 1;
    }
}

/// Sink factory that writes a one-line summary file per clip instead of video.
#[derive(Clone, Default)]
pub struct RecordingFactory {
    pub log: Arc<Mutex<Recorded>>,
}

impl ClipSinkFactory for RecordingFactory {
    fn open(&self, out_path: &Path) -> ReelResult<Box<dyn FrameSink>> {
        self.log.lock().unwrap().opened.push(out_path.to_path_buf());
        Ok(Box::new(RecordingSink {
            path: out_path.to_path_buf(),
            frames: 0,
            last: None,
            log: self.log.clone(),
        }))
    }
}

/// Sorted file names in `dir`, empty when it does not exist.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
