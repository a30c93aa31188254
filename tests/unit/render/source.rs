use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::foundation::core::{Fps, Rgba8};

fn clip(path: &str) -> EncodedClip {
    EncodedClip {
        name: "x".to_string(),
        path: PathBuf::from(path),
        duration_secs: 3.0,
        fps: Fps::whole(30),
        frame_count: 90,
        natural_size: Canvas::new(1, 1),
    }
}

#[test]
fn still_source_returns_registered_frame_at_any_time() {
    let mut src = StillFrameSource::new();
    src.insert("/s/1.mov", &PixelBuffer::solid(1, 1, Rgba8::CYAN));
    assert_eq!(src.len(), 1);

    let a = src.frame_at(&clip("/s/1.mov"), 0.0).unwrap();
    let b = src.frame_at(&clip("/s/1.mov"), 2.9).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.rgba8_premul, vec![0, 255, 255, 255]);
}

#[test]
fn still_source_unknown_clip_errors() {
    let mut src = StillFrameSource::new();
    assert!(src.frame_at(&clip("/s/none.mov"), 0.0).is_err());
}

#[test]
fn decode_cache_evicts_oldest_clip() {
    let mut src = FfmpegFrameSource::with_capacity(2);
    let frame = Arc::new(PreparedFrame {
        size: Canvas::new(1, 1),
        rgba8_premul: vec![0; 4],
    });
    src.insert(PathBuf::from("a.mov"), frame.clone());
    src.insert(PathBuf::from("b.mov"), frame.clone());
    src.insert(PathBuf::from("c.mov"), frame);

    assert_eq!(src.clips.len(), 2);
    assert!(!src.clips.contains_key(&PathBuf::from("a.mov")));
}

static DECODES: AtomicUsize = AtomicUsize::new(0);

fn counting_decode(_path: &Path, size: Canvas) -> ReelResult<Vec<u8>> {
    DECODES.fetch_add(1, Ordering::SeqCst);
    Ok(vec![255; size.rgba_len()])
}

#[test]
fn each_clip_file_is_decoded_once() {
    let mut src = FfmpegFrameSource::new();
    src.decode = counting_decode;
    let clips = [clip("/s/1.mov"), clip("/s/2.mov")];

    for k in 0..180 {
        let t = f64::from(k) / 60.0;
        for c in &clips {
            let frame = src.frame_at(c, t).unwrap();
            assert_eq!(frame.rgba8_premul, vec![255; 4]);
        }
    }
    assert_eq!(DECODES.load(Ordering::SeqCst), 2);
}

#[test]
fn premultiply_leaves_opaque_pixels() {
    let mut px = vec![10, 20, 30, 255, 200, 100, 0, 128];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![10, 20, 30, 255, 100, 50, 0, 128]);
}
