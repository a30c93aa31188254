use std::path::PathBuf;

use super::*;
use crate::encode::clip::EncodedClip;
use crate::foundation::core::{Canvas, Fps};
use crate::raster::PixelBuffer;
use crate::render::source::StillFrameSource;
use crate::timeline::compose::{ComposeOpts, compose};

const COLORS: [Rgba8; 5] = [
    Rgba8::opaque(255, 0, 0),
    Rgba8::opaque(0, 0, 255),
    Rgba8::opaque(0, 255, 0),
    Rgba8::opaque(255, 255, 255),
    Rgba8::opaque(10, 10, 10),
];

fn fixture() -> (Composition, StillFrameSource) {
    let mut source = StillFrameSource::new();
    let clips: Vec<EncodedClip> = COLORS
        .iter()
        .enumerate()
        .map(|(i, color)| {
            let path = PathBuf::from(format!("/scratch/{i}.mov"));
            source.insert(&path, &PixelBuffer::solid(4, 4, *color));
            EncodedClip {
                name: i.to_string(),
                path,
                duration_secs: 3.0,
                fps: Fps::whole(30),
                frame_count: 90,
                natural_size: Canvas::new(4, 4),
            }
        })
        .collect();
    (compose(&clips, &ComposeOpts::default()).unwrap(), source)
}

#[test]
fn first_clip_alone_before_its_fade() {
    let (comp, mut source) = fixture();
    let frame = render_composition_frame(&comp, 0.5, &mut source, CompositorOpts::default()).unwrap();
    assert_eq!((frame.width, frame.height), (4, 4));
    assert_eq!(frame.pixel(0, 0), [255, 0, 0, 255]);
}

#[test]
fn mid_fade_blends_top_clip_over_next() {
    let (comp, mut source) = fixture();
    let frame = render_composition_frame(&comp, 1.5, &mut source, CompositorOpts::default()).unwrap();
    assert_eq!(frame.pixel(3, 3), [128, 0, 127, 255]);
}

#[test]
fn faded_clip_leaves_next_clip_visible() {
    let (comp, mut source) = fixture();
    let frame = render_composition_frame(&comp, 2.5, &mut source, CompositorOpts::default()).unwrap();
    assert_eq!(frame.pixel(1, 1), [0, 0, 255, 255]);
}

#[test]
fn tail_of_naive_duration_renders_clear_colour() {
    let (comp, mut source) = fixture();
    let opts = CompositorOpts {
        clear: Rgba8::opaque(1, 2, 3),
    };
    let frame = render_composition_frame(&comp, 12.0, &mut source, opts).unwrap();
    assert_eq!(frame.pixel(0, 0), [1, 2, 3, 255]);
}
