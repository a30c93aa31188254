use std::path::PathBuf;

use super::*;

fn clip(name: &str, w: u32, h: u32) -> EncodedClip {
    EncodedClip {
        name: name.to_string(),
        path: PathBuf::from(format!("/scratch/{name}.mov")),
        duration_secs: 3.0,
        fps: Fps::whole(30),
        frame_count: 90,
        natural_size: Canvas::new(w, h),
    }
}

fn five_clips() -> Vec<EncodedClip> {
    ["1", "2", "3", "4", "5"]
        .iter()
        .map(|n| clip(n, 100, 100))
        .collect()
}

#[test]
fn five_clips_make_five_video_tracks_and_fifteen_seconds() {
    let comp = compose(&five_clips(), &ComposeOpts::default()).unwrap();
    assert_eq!(comp.entries().len(), 5);
    assert_eq!(comp.video_track_count(), 5);
    assert_eq!(comp.tracks().len(), 10);
    assert_eq!(comp.duration_secs(), 15.0);
    assert_eq!(comp.instruction_time_range().end(), 15.0);
    assert_eq!(comp.frame_count(), 900);
    assert_eq!(comp.render_size(), Canvas::new(100, 100));
}

#[test]
fn clip_starts_follow_two_i_minus_one() {
    let comp = compose(&five_clips(), &ComposeOpts::default()).unwrap();
    let starts: Vec<f64> = comp.entries().iter().map(|e| e.start_secs).collect();
    assert_eq!(starts, vec![0.0, 1.0, 3.0, 5.0, 7.0]);
}

#[test]
fn fade_windows_start_at_two_i_plus_one_and_last_one_second() {
    let comp = compose(&five_clips(), &ComposeOpts::default()).unwrap();
    for (i, entry) in comp.entries().iter().enumerate() {
        assert_eq!(entry.ramp.range.start, (2 * i + 1) as f64);
        assert_eq!(entry.ramp.range.duration, 1.0);
        assert_eq!(entry.ramp.from, 1.0);
        assert_eq!(entry.ramp.to, 0.0);
    }
}

#[test]
fn each_entry_owns_distinct_video_and_audio_tracks() {
    let comp = compose(&five_clips(), &ComposeOpts::default()).unwrap();
    let mut ids: Vec<TrackId> = comp
        .entries()
        .iter()
        .flat_map(|e| [e.video_track, e.audio_track])
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[test]
fn render_size_comes_from_last_clip() {
    let clips = vec![clip("a", 640, 480), clip("b", 320, 200)];
    let comp = compose(&clips, &ComposeOpts::default()).unwrap();
    assert_eq!(comp.render_size(), Canvas::new(320, 200));
}

#[test]
fn visible_span_policy_uses_last_clip_end() {
    let opts = ComposeOpts::default().with_duration_policy(DurationPolicy::VisibleSpan);
    let comp = compose(&five_clips(), &opts).unwrap();
    assert_eq!(comp.duration_secs(), 10.0);
    assert_eq!(comp.visible_span_secs(), 10.0);
}

#[test]
fn track_cap_aborts_whole_composition() {
    let opts = ComposeOpts::default().with_max_tracks(5);
    let err = compose(&five_clips(), &opts).unwrap_err();
    match err {
        ReelError::InvalidVideoTrack { index, .. } => assert_eq!(index, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn clip_without_picture_is_invalid_video_track() {
    let mut clips = five_clips();
    clips[3].natural_size = Canvas::new(0, 0);
    let err = compose(&clips, &ComposeOpts::default()).unwrap_err();
    assert!(matches!(err, ReelError::InvalidVideoTrack { index: 3, .. }));
}

#[test]
fn empty_clip_list_is_rejected() {
    assert!(matches!(
        compose(&[], &ComposeOpts::default()).unwrap_err(),
        ReelError::Validation(_)
    ));
}

#[test]
fn layers_are_bottom_to_top_with_ramp_opacity() {
    let comp = compose(&five_clips(), &ComposeOpts::default()).unwrap();

    let at_half = comp.layers_at(0.5);
    assert_eq!(at_half.len(), 1);
    assert_eq!(at_half[0].entry.index, 0);

    let mid_fade = comp.layers_at(1.5);
    let order: Vec<usize> = mid_fade.iter().map(|l| l.entry.index).collect();
    assert_eq!(order, vec![1, 0]);
    assert_eq!(mid_fade[1].opacity, 0.5);
    assert_eq!(mid_fade[0].opacity, 1.0);
    assert_eq!(mid_fade[0].local_secs, 0.5);

    // clip 0 is fully faded but still inside its 3 s span
    let after_fade = comp.layers_at(2.5);
    let order: Vec<usize> = after_fade.iter().map(|l| l.entry.index).collect();
    assert_eq!(order, vec![1]);
}

#[test]
fn nothing_is_drawn_after_last_fade_or_outside_instruction() {
    let comp = compose(&five_clips(), &ComposeOpts::default()).unwrap();
    assert!(comp.layers_at(10.5).is_empty());
    assert!(comp.layers_at(15.0).is_empty());
    assert!(comp.layers_at(-0.1).is_empty());
}

#[test]
fn composition_round_trips_through_json() {
    let comp = compose(&five_clips(), &ComposeOpts::default()).unwrap();
    let json = serde_json::to_string(&comp).unwrap();
    let back: Composition = serde_json::from_str(&json).unwrap();
    assert_eq!(back, comp);
}

#[test]
fn custom_layout_snaps_to_sixtieths() {
    let opts = ComposeOpts {
        layout: TransitionLayout {
            stride_secs: 2.005,
            lead_secs: 1.0,
            fade_secs: 0.5,
            ..TransitionLayout::default()
        },
        ..ComposeOpts::default()
    };
    let comp = compose(&five_clips(), &opts).unwrap();
    let entries = comp.entries();
    assert_eq!(entries[1].start_secs, 1.0);
    assert_eq!(entries[1].ramp.range.start, 3.0);
    assert_eq!(entries[1].ramp.range.duration, 0.5);

    for entry in entries {
        for secs in [entry.start_secs, entry.ramp.range.start, entry.ramp.range.end()] {
            let ticks = secs * f64::from(PLACEMENT_TIMESCALE);
            assert!((ticks - ticks.round()).abs() < 1e-9, "{secs} is off the 1/60 s grid");
        }
    }
}

#[test]
fn layout_curve_reaches_every_ramp() {
    let opts = ComposeOpts {
        layout: TransitionLayout {
            curve: RampCurve::EaseIn,
            ..TransitionLayout::default()
        },
        ..ComposeOpts::default()
    };
    let comp = compose(&five_clips(), &opts).unwrap();
    assert!(comp.entries().iter().all(|e| e.ramp.curve == RampCurve::EaseIn));
    assert_eq!(comp.entries()[0].ramp.opacity_at(1.25), 0.9375);
    assert_eq!(comp.entries()[0].ramp.opacity_at(1.0), 1.0);
    assert_eq!(comp.entries()[0].ramp.opacity_at(2.0), 0.0);
}
