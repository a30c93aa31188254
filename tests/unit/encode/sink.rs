use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 1,
        fps: Fps::whole(30),
        pixel_format: SinkPixelFormat::Bgra8,
    }
}

#[test]
fn in_memory_sink_records_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &[0; 8]).unwrap();
    sink.push_frame(FrameIndex(1), &[1; 8]).unwrap();
    sink.end().unwrap();

    assert!(sink.is_finished());
    assert_eq!(sink.frames().len(), 2);
    assert_eq!(sink.frames()[1].1, vec![1; 8]);
}

#[test]
fn in_memory_sink_rejects_out_of_order_and_bad_length() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(3), &[0; 8]).unwrap();
    assert!(sink.push_frame(FrameIndex(3), &[0; 8]).is_err());
    assert!(sink.push_frame(FrameIndex(4), &[0; 7]).is_err());
}

#[test]
fn pts_follows_frame_rate() {
    let c = cfg();
    assert_eq!(c.pts_secs(FrameIndex(0)), 0.0);
    assert_eq!(c.pts_secs(FrameIndex(15)), 0.5);
    assert_eq!(c.frame_len(), 8);
}
