use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ReelError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        ReelError::invalid_image("1", "bad magic")
            .to_string()
            .contains("invalid image '1'")
    );
    assert!(
        ReelError::invalid_url("", "empty name")
            .to_string()
            .contains("invalid output location")
    );
    assert!(
        ReelError::invalid_video_track(3, "track cap reached")
            .to_string()
            .contains("clip 3")
    );
}

#[test]
fn encoder_init_mentions_path() {
    let err = ReelError::encoder_init("/tmp/reel/1.mov", "ffmpeg missing");
    let msg = err.to_string();
    assert!(msg.contains("/tmp/reel/1.mov"));
    assert!(msg.contains("ffmpeg missing"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
