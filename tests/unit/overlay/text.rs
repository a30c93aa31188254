use super::*;

#[test]
fn builder_defaults_match_demo_layer() {
    let layer = OverlayLayer::builder().build().unwrap();
    assert_eq!(layer.text, "My text");
    assert_eq!(layer.frame, Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(layer.style.font_family, "Chalkduster");
    assert_eq!(layer.style.font_size, 30.0);
    assert_eq!(layer.style.color, Rgba8::CYAN);
    assert_eq!(layer.style.background, Rgba8::BROWN);
    assert_eq!(layer.style.align, TextAlign::Center);
    assert_eq!(layer.begin_time, 0.0);
    assert!(layer.is_visible_at(0.0));
}

#[test]
fn builder_rejects_bad_geometry_and_style() {
    assert!(
        OverlayLayer::builder()
            .frame(Rect::new(0.0, 0.0, 0.0, 10.0))
            .build()
            .is_err()
    );
    assert!(OverlayLayer::builder().font_size(0.0).build().is_err());
    assert!(OverlayLayer::builder().begin_time(-1.0).build().is_err());
    assert!(OverlayLayer::builder().opacity(1.5).build().is_err());
}

#[test]
fn layer_hidden_before_begin_time() {
    let layer = OverlayLayer::builder().begin_time(2.0).build().unwrap();
    assert!(!layer.is_visible_at(1.99));
    assert!(layer.is_visible_at(2.0));
}

#[test]
fn long_text_wraps_then_truncates_with_ellipsis() {
    let layer = OverlayLayer::builder()
        .text("hello world foo")
        .build()
        .unwrap();
    assert_eq!(layer.layout_lines(), vec!["hello", "world\u{2026}"]);
}

#[test]
fn unwrapped_text_stays_on_one_line() {
    let style = TextStyle {
        wrapped: false,
        ..TextStyle::default()
    };
    let layer = OverlayLayer::builder()
        .text("hello world foo")
        .style(style)
        .build()
        .unwrap();
    assert_eq!(layer.layout_lines(), vec!["hello world foo"]);
}

#[test]
fn svg_escapes_markup_and_carries_style() {
    let layer = OverlayLayer::builder().text("a<b&c").build().unwrap();
    let svg = layer.to_svg();
    assert!(svg.contains("a&lt;b&amp;c"));
    assert!(svg.contains(r##"fill="#996633""##));
    assert!(svg.contains(r##"fill="#00ffff""##));
    assert!(svg.contains("Chalkduster, sans-serif"));
    assert!(svg.contains(r#"text-anchor="middle""#));
}

#[test]
fn rasterized_tile_has_background_in_corners() {
    let layer = OverlayLayer::builder().build().unwrap();
    let tile = layer.rasterize().unwrap();
    assert_eq!(tile.len(), 100 * 100 * 4);
    assert_eq!(&tile[..4], &[153, 102, 51, 255]);
    let last = tile.len() - 4;
    assert_eq!(&tile[last..], &[153, 102, 51, 255]);
}
