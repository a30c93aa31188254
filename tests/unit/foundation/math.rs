use super::*;

#[test]
fn mul_div255_endpoints() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u8(200, 128), 100);
}

#[test]
fn opacity_is_clamped() {
    assert_eq!(opacity_to_u16(-1.0), 0);
    assert_eq!(opacity_to_u16(0.5), 128);
    assert_eq!(opacity_to_u16(2.0), 255);
}
