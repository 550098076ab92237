#![allow(missing_docs)]
use matrix_envoy::led_strip::{
    BLACK, LedStrip, RGB8, Rgb888, ToRgb888, ToRgbw, blend, blend16, rgbw, saturating_add,
    scale_brightness,
};
use matrix_envoy::led2d::MatrixMap;

#[test]
fn rgb8_and_rgb888_convert_with_white_off() {
    let rgb8_color = RGB8::new(16, 32, 48);
    let rgb888_color = Rgb888::new(16, 32, 48);

    assert_eq!(rgb8_color.to_rgbw(), rgbw(16, 32, 48, 0));
    assert_eq!(rgb888_color.to_rgbw(), rgbw(16, 32, 48, 0));
}

#[test]
fn rgbw_to_rgb888_drops_white() {
    let color = rgbw(16, 32, 48, 200);

    let converted = color.to_rgb888();

    assert_eq!(converted, Rgb888::new(16, 32, 48));
}

#[test]
fn scale_brightness_rounds_down() {
    let color = rgbw(255, 128, 1, 254);

    assert_eq!(scale_brightness(color, 255), color);
    assert_eq!(scale_brightness(color, 0), BLACK);
    assert_eq!(scale_brightness(color, 128), rgbw(128, 64, 0, 127));
}

#[test]
fn blend_endpoints_are_exact() {
    let from = rgbw(10, 20, 30, 40);
    let to = rgbw(250, 0, 100, 7);

    assert_eq!(blend(from, to, 0), from);
    assert_eq!(blend(from, to, 255), to);
    assert_eq!(blend16(from, to, 0), from);
    assert_eq!(blend16(from, to, 0xFFFF), to);
}

#[test]
fn blend_midpoint_mixes_channels() {
    let from = rgbw(0, 200, 0, 0);
    let to = rgbw(200, 0, 0, 0);

    assert_eq!(blend(from, to, 128), rgbw(100, 99, 0, 0));
    assert_eq!(blend16(from, to, 0x8000), rgbw(100, 99, 0, 0));
}

#[test]
fn saturating_add_clamps_each_channel() {
    assert_eq!(
        saturating_add(rgbw(200, 10, 0, 255), rgbw(100, 10, 0, 1)),
        rgbw(255, 20, 0, 255)
    );
}

#[test]
fn led_strip_fill_stops_at_total_len() {
    let mut led_strip = LedStrip::<6>::new(MatrixMap::strip(4));
    let color = rgbw(1, 2, 3, 4);

    led_strip.fill(color);

    assert_eq!(&led_strip.frame()[..4], &[color; 4]);
    assert_eq!(&led_strip.frame()[4..], &[BLACK; 2]);
}
