#![allow(missing_docs)]
//! Host-level tests for transition snapshots and compositing.

use matrix_envoy::Error;
use matrix_envoy::led_strip::{LedStrip, Rgbw, blend16, rgbw};
use matrix_envoy::led2d::{MatrixMap, Panel};
use matrix_envoy::segment::{
    RenderTarget, Segment, SegmentConfig, SnapshotSlot, TRANSITION_COMPLETE, TransitionState,
    TransitionStyle, fairy_dust_threshold,
};

const WIDTH: u16 = 4;
const HEIGHT: u16 = 2;

fn old(x: i32, y: i32) -> Rgbw {
    rgbw((x * 10 + y + 1) as u8, 0, 0, 0)
}

fn new(x: i32, y: i32) -> Rgbw {
    rgbw(0, 0, (x * 10 + y + 1) as u8, 0)
}

fn matrix() -> MatrixMap<8> {
    MatrixMap::build(&[Panel::new(WIDTH, HEIGHT)], None, WIDTH * HEIGHT)
}

fn paint(segment: &mut Segment<8>, led_strip: &mut LedStrip<8>, color: fn(i32, i32) -> Rgbw) {
    for y in 0..i32::from(segment.virtual_height()) {
        for x in 0..i32::from(segment.virtual_width()) {
            segment.set_pixel_color_xy(led_strip, x, y, color(x, y));
        }
    }
}

// Live frame shows `old`; the snapshots hold `old` (outgoing) and `new` (incoming).
fn prepare(
    segment: &mut Segment<8>,
    led_strip: &mut LedStrip<8>,
    style: TransitionStyle,
) {
    paint(segment, led_strip, old);
    segment.start_transition(style);
    segment.capture_live(SnapshotSlot::Outgoing, &*led_strip);
    assert!(segment.begin_capture(SnapshotSlot::Incoming));
    paint(segment, led_strip, new);
    segment.end_capture();
}

fn started(style: TransitionStyle) -> Result<(LedStrip<8>, Segment<8>), Error> {
    let map = matrix();
    let mut segment = Segment::full(&map)?;
    let mut led_strip = LedStrip::new(map);
    prepare(&mut segment, &mut led_strip, style);
    Ok((led_strip, segment))
}

fn rendered_at(style: TransitionStyle, progress: u16) -> Result<(LedStrip<8>, Segment<8>), Error> {
    let (mut led_strip, mut segment) = started(style)?;
    segment.set_progress(progress);
    segment.render_transition(&mut led_strip);
    Ok((led_strip, segment))
}

fn shows(segment: &Segment<8>, led_strip: &LedStrip<8>, color: fn(i32, i32) -> Rgbw) -> bool {
    (0..i32::from(HEIGHT)).all(|y| {
        (0..i32::from(WIDTH)).all(|x| segment.pixel_color_xy(led_strip, x, y) == color(x, y))
    })
}

#[test]
fn capture_leaves_the_live_frame_alone() -> Result<(), Error> {
    let (led_strip, segment) = started(TransitionStyle::Fade)?;
    assert_eq!(segment.transition_state(), TransitionState::Transitioning);
    assert_eq!(segment.progress(), 0);
    assert!(shows(&segment, &led_strip, old));
    Ok(())
}

#[test]
fn render_target_follows_capture() -> Result<(), Error> {
    let map = matrix();
    let mut segment: Segment<8> = Segment::full(&map)?;

    assert_eq!(segment.render_target(), RenderTarget::Live);
    assert!(!segment.begin_capture(SnapshotSlot::Incoming));
    assert_eq!(segment.render_target(), RenderTarget::Live);

    segment.start_transition(TransitionStyle::SwipeUp);
    assert!(segment.begin_capture(SnapshotSlot::Incoming));
    assert_eq!(
        segment.render_target(),
        RenderTarget::Snapshot(SnapshotSlot::Incoming)
    );
    segment.end_capture();
    assert_eq!(segment.render_target(), RenderTarget::Live);
    Ok(())
}

#[test]
fn fade_endpoints_and_midpoint() -> Result<(), Error> {
    let (led_strip, segment) = rendered_at(TransitionStyle::Fade, 0)?;
    assert!(shows(&segment, &led_strip, old));
    assert!(segment.is_transitioning());

    let (led_strip, segment) = rendered_at(TransitionStyle::Fade, 0x8000)?;
    // old red 1 and new blue 1 at (0, 0); old red 31 and new blue 31 at (3, 0).
    assert_eq!(segment.pixel_color_xy(&led_strip, 0, 0), rgbw(0, 0, 0, 0));
    assert_eq!(segment.pixel_color_xy(&led_strip, 3, 0), rgbw(15, 0, 15, 0));

    let (led_strip, segment) = rendered_at(TransitionStyle::Fade, TRANSITION_COMPLETE)?;
    assert!(shows(&segment, &led_strip, new));
    assert_eq!(segment.transition_state(), TransitionState::Idle);
    Ok(())
}

#[test]
fn fade_midpoint_weights_both_frames() -> Result<(), Error> {
    let map = matrix();
    let mut segment: Segment<8> = Segment::full(&map)?;
    let mut led_strip = LedStrip::new(map);

    segment.fill(&mut led_strip, rgbw(200, 0, 0, 0));
    segment.start_transition(TransitionStyle::Fade);
    segment.capture_live(SnapshotSlot::Outgoing, &led_strip);
    segment.begin_capture(SnapshotSlot::Incoming);
    segment.fill(&mut led_strip, rgbw(0, 0, 200, 0));
    segment.end_capture();

    segment.set_progress(0x8000);
    segment.render_transition(&mut led_strip);
    assert_eq!(led_strip.frame()[0], rgbw(99, 0, 100, 0));
    Ok(())
}

#[test]
fn push_right_slides_both_frames() -> Result<(), Error> {
    let (led_strip, segment) = rendered_at(TransitionStyle::PushRight, 0)?;
    assert!(shows(&segment, &led_strip, old));

    let (led_strip, segment) = rendered_at(TransitionStyle::PushRight, 0x8000)?;
    for y in 0..i32::from(HEIGHT) {
        for x in 0..i32::from(WIDTH) {
            let expected = if x >= 2 { old(x - 2, y) } else { new(x + 2, y) };
            assert_eq!(
                segment.pixel_color_xy(&led_strip, x, y),
                expected,
                "({x}, {y})"
            );
        }
    }

    let (led_strip, segment) = rendered_at(TransitionStyle::PushRight, TRANSITION_COMPLETE)?;
    assert!(shows(&segment, &led_strip, new));
    Ok(())
}

#[test]
fn push_left_and_down_start_unshifted() -> Result<(), Error> {
    for style in [
        TransitionStyle::PushLeft,
        TransitionStyle::PushDown,
        TransitionStyle::PushUp,
    ] {
        let (led_strip, segment) = rendered_at(style, 0)?;
        assert!(shows(&segment, &led_strip, old), "{style:?}");

        let (led_strip, segment) = rendered_at(style, TRANSITION_COMPLETE)?;
        assert!(shows(&segment, &led_strip, new), "{style:?}");
    }
    Ok(())
}

#[test]
fn swipe_right_moves_an_edge() -> Result<(), Error> {
    let (led_strip, segment) = rendered_at(TransitionStyle::SwipeRight, 0x8000)?;
    for y in 0..i32::from(HEIGHT) {
        for x in 0..3 {
            assert_eq!(segment.pixel_color_xy(&led_strip, x, y), new(x, y));
        }
        assert_eq!(segment.pixel_color_xy(&led_strip, 3, y), old(3, y));
    }
    Ok(())
}

#[test]
fn every_style_starts_old_and_ends_new() -> Result<(), Error> {
    for id in 0..12_u8 {
        let style = TransitionStyle::try_from(id).map_err(|_| Error::FormatError)?;

        let (led_strip, segment) = rendered_at(style, 0)?;
        assert!(shows(&segment, &led_strip, old), "{style:?} at start");

        let (led_strip, segment) = rendered_at(style, TRANSITION_COMPLETE)?;
        assert!(shows(&segment, &led_strip, new), "{style:?} at end");
        assert!(!segment.is_transitioning());
    }
    Ok(())
}

// Expected color at `(x, y)` of a `width`×`height` segment, computed straight
// from the compositing rules. Cell `i` of either buffer holds `color(i % w, i / w)`.
fn composited(
    style: TransitionStyle,
    progress: u16,
    (width, height): (u32, u32),
    (x, y): (u32, u32),
) -> Rgbw {
    const FULL: u32 = 0xFFFF;
    let cell = |color: fn(i32, i32) -> Rgbw, index: u32| {
        color((index % width) as i32, (index / width) as i32)
    };
    let progress = u32::from(progress);
    let split = |amount: u32, extent: u32| amount * extent / FULL;
    let from_edge = |x: u32| {
        let half = width / 2;
        let edge = if x < half { x } else { width - x };
        if half == 0 {
            0
        } else {
            (edge * FULL / half).min(FULL)
        }
    };

    let pos = match style {
        TransitionStyle::Fade => {
            let index = y * width + x;
            return blend16(cell(new, index), cell(old, index), (FULL - progress) as u16);
        }
        TransitionStyle::PushRight => {
            let pos = split(progress, width);
            return if x >= pos {
                cell(old, y * width + x - pos)
            } else {
                cell(new, y * width + x + width - pos)
            };
        }
        TransitionStyle::PushLeft => {
            let pos = split(FULL - progress, width);
            return if x < pos {
                cell(old, y * width + x + width - pos)
            } else {
                cell(new, y * width + x - pos)
            };
        }
        TransitionStyle::PushUp => {
            let pos = split(FULL - progress, height);
            return if y < pos {
                cell(old, (y + height - pos) * width + x)
            } else {
                cell(new, (y - pos) * width + x)
            };
        }
        TransitionStyle::PushDown => {
            let pos = split(progress, height);
            return if y >= pos {
                cell(old, (y - pos) * width + x)
            } else {
                cell(new, (y + height - pos) * width + x)
            };
        }
        TransitionStyle::SwipeRight => x * FULL / width,
        TransitionStyle::SwipeLeft => FULL - x * FULL / width,
        TransitionStyle::SwipeUp => FULL - y * FULL / height,
        TransitionStyle::SwipeDown => y * FULL / height,
        TransitionStyle::OutsideIn => from_edge(x),
        TransitionStyle::InsideOut => FULL - from_edge(x),
        TransitionStyle::FairyDust => {
            u32::from(fairy_dust_threshold(y * width + x, width * height))
        }
    };
    let color = if progress <= pos { old } else { new };
    cell(color, y * width + x)
}

#[test]
fn every_style_matches_its_formula_mid_transition() -> Result<(), Error> {
    const W: u16 = 5;
    const H: u16 = 3;
    let map: MatrixMap<15> = MatrixMap::build(&[Panel::new(W, H)], None, W * H);

    for id in 0..12_u8 {
        let style = TransitionStyle::try_from(id).map_err(|_| Error::FormatError)?;
        for progress in [1_u16, 0x3000, 0x5555, 0x8000, 0xAAAA, 0xFFFE] {
            let mut segment: Segment<15> = Segment::full(&map)?;
            let mut led_strip = LedStrip::new(map.clone());
            for y in 0..i32::from(H) {
                for x in 0..i32::from(W) {
                    segment.set_pixel_color_xy(&mut led_strip, x, y, old(x, y));
                }
            }
            segment.start_transition(style);
            segment.capture_live(SnapshotSlot::Outgoing, &led_strip);
            assert!(segment.begin_capture(SnapshotSlot::Incoming));
            for y in 0..i32::from(H) {
                for x in 0..i32::from(W) {
                    segment.set_pixel_color_xy(&mut led_strip, x, y, new(x, y));
                }
            }
            segment.end_capture();

            segment.set_progress(progress);
            segment.render_transition(&mut led_strip);
            assert!(segment.is_transitioning());
            for y in 0..u32::from(H) {
                for x in 0..u32::from(W) {
                    let expected = composited(style, progress, (W.into(), H.into()), (x, y));
                    assert_eq!(
                        segment.pixel_color_xy(&led_strip, x as i32, y as i32),
                        expected,
                        "{style:?} at {progress:#06x}, ({x}, {y})"
                    );
                }
            }
        }
    }
    Ok(())
}

#[test]
fn fairy_dust_thresholds_are_a_permutation() {
    for len in [1_u32, 2, 3, 7, 8, 64, 100, 257] {
        let mut thresholds: Vec<u16> = (0..len).map(|i| fairy_dust_threshold(i, len)).collect();
        thresholds.sort_unstable();
        let expected: Vec<u16> = (0..len)
            .map(|i| (u64::from(i) * 0xFFFF / u64::from(len)) as u16)
            .collect();
        assert_eq!(thresholds, expected, "len {len}");
    }
}

#[test]
fn progress_never_moves_backwards() -> Result<(), Error> {
    let (_, mut segment) = started(TransitionStyle::Fade)?;

    segment.set_progress(0x4000);
    segment.set_progress(0x2000);
    assert_eq!(segment.progress(), 0x4000);

    segment.start_transition(TransitionStyle::SwipeLeft);
    assert_eq!(segment.progress(), 0);
    assert_eq!(segment.transition_style(), Some(TransitionStyle::SwipeLeft));
    Ok(())
}

#[test]
fn cancel_returns_to_idle() -> Result<(), Error> {
    let (mut led_strip, mut segment) = started(TransitionStyle::Fade)?;

    segment.cancel_transition();
    assert_eq!(segment.transition_state(), TransitionState::Idle);
    assert_eq!(segment.progress(), TRANSITION_COMPLETE);
    assert_eq!(segment.transition_style(), None);

    // Writes go live again.
    segment.set_pixel_color_xy(&mut led_strip, 0, 0, rgbw(9, 9, 9, 9));
    assert_eq!(led_strip.frame()[0], rgbw(9, 9, 9, 9));
    Ok(())
}

#[test]
fn geometry_change_cancels_but_brightness_does_not() -> Result<(), Error> {
    let map = matrix();
    let (_, mut segment) = started(TransitionStyle::Fade)?;

    let dimmer = segment.config().with_brightness(100).with_reverse(true);
    segment.set_config(dimmer, &map)?;
    assert!(segment.is_transitioning());

    let mirrored = segment.config().with_mirror(true);
    segment.set_config(mirrored, &map)?;
    assert!(!segment.is_transitioning());
    Ok(())
}

#[test]
fn restart_after_geometry_change_fades_from_what_is_shown() -> Result<(), Error> {
    let map = matrix();
    let (mut led_strip, mut segment) = started(TransitionStyle::Fade)?;

    let narrower = SegmentConfig::new(2, HEIGHT);
    segment.set_config(narrower, &map)?;
    assert!(!segment.is_transitioning());

    segment.start_transition(TransitionStyle::SwipeRight);
    segment.capture_live(SnapshotSlot::Outgoing, &led_strip);
    assert!(segment.begin_capture(SnapshotSlot::Incoming));
    segment.fill(&mut led_strip, rgbw(0, 9, 0, 0));
    segment.end_capture();

    segment.render_transition(&mut led_strip);
    assert_eq!(segment.pixel_color_xy(&led_strip, 1, 1), old(1, 1));
    segment.set_progress(TRANSITION_COMPLETE);
    segment.render_transition(&mut led_strip);
    assert_eq!(segment.pixel_color_xy(&led_strip, 1, 1), rgbw(0, 9, 0, 0));
    // Cells outside the narrower segment keep the old frame.
    assert_eq!(led_strip.frame()[3], old(3, 0));
    Ok(())
}

#[test]
fn rendering_applies_the_current_brightness() -> Result<(), Error> {
    let (mut led_strip, mut segment) = started(TransitionStyle::Fade)?;
    segment.set_brightness(128);

    segment.render_transition(&mut led_strip);
    // old(3, 1) is red 32.
    assert_eq!(segment.pixel_color_xy(&led_strip, 3, 1), rgbw(16, 0, 0, 0));
    Ok(())
}

#[test]
fn reversed_segment_renders_back_in_place() -> Result<(), Error> {
    let map = matrix();
    let config = SegmentConfig::new(WIDTH, HEIGHT)
        .with_reverse(true)
        .with_reverse_y(true);
    let mut segment: Segment<8> = Segment::try_new(config, &map)?;
    let mut led_strip = LedStrip::new(map);

    prepare(&mut segment, &mut led_strip, TransitionStyle::Fade);
    let before = *led_strip.frame();

    segment.render_transition(&mut led_strip);
    assert_eq!(led_strip.frame(), &before);
    Ok(())
}

#[test]
fn single_pixel_segment_survives_split_styles() -> Result<(), Error> {
    let map: MatrixMap<8> = MatrixMap::strip(4);
    let config = SegmentConfig::new(1, 1).at(2, 0);
    let mut segment: Segment<8> = Segment::try_new(config, &map)?;
    let mut led_strip = LedStrip::new(map);

    for style in [TransitionStyle::OutsideIn, TransitionStyle::InsideOut] {
        segment.fill(&mut led_strip, rgbw(1, 0, 0, 0));
        segment.start_transition(style);
        segment.capture_live(SnapshotSlot::Outgoing, &led_strip);
        segment.begin_capture(SnapshotSlot::Incoming);
        segment.fill(&mut led_strip, rgbw(0, 0, 1, 0));
        segment.end_capture();
        segment.set_progress(0x8000);
        segment.render_transition(&mut led_strip);
    }
    // Inside-out holds the outgoing frame until the very end.
    assert_eq!(led_strip.frame()[2], rgbw(1, 0, 0, 0));
    Ok(())
}

#[test]
fn style_ids_round_trip() {
    for id in 0..12_u8 {
        assert_eq!(TransitionStyle::try_from(id).map(u8::from), Ok(id));
    }
    assert_eq!(TransitionStyle::try_from(12), Err(12));
    assert_eq!(TransitionStyle::default(), TransitionStyle::Fade);
}
