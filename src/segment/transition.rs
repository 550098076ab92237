//! Cross-fade a segment from an outgoing to an incoming frame.
//!
//! A transition owns two snapshot buffers of the segment's virtual pixels. The
//! caller fills them, either by copying what is currently shown
//! ([`Segment::capture_live`]) or by redirecting an effect's writes into a
//! buffer ([`Segment::begin_capture`] / [`Segment::end_capture`]). Each frame it
//! advances [`progress`](Segment::set_progress) and calls
//! [`Segment::render_transition`], which composites both buffers into the live
//! frame. Rendering at [`TRANSITION_COMPLETE`] releases the buffers.
//!
//! ```text
//! Idle ──start_transition──▶ Transitioning ──render at 0xFFFF──▶ Idle
//!                                  │
//!                                  └──cancel / geometry change──▶ Idle
//! ```
//!
//! # Example
//!
//! ```rust
//! use matrix_envoy::led2d::{MatrixMap, Panel};
//! use matrix_envoy::led_strip::{LedStrip, rgbw};
//! use matrix_envoy::segment::{Segment, SnapshotSlot, TransitionStyle};
//!
//! let map: MatrixMap<4> = MatrixMap::build(&[Panel::new(2, 2)], None, 4);
//! let mut led_strip = LedStrip::new(map.clone());
//! let mut segment: Segment<4> = Segment::full(&map)?;
//! let (old, new) = (rgbw(200, 0, 0, 0), rgbw(0, 0, 200, 0));
//!
//! segment.fill(&mut led_strip, old);
//! segment.start_transition(TransitionStyle::Fade);
//! segment.capture_live(SnapshotSlot::Outgoing, &led_strip);
//! segment.begin_capture(SnapshotSlot::Incoming);
//! segment.fill(&mut led_strip, new);
//! segment.end_capture();
//!
//! segment.render_transition(&mut led_strip);
//! assert_eq!(led_strip.frame()[0], old);
//!
//! segment.set_progress(0xFFFF);
//! segment.render_transition(&mut led_strip);
//! assert_eq!(led_strip.frame()[0], new);
//! assert!(!segment.is_transitioning());
//! # Ok::<(), matrix_envoy::Error>(())
//! ```

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use super::{RenderTarget, Segment};
use crate::led_strip::{BLACK, PixelStrip, Rgbw, blend16};

/// Progress value at which a transition is done.
pub const TRANSITION_COMPLETE: u16 = 0xFFFF;

/// How the incoming frame replaces the outgoing one.
///
/// The numeric ids (see [`TryFrom<u8>`](#impl-TryFrom%3Cu8%3E-for-TransitionStyle))
/// are the ones configuration surfaces store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransitionStyle {
    /// Blend every pixel linearly.
    #[default]
    Fade,
    /// Pixels switch over one by one in a fixed shuffled order.
    FairyDust,
    /// A vertical edge moves left to right.
    SwipeRight,
    /// A vertical edge moves right to left.
    SwipeLeft,
    /// The incoming frame slides in from the left, pushing the outgoing one right.
    PushRight,
    /// The incoming frame slides in from the right, pushing the outgoing one left.
    PushLeft,
    /// A horizontal edge moves bottom to top.
    SwipeUp,
    /// A horizontal edge moves top to bottom.
    SwipeDown,
    /// The incoming frame slides in from the bottom.
    PushUp,
    /// The incoming frame slides in from the top.
    PushDown,
    /// Both side edges move toward the middle.
    OutsideIn,
    /// Edges move from the middle toward both sides.
    InsideOut,
}

impl TryFrom<u8> for TransitionStyle {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Ok(match id {
            0 => Self::Fade,
            1 => Self::FairyDust,
            2 => Self::SwipeRight,
            3 => Self::SwipeLeft,
            4 => Self::PushRight,
            5 => Self::PushLeft,
            6 => Self::SwipeUp,
            7 => Self::SwipeDown,
            8 => Self::PushUp,
            9 => Self::PushDown,
            10 => Self::OutsideIn,
            11 => Self::InsideOut,
            _ => return Err(id),
        })
    }
}

impl From<TransitionStyle> for u8 {
    fn from(style: TransitionStyle) -> Self {
        style as u8
    }
}

/// One of the two snapshot buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SnapshotSlot {
    /// What was shown before the change.
    Outgoing,
    /// What the new effect renders.
    Incoming,
}

/// Whether a segment is mid-transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransitionState {
    /// No transition; writes go live.
    Idle,
    /// Snapshot buffers are held and [`Segment::render_transition`] composites them.
    Transitioning,
}

#[derive(Clone, Debug)]
pub(crate) struct Transition<const N: usize> {
    style: TransitionStyle,
    progress: u16,
    capture: Option<SnapshotSlot>,
    outgoing: [Rgbw; N],
    incoming: [Rgbw; N],
}

impl<const N: usize> Transition<N> {
    const fn new(style: TransitionStyle) -> Self {
        Self {
            style,
            progress: 0,
            capture: None,
            outgoing: [BLACK; N],
            incoming: [BLACK; N],
        }
    }

    fn buffer_mut(&mut self, slot: SnapshotSlot) -> &mut [Rgbw; N] {
        match slot {
            SnapshotSlot::Outgoing => &mut self.outgoing,
            SnapshotSlot::Incoming => &mut self.incoming,
        }
    }

    pub(crate) fn capture_buffer(&self) -> Option<&[Rgbw; N]> {
        self.capture.map(|slot| match slot {
            SnapshotSlot::Outgoing => &self.outgoing,
            SnapshotSlot::Incoming => &self.incoming,
        })
    }

    pub(crate) fn capture_buffer_mut(&mut self) -> Option<&mut [Rgbw; N]> {
        let slot = self.capture?;
        Some(self.buffer_mut(slot))
    }
}

impl<const N: usize> Segment<N> {
    /// Start a transition with blank snapshot buffers and progress `0`.
    ///
    /// A transition already running is dropped and replaced.
    pub fn start_transition(&mut self, style: TransitionStyle) {
        if let Some(previous) = &self.transition {
            debug!(
                "Segment: restarting transition at progress {}",
                previous.progress
            );
        }
        info!("Segment: starting {} transition", u8::from(style));
        self.transition = Some(Transition::new(style));
    }

    /// Drop a running transition and its buffers. Writes go live again.
    pub fn cancel_transition(&mut self) {
        if self.transition.take().is_some() {
            info!("Segment: transition cancelled");
        }
    }

    /// [`TransitionState::Transitioning`] while snapshot buffers are held.
    #[must_use]
    pub const fn transition_state(&self) -> TransitionState {
        if self.transition.is_some() {
            TransitionState::Transitioning
        } else {
            TransitionState::Idle
        }
    }

    /// True while a transition is running.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Style of the running transition.
    #[must_use]
    pub fn transition_style(&self) -> Option<TransitionStyle> {
        self.transition.as_ref().map(|transition| transition.style)
    }

    /// Progress of the running transition; [`TRANSITION_COMPLETE`] when idle.
    #[must_use]
    pub fn progress(&self) -> u16 {
        self.transition
            .as_ref()
            .map_or(TRANSITION_COMPLETE, |transition| transition.progress)
    }

    /// Advance progress. Values below the current progress are ignored.
    pub fn set_progress(&mut self, progress: u16) {
        if let Some(transition) = self.transition.as_mut() {
            transition.progress = transition.progress.max(progress);
        }
    }

    /// Where writes currently land.
    #[must_use]
    pub fn render_target(&self) -> RenderTarget {
        self.transition
            .as_ref()
            .and_then(|transition| transition.capture)
            .map_or(RenderTarget::Live, RenderTarget::Snapshot)
    }

    /// Copy what the segment currently shows into `slot`.
    ///
    /// Does nothing when idle.
    pub fn capture_live<S: PixelStrip + ?Sized>(&mut self, slot: SnapshotSlot, strip: &S) {
        let Some(mut transition) = self.transition.take() else {
            return;
        };
        let buffer = transition.buffer_mut(slot);
        for (y, x) in iproduct!(0..self.virtual_height(), 0..self.virtual_width()) {
            let index = self.linear_index(x, y);
            if let Some(pixel) = buffer.get_mut(index) {
                *pixel = self.pixel_color_xy(strip, i32::from(x), i32::from(y));
            }
        }
        self.transition = Some(transition);
    }

    /// Redirect writes into `slot`, untransformed, until [`Self::end_capture`].
    ///
    /// Returns `false` (and changes nothing) when idle.
    pub fn begin_capture(&mut self, slot: SnapshotSlot) -> bool {
        match self.transition.as_mut() {
            Some(transition) => {
                transition.capture = Some(slot);
                true
            }
            None => false,
        }
    }

    /// Send writes back to the strip.
    pub fn end_capture(&mut self) {
        if let Some(transition) = self.transition.as_mut() {
            transition.capture = None;
        }
    }

    /// Composite the snapshot buffers into the live frame at the current
    /// progress.
    ///
    /// The segment is cleared to black first. Every composited pixel goes
    /// through [`Self::set_pixel_color_xy`], so brightness and transforms
    /// apply. Rendering at [`TRANSITION_COMPLETE`] shows the incoming frame
    /// as is and ends the transition.
    pub fn render_transition<S: PixelStrip + ?Sized>(&mut self, strip: &mut S) {
        // Taken out so the writes below go live.
        let Some(mut transition) = self.transition.take() else {
            return;
        };
        transition.capture = None;

        self.fill(strip, BLACK);
        self.composite(strip, &transition);

        if transition.progress == TRANSITION_COMPLETE {
            info!("Segment: transition finished");
        } else {
            self.transition = Some(transition);
        }
    }

    fn composite<S: PixelStrip + ?Sized>(&mut self, strip: &mut S, transition: &Transition<N>) {
        let width = u32::from(self.virtual_width());
        let height = u32::from(self.virtual_height());
        let progress = u32::from(transition.progress);
        let complement = u32::from(TRANSITION_COMPLETE) - progress;
        let old = &transition.outgoing;
        let new = &transition.incoming;

        // Edge cells of some styles still sit on the outgoing side at full progress.
        if transition.progress == TRANSITION_COMPLETE {
            self.aligned(strip, width, height, |index, _, _| {
                new.get(index).copied().unwrap_or(BLACK)
            });
            return;
        }

        match transition.style {
            TransitionStyle::PushRight => {
                let pos = split(progress, width);
                self.push(strip, width, height, |x, y| {
                    if x >= pos {
                        old.get(sample(y * width + x, pos))
                    } else {
                        new.get(sample(y * width + x + width, pos))
                    }
                });
            }
            TransitionStyle::PushLeft => {
                let pos = split(complement, width);
                self.push(strip, width, height, |x, y| {
                    if x < pos {
                        old.get(sample(y * width + x + width, pos))
                    } else {
                        new.get(sample(y * width + x, pos))
                    }
                });
            }
            TransitionStyle::PushUp => {
                let pos = split(complement, height);
                self.push(strip, width, height, |x, y| {
                    if y < pos {
                        old.get(sample((y + height) * width + x, pos * width))
                    } else {
                        new.get(sample(y * width + x, pos * width))
                    }
                });
            }
            TransitionStyle::PushDown => {
                let pos = split(progress, height);
                self.push(strip, width, height, |x, y| {
                    if y >= pos {
                        old.get(sample(y * width + x, pos * width))
                    } else {
                        new.get(sample((y + height) * width + x, pos * width))
                    }
                });
            }
            TransitionStyle::Fade => {
                self.aligned(strip, width, height, |index, _, _| {
                    let outgoing = old.get(index).copied().unwrap_or(BLACK);
                    let incoming = new.get(index).copied().unwrap_or(BLACK);
                    // The weight is on the outgoing frame.
                    blend16(incoming, outgoing, complement as u16)
                });
            }
            style => {
                let len = width * height;
                self.aligned(strip, width, height, |index, x, y| {
                    let pos = threshold(style, x, y, width, height, index as u32, len);
                    let buffer = if progress <= pos { old } else { new };
                    buffer.get(index).copied().unwrap_or(BLACK)
                });
            }
        }
    }

    // Write every pixel from `pick(x, y)`; `None` leaves it black.
    fn push<'a, S, F>(&mut self, strip: &mut S, width: u32, height: u32, pick: F)
    where
        S: PixelStrip + ?Sized,
        F: Fn(u32, u32) -> Option<&'a Rgbw>,
    {
        for (x, y) in iproduct!(0..width, 0..height) {
            if let Some(&color) = pick(x, y) {
                self.set_pixel_color_xy(strip, x as i32, y as i32, color);
            }
        }
    }

    // Write every pixel from `pick(index, x, y)`, buffers aligned.
    fn aligned<S, F>(&mut self, strip: &mut S, width: u32, height: u32, pick: F)
    where
        S: PixelStrip + ?Sized,
        F: Fn(usize, u32, u32) -> Rgbw,
    {
        for (x, y) in iproduct!(0..width, 0..height) {
            let index = (y * width + x) as usize;
            self.set_pixel_color_xy(strip, x as i32, y as i32, pick(index, x, y));
        }
    }
}

const fn split(amount: u32, extent: u32) -> u32 {
    amount * extent / TRANSITION_COMPLETE as u32
}

// Buffer index `position - shift`; callers keep `position >= shift`.
const fn sample(position: u32, shift: u32) -> usize {
    position.saturating_sub(shift) as usize
}

// Progress at or below which the cell still shows the outgoing frame.
fn threshold(
    style: TransitionStyle,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    index: u32,
    len: u32,
) -> u32 {
    let full = u32::from(TRANSITION_COMPLETE);
    match style {
        TransitionStyle::SwipeRight => x * full / width,
        TransitionStyle::SwipeLeft => full - x * full / width,
        TransitionStyle::SwipeUp => full - y * full / height,
        TransitionStyle::SwipeDown => y * full / height,
        TransitionStyle::OutsideIn => outside_in(x, width),
        TransitionStyle::InsideOut => full - outside_in(x, width),
        TransitionStyle::FairyDust => u32::from(fairy_dust_threshold(index, len)),
        // Push styles and fade never reach here.
        _ => full,
    }
}

// Distance from the nearer side edge, scaled so the middle is 0xFFFF.
fn outside_in(x: u32, width: u32) -> u32 {
    let full = u32::from(TRANSITION_COMPLETE);
    let half = width >> 1;
    if half == 0 {
        return 0;
    }
    let from_edge = if x < half { x } else { width - x };
    (from_edge * full / half).min(full)
}

/// Fairy-dust reveal threshold of pixel `index` in a segment of `len` pixels.
///
/// Pixel indices are shuffled by a fixed bijection of `0..len`, so across all
/// pixels the thresholds are `len` distinct, evenly spaced values in
/// `0..0xFFFF`.
///
/// ```rust
/// use matrix_envoy::segment::fairy_dust_threshold;
///
/// let mut thresholds: Vec<u16> = (0..10).map(|i| fairy_dust_threshold(i, 10)).collect();
/// thresholds.sort_unstable();
/// let expected: Vec<u16> = (0..10).map(|i| (i * 0xFFFF / 10) as u16).collect();
/// assert_eq!(thresholds, expected);
/// ```
#[must_use]
pub fn fairy_dust_threshold(index: u32, len: u32) -> u16 {
    if len <= 1 {
        return 0;
    }
    let shuffled = shuffle(index % len, len);
    (u64::from(shuffled) * u64::from(TRANSITION_COMPLETE) / u64::from(len)) as u16
}

// Cycle-walk a bijection on the smallest power of two covering `len`.
fn shuffle(index: u32, len: u32) -> u32 {
    let bits = u32::BITS - (len - 1).leading_zeros();
    let mask = if bits >= u32::BITS {
        u32::MAX
    } else {
        (1 << bits) - 1
    };
    let half = (bits / 2).max(1);

    let mut value = index;
    loop {
        for _ in 0..3 {
            value ^= value >> half;
            value = value.wrapping_mul(0x045D_9F3B) & mask;
        }
        if value < len {
            return value;
        }
    }
}
