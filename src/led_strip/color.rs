//! Four-channel LED color and the integer color math used on the pixel hot paths.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use smart_leds::{RGB8, White};

/// RGBW color with four 8-bit channels, re-expressed from the `smart_leds` crate.
///
/// The white channel lives in the `a` field as [`White`].
pub type Rgbw = smart_leds::RGBW<u8>;

/// All channels off.
pub const BLACK: Rgbw = rgbw(0, 0, 0, 0);

/// Build an [`Rgbw`] from its four channels.
#[must_use]
pub const fn rgbw(r: u8, g: u8, b: u8, w: u8) -> Rgbw {
    Rgbw {
        r,
        g,
        b,
        a: White(w),
    }
}

/// Convert colors to [`Rgbw`] for writing through a segment.
///
/// # Example
///
/// ```rust
/// use matrix_envoy::led_strip::{rgbw, Rgb888, ToRgbw, RGB8};
///
/// assert_eq!(RGB8::new(16, 32, 48).to_rgbw(), rgbw(16, 32, 48, 0));
/// assert_eq!(Rgb888::new(16, 32, 48).to_rgbw(), rgbw(16, 32, 48, 0));
/// ```
pub trait ToRgbw {
    /// Convert this color to [`Rgbw`].
    #[must_use]
    fn to_rgbw(self) -> Rgbw;
}

impl ToRgbw for Rgbw {
    #[inline(always)]
    fn to_rgbw(self) -> Rgbw {
        self
    }
}

impl ToRgbw for RGB8 {
    #[inline(always)]
    fn to_rgbw(self) -> Rgbw {
        rgbw(self.r, self.g, self.b, 0)
    }
}

impl ToRgbw for Rgb888 {
    #[inline(always)]
    fn to_rgbw(self) -> Rgbw {
        rgbw(self.r(), self.g(), self.b(), 0)
    }
}

/// Convert colors to [`Rgb888`] for embedded-graphics rendering. The white channel is dropped.
pub trait ToRgb888 {
    /// Convert this color to [`Rgb888`].
    #[must_use]
    fn to_rgb888(self) -> Rgb888;
}

impl ToRgb888 for Rgbw {
    #[inline(always)]
    fn to_rgb888(self) -> Rgb888 {
        Rgb888::new(self.r, self.g, self.b)
    }
}

impl ToRgb888 for Rgb888 {
    #[inline(always)]
    fn to_rgb888(self) -> Rgb888 {
        self
    }
}

const fn scale_channel(value: u8, scale: u8) -> u8 {
    // (value * scale) / 255, never rounded up
    ((value as u16 * scale as u16) / 255) as u8
}

/// Scale every channel by `brightness / 255`.
///
/// `255` leaves the color unchanged and `0` yields [`BLACK`].
#[must_use]
pub const fn scale_brightness(color: Rgbw, brightness: u8) -> Rgbw {
    if brightness == u8::MAX {
        return color;
    }
    rgbw(
        scale_channel(color.r, brightness),
        scale_channel(color.g, brightness),
        scale_channel(color.b, brightness),
        scale_channel(color.a.0, brightness),
    )
}

/// Per-channel saturating add.
#[must_use]
pub const fn saturating_add(left: Rgbw, right: Rgbw) -> Rgbw {
    rgbw(
        left.r.saturating_add(right.r),
        left.g.saturating_add(right.g),
        left.b.saturating_add(right.b),
        left.a.0.saturating_add(right.a.0),
    )
}

/// Blend from `from` toward `to` by `amount` out of 255.
///
/// `0` returns `from` exactly and `255` returns `to` exactly.
#[must_use]
pub const fn blend(from: Rgbw, to: Rgbw, amount: u8) -> Rgbw {
    match amount {
        0 => from,
        u8::MAX => to,
        _ => {
            let amount = amount as u32;
            let keep = u8::MAX as u32 - amount;
            rgbw(
                mix_channel(from.r, to.r, keep, amount, 8),
                mix_channel(from.g, to.g, keep, amount, 8),
                mix_channel(from.b, to.b, keep, amount, 8),
                mix_channel(from.a.0, to.a.0, keep, amount, 8),
            )
        }
    }
}

/// Blend from `from` toward `to` by `amount` out of `0xFFFF`.
///
/// `0` returns `from` exactly and `0xFFFF` returns `to` exactly.
#[must_use]
pub const fn blend16(from: Rgbw, to: Rgbw, amount: u16) -> Rgbw {
    match amount {
        0 => from,
        u16::MAX => to,
        _ => {
            let amount = amount as u32;
            let keep = u16::MAX as u32 - amount;
            rgbw(
                mix_channel(from.r, to.r, keep, amount, 16),
                mix_channel(from.g, to.g, keep, amount, 16),
                mix_channel(from.b, to.b, keep, amount, 16),
                mix_channel(from.a.0, to.a.0, keep, amount, 16),
            )
        }
    }
}

const fn mix_channel(from: u8, to: u8, keep: u32, amount: u32, shift: u32) -> u8 {
    ((to as u32 * amount + from as u32 * keep) >> shift) as u8
}
