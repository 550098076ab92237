//! The physical pixel buffer of an LED strip and the `(x, y)` accessor that
//! routes matrix coordinates through a [`MatrixMap`].
//!
//! [`LedStrip`] is the lowest layer segments write through. It stores one
//! [`Rgbw`] per physical LED in wiring order and, for every `(x, y)` access,
//! looks up the physical index in its [`MatrixMap`]. Cells with no LED behind
//! them read as [`BLACK`] and ignore writes.
//!
//! # Example
//!
//! ```rust
//! use matrix_envoy::led2d::{MatrixMap, Panel};
//! use matrix_envoy::led_strip::{LedStrip, PixelStrip, rgbw};
//!
//! // One 4×2 panel wired as a snake across rows.
//! let panels = [Panel::serpentine_row_major(4, 2)];
//! let map: MatrixMap<8> = MatrixMap::build(&panels, None, 8);
//! let mut led_strip = LedStrip::new(map);
//!
//! led_strip.set_pixel_color_xy(0, 1, rgbw(9, 0, 0, 0));
//! // Row 1 runs right-to-left, so (0, 1) is the last LED on the wire.
//! assert_eq!(led_strip.frame()[7], rgbw(9, 0, 0, 0));
//! ```

mod color;

pub use color::{
    BLACK, Rgbw, ToRgb888, ToRgbw, blend, blend16, rgbw, saturating_add, scale_brightness,
};

/// Predefined RGB color constants from the `smart_leds` crate.
///
/// Common colors include `RED`, `GREEN`, `BLUE`, `YELLOW`, `WHITE`, `BLACK`, `CYAN`, `MAGENTA`, `ORANGE`, `PURPLE`.
#[doc(inline)]
pub use smart_leds::colors;

/// 8-bit-per-channel RGB color from `embedded_graphics`.
#[doc(inline)]
pub use embedded_graphics::pixelcolor::Rgb888;

/// RGB color type from the `smart_leds` crate.
pub use smart_leds::{RGB8, White};

use core::ops::{Deref, DerefMut};

use heapless::Vec;

use crate::led2d::{GapMask, MatrixMap, MatrixMode, Panel};

/// Fixed-size buffer of physical LED colors in wiring order.
///
/// Frames deref to `[Rgbw; N]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame1d<const N: usize>(pub [Rgbw; N]);

impl<const N: usize> Frame1d<N> {
    /// Number of LEDs in this frame.
    pub const LEN: usize = N;

    /// Create a new blank (all black) frame.
    #[must_use]
    pub const fn new() -> Self {
        Self([BLACK; N])
    }

    /// Create a frame filled with a single color.
    #[must_use]
    pub const fn filled(color: Rgbw) -> Self {
        Self([color; N])
    }
}

impl<const N: usize> Deref for Frame1d<N> {
    type Target = [Rgbw; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> DerefMut for Frame1d<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const N: usize> From<[Rgbw; N]> for Frame1d<N> {
    fn from(array: [Rgbw; N]) -> Self {
        Self(array)
    }
}

impl<const N: usize> From<Frame1d<N>> for [Rgbw; N] {
    fn from(frame: Frame1d<N>) -> Self {
        frame.0
    }
}

impl<const N: usize> Default for Frame1d<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw `(x, y)` access to a strip in matrix coordinate space.
///
/// Segments write through this trait. Implementations resolve the coordinate
/// to a physical LED and silently ignore cells that have none.
pub trait PixelStrip {
    /// Set the color of the LED at matrix cell `(x, y)`.
    fn set_pixel_color_xy(&mut self, x: u16, y: u16, color: Rgbw);

    /// Color of the LED at matrix cell `(x, y)`, or [`BLACK`] if there is none.
    #[must_use]
    fn pixel_color_xy(&self, x: u16, y: u16) -> Rgbw;

    /// Matrix width in logical cells.
    #[must_use]
    fn matrix_width(&self) -> u16;

    /// Matrix height in logical cells.
    #[must_use]
    fn matrix_height(&self) -> u16;
}

/// A strip of up to `N` LEDs addressed through a [`MatrixMap`].
#[derive(Clone, Debug)]
pub struct LedStrip<const N: usize> {
    frame: Frame1d<N>,
    map: MatrixMap<N>,
}

impl<const N: usize> LedStrip<N> {
    /// Create a strip with all LEDs black.
    #[must_use]
    pub const fn new(map: MatrixMap<N>) -> Self {
        Self {
            frame: Frame1d::new(),
            map,
        }
    }

    /// The mapping this strip resolves coordinates through.
    #[must_use]
    pub const fn map(&self) -> &MatrixMap<N> {
        &self.map
    }

    /// Physical LED colors in wiring order.
    #[must_use]
    pub const fn frame(&self) -> &Frame1d<N> {
        &self.frame
    }

    /// Mutable physical LED colors in wiring order.
    pub fn frame_mut(&mut self) -> &mut Frame1d<N> {
        &mut self.frame
    }

    /// Rebuild the mapping after a topology change.
    ///
    /// On success the panels are kept and matrix mode is on. If the panels do
    /// not form a valid matrix, matrix mode is disabled, `panels` is cleared,
    /// and the strip falls back to a single row of `total_len` LEDs. The frame
    /// is cleared either way.
    ///
    /// Segments laid out against the old mapping must be re-fitted by the
    /// caller; [`Segment::reset_to`](crate::segment::Segment::reset_to) does that.
    pub fn set_up_matrix<const P: usize>(
        &mut self,
        panels: &mut Vec<Panel, P>,
        gap_mask: Option<&GapMask<N>>,
        total_len: u16,
    ) -> MatrixMode {
        self.map = MatrixMap::build(panels.as_slice(), gap_mask, total_len);
        if self.map.mode() == MatrixMode::Strip {
            info!("LedStrip: matrix disabled, dropping {} panels", panels.len());
            panels.clear();
        }
        self.frame = Frame1d::new();
        self.map.mode()
    }

    /// Set every physical LED to `color`.
    pub fn fill(&mut self, color: Rgbw) {
        let len = usize::from(self.map.total_len()).min(N);
        for pixel in self.frame.iter_mut().take(len) {
            *pixel = color;
        }
    }

    fn physical_index(&self, x: u16, y: u16) -> Option<usize> {
        self.map
            .physical_index(x, y)
            .map(usize::from)
            .filter(|&index| index < N)
    }
}

impl<const N: usize> PixelStrip for LedStrip<N> {
    fn set_pixel_color_xy(&mut self, x: u16, y: u16, color: Rgbw) {
        if let Some(pixel) = self
            .physical_index(x, y)
            .and_then(|index| self.frame.get_mut(index))
        {
            *pixel = color;
        }
    }

    fn pixel_color_xy(&self, x: u16, y: u16) -> Rgbw {
        self.physical_index(x, y)
            .and_then(|index| self.frame.get(index).copied())
            .unwrap_or(BLACK)
    }

    fn matrix_width(&self) -> u16 {
        self.map.width()
    }

    fn matrix_height(&self) -> u16 {
        self.map.height()
    }
}
