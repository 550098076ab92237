//! Rectangular views into the logical grid with flips, transposition, grouping,
//! and brightness applied on every access.
//!
//! A [`Segment`] does not own pixels. Every read and write goes through a
//! [`PixelStrip`] passed in by the caller, except while a transition capture
//! redirects writes into one of the segment's snapshot buffers (see
//! [`transition`]).
//!
//! Writes transform a virtual coordinate in this order: brightness scaling,
//! `reverse` / `reverse_y`, `transpose`, then expansion by `grouping` into
//! `grouping × grouping` physical cells, each optionally mirrored.
//!
//! # Example
//!
//! ```rust
//! use matrix_envoy::led2d::{MatrixMap, Panel};
//! use matrix_envoy::led_strip::{LedStrip, rgbw};
//! use matrix_envoy::segment::{Segment, SegmentConfig};
//!
//! let map: MatrixMap<16> = MatrixMap::build(&[Panel::new(4, 4)], None, 16);
//! let mut led_strip = LedStrip::new(map.clone());
//!
//! // A 2×2 virtual segment that drives each pixel as a 2×2 block.
//! let config = SegmentConfig::new(4, 4).with_grouping(2).with_reverse(true);
//! let mut segment: Segment<4> = Segment::try_new(config, &map)?;
//! assert_eq!((segment.virtual_width(), segment.virtual_height()), (2, 2));
//!
//! let red = rgbw(255, 0, 0, 0);
//! segment.set_pixel_color_xy(&mut led_strip, 0, 0, red);
//! // Reversed: virtual (0, 0) is physical columns 2..4 of rows 0..2.
//! assert_eq!(led_strip.frame()[2], red);
//! assert_eq!(led_strip.frame()[7], red);
//! assert_eq!(segment.pixel_color_xy(&led_strip, 0, 0), red);
//! # Ok::<(), matrix_envoy::Error>(())
//! ```

pub mod canvas;
pub mod filters;
pub mod transition;

pub use canvas::SegmentCanvas;
pub use transition::{
    SnapshotSlot, TRANSITION_COMPLETE, TransitionState, TransitionStyle, fairy_dust_threshold,
};

use fixed::types::I32F32;
use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::led2d::MatrixMap;
use crate::led_strip::{BLACK, PixelStrip, Rgbw, blend, scale_brightness};
use crate::{Error, Result};
use transition::Transition;

/// Geometry, transform flags, and brightness of one segment.
///
/// `start`, `start_y`, `width`, and `height` are in matrix cells. The derived
/// virtual size is what effect code addresses; see [`Segment::virtual_width`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SegmentConfig {
    /// First matrix column.
    pub start: u16,
    /// First matrix row.
    pub start_y: u16,
    /// Width in matrix cells.
    pub width: u16,
    /// Height in matrix cells.
    pub height: u16,
    /// Physical cells driven per virtual pixel along each axis.
    pub grouping: u8,
    /// Flip the virtual x axis.
    pub reverse: bool,
    /// Flip the virtual y axis.
    pub reverse_y: bool,
    /// Swap x and y.
    pub transpose: bool,
    /// Also write the horizontally mirrored cell.
    pub mirror: bool,
    /// Also write the vertically mirrored cell.
    pub mirror_y: bool,
    /// Brightness applied to every write, `255` = unchanged.
    pub brightness: u8,
    /// Segment is switched on.
    pub on: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl SegmentConfig {
    /// A `width × height` segment at the matrix origin with no transforms.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            start: 0,
            start_y: 0,
            width,
            height,
            grouping: 1,
            reverse: false,
            reverse_y: false,
            transpose: false,
            mirror: false,
            mirror_y: false,
            brightness: u8::MAX,
            on: true,
        }
    }

    /// Place the segment's top-left cell at `(start, start_y)`.
    #[must_use]
    pub const fn at(mut self, start: u16, start_y: u16) -> Self {
        self.start = start;
        self.start_y = start_y;
        self
    }

    /// Set the grouping factor.
    #[must_use]
    pub const fn with_grouping(mut self, grouping: u8) -> Self {
        self.grouping = grouping;
        self
    }

    /// Set x reversal.
    #[must_use]
    pub const fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Set y reversal.
    #[must_use]
    pub const fn with_reverse_y(mut self, reverse_y: bool) -> Self {
        self.reverse_y = reverse_y;
        self
    }

    /// Set transposition.
    #[must_use]
    pub const fn with_transpose(mut self, transpose: bool) -> Self {
        self.transpose = transpose;
        self
    }

    /// Set horizontal mirroring.
    #[must_use]
    pub const fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Set vertical mirroring.
    #[must_use]
    pub const fn with_mirror_y(mut self, mirror_y: bool) -> Self {
        self.mirror_y = mirror_y;
        self
    }

    /// Set brightness.
    #[must_use]
    pub const fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness;
        self
    }

    const fn virtual_extent(extent: u16, grouping: u8, mirrored: bool) -> u16 {
        let grouping = if grouping == 0 { 1 } else { grouping as u32 };
        let extent = (extent as u32).div_ceil(grouping);
        let extent = if mirrored { extent.div_ceil(2) } else { extent };
        extent as u16
    }

    fn same_geometry(&self, other: &Self) -> bool {
        (
            self.start,
            self.start_y,
            self.width,
            self.height,
            self.grouping,
            self.transpose,
            self.mirror,
            self.mirror_y,
        ) == (
            other.start,
            other.start_y,
            other.width,
            other.height,
            other.grouping,
            other.transpose,
            other.mirror,
            other.mirror_y,
        )
    }
}

/// Where writes to a segment currently land.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderTarget {
    /// Through the transforms into the strip.
    Live,
    /// Untransformed into a transition snapshot buffer.
    Snapshot(SnapshotSlot),
}

/// A segment of at most `N` virtual pixels.
///
/// `N` bounds the virtual size so the transition snapshot buffers can live
/// inline.
#[derive(Clone, Debug)]
pub struct Segment<const N: usize> {
    config: SegmentConfig,
    transition: Option<Transition<N>>,
}

impl<const N: usize> Segment<N> {
    /// Create a segment and check that it fits `map`.
    ///
    /// # Errors
    ///
    /// - [`Error::SegmentBounds`] if the size or grouping is zero, or the
    ///   rectangle reaches past the matrix.
    /// - [`Error::CapacityExceeded`] if the virtual size is larger than `N`.
    pub fn try_new<const M: usize>(config: SegmentConfig, map: &MatrixMap<M>) -> Result<Self> {
        validate::<N, M>(&config, map)?;
        Ok(Self {
            config,
            transition: None,
        })
    }

    /// A segment covering the whole matrix of `map`.
    ///
    /// # Errors
    ///
    /// See [`Self::try_new`].
    pub fn full<const M: usize>(map: &MatrixMap<M>) -> Result<Self> {
        Self::try_new(SegmentConfig::new(map.width(), map.height()), map)
    }

    /// Re-fit the segment to cover all of `map` after a topology change.
    ///
    /// Brightness and the on/off state are kept; any transition is dropped.
    ///
    /// # Errors
    ///
    /// See [`Self::try_new`]. On error the segment is unchanged.
    pub fn reset_to<const M: usize>(&mut self, map: &MatrixMap<M>) -> Result<()> {
        let config = SegmentConfig {
            brightness: self.config.brightness,
            on: self.config.on,
            ..SegmentConfig::new(map.width(), map.height())
        };
        validate::<N, M>(&config, map)?;
        info!(
            "Segment: reset to {}x{} matrix",
            map.width(),
            map.height()
        );
        self.config = config;
        self.cancel_transition();
        Ok(())
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Replace the configuration.
    ///
    /// A change to anything that moves or resizes the virtual grid (origin,
    /// size, grouping, transpose or mirrors) cancels a running transition and
    /// drops its snapshots. To cross-fade into the new geometry, start a fresh
    /// transition afterwards with [`Self::start_transition`] and refill the
    /// outgoing snapshot with [`Self::capture_live`]. Brightness, reverse and
    /// on/off changes keep the transition running.
    ///
    /// # Errors
    ///
    /// See [`Self::try_new`]. On error the segment is unchanged.
    pub fn set_config<const M: usize>(
        &mut self,
        config: SegmentConfig,
        map: &MatrixMap<M>,
    ) -> Result<()> {
        validate::<N, M>(&config, map)?;
        if !self.config.same_geometry(&config) {
            self.cancel_transition();
        }
        self.config = config;
        Ok(())
    }

    /// Set the brightness applied to writes.
    pub fn set_brightness(&mut self, brightness: u8) {
        self.config.brightness = brightness;
    }

    /// Switch the segment on or off.
    pub fn set_on(&mut self, on: bool) {
        self.config.on = on;
    }

    /// True if the segment accepts reads and writes.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.config.on && self.config.width > 0 && self.config.height > 0
    }

    /// Width in virtual pixels after transposition, grouping, and mirroring.
    #[must_use]
    pub const fn virtual_width(&self) -> u16 {
        let config = &self.config;
        let extent = if config.transpose {
            config.height
        } else {
            config.width
        };
        SegmentConfig::virtual_extent(extent, config.grouping, config.mirror)
    }

    /// Height in virtual pixels after transposition, grouping, and mirroring.
    #[must_use]
    pub const fn virtual_height(&self) -> u16 {
        let config = &self.config;
        let extent = if config.transpose {
            config.width
        } else {
            config.height
        };
        SegmentConfig::virtual_extent(extent, config.grouping, config.mirror_y)
    }

    /// Number of virtual pixels.
    #[must_use]
    pub const fn virtual_length(&self) -> usize {
        self.virtual_width() as usize * self.virtual_height() as usize
    }

    /// Row-major index of `(x, y)`, wrapping each axis; `0` if inactive.
    #[must_use]
    pub const fn xy(&self, x: u16, y: u16) -> usize {
        if !self.is_active() {
            return 0;
        }
        let width = self.virtual_width();
        let height = self.virtual_height();
        (x % width) as usize + (y % height) as usize * width as usize
    }

    /// Write `color` at virtual `(x, y)`.
    ///
    /// Out-of-range coordinates and inactive segments are ignored.
    pub fn set_pixel_color_xy<S: PixelStrip + ?Sized>(
        &mut self,
        strip: &mut S,
        x: i32,
        y: i32,
        color: Rgbw,
    ) {
        let Some((x, y)) = self.virtual_cell(x, y) else {
            return;
        };
        let color = scale_brightness(color, self.config.brightness);

        let index = self.linear_index(x, y);
        if let Some(buffer) = self
            .transition
            .as_mut()
            .and_then(Transition::capture_buffer_mut)
        {
            if let Some(pixel) = buffer.get_mut(index) {
                *pixel = color;
            }
            return;
        }

        if let Some((x, y)) = self.physical_cell(x, y) {
            self.write_live(strip, x, y, color);
        }
    }

    /// Color at virtual `(x, y)`, or [`BLACK`] if out of range.
    ///
    /// Reads the single canonical cell: no brightness scaling, no mirroring.
    #[must_use]
    pub fn pixel_color_xy<S: PixelStrip + ?Sized>(&self, strip: &S, x: i32, y: i32) -> Rgbw {
        let Some((x, y)) = self.virtual_cell(x, y) else {
            return BLACK;
        };
        if let Some(buffer) = self.transition.as_ref().and_then(Transition::capture_buffer) {
            return buffer
                .get(self.linear_index(x, y))
                .copied()
                .unwrap_or(BLACK);
        }
        self.read_live(strip, x, y)
    }

    /// Write `color` at normalized `(fx, fy)` in `[0, 1] × [0, 1]`.
    ///
    /// Without `antialias` the point snaps to the nearest virtual pixel. With
    /// it, the color is blended into the up to four surrounding pixels,
    /// weighted by squared sub-pixel distance.
    pub fn set_pixel_color_xy_aa<S: PixelStrip + ?Sized>(
        &mut self,
        strip: &mut S,
        fx: f32,
        fy: f32,
        color: Rgbw,
        antialias: bool,
    ) {
        if !self.is_active() {
            return;
        }
        let (Some(fx), Some(fy)) = (I32F32::checked_from_num(fx), I32F32::checked_from_num(fy))
        else {
            return;
        };
        let unit = I32F32::ZERO..=I32F32::ONE;
        if !unit.contains(&fx) || !unit.contains(&fy) {
            return;
        }
        let (Some(position_x), Some(position_y)) = (
            scale_to_grid(fx, self.virtual_width()),
            scale_to_grid(fy, self.virtual_height()),
        ) else {
            return;
        };

        if !antialias {
            let x = position_x.round().saturating_to_num::<i32>();
            let y = position_y.round().saturating_to_num::<i32>();
            self.set_pixel_color_xy(strip, x, y, color);
            return;
        }

        let (left, right) = straddle(position_x);
        let (top, bottom) = straddle(position_y);
        let distance_left = (position_x - I32F32::from_num(left)).abs();
        let distance_right = (I32F32::from_num(right) - position_x).abs();
        let distance_top = (position_y - I32F32::from_num(top)).abs();
        let distance_bottom = (I32F32::from_num(bottom) - position_y).abs();

        match (left != right, top != bottom) {
            (true, true) => {
                // sqrt(dx² · dy²) = |dx| · |dy|
                for (x, y, weight) in [
                    (left, top, distance_left * distance_top),
                    (right, top, distance_right * distance_top),
                    (left, bottom, distance_left * distance_bottom),
                    (right, bottom, distance_right * distance_bottom),
                ] {
                    self.blend_pixel(strip, x, y, color, weight);
                }
            }
            (true, false) => {
                self.blend_pixel(strip, left, top, color, distance_left * distance_left);
                self.blend_pixel(strip, right, top, color, distance_right * distance_right);
            }
            (false, true) => {
                self.blend_pixel(strip, left, top, color, distance_top * distance_top);
                self.blend_pixel(strip, left, bottom, color, distance_bottom * distance_bottom);
            }
            (false, false) => self.set_pixel_color_xy(strip, left, top, color),
        }
    }

    /// Write `color` to every virtual pixel.
    pub fn fill<S: PixelStrip + ?Sized>(&mut self, strip: &mut S, color: Rgbw) {
        for (y, x) in iproduct!(0..self.virtual_height(), 0..self.virtual_width()) {
            self.set_pixel_color_xy(strip, i32::from(x), i32::from(y), color);
        }
    }

    fn blend_pixel<S: PixelStrip + ?Sized>(
        &mut self,
        strip: &mut S,
        x: i32,
        y: i32,
        color: Rgbw,
        weight: I32F32,
    ) {
        let existing = self.pixel_color_xy(&*strip, x, y);
        let amount = (weight * I32F32::from_num(u8::MAX)).saturating_to_num::<u8>();
        self.set_pixel_color_xy(strip, x, y, blend(color, existing, amount));
    }

    fn virtual_cell(&self, x: i32, y: i32) -> Option<(u16, u16)> {
        if !self.is_active() {
            return None;
        }
        let x = u16::try_from(x).ok().filter(|&x| x < self.virtual_width())?;
        let y = u16::try_from(y).ok().filter(|&y| y < self.virtual_height())?;
        Some((x, y))
    }

    const fn linear_index(&self, x: u16, y: u16) -> usize {
        y as usize * self.virtual_width() as usize + x as usize
    }

    // Reverse, transpose, then group. `None` past the physical edge.
    fn physical_cell(&self, x: u16, y: u16) -> Option<(u32, u32)> {
        let config = &self.config;
        let x = if config.reverse {
            self.virtual_width() - x - 1
        } else {
            x
        };
        let y = if config.reverse_y {
            self.virtual_height() - y - 1
        } else {
            y
        };
        let (x, y) = if config.transpose { (y, x) } else { (x, y) };

        let grouping = u32::from(config.grouping.max(1));
        let (x, y) = (u32::from(x) * grouping, u32::from(y) * grouping);
        (x < u32::from(config.width) && y < u32::from(config.height)).then_some((x, y))
    }

    fn read_live<S: PixelStrip + ?Sized>(&self, strip: &S, x: u16, y: u16) -> Rgbw {
        let config = &self.config;
        self.physical_cell(x, y)
            .and_then(|(x, y)| {
                strip_cell(
                    u32::from(config.start) + x,
                    u32::from(config.start_y) + y,
                )
            })
            .map_or(BLACK, |(x, y)| strip.pixel_color_xy(x, y))
    }

    fn write_live<S: PixelStrip + ?Sized>(&self, strip: &mut S, x: u32, y: u32, color: Rgbw) {
        let config = &self.config;
        let (start, start_y) = (u32::from(config.start), u32::from(config.start_y));
        let (width, height) = (u32::from(config.width), u32::from(config.height));
        let grouping = u32::from(config.grouping.max(1));

        for (row, column) in iproduct!(0..grouping, 0..grouping) {
            let (cell_x, cell_y) = (x + column, y + row);
            if cell_x >= width || cell_y >= height {
                continue;
            }
            put(strip, start + cell_x, start_y + cell_y, color);

            if config.mirror {
                if config.transpose {
                    put(strip, start + cell_x, start_y + height - cell_y - 1, color);
                } else {
                    put(strip, start + width - cell_x - 1, start_y + cell_y, color);
                }
            }
            if config.mirror_y {
                if config.transpose {
                    put(strip, start + width - cell_x - 1, start_y + cell_y, color);
                } else {
                    put(strip, start + cell_x, start_y + height - cell_y - 1, color);
                }
            }
            if config.mirror && config.mirror_y {
                // Relative to the matrix origin, not the segment origin.
                put(strip, width - cell_x - 1, height - cell_y - 1, color);
            }
        }
    }
}

fn validate<const N: usize, const M: usize>(
    config: &SegmentConfig,
    map: &MatrixMap<M>,
) -> Result<()> {
    if config.grouping == 0 || config.width == 0 || config.height == 0 {
        return Err(Error::SegmentBounds);
    }
    let right = u32::from(config.start) + u32::from(config.width);
    let bottom = u32::from(config.start_y) + u32::from(config.height);
    if right > u32::from(map.width()) || bottom > u32::from(map.height()) {
        return Err(Error::SegmentBounds);
    }
    let probe = Segment::<N> {
        config: *config,
        transition: None,
    };
    let requested = probe.virtual_length();
    if requested > N {
        return Err(Error::CapacityExceeded {
            requested,
            capacity: N,
        });
    }
    Ok(())
}

fn strip_cell(x: u32, y: u32) -> Option<(u16, u16)> {
    Some((u16::try_from(x).ok()?, u16::try_from(y).ok()?))
}

fn put<S: PixelStrip + ?Sized>(strip: &mut S, x: u32, y: u32, color: Rgbw) {
    if let Some((x, y)) = strip_cell(x, y) {
        strip.set_pixel_color_xy(x, y, color);
    }
}

// Map a normalized coordinate onto `0..=extent-1`.
fn scale_to_grid(unit: I32F32, extent: u16) -> Option<I32F32> {
    let last = I32F32::checked_from_num(extent.saturating_sub(1))?;
    unit.checked_mul(last)
}

// The pixels on either side of `position`; equal when it sits on a pixel.
fn straddle(position: I32F32) -> (i32, i32) {
    const NUDGE: I32F32 = I32F32::from_bits(0x7D70_A3D7); // 0.49
    let low = (position - NUDGE).round().saturating_to_num::<i32>();
    let high = (position + NUDGE).round().saturating_to_num::<i32>();
    (low, high)
}
