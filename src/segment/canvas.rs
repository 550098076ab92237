//! `embedded-graphics` drawing onto a segment.

use core::convert::Infallible;

use embedded_graphics::{
    Pixel,
    pixelcolor::Rgb888,
    prelude::{DrawTarget, OriginDimensions, Size},
};

use super::Segment;
use crate::led_strip::{PixelStrip, ToRgbw};

/// A [`DrawTarget`] in a segment's virtual coordinates.
///
/// Every drawn pixel goes through [`Segment::set_pixel_color_xy`], so
/// brightness, transforms, and transition capture apply. Pixels outside the
/// segment are dropped.
///
/// # Example
///
/// ```rust
/// use embedded_graphics::{prelude::*, primitives::{Line, PrimitiveStyle}};
/// use matrix_envoy::led2d::{MatrixMap, Panel};
/// use matrix_envoy::led_strip::{LedStrip, Rgb888, ToRgbw};
/// use matrix_envoy::segment::{Segment, SegmentCanvas};
///
/// let map: MatrixMap<16> = MatrixMap::build(&[Panel::new(4, 4)], None, 16);
/// let mut led_strip = LedStrip::new(map.clone());
/// let mut segment: Segment<16> = Segment::full(&map)?;
///
/// let mut canvas = SegmentCanvas::new(&mut segment, &mut led_strip);
/// Line::new(Point::new(0, 0), Point::new(3, 3))
///     .into_styled(PrimitiveStyle::with_stroke(Rgb888::GREEN, 1))
///     .draw(&mut canvas)
///     .ok();
///
/// assert_eq!(led_strip.frame()[15], Rgb888::GREEN.to_rgbw());
/// # Ok::<(), matrix_envoy::Error>(())
/// ```
pub struct SegmentCanvas<'a, const N: usize, S: PixelStrip + ?Sized> {
    segment: &'a mut Segment<N>,
    strip: &'a mut S,
}

impl<'a, const N: usize, S: PixelStrip + ?Sized> SegmentCanvas<'a, N, S> {
    /// Draw onto `segment`, writing through `strip`.
    pub fn new(segment: &'a mut Segment<N>, strip: &'a mut S) -> Self {
        Self { segment, strip }
    }
}

impl<const N: usize, S: PixelStrip + ?Sized> OriginDimensions for SegmentCanvas<'_, N, S> {
    fn size(&self) -> Size {
        Size::new(
            u32::from(self.segment.virtual_width()),
            u32::from(self.segment.virtual_height()),
        )
    }
}

impl<const N: usize, S: PixelStrip + ?Sized> DrawTarget for SegmentCanvas<'_, N, S> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.segment
                .set_pixel_color_xy(&mut *self.strip, coord.x, coord.y, color.to_rgbw());
        }
        Ok(())
    }
}
