//! Whole-segment pixel operations built on the segment accessors.
//!
//! Everything here reads and writes through [`Segment::pixel_color_xy`] and
//! [`Segment::set_pixel_color_xy`], so transforms, brightness, and transition
//! capture apply exactly as for effect code. Scratch lines are stack arrays of
//! `N` pixels.

use crate::led_strip::{BLACK, PixelStrip, Rgbw, rgbw, saturating_add, scale_brightness};

use super::Segment;

/// Direction for [`Segment::shift`], numbered as configuration surfaces store it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftDirection {
    /// `0`
    Left,
    /// `1`
    LeftUp,
    /// `2`
    Up,
    /// `3`
    RightUp,
    /// `4`
    Right,
    /// `5`
    RightDown,
    /// `6`
    Down,
    /// `7`
    LeftDown,
}

impl TryFrom<u8> for ShiftDirection {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Ok(match id {
            0 => Self::Left,
            1 => Self::LeftUp,
            2 => Self::Up,
            3 => Self::RightUp,
            4 => Self::Right,
            5 => Self::RightDown,
            6 => Self::Down,
            7 => Self::LeftDown,
            _ => return Err(id),
        })
    }
}

impl ShiftDirection {
    // Signs of (move_x, move_y) deltas; content moves opposite to the delta.
    const fn signs(self) -> (i8, i8) {
        match self {
            Self::Left => (1, 0),
            Self::LeftUp => (1, 1),
            Self::Up => (0, 1),
            Self::RightUp => (-1, 1),
            Self::Right => (-1, 0),
            Self::RightDown => (-1, -1),
            Self::Down => (0, -1),
            Self::LeftDown => (1, -1),
        }
    }
}

impl<const N: usize> Segment<N> {
    /// Shift every row by `delta` pixels: pixel `x` takes the color of `x + delta`.
    ///
    /// Cells shifted in from past the edge keep their color, or take the color
    /// from the opposite edge with `wrap`. Nothing happens if `delta` is `0` or
    /// at least the virtual width.
    pub fn move_x<S: PixelStrip + ?Sized>(&mut self, strip: &mut S, delta: i8, wrap: bool) {
        let width = i32::from(self.virtual_width());
        let height = i32::from(self.virtual_height());
        if !self.is_active() || delta == 0 || i32::from(delta).abs() >= width {
            return;
        }
        let mut line = [BLACK; N];
        for y in 0..height {
            for x in 0..width {
                let source = shifted(x, i32::from(delta), width, wrap);
                if let Some(pixel) = line.get_mut(x as usize) {
                    *pixel = self.pixel_color_xy(&*strip, source, y);
                }
            }
            for (x, &color) in (0..width).zip(line.iter()) {
                self.set_pixel_color_xy(strip, x, y, color);
            }
        }
    }

    /// Shift every column by `delta` pixels: pixel `y` takes the color of `y + delta`.
    ///
    /// See [`Self::move_x`].
    pub fn move_y<S: PixelStrip + ?Sized>(&mut self, strip: &mut S, delta: i8, wrap: bool) {
        let width = i32::from(self.virtual_width());
        let height = i32::from(self.virtual_height());
        if !self.is_active() || delta == 0 || i32::from(delta).abs() >= height {
            return;
        }
        let mut line = [BLACK; N];
        for x in 0..width {
            for y in 0..height {
                let source = shifted(y, i32::from(delta), height, wrap);
                if let Some(pixel) = line.get_mut(y as usize) {
                    *pixel = self.pixel_color_xy(&*strip, x, source);
                }
            }
            for (y, &color) in (0..height).zip(line.iter()) {
                self.set_pixel_color_xy(strip, x, y, color);
            }
        }
    }

    /// Move the content `delta` pixels toward `direction`.
    pub fn shift<S: PixelStrip + ?Sized>(
        &mut self,
        strip: &mut S,
        direction: ShiftDirection,
        delta: u8,
        wrap: bool,
    ) {
        let Ok(delta) = i8::try_from(delta) else {
            return;
        };
        if delta == 0 {
            return;
        }
        let (sign_x, sign_y) = direction.signs();
        if sign_x != 0 {
            self.move_x(strip, sign_x * delta, wrap);
        }
        if sign_y != 0 {
            self.move_y(strip, sign_y * delta, wrap);
        }
    }

    /// Spread light along row `row` to each pixel's neighbors.
    ///
    /// `amount` `0` does nothing; larger values keep less of each pixel and
    /// pass half of `amount` on to both neighbors.
    pub fn blur_row<S: PixelStrip + ?Sized>(&mut self, strip: &mut S, row: u16, amount: u8) {
        if !self.is_active() || amount == 0 || row >= self.virtual_height() {
            return;
        }
        let width = i32::from(self.virtual_width());
        self.blur_line(strip, width, amount, |index| (index, i32::from(row)));
    }

    /// Spread light along column `column` to each pixel's neighbors.
    ///
    /// See [`Self::blur_row`].
    pub fn blur_col<S: PixelStrip + ?Sized>(&mut self, strip: &mut S, column: u16, amount: u8) {
        if !self.is_active() || amount == 0 || column >= self.virtual_width() {
            return;
        }
        let height = i32::from(self.virtual_height());
        self.blur_line(strip, height, amount, |index| (i32::from(column), index));
    }

    /// [`Self::blur_row`] on every row.
    pub fn blur_rows<S: PixelStrip + ?Sized>(&mut self, strip: &mut S, amount: u8) {
        for row in 0..self.virtual_height() {
            self.blur_row(strip, row, amount);
        }
    }

    /// Three-tap box blur of one row (`vertical == false`) or column.
    ///
    /// Each pixel becomes `(cur·keep + (prev + next)·seep) / 3` with
    /// `seep = amount / 255` and `keep = 3 − 2·seep`; pixels past the ends
    /// count as black.
    pub fn box_blur<S: PixelStrip + ?Sized>(
        &mut self,
        strip: &mut S,
        line: u16,
        vertical: bool,
        amount: u8,
    ) {
        let (length, lines) = if vertical {
            (self.virtual_height(), self.virtual_width())
        } else {
            (self.virtual_width(), self.virtual_height())
        };
        if !self.is_active() || amount == 0 || line >= lines {
            return;
        }
        let cell = |index: i32| {
            if vertical {
                (i32::from(line), index)
            } else {
                (index, i32::from(line))
            }
        };
        let length = i32::from(length);

        let mut blurred = [BLACK; N];
        let view: &S = strip;
        for index in 0..length {
            let read = |index: i32| {
                if index < 0 || index >= length {
                    BLACK
                } else {
                    let (x, y) = cell(index);
                    self.pixel_color_xy(view, x, y)
                }
            };
            if let Some(pixel) = blurred.get_mut(index as usize) {
                *pixel = box_kernel(read(index), read(index - 1), read(index + 1), amount);
            }
        }
        for (index, &color) in (0..length).zip(blurred.iter()) {
            let (x, y) = cell(index);
            self.set_pixel_color_xy(strip, x, y, color);
        }
    }

    /// Scale every pixel by `scale / 255`.
    pub fn nscale<S: PixelStrip + ?Sized>(&mut self, strip: &mut S, scale: u8) {
        if !self.is_active() {
            return;
        }
        for y in 0..i32::from(self.virtual_height()) {
            for x in 0..i32::from(self.virtual_width()) {
                let color = self.pixel_color_xy(&*strip, x, y);
                self.set_pixel_color_xy(strip, x, y, scale_brightness(color, scale));
            }
        }
    }

    /// Dim every pixel by `amount / 255`.
    pub fn fade_to_black_by<S: PixelStrip + ?Sized>(&mut self, strip: &mut S, amount: u8) {
        self.nscale(strip, u8::MAX - amount);
    }

    fn blur_line<S, F>(&mut self, strip: &mut S, length: i32, amount: u8, cell: F)
    where
        S: PixelStrip + ?Sized,
        F: Fn(i32) -> (i32, i32),
    {
        let keep = u8::MAX - amount;
        let seep = amount >> 1;
        let mut carryover = BLACK;
        for index in 0..length {
            let (x, y) = cell(index);
            let before = self.pixel_color_xy(&*strip, x, y);
            let part = scale_brightness(before, seep);
            let current = saturating_add(scale_brightness(before, keep), carryover);
            if index > 0 {
                let (prev_x, prev_y) = cell(index - 1);
                let previous = saturating_add(self.pixel_color_xy(&*strip, prev_x, prev_y), part);
                self.set_pixel_color_xy(strip, prev_x, prev_y, previous);
            }
            if current != before {
                self.set_pixel_color_xy(strip, x, y, current);
            }
            carryover = part;
        }
    }
}

// Source coordinate for position `at` shifted by `delta` along an axis of `len`.
const fn shifted(at: i32, delta: i32, len: i32, wrap: bool) -> i32 {
    let source = at + delta;
    if source >= 0 && source < len {
        source
    } else if wrap {
        source.rem_euclid(len)
    } else {
        at
    }
}

fn box_kernel(current: Rgbw, previous: Rgbw, next: Rgbw, amount: u8) -> Rgbw {
    // In units of 1/255: seep = amount, keep = 3·255 − 2·amount.
    let seep = u32::from(amount);
    let keep = 3 * 255 - 2 * seep;
    let channel = |current: u8, previous: u8, next: u8| {
        let sum = u32::from(current) * keep + (u32::from(previous) + u32::from(next)) * seep;
        (sum / (3 * 255)).min(255) as u8
    };
    rgbw(
        channel(current.r, previous.r, next.r),
        channel(current.g, previous.g, next.g),
        channel(current.b, previous.b, next.b),
        channel(current.a.0, previous.a.0, next.a.0),
    )
}
