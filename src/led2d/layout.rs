//! Runtime description of one LED panel's geometry and wiring (with examples).
//!
//! See [`Panel`] for examples including: row-major and column-major wiring,
//! serpentine panels, and mirrored start corners.

use serde::{Deserialize, Serialize};

/// One physical rectangle of LEDs inside a larger matrix.
///
/// A `Panel` says where the rectangle sits in the matrix (`x_offset`,
/// `y_offset`) and in which order its LEDs are wired:
///
/// - `vertical`: LEDs run down columns instead of across rows.
/// - `right_start` / `bottom_start`: which corner holds the first LED.
/// - `serpentine`: every other line runs in the opposite direction.
///
/// Coordinates use a screen-style convention: `(0, 0)` is the top-left corner,
/// `x` increases to the right, and `y` increases downward.
///
/// Start from one of the constructors, then position and re-orient with the
/// `const` builder methods.
///
/// # Example
///
/// A 3×2 serpentine panel wired down columns:
///
/// ```rust
/// use matrix_envoy::led2d::Panel;
///
/// const PANEL: Panel = Panel::serpentine_column_major(3, 2);
/// let wiring: Vec<(u16, u16)> = PANEL.scan().collect();
/// assert_eq!(wiring, [(0, 0), (0, 1), (1, 1), (1, 0), (2, 0), (2, 1)]);
/// ```
///
/// ```text
/// Strip snakes down columns (3×2 example):
///   LED0  LED3  LED4
///   LED1  LED2  LED5
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Panel {
    /// Number of columns.
    pub width: u16,
    /// Number of rows.
    pub height: u16,
    /// Column of the panel's top-left cell in the matrix.
    pub x_offset: u16,
    /// Row of the panel's top-left cell in the matrix.
    pub y_offset: u16,
    /// LEDs run column-major instead of row-major.
    pub vertical: bool,
    /// The first LED is on the right edge.
    pub right_start: bool,
    /// The first LED is on the bottom edge.
    pub bottom_start: bool,
    /// Alternate lines run in the opposite direction.
    pub serpentine: bool,
}

impl Panel {
    /// Row-major panel at the matrix origin, first LED top-left, no snake.
    ///
    /// ```rust
    /// use matrix_envoy::led2d::Panel;
    ///
    /// let wiring: Vec<(u16, u16)> = Panel::new(3, 2).scan().collect();
    /// assert_eq!(wiring, [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    /// ```
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            x_offset: 0,
            y_offset: 0,
            vertical: false,
            right_start: false,
            bottom_start: false,
            serpentine: false,
        }
    }

    /// Serpentine row-major panel (alternating left-to-right and right-to-left across rows).
    ///
    /// ```text
    /// Strip snakes across rows (3×2 example):
    ///   LED0  LED1  LED2
    ///   LED5  LED4  LED3
    /// ```
    #[must_use]
    pub const fn serpentine_row_major(width: u16, height: u16) -> Self {
        Self::new(width, height).with_serpentine(true)
    }

    /// Serpentine column-major panel (alternating top-to-bottom and bottom-to-top down columns).
    #[must_use]
    pub const fn serpentine_column_major(width: u16, height: u16) -> Self {
        Self::new(width, height)
            .with_vertical(true)
            .with_serpentine(true)
    }

    /// Place the panel's top-left cell at `(x_offset, y_offset)` in the matrix.
    #[must_use]
    pub const fn at(mut self, x_offset: u16, y_offset: u16) -> Self {
        self.x_offset = x_offset;
        self.y_offset = y_offset;
        self
    }

    /// Set column-major wiring.
    #[must_use]
    pub const fn with_vertical(mut self, vertical: bool) -> Self {
        self.vertical = vertical;
        self
    }

    /// Set whether the first LED is on the right edge.
    #[must_use]
    pub const fn with_right_start(mut self, right_start: bool) -> Self {
        self.right_start = right_start;
        self
    }

    /// Set whether the first LED is on the bottom edge.
    #[must_use]
    pub const fn with_bottom_start(mut self, bottom_start: bool) -> Self {
        self.bottom_start = bottom_start;
        self
    }

    /// Set serpentine wiring.
    #[must_use]
    pub const fn with_serpentine(mut self, serpentine: bool) -> Self {
        self.serpentine = serpentine;
        self
    }

    /// Number of LEDs in the panel.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when the panel has no LEDs.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Column just past the panel's right edge in matrix coordinates.
    #[must_use]
    pub const fn right_edge(&self) -> u32 {
        self.x_offset as u32 + self.width as u32
    }

    /// Row just past the panel's bottom edge in matrix coordinates.
    #[must_use]
    pub const fn bottom_edge(&self) -> u32 {
        self.y_offset as u32 + self.height as u32
    }

    /// Panel-local `(x, y)` coordinates in the order the LEDs are wired.
    ///
    /// ```rust
    /// use matrix_envoy::led2d::Panel;
    ///
    /// // First LED bottom-right, rows snake upward.
    /// let panel = Panel::serpentine_row_major(2, 2)
    ///     .with_right_start(true)
    ///     .with_bottom_start(true);
    /// let wiring: Vec<(u16, u16)> = panel.scan().collect();
    /// assert_eq!(wiring, [(1, 1), (0, 1), (0, 0), (1, 0)]);
    /// ```
    #[must_use]
    pub const fn scan(&self) -> PanelScan {
        let (lines, line_len) = if self.vertical {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        };
        PanelScan {
            panel: *self,
            lines,
            line_len,
            line: 0,
            step: 0,
        }
    }
}

/// Iterator over a panel's local `(x, y)` cells in wiring order.
///
/// Created by [`Panel::scan`].
#[derive(Clone, Debug)]
pub struct PanelScan {
    panel: Panel,
    // Lines are rows for row-major panels, columns for vertical ones.
    lines: u16,
    line_len: u16,
    line: u16,
    step: u16,
}

impl Iterator for PanelScan {
    type Item = (u16, u16);

    fn next(&mut self) -> Option<Self::Item> {
        if self.line >= self.lines || self.line_len == 0 {
            return None;
        }
        let panel = &self.panel;
        let (line, step) = (self.line, self.step);

        let line_flipped = if panel.vertical {
            panel.right_start
        } else {
            panel.bottom_start
        };
        let step_flipped = if panel.vertical {
            panel.bottom_start
        } else {
            panel.right_start
        };
        let across = if line_flipped {
            self.lines - line - 1
        } else {
            line
        };
        let mut along = if step_flipped {
            self.line_len - step - 1
        } else {
            step
        };
        if panel.serpentine && line % 2 == 1 {
            along = self.line_len - along - 1;
        }

        self.step += 1;
        if self.step == self.line_len {
            self.step = 0;
            self.line += 1;
        }

        Some(if panel.vertical {
            (across, along)
        } else {
            (along, across)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = usize::from(self.lines) * usize::from(self.line_len);
        let done = usize::from(self.line) * usize::from(self.line_len) + usize::from(self.step);
        let remaining = total.saturating_sub(done);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PanelScan {}
