//! Turn an irregular arrangement of LED panels into a flat logical pixel grid.
//!
//! A matrix is described by a list of [`Panel`]s, each a rectangle with its own
//! wiring order, plus an optional [`GapMask`]. [`MatrixMap::build`] scans the
//! panels in list order and records, for every logical cell of the bounding
//! rectangle, which physical LED (position on the wire) sits there.
//!
//! Matrix mode is all-or-nothing: if the panels do not form a valid matrix the
//! map falls back to a single row as long as the strip, and nothing about the
//! rejected layout survives.
//!
//! # Example: Two panels side by side
//!
//! ```rust
//! use matrix_envoy::led2d::{MatrixMap, MatrixMode, Panel};
//!
//! // Two 2×2 row-major panels, the second wired after the first.
//! let panels = [Panel::new(2, 2), Panel::new(2, 2).at(2, 0)];
//! let map: MatrixMap<8> = MatrixMap::build(&panels, None, 8);
//!
//! assert_eq!(map.mode(), MatrixMode::Matrix);
//! assert_eq!((map.width(), map.height()), (4, 2));
//! assert_eq!(map.physical_index(2, 0), Some(4));
//! assert_eq!(map.raw(), &[0, 1, 4, 5, 2, 3, 6, 7]);
//! ```
//!
//! ```text
//! Logical grid (4×2) → physical LED index:
//!   0  1  4  5
//!   2  3  6  7
//! ```

pub mod gap;
pub mod layout;
pub mod ledmap_block;

pub use gap::{Gap, GapMask};
pub use layout::{Panel, PanelScan};

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Raw table value for a logical cell with no LED behind it.
pub const UNMAPPED: u16 = 0xFFFF;

/// Whether a [`MatrixMap`] describes a 2D matrix or the 1-row fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MatrixMode {
    /// Panels form a matrix; coordinates go through the mapping table.
    Matrix,
    /// One row of `total_len` LEDs; coordinates map to themselves.
    Strip,
}

/// Logical-to-physical LED index table for a device of at most `N` LEDs.
///
/// In [`MatrixMode::Matrix`] the table holds one `u16` per LED of the device:
/// first the `width × height` matrix cells in row-major order, each a physical
/// index or [`UNMAPPED`], then one identity entry per trailing LED past the
/// matrix. Every mapped value is unique and less than
/// [`total_len`](Self::total_len) as long as panels do not overlap.
///
/// In [`MatrixMode::Strip`] there is no table; logical and physical indices
/// coincide.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixMap<const N: usize> {
    width: u16,
    height: u16,
    total_len: u16,
    table: Vec<u16, N>,
    overlap_count: u16,
}

impl<const N: usize> MatrixMap<N> {
    const CAPACITY_FITS_U16: () = assert!(
        N < UNMAPPED as usize,
        "N must leave 0xFFFF free as the unmapped marker"
    );

    /// The 1-row fallback layout: `total_len` LEDs in a single row.
    ///
    /// `total_len` is clamped to `N`.
    #[must_use]
    pub const fn strip(total_len: u16) -> Self {
        let total_len = if total_len as usize > N {
            N as u16
        } else {
            total_len
        };
        Self {
            width: total_len,
            height: 1,
            total_len,
            table: Vec::new(),
            overlap_count: 0,
        }
    }

    /// Build the mapping for `panels`, falling back to [`Self::strip`] on any error.
    ///
    /// See [`Self::try_build`] for the rules. A fallback is logged and reported
    /// through [`Self::mode`].
    #[must_use]
    pub fn build(panels: &[Panel], gap_mask: Option<&GapMask<N>>, total_len: u16) -> Self {
        match Self::try_build(panels, gap_mask, total_len) {
            Ok(map) => map,
            Err(error) => {
                warn!(
                    "MatrixMap: {}, falling back to 1x{} strip",
                    error,
                    total_len
                );
                Self::strip(total_len)
            }
        }
    }

    /// Build the mapping for `panels` on a device with `total_len` LEDs.
    ///
    /// The matrix is the bounding box of all panels. Panels are scanned in list
    /// order; each scanned cell consults `gap_mask`:
    ///
    /// - [`Gap::Active`] (or no mask): the cell gets the next physical index.
    /// - [`Gap::Inactive`]: the cell stays unmapped but a physical index is used up.
    /// - [`Gap::Missing`]: the cell stays unmapped and no index is used up.
    ///
    /// A mask shorter than the matrix is ignored. Later panels overwrite earlier
    /// ones where they overlap; the number of overwritten cells is available
    /// from [`Self::overlap_count`].
    ///
    /// # Errors
    ///
    /// - [`Error::CapacityExceeded`] if `total_len` is larger than `N`.
    /// - [`Error::MatrixBounds`] if either matrix dimension is 1 or less, or the
    ///   matrix has more cells than `N` or `total_len`.
    /// - [`Error::PixelCountOverflow`] if the panels map more LEDs than `total_len`.
    pub fn try_build(
        panels: &[Panel],
        gap_mask: Option<&GapMask<N>>,
        total_len: u16,
    ) -> Result<Self> {
        let () = Self::CAPACITY_FITS_U16;
        let total = usize::from(total_len);
        if total > N {
            return Err(Error::CapacityExceeded {
                requested: total,
                capacity: N,
            });
        }

        let (width, height) = bounding_box(panels);
        let area = width as usize * height as usize;
        if width <= 1 || height <= 1 || area > N || area > total {
            return Err(Error::MatrixBounds {
                width: saturate_u16(width),
                height: saturate_u16(height),
            });
        }
        // Both fit in u16: their product fits in N < 0xFFFF.
        let (width, height) = (width as u16, height as u16);

        let mut table: Vec<u16, N> = Vec::new();
        table
            .resize(total, UNMAPPED)
            .map_err(|()| Error::CapacityExceeded {
                requested: total,
                capacity: N,
            })?;
        for (position, entry) in table.iter_mut().enumerate().skip(area) {
            *entry = position as u16;
        }

        let gap_mask = gap_mask.filter(|mask| {
            let usable = mask.len() >= area;
            if !usable {
                debug!(
                    "MatrixMap: ignoring gap mask of {} cells for {} matrix cells",
                    mask.len(),
                    area
                );
            }
            usable
        });

        let mut next_pixel: usize = 0;
        let mut overlap_count: u16 = 0;
        for panel in panels {
            for (local_x, local_y) in panel.scan() {
                let row = usize::from(panel.y_offset) + usize::from(local_y);
                let column = usize::from(panel.x_offset) + usize::from(local_x);
                let index = row * usize::from(width) + column;
                let gap = gap_mask
                    .and_then(|mask| mask.get(index))
                    .unwrap_or(Gap::Active);

                if gap.is_addressable() {
                    if next_pixel >= total {
                        return Err(Error::PixelCountOverflow);
                    }
                    let entry = table.get_mut(index).ok_or(Error::MatrixBounds {
                        width,
                        height,
                    })?;
                    if *entry != UNMAPPED {
                        overlap_count = overlap_count.saturating_add(1);
                    }
                    *entry = next_pixel as u16;
                }
                if gap.consumes_address() {
                    next_pixel += 1;
                }
            }
        }

        if overlap_count > 0 {
            warn!(
                "MatrixMap: panels overlap, {} cells overwritten by later panels",
                overlap_count
            );
        }
        info!(
            "MatrixMap: {}x{} matrix, {} LED addresses used of {}",
            width,
            height,
            next_pixel,
            total
        );

        Ok(Self {
            width,
            height,
            total_len,
            table,
            overlap_count,
        })
    }

    /// Matrix or 1-row fallback.
    #[must_use]
    pub fn mode(&self) -> MatrixMode {
        if self.table.is_empty() {
            MatrixMode::Strip
        } else {
            MatrixMode::Matrix
        }
    }

    /// True in [`MatrixMode::Matrix`].
    #[must_use]
    pub fn is_matrix(&self) -> bool {
        self.mode() == MatrixMode::Matrix
    }

    /// Width in logical cells (the strip length in fallback mode).
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in logical cells (1 in fallback mode).
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Total number of LEDs on the device.
    #[must_use]
    pub const fn total_len(&self) -> u16 {
        self.total_len
    }

    /// Number of cells a later panel overwrote while building.
    #[must_use]
    pub const fn overlap_count(&self) -> u16 {
        self.overlap_count
    }

    /// The dense table with [`UNMAPPED`] for empty cells. Empty in fallback mode.
    #[must_use]
    pub fn raw(&self) -> &[u16] {
        &self.table
    }

    /// Physical LED index at logical cell `(x, y)`, if an LED is there.
    #[must_use]
    pub fn physical_index(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.logical_to_physical(usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    /// Physical LED index at row-major logical `position`, if an LED is there.
    ///
    /// Positions past the matrix reach the trailing LEDs.
    #[must_use]
    pub fn logical_to_physical(&self, position: usize) -> Option<u16> {
        match self.mode() {
            MatrixMode::Strip => {
                (position < usize::from(self.total_len)).then_some(position as u16)
            }
            MatrixMode::Matrix => self
                .table
                .get(position)
                .copied()
                .filter(|&index| index != UNMAPPED),
        }
    }

    /// Check the invariants a freshly built map holds. Used after loading a
    /// map from storage.
    pub(crate) fn is_consistent(&self) -> bool {
        let total = usize::from(self.total_len);
        if total > N {
            return false;
        }
        match self.mode() {
            MatrixMode::Strip => self.height == 1 && self.width == self.total_len,
            MatrixMode::Matrix => {
                let area = usize::from(self.width) * usize::from(self.height);
                self.width > 1
                    && self.height > 1
                    && area <= total
                    && self.table.len() == total
                    && self
                        .table
                        .iter()
                        .all(|&index| index == UNMAPPED || usize::from(index) < total)
            }
        }
    }
}

fn bounding_box(panels: &[Panel]) -> (u32, u32) {
    panels.iter().fold((1, 1), |(width, height), panel| {
        (width.max(panel.right_edge()), height.max(panel.bottom_edge()))
    })
}

fn saturate_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
