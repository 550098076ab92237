//! Per-cell gap mask consumed while building a [`MatrixMap`](super::MatrixMap).
//!
//! A gap mask marks matrix cells that have no LED at all ([`Gap::Missing`]),
//! cells whose LED is wired but must stay dark ([`Gap::Inactive`]), and
//! normal cells ([`Gap::Active`]). It only matters while the mapping is built
//! and can be dropped afterwards.
//!
//! On disk the mask is a flat JSON array of integers, one per matrix cell in
//! row-major order. Values are clamped: anything below zero is missing, zero is
//! inactive, anything above zero is active.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What occupies one matrix cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gap {
    /// No LED exists here; the cell uses no electrical address.
    Missing,
    /// An LED exists and uses an address, but is not addressable from the grid.
    Inactive,
    /// An LED exists and is addressable.
    #[default]
    Active,
}

impl Gap {
    /// Clamp a raw gap-file value to `{-1, 0, 1}`.
    #[must_use]
    pub const fn from_raw(value: i64) -> Self {
        if value < 0 {
            Self::Missing
        } else if value == 0 {
            Self::Inactive
        } else {
            Self::Active
        }
    }

    /// The raw gap-file value for this cell.
    #[must_use]
    pub const fn to_raw(self) -> i8 {
        match self {
            Self::Missing => -1,
            Self::Inactive => 0,
            Self::Active => 1,
        }
    }

    /// True if the cell is reachable through the logical grid.
    #[must_use]
    pub const fn is_addressable(self) -> bool {
        matches!(self, Self::Active)
    }

    /// True if the cell consumes a physical LED address.
    #[must_use]
    pub const fn consumes_address(self) -> bool {
        !matches!(self, Self::Missing)
    }
}

/// Gap values for up to `N` matrix cells in row-major order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GapMask<const N: usize> {
    gaps: Vec<Gap, N>,
}

impl<const N: usize> GapMask<N> {
    /// Build a mask from raw gap-file values.
    ///
    /// Entries past `N` cannot matter to any matrix this crate can map and are
    /// dropped.
    pub fn from_values(values: impl IntoIterator<Item = i64>) -> Self {
        let mut gaps = Vec::new();
        let mut dropped = 0_usize;
        for value in values {
            if gaps.push(Gap::from_raw(value)).is_err() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!("GapMask: ignored {} entries past capacity {}", dropped, N);
        }
        Self { gaps }
    }

    /// Build a mask from already-typed gap values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if `gaps` holds more than `N` values.
    pub fn from_gaps(gaps: &[Gap]) -> Result<Self> {
        Vec::from_slice(gaps)
            .map(|gaps| Self { gaps })
            .map_err(|()| Error::CapacityExceeded {
                requested: gaps.len(),
                capacity: N,
            })
    }

    /// Parse a gap file: a flat JSON array of integers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GapMaskFormat`] if the text is not a JSON array of integers.
    #[cfg(feature = "std")]
    pub fn from_json(text: &str) -> Result<Self> {
        let values: std::vec::Vec<i64> =
            serde_json::from_str(text).map_err(|_| Error::GapMaskFormat)?;
        Ok(Self::from_values(values))
    }

    /// Number of cells described.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gaps.len()
    }

    /// True if no cells are described.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }

    /// Gap value of the cell at row-major `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Gap> {
        self.gaps.get(index).copied()
    }

    /// All gap values in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[Gap] {
        &self.gaps
    }
}
