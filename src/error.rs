//! Crate-wide error type.

use derive_more::{Debug, Display, Error};

/// Errors produced while building or persisting a matrix mapping.
///
/// Per-pixel accessors never return errors; out-of-range reads and writes are
/// silent.
#[derive(Clone, Copy, Debug, Display, Error, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The panel bounding box is degenerate or larger than the device supports.
    #[display("matrix bounds {width}x{height} are invalid")]
    MatrixBounds {
        /// Bounding width in pixels.
        width: u16,
        /// Bounding height in pixels.
        height: u16,
    },
    /// A fixed-capacity buffer could not hold the requested length.
    #[display("requested {requested} entries but capacity is {capacity}")]
    CapacityExceeded {
        /// Entries requested.
        requested: usize,
        /// Compile-time capacity.
        capacity: usize,
    },
    /// The panels describe more physical LEDs than the device has.
    #[display("panels address more LEDs than the device has")]
    PixelCountOverflow,
    /// Gap-mask data was not a flat array of integers.
    #[display("gap mask is not an integer array")]
    GapMaskFormat,
    /// Serialization failed or the output buffer was too small.
    #[display("serialization failed")]
    FormatError,
    /// Stored data failed its length, checksum, or payload check.
    #[display("stored data is corrupted")]
    StorageCorrupted,
    /// Segment geometry does not fit the matrix.
    #[display("segment does not fit the matrix")]
    SegmentBounds,
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
