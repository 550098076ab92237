//! 2D addressing and compositing core for addressable-LED matrices.
//!
//! Three layers, built leaf-first:
//!
//! - [`led2d`]: turns a list of LED panels (plus an optional gap mask) into a
//!   logical-to-physical [`MatrixMap`](led2d::MatrixMap), falling back to a
//!   single row when the panels do not form a valid matrix.
//! - [`segment`]: rectangular [`Segment`](segment::Segment)s of that grid with
//!   flips, transposition, grouping, mirroring, and brightness applied on every
//!   read and write.
//! - [`segment::transition`]: composites two snapshots of a segment into the
//!   live frame with fade, swipe, push, and fairy-dust transitions.
//!
//! [`led_strip`] holds the physical pixel buffer the other layers write through.
//!
//! Everything is `no_std` and allocation-free: const generics size every
//! buffer. Enable `std` for gap-mask JSON parsing, `host` for PNG previews, and
//! `defmt` for logging.
//!
//! # Glossary
//!
//! - **Physical pixel:** a position on the LED wire, `0..total_len`.
//! - **Logical cell:** an `(x, y)` position in the matrix bounding box.
//! - **Virtual pixel:** an `(x, y)` position in a segment's own transformed,
//!   grouped coordinate space.
//! - **Panel:** a rectangle of LEDs with its own wiring order.
//! - **Serpentine:** every other line of a panel runs in the opposite direction.
//! - **Grouping:** number of physical cells per virtual pixel along each axis.
//! - **Progress:** 16-bit transition counter, `0` = start, `0xFFFF` = done.
#![cfg_attr(not(feature = "std"), no_std)]

// Logging macros; declared first so every module sees them.
#[macro_use]
mod fmt;

mod error;
pub mod led2d;
pub mod led_strip;
pub mod segment;
#[cfg(feature = "host")]
pub mod to_png;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
