//! Utility types and functions for autoguide.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - [`BoundingRange`] and math type re-exports from glam

mod error;
mod math;

pub use error::*;
pub use math::*;
