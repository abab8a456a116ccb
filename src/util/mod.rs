//! Utility types and functions for the XNB loader.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam plus [`Color`] and [`BoundingSphere`]

mod error;
mod math;

pub use error::*;
pub use math::*;
