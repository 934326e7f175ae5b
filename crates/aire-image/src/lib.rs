#![deny(missing_docs)]
//! Raster types and errors shared by the aire image transforms.

/// raster representation used by every transform.
pub mod image;

/// Error types for the image transforms.
pub mod error;

/// Elementwise operations between rasters.
pub mod ops;

pub use crate::error::{ErrorKind, ImageError};
pub use crate::image::{Image, ImageDtype, ImageSize};
