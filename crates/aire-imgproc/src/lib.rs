#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// out-of-bounds sampling policies.
pub mod border;

/// blur family built on the convolution engine.
pub mod blur;

/// colorspace conversions and transfer functions.
pub mod color;

/// encoder collaborator interfaces.
pub mod encode;

/// generic convolution engine and kernel builders.
pub mod filter;

/// histogram equalization and CLAHE.
pub mod histogram;

/// resampling kernels.
pub mod interpolation;

/// morphological operations.
pub mod morphology;

/// uniform operation boundary.
pub mod operation;

/// module containing parallelization utilities.
pub mod parallel;

/// palette quantization and dithering.
pub mod quantize;

/// utility functions for resizing images.
pub mod resize;

/// pointwise tone and grading operators.
pub mod tone;

pub use border::{EdgeMode, Scalar};
pub use operation::Operation;
