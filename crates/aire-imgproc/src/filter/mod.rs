//! Filter operations
//!
//! Generic 2D and separable convolution with edge handling, the kernel
//! builders shared by the blur family, and edge-detection style operators.

/// Filter kernels
pub mod kernels;

mod kernel;
pub use kernel::*;

/// Dense 2D convolution
mod convolve;
pub use convolve::*;

/// Filter operations
pub(crate) mod ops;
pub use ops::*;

/// Separable filter operations
mod separable_filter;
pub use separable_filter::*;
