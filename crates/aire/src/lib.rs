//! Bitmap transform toolkit.
//!
//! The [`image`] crate holds the raster model and error types, [`imgproc`] holds
//! every transform.

#[doc(inline)]
pub use aire_image as image;

#[doc(inline)]
pub use aire_imgproc as imgproc;
