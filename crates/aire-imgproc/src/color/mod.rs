//! Colorspace conversions.
//!
//! Pixel-level converters operate on `[f32; 3]` triples, image-level helpers
//! move whole rasters between the 8-bit storage encoding and `f32` working
//! buffers.

mod hsv;
mod spaces;
mod transfer;
mod working;
mod yuv;

pub use hsv::{hsl_to_rgb, hsv_to_rgb, rgb_to_hsl, rgb_to_hsv};
pub use spaces::*;
pub use transfer::TransferFunction;
pub use working::{from_working, to_working, ColorSpace};
pub use yuv::{rgb_to_yuv, yuv_to_rgb};
