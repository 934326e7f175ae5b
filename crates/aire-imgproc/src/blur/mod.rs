//! Blur family.
//!
//! Every blur reads one image and produces a new one of the same shape. The
//! running-sum approximations (box, tent, gaussian box, stack, fast gaussian)
//! share one sliding-window engine; the kernel based ones feed the
//! convolution engine in [`crate::filter`].
//!
//! The `linear_*` variants decode 8-bit samples to linear light with a
//! [`TransferFunction`](crate::color::TransferFunction), filter, and re-encode.

use aire_image::{Image, ImageDtype, ImageError};

use crate::border::Scalar;
use crate::color::{from_working, to_working, ColorSpace, TransferFunction};
use crate::filter::ops::{from_f32, to_f32};

mod running;

mod anisotropic;
pub use anisotropic::*;

mod bilateral;
pub use bilateral::*;

mod bokeh;
pub use bokeh::*;

mod box_blur;
pub use box_blur::*;

mod fast_gaussian;
pub use fast_gaussian::*;

mod gaussian;
pub use gaussian::*;

mod linear;
pub use linear::*;

mod median;
pub use median::*;

mod motion;
pub use motion::*;

mod poisson;
pub use poisson::*;

mod stack_blur;
pub use stack_blur::*;

mod tilt_shift;
pub use tilt_shift::*;

mod zoom;
pub use zoom::*;

/// Run an `f32` engine over samples of any type, keeping their scale.
pub(crate) fn on_f32<T, const C: usize>(
    src: &Image<T, C>,
    engine: impl FnOnce(&Image<f32, C>) -> Result<Image<f32, C>, ImageError>,
) -> Result<Image<T, C>, ImageError>
where
    T: ImageDtype,
{
    let work = to_f32(src)?;
    Ok(from_f32(&engine(&work)?))
}

/// Run an `f32` engine in linear light.
pub(crate) fn on_linear<const C: usize>(
    src: &Image<u8, C>,
    transfer: TransferFunction,
    engine: impl FnOnce(&Image<f32, C>) -> Result<Image<f32, C>, ImageError>,
) -> Result<Image<u8, C>, ImageError> {
    let space = ColorSpace::Linear(transfer);
    let work = to_working(src, space)?;
    from_working(&engine(&work)?, space)
}

/// The constant border of `scalar` in the unscaled `f32` domain of `T`.
pub(crate) fn border_f32<T: ImageDtype, const C: usize>(scalar: Scalar) -> [f32; C] {
    scalar.channels::<T, C>().map(Into::into)
}
