use aire_image::{Image, ImageError};

use super::spaces::*;
use super::TransferFunction;
use crate::parallel;

/// Working representation of the colour channels.
///
/// Every variant except [`ColorSpace::Srgb`] first linearizes the encoded samples
/// with its [`TransferFunction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// Encoded samples scaled to `[0, 1]`.
    Srgb,
    /// Linear light.
    Linear(TransferFunction),
    /// CIE XYZ.
    Xyz(TransferFunction),
    /// CIE L*a*b*.
    Lab(TransferFunction),
    /// CIE L*u*v*.
    Luv(TransferFunction),
    /// LCh(uv), hue in degrees.
    LCh(TransferFunction),
    /// Oklab.
    Oklab(TransferFunction),
    /// Jzazbz.
    Jzazbz(TransferFunction),
}

impl Default for ColorSpace {
    fn default() -> Self {
        ColorSpace::Linear(TransferFunction::Srgb)
    }
}

impl ColorSpace {
    /// The transfer function used to linearize, `None` for [`ColorSpace::Srgb`].
    pub fn transfer(&self) -> Option<TransferFunction> {
        match *self {
            ColorSpace::Srgb => None,
            ColorSpace::Linear(tf)
            | ColorSpace::Xyz(tf)
            | ColorSpace::Lab(tf)
            | ColorSpace::Luv(tf)
            | ColorSpace::LCh(tf)
            | ColorSpace::Oklab(tf)
            | ColorSpace::Jzazbz(tf) => Some(tf),
        }
    }

    /// Map linear RGB into this space.
    #[inline]
    pub fn from_linear(&self, rgb: [f32; 3]) -> [f32; 3] {
        match self {
            ColorSpace::Srgb | ColorSpace::Linear(_) => rgb,
            ColorSpace::Xyz(_) => rgb_to_xyz(rgb),
            ColorSpace::Lab(_) => xyz_to_lab(rgb_to_xyz(rgb)),
            ColorSpace::Luv(_) => xyz_to_luv(rgb_to_xyz(rgb)),
            ColorSpace::LCh(_) => luv_to_lch(xyz_to_luv(rgb_to_xyz(rgb))),
            ColorSpace::Oklab(_) => linear_to_oklab(rgb),
            ColorSpace::Jzazbz(_) => xyz_to_jzazbz(rgb_to_xyz(rgb)),
        }
    }

    /// Map a triple of this space back to linear RGB.
    #[inline]
    pub fn to_linear(&self, v: [f32; 3]) -> [f32; 3] {
        match self {
            ColorSpace::Srgb | ColorSpace::Linear(_) => v,
            ColorSpace::Xyz(_) => xyz_to_rgb(v),
            ColorSpace::Lab(_) => xyz_to_rgb(lab_to_xyz(v)),
            ColorSpace::Luv(_) => xyz_to_rgb(luv_to_xyz(v)),
            ColorSpace::LCh(_) => xyz_to_rgb(luv_to_xyz(lch_to_luv(v))),
            ColorSpace::Oklab(_) => oklab_to_linear(v),
            ColorSpace::Jzazbz(_) => xyz_to_rgb(jzazbz_to_xyz(v)),
        }
    }
}

fn ensure_color_channels<const C: usize>() -> Result<(), ImageError> {
    if C < 3 {
        return Err(ImageError::UnsupportedConfiguration(format!(
            "colorspace conversion needs at least 3 channels, got {C}"
        )));
    }
    Ok(())
}

/// Convert an 8-bit raster into an `f32` working buffer.
///
/// The first three channels are decoded into `space`; any further channel
/// (alpha) is scaled to `[0, 1]`.
///
/// # Errors
///
/// Returns an error if the raster has fewer than three channels.
///
/// # Examples
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::color::{to_working, ColorSpace, TransferFunction};
///
/// let img = Image::<u8, 4>::new([1, 1].into(), vec![255, 255, 255, 128]).unwrap();
/// let work = to_working(&img, ColorSpace::Linear(TransferFunction::Srgb)).unwrap();
/// assert_eq!(work.as_slice()[0], 1.0);
/// ```
pub fn to_working<const C: usize>(
    src: &Image<u8, C>,
    space: ColorSpace,
) -> Result<Image<f32, C>, ImageError> {
    ensure_color_channels::<C>()?;
    log::trace!("to_working: {} {space:?}", src.size());

    let lut: [f32; 256] = match space.transfer() {
        Some(tf) => tf.linearization_table(),
        None => std::array::from_fn(|i| i as f32 / 255.0),
    };

    let mut dst = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    parallel::par_iter_rows(src, &mut dst, |src_pixel, dst_pixel| {
        let rgb = [
            lut[src_pixel[0] as usize],
            lut[src_pixel[1] as usize],
            lut[src_pixel[2] as usize],
        ];
        dst_pixel[..3].copy_from_slice(&space.from_linear(rgb));
        for (d, &s) in dst_pixel[3..].iter_mut().zip(&src_pixel[3..]) {
            *d = s as f32 / 255.0;
        }
    });
    Ok(dst)
}

/// Convert a working buffer produced by [`to_working`] back to 8-bit samples.
///
/// Out-of-gamut values are clipped.
///
/// # Errors
///
/// Returns an error if the raster has fewer than three channels.
pub fn from_working<const C: usize>(
    src: &Image<f32, C>,
    space: ColorSpace,
) -> Result<Image<u8, C>, ImageError> {
    ensure_color_channels::<C>()?;
    log::trace!("from_working: {} {space:?}", src.size());

    let tf = space.transfer();
    let encode = |v: f32| -> u8 {
        let e = match tf {
            Some(tf) => tf.gamma(v),
            None => v,
        };
        (e * 255.0).round().clamp(0.0, 255.0) as u8
    };

    let mut dst = Image::<u8, C>::from_size_val(src.size(), 0)?;
    parallel::par_iter_rows(src, &mut dst, |src_pixel, dst_pixel| {
        let rgb = space.to_linear([src_pixel[0], src_pixel[1], src_pixel[2]]);
        for (d, v) in dst_pixel.iter_mut().zip(rgb) {
            *d = encode(v);
        }
        for (d, &s) in dst_pixel[3..].iter_mut().zip(&src_pixel[3..]) {
            *d = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    });
    Ok(dst)
}
