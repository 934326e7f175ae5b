//! Pointwise tone and grading operators.
//!
//! Every operator maps the first three channels of an 8-bit raster and copies
//! any further channel (alpha) unchanged. Tone mappers work on linear sRGB,
//! grading operators on the encoded samples scaled to `[0, 1]`.

mod adjust;
mod matrix;
mod tone_map;

pub use adjust::*;
pub use matrix::*;
pub use tone_map::*;

use aire_image::{Image, ImageError};

use crate::color::TransferFunction;
use crate::parallel;

pub(crate) fn ensure_rgb<const C: usize>(op: &'static str) -> Result<(), ImageError> {
    if C < 3 {
        return Err(ImageError::UnsupportedConfiguration(format!(
            "{op} needs at least 3 channels, got {C}"
        )));
    }
    Ok(())
}

#[inline]
fn encode(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Apply `f` to the colour channels scaled to `[0, 1]`.
pub(crate) fn map_encoded<const C: usize>(
    src: &Image<u8, C>,
    op: &'static str,
    f: impl Fn([f32; 3]) -> [f32; 3] + Send + Sync,
) -> Result<Image<u8, C>, ImageError> {
    ensure_rgb::<C>(op)?;
    let mut dst = Image::<u8, C>::from_size_val(src.size(), 0)?;
    parallel::par_iter_rows(src, &mut dst, |s, d| {
        let rgb = f([
            s[0] as f32 / 255.0,
            s[1] as f32 / 255.0,
            s[2] as f32 / 255.0,
        ]);
        for (out, v) in d.iter_mut().zip(rgb) {
            *out = encode(v);
        }
        d[3..].copy_from_slice(&s[3..]);
    });
    Ok(dst)
}

/// Apply `f` to the colour channels decoded to linear sRGB.
pub(crate) fn map_linear<const C: usize>(
    src: &Image<u8, C>,
    op: &'static str,
    f: impl Fn([f32; 3]) -> [f32; 3] + Send + Sync,
) -> Result<Image<u8, C>, ImageError> {
    ensure_rgb::<C>(op)?;
    let tf = TransferFunction::Srgb;
    let lut = tf.linearization_table();
    let mut dst = Image::<u8, C>::from_size_val(src.size(), 0)?;
    parallel::par_iter_rows(src, &mut dst, |s, d| {
        let rgb = f([lut[s[0] as usize], lut[s[1] as usize], lut[s[2] as usize]]);
        for (out, v) in d.iter_mut().zip(rgb) {
            *out = encode(tf.gamma(v));
        }
        d[3..].copy_from_slice(&s[3..]);
    });
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_maps_are_lossless() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_fn([16, 16].into(), |x, y| {
            [(x * 16) as u8, (y * 16) as u8, (x * y) as u8, 77]
        });
        assert_eq!(map_encoded(&img, "identity", |rgb| rgb)?, img);
        assert_eq!(map_linear(&img, "identity", |rgb| rgb)?, img);
        Ok(())
    }

    #[test]
    fn gray_rasters_are_rejected() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        assert!(matches!(
            map_encoded(&img, "identity", |rgb| rgb),
            Err(ImageError::UnsupportedConfiguration(_))
        ));
        Ok(())
    }
}
