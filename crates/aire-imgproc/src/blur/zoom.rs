use aire_image::{Image, ImageDtype, ImageError};

use crate::filter::kernels;
use crate::parallel;

/// Parameters of [`zoom_blur`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBlurConfig {
    /// Number of samples along each ray, odd.
    pub kernel_size: usize,
    /// Sigma of the sample weights, `0` derives it from the kernel size.
    pub sigma: f32,
    /// Horizontal focal point as a fraction of the width, in `[0, 1]`.
    pub center_x: f32,
    /// Vertical focal point as a fraction of the height, in `[0, 1]`.
    pub center_y: f32,
    /// Step between samples in percent of the distance to the focal point.
    pub strength: f32,
}

impl Default for ZoomBlurConfig {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            sigma: 0.0,
            center_x: 0.5,
            center_y: 0.5,
            strength: 5.0,
        }
    }
}

impl ZoomBlurConfig {
    /// Move the focal point.
    pub fn with_center(mut self, center_x: f32, center_y: f32) -> Self {
        self.center_x = center_x;
        self.center_y = center_y;
        self
    }

    /// Set the strength.
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    /// Check the kernel, sigma and focal point.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel size is even, the sigma negative, the
    /// center outside `[0, 1]` or the strength not finite.
    pub fn validate(&self) -> Result<(), ImageError> {
        kernels::ensure_odd(self.kernel_size)?;
        kernels::ensure_sigma(self.sigma)?;
        for (name, v) in [("center_x", self.center_x), ("center_y", self.center_y)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ImageError::InvalidParameter(
                    name,
                    format!("must be in [0, 1], got {v}"),
                ));
            }
        }
        if !self.strength.is_finite() {
            return Err(ImageError::InvalidParameter(
                "strength",
                format!("must be finite, got {}", self.strength),
            ));
        }
        Ok(())
    }
}

/// Radial blur toward a focal point.
///
/// Every output pixel accumulates gaussian weighted samples taken along the
/// ray from the pixel to the focal point. Samples past the raster are clamped.
///
/// # Errors
///
/// Returns an error if the config is invalid.
pub fn zoom_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &ZoomBlurConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    let weights = kernels::gaussian_kernel_1d(config.kernel_size, config.sigma)?;
    log::debug!(
        "zoom_blur: {} kernel {} center ({}, {}) strength {}",
        src.size(),
        config.kernel_size,
        config.center_x,
        config.center_y,
        config.strength
    );

    let (width, height) = (src.width(), src.height());
    let stride = src.row_stride();
    let cx = (width as f32 * config.center_x).floor();
    let cy = (height as f32 * config.center_y).floor();
    let half = (weights.len() / 2) as f32;
    let (max_x, max_y) = (width.saturating_sub(1) as f32, height.saturating_sub(1) as f32);

    let mut dst = src.clone();
    parallel::par_rows_mut(dst.as_slice_mut(), stride, |y, dst_row| {
        for (x, out) in dst_row.chunks_exact_mut(C).enumerate() {
            let (px, py) = (x as f32, y as f32);
            let step_x = (cx - px) * config.strength / 100.0;
            let step_y = (cy - py) * config.strength / 100.0;
            let mut acc = [0f32; C];
            for (j, &w) in weights.iter().enumerate() {
                let m = j as f32 - half;
                let sx = (px + m * step_x).round().clamp(0.0, max_x) as usize;
                let sy = (py + m * step_y).round().clamp(0.0, max_y) as usize;
                let sample = src.pixel(sx, sy);
                for (a, &v) in acc.iter_mut().zip(sample) {
                    let v: f32 = v.into();
                    *a += w * v;
                }
            }
            for c in 0..C {
                out[c] = T::from_f32(acc[c]);
            }
        }
    });
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focal_point_is_sharp() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_fn([11, 11].into(), |x, y| [((x * 23 + y * 7) % 256) as u8]);
        let out = zoom_blur(&img, &ZoomBlurConfig::default().with_strength(20.0))?;
        // the step vanishes at the focal point (5, 5)
        assert_eq!(out.pixel(5, 5), img.pixel(5, 5));
        assert_ne!(out, img);
        Ok(())
    }

    #[test]
    fn zero_strength_is_identity() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_fn([6, 4].into(), |x, y| [x as u8, y as u8, 3, 255]);
        let out = zoom_blur(&img, &ZoomBlurConfig::default().with_strength(0.0))?;
        assert_eq!(out, img);
        Ok(())
    }

    #[test]
    fn center_out_of_range() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_size_val([2, 2].into(), 0)?;
        let res = zoom_blur(&img, &ZoomBlurConfig::default().with_center(1.5, 0.5));
        assert!(matches!(res, Err(ImageError::InvalidParameter("center_x", _))));
        Ok(())
    }
}
