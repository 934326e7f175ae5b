use aire_image::{Image, ImageDtype, ImageError};

use super::on_f32;
use crate::parallel;

/// Parameters of [`anisotropic_diffusion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnisotropicDiffusionConfig {
    /// Number of iterations. All of them run.
    pub steps: usize,
    /// Edge threshold `K` of the conduction function, on samples scaled to `[0, 1]`.
    pub conduction: f32,
    /// Step size `lambda`, in `[0, 0.25]`.
    pub diffusion: f32,
}

impl Default for AnisotropicDiffusionConfig {
    fn default() -> Self {
        Self {
            steps: 20,
            conduction: 0.1,
            diffusion: 0.01,
        }
    }
}

impl AnisotropicDiffusionConfig {
    /// Check the coefficients.
    ///
    /// # Errors
    ///
    /// Returns an error if the conduction is not positive or the diffusion is
    /// outside `[0, 0.25]`.
    pub fn validate(&self) -> Result<(), ImageError> {
        if !(self.conduction.is_finite() && self.conduction > 0.0) {
            return Err(ImageError::InvalidParameter(
                "conduction",
                format!("must be > 0, got {}", self.conduction),
            ));
        }
        if !(0.0..=0.25).contains(&self.diffusion) {
            return Err(ImageError::InvalidParameter(
                "diffusion",
                format!("must be in [0, 0.25], got {}", self.diffusion),
            ));
        }
        Ok(())
    }
}

/// Perona-Malik conduction `1 / (1 + (d / k)^2)`.
#[inline]
fn conduction(d: f32, k: f32) -> f32 {
    let q = d / k;
    1.0 / (1.0 + q * q)
}

/// Perona-Malik diffusion over the four axis neighbours.
///
/// Every step reads only the completed result of the previous step. The alpha
/// channel of a 4-channel raster is left untouched; edges are clamped.
///
/// # Errors
///
/// Returns an error if the config is invalid.
pub fn anisotropic_diffusion<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &AnisotropicDiffusionConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    log::debug!(
        "anisotropic_diffusion: {} steps {} conduction {} diffusion {}",
        src.size(),
        config.steps,
        config.conduction,
        config.diffusion
    );

    let processed = if C == 4 { 3 } else { C };
    let scale = 1.0 / T::MAX;
    let k = config.conduction;
    let lambda = config.diffusion;

    on_f32(src, |work| {
        let (width, height) = (work.width(), work.height());
        let stride = work.row_stride();
        let mut current = work.clone();
        let mut next = work.clone();
        for step in 0..config.steps {
            let cur = current.as_slice();
            parallel::par_rows_mut(next.as_slice_mut(), stride, |y, row| {
                let up = y.saturating_sub(1);
                let down = (y + 1).min(height - 1);
                for x in 0..width {
                    let left = x.saturating_sub(1);
                    let right = (x + 1).min(width - 1);
                    for c in 0..processed {
                        let at = |xx: usize, yy: usize| cur[yy * stride + xx * C + c];
                        let v = at(x, y);
                        let flux: f32 = [at(x, up), at(x, down), at(left, y), at(right, y)]
                            .into_iter()
                            .map(|n| {
                                let d = (n - v) * scale;
                                conduction(d, k) * d
                            })
                            .sum();
                        row[x * C + c] = v + lambda * flux / scale;
                    }
                }
            });
            std::mem::swap(&mut current, &mut next);
            log::trace!("anisotropic_diffusion: step {step} done");
        }
        Ok(current)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_is_stationary() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_size_val([8, 8].into(), 90)?;
        let out = anisotropic_diffusion(&img, &AnisotropicDiffusionConfig::default())?;
        assert_eq!(out, img);
        Ok(())
    }

    #[test]
    fn noise_decreases_and_alpha_is_kept() -> Result<(), ImageError> {
        let img = Image::<f32, 4>::from_fn([8, 8].into(), |x, y| {
            let v = if (x + y) % 2 == 0 { 0.45 } else { 0.55 };
            [v, v, v, 0.3]
        });
        let config = AnisotropicDiffusionConfig {
            steps: 10,
            conduction: 0.5,
            diffusion: 0.1,
        };
        let out = anisotropic_diffusion(&img, &config)?;
        let spread = |im: &Image<f32, 4>| {
            let vals: Vec<f32> = im.as_slice().chunks_exact(4).map(|p| p[0]).collect();
            let max = vals.iter().cloned().fold(f32::MIN, f32::max);
            let min = vals.iter().cloned().fold(f32::MAX, f32::min);
            max - min
        };
        assert!(spread(&out) < spread(&img));
        assert!(out.as_slice().chunks_exact(4).all(|p| p[3] == 0.3));
        Ok(())
    }

    #[test]
    fn zero_steps_copies() -> Result<(), ImageError> {
        let img = Image::<u8, 3>::from_fn([3, 3].into(), |x, y| [x as u8 * 50, y as u8, 1]);
        let config = AnisotropicDiffusionConfig {
            steps: 0,
            ..Default::default()
        };
        assert_eq!(anisotropic_diffusion(&img, &config)?, img);
        Ok(())
    }

    #[test]
    fn invalid_coefficients() -> Result<(), ImageError> {
        let img = Image::<u8, 3>::from_size_val([3, 3].into(), 0)?;
        let config = AnisotropicDiffusionConfig {
            diffusion: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            anisotropic_diffusion(&img, &config),
            Err(ImageError::InvalidParameter("diffusion", _))
        ));
        Ok(())
    }
}
