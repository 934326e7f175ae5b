use aire_image::{Image, ImageDtype, ImageError};

use crate::border::{AxisMap, EdgeMode, Scalar};
use crate::filter::kernels;
use crate::parallel;

/// Parameters of [`bilateral_blur`] and [`fast_bilateral_blur`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BilateralConfig {
    /// Window size, odd.
    pub kernel_size: usize,
    /// Spatial sigma in pixels, `0` derives it from the kernel size.
    pub spatial_sigma: f32,
    /// Range sigma on samples scaled to `[0, 1]`, `> 0`.
    pub range_sigma: f32,
    /// Out-of-bounds policy.
    pub edge_mode: EdgeMode,
    /// Fill value for [`EdgeMode::Constant`].
    pub border: Scalar,
}

impl Default for BilateralConfig {
    fn default() -> Self {
        Self {
            kernel_size: 9,
            spatial_sigma: 0.0,
            range_sigma: 0.1,
            edge_mode: EdgeMode::Reflect101,
            border: Scalar::default(),
        }
    }
}

impl BilateralConfig {
    /// Bilateral filter with the given window and sigmas.
    pub fn new(kernel_size: usize, spatial_sigma: f32, range_sigma: f32) -> Self {
        Self {
            kernel_size,
            spatial_sigma,
            range_sigma,
            ..Default::default()
        }
    }

    /// Set the edge mode.
    pub fn with_edge_mode(mut self, edge_mode: EdgeMode) -> Self {
        self.edge_mode = edge_mode;
        self
    }

    /// Set the constant border.
    pub fn with_border(mut self, border: Scalar) -> Self {
        self.border = border;
        self
    }

    /// Check the window and sigmas.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel size is even, the spatial sigma is negative
    /// or the range sigma is not positive.
    pub fn validate(&self) -> Result<(), ImageError> {
        kernels::ensure_odd(self.kernel_size)?;
        kernels::ensure_sigma(self.spatial_sigma)?;
        if !(self.range_sigma.is_finite() && self.range_sigma > 0.0) {
            return Err(ImageError::InvalidSigma(self.range_sigma));
        }
        Ok(())
    }
}

/// Edge preserving blur.
///
/// Each tap is weighted by a spatial gaussian of its distance to the center and
/// a range gaussian of its colour distance to the center pixel. Colour distance
/// uses at most the first three channels; every channel is blended.
///
/// # Errors
///
/// Returns an error if the config is invalid.
pub fn bilateral_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &BilateralConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    log::debug!(
        "bilateral_blur: {} kernel {} sigmas {} {}",
        src.size(),
        config.kernel_size,
        config.spatial_sigma,
        config.range_sigma
    );
    Ok(bilateral(src, config, 1))
}

/// Bilateral blur sampling every other tap of the window.
///
/// # Errors
///
/// Returns an error if the config is invalid.
pub fn fast_bilateral_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &BilateralConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    log::debug!(
        "fast_bilateral_blur: {} kernel {} sigmas {} {}",
        src.size(),
        config.kernel_size,
        config.spatial_sigma,
        config.range_sigma
    );
    Ok(bilateral(src, config, 2))
}

fn bilateral<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &BilateralConfig,
    step: usize,
) -> Image<T, C> {
    let r = config.kernel_size / 2;
    let spatial_sigma = if config.spatial_sigma > 0.0 {
        config.spatial_sigma
    } else {
        kernels::default_sigma(config.kernel_size)
    };

    let offsets: Vec<isize> = (-(r as isize)..=r as isize)
        .filter(|i| i.rem_euclid(step as isize) == 0)
        .collect();
    let taps: Vec<(isize, isize, f32)> = offsets
        .iter()
        .flat_map(|&dy| offsets.iter().map(move |&dx| (dx, dy)))
        .map(|(dx, dy)| {
            let d2 = (dx * dx + dy * dy) as f32;
            let w = if spatial_sigma > 0.0 {
                (-d2 / (2.0 * spatial_sigma * spatial_sigma)).exp()
            } else if d2 == 0.0 {
                1.0
            } else {
                0.0
            };
            (dx, dy, w)
        })
        .filter(|&(_, _, w)| w > 0.0)
        .collect();

    let range_coeff = -1.0 / (2.0 * config.range_sigma * config.range_sigma);
    let scale = 1.0 / T::MAX;
    let color_channels = C.min(3);
    let border: [f32; C] = config.border.channels::<T, C>().map(Into::into);

    let map_x = AxisMap::new(config.edge_mode, src.width(), r, r);
    let map_y = AxisMap::new(config.edge_mode, src.height(), r, r);
    let stride = src.row_stride();

    let mut dst = src.clone();
    parallel::par_rows_mut(dst.as_slice_mut(), stride, |y, dst_row| {
        for (x, out) in dst_row.chunks_exact_mut(C).enumerate() {
            let center: [f32; C] = {
                let px = src.pixel(x, y);
                std::array::from_fn(|c| px[c].into())
            };
            let mut acc = [0f32; C];
            let mut weight_sum = 0f32;
            for &(dx, dy, spatial) in &taps {
                let sample: [f32; C] = match (
                    map_x.get(x as isize + dx),
                    map_y.get(y as isize + dy),
                ) {
                    (Some(sx), Some(sy)) => {
                        let px = src.pixel(sx, sy);
                        std::array::from_fn(|c| px[c].into())
                    }
                    _ => border,
                };
                let dist2: f32 = (0..color_channels)
                    .map(|c| {
                        let d = (sample[c] - center[c]) * scale;
                        d * d
                    })
                    .sum();
                let w = spatial * (dist2 * range_coeff).exp();
                weight_sum += w;
                for c in 0..C {
                    acc[c] += w * sample[c];
                }
            }
            // the center tap always contributes, so the sum is positive
            for c in 0..C {
                out[c] = T::from_f32(acc[c] / weight_sum);
            }
        }
    });
    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_edge() -> Image<u8, 3> {
        Image::from_fn([12, 6].into(), |x, _| if x < 6 { [20; 3] } else { [230; 3] })
    }

    #[test]
    fn preserves_strong_edges() -> Result<(), ImageError> {
        let img = step_edge();
        let out = bilateral_blur(&img, &BilateralConfig::new(7, 2.0, 0.05))?;
        assert_eq!(out, img);
        let out = fast_bilateral_blur(&img, &BilateralConfig::new(7, 2.0, 0.05))?;
        assert_eq!(out, img);
        Ok(())
    }

    #[test]
    fn smooths_weak_noise() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_fn([9, 9].into(), |x, y| [if (x + y) % 2 == 0 { 100 } else { 104 }]);
        let out = bilateral_blur(&img, &BilateralConfig::new(5, 2.0, 0.5))?;
        let center = out.pixel(4, 4)[0];
        assert!((101..=103).contains(&center), "{center}");
        Ok(())
    }

    #[test]
    fn range_sigma_must_be_positive() -> Result<(), ImageError> {
        let img = step_edge();
        assert_eq!(
            bilateral_blur(&img, &BilateralConfig::new(5, 1.0, 0.0)),
            Err(ImageError::InvalidSigma(0.0))
        );
        assert_eq!(
            fast_bilateral_blur(&img, &BilateralConfig::new(4, 1.0, 0.1)),
            Err(ImageError::InvalidKernelSize(4))
        );
        Ok(())
    }
}
