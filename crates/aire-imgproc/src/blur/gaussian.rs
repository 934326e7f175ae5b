use aire_image::{Image, ImageDtype, ImageError};

use crate::border::{AxisMap, EdgeMode, Scalar};
use crate::filter::{kernels, separable_filter, ChannelMode};
use crate::parallel;

/// Arithmetic used by [`gaussian_blur`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GaussianPrecision {
    /// Floating point accumulation.
    #[default]
    Exact,
    /// 16-bit fixed point weights with integer accumulation. 8-bit samples only.
    Integral,
}

/// Parameters of [`gaussian_blur`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBlurConfig {
    /// Horizontal and vertical kernel sizes, odd.
    pub kernel_size: (usize, usize),
    /// Horizontal and vertical sigma, `0` derives it from the kernel size.
    pub sigma: (f32, f32),
    /// Out-of-bounds policy.
    pub edge_mode: EdgeMode,
    /// Fill value for [`EdgeMode::Constant`].
    pub border: Scalar,
    /// Accumulation arithmetic.
    pub precision: GaussianPrecision,
}

impl Default for GaussianBlurConfig {
    fn default() -> Self {
        Self {
            kernel_size: (5, 5),
            sigma: (0.0, 0.0),
            edge_mode: EdgeMode::Reflect101,
            border: Scalar::default(),
            precision: GaussianPrecision::Exact,
        }
    }
}

impl GaussianBlurConfig {
    /// Square kernel of `kernel_size` with the same sigma on both axes.
    pub fn new(kernel_size: usize, sigma: f32) -> Self {
        Self {
            kernel_size: (kernel_size, kernel_size),
            sigma: (sigma, sigma),
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

    /// Set the accumulation arithmetic.
    pub fn with_precision(mut self, precision: GaussianPrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Check kernel sizes and sigmas.
    ///
    /// # Errors
    ///
    /// Returns an error if a kernel size is even or a sigma is negative.
    pub fn validate(&self) -> Result<(), ImageError> {
        kernels::ensure_odd(self.kernel_size.0)?;
        kernels::ensure_odd(self.kernel_size.1)?;
        kernels::ensure_sigma(self.sigma.0)?;
        kernels::ensure_sigma(self.sigma.1)
    }

    pub(crate) fn kernels(&self) -> Result<(Vec<f32>, Vec<f32>), ImageError> {
        Ok((
            kernels::gaussian_kernel_1d(self.kernel_size.0, self.sigma.0)?,
            kernels::gaussian_kernel_1d(self.kernel_size.1, self.sigma.1)?,
        ))
    }
}

/// Blur an image using a separable gaussian kernel.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `config` - Kernel sizes, sigmas, edge handling and precision.
///
/// # Errors
///
/// Returns an error if the config is invalid, or if `Integral` precision is
/// requested for samples that are not 8-bit.
///
/// # Examples
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::blur::{gaussian_blur, GaussianBlurConfig};
///
/// let img = Image::<u8, 4>::from_size_val([8, 8].into(), 200).unwrap();
/// let out = gaussian_blur(&img, &GaussianBlurConfig::new(5, 0.0)).unwrap();
/// assert_eq!(out, img);
/// ```
pub fn gaussian_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &GaussianBlurConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    let (kernel_x, kernel_y) = config.kernels()?;
    log::debug!(
        "gaussian_blur: {} kernel {:?} sigma {:?} {:?}",
        src.size(),
        config.kernel_size,
        config.sigma,
        config.precision
    );

    match config.precision {
        GaussianPrecision::Exact => separable_filter(
            src,
            &kernel_x,
            &kernel_y,
            config.edge_mode,
            config.border.channels(),
            ChannelMode::Rgba,
        ),
        GaussianPrecision::Integral => {
            if T::MAX != u8::MAX as f32 {
                return Err(ImageError::UnsupportedConfiguration(
                    "integral gaussian precision needs 8-bit samples".to_string(),
                ));
            }
            let src_u8 = Image::<u8, C>::from_fn(src.size(), |x, y| {
                let px = src.pixel(x, y);
                std::array::from_fn(|c| u8::from_f32(px[c].into()))
            });
            let out = gaussian_integral(
                &src_u8,
                &kernel_x,
                &kernel_y,
                config.edge_mode,
                config.border.channels(),
            );
            Ok(Image::from_fn(out.size(), |x, y| {
                let px = out.pixel(x, y);
                std::array::from_fn(|c| T::from_f32(px[c] as f32))
            }))
        }
    }
}

const Q16_ONE: i64 = 1 << 16;

/// Quantize normalized weights to Q16 so that they sum to exactly one.
fn quantize_weights(kernel: &[f32]) -> Vec<u32> {
    let mut q: Vec<i64> = kernel
        .iter()
        .map(|&w| (w as f64 * Q16_ONE as f64).round() as i64)
        .collect();
    let drift = Q16_ONE - q.iter().sum::<i64>();
    let center = q.len() / 2;
    q[center] += drift;
    q.into_iter().map(|w| w.max(0) as u32).collect()
}

/// Fixed point separable gaussian.
///
/// The row pass keeps 8 fractional bits in a `u16`; the column pass
/// accumulates Q16 weights times Q8 samples in a `u32` and drops 24 bits.
fn gaussian_integral<const C: usize>(
    src: &Image<u8, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
    edge_mode: EdgeMode,
    border: [u8; C],
) -> Image<u8, C> {
    let (width, height) = (src.width(), src.height());
    let stride = src.row_stride();
    if stride == 0 || height == 0 {
        return src.clone();
    }

    let wx = quantize_weights(kernel_x);
    let wy = quantize_weights(kernel_y);
    let (rx, ry) = (wx.len() / 2, wy.len() / 2);
    let map_x = AxisMap::new(edge_mode, width, rx, rx);
    let map_y = AxisMap::new(edge_mode, height, ry, ry);

    let src_data = src.as_slice();
    let mut rows = vec![0u16; stride * height];
    parallel::par_rows_mut(&mut rows, stride, |y, row| {
        let line = &src_data[y * stride..(y + 1) * stride];
        for x in 0..width {
            for c in 0..C {
                let mut acc = 0u32;
                for (i, &w) in wx.iter().enumerate() {
                    let v = match map_x.get(x as isize + i as isize - rx as isize) {
                        Some(xi) => line[xi * C + c],
                        None => border[c],
                    };
                    acc += w * v as u32;
                }
                row[x * C + c] = ((acc + 128) >> 8) as u16;
            }
        }
    });

    // the column pass reads the row buffer only after it is complete
    let mut dst = src.clone();
    parallel::par_rows_mut(dst.as_slice_mut(), stride, |y, dst_row| {
        for (i, px) in dst_row.iter_mut().enumerate() {
            let c = i % C;
            let mut acc = 0u32;
            for (j, &w) in wy.iter().enumerate() {
                let v = match map_y.get(y as isize + j as isize - ry as isize) {
                    Some(yi) => rows[yi * stride + i],
                    None => (border[c] as u16) << 8,
                };
                acc += w * v as u32;
            }
            *px = ((acc + (1 << 23)) >> 24).min(255) as u8;
        }
    });
    log::trace!("gaussian_integral: {width}x{height} taps {}x{}", wx.len(), wy.len());
    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn impulse() -> Image<f32, 1> {
        Image::from_fn([9, 9].into(), |x, y| [if (x, y) == (4, 4) { 1.0 } else { 0.0 }])
    }

    #[test]
    fn impulse_response_is_symmetric() -> Result<(), ImageError> {
        let out = gaussian_blur(&impulse(), &GaussianBlurConfig::new(5, 0.0))?;
        let total: f32 = out.as_slice().iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-5);
        for (dx, dy) in [(1, 0), (0, 1), (2, 1), (1, 2)] {
            let a = out.pixel(4 + dx, 4 + dy)[0];
            let b = out.pixel(4 - dx, 4 - dy)[0];
            assert_relative_eq!(a, b, epsilon = 1e-6);
        }
        assert!(out.pixel(4, 4)[0] > out.pixel(5, 4)[0]);
        assert!(out.pixel(5, 4)[0] > out.pixel(6, 4)[0]);
        assert_eq!(out.pixel(7, 4)[0], 0.0);
        Ok(())
    }

    #[test]
    fn anisotropic_kernel_sizes() -> Result<(), ImageError> {
        let config = GaussianBlurConfig {
            kernel_size: (5, 1),
            sigma: (1.0, 0.0),
            ..Default::default()
        };
        let out = gaussian_blur(&impulse(), &config)?;
        // a 1-tap vertical kernel leaves other rows untouched
        assert!(out.row(3).iter().all(|&v| v == 0.0));
        assert!(out.pixel(5, 4)[0] > 0.0);
        Ok(())
    }

    #[test]
    fn even_kernel_is_rejected() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;
        let res = gaussian_blur(&img, &GaussianBlurConfig::new(4, 1.0));
        assert_eq!(res, Err(ImageError::InvalidKernelSize(4)));
        let res = gaussian_blur(&img, &GaussianBlurConfig::new(3, -1.0));
        assert_eq!(res, Err(ImageError::InvalidSigma(-1.0)));
        Ok(())
    }

    #[test]
    fn quantized_weights_sum_to_one() -> Result<(), ImageError> {
        for k in [1, 3, 5, 9, 15] {
            let q = quantize_weights(&kernels::gaussian_kernel_1d(k, 0.0)?);
            assert_eq!(q.iter().sum::<u32>(), 1 << 16);
        }
        Ok(())
    }

    #[test]
    fn integral_matches_exact() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_fn([17, 11].into(), |x, y| {
            [(x * 15) as u8, (y * 23) as u8, ((x * y) % 256) as u8, 255]
        });
        for mode in [EdgeMode::Clamp, EdgeMode::Reflect, EdgeMode::Constant] {
            let config = GaussianBlurConfig::new(7, 1.5)
                .with_edge_mode(mode)
                .with_border(Scalar::splat(40));
            let exact = gaussian_blur(&img, &config)?;
            let integral =
                gaussian_blur(&img, &config.with_precision(GaussianPrecision::Integral))?;
            for (a, b) in exact.as_slice().iter().zip(integral.as_slice()) {
                assert!(a.abs_diff(*b) <= 1, "{mode}: {a} vs {b}");
            }
        }
        Ok(())
    }

    #[test]
    fn integral_needs_u8() -> Result<(), ImageError> {
        let img = Image::<f32, 1>::from_size_val([2, 2].into(), 0.5)?;
        let config = GaussianBlurConfig::new(3, 0.0).with_precision(GaussianPrecision::Integral);
        assert!(matches!(
            gaussian_blur(&img, &config),
            Err(ImageError::UnsupportedConfiguration(_))
        ));
        Ok(())
    }
}
