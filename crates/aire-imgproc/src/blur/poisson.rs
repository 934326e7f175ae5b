use aire_image::{Image, ImageDtype, ImageError};

use crate::border::{EdgeMode, Scalar};
use crate::filter::{convolve_2d, kernels, ChannelMode, Kernel2D};

/// Parameters of [`poisson_blur`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoissonBlurConfig {
    /// Footprint size, odd. The side taps sit at `kernel_size / 2`.
    pub kernel_size: usize,
    /// Out-of-bounds policy.
    pub edge_mode: EdgeMode,
    /// Fill value for [`EdgeMode::Constant`].
    pub border: Scalar,
}

impl Default for PoissonBlurConfig {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            edge_mode: EdgeMode::Reflect101,
            border: Scalar::default(),
        }
    }
}

impl PoissonBlurConfig {
    /// Five tap blur spanning `kernel_size`.
    pub fn new(kernel_size: usize) -> Self {
        Self {
            kernel_size,
            ..Default::default()
        }
    }

    /// Set the edge mode.
    pub fn with_edge_mode(mut self, edge_mode: EdgeMode) -> Self {
        self.edge_mode = edge_mode;
        self
    }

    /// Check the footprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel size is even or zero.
    pub fn validate(&self) -> Result<(), ImageError> {
        kernels::ensure_odd(self.kernel_size)
    }
}

fn poisson_kernel(kernel_size: usize) -> Result<Kernel2D, ImageError> {
    kernels::ensure_odd(kernel_size)?;
    let r = kernel_size / 2;
    let mut weights = vec![0.0; kernel_size * kernel_size];
    for (x, y) in [(r, r), (0, r), (kernel_size - 1, r), (r, 0), (r, kernel_size - 1)] {
        weights[y * kernel_size + x] = 0.2;
    }
    Kernel2D::new(kernel_size, kernel_size, weights)
}

/// Average the center with its four axis neighbours at distance `kernel_size / 2`.
///
/// A kernel size of 1 copies the image.
///
/// # Errors
///
/// Returns an error if the kernel size is even or zero.
pub fn poisson_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &PoissonBlurConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    if config.kernel_size == 1 {
        return Ok(src.clone());
    }
    let kernel = poisson_kernel(config.kernel_size)?;
    log::debug!("poisson_blur: {} kernel {}", src.size(), config.kernel_size);
    convolve_2d(
        src,
        &kernel,
        config.edge_mode,
        config.border.channels(),
        ChannelMode::Rgba,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_taps() -> Result<(), ImageError> {
        let k = poisson_kernel(5)?;
        assert!(k.is_normalized());
        assert_eq!(k.weights().iter().filter(|&&w| w > 0.0).count(), 5);
        assert_eq!(k.weights()[2], 0.2);
        assert_eq!(k.weights()[10], 0.2);
        Ok(())
    }

    #[test]
    fn impulse_spreads_to_axis_neighbours() -> Result<(), ImageError> {
        let img = Image::<f32, 1>::from_fn([7, 7].into(), |x, y| {
            [if (x, y) == (3, 3) { 1.0 } else { 0.0 }]
        });
        let out = poisson_blur(&img, &PoissonBlurConfig::new(5))?;
        for (x, y) in [(3, 3), (1, 3), (5, 3), (3, 1), (3, 5)] {
            approx::assert_relative_eq!(out.pixel(x, y)[0], 0.2, epsilon = 1e-6);
        }
        assert_eq!(out.pixel(2, 3)[0], 0.0);
        Ok(())
    }

    #[test]
    fn unit_kernel_copies() -> Result<(), ImageError> {
        let img = Image::<u8, 3>::from_fn([3, 2].into(), |x, y| [x as u8, y as u8, 9]);
        assert_eq!(poisson_blur(&img, &PoissonBlurConfig::new(1))?, img);
        assert!(poisson_blur(&img, &PoissonBlurConfig::new(2)).is_err());
        Ok(())
    }
}
