use aire_image::{Image, ImageDtype, ImageError};

use crate::border::{EdgeMode, Scalar};
use crate::filter::{convolve_2d, kernels, ChannelMode};

/// Parameters of [`motion_blur`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionBlurConfig {
    /// Length of the streak, odd.
    pub kernel_size: usize,
    /// Direction in degrees, counter-clockwise from the x axis.
    pub angle: f32,
    /// Out-of-bounds policy.
    pub edge_mode: EdgeMode,
    /// Fill value for [`EdgeMode::Constant`].
    pub border: Scalar,
}

impl Default for MotionBlurConfig {
    fn default() -> Self {
        Self {
            kernel_size: 9,
            angle: 0.0,
            edge_mode: EdgeMode::Reflect101,
            border: Scalar::default(),
        }
    }
}

impl MotionBlurConfig {
    /// Streak of `kernel_size` pixels along `angle`.
    pub fn new(kernel_size: usize, angle: f32) -> Self {
        Self {
            kernel_size,
            angle,
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

    /// Check the streak length and direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel size is even or the angle is not finite.
    pub fn validate(&self) -> Result<(), ImageError> {
        kernels::ensure_odd(self.kernel_size)?;
        if !self.angle.is_finite() {
            return Err(ImageError::InvalidParameter(
                "angle",
                format!("must be finite, got {}", self.angle),
            ));
        }
        Ok(())
    }
}

/// Convolve with a normalized line kernel oriented at an angle.
///
/// # Errors
///
/// Returns an error if the kernel size is even or the angle is not finite.
pub fn motion_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &MotionBlurConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    let kernel = kernels::motion_kernel(config.kernel_size, config.angle)?;
    log::debug!(
        "motion_blur: {} kernel {} angle {}",
        src.size(),
        config.kernel_size,
        config.angle
    );
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
    fn horizontal_streak() -> Result<(), ImageError> {
        let img = Image::<f32, 1>::from_fn([9, 9].into(), |x, y| {
            [if (x, y) == (4, 4) { 1.0 } else { 0.0 }]
        });
        let out = motion_blur(&img, &MotionBlurConfig::new(5, 0.0))?;
        for x in 2..=6 {
            approx::assert_relative_eq!(out.pixel(x, 4)[0], 0.2, epsilon = 1e-5);
        }
        assert!(out.row(3).iter().all(|&v| v.abs() < 1e-6));
        Ok(())
    }

    #[test]
    fn vertical_streak() -> Result<(), ImageError> {
        let img = Image::<f32, 1>::from_fn([9, 9].into(), |x, y| {
            [if (x, y) == (4, 4) { 1.0 } else { 0.0 }]
        });
        let out = motion_blur(&img, &MotionBlurConfig::new(3, 90.0))?;
        for y in 3..=5 {
            approx::assert_relative_eq!(out.pixel(4, y)[0], 1.0 / 3.0, epsilon = 1e-4);
        }
        assert!(out.pixel(5, 4)[0].abs() < 1e-4);
        Ok(())
    }
}
