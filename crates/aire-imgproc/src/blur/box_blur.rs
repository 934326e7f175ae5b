use aire_image::{Image, ImageDtype, ImageError};

use super::running::{boxes_for_gauss, filter_2d, LineFilter};
use super::{border_f32, on_f32};
use crate::border::{EdgeMode, Scalar};
use crate::filter::kernels;

/// Parameters of [`box_blur`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxBlurConfig {
    /// Window size, odd.
    pub kernel_size: usize,
    /// Out-of-bounds policy.
    pub edge_mode: EdgeMode,
    /// Fill value for [`EdgeMode::Constant`].
    pub border: Scalar,
}

impl Default for BoxBlurConfig {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            edge_mode: EdgeMode::Reflect101,
            border: Scalar::default(),
        }
    }
}

impl BoxBlurConfig {
    /// Window of `kernel_size` samples per axis.
    pub fn new(kernel_size: usize) -> Self {
        Self {
            kernel_size,
            ..Default::default()
        }
    }

    /// Window of `2 * radius + 1` samples per axis.
    pub fn from_radius(radius: usize) -> Self {
        Self::new(2 * radius + 1)
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

    /// Check the window size.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel size is even or zero.
    pub fn validate(&self) -> Result<(), ImageError> {
        kernels::ensure_odd(self.kernel_size)
    }
}

/// Sigma driven configuration shared by [`tent_blur`] and [`gaussian_box_blur`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCascadeConfig {
    /// Target gaussian sigma, `>= 0`.
    pub sigma: f32,
    /// Out-of-bounds policy.
    pub edge_mode: EdgeMode,
    /// Fill value for [`EdgeMode::Constant`].
    pub border: Scalar,
}

impl Default for BoxCascadeConfig {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            edge_mode: EdgeMode::Reflect101,
            border: Scalar::default(),
        }
    }
}

impl BoxCascadeConfig {
    /// Cascade approximating a gaussian of `sigma`.
    pub fn new(sigma: f32) -> Self {
        Self {
            sigma,
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

    /// Check the sigma.
    ///
    /// # Errors
    ///
    /// Returns an error if sigma is negative or not finite.
    pub fn validate(&self) -> Result<(), ImageError> {
        kernels::ensure_sigma(self.sigma)
    }

    pub(crate) fn filters(&self, passes: usize) -> Vec<LineFilter> {
        boxes_for_gauss(self.sigma, passes)
            .into_iter()
            .map(LineFilter::Box)
            .collect()
    }
}

/// Parameters of [`tent_blur`].
pub type TentBlurConfig = BoxCascadeConfig;

/// Parameters of [`gaussian_box_blur`].
pub type GaussianBoxBlurConfig = BoxCascadeConfig;

pub(crate) fn box_filters(config: &BoxBlurConfig) -> Vec<LineFilter> {
    vec![LineFilter::Box(config.kernel_size / 2)]
}

/// Unweighted mean over a square window, computed with running sums.
///
/// The cost per pixel does not depend on the window size.
///
/// # Errors
///
/// Returns an error if the kernel size is even or zero.
///
/// # Examples
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::blur::{box_blur, BoxBlurConfig};
///
/// let red = Image::<u8, 4>::from_fn([4, 4].into(), |_, _| [255, 0, 0, 255]);
/// let out = box_blur(&red, &BoxBlurConfig::from_radius(1)).unwrap();
/// assert_eq!(out, red);
/// ```
pub fn box_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &BoxBlurConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    log::debug!("box_blur: {} kernel {}", src.size(), config.kernel_size);
    let border = border_f32::<T, C>(config.border);
    on_f32(src, |work| {
        Ok(filter_2d(work, &box_filters(config), config.edge_mode, border, C))
    })
}

/// Two box passes per axis, a triangular profile approximating a gaussian.
///
/// # Errors
///
/// Returns an error if sigma is negative or not finite.
pub fn tent_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &TentBlurConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    let filters = config.filters(2);
    log::debug!("tent_blur: {} sigma {} boxes {filters:?}", src.size(), config.sigma);
    let border = border_f32::<T, C>(config.border);
    on_f32(src, |work| {
        Ok(filter_2d(work, &filters, config.edge_mode, border, C))
    })
}

/// Three box passes per axis, close to a gaussian of the given sigma.
///
/// # Errors
///
/// Returns an error if sigma is negative or not finite.
pub fn gaussian_box_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &GaussianBoxBlurConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    let filters = config.filters(3);
    log::debug!(
        "gaussian_box_blur: {} sigma {} boxes {filters:?}",
        src.size(),
        config.sigma
    );
    let border = border_f32::<T, C>(config.border);
    on_f32(src, |work| {
        Ok(filter_2d(work, &filters, config.edge_mode, border, C))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_red_is_a_fixed_point() -> Result<(), ImageError> {
        let red = Image::<u8, 4>::from_fn([4, 4].into(), |_, _| [255, 0, 0, 255]);
        for mode in [
            EdgeMode::Clamp,
            EdgeMode::Wrap,
            EdgeMode::Reflect,
            EdgeMode::Reflect101,
        ] {
            let out = box_blur(&red, &BoxBlurConfig::from_radius(1).with_edge_mode(mode))?;
            assert_eq!(out, red);
            assert_eq!(tent_blur(&red, &TentBlurConfig::new(2.0).with_edge_mode(mode))?, red);
            assert_eq!(
                gaussian_box_blur(&red, &GaussianBoxBlurConfig::new(2.0).with_edge_mode(mode))?,
                red
            );
        }
        Ok(())
    }

    #[test]
    fn box_corner_reads_border() -> Result<(), ImageError> {
        let img = Image::<f32, 1>::from_size_val([5, 5].into(), 9.0)?;
        let config = BoxBlurConfig::new(3).with_edge_mode(EdgeMode::Constant);
        let out = box_blur(&img, &config)?;
        // 4 of 9 taps inside at the corner
        approx::assert_relative_eq!(out.pixel(0, 0)[0], 4.0, epsilon = 1e-5);
        approx::assert_relative_eq!(out.pixel(2, 2)[0], 9.0, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn box_blur_matches_direct_mean() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_fn([7, 5].into(), |x, y| [((x * 37 + y * 11) % 200) as u8]);
        let out = box_blur(&img, &BoxBlurConfig::new(3).with_edge_mode(EdgeMode::Wrap))?;
        let (w, h) = (7isize, 5isize);
        for y in 0..h {
            for x in 0..w {
                let mut sum = 0.0f32;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let sx = (x + dx).rem_euclid(w) as usize;
                        let sy = (y + dy).rem_euclid(h) as usize;
                        sum += img.pixel(sx, sy)[0] as f32;
                    }
                }
                assert_eq!(out.pixel(x as usize, y as usize)[0], (sum / 9.0).round() as u8);
            }
        }
        Ok(())
    }

    #[test]
    fn even_size_is_rejected() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_size_val([3, 3].into(), 1)?;
        assert_eq!(
            box_blur(&img, &BoxBlurConfig::new(2)),
            Err(ImageError::InvalidKernelSize(2))
        );
        assert_eq!(
            tent_blur(&img, &TentBlurConfig::new(-0.5)),
            Err(ImageError::InvalidSigma(-0.5))
        );
        Ok(())
    }
}
