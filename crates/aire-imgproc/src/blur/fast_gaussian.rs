use aire_image::{Image, ImageDtype, ImageError};

use super::on_f32;
use super::running::{filter_2d, LineFilter};
use crate::border::EdgeMode;

/// Number of cascaded box passes per axis.
///
/// Higher degrees are closer to a true gaussian and slower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FastGaussianDegree {
    /// Two passes, a triangular profile.
    #[default]
    Two,
    /// Three passes, a quadratic B-spline profile.
    Three,
    /// Four passes, a cubic B-spline profile.
    Four,
}

impl FastGaussianDegree {
    /// The number of box passes per axis.
    pub fn passes(&self) -> usize {
        match self {
            FastGaussianDegree::Two => 2,
            FastGaussianDegree::Three => 3,
            FastGaussianDegree::Four => 4,
        }
    }
}

/// Parameters of [`fast_gaussian`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastGaussianConfig {
    /// Overall radius, `>= 1`.
    pub radius: usize,
    /// Number of passes.
    pub degree: FastGaussianDegree,
    /// Out-of-bounds policy, [`EdgeMode::Constant`] is not supported.
    pub edge_mode: EdgeMode,
}

impl Default for FastGaussianConfig {
    fn default() -> Self {
        Self {
            radius: 5,
            degree: FastGaussianDegree::Two,
            edge_mode: EdgeMode::Clamp,
        }
    }
}

impl FastGaussianConfig {
    /// Approximation of the given radius and degree.
    pub fn new(radius: usize, degree: FastGaussianDegree) -> Self {
        Self {
            radius,
            degree,
            ..Default::default()
        }
    }

    /// Set the edge mode.
    pub fn with_edge_mode(mut self, edge_mode: EdgeMode) -> Self {
        self.edge_mode = edge_mode;
        self
    }

    /// Check the radius and edge mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is zero or the edge mode is
    /// [`EdgeMode::Constant`].
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.radius == 0 {
            return Err(ImageError::InvalidRadius {
                radius: 0,
                min: 1,
                max: usize::MAX,
            });
        }
        self.edge_mode.reject_constant("fast_gaussian")
    }

    /// Split the radius evenly across the passes.
    pub(crate) fn filters(&self) -> Vec<LineFilter> {
        let n = self.degree.passes();
        let per_pass = ((self.radius + n / 2) / n).max(1);
        vec![LineFilter::Box(per_pass); n]
    }
}

/// Gaussian approximation by cascaded running-sum boxes.
///
/// # Errors
///
/// Returns an error if the config is invalid.
pub fn fast_gaussian<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &FastGaussianConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    let filters = config.filters();
    log::debug!(
        "fast_gaussian: {} radius {} {:?}",
        src.size(),
        config.radius,
        config.degree
    );
    on_f32(src, |work| {
        Ok(filter_2d(work, &filters, config.edge_mode, [0.0; C], C))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse() -> Image<f32, 1> {
        Image::from_fn([31, 1].into(), |x, _| [if x == 15 { 1.0 } else { 0.0 }])
    }

    fn variance(img: &Image<f32, 1>) -> f32 {
        img.as_slice()
            .iter()
            .enumerate()
            .map(|(x, v)| v * (x as f32 - 15.0).powi(2))
            .sum()
    }

    #[test]
    fn degrees_preserve_mass() -> Result<(), ImageError> {
        for degree in [
            FastGaussianDegree::Two,
            FastGaussianDegree::Three,
            FastGaussianDegree::Four,
        ] {
            let out = fast_gaussian(&impulse(), &FastGaussianConfig::new(6, degree))?;
            let total: f32 = out.as_slice().iter().sum();
            approx::assert_relative_eq!(total, 1.0, epsilon = 1e-4);
            assert!(variance(&out) > 1.0);
        }
        Ok(())
    }

    #[test]
    fn pass_radii() {
        let f = FastGaussianConfig::new(6, FastGaussianDegree::Three).filters();
        assert_eq!(f, vec![LineFilter::Box(2); 3]);
        let f = FastGaussianConfig::new(1, FastGaussianDegree::Four).filters();
        assert_eq!(f, vec![LineFilter::Box(1); 4]);
    }

    #[test]
    fn invalid_configs() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        assert!(fast_gaussian(&img, &FastGaussianConfig::new(0, FastGaussianDegree::Two)).is_err());
        let config = FastGaussianConfig::new(3, FastGaussianDegree::Two).with_edge_mode(EdgeMode::Constant);
        assert!(matches!(
            fast_gaussian(&img, &config),
            Err(ImageError::UnsupportedEdgeMode("fast_gaussian", _))
        ));
        Ok(())
    }
}
