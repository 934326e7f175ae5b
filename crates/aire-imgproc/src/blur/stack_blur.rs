use aire_image::{Image, ImageDtype, ImageError};

use super::on_f32;
use super::running::{filter_2d, LineFilter};
use crate::border::EdgeMode;

/// Largest radius accepted by [`stack_blur`].
pub const MAX_STACK_RADIUS: usize = 254;

/// Parameters of [`stack_blur`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackBlurConfig {
    /// Window radius in `1..=254`.
    pub radius: usize,
    /// Out-of-bounds policy, [`EdgeMode::Constant`] is not supported.
    pub edge_mode: EdgeMode,
}

impl Default for StackBlurConfig {
    fn default() -> Self {
        Self {
            radius: 5,
            edge_mode: EdgeMode::Clamp,
        }
    }
}

impl StackBlurConfig {
    /// Stack blur of the given radius.
    pub fn new(radius: usize) -> Self {
        Self {
            radius,
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
    /// Returns an error if the radius is outside `1..=254` or the edge mode is
    /// [`EdgeMode::Constant`].
    pub fn validate(&self) -> Result<(), ImageError> {
        if !(1..=MAX_STACK_RADIUS).contains(&self.radius) {
            return Err(ImageError::InvalidRadius {
                radius: self.radius,
                min: 1,
                max: MAX_STACK_RADIUS,
            });
        }
        self.edge_mode.reject_constant("stack_blur")
    }
}

/// Stack blur: a triangular window maintained with incoming and outgoing sums.
///
/// # Errors
///
/// Returns an error if the config is invalid.
pub fn stack_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &StackBlurConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    log::debug!("stack_blur: {} radius {}", src.size(), config.radius);
    on_f32(src, |work| {
        Ok(filter_2d(
            work,
            &[LineFilter::Stack(config.radius)],
            config.edge_mode,
            [0.0; C],
            C,
        ))
    })
}
