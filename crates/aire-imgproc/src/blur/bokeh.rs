use aire_image::{Image, ImageDtype, ImageError};

use crate::border::{EdgeMode, Scalar};
use crate::filter::{convolve_2d, kernels, ChannelMode};

/// Parameters of [`bokeh_blur`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BokehConfig {
    /// Aperture diameter, odd and `>= 3`.
    pub kernel_size: usize,
    /// Number of aperture blades, `>= 3`.
    pub sides: usize,
    /// Out-of-bounds policy.
    pub edge_mode: EdgeMode,
    /// Fill value for [`EdgeMode::Constant`].
    pub border: Scalar,
}

impl Default for BokehConfig {
    fn default() -> Self {
        Self {
            kernel_size: 15,
            sides: 6,
            edge_mode: EdgeMode::Reflect101,
            border: Scalar::default(),
        }
    }
}

impl BokehConfig {
    /// Polygonal aperture of `kernel_size` with `sides` blades.
    pub fn new(kernel_size: usize, sides: usize) -> Self {
        Self {
            kernel_size,
            sides,
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

    /// Check the aperture.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel size is even or below 3, or if there are
    /// fewer than 3 sides.
    pub fn validate(&self) -> Result<(), ImageError> {
        kernels::ensure_odd(self.kernel_size)?;
        if self.kernel_size < 3 {
            return Err(ImageError::InvalidRadius {
                radius: self.kernel_size,
                min: 3,
                max: usize::MAX,
            });
        }
        if self.sides < 3 {
            return Err(ImageError::InvalidParameter(
                "sides",
                format!("a polygon needs at least 3 sides, got {}", self.sides),
            ));
        }
        Ok(())
    }
}

/// Simulate a lens aperture by convolving with a regular polygon.
///
/// # Errors
///
/// Returns an error if the kernel size is even or below 3, or if there are
/// fewer than 3 sides.
pub fn bokeh_blur<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    config: &BokehConfig,
) -> Result<Image<T, C>, ImageError> {
    config.validate()?;
    let kernel = kernels::bokeh_kernel(config.kernel_size, config.sides)?;
    log::debug!(
        "bokeh_blur: {} kernel {} sides {}",
        src.size(),
        config.kernel_size,
        config.sides
    );
    convolve_2d(
        src,
        &kernel,
        config.edge_mode,
        config.border.channels(),
        ChannelMode::Rgba,
    )
}
