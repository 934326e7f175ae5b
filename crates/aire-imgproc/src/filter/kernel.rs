use aire_image::ImageError;

/// Which channels of a 4-channel raster a filter touches.
///
/// Filters applied to 1, 2 or 3 channel rasters always process every channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelMode {
    /// Filter the colour channels and copy alpha through unchanged.
    Rgb,
    /// Filter every channel including alpha.
    #[default]
    Rgba,
}

impl ChannelMode {
    /// Number of leading channels processed for a raster with `channels` channels.
    #[inline]
    pub fn processed_channels(&self, channels: usize) -> usize {
        match self {
            ChannelMode::Rgb if channels == 4 => 3,
            _ => channels,
        }
    }
}

/// A dense rectangular convolution kernel.
///
/// Weights are stored row-major. The anchor is `(width / 2, height / 2)`, so
/// a weight at column `i` and row `j` multiplies the source pixel at
/// `(x + i - width / 2, y + j - height / 2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel2D {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) weights: Vec<f32>,
}

impl Kernel2D {
    /// Create a kernel from row-major weights.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero or the weight count does not match.
    ///
    /// # Examples
    ///
    /// ```
    /// use aire_imgproc::filter::Kernel2D;
    ///
    /// let k = Kernel2D::new(3, 1, vec![0.25, 0.5, 0.25]).unwrap();
    /// assert_eq!(k.center(), (1, 0));
    /// ```
    pub fn new(width: usize, height: usize, weights: Vec<f32>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 || weights.len() != width * height {
            return Err(ImageError::InvalidKernelShape(weights.len(), width, height));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(ImageError::InvalidParameter(
                "kernel",
                "weights must be finite".to_string(),
            ));
        }
        Ok(Self {
            width,
            height,
            weights,
        })
    }

    /// Outer product `column * row` of two 1D kernels.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the kernels is empty.
    pub fn from_separable(row: &[f32], column: &[f32]) -> Result<Self, ImageError> {
        let weights = column
            .iter()
            .flat_map(|&cy| row.iter().map(move |&rx| rx * cy))
            .collect();
        Self::new(row.len(), column.len(), weights)
    }

    /// Width in taps.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in taps.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Anchor position `(cx, cy)`.
    pub fn center(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    /// Row-major weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Whether the weights sum to one within `1e-4`.
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-4
    }

    /// Scale the weights so they sum to one.
    ///
    /// Kernels that sum to zero, such as derivative kernels, are left untouched.
    pub fn normalized(mut self) -> Self {
        let sum = self.sum();
        if sum.abs() > f32::EPSILON {
            self.weights.iter_mut().for_each(|w| *w /= sum);
        }
        self
    }

    /// Non-zero taps as `(dx, dy, weight)` offsets relative to the anchor.
    pub(crate) fn taps(&self) -> Vec<(isize, isize, f32)> {
        let (cx, cy) = self.center();
        self.weights
            .iter()
            .enumerate()
            .filter(|(_, &w)| w != 0.0)
            .map(|(i, &w)| {
                (
                    (i % self.width) as isize - cx as isize,
                    (i / self.width) as isize - cy as isize,
                    w,
                )
            })
            .collect()
    }
}
