/// Broad classification of an [`ImageError`].
///
/// Callers that only need to know whether to fix their parameters, pick another
/// variant of an operation, or report a collaborator failure can match on this
/// instead of on every error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A buffer does not match the raster it claims to describe.
    Shape,
    /// A parameter is outside the range accepted by the operation.
    InvalidParameter,
    /// The operation does not support the requested combination of options.
    UnsupportedConfiguration,
    /// An external encoder reported a failure.
    EncodingFailure,
}

/// An error type for the image transforms.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the image sizes do not match.
    #[error("Image size ({0}x{1}) does not match the expected size ({2}x{3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index {0} is out of bounds for {1} channels")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when the pixel coordinates are out of bounds.
    #[error("Pixel ({0}, {1}) is out of bounds for a {2}x{3} image")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a value cannot be cast to the target type.
    #[error("Failed to cast image data to {0}")]
    CastError(String),

    /// Error when a kernel size must be odd and at least one.
    #[error("Kernel size must be odd and >= 1, got {0}")]
    InvalidKernelSize(usize),

    /// Error when the kernel weights do not fill the declared footprint.
    #[error("Kernel data length ({0}) does not match its {1}x{2} footprint")]
    InvalidKernelShape(usize, usize, usize),

    /// Error when a sigma is negative or not finite.
    #[error("Sigma must be finite and >= 0, got {0}")]
    InvalidSigma(f32),

    /// Error when a radius or size is outside the supported range.
    #[error("Radius {radius} is outside the supported range {min}..={max}")]
    InvalidRadius {
        /// The rejected radius.
        radius: usize,
        /// Smallest accepted value.
        min: usize,
        /// Largest accepted value.
        max: usize,
    },

    /// Error when a tile grid has a zero dimension.
    #[error("Grid size must be positive, got {0}x{1}")]
    InvalidGridSize(usize, usize),

    /// Error when the histogram bin count is outside the accepted range.
    #[error("Invalid number of histogram bins: {0}")]
    InvalidHistogramBins(usize),

    /// Error when the requested palette size is outside `1..=256`.
    #[error("Palette size must be in 1..=256, got {0}")]
    InvalidColorCount(usize),

    /// Any other out-of-range parameter.
    #[error("Invalid parameter `{0}`: {1}")]
    InvalidParameter(&'static str, String),

    /// Error when an operation does not support the requested edge handling.
    #[error("{0} does not support {1} edge handling")]
    UnsupportedEdgeMode(&'static str, String),

    /// Error when an operation does not support the requested option.
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Error reported by an external encoder.
    #[error("Encoding failed: {0}")]
    EncodingFailure(String),
}

impl ImageError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImageError::InvalidChannelShape(..)
            | ImageError::InvalidImageSize(..)
            | ImageError::ChannelIndexOutOfBounds(..)
            | ImageError::PixelIndexOutOfBounds(..)
            | ImageError::CastError(_) => ErrorKind::Shape,
            ImageError::InvalidKernelSize(_)
            | ImageError::InvalidKernelShape(..)
            | ImageError::InvalidSigma(_)
            | ImageError::InvalidRadius { .. }
            | ImageError::InvalidGridSize(..)
            | ImageError::InvalidHistogramBins(_)
            | ImageError::InvalidColorCount(_)
            | ImageError::InvalidParameter(..) => ErrorKind::InvalidParameter,
            ImageError::UnsupportedEdgeMode(..) | ImageError::UnsupportedConfiguration(_) => {
                ErrorKind::UnsupportedConfiguration
            }
            ImageError::EncodingFailure(_) => ErrorKind::EncodingFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert_eq!(ImageError::InvalidKernelSize(4).kind(), ErrorKind::InvalidParameter);
        assert_eq!(
            ImageError::UnsupportedEdgeMode("stack_blur", "Constant".into()).kind(),
            ErrorKind::UnsupportedConfiguration
        );
        assert_eq!(
            ImageError::EncodingFailure("disk full".into()).kind(),
            ErrorKind::EncodingFailure
        );
        assert_eq!(ImageError::InvalidChannelShape(3, 4).kind(), ErrorKind::Shape);
    }

    #[test]
    fn error_messages() {
        let err = ImageError::InvalidRadius {
            radius: 300,
            min: 1,
            max: 254,
        };
        assert_eq!(err.to_string(), "Radius 300 is outside the supported range 1..=254");
        assert_eq!(
            ImageError::InvalidKernelSize(4).to_string(),
            "Kernel size must be odd and >= 1, got 4"
        );
    }
}
