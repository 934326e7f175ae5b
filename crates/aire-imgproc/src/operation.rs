//! One call shape for every transform.
//!
//! A host binding holds a configuration value and calls
//! [`Operation::apply`] on an RGBA8 raster. Configuration structs implement
//! the trait directly. Where one configuration drives several transforms a
//! small wrapper picks the transform, e.g. [`TentBlur`] or [`Linear`].

use aire_image::{Image, ImageError};

use crate::blur::{
    self, AnisotropicDiffusionConfig, BilateralConfig, BokehConfig, BoxBlurConfig,
    FastGaussianConfig, GaussianBlurConfig, GaussianBoxBlurConfig, MedianBlurConfig,
    MotionBlurConfig, PoissonBlurConfig, StackBlurConfig, TentBlurConfig, TiltShiftConfig,
    ZoomBlurConfig,
};
use crate::color::TransferFunction;
use crate::histogram::{self, AheConfig, ClaheConfig, TileGrid};
use crate::morphology::{self, MorphologyConfig};
use crate::parallel::ExecutionStrategy;
use crate::quantize::{self, QuantizeConfig};
use crate::resize::{self, ResizeConfig};
use crate::tone::{self, ColorMatrix, ToneMapConfig};

/// A transform from one RGBA8 raster to a new one.
pub trait Operation: Send + Sync {
    /// Run the transform on the calling thread's pool.
    ///
    /// # Errors
    ///
    /// Returns the transform's validation error. No output is produced on
    /// failure.
    fn apply(&self, src: &Image<u8, 4>) -> Result<Image<u8, 4>, ImageError>;

    /// Run the transform under `strategy`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform fails or the pool cannot be built.
    fn apply_with(
        &self,
        src: &Image<u8, 4>,
        strategy: ExecutionStrategy,
    ) -> Result<Image<u8, 4>, ImageError> {
        Ok(strategy.execute(|| self.apply(src))?)
    }
}

macro_rules! impl_operation {
    ($($config:ty => $f:path),+ $(,)?) => {
        $(
            impl Operation for $config {
                fn apply(&self, src: &Image<u8, 4>) -> Result<Image<u8, 4>, ImageError> {
                    $f(src, self)
                }
            }
        )+
    };
}

impl_operation! {
    GaussianBlurConfig => blur::gaussian_blur,
    BilateralConfig => blur::bilateral_blur,
    BoxBlurConfig => blur::box_blur,
    StackBlurConfig => blur::stack_blur,
    FastGaussianConfig => blur::fast_gaussian,
    MedianBlurConfig => blur::median_blur,
    MotionBlurConfig => blur::motion_blur,
    ZoomBlurConfig => blur::zoom_blur,
    BokehConfig => blur::bokeh_blur,
    PoissonBlurConfig => blur::poisson_blur,
    AnisotropicDiffusionConfig => blur::anisotropic_diffusion,
    TiltShiftConfig => blur::tilt_shift,
    MorphologyConfig => morphology::morphology,
    ToneMapConfig => tone::tone_map,
    ColorMatrix => tone::color_matrix,
    AheConfig => histogram::ahe,
    ClaheConfig => histogram::clahe,
    ResizeConfig => resize::resize,
}

impl Operation for QuantizeConfig {
    fn apply(&self, src: &Image<u8, 4>) -> Result<Image<u8, 4>, ImageError> {
        Ok(quantize::quantize(src, self)?.remapped)
    }
}

/// [`tent_blur`](crate::blur::tent_blur) as an operation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TentBlur(pub TentBlurConfig);

/// [`gaussian_box_blur`](crate::blur::gaussian_box_blur) as an operation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GaussianBoxBlur(pub GaussianBoxBlurConfig);

/// [`fast_bilateral_blur`](crate::blur::fast_bilateral_blur) as an operation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FastBilateralBlur(pub BilateralConfig);

/// [`horizontal_tilt_shift`](crate::blur::horizontal_tilt_shift) as an operation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HorizontalTiltShift(pub TiltShiftConfig);

/// [`equalize_hist_squares`](crate::histogram::equalize_hist_squares) as an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EqualizeSquares(pub TileGrid);

impl_operation! {
    TentBlur => tent,
    GaussianBoxBlur => gaussian_box,
    FastBilateralBlur => fast_bilateral,
    HorizontalTiltShift => horizontal_tilt,
    EqualizeSquares => squares,
}

fn tent(src: &Image<u8, 4>, op: &TentBlur) -> Result<Image<u8, 4>, ImageError> {
    blur::tent_blur(src, &op.0)
}

fn gaussian_box(src: &Image<u8, 4>, op: &GaussianBoxBlur) -> Result<Image<u8, 4>, ImageError> {
    blur::gaussian_box_blur(src, &op.0)
}

fn fast_bilateral(src: &Image<u8, 4>, op: &FastBilateralBlur) -> Result<Image<u8, 4>, ImageError> {
    blur::fast_bilateral_blur(src, &op.0)
}

fn horizontal_tilt(
    src: &Image<u8, 4>,
    op: &HorizontalTiltShift,
) -> Result<Image<u8, 4>, ImageError> {
    blur::horizontal_tilt_shift(src, &op.0)
}

fn squares(src: &Image<u8, 4>, op: &EqualizeSquares) -> Result<Image<u8, 4>, ImageError> {
    histogram::equalize_hist_squares(src, op.0)
}

/// Runs the wrapped blur in linear light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linear<T> {
    /// The blur parameters.
    pub config: T,
    /// Curve used to decode and re-encode the samples.
    pub transfer: TransferFunction,
}

impl<T> Linear<T> {
    /// Wrap `config` with the sRGB transfer function.
    pub fn new(config: T) -> Self {
        Self {
            config,
            transfer: TransferFunction::Srgb,
        }
    }

    /// Set the transfer function.
    pub fn with_transfer(mut self, transfer: TransferFunction) -> Self {
        self.transfer = transfer;
        self
    }
}

macro_rules! impl_linear {
    ($($config:ty => $f:path),+ $(,)?) => {
        $(
            impl Operation for Linear<$config> {
                fn apply(&self, src: &Image<u8, 4>) -> Result<Image<u8, 4>, ImageError> {
                    $f(src, &self.config, self.transfer)
                }
            }
        )+
    };
}

impl_linear! {
    GaussianBlurConfig => blur::linear_gaussian_blur,
    BoxBlurConfig => blur::linear_box_blur,
    StackBlurConfig => blur::linear_stack_blur,
    FastGaussianConfig => blur::linear_fast_gaussian,
}

impl Operation for Linear<TentBlur> {
    fn apply(&self, src: &Image<u8, 4>) -> Result<Image<u8, 4>, ImageError> {
        blur::linear_tent_blur(src, &self.config.0, self.transfer)
    }
}

impl Operation for Linear<GaussianBoxBlur> {
    fn apply(&self, src: &Image<u8, 4>) -> Result<Image<u8, 4>, ImageError> {
        blur::linear_gaussian_box_blur(src, &self.config.0, self.transfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::ResizeFilter;
    use crate::morphology::{structuring_element, MorphOp};

    fn gradient() -> Image<u8, 4> {
        Image::from_fn([12, 9].into(), |x, y| {
            [(x * 20) as u8, (y * 25) as u8, ((x + y) * 10) as u8, 255]
        })
    }

    #[test]
    fn dispatch_matches_direct_calls() -> Result<(), ImageError> {
        let img = gradient();
        let gauss = GaussianBlurConfig::new(5, 1.2);
        assert_eq!(gauss.apply(&img)?, blur::gaussian_blur(&img, &gauss)?);

        let tent_config = TentBlurConfig::new(2.0);
        assert_eq!(
            TentBlur(tent_config).apply(&img)?,
            blur::tent_blur(&img, &tent_config)?
        );

        let linear = Linear::new(StackBlurConfig::new(3));
        assert_eq!(
            linear.apply(&img)?,
            blur::linear_stack_blur(&img, &StackBlurConfig::new(3), TransferFunction::Srgb)?
        );

        let q = QuantizeConfig::new(6);
        assert_eq!(q.apply(&img)?, quantize::quantize(&img, &q)?.remapped);
        Ok(())
    }

    #[test]
    fn heterogeneous_pipeline() -> Result<(), ImageError> {
        let ops: Vec<Box<dyn Operation>> = vec![
            Box::new(BoxBlurConfig::from_radius(1)),
            Box::new(MorphologyConfig::new(
                MorphOp::Closing,
                structuring_element(3)?,
            )),
            Box::new(ColorMatrix::SEPIA),
            Box::new(ClaheConfig::default()),
            Box::new(ResizeConfig::new([6, 5].into()).with_filter(ResizeFilter::CatmullRom)),
        ];
        let mut img = gradient();
        for op in &ops {
            img = op.apply(&img)?;
        }
        assert_eq!(img.size(), [6, 5].into());
        Ok(())
    }

    #[test]
    fn strategies_agree() -> Result<(), ImageError> {
        let img = gradient();
        let op = Linear::new(GaussianBlurConfig::new(7, 0.0));
        let reference = op.apply(&img)?;
        for strategy in [ExecutionStrategy::Serial, ExecutionStrategy::Fixed(3)] {
            assert_eq!(op.apply_with(&img, strategy)?, reference);
        }
        assert!(matches!(
            op.apply_with(&img, ExecutionStrategy::Fixed(0)),
            Err(ImageError::InvalidParameter("threads", _))
        ));
        Ok(())
    }

    #[test]
    fn validation_errors_pass_through() {
        let img = gradient();
        let bad = GaussianBlurConfig::new(4, 1.0);
        assert_eq!(bad.apply(&img).err(), Some(ImageError::InvalidKernelSize(4)));
    }

    fn rejects_like_validate<O: Operation>(op: &O, validated: Result<(), ImageError>) {
        let expected = validated.err();
        assert!(expected.is_some());
        assert_eq!(op.apply(&gradient()).err(), expected);
    }

    #[test]
    fn kernel_configs_validate_up_front() -> Result<(), ImageError> {
        let median = MedianBlurConfig::new(6);
        rejects_like_validate(&median, median.validate());

        let motion = MotionBlurConfig::new(5, f32::NAN);
        rejects_like_validate(&motion, motion.validate());

        let bokeh = BokehConfig::new(7, 2);
        rejects_like_validate(&bokeh, bokeh.validate());
        let tiny = BokehConfig::new(1, 6);
        rejects_like_validate(&tiny, tiny.validate());

        let poisson = PoissonBlurConfig::new(0);
        rejects_like_validate(&poisson, poisson.validate());

        let tilt = TiltShiftConfig::new(5, 1.0).with_radius(-1.0);
        rejects_like_validate(&tilt, tilt.validate());

        let closing = MorphologyConfig::new(MorphOp::Closing, structuring_element(5)?);
        closing.validate()?;
        PoissonBlurConfig::new(1).validate()?;
        Ok(())
    }
}
