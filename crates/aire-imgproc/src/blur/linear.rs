//! Blurs that accumulate light in linear space.
//!
//! Averaging gamma encoded samples darkens high contrast edges. These variants
//! decode with a [`TransferFunction`], filter, and encode again. The constant
//! border is decoded the same way.

use aire_image::{Image, ImageError};

use super::box_blur::box_filters;
use super::running::{filter_2d, LineFilter};
use super::{
    on_linear, BoxBlurConfig, FastGaussianConfig, GaussianBlurConfig, GaussianBoxBlurConfig,
    StackBlurConfig, TentBlurConfig,
};
use crate::border::EdgeMode;
use crate::color::{ColorSpace, TransferFunction};
use crate::filter::{separable_filter, ChannelMode};

/// [`gaussian_blur`](super::gaussian_blur) in linear light.
///
/// Precision is always floating point.
///
/// # Errors
///
/// Returns an error if the config is invalid or the raster has fewer than 3 channels.
pub fn linear_gaussian_blur<const C: usize>(
    src: &Image<u8, C>,
    config: &GaussianBlurConfig,
    transfer: TransferFunction,
) -> Result<Image<u8, C>, ImageError> {
    config.validate()?;
    let (kernel_x, kernel_y) = config.kernels()?;
    log::debug!(
        "linear_gaussian_blur: {} kernel {:?} {transfer:?}",
        src.size(),
        config.kernel_size
    );
    let border = config.border.working(ColorSpace::Linear(transfer));
    on_linear(src, transfer, |work| {
        separable_filter(
            work,
            &kernel_x,
            &kernel_y,
            config.edge_mode,
            border,
            ChannelMode::Rgba,
        )
    })
}

fn linear_cascade<const C: usize>(
    src: &Image<u8, C>,
    filters: &[LineFilter],
    edge_mode: EdgeMode,
    border: [f32; C],
    transfer: TransferFunction,
) -> Result<Image<u8, C>, ImageError> {
    on_linear(src, transfer, |work| {
        Ok(filter_2d(work, filters, edge_mode, border, C))
    })
}

/// [`box_blur`](super::box_blur) in linear light.
///
/// # Errors
///
/// Returns an error if the config is invalid or the raster has fewer than 3 channels.
pub fn linear_box_blur<const C: usize>(
    src: &Image<u8, C>,
    config: &BoxBlurConfig,
    transfer: TransferFunction,
) -> Result<Image<u8, C>, ImageError> {
    config.validate()?;
    log::debug!("linear_box_blur: {} kernel {}", src.size(), config.kernel_size);
    let border = config.border.working(ColorSpace::Linear(transfer));
    linear_cascade(src, &box_filters(config), config.edge_mode, border, transfer)
}

/// [`tent_blur`](super::tent_blur) in linear light.
///
/// # Errors
///
/// Returns an error if the config is invalid or the raster has fewer than 3 channels.
pub fn linear_tent_blur<const C: usize>(
    src: &Image<u8, C>,
    config: &TentBlurConfig,
    transfer: TransferFunction,
) -> Result<Image<u8, C>, ImageError> {
    config.validate()?;
    log::debug!("linear_tent_blur: {} sigma {}", src.size(), config.sigma);
    let border = config.border.working(ColorSpace::Linear(transfer));
    linear_cascade(src, &config.filters(2), config.edge_mode, border, transfer)
}

/// [`gaussian_box_blur`](super::gaussian_box_blur) in linear light.
///
/// # Errors
///
/// Returns an error if the config is invalid or the raster has fewer than 3 channels.
pub fn linear_gaussian_box_blur<const C: usize>(
    src: &Image<u8, C>,
    config: &GaussianBoxBlurConfig,
    transfer: TransferFunction,
) -> Result<Image<u8, C>, ImageError> {
    config.validate()?;
    log::debug!("linear_gaussian_box_blur: {} sigma {}", src.size(), config.sigma);
    let border = config.border.working(ColorSpace::Linear(transfer));
    linear_cascade(src, &config.filters(3), config.edge_mode, border, transfer)
}

/// [`stack_blur`](super::stack_blur) in linear light.
///
/// # Errors
///
/// Returns an error if the config is invalid or the raster has fewer than 3 channels.
pub fn linear_stack_blur<const C: usize>(
    src: &Image<u8, C>,
    config: &StackBlurConfig,
    transfer: TransferFunction,
) -> Result<Image<u8, C>, ImageError> {
    config.validate()?;
    log::debug!("linear_stack_blur: {} radius {}", src.size(), config.radius);
    linear_cascade(
        src,
        &[LineFilter::Stack(config.radius)],
        config.edge_mode,
        [0.0; C],
        transfer,
    )
}

/// [`fast_gaussian`](super::fast_gaussian) in linear light.
///
/// # Errors
///
/// Returns an error if the config is invalid or the raster has fewer than 3 channels.
pub fn linear_fast_gaussian<const C: usize>(
    src: &Image<u8, C>,
    config: &FastGaussianConfig,
    transfer: TransferFunction,
) -> Result<Image<u8, C>, ImageError> {
    config.validate()?;
    log::debug!(
        "linear_fast_gaussian: {} radius {} {:?}",
        src.size(),
        config.radius,
        config.degree
    );
    linear_cascade(src, &config.filters(), config.edge_mode, [0.0; C], transfer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blur::box_blur;

    fn black_white_edge() -> Image<u8, 4> {
        Image::from_fn([8, 2].into(), |x, _| {
            if x < 4 {
                [0, 0, 0, 255]
            } else {
                [255, 255, 255, 255]
            }
        })
    }

    #[test]
    fn linear_blending_is_brighter_at_edges() -> Result<(), ImageError> {
        let img = black_white_edge();
        let config = BoxBlurConfig::new(3).with_edge_mode(EdgeMode::Clamp);
        let perceptual = box_blur(&img, &config)?;
        let linear = linear_box_blur(&img, &config, TransferFunction::Srgb)?;
        // one white tap in three: 85 encoded vs. a third of the light
        assert_eq!(perceptual.pixel(3, 0)[0], 85);
        assert!(linear.pixel(3, 0)[0] > 140);
        assert_eq!(linear.pixel(3, 0)[3], 255);
        Ok(())
    }

    #[test]
    fn flat_images_survive_every_variant() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_size_val([6, 6].into(), 131)?;
        let tf = TransferFunction::Rec709;
        assert_eq!(linear_gaussian_blur(&img, &GaussianBlurConfig::new(5, 0.0), tf)?, img);
        assert_eq!(linear_box_blur(&img, &BoxBlurConfig::new(3), tf)?, img);
        assert_eq!(linear_tent_blur(&img, &TentBlurConfig::new(1.5), tf)?, img);
        assert_eq!(
            linear_gaussian_box_blur(&img, &GaussianBoxBlurConfig::new(1.5), tf)?,
            img
        );
        assert_eq!(linear_stack_blur(&img, &StackBlurConfig::new(3), tf)?, img);
        assert_eq!(
            linear_fast_gaussian(
                &img,
                &FastGaussianConfig::new(3, crate::blur::FastGaussianDegree::Three),
                tf
            )?,
            img
        );
        Ok(())
    }

    #[test]
    fn gray_rasters_need_color() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        let res = linear_box_blur(&img, &BoxBlurConfig::new(3), TransferFunction::Srgb);
        assert!(matches!(res, Err(ImageError::UnsupportedConfiguration(_))));
        Ok(())
    }
}
