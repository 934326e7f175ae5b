use aire_image::{Image, ImageDtype, ImageError};

use super::{convolve_2d, kernels, separable_filter, ChannelMode};
use crate::border::EdgeMode;

/// Copy an image into an `f32` buffer without rescaling.
pub(crate) fn to_f32<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
) -> Result<Image<f32, C>, ImageError> {
    src.cast::<f32>()
}

/// Round and saturate an `f32` buffer back to the sample type.
pub(crate) fn from_f32<T: ImageDtype, const C: usize>(src: &Image<f32, C>) -> Image<T, C> {
    Image::from_fn(src.size(), |x, y| {
        let px = src.pixel(x, y);
        std::array::from_fn(|c| T::from_f32(px[c]))
    })
}

/// Compute the sobel gradient magnitude.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `kernel_size` - The size of the kernel, 3 or 5.
/// * `edge_mode` - How samples outside the raster are read, `Constant` reads zeros.
/// * `channel_mode` - Whether alpha of a 4-channel raster is filtered or copied.
///
/// # Errors
///
/// Returns an error if the kernel size is not supported.
pub fn sobel<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    kernel_size: usize,
    edge_mode: EdgeMode,
    channel_mode: ChannelMode,
) -> Result<Image<T, C>, ImageError> {
    // get the sobel kernels
    let (derivative, smoothing) = kernels::sobel_kernels(kernel_size)?;
    log::debug!("sobel: {} kernel {kernel_size}", src.size());

    let src_f32 = to_f32(src)?;
    let zeros = [0.0; C];
    let gx = separable_filter(
        &src_f32,
        &derivative,
        &smoothing,
        edge_mode,
        zeros,
        channel_mode,
    )?;
    let gy = separable_filter(
        &src_f32,
        &smoothing,
        &derivative,
        edge_mode,
        zeros,
        channel_mode,
    )?;

    let processed = channel_mode.processed_channels(C);
    let mut dst = src.clone();
    dst.as_slice_mut()
        .chunks_exact_mut(C)
        .zip(gx.as_slice().chunks_exact(C))
        .zip(gy.as_slice().chunks_exact(C))
        .for_each(|((dst, gx), gy)| {
            for c in 0..processed {
                dst[c] = T::from_f32((gx[c] * gx[c] + gy[c] * gy[c]).sqrt());
            }
        });

    Ok(dst)
}

/// Apply the 3x3 laplacian. Negative responses saturate at zero for integer samples.
pub fn laplacian<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    edge_mode: EdgeMode,
    border: [T; C],
    channel_mode: ChannelMode,
) -> Result<Image<T, C>, ImageError> {
    log::debug!("laplacian: {}", src.size());
    convolve_2d(
        src,
        &kernels::laplacian_kernel(),
        edge_mode,
        border,
        channel_mode,
    )
}

/// Sharpen with the 3x3 sharpening kernel.
pub fn sharpen<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    edge_mode: EdgeMode,
    border: [T; C],
    channel_mode: ChannelMode,
) -> Result<Image<T, C>, ImageError> {
    log::debug!("sharpen: {}", src.size());
    convolve_2d(
        src,
        &kernels::sharpen_kernel(),
        edge_mode,
        border,
        channel_mode,
    )
}

/// Emboss with the given relief strength.
pub fn emboss<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    strength: f32,
    edge_mode: EdgeMode,
    border: [T; C],
    channel_mode: ChannelMode,
) -> Result<Image<T, C>, ImageError> {
    let kernel = kernels::emboss_kernel(strength)?;
    log::debug!("emboss: {} strength {strength}", src.size());
    convolve_2d(src, &kernel, edge_mode, border, channel_mode)
}

/// Unsharp mask: `src + amount * (src - gaussian(src))`.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `kernel_size` - The size of the gaussian, odd.
/// * `sigma` - The sigma of the gaussian, `0` derives it from the size.
/// * `amount` - Strength of the mask.
/// * `edge_mode` - How samples outside the raster are read.
/// * `border` - The scalar used by [`EdgeMode::Constant`].
/// * `channel_mode` - Whether alpha of a 4-channel raster is filtered or copied.
pub fn unsharp<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    kernel_size: usize,
    sigma: f32,
    amount: f32,
    edge_mode: EdgeMode,
    border: [T; C],
    channel_mode: ChannelMode,
) -> Result<Image<T, C>, ImageError> {
    let kernel = kernels::unsharp_kernel(kernel_size, sigma, amount)?;
    log::debug!(
        "unsharp: {} kernel {kernel_size} sigma {sigma} amount {amount}",
        src.size()
    );
    convolve_2d(src, &kernel, edge_mode, border, channel_mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sobel() -> Result<(), ImageError> {
        // vertical step edge
        let img = Image::<f32, 1>::from_fn([5, 3].into(), |x, _| [if x < 2 { 0.0 } else { 1.0 }]);
        let dst = sobel(&img, 3, EdgeMode::Clamp, ChannelMode::Rgba)?;
        let row = dst.row(1);
        assert_eq!(row[0], 0.0);
        assert_eq!(row[1], 4.0);
        assert_eq!(row[2], 4.0);
        assert_eq!(row[3], 0.0);
        Ok(())
    }

    #[test]
    fn flat_images_are_fixed_points() -> Result<(), ImageError> {
        let img = Image::<u8, 3>::from_size_val([6, 4].into(), 120)?;
        let border = [0; 3];
        for out in [
            sharpen(&img, EdgeMode::Clamp, border, ChannelMode::Rgba)?,
            emboss(&img, 2.0, EdgeMode::Clamp, border, ChannelMode::Rgba)?,
            unsharp(&img, 5, 0.0, 1.5, EdgeMode::Clamp, border, ChannelMode::Rgba)?,
        ] {
            assert_eq!(out, img);
        }
        let lap = laplacian(&img, EdgeMode::Reflect, border, ChannelMode::Rgba)?;
        assert!(lap.as_slice().iter().all(|&v| v == 0));
        Ok(())
    }

    #[test]
    fn unsharp_increases_contrast() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_fn([6, 1].into(), |x, _| [if x < 3 { 100 } else { 150 }]);
        let out = unsharp(&img, 3, 1.0, 1.0, EdgeMode::Clamp, [0], ChannelMode::Rgba)?;
        assert!(out.as_slice()[2] < 100);
        assert!(out.as_slice()[3] > 150);
        Ok(())
    }
}
