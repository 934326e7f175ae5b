use aire_image::{Image, ImageDtype, ImageError};

use super::ChannelMode;
use crate::border::{AxisMap, EdgeMode};
use crate::parallel;

/// Apply a separable filter to an image.
///
/// Runs a horizontal pass with `kernel_x` into an `f32` buffer, then a vertical
/// pass with `kernel_y` into the destination. The result equals a 2D convolution
/// with the outer product of both kernels, including under [`EdgeMode::Constant`].
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel, anchored at `len / 2`.
/// * `kernel_y` - The vertical kernel, anchored at `len / 2`.
/// * `edge_mode` - How samples outside the raster are read.
/// * `border` - The scalar used by [`EdgeMode::Constant`].
/// * `channel_mode` - Whether alpha of a 4-channel raster is filtered or copied.
///
/// # Errors
///
/// Returns an error if one of the kernels is empty.
pub fn separable_filter<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
    edge_mode: EdgeMode,
    border: [T; C],
    channel_mode: ChannelMode,
) -> Result<Image<T, C>, ImageError> {
    if kernel_x.is_empty() || kernel_y.is_empty() {
        return Err(ImageError::InvalidKernelSize(0));
    }

    log::trace!(
        "separable_filter: {} kernel {}x{} edge {}",
        src.size(),
        kernel_x.len(),
        kernel_y.len(),
        edge_mode
    );

    if src.size().is_empty() {
        return Ok(src.clone());
    }

    let (width, height) = (src.width(), src.height());
    let stride = src.row_stride();
    let processed = channel_mode.processed_channels(C);
    let border_f: [f32; C] = border.map(|v| v.into());

    let half_x = kernel_x.len() / 2;
    let half_y = kernel_y.len() / 2;
    let xmap = AxisMap::new(edge_mode, width, half_x, kernel_x.len() - 1 - half_x);
    let ymap = AxisMap::new(edge_mode, height, half_y, kernel_y.len() - 1 - half_y);

    let src_data = src.as_slice();
    let mut temp = vec![0f32; src_data.len()];

    // horizontal pass
    parallel::par_rows_mut(&mut temp, stride, |y, temp_row| {
        let src_row = &src_data[y * stride..(y + 1) * stride];
        for (x, acc) in temp_row.chunks_exact_mut(C).enumerate() {
            for (k, &w) in kernel_x.iter().enumerate() {
                match xmap.get(x as isize + k as isize - half_x as isize) {
                    Some(sx) => {
                        for c in 0..processed {
                            let v: f32 = src_row[sx * C + c].into();
                            acc[c] += v * w;
                        }
                    }
                    None => {
                        for c in 0..processed {
                            acc[c] += border_f[c] * w;
                        }
                    }
                }
            }
        }
    });

    // rows outside the raster are constant rows already filtered horizontally
    let sum_x: f32 = kernel_x.iter().sum();
    let border_row: [f32; C] = border_f.map(|v| v * sum_x);

    // vertical pass
    let mut dst = src.clone();
    parallel::par_rows_mut(dst.as_slice_mut(), stride, |y, dst_row| {
        let mut acc = vec![0f32; stride];
        for (k, &w) in kernel_y.iter().enumerate() {
            match ymap.get(y as isize + k as isize - half_y as isize) {
                Some(sy) => {
                    let temp_row = &temp[sy * stride..(sy + 1) * stride];
                    for (a, t) in acc.iter_mut().zip(temp_row) {
                        *a += t * w;
                    }
                }
                None => {
                    for (a, b) in acc.iter_mut().zip(border_row.iter().cycle()) {
                        *a += b * w;
                    }
                }
            }
        }
        for (dst_px, acc_px) in dst_row.chunks_exact_mut(C).zip(acc.chunks_exact(C)) {
            for c in 0..processed {
                dst_px[c] = T::from_f32(acc_px[c]);
            }
        }
    });

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{convolve_2d, Kernel2D};

    #[test]
    fn test_separable_filter() -> Result<(), ImageError> {
        let img = Image::<f32, 1>::new(
            [5, 5].into(),
            vec![
                0.0, 0.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 9.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 0.0, 0.0, //
            ],
        )?;

        let kernel = [1.0, 1.0, 1.0];
        let dst = separable_filter(
            &img,
            &kernel,
            &kernel,
            EdgeMode::Constant,
            [0.0],
            ChannelMode::Rgba,
        )?;

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 9.0, 9.0, 9.0, 0.0,
                0.0, 9.0, 9.0, 9.0, 0.0,
                0.0, 9.0, 9.0, 9.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
            ]
        );

        Ok(())
    }

    #[test]
    fn matches_dense_convolution() -> Result<(), ImageError> {
        let img = Image::<f32, 2>::from_fn([7, 5].into(), |x, y| {
            [(x * 3 + y) as f32, ((x * y) % 5) as f32]
        });
        let kx = [0.25, 0.5, 0.25];
        let ky = [0.1, 0.2, 0.4, 0.2, 0.1];
        let dense = Kernel2D::from_separable(&kx, &ky)?;

        for mode in [
            EdgeMode::Clamp,
            EdgeMode::Wrap,
            EdgeMode::Reflect,
            EdgeMode::Reflect101,
            EdgeMode::Constant,
        ] {
            let a = separable_filter(&img, &kx, &ky, mode, [3.0, 1.0], ChannelMode::Rgba)?;
            let b = convolve_2d(&img, &dense, mode, [3.0, 1.0], ChannelMode::Rgba)?;
            for (va, vb) in a.as_slice().iter().zip(b.as_slice()) {
                approx::assert_relative_eq!(va, vb, epsilon = 1e-4);
            }
        }
        Ok(())
    }

    #[test]
    fn empty_kernel_is_rejected() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::new([1, 1].into(), vec![0])?;
        let res = separable_filter(&img, &[], &[1.0], EdgeMode::Clamp, [0], ChannelMode::Rgba);
        assert_eq!(res, Err(ImageError::InvalidKernelSize(0)));
        Ok(())
    }
}
