use aire_image::{Image, ImageDtype, ImageError};

use super::{ChannelMode, Kernel2D};
use crate::border::{AxisMap, EdgeMode};
use crate::parallel;

/// Convolve an image with a dense 2D kernel.
///
/// Every output sample is `sum(w[j][i] * src(x + i - cx, y + j - cy))` where
/// `(cx, cy)` is the kernel anchor and out-of-range samples are resolved by
/// `edge_mode`. Accumulation happens in `f32` and is rounded and saturated once
/// on store.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `kernel` - The convolution kernel.
/// * `edge_mode` - How samples outside the raster are read.
/// * `border` - The scalar used by [`EdgeMode::Constant`].
/// * `channel_mode` - Whether alpha of a 4-channel raster is filtered or copied.
///
/// # Returns
///
/// A new image with the same shape as `src`. A 1x1 kernel returns an exact copy.
///
/// # Examples
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::filter::{convolve_2d, ChannelMode, Kernel2D};
/// use aire_imgproc::EdgeMode;
///
/// let img = Image::<u8, 1>::new([3, 1].into(), vec![0, 90, 0]).unwrap();
/// let k = Kernel2D::new(3, 1, vec![1.0 / 3.0; 3]).unwrap();
/// let out = convolve_2d(&img, &k, EdgeMode::Constant, [0], ChannelMode::Rgba).unwrap();
/// assert_eq!(out.as_slice(), &[30, 30, 30]);
/// ```
pub fn convolve_2d<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    kernel: &Kernel2D,
    edge_mode: EdgeMode,
    border: [T; C],
    channel_mode: ChannelMode,
) -> Result<Image<T, C>, ImageError> {
    log::trace!(
        "convolve_2d: {} kernel {}x{} edge {}",
        src.size(),
        kernel.width(),
        kernel.height(),
        edge_mode
    );

    if (kernel.width() == 1 && kernel.height() == 1) || src.size().is_empty() {
        return Ok(src.clone());
    }

    let (width, height) = (src.width(), src.height());
    let (cx, cy) = kernel.center();
    let xmap = AxisMap::new(edge_mode, width, cx, kernel.width() - 1 - cx);
    let ymap = AxisMap::new(edge_mode, height, cy, kernel.height() - 1 - cy);
    let taps = kernel.taps();
    let processed = channel_mode.processed_channels(C);
    let border_f: [f32; C] = border.map(|v| v.into());

    let mut dst = src.clone();
    let src_data = src.as_slice();
    let stride = src.row_stride();

    parallel::par_rows_mut(dst.as_slice_mut(), stride, |y, row| {
        for (x, px) in row.chunks_exact_mut(C).enumerate() {
            let mut acc = [0f32; C];
            for &(dx, dy, w) in taps.iter() {
                match (xmap.get(x as isize + dx), ymap.get(y as isize + dy)) {
                    (Some(sx), Some(sy)) => {
                        let offset = (sy * width + sx) * C;
                        let sp = &src_data[offset..offset + C];
                        for c in 0..processed {
                            let v: f32 = sp[c].into();
                            acc[c] += v * w;
                        }
                    }
                    _ => {
                        for c in 0..processed {
                            acc[c] += border_f[c] * w;
                        }
                    }
                }
            }
            for (p, a) in px.iter_mut().zip(acc.iter()).take(processed) {
                *p = T::from_f32(*a);
            }
        }
    });

    Ok(dst)
}
