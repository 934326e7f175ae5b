use aire_image::{Image, ImageError};
use rayon::prelude::*;

use super::{bin_of, compute_histogram, ensure_bins, equalization_lut, HistogramSpace};
use crate::parallel::{par_iter_rows, par_rows_mut};
use crate::tone::ensure_rgb;

/// Equalize every colour channel independently.
///
/// The first three channels (or all of them for rasters with fewer) are
/// remapped through their own cumulative histogram; a fourth channel is
/// copied.
///
/// # Example
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::histogram::equalize_hist;
///
/// let img = Image::<u8, 1>::new([4, 1].into(), vec![100, 100, 110, 120]).unwrap();
/// let out = equalize_hist(&img).unwrap();
/// assert_eq!(out.as_slice(), &[0, 0, 128, 255]);
/// ```
pub fn equalize_hist<const C: usize>(src: &Image<u8, C>) -> Result<Image<u8, C>, ImageError> {
    let channels = C.min(3);
    let mut luts = [[0u8; 256]; 3];
    for (c, lut) in luts.iter_mut().enumerate().take(channels) {
        let mut hist = vec![0usize; 256];
        compute_histogram(&src.channel(c)?, &mut hist, 256)?;
        let hist: Vec<f64> = hist.into_iter().map(|h| h as f64).collect();
        for (out, v) in lut.iter_mut().zip(equalization_lut(&hist)) {
            *out = (v * 255.0).round() as u8;
        }
    }
    log::debug!("equalize_hist: {} over {channels} channels", src.size());

    let mut dst = src.clone();
    par_iter_rows(src, &mut dst, |s, d| {
        for c in 0..channels {
            d[c] = luts[c][s[c] as usize];
        }
    });
    Ok(dst)
}

/// Equalize the lightness of `space` with `bins` histogram bins.
///
/// Chroma is kept and alpha is copied.
///
/// # Errors
///
/// Returns an error if `bins < 2` or the raster has fewer than three channels.
pub fn equalize_hist_in<const C: usize>(
    src: &Image<u8, C>,
    space: HistogramSpace,
    bins: usize,
) -> Result<Image<u8, C>, ImageError> {
    ensure_rgb::<C>("equalize_hist")?;
    ensure_bins(bins)?;
    let planes = decompose(src, space);
    let li = space.lightness_index();

    let hist = planes
        .par_chunks(4096)
        .fold(
            || vec![0.0f64; bins],
            |mut local, chunk| {
                for p in chunk {
                    local[bin_of(p[li], bins)] += 1.0;
                }
                local
            },
        )
        .reduce(
            || vec![0.0f64; bins],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(a, b)| *a += b);
                a
            },
        );
    let lut = equalization_lut(&hist);
    log::debug!("equalize_hist_in: {} {space:?} bins={bins}", src.size());

    Ok(recompose(src, &planes, space, |_, _, l| lut[bin_of(l, bins)]))
}

/// Split every pixel into `space` components.
pub(crate) fn decompose<const C: usize>(src: &Image<u8, C>, space: HistogramSpace) -> Vec<[f32; 3]> {
    src.as_slice()
        .par_chunks_exact(C)
        .map(|s| space.decompose([s[0] as f32 / 255.0, s[1] as f32 / 255.0, s[2] as f32 / 255.0]))
        .collect()
}

/// Rebuild an image from `planes` with lightness replaced by `f(x, y, l)`.
pub(crate) fn recompose<const C: usize>(
    src: &Image<u8, C>,
    planes: &[[f32; 3]],
    space: HistogramSpace,
    f: impl Fn(usize, usize, f32) -> f32 + Send + Sync,
) -> Image<u8, C> {
    let li = space.lightness_index();
    let cols = src.cols();
    let mut dst = src.clone();
    par_rows_mut(dst.as_slice_mut(), cols * C, |y, row| {
        for (x, d) in row.chunks_exact_mut(C).enumerate() {
            let mut p = planes[y * cols + x];
            p[li] = f(x, y, p[li]);
            let rgb = space.compose(p);
            for (out, v) in d.iter_mut().zip(rgb) {
                *out = (v * 255.0).round().clamp(0.0, 255.0) as u8;
            }
        }
    });
    dst
}
