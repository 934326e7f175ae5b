//! Sliding-window line filters shared by the box, tent, stack and fast
//! gaussian blurs.
//!
//! Each filter walks one line of interleaved samples keeping running sums, so
//! the cost per sample does not depend on the radius. Columns are handled by
//! transposing, filtering rows, and transposing back.

use aire_image::{Image, ImageSize};

use crate::border::{AxisMap, EdgeMode};
use crate::parallel;

/// A 1D sliding-window filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineFilter {
    /// Unweighted mean over `2r + 1` samples.
    Box(usize),
    /// Triangular weights `r + 1 - |i|` over `2r + 1` samples.
    Stack(usize),
}

impl LineFilter {
    fn radius(&self) -> usize {
        match *self {
            LineFilter::Box(r) | LineFilter::Stack(r) => r,
        }
    }
}

/// Transpose an interleaved `width x height` buffer.
pub(crate) fn transpose<const C: usize>(src: &Image<f32, C>) -> Image<f32, C> {
    let (width, height) = (src.width(), src.height());
    let size = ImageSize {
        width: height,
        height: width,
    };
    let mut dst = Image::from_fn(size, |_, _| [0f32; C]);
    let src_data = src.as_slice();
    parallel::par_rows_mut(dst.as_slice_mut(), height * C, |x, row| {
        for (y, px) in row.chunks_exact_mut(C).enumerate() {
            let offset = (y * width + x) * C;
            px.copy_from_slice(&src_data[offset..offset + C]);
        }
    });
    dst
}

fn filter_line<const C: usize>(
    src: &[f32],
    dst: &mut [f32],
    filter: LineFilter,
    map: &AxisMap,
    border: &[f32; C],
    processed: usize,
) {
    let n = src.len() / C;
    for c in 0..C {
        if c >= processed {
            for x in 0..n {
                dst[x * C + c] = src[x * C + c];
            }
            continue;
        }

        let v = |i: isize| -> f64 {
            match map.get(i) {
                Some(j) => src[j * C + c] as f64,
                None => border[c] as f64,
            }
        };

        match filter {
            LineFilter::Box(r) => {
                let r = r as isize;
                let norm = 1.0 / (2 * r + 1) as f64;
                let mut sum: f64 = (-r..=r).map(&v).sum();
                for x in 0..n as isize {
                    dst[x as usize * C + c] = (sum * norm) as f32;
                    sum += v(x + r + 1) - v(x - r);
                }
            }
            LineFilter::Stack(r) => {
                let r = r as isize;
                let norm = 1.0 / ((r + 1) * (r + 1)) as f64;
                let mut sum: f64 = (-r..=r).map(|i| (r + 1 - i.abs()) as f64 * v(i)).sum();
                let mut sum_out: f64 = (-r..=0).map(&v).sum();
                let mut sum_in: f64 = (1..=r).map(&v).sum();
                for x in 0..n as isize {
                    dst[x as usize * C + c] = (sum * norm) as f32;
                    let incoming = v(x + r + 1);
                    let next = v(x + 1);
                    sum += sum_in - sum_out + incoming;
                    sum_out += next - v(x - r);
                    sum_in += incoming - next;
                }
            }
        }
    }
}

/// Run `filters` in sequence along every row.
pub(crate) fn filter_rows<const C: usize>(
    src: &Image<f32, C>,
    filters: &[LineFilter],
    edge_mode: EdgeMode,
    border: [f32; C],
    processed: usize,
) -> Image<f32, C> {
    let stride = src.row_stride();
    if filters.is_empty() || stride == 0 {
        return src.clone();
    }

    let max_r = filters.iter().map(LineFilter::radius).max().unwrap_or(0);
    let map = AxisMap::new(edge_mode, src.width(), max_r, max_r + 1);

    let mut dst = src.clone();
    let src_data = src.as_slice();
    parallel::par_rows_mut(dst.as_slice_mut(), stride, |y, dst_row| {
        let mut line = src_data[y * stride..(y + 1) * stride].to_vec();
        for (i, filter) in filters.iter().enumerate() {
            if i + 1 == filters.len() {
                filter_line(&line, dst_row, *filter, &map, &border, processed);
            } else {
                let mut next = vec![0f32; stride];
                filter_line(&line, &mut next, *filter, &map, &border, processed);
                line = next;
            }
        }
    });
    dst
}

/// Run `filters` along rows, then along columns.
///
/// The row pass completes over the whole raster before the column pass reads it.
pub(crate) fn filter_2d<const C: usize>(
    src: &Image<f32, C>,
    filters: &[LineFilter],
    edge_mode: EdgeMode,
    border: [f32; C],
    processed: usize,
) -> Image<f32, C> {
    let rows = filter_rows(src, filters, edge_mode, border, processed);
    let columns = filter_rows(&transpose(&rows), filters, edge_mode, border, processed);
    transpose(&columns)
}

/// Box radii whose cascade approximates a gaussian of the given sigma.
///
/// Standard "boxes for gauss" derivation: `n` boxes of widths `wl` or `wl + 2`
/// chosen so that the summed variance matches `sigma²`.
pub(crate) fn boxes_for_gauss(sigma: f32, n: usize) -> Vec<usize> {
    let n_f = n as f32;
    let w_ideal = (12.0 * sigma * sigma / n_f + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i64;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;
    let wl_f = wl as f32;
    let m_ideal =
        (12.0 * sigma * sigma - n_f * wl_f * wl_f - 4.0 * n_f * wl_f - 3.0 * n_f) / (-4.0 * wl_f - 4.0);
    let m = m_ideal.round().max(0.0) as usize;

    (0..n)
        .map(|i| {
            let w = if i < m { wl } else { wu };
            ((w - 1) / 2) as usize
        })
        .collect()
}
