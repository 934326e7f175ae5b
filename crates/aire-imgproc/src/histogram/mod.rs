//! Histogram equalization.
//!
//! Global equalization works per RGB channel or on the lightness of a
//! [`HistogramSpace`]; the tiled variants build one mapping per tile of a
//! [`TileGrid`] and either apply it per tile or blend neighbouring tiles
//! bilinearly (AHE, CLAHE).

use aire_image::{Image, ImageError};
use rayon::prelude::*;

mod adaptive;
pub use adaptive::*;

mod equalize;
pub use equalize::*;

mod space;
pub use space::HistogramSpace;

/// Compute the pixel intensity histogram of an image.
///
/// NOTE: this is limited to 8-bit 1-channel images.
///
/// # Arguments
///
/// * `src` - The input image to compute the histogram.
/// * `hist` - The output histogram, counts are added to it.
/// * `num_bins` - The number of bins to use for the histogram.
///
/// # Errors
///
/// Returns an error if the number of bins is outside `1..=256` or does not
/// match the length of `hist`.
///
/// # Example
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::histogram::compute_histogram;
///
/// let image = Image::<u8, 1>::new(
///     [3, 3].into(),
///     vec![0, 2, 4, 128, 130, 132, 254, 255, 255],
/// ).unwrap();
///
/// let mut histogram = vec![0; 3];
/// compute_histogram(&image, &mut histogram, 3).unwrap();
/// assert_eq!(histogram, vec![3, 3, 3]);
/// ```
pub fn compute_histogram(
    src: &Image<u8, 1>,
    hist: &mut [usize],
    num_bins: usize,
) -> Result<(), ImageError> {
    if num_bins == 0 || num_bins > 256 || hist.len() != num_bins {
        return Err(ImageError::InvalidHistogramBins(num_bins));
    }

    let bin_lut: [usize; 256] = std::array::from_fn(|i| (i * num_bins) >> 8);

    let counts = src
        .as_slice()
        .par_chunks(4096)
        .fold(
            || vec![0usize; num_bins],
            |mut local, chunk| {
                for &px in chunk {
                    local[bin_lut[px as usize]] += 1;
                }
                local
            },
        )
        .reduce(
            || vec![0usize; num_bins],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(a, b)| *a += b);
                a
            },
        );

    hist.iter_mut().zip(counts).for_each(|(h, c)| *h += c);
    Ok(())
}

/// Number of tiles along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    /// Tiles per row.
    pub columns: usize,
    /// Tiles per column.
    pub rows: usize,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self {
            columns: 8,
            rows: 8,
        }
    }
}

impl TileGrid {
    /// A `columns x rows` grid.
    pub fn new(columns: usize, rows: usize) -> Self {
        Self { columns, rows }
    }

    /// Check that both dimensions are positive.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidGridSize`] if either dimension is zero.
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ImageError::InvalidGridSize(self.columns, self.rows));
        }
        Ok(())
    }
}

pub(crate) fn ensure_bins(bins: usize) -> Result<(), ImageError> {
    if !(2..=65536).contains(&bins) {
        return Err(ImageError::InvalidHistogramBins(bins));
    }
    Ok(())
}

/// Bin of a value in `[0, 1]`.
#[inline]
pub(crate) fn bin_of(v: f32, bins: usize) -> usize {
    ((v.clamp(0.0, 1.0) * (bins - 1) as f32).round() as usize).min(bins - 1)
}

/// Map every bin through the normalized cumulative histogram.
///
/// The lowest occupied bin maps to `0` and the highest to `1`. A histogram
/// with at most one occupied bin maps every bin to itself.
pub(crate) fn equalization_lut(hist: &[f64]) -> Vec<f32> {
    let bins = hist.len();
    let identity = || {
        (0..bins)
            .map(|b| b as f32 / (bins - 1).max(1) as f32)
            .collect::<Vec<_>>()
    };
    let total: f64 = hist.iter().sum();
    let Some(first) = hist.iter().position(|&h| h > 0.0) else {
        return identity();
    };
    let cdf_min = hist[first];
    let range = total - cdf_min;
    if range <= f64::EPSILON * total {
        return identity();
    }
    let mut acc = 0.0;
    hist.iter()
        .map(|&h| {
            acc += h;
            ((acc - cdf_min) / range).clamp(0.0, 1.0) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_histogram() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new(
            [3, 3].into(),
            vec![0, 2, 4, 128, 130, 132, 254, 255, 255],
        )?;
        let mut histogram = vec![0; 3];
        compute_histogram(&image, &mut histogram, 3)?;
        assert_eq!(histogram, vec![3, 3, 3]);

        let mut wrong = vec![0; 2];
        assert_eq!(
            compute_histogram(&image, &mut wrong, 3),
            Err(ImageError::InvalidHistogramBins(3))
        );
        Ok(())
    }

    #[test]
    fn lut_spreads_occupied_bins() {
        let lut = equalization_lut(&[0.0, 2.0, 0.0, 2.0, 0.0]);
        assert_eq!(lut, vec![0.0, 0.0, 0.0, 1.0, 1.0]);
        let lut = equalization_lut(&[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(lut, vec![0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0]);
    }

    #[test]
    fn degenerate_histograms_are_identity() {
        let lut = equalization_lut(&[0.0, 5.0, 0.0]);
        assert_eq!(lut, vec![0.0, 0.5, 1.0]);
        let lut = equalization_lut(&[0.0; 3]);
        assert_eq!(lut, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn grid_validation() {
        assert!(TileGrid::default().validate().is_ok());
        assert_eq!(
            TileGrid::new(0, 3).validate(),
            Err(ImageError::InvalidGridSize(0, 3))
        );
    }
}
