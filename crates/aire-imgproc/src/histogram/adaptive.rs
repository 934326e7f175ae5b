use aire_image::{Image, ImageError};
use rayon::prelude::*;

use super::equalize::{decompose, recompose};
use super::{bin_of, ensure_bins, equalization_lut, HistogramSpace, TileGrid};
use crate::tone::ensure_rgb;

/// Bins used by [`equalize_hist_squares`].
pub const SQUARES_BINS: usize = 101;

/// Adaptive histogram equalization parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AheConfig {
    /// Tiles along each axis.
    pub grid: TileGrid,
    /// Space whose lightness is equalized.
    pub space: HistogramSpace,
    /// Histogram bins per tile, at least 2.
    pub bins: usize,
}

impl Default for AheConfig {
    fn default() -> Self {
        Self {
            grid: TileGrid::default(),
            space: HistogramSpace::default(),
            bins: 256,
        }
    }
}

impl AheConfig {
    /// Set the tile grid.
    pub fn with_grid(mut self, grid: TileGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Set the working space.
    pub fn with_space(mut self, space: HistogramSpace) -> Self {
        self.space = space;
        self
    }

    /// Set the bin count.
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Check the grid and bin count.
    pub fn validate(&self) -> Result<(), ImageError> {
        self.grid.validate()?;
        ensure_bins(self.bins)
    }
}

/// Contrast limited adaptive histogram equalization parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaheConfig {
    /// Clip level relative to the mean bin count; a bin may hold at most
    /// `mean * (1 + threshold)` samples.
    pub threshold: f32,
    /// Tiles along each axis.
    pub grid: TileGrid,
    /// Space whose lightness is equalized.
    pub space: HistogramSpace,
    /// Histogram bins per tile, at least 2.
    pub bins: usize,
}

impl Default for ClaheConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            grid: TileGrid::default(),
            space: HistogramSpace::default(),
            bins: 256,
        }
    }
}

impl ClaheConfig {
    /// Default parameters with the given clip threshold.
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    /// Set the tile grid.
    pub fn with_grid(mut self, grid: TileGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Set the working space.
    pub fn with_space(mut self, space: HistogramSpace) -> Self {
        self.space = space;
        self
    }

    /// Set the bin count.
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Check the threshold, grid and bin count.
    pub fn validate(&self) -> Result<(), ImageError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ImageError::InvalidParameter(
                "threshold",
                format!("must be finite and >= 0, got {}", self.threshold),
            ));
        }
        self.grid.validate()?;
        ensure_bins(self.bins)
    }
}

/// Tile layout over one image.
struct Tiles {
    nx: usize,
    ny: usize,
    width: usize,
    height: usize,
}

impl Tiles {
    fn new(grid: TileGrid, width: usize, height: usize) -> Self {
        Self {
            nx: grid.columns.min(width),
            ny: grid.rows.min(height),
            width,
            height,
        }
    }

    fn span(i: usize, n: usize, len: usize) -> (usize, usize) {
        (i * len / n, (i + 1) * len / n)
    }

    /// Tile of every coordinate along one axis.
    fn owners(n: usize, len: usize) -> Vec<usize> {
        let mut owner = vec![0; len];
        for i in 0..n {
            let (start, end) = Self::span(i, n, len);
            owner[start..end].fill(i);
        }
        owner
    }

    /// The two neighbouring tiles around `p` and the weight of the second.
    fn neighbours(p: usize, n: usize, len: usize) -> (usize, usize, f32) {
        let g = (p as f32 + 0.5) * n as f32 / len as f32 - 0.5;
        let i0 = (g.floor().max(0.0) as usize).min(n - 1);
        let i1 = (i0 + 1).min(n - 1);
        if i0 == i1 {
            return (i0, i1, 0.0);
        }
        (i0, i1, (g - i0 as f32).clamp(0.0, 1.0))
    }

    /// One equalization table per tile, row-major.
    fn luts(&self, planes: &[[f32; 3]], li: usize, bins: usize, clip: Option<f32>) -> Vec<Vec<f32>> {
        (0..self.nx * self.ny)
            .into_par_iter()
            .map(|t| {
                let (x0, x1) = Self::span(t % self.nx, self.nx, self.width);
                let (y0, y1) = Self::span(t / self.nx, self.ny, self.height);
                let mut hist = vec![0.0f64; bins];
                for y in y0..y1 {
                    for p in &planes[y * self.width + x0..y * self.width + x1] {
                        hist[bin_of(p[li], bins)] += 1.0;
                    }
                }
                if let Some(threshold) = clip {
                    clip_histogram(&mut hist, threshold);
                }
                equalization_lut(&hist)
            })
            .collect()
    }
}

/// Cap every bin at `mean * (1 + threshold)` and spread the excess evenly.
fn clip_histogram(hist: &mut [f64], threshold: f32) {
    let total: f64 = hist.iter().sum();
    let limit = total / hist.len() as f64 * (1.0 + threshold as f64);
    let mut excess = 0.0;
    for h in hist.iter_mut() {
        if *h > limit {
            excess += *h - limit;
            *h = limit;
        }
    }
    let share = excess / hist.len() as f64;
    hist.iter_mut().for_each(|h| *h += share);
}

fn adaptive<const C: usize>(
    src: &Image<u8, C>,
    grid: TileGrid,
    space: HistogramSpace,
    bins: usize,
    clip: Option<f32>,
) -> Image<u8, C> {
    let (width, height) = (src.width(), src.height());
    if width == 0 || height == 0 {
        return src.clone();
    }
    let tiles = Tiles::new(grid, width, height);
    let planes = decompose(src, space);
    let luts = tiles.luts(&planes, space.lightness_index(), bins, clip);
    let columns: Vec<_> = (0..width)
        .map(|x| Tiles::neighbours(x, tiles.nx, width))
        .collect();

    recompose(src, &planes, space, |x, y, l| {
        let b = bin_of(l, bins);
        let (ty0, ty1, fy) = Tiles::neighbours(y, tiles.ny, height);
        let (tx0, tx1, fx) = columns[x];
        let at = |tx: usize, ty: usize| luts[ty * tiles.nx + tx][b];
        let top = at(tx0, ty0) * (1.0 - fx) + at(tx1, ty0) * fx;
        let bottom = at(tx0, ty1) * (1.0 - fx) + at(tx1, ty1) * fx;
        top * (1.0 - fy) + bottom * fy
    })
}

/// Equalize every tile of `grid` on its own, without blending.
///
/// Works on HSV value with [`SQUARES_BINS`] bins. Tile seams stay visible.
///
/// # Errors
///
/// Returns an error if a grid dimension is zero or the raster has fewer than
/// three channels.
pub fn equalize_hist_squares<const C: usize>(
    src: &Image<u8, C>,
    grid: TileGrid,
) -> Result<Image<u8, C>, ImageError> {
    ensure_rgb::<C>("equalize_hist_squares")?;
    grid.validate()?;
    let (width, height) = (src.width(), src.height());
    if width == 0 || height == 0 {
        return Ok(src.clone());
    }
    log::debug!("equalize_hist_squares: {} {grid:?}", src.size());

    let space = HistogramSpace::Hsv;
    let tiles = Tiles::new(grid, width, height);
    let planes = decompose(src, space);
    let luts = tiles.luts(&planes, space.lightness_index(), SQUARES_BINS, None);
    let columns = Tiles::owners(tiles.nx, width);
    let rows = Tiles::owners(tiles.ny, height);

    Ok(recompose(src, &planes, space, |x, y, l| {
        luts[rows[y] * tiles.nx + columns[x]][bin_of(l, SQUARES_BINS)]
    }))
}

/// Adaptive histogram equalization.
///
/// Every tile gets its own equalization table; each pixel blends the tables
/// of the four nearest tile centers bilinearly.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the raster has fewer
/// than three channels.
pub fn ahe<const C: usize>(src: &Image<u8, C>, config: &AheConfig) -> Result<Image<u8, C>, ImageError> {
    ensure_rgb::<C>("ahe")?;
    config.validate()?;
    log::debug!("ahe: {} {config:?}", src.size());
    Ok(adaptive(src, config.grid, config.space, config.bins, None))
}

/// Contrast limited adaptive histogram equalization.
///
/// Like [`ahe`], but every tile histogram is clipped before it is
/// accumulated, which bounds the slope of the mapping.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the raster has fewer
/// than three channels.
///
/// # Example
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::histogram::{clahe, ClaheConfig, TileGrid};
///
/// let img = Image::<u8, 4>::from_fn([32, 32].into(), |x, y| {
///     let v = (96 + (x + y) % 32) as u8;
///     [v, v, v, 255]
/// });
/// let config = ClaheConfig::new(0.5).with_grid(TileGrid::new(4, 4));
/// let out = clahe(&img, &config).unwrap();
/// assert_eq!(out.size(), img.size());
/// ```
pub fn clahe<const C: usize>(
    src: &Image<u8, C>,
    config: &ClaheConfig,
) -> Result<Image<u8, C>, ImageError> {
    ensure_rgb::<C>("clahe")?;
    config.validate()?;
    log::debug!("clahe: {} {config:?}", src.size());
    Ok(adaptive(
        src,
        config.grid,
        config.space,
        config.bins,
        Some(config.threshold),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> Image<u8, 4> {
        Image::from_fn([40, 24].into(), |x, _| {
            let v = (100 + x) as u8;
            [v, v, v, 17]
        })
    }

    #[test]
    fn clipping_preserves_the_total() {
        let mut hist = vec![0.0, 10.0, 0.0, 2.0];
        clip_histogram(&mut hist, 0.0);
        assert!((hist.iter().sum::<f64>() - 12.0).abs() < 1e-9);
        // limit 3, excess 7 spread over four bins
        assert_eq!(hist, vec![1.75, 4.75, 1.75, 3.75]);
    }

    #[test]
    fn tile_neighbours_clamp_at_the_edges() {
        assert_eq!(Tiles::neighbours(0, 4, 40), (0, 1, 0.0));
        assert_eq!(Tiles::neighbours(39, 4, 40), (3, 3, 0.0));
        let (i0, i1, f) = Tiles::neighbours(10, 4, 40);
        assert_eq!((i0, i1), (0, 1));
        assert!((f - 0.55).abs() < 1e-6);
        assert_eq!(Tiles::owners(3, 7), vec![0, 0, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn flat_image_stays_close() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_size_val([24, 24].into(), 120)?;
        let out = clahe(&img, &ClaheConfig::default())?;
        for (a, b) in out.as_slice().iter().zip(img.as_slice()) {
            assert!(a.abs_diff(*b) <= 2, "{a} {b}");
        }
        Ok(())
    }

    #[test]
    fn ahe_stretches_and_keeps_alpha() -> Result<(), ImageError> {
        let img = gradient();
        let config = AheConfig::default().with_grid(TileGrid::new(1, 1));
        let out = ahe(&img, &config)?;
        assert_eq!(out.pixel(0, 0)[0], 0);
        assert_eq!(out.pixel(39, 0)[0], 255);
        assert!(out.as_slice().chunks_exact(4).all(|p| p[3] == 17));
        Ok(())
    }

    #[test]
    fn clahe_limits_contrast_gain() -> Result<(), ImageError> {
        let img = gradient();
        let grid = TileGrid::new(2, 2);
        let full = ahe(&img, &AheConfig::default().with_grid(grid))?;
        let limited = clahe(&img, &ClaheConfig::new(0.0).with_grid(grid))?;
        let spread = |im: &Image<u8, 4>| im.pixel(39, 12)[0] as i32 - im.pixel(0, 12)[0] as i32;
        assert!(spread(&limited) < spread(&full));
        Ok(())
    }

    #[test]
    fn squares_equalize_each_tile() -> Result<(), ImageError> {
        let img = gradient();
        let out = equalize_hist_squares(&img, TileGrid::new(2, 1))?;
        assert_eq!(out.pixel(0, 0)[0], 0);
        assert_eq!(out.pixel(19, 0)[0], 255);
        assert_eq!(out.pixel(20, 0)[0], 0);
        assert_eq!(out.pixel(39, 0)[0], 255);
        Ok(())
    }

    #[test]
    fn invalid_configurations() -> Result<(), ImageError> {
        let img = gradient();
        let zero = TileGrid::new(0, 4);
        assert_eq!(
            clahe(&img, &ClaheConfig::default().with_grid(zero)),
            Err(ImageError::InvalidGridSize(0, 4))
        );
        assert_eq!(
            ahe(&img, &AheConfig::default().with_bins(1)),
            Err(ImageError::InvalidHistogramBins(1))
        );
        assert!(matches!(
            clahe(&img, &ClaheConfig::new(-1.0)),
            Err(ImageError::InvalidParameter("threshold", _))
        ));
        assert_eq!(
            equalize_hist_squares(&img, zero),
            Err(ImageError::InvalidGridSize(0, 4))
        );
        Ok(())
    }
}
