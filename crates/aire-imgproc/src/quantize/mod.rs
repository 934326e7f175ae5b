//! Palette quantization.
//!
//! A quantization pass builds a [`Palette`] of at most `max_colors` entries,
//! builds a [`NearestColorIndex`] over it and remaps every pixel, optionally
//! diffusing the quantization error to neighbours that are not mapped yet.
//!
//! Remapping without dithering runs in parallel over rows. Error diffusion
//! runs in raster order on one thread since every pixel depends on error
//! carried from the pixels before it.

use std::collections::HashSet;

use aire_image::{Image, ImageError};

use crate::parallel::{par_iter_rows, par_rows_mut};

mod dither;
pub use dither::{DiffusionKernel, DitherAlgorithm, FLOYD_STEINBERG, JARVIS_JUDICE_NINKE};
use dither::ErrorDiffusion;

mod median_cut;
mod nearest;
pub use nearest::*;

mod wu;

/// Largest palette a quantization pass produces.
pub const MAX_PALETTE_SIZE: usize = 256;

/// An ordered list of distinct RGBA colours.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    colors: Vec<[u8; 4]>,
}

impl Palette {
    /// Create a palette, dropping repeated colours but keeping first occurrences
    /// in order.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidColorCount`] if more than
    /// [`MAX_PALETTE_SIZE`] distinct colours remain.
    pub fn new(colors: Vec<[u8; 4]>) -> Result<Self, ImageError> {
        let mut seen = HashSet::with_capacity(colors.len());
        let colors: Vec<_> = colors.into_iter().filter(|c| seen.insert(*c)).collect();
        if colors.len() > MAX_PALETTE_SIZE {
            return Err(ImageError::InvalidColorCount(colors.len()));
        }
        Ok(Self { colors })
    }

    /// The colours in index order.
    pub fn colors(&self) -> &[[u8; 4]] {
        &self.colors
    }

    /// Number of colours.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the palette has no colours.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The colour at `index`.
    pub fn get(&self, index: usize) -> Option<[u8; 4]> {
        self.colors.get(index).copied()
    }
}

/// How the palette is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuantizeAlgorithm {
    /// Wu's greedy variance minimization.
    #[default]
    Wu,
    /// Recursive median splits of the colour histogram.
    MedianCut,
}

/// Quantization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizeConfig {
    /// Palette size limit, `1..=256`.
    pub max_colors: usize,
    /// Palette construction.
    pub algorithm: QuantizeAlgorithm,
    /// Error diffusion during remap.
    pub dither: DitherAlgorithm,
    /// Nearest colour search used during remap.
    pub strategy: NearestColorStrategy,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            max_colors: MAX_PALETTE_SIZE,
            algorithm: QuantizeAlgorithm::default(),
            dither: DitherAlgorithm::default(),
            strategy: NearestColorStrategy::default(),
        }
    }
}

impl QuantizeConfig {
    /// Default parameters with a palette of at most `max_colors`.
    pub fn new(max_colors: usize) -> Self {
        Self {
            max_colors,
            ..Default::default()
        }
    }

    /// Set the palette construction.
    pub fn with_algorithm(mut self, algorithm: QuantizeAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the dithering.
    pub fn with_dither(mut self, dither: DitherAlgorithm) -> Self {
        self.dither = dither;
        self
    }

    /// Set the nearest colour search.
    pub fn with_strategy(mut self, strategy: NearestColorStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Check the colour budget.
    pub fn validate(&self) -> Result<(), ImageError> {
        if !(1..=MAX_PALETTE_SIZE).contains(&self.max_colors) {
            return Err(ImageError::InvalidColorCount(self.max_colors));
        }
        Ok(())
    }
}

/// Result of a quantization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantized {
    /// The colours used.
    pub palette: Palette,
    /// Palette index of every pixel.
    pub indices: Image<u8, 1>,
    /// Every pixel replaced by its palette colour.
    pub remapped: Image<u8, 4>,
}

/// Build the palette of `src` without remapping.
///
/// Rasters with at most `max_colors` distinct colours keep exactly those,
/// in order of first appearance.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn build_palette(src: &Image<u8, 4>, config: &QuantizeConfig) -> Result<Palette, ImageError> {
    config.validate()?;

    let mut seen = HashSet::new();
    let mut distinct = Vec::new();
    for px in src.as_slice().chunks_exact(4) {
        let c = [px[0], px[1], px[2], px[3]];
        if seen.insert(c) {
            distinct.push(c);
            if distinct.len() > config.max_colors {
                break;
            }
        }
    }
    if distinct.len() <= config.max_colors {
        return Palette::new(distinct);
    }

    let colors = match config.algorithm {
        QuantizeAlgorithm::Wu => wu::wu(src.as_slice(), config.max_colors),
        QuantizeAlgorithm::MedianCut => median_cut::median_cut(src.as_slice(), config.max_colors),
    };
    Palette::new(colors)
}

/// Reduce `src` to at most `config.max_colors` colours.
///
/// # Errors
///
/// Returns [`ImageError::InvalidColorCount`] if `max_colors` is outside
/// `1..=256`.
///
/// # Example
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::quantize::{quantize, DitherAlgorithm, QuantizeConfig};
///
/// let img = Image::<u8, 4>::from_fn([16, 16].into(), |x, y| {
///     [(x * 16) as u8, (y * 16) as u8, 128, 255]
/// });
/// let config = QuantizeConfig::new(8).with_dither(DitherAlgorithm::FloydSteinberg);
/// let out = quantize(&img, &config).unwrap();
/// assert!(out.palette.len() <= 8);
/// assert_eq!(out.remapped.size(), img.size());
/// ```
pub fn quantize(src: &Image<u8, 4>, config: &QuantizeConfig) -> Result<Quantized, ImageError> {
    let palette = build_palette(src, config)?;
    log::debug!(
        "quantize: {} {:?} -> {} colors",
        src.size(),
        config.algorithm,
        palette.len()
    );
    remap(src, &palette, config.dither, config.strategy)
}

/// Build the palette from `source` and remap `target` with it.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or `source` is empty
/// while `target` is not.
pub fn copy_palette(
    source: &Image<u8, 4>,
    target: &Image<u8, 4>,
    config: &QuantizeConfig,
) -> Result<Quantized, ImageError> {
    let palette = build_palette(source, config)?;
    log::debug!(
        "copy_palette: {} colors from {} onto {}",
        palette.len(),
        source.size(),
        target.size()
    );
    remap(target, &palette, config.dither, config.strategy)
}

/// Map every pixel of `src` to an entry of `palette`.
///
/// Alpha takes part in the nearest colour search but carries no error.
///
/// # Errors
///
/// Returns [`ImageError::InvalidColorCount`] if the palette is empty while
/// `src` is not.
pub fn remap(
    src: &Image<u8, 4>,
    palette: &Palette,
    dither: DitherAlgorithm,
    strategy: NearestColorStrategy,
) -> Result<Quantized, ImageError> {
    let size = src.size();
    if palette.is_empty() && !size.is_empty() {
        return Err(ImageError::InvalidColorCount(0));
    }
    let index = strategy.build(palette);
    let colors = palette.colors();
    let width = src.width();

    let mut indices = Image::<u8, 1>::from_size_val(size, 0)?;
    match dither.kernel() {
        None => par_rows_mut(indices.as_slice_mut(), width, |y, row| {
            for (x, out) in row.iter_mut().enumerate() {
                let p = src.pixel(x, y);
                *out = index.nearest([p[0], p[1], p[2], p[3]]) as u8;
            }
        }),
        Some(kernel) => {
            let out = indices.as_slice_mut();
            let mut state = ErrorDiffusion::new(kernel, width);
            for y in 0..src.height() {
                for x in 0..width {
                    let p = src.pixel(x, y);
                    let error = state.take(x);
                    let wanted: [f32; 3] =
                        std::array::from_fn(|c| (p[c] as f32 + error[c]).clamp(0.0, 255.0));
                    let query = [
                        wanted[0].round() as u8,
                        wanted[1].round() as u8,
                        wanted[2].round() as u8,
                        p[3],
                    ];
                    let i = index.nearest(query);
                    out[y * width + x] = i as u8;
                    let chosen = colors[i];
                    state.diffuse(x, std::array::from_fn(|c| wanted[c] - chosen[c] as f32));
                }
                state.next_row();
            }
        }
    }

    let mut remapped = Image::<u8, 4>::from_size_val(size, 0)?;
    par_iter_rows(&indices, &mut remapped, |s, d| {
        d.copy_from_slice(&colors[s[0] as usize]);
    });

    Ok(Quantized {
        palette: palette.clone(),
        indices,
        remapped,
    })
}
