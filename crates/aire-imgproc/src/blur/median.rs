use aire_image::{Image, ImageError};

use crate::border::{AxisMap, EdgeMode, Scalar};
use crate::filter::kernels;
use crate::parallel;

/// Parameters of [`median_blur`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedianBlurConfig {
    /// Window size, odd.
    pub kernel_size: usize,
    /// Out-of-bounds policy.
    pub edge_mode: EdgeMode,
    /// Fill value for [`EdgeMode::Constant`].
    pub border: Scalar,
}

impl Default for MedianBlurConfig {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            edge_mode: EdgeMode::Reflect101,
            border: Scalar::default(),
        }
    }
}

impl MedianBlurConfig {
    /// Median over a `kernel_size` square window.
    pub fn new(kernel_size: usize) -> Self {
        Self {
            kernel_size,
            ..Default::default()
        }
    }

    /// Set the edge mode.
    pub fn with_edge_mode(mut self, edge_mode: EdgeMode) -> Self {
        self.edge_mode = edge_mode;
        self
    }

    /// Set the constant border.
    pub fn with_border(mut self, border: Scalar) -> Self {
        self.border = border;
        self
    }

    /// Check the window size.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel size is even or zero.
    pub fn validate(&self) -> Result<(), ImageError> {
        kernels::ensure_odd(self.kernel_size)
    }
}

struct Histogram {
    bins: [u32; 256],
}

impl Histogram {
    fn median(&self, rank: u32) -> u8 {
        let mut seen = 0;
        for (v, &n) in self.bins.iter().enumerate() {
            seen += n;
            if seen > rank {
                return v as u8;
            }
        }
        u8::MAX
    }
}

/// Per channel median of a square window.
///
/// Each row keeps one 256-bin histogram per channel and slides it one column at
/// a time, so every step touches `2 * kernel_size` samples.
///
/// # Errors
///
/// Returns an error if the kernel size is even or zero.
pub fn median_blur<const C: usize>(
    src: &Image<u8, C>,
    config: &MedianBlurConfig,
) -> Result<Image<u8, C>, ImageError> {
    config.validate()?;
    log::debug!("median_blur: {} kernel {}", src.size(), config.kernel_size);
    if config.kernel_size == 1 {
        return Ok(src.clone());
    }

    let r = config.kernel_size / 2;
    let ri = r as isize;
    let rank = (config.kernel_size * config.kernel_size / 2) as u32;
    let border: [u8; C] = config.border.channels();
    let map_x = AxisMap::new(config.edge_mode, src.width(), r + 1, r + 1);
    let map_y = AxisMap::new(config.edge_mode, src.height(), r, r);
    let width = src.width();

    let mut dst = src.clone();
    parallel::par_rows_mut(dst.as_slice_mut(), src.row_stride(), |y, dst_row| {
        let value = |x: isize, y: isize, c: usize| -> u8 {
            match (map_x.get(x), map_y.get(y)) {
                (Some(sx), Some(sy)) => src.pixel(sx, sy)[c],
                _ => border[c],
            }
        };
        let y = y as isize;
        for c in 0..C {
            let mut hist = Histogram { bins: [0; 256] };
            for dy in -ri..=ri {
                for dx in -ri..=ri {
                    hist.bins[value(dx, y + dy, c) as usize] += 1;
                }
            }
            for x in 0..width {
                dst_row[x * C + c] = hist.median(rank);
                let xi = x as isize;
                for dy in -ri..=ri {
                    hist.bins[value(xi - ri, y + dy, c) as usize] -= 1;
                    hist.bins[value(xi + ri + 1, y + dy, c) as usize] += 1;
                }
            }
        }
    });
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_salt_noise() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_fn([7, 7].into(), |x, y| {
            [if (x, y) == (3, 3) || (x, y) == (0, 0) { 255 } else { 10 }]
        });
        let out = median_blur(&img, &MedianBlurConfig::new(3))?;
        assert!(out.as_slice().iter().all(|&v| v == 10));
        Ok(())
    }

    #[test]
    fn matches_sorted_window() -> Result<(), ImageError> {
        let img = Image::<u8, 2>::from_fn([6, 5].into(), |x, y| {
            [((x * 97 + y * 31) % 256) as u8, ((x * y * 13) % 256) as u8]
        });
        let config = MedianBlurConfig::new(3)
            .with_edge_mode(EdgeMode::Constant)
            .with_border(Scalar::splat(128));
        let out = median_blur(&img, &config)?;
        for y in 0..5isize {
            for x in 0..6isize {
                for c in 0..2 {
                    let mut window = Vec::new();
                    for dy in -1..=1 {
                        for dx in -1..=1 {
                            let (sx, sy) = (x + dx, y + dy);
                            window.push(if (0..6).contains(&sx) && (0..5).contains(&sy) {
                                img.pixel(sx as usize, sy as usize)[c]
                            } else {
                                128
                            });
                        }
                    }
                    window.sort_unstable();
                    assert_eq!(out.pixel(x as usize, y as usize)[c], window[4]);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn even_kernel() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;
        assert_eq!(
            median_blur(&img, &MedianBlurConfig::new(4)),
            Err(ImageError::InvalidKernelSize(4))
        );
        Ok(())
    }
}
