use aire_image::{Image, ImageDtype, ImageError};

use crate::color::ColorSpace;

/// Policy for reading samples outside the raster.
///
/// Illustrated on the row `abcdefgh` extended to the left:
///
/// ```text
/// Clamp       aaaaaa|abcdefgh
/// Wrap        cdefgh|abcdefgh
/// Reflect     fedcba|abcdefgh
/// Reflect101  gfedcb|abcdefgh
/// Constant    kkkkkk|abcdefgh
/// ```
///
/// where `k` is the border scalar supplied with the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EdgeMode {
    /// Replicate the nearest edge sample.
    #[default]
    Clamp,
    /// Tile the raster periodically.
    Wrap,
    /// Mirror including the edge sample.
    Reflect,
    /// Mirror excluding the edge sample.
    Reflect101,
    /// Use a caller supplied value.
    Constant,
}

impl EdgeMode {
    /// Map a possibly out-of-range coordinate onto `[0, len)`.
    ///
    /// Returns `None` for [`EdgeMode::Constant`] when the coordinate lies outside,
    /// meaning the border scalar must be used instead. Every mode returns `None`
    /// when `len` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use aire_imgproc::EdgeMode;
    ///
    /// assert_eq!(EdgeMode::Clamp.map_index(-3, 8), Some(0));
    /// assert_eq!(EdgeMode::Wrap.map_index(-1, 8), Some(7));
    /// assert_eq!(EdgeMode::Reflect.map_index(-1, 8), Some(0));
    /// assert_eq!(EdgeMode::Reflect101.map_index(-1, 8), Some(1));
    /// assert_eq!(EdgeMode::Constant.map_index(8, 8), None);
    /// ```
    #[inline]
    pub fn map_index(&self, i: isize, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let n = len as isize;
        if (0..n).contains(&i) {
            return Some(i as usize);
        }

        let mapped = match self {
            EdgeMode::Clamp => i.clamp(0, n - 1),
            EdgeMode::Wrap => i.rem_euclid(n),
            EdgeMode::Reflect => {
                // period 2n: abcd|dcba
                let period = 2 * n;
                let m = i.rem_euclid(period);
                if m < n {
                    m
                } else {
                    period - 1 - m
                }
            }
            EdgeMode::Reflect101 => {
                if n == 1 {
                    0
                } else {
                    // period 2n-2: abcd|cb
                    let period = 2 * n - 2;
                    let m = i.rem_euclid(period);
                    if m < n {
                        m
                    } else {
                        period - m
                    }
                }
            }
            EdgeMode::Constant => return None,
        };

        Some(mapped as usize)
    }

    /// Human readable name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            EdgeMode::Clamp => "Clamp",
            EdgeMode::Wrap => "Wrap",
            EdgeMode::Reflect => "Reflect",
            EdgeMode::Reflect101 => "Reflect101",
            EdgeMode::Constant => "Constant",
        }
    }

    /// Reject [`EdgeMode::Constant`] for operations that cannot honour it.
    pub(crate) fn reject_constant(&self, operation: &'static str) -> Result<(), ImageError> {
        match self {
            EdgeMode::Constant => Err(ImageError::UnsupportedEdgeMode(
                operation,
                self.name().to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-channel fill value for [`EdgeMode::Constant`], in 8-bit sample units.
///
/// Rasters with fewer than four channels use the leading entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Scalar(pub [u8; 4]);

impl Scalar {
    /// The same value in every channel.
    pub fn splat(v: u8) -> Self {
        Self([v; 4])
    }

    /// The fill value expressed in the sample type `T`.
    pub fn channels<T: ImageDtype, const C: usize>(&self) -> [T; C] {
        std::array::from_fn(|c| {
            let v = self.0.get(c).copied().unwrap_or_default();
            T::from_f32(v as f32 / 255.0 * T::MAX)
        })
    }

    /// The fill value converted into a working colour space.
    pub fn working<const C: usize>(&self, space: ColorSpace) -> [f32; C] {
        let mut out: [f32; C] = self.channels();
        if C >= 3 {
            let rgb = match space.transfer() {
                Some(tf) => [0, 1, 2].map(|c| tf.linearize(out[c])),
                None => [out[0], out[1], out[2]],
            };
            out[..3].copy_from_slice(&space.from_linear(rgb));
        }
        out
    }
}

impl From<[u8; 4]> for Scalar {
    fn from(v: [u8; 4]) -> Self {
        Self(v)
    }
}

/// Read the pixel at a possibly out-of-range coordinate.
///
/// # Arguments
///
/// * `src` - The image to sample.
/// * `x` - Column, may be negative or past the last column.
/// * `y` - Row, may be negative or past the last row.
/// * `mode` - The edge policy.
/// * `border` - The value returned for [`EdgeMode::Constant`] outside the raster.
///
/// # Examples
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::border::sample;
/// use aire_imgproc::EdgeMode;
///
/// let img = Image::<u8, 1>::new([3, 1].into(), vec![1, 2, 3]).unwrap();
/// assert_eq!(sample(&img, -1, 0, EdgeMode::Clamp, &[9]), [1]);
/// assert_eq!(sample(&img, -1, 0, EdgeMode::Constant, &[9]), [9]);
/// ```
#[inline]
pub fn sample<T: Copy, const C: usize>(
    src: &Image<T, C>,
    x: isize,
    y: isize,
    mode: EdgeMode,
    border: &[T; C],
) -> [T; C] {
    match (
        mode.map_index(x, src.width()),
        mode.map_index(y, src.height()),
    ) {
        (Some(xi), Some(yi)) => {
            let mut px = *border;
            px.copy_from_slice(src.pixel(xi, yi));
            px
        }
        _ => *border,
    }
}

/// Precomputed coordinate mapping for one axis.
///
/// Engines build one table per axis before touching pixels so that the inner
/// loops only index into a slice. `get(i)` accepts `i` in `-before..len + after`.
#[derive(Debug, Clone)]
pub(crate) struct AxisMap {
    before: usize,
    table: Vec<Option<usize>>,
}

impl AxisMap {
    pub(crate) fn new(mode: EdgeMode, len: usize, before: usize, after: usize) -> Self {
        let table = (-(before as isize)..(len + after) as isize)
            .map(|i| mode.map_index(i, len))
            .collect();
        Self { before, table }
    }

    #[inline]
    pub(crate) fn get(&self, i: isize) -> Option<usize> {
        self.table[(i + self.before as isize) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extend(mode: EdgeMode) -> String {
        let row = b"abcdefgh";
        (-6..0)
            .map(|i| match mode.map_index(i, row.len()) {
                Some(j) => row[j] as char,
                None => 'k',
            })
            .collect()
    }

    #[test]
    fn extensions_match_table() {
        assert_eq!(extend(EdgeMode::Clamp), "aaaaaa");
        assert_eq!(extend(EdgeMode::Wrap), "cdefgh");
        assert_eq!(extend(EdgeMode::Reflect), "fedcba");
        assert_eq!(extend(EdgeMode::Reflect101), "gfedcb");
        assert_eq!(extend(EdgeMode::Constant), "kkkkkk");
    }

    #[test]
    fn right_side() {
        assert_eq!(EdgeMode::Clamp.map_index(9, 8), Some(7));
        assert_eq!(EdgeMode::Wrap.map_index(9, 8), Some(1));
        assert_eq!(EdgeMode::Reflect.map_index(8, 8), Some(7));
        assert_eq!(EdgeMode::Reflect.map_index(9, 8), Some(6));
        assert_eq!(EdgeMode::Reflect101.map_index(8, 8), Some(6));
        assert_eq!(EdgeMode::Reflect101.map_index(9, 8), Some(5));
    }

    #[test]
    fn far_out_of_range_stays_in_bounds() {
        for mode in [
            EdgeMode::Clamp,
            EdgeMode::Wrap,
            EdgeMode::Reflect,
            EdgeMode::Reflect101,
        ] {
            for len in 1..5 {
                for i in -40..40 {
                    let j = mode.map_index(i, len);
                    assert!(matches!(j, Some(j) if j < len), "{mode} {i} {len}");
                }
            }
        }
    }

    #[test]
    fn single_sample_axis() {
        assert_eq!(EdgeMode::Reflect.map_index(-3, 1), Some(0));
        assert_eq!(EdgeMode::Reflect101.map_index(5, 1), Some(0));
        assert_eq!(EdgeMode::Clamp.map_index(0, 0), None);
    }

    #[test]
    fn axis_map_matches_direct_mapping() {
        let map = AxisMap::new(EdgeMode::Reflect101, 5, 3, 4);
        for i in -3..9 {
            assert_eq!(map.get(i), EdgeMode::Reflect101.map_index(i, 5));
        }
    }

    #[test]
    fn scalar_channels() {
        let s = Scalar([255, 0, 51, 7]);
        assert_eq!(s.channels::<u8, 2>(), [255, 0]);
        let f: [f32; 4] = s.channels();
        assert_eq!(f[0], 1.0);
        assert_eq!(f[2], 0.2);
        let lin: [f32; 4] = Scalar::splat(255).working(ColorSpace::default());
        approx::assert_relative_eq!(lin[1], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn constant_is_rejected_by_name() {
        assert_eq!(
            EdgeMode::Constant.reject_constant("stack_blur"),
            Err(ImageError::UnsupportedEdgeMode(
                "stack_blur",
                "Constant".to_string()
            ))
        );
        assert!(EdgeMode::Wrap.reject_constant("stack_blur").is_ok());
    }
}
