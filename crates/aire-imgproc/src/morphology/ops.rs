use aire_image::{ops::saturating_sub, Image, ImageError};

use super::StructuringElement;
use crate::border::{AxisMap, EdgeMode, Scalar};
use crate::parallel;

/// Morphological operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MorphOp {
    /// Neighbourhood maximum.
    #[default]
    Dilate,
    /// Neighbourhood minimum.
    Erode,
    /// `dilate(erode(x))`.
    Opening,
    /// `erode(dilate(x))`.
    Closing,
    /// `dilate(x) - erode(x)`.
    Gradient,
    /// `x - opening(x)`.
    TopHat,
    /// `closing(x) - x`.
    BlackHat,
}

/// Which channels the operator touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MorphMode {
    /// Colour channels only, the fourth channel of a 4-channel raster is copied.
    Rgb,
    /// Every channel, alpha included.
    #[default]
    Rgba,
}

impl MorphMode {
    fn processed_channels(&self, channels: usize) -> usize {
        match self {
            MorphMode::Rgb if channels == 4 => 3,
            _ => channels,
        }
    }
}

/// Parameters of [`morphology`].
#[derive(Debug, Clone, PartialEq)]
pub struct MorphologyConfig {
    /// The operator.
    pub op: MorphOp,
    /// Channels to process.
    pub mode: MorphMode,
    /// Out-of-bounds policy.
    pub edge_mode: EdgeMode,
    /// Fill value for [`EdgeMode::Constant`].
    pub border: Scalar,
    /// The neighbourhood.
    pub element: StructuringElement,
}

impl MorphologyConfig {
    /// `op` over `element` on every channel with clamped edges.
    pub fn new(op: MorphOp, element: StructuringElement) -> Self {
        Self {
            op,
            mode: MorphMode::Rgba,
            edge_mode: EdgeMode::Clamp,
            border: Scalar::default(),
            element,
        }
    }

    /// Set the channel mode.
    pub fn with_mode(mut self, mode: MorphMode) -> Self {
        self.mode = mode;
        self
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

    /// Check the structuring element.
    ///
    /// # Errors
    ///
    /// Returns an error if the element selects no pixel.
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.element.offsets().is_empty() {
            return Err(ImageError::InvalidParameter(
                "element",
                "the structuring element selects no pixel".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

fn rank_filter<T, const C: usize>(
    src: &Image<T, C>,
    element: &StructuringElement,
    edge_mode: EdgeMode,
    border: [T; C],
    processed: usize,
    extremum: Extremum,
) -> Image<T, C>
where
    T: Copy + Ord + Send + Sync,
{
    let offsets = element.offsets();
    let (ax, ay) = element.anchor();
    let (before_x, after_x) = (ax, element.width() - ax);
    let (before_y, after_y) = (ay, element.height() - ay);
    let map_x = AxisMap::new(edge_mode, src.width(), before_x, after_x);
    let map_y = AxisMap::new(edge_mode, src.height(), before_y, after_y);

    let mut dst = src.clone();
    parallel::par_rows_mut(dst.as_slice_mut(), src.row_stride(), |y, dst_row| {
        for (x, out) in dst_row.chunks_exact_mut(C).enumerate() {
            for c in 0..processed {
                let values = offsets.iter().map(|&(dx, dy)| {
                    match (map_x.get(x as isize + dx), map_y.get(y as isize + dy)) {
                        (Some(sx), Some(sy)) => src.pixel(sx, sy)[c],
                        _ => border[c],
                    }
                });
                let v = match extremum {
                    Extremum::Min => values.min(),
                    Extremum::Max => values.max(),
                };
                // an element always selects at least one pixel
                if let Some(v) = v {
                    out[c] = v;
                }
            }
        }
    });
    dst
}

/// Replace each sample by the maximum under the structuring element.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `element` - The neighbourhood.
/// * `edge_mode` - How samples outside the raster are read.
/// * `border` - The value read outside the raster under [`EdgeMode::Constant`].
/// * `mode` - Whether alpha participates.
pub fn dilate<T, const C: usize>(
    src: &Image<T, C>,
    element: &StructuringElement,
    edge_mode: EdgeMode,
    border: [T; C],
    mode: MorphMode,
) -> Image<T, C>
where
    T: Copy + Ord + Send + Sync,
{
    rank_filter(
        src,
        element,
        edge_mode,
        border,
        mode.processed_channels(C),
        Extremum::Max,
    )
}

/// Replace each sample by the minimum under the structuring element.
///
/// See [`dilate`] for the arguments.
pub fn erode<T, const C: usize>(
    src: &Image<T, C>,
    element: &StructuringElement,
    edge_mode: EdgeMode,
    border: [T; C],
    mode: MorphMode,
) -> Image<T, C>
where
    T: Copy + Ord + Send + Sync,
{
    rank_filter(
        src,
        element,
        edge_mode,
        border,
        mode.processed_channels(C),
        Extremum::Min,
    )
}

/// Apply a morphological operator to an 8-bit image.
///
/// Gradient, TopHat and BlackHat subtract with saturation. Under
/// [`MorphMode::Rgba`] the alpha channel is subtracted too, so a constant alpha
/// becomes fully transparent; [`MorphMode::Rgb`] keeps the source alpha.
///
/// # Errors
///
/// Returns an error if the config is invalid.
///
/// # Example
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::morphology::{morphology, structuring_element, MorphOp, MorphologyConfig};
///
/// let img = Image::<u8, 4>::from_size_val([6, 6].into(), 200).unwrap();
/// let config = MorphologyConfig::new(MorphOp::Gradient, structuring_element(3).unwrap());
/// let out = morphology(&img, &config).unwrap();
/// assert!(out.as_slice().iter().all(|&v| v == 0));
/// ```
pub fn morphology<const C: usize>(
    src: &Image<u8, C>,
    config: &MorphologyConfig,
) -> Result<Image<u8, C>, ImageError> {
    config.validate()?;
    log::debug!(
        "morphology: {} {:?} {:?} element {}x{} {}",
        src.size(),
        config.op,
        config.mode,
        config.element.width(),
        config.element.height(),
        config.edge_mode
    );

    let element = &config.element;
    let border: [u8; C] = config.border.channels();
    let (edge, mode) = (config.edge_mode, config.mode);
    let grow = |img: &Image<u8, C>| dilate(img, element, edge, border, mode);
    let shrink = |img: &Image<u8, C>| erode(img, element, edge, border, mode);

    let out = match config.op {
        MorphOp::Dilate => grow(src),
        MorphOp::Erode => shrink(src),
        MorphOp::Opening => grow(&shrink(src)),
        MorphOp::Closing => shrink(&grow(src)),
        MorphOp::Gradient => saturating_sub(&grow(src), &shrink(src))?,
        MorphOp::TopHat => saturating_sub(src, &grow(&shrink(src)))?,
        MorphOp::BlackHat => saturating_sub(&shrink(&grow(src)), src)?,
    };

    let processed = mode.processed_channels(C);
    if processed == C {
        return Ok(out);
    }
    let mut out = out;
    out.as_slice_mut()
        .chunks_exact_mut(C)
        .zip(src.as_slice().chunks_exact(C))
        .for_each(|(dst, src)| dst[processed..].copy_from_slice(&src[processed..]));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::{structuring_element, KernelShape};

    fn box3() -> Result<StructuringElement, ImageError> {
        StructuringElement::new(KernelShape::Box { size: 3 })
    }

    #[test]
    fn test_dilate_and_erode() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::new(
            [5, 5].into(),
            vec![
                0, 0, 0, 0, 0,
                0, 0, 0, 0, 0,
                0, 0, 9, 0, 0,
                0, 0, 0, 0, 0,
                0, 0, 0, 0, 0,
            ],
        )?;
        let element = StructuringElement::new(KernelShape::Cross { size: 3 })?;
        let dilated = dilate(&img, &element, EdgeMode::Clamp, [0], MorphMode::Rgba);
        assert_eq!(
            dilated.as_slice(),
            &[
                0, 0, 0, 0, 0,
                0, 0, 9, 0, 0,
                0, 9, 9, 9, 0,
                0, 0, 9, 0, 0,
                0, 0, 0, 0, 0,
            ]
        );
        let eroded = erode(&dilated, &element, EdgeMode::Clamp, [0], MorphMode::Rgba);
        assert_eq!(eroded, img);
        Ok(())
    }

    #[test]
    fn test_constant_border_enters_the_window() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_size_val([3, 3].into(), 50)?;
        let config = MorphologyConfig::new(MorphOp::Erode, box3()?)
            .with_edge_mode(EdgeMode::Constant)
            .with_border(Scalar::splat(10));
        let out = morphology(&img, &config)?;
        assert_eq!(out.pixel(0, 0), &[10]);
        assert_eq!(out.pixel(1, 1), &[50]);
        Ok(())
    }

    #[test]
    fn test_gradient_of_flat_image() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_fn([7, 5].into(), |_, _| [12, 200, 99, 255]);
        for size in [3, 5, 7] {
            let config = MorphologyConfig::new(MorphOp::Gradient, structuring_element(size)?);
            let out = morphology(&img, &config)?;
            assert!(out.as_slice().iter().all(|&v| v == 0));

            let out = morphology(&img, &config.with_mode(MorphMode::Rgb))?;
            assert!(out.as_slice().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
        }
        Ok(())
    }

    #[test]
    fn test_top_and_black_hat() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_fn([7, 7].into(), |x, y| {
            [match (x, y) {
                (3, 3) => 200,
                (1, 1) => 0,
                _ => 100,
            }]
        });
        let top = morphology(&img, &MorphologyConfig::new(MorphOp::TopHat, box3()?))?;
        assert_eq!(top.pixel(3, 3), &[100]);
        assert_eq!(top.pixel(5, 5), &[0]);
        let black = morphology(&img, &MorphologyConfig::new(MorphOp::BlackHat, box3()?))?;
        assert_eq!(black.pixel(1, 1), &[100]);
        assert_eq!(black.pixel(3, 3), &[0]);
        Ok(())
    }

    #[test]
    fn test_rgb_mode_keeps_alpha() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_fn([4, 4].into(), |x, y| [(x * 60) as u8, 0, 0, (y * 60) as u8]);
        let out = dilate(&img, &box3()?, EdgeMode::Clamp, [0; 4], MorphMode::Rgb);
        for (a, b) in out.as_slice().chunks_exact(4).zip(img.as_slice().chunks_exact(4)) {
            assert_eq!(a[3], b[3]);
        }
        assert_eq!(out.pixel(0, 0)[0], 60);
        Ok(())
    }
}
