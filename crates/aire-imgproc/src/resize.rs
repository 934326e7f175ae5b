use aire_image::{Image, ImageError, ImageSize};
use fast_image_resize as fr;

use crate::color::{from_working, to_working, ColorSpace, TransferFunction};
use crate::interpolation::ResizeFilter;
use crate::parallel::{par_iter_rows, par_rows_mut};

/// Space in which samples are blended while resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScaleSpace {
    /// Encoded samples, the fastest option.
    #[default]
    Srgb,
    /// Linear light.
    Linear(TransferFunction),
    /// CIE XYZ with the sRGB transfer function.
    Xyz,
    /// CIE L*a*b* with the sRGB transfer function.
    Lab,
    /// CIE L*u*v* with the sRGB transfer function.
    Luv,
    /// LCh(uv) with the sRGB transfer function.
    LCh,
    /// Oklab.
    Oklab(TransferFunction),
}

impl ScaleSpace {
    /// The matching working representation.
    pub fn color_space(&self) -> ColorSpace {
        let srgb = TransferFunction::Srgb;
        match *self {
            ScaleSpace::Srgb => ColorSpace::Srgb,
            ScaleSpace::Linear(tf) => ColorSpace::Linear(tf),
            ScaleSpace::Xyz => ColorSpace::Xyz(srgb),
            ScaleSpace::Lab => ColorSpace::Lab(srgb),
            ScaleSpace::Luv => ColorSpace::Luv(srgb),
            ScaleSpace::LCh => ColorSpace::LCh(srgb),
            ScaleSpace::Oklab(tf) => ColorSpace::Oklab(tf),
        }
    }
}

/// Resize parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeConfig {
    /// Output size, both dimensions positive.
    pub size: ImageSize,
    /// Interpolation kernel.
    pub filter: ResizeFilter,
    /// Space the samples are blended in.
    pub working_space: ScaleSpace,
    /// Widen the kernel by the scale factor when shrinking.
    pub antialias: bool,
}

impl ResizeConfig {
    /// Resize to `size` with the default filter in sRGB.
    pub fn new(size: ImageSize) -> Self {
        Self {
            size,
            filter: ResizeFilter::default(),
            working_space: ScaleSpace::default(),
            antialias: true,
        }
    }

    /// Set the kernel.
    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the working space.
    pub fn with_working_space(mut self, working_space: ScaleSpace) -> Self {
        self.working_space = working_space;
        self
    }

    /// Enable or disable kernel widening when shrinking.
    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }

    /// Check that the output size is not empty.
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.size.is_empty() {
            return Err(ImageError::InvalidParameter(
                "size",
                format!("output must not be empty, got {}", self.size),
            ));
        }
        Ok(())
    }
}

/// Source taps of one output sample.
struct Taps {
    start: usize,
    weights: Vec<f32>,
}

/// Normalized taps of every output coordinate along one axis.
fn taps(src_len: usize, dst_len: usize, filter: ResizeFilter, antialias: bool) -> Vec<Taps> {
    let scale = src_len as f32 / dst_len as f32;
    let filter_scale = if antialias { scale.max(1.0) } else { 1.0 };
    let support = filter.support() * filter_scale;

    (0..dst_len)
        .map(|i| {
            let center = (i as f32 + 0.5) * scale;
            if filter == ResizeFilter::Nearest {
                let k = (center.floor() as usize).min(src_len - 1);
                return Taps {
                    start: k,
                    weights: vec![1.0],
                };
            }
            let lo = ((center - support + 0.5).floor().max(0.0) as usize).min(src_len - 1);
            let hi = ((center + support + 0.5).floor() as usize).clamp(lo + 1, src_len);
            let mut weights: Vec<f32> = (lo..hi)
                .map(|k| filter.weight((k as f32 - center + 0.5) / filter_scale))
                .collect();
            let sum: f32 = weights.iter().sum();
            if sum.abs() < f32::EPSILON {
                let k = (center.floor() as usize).clamp(lo, hi - 1);
                return Taps {
                    start: k,
                    weights: vec![1.0],
                };
            }
            weights.iter_mut().for_each(|w| *w /= sum);
            Taps { start: lo, weights }
        })
        .collect()
}

/// Resample a working buffer with a separable kernel.
///
/// The horizontal pass completes before the vertical pass starts.
pub fn resample<const C: usize>(
    src: &Image<f32, C>,
    size: ImageSize,
    filter: ResizeFilter,
    antialias: bool,
) -> Result<Image<f32, C>, ImageError> {
    if size.is_empty() {
        return Err(ImageError::InvalidParameter(
            "size",
            format!("output must not be empty, got {size}"),
        ));
    }
    if src.size().is_empty() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            size.width,
            size.height,
        ));
    }

    let columns = taps(src.width(), size.width, filter, antialias);
    let mut wide = Image::<f32, C>::from_size_val([size.width, src.height()].into(), 0.0)?;
    par_rows_mut(wide.as_slice_mut(), size.width * C, |y, row| {
        let line = src.row(y);
        for (out, t) in row.chunks_exact_mut(C).zip(&columns) {
            let mut acc = [0.0f32; C];
            for (k, &w) in t.weights.iter().enumerate() {
                let px = &line[(t.start + k) * C..(t.start + k + 1) * C];
                for c in 0..C {
                    acc[c] += px[c] * w;
                }
            }
            out.copy_from_slice(&acc);
        }
    });

    let rows = taps(src.height(), size.height, filter, antialias);
    let mut dst = Image::<f32, C>::from_size_val(size, 0.0)?;
    par_rows_mut(dst.as_slice_mut(), size.width * C, |y, row| {
        let t = &rows[y];
        for (k, &w) in t.weights.iter().enumerate() {
            for (d, s) in row.iter_mut().zip(wide.row(t.start + k)) {
                *d += s * w;
            }
        }
    });
    Ok(dst)
}

/// Resize an 8-bit raster.
///
/// Samples are converted into the working space of `config`, resampled with
/// `config.filter` and converted back. Rasters with fewer than three channels
/// only support [`ScaleSpace::Srgb`].
///
/// # Errors
///
/// Returns an error if the output size is empty, the input is empty, or the
/// working space needs colour channels the raster does not have.
///
/// # Example
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::interpolation::ResizeFilter;
/// use aire_imgproc::resize::{resize, ResizeConfig};
///
/// let img = Image::<u8, 4>::from_size_val([8, 6].into(), 90).unwrap();
/// let config = ResizeConfig::new([4, 3].into()).with_filter(ResizeFilter::Lanczos3);
/// let out = resize(&img, &config).unwrap();
/// assert_eq!(out.size(), [4, 3].into());
/// assert!(out.as_slice().iter().all(|&v| v == 90));
/// ```
pub fn resize<const C: usize>(
    src: &Image<u8, C>,
    config: &ResizeConfig,
) -> Result<Image<u8, C>, ImageError> {
    config.validate()?;
    log::debug!(
        "resize: {} -> {} {:?} in {:?}",
        src.size(),
        config.size,
        config.filter,
        config.working_space
    );

    match config.working_space {
        ScaleSpace::Srgb => {
            let mut work = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
            par_iter_rows(src, &mut work, |s, d| {
                for (d, &s) in d.iter_mut().zip(s) {
                    *d = s as f32 / 255.0;
                }
            });
            let out = resample(&work, config.size, config.filter, config.antialias)?;
            let mut dst = Image::<u8, C>::from_size_val(config.size, 0)?;
            par_iter_rows(&out, &mut dst, |s, d| {
                for (d, &s) in d.iter_mut().zip(s) {
                    *d = (s * 255.0).round().clamp(0.0, 255.0) as u8;
                }
            });
            Ok(dst)
        }
        space => {
            let space = space.color_space();
            let work = to_working(src, space)?;
            let out = resample(&work, config.size, config.filter, config.antialias)?;
            from_working(&out, space)
        }
    }
}

fn fast_algorithm(filter: ResizeFilter) -> Result<fr::ResizeAlg, ImageError> {
    let conv = |f: fr::FilterType| -> Result<fr::ResizeAlg, ImageError> {
        Ok(fr::ResizeAlg::Convolution(f))
    };
    match filter {
        ResizeFilter::Nearest => Ok(fr::ResizeAlg::Nearest),
        ResizeFilter::Box => conv(fr::FilterType::Box),
        ResizeFilter::Bilinear => conv(fr::FilterType::Bilinear),
        ResizeFilter::CatmullRom => conv(fr::FilterType::CatmullRom),
        ResizeFilter::MitchellNetravali => conv(fr::FilterType::Mitchell),
        ResizeFilter::Lanczos3 => conv(fr::FilterType::Lanczos3),
        ResizeFilter::Hamming => conv(fr::FilterType::Hamming),
        ResizeFilter::Gaussian => conv(fr::FilterType::Gaussian),
        other => Err(ImageError::UnsupportedConfiguration(format!(
            "resize_fast does not support {other:?}"
        ))),
    }
}

/// Resize an RGBA raster with the [fast_image_resize](https://crates.io/crates/fast_image_resize) crate.
///
/// Blends encoded samples and treats alpha as an independent channel. Only
/// the kernels the crate implements are accepted; its Hamming kernel has a
/// radius of one.
///
/// # Errors
///
/// Returns an error if the output size is empty, the working space is not
/// [`ScaleSpace::Srgb`], or the filter is not supported.
pub fn resize_fast(src: &Image<u8, 4>, config: &ResizeConfig) -> Result<Image<u8, 4>, ImageError> {
    config.validate()?;
    if config.working_space != ScaleSpace::Srgb {
        return Err(ImageError::UnsupportedConfiguration(format!(
            "resize_fast only blends encoded samples, got {:?}",
            config.working_space
        )));
    }
    let algorithm = fast_algorithm(config.filter)?;
    log::debug!(
        "resize_fast: {} -> {} {:?}",
        src.size(),
        config.size,
        config.filter
    );

    let src_image = fr::images::ImageRef::new(
        src.width() as u32,
        src.height() as u32,
        src.as_slice(),
        fr::PixelType::U8x4,
    )
    .map_err(|_| ImageError::InvalidChannelShape(src.as_slice().len(), src.size().area() * 4))?;

    let mut dst = Image::<u8, 4>::from_size_val(config.size, 0)?;
    let (width, height) = (dst.width() as u32, dst.height() as u32);
    let expected = config.size.area() * 4;
    {
        let mut dst_image = fr::images::Image::from_slice_u8(
            width,
            height,
            dst.as_slice_mut(),
            fr::PixelType::U8x4,
        )
        .map_err(|_| ImageError::InvalidChannelShape(expected, expected))?;

        let options = fr::ResizeOptions::new()
            .resize_alg(algorithm)
            .use_alpha(false);
        fr::Resizer::new()
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| ImageError::UnsupportedConfiguration(e.to_string()))?;
    }

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(size: usize) -> Image<u8, 4> {
        Image::from_fn([size, size].into(), |x, y| {
            let v = if (x + y) % 2 == 0 { 0 } else { 255 };
            [v, v, v, 255]
        })
    }

    #[test]
    fn taps_are_normalized_and_in_bounds() {
        for filter in ResizeFilter::ALL {
            for (src, dst) in [(10, 3), (3, 10), (7, 7), (1, 5), (5, 1)] {
                for t in taps(src, dst, filter, true) {
                    let sum: f32 = t.weights.iter().sum();
                    assert!((sum - 1.0).abs() < 1e-5, "{filter:?} {src}->{dst}");
                    assert!(t.start + t.weights.len() <= src);
                }
            }
        }
    }

    #[test]
    fn same_size_is_a_copy() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_fn([9, 7].into(), |x, y| {
            [(x * 28) as u8, (y * 36) as u8, (x * y * 5) as u8, 200]
        });
        for filter in ResizeFilter::ALL.into_iter().filter(|f| f.is_interpolating()) {
            let out = resize(&img, &ResizeConfig::new(img.size()).with_filter(filter))?;
            assert_eq!(out, img, "{filter:?}");
        }
        Ok(())
    }

    #[test]
    fn flat_images_stay_flat() -> Result<(), ImageError> {
        let img = Image::<u8, 3>::from_size_val([13, 11].into(), 77)?;
        for filter in ResizeFilter::ALL {
            for size in [[5, 4], [29, 17]] {
                let out = resize(&img, &ResizeConfig::new(size.into()).with_filter(filter))?;
                assert!(out.as_slice().iter().all(|&v| v == 77), "{filter:?} {size:?}");
            }
        }
        Ok(())
    }

    #[test]
    fn box_halving_averages() -> Result<(), ImageError> {
        let img = checker(8);
        let config = ResizeConfig::new([4, 4].into()).with_filter(ResizeFilter::Box);
        let out = resize(&img, &config)?;
        assert!(out.as_slice().chunks_exact(4).all(|p| p == [128, 128, 128, 255]));

        let linear = config.with_working_space(ScaleSpace::Linear(TransferFunction::Srgb));
        let out = resize(&img, &linear)?;
        let v = out.pixel(1, 1)[0];
        assert!((186..=189).contains(&v), "{v}");
        Ok(())
    }

    #[test]
    fn nearest_picks_source_pixels() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::new([4, 1].into(), vec![10, 20, 30, 40])?;
        let config = ResizeConfig::new([8, 1].into()).with_filter(ResizeFilter::Nearest);
        assert_eq!(
            resize(&img, &config)?.as_slice(),
            &[10, 10, 20, 20, 30, 30, 40, 40]
        );
        let config = ResizeConfig::new([2, 1].into()).with_filter(ResizeFilter::Nearest);
        assert_eq!(resize(&img, &config)?.as_slice(), &[20, 40]);
        Ok(())
    }

    #[test]
    fn gray_needs_srgb_space() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_size_val([4, 4].into(), 1)?;
        let config = ResizeConfig::new([2, 2].into()).with_working_space(ScaleSpace::Lab);
        assert!(matches!(
            resize(&img, &config),
            Err(ImageError::UnsupportedConfiguration(_))
        ));
        Ok(())
    }

    #[test]
    fn zero_target_is_rejected() -> Result<(), ImageError> {
        let img = checker(4);
        assert!(matches!(
            resize(&img, &ResizeConfig::new([0, 3].into())),
            Err(ImageError::InvalidParameter("size", _))
        ));
        assert!(matches!(
            resize_fast(&img, &ResizeConfig::new([3, 0].into())),
            Err(ImageError::InvalidParameter("size", _))
        ));
        Ok(())
    }

    #[test]
    fn fast_resize_smoke() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_size_val([16, 12].into(), 60)?;
        let config = ResizeConfig::new([5, 7].into()).with_filter(ResizeFilter::Lanczos3);
        let out = resize_fast(&img, &config)?;
        assert_eq!(out.size(), [5, 7].into());
        assert!(out.as_slice().iter().all(|&v| v == 60));

        let unsupported = config.with_filter(ResizeFilter::Welch);
        assert!(matches!(
            resize_fast(&img, &unsupported),
            Err(ImageError::UnsupportedConfiguration(_))
        ));
        let linear = config.with_working_space(ScaleSpace::Linear(TransferFunction::Srgb));
        assert!(matches!(
            resize_fast(&img, &linear),
            Err(ImageError::UnsupportedConfiguration(_))
        ));
        Ok(())
    }
}
