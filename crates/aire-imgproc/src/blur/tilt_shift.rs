use aire_image::{Image, ImageError};

use crate::blur::{gaussian_blur, GaussianBlurConfig};
use crate::filter::kernels;
use crate::parallel;

/// Parameters of [`tilt_shift`] and [`horizontal_tilt_shift`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltShiftConfig {
    /// Size of the gaussian kernel, odd.
    pub kernel_size: usize,
    /// Sigma of the gaussian, `0` derives it from the kernel size.
    pub sigma: f32,
    /// Horizontal anchor as a fraction of the width, in `[0, 1]`.
    pub anchor_x: f32,
    /// Vertical anchor as a fraction of the height, in `[0, 1]`.
    pub anchor_y: f32,
    /// Distance at which the blur is fully applied, as a fraction of the
    /// available extent.
    pub radius: f32,
    /// Direction of the focus line in radians, `0` is horizontal. Only used
    /// by [`horizontal_tilt_shift`].
    pub angle: f32,
}

impl Default for TiltShiftConfig {
    fn default() -> Self {
        Self {
            kernel_size: 25,
            sigma: 0.0,
            anchor_x: 0.5,
            anchor_y: 0.5,
            radius: 0.2,
            angle: 0.0,
        }
    }
}

impl TiltShiftConfig {
    /// Blur with `kernel_size` and `sigma` around the image center.
    pub fn new(kernel_size: usize, sigma: f32) -> Self {
        Self {
            kernel_size,
            sigma,
            ..Default::default()
        }
    }

    /// Move the anchor.
    pub fn with_anchor(mut self, anchor_x: f32, anchor_y: f32) -> Self {
        self.anchor_x = anchor_x;
        self.anchor_y = anchor_y;
        self
    }

    /// Set the sharp radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Rotate the focus line.
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Check the kernel, anchor and radius.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel size is even, the sigma negative, the
    /// anchor outside `[0, 1]`, the radius not positive or the angle not
    /// finite.
    pub fn validate(&self) -> Result<(), ImageError> {
        kernels::ensure_odd(self.kernel_size)?;
        kernels::ensure_sigma(self.sigma)?;
        for (name, v) in [("anchor_x", self.anchor_x), ("anchor_y", self.anchor_y)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ImageError::InvalidParameter(
                    name,
                    format!("must be in [0, 1], got {v}"),
                ));
            }
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ImageError::InvalidParameter(
                "radius",
                format!("must be > 0, got {}", self.radius),
            ));
        }
        if !self.angle.is_finite() {
            return Err(ImageError::InvalidParameter(
                "angle",
                format!("must be finite, got {}", self.angle),
            ));
        }
        Ok(())
    }
}

/// Keep a disc around the anchor sharp and blur with distance from it.
///
/// The blend weight grows with the cube of the distance to the anchor over
/// `radius` times the image diagonal, scaled by the blurred alpha. Alpha is
/// taken from the source.
///
/// # Errors
///
/// Returns an error if the config is invalid.
pub fn tilt_shift(src: &Image<u8, 4>, config: &TiltShiftConfig) -> Result<Image<u8, 4>, ImageError> {
    config.validate()?;
    let (w, h) = (src.width() as f32, src.height() as f32);
    let reach = (w * w + h * h).sqrt() * config.radius;
    let (ax, ay) = ((w * config.anchor_x).floor(), (h * config.anchor_y).floor());
    log::debug!(
        "tilt_shift: {} anchor ({ax}, {ay}) reach {reach}",
        src.size()
    );
    blend(src, config, |x, y| (x - ax).hypot(y - ay) / reach)
}

/// Keep a band through the anchor sharp and blur with distance from it.
///
/// The band runs along `angle`. Its reach is `radius` times the extent of the
/// image across the band.
///
/// # Errors
///
/// Returns an error if the config is invalid.
pub fn horizontal_tilt_shift(
    src: &Image<u8, 4>,
    config: &TiltShiftConfig,
) -> Result<Image<u8, 4>, ImageError> {
    config.validate()?;
    let (w, h) = (src.width() as f32, src.height() as f32);
    let (sin, cos) = config.angle.sin_cos();
    let reach = (w * sin.abs() + h * cos.abs()) * config.radius;
    let (ax, ay) = ((w * config.anchor_x).floor(), (h * config.anchor_y).floor());
    log::debug!(
        "horizontal_tilt_shift: {} anchor ({ax}, {ay}) angle {} reach {reach}",
        src.size(),
        config.angle
    );
    blend(src, config, |x, y| ((y - ay) * cos - (x - ax) * sin).abs() / reach)
}

/// Mix `src` toward its blur by `distance(x, y)` cubed.
fn blend(
    src: &Image<u8, 4>,
    config: &TiltShiftConfig,
    distance: impl Fn(f32, f32) -> f32 + Sync,
) -> Result<Image<u8, 4>, ImageError> {
    let blurred = gaussian_blur(src, &GaussianBlurConfig::new(config.kernel_size, config.sigma))?;

    let stride = src.row_stride();
    let mut dst = src.clone();
    parallel::par_rows_mut(dst.as_slice_mut(), stride, |y, dst_row| {
        let blur_row = &blurred.as_slice()[y * stride..(y + 1) * stride];
        for (x, (out, b)) in dst_row
            .chunks_exact_mut(4)
            .zip(blur_row.chunks_exact(4))
            .enumerate()
        {
            let d = distance(x as f32, y as f32);
            let t = (d * d * d).clamp(0.0, 1.0) * b[3] as f32 / 255.0;
            for c in 0..3 {
                let s = out[c] as f32;
                out[c] = (s + (b[c] as f32 - s) * t).round().clamp(0.0, 255.0) as u8;
            }
        }
    });
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripes() -> Image<u8, 4> {
        Image::from_fn([21, 21].into(), |x, y| {
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            [v, v, v, 255]
        })
    }

    #[test]
    fn anchor_stays_sharp_and_far_pixels_blur() -> Result<(), ImageError> {
        let img = stripes();
        let config = TiltShiftConfig::new(5, 1.5).with_radius(0.15);
        let blurred = gaussian_blur(&img, &GaussianBlurConfig::new(5, 1.5))?;
        let out = tilt_shift(&img, &config)?;

        assert_eq!(out.pixel(10, 10), img.pixel(10, 10));
        assert_eq!(out.pixel(0, 0), blurred.pixel(0, 0));
        assert_eq!(out.pixel(20, 20), blurred.pixel(20, 20));
        Ok(())
    }

    #[test]
    fn horizontal_band_is_sharp_along_its_row() -> Result<(), ImageError> {
        let img = stripes();
        let config = TiltShiftConfig::new(5, 1.5).with_radius(0.2);
        let blurred = gaussian_blur(&img, &GaussianBlurConfig::new(5, 1.5))?;
        let out = horizontal_tilt_shift(&img, &config)?;

        for x in 0..21 {
            assert_eq!(out.pixel(x, 10), img.pixel(x, 10));
            assert_eq!(out.pixel(x, 0), blurred.pixel(x, 0));
        }

        let vertical = horizontal_tilt_shift(&img, &config.with_angle(std::f32::consts::FRAC_PI_2))?;
        for y in 0..21 {
            assert_eq!(vertical.pixel(10, y), img.pixel(10, y));
            assert_eq!(vertical.pixel(0, y), blurred.pixel(0, y));
        }
        Ok(())
    }

    #[test]
    fn alpha_is_kept() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_fn([9, 9].into(), |x, y| {
            [(x * 30) as u8, (y * 30) as u8, 0, (x * 25 + 5) as u8]
        });
        let out = tilt_shift(&img, &TiltShiftConfig::new(3, 0.0))?;
        for (o, s) in out.as_slice().chunks_exact(4).zip(img.as_slice().chunks_exact(4)) {
            assert_eq!(o[3], s[3]);
        }
        Ok(())
    }

    #[test]
    fn rejects_bad_parameters() {
        let img = stripes();
        assert_eq!(
            tilt_shift(&img, &TiltShiftConfig::new(4, 1.0)).err(),
            Some(ImageError::InvalidKernelSize(4))
        );
        assert!(matches!(
            tilt_shift(&img, &TiltShiftConfig::new(5, 1.0).with_radius(0.0)),
            Err(ImageError::InvalidParameter("radius", _))
        ));
        assert!(matches!(
            horizontal_tilt_shift(&img, &TiltShiftConfig::new(5, 1.0).with_anchor(1.5, 0.5)),
            Err(ImageError::InvalidParameter("anchor_x", _))
        ));
    }
}
