//! Resampling kernels.
//!
//! Each [`ResizeFilter`] is a weight function of the distance between an
//! output sample and a source sample, in source pixels, together with the
//! radius outside which the weight is zero. The resize engine widens the
//! radius by the scale factor when it shrinks an image.
//!
//! # Kernel families
//!
//! - **Nearest / Box / Bilinear**: piecewise constant and linear.
//! - **Cubics**: Hermite, Keys (`Cubic`), and the Mitchell-Netravali family
//!   (Catmull-Rom, Mitchell, B-spline).
//! - **Windowed sinc**: Lanczos with 2, 3 or 4 lobes and sinc under a Hann,
//!   Hamming, Bartlett or Welch window of radius 3.
//! - **Gaussian**: sigma 0.5, cut at three sigma.

mod cubic;
mod windowed;

use windowed::Window;

/// Interpolation kernel used by the resize engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResizeFilter {
    /// Nearest source pixel.
    Nearest,
    /// Unweighted average over one source pixel.
    Box,
    /// Triangle (tent).
    #[default]
    Bilinear,
    /// Hermite smooth step.
    Hermite,
    /// Keys cubic with `a = -0.75`.
    Cubic,
    /// Catmull-Rom spline.
    CatmullRom,
    /// Mitchell-Netravali with `B = C = 1/3`.
    MitchellNetravali,
    /// Cubic B-spline, smoothing.
    BSpline,
    /// Gaussian, sigma 0.5.
    Gaussian,
    /// Hann windowed sinc.
    Hann,
    /// Hamming windowed sinc.
    Hamming,
    /// Bartlett windowed sinc.
    Bartlett,
    /// Welch windowed sinc.
    Welch,
    /// Lanczos with two lobes.
    Lanczos2,
    /// Lanczos with three lobes.
    Lanczos3,
    /// Lanczos with four lobes.
    Lanczos4,
}

const WINDOW_SUPPORT: f32 = 3.0;

impl ResizeFilter {
    /// Every filter, in declaration order.
    pub const ALL: [ResizeFilter; 16] = [
        ResizeFilter::Nearest,
        ResizeFilter::Box,
        ResizeFilter::Bilinear,
        ResizeFilter::Hermite,
        ResizeFilter::Cubic,
        ResizeFilter::CatmullRom,
        ResizeFilter::MitchellNetravali,
        ResizeFilter::BSpline,
        ResizeFilter::Gaussian,
        ResizeFilter::Hann,
        ResizeFilter::Hamming,
        ResizeFilter::Bartlett,
        ResizeFilter::Welch,
        ResizeFilter::Lanczos2,
        ResizeFilter::Lanczos3,
        ResizeFilter::Lanczos4,
    ];

    /// Radius outside which [`ResizeFilter::weight`] is zero.
    pub fn support(&self) -> f32 {
        match self {
            ResizeFilter::Nearest | ResizeFilter::Box => 0.5,
            ResizeFilter::Bilinear | ResizeFilter::Hermite => 1.0,
            ResizeFilter::Gaussian => 1.5,
            ResizeFilter::Cubic
            | ResizeFilter::CatmullRom
            | ResizeFilter::MitchellNetravali
            | ResizeFilter::BSpline
            | ResizeFilter::Lanczos2 => 2.0,
            ResizeFilter::Hann
            | ResizeFilter::Hamming
            | ResizeFilter::Bartlett
            | ResizeFilter::Welch
            | ResizeFilter::Lanczos3 => 3.0,
            ResizeFilter::Lanczos4 => 4.0,
        }
    }

    /// Whether the kernel is one at zero and zero at every other integer,
    /// which makes a same-size resample an exact copy.
    pub fn is_interpolating(&self) -> bool {
        !matches!(
            self,
            ResizeFilter::MitchellNetravali | ResizeFilter::BSpline | ResizeFilter::Gaussian
        )
    }

    /// Unnormalized weight at distance `x`.
    #[inline]
    pub fn weight(&self, x: f32) -> f32 {
        match self {
            ResizeFilter::Nearest | ResizeFilter::Box => {
                if (-0.5..0.5).contains(&x) {
                    1.0
                } else {
                    0.0
                }
            }
            ResizeFilter::Bilinear => (1.0 - x.abs()).max(0.0),
            ResizeFilter::Hermite => cubic::hermite(x),
            ResizeFilter::Cubic => cubic::keys(x, -0.75),
            ResizeFilter::CatmullRom => cubic::bc_spline(x, 0.0, 0.5),
            ResizeFilter::MitchellNetravali => cubic::bc_spline(x, 1.0 / 3.0, 1.0 / 3.0),
            ResizeFilter::BSpline => cubic::bc_spline(x, 1.0, 0.0),
            ResizeFilter::Gaussian => windowed::gaussian(x, 0.5, 1.5),
            ResizeFilter::Hann => windowed::windowed_sinc(x, Window::Hann, WINDOW_SUPPORT),
            ResizeFilter::Hamming => windowed::windowed_sinc(x, Window::Hamming, WINDOW_SUPPORT),
            ResizeFilter::Bartlett => windowed::windowed_sinc(x, Window::Bartlett, WINDOW_SUPPORT),
            ResizeFilter::Welch => windowed::windowed_sinc(x, Window::Welch, WINDOW_SUPPORT),
            ResizeFilter::Lanczos2 => windowed::lanczos(x, 2.0),
            ResizeFilter::Lanczos3 => windowed::lanczos(x, 3.0),
            ResizeFilter::Lanczos4 => windowed::lanczos(x, 4.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn kernels_vanish_outside_their_support() {
        for filter in ResizeFilter::ALL {
            let s = filter.support();
            for x in [s, s + 0.25, s + 3.0] {
                assert_eq!(filter.weight(x), 0.0, "{filter:?} at {x}");
                assert_eq!(filter.weight(-x - 0.01), 0.0, "{filter:?} at {}", -x - 0.01);
            }
        }
    }

    #[test]
    fn interpolating_kernels_hit_integers() {
        for filter in ResizeFilter::ALL.into_iter().filter(|f| f.is_interpolating()) {
            assert_abs_diff_eq!(filter.weight(0.0), 1.0, epsilon = 1e-6);
            for k in 1..=4 {
                assert_abs_diff_eq!(filter.weight(k as f32), 0.0, epsilon = 1e-6);
                assert_abs_diff_eq!(filter.weight(-(k as f32)), 0.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn cubic_reference_values() {
        // B-spline partition of unity at the origin: 1/6 + 4/6 + 1/6
        let sum: f32 = [-1.0, 0.0, 1.0].iter().map(|&x| ResizeFilter::BSpline.weight(x)).sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ResizeFilter::CatmullRom.weight(0.5), 0.5625, epsilon = 1e-6);
        assert_abs_diff_eq!(ResizeFilter::Hermite.weight(0.5), 0.5, epsilon = 1e-6);
    }
}
