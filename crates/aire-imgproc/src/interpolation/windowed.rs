use std::f32::consts::PI;

#[inline]
pub(crate) fn sinc(x: f32) -> f32 {
    if x.abs() < 1e-6 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// `sinc(x) * sinc(x / lobes)` inside `lobes`.
#[inline]
pub(crate) fn lanczos(x: f32, lobes: f32) -> f32 {
    if x.abs() >= lobes {
        return 0.0;
    }
    sinc(x) * sinc(x / lobes)
}

/// Window shapes applied to a sinc of radius `support`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Window {
    Hann,
    Hamming,
    Welch,
    Bartlett,
}

impl Window {
    #[inline]
    fn at(self, t: f32) -> f32 {
        match self {
            Window::Hann => 0.5 + 0.5 * (PI * t).cos(),
            Window::Hamming => 0.54 + 0.46 * (PI * t).cos(),
            Window::Welch => 1.0 - t * t,
            Window::Bartlett => 1.0 - t.abs(),
        }
    }
}

#[inline]
pub(crate) fn windowed_sinc(x: f32, window: Window, support: f32) -> f32 {
    if x.abs() >= support {
        return 0.0;
    }
    sinc(x) * window.at(x / support)
}

/// Gaussian with standard deviation `sigma`, cut at `support`.
#[inline]
pub(crate) fn gaussian(x: f32, sigma: f32, support: f32) -> f32 {
    if x.abs() >= support {
        return 0.0;
    }
    (-(x * x) / (2.0 * sigma * sigma)).exp()
}
