use aire_image::{Image, ImageError};

use super::map_linear;

const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

#[inline]
fn luma(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMA[0] + rgb[1] * LUMA[1] + rgb[2] * LUMA[2]
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = if edge1 == edge0 {
        if x < edge0 {
            0.0
        } else {
            1.0
        }
    } else {
        ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0)
    };
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn scale_by_luma(rgb: [f32; 3], curve: impl Fn(f32) -> f32) -> [f32; 3] {
    let l_in = luma(rgb);
    if l_in == 0.0 {
        return rgb;
    }
    let scale = curve(l_in) / l_in;
    rgb.map(|v| v * scale)
}

#[inline]
fn mul3(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    std::array::from_fn(|r| m[r][0] * v[0] + m[r][1] * v[1] + m[r][2] * v[2])
}

const ACES_INPUT: [[f32; 3]; 3] = [
    [0.59719, 0.35458, 0.04823],
    [0.07600, 0.90834, 0.01566],
    [0.02840, 0.13383, 0.83777],
];

const ACES_OUTPUT: [[f32; 3]; 3] = [
    [1.60475, -0.53108, -0.07367],
    [-0.10208, 1.10813, -0.00605],
    [-0.00327, -0.07276, 1.07602],
];

/// A curve compressing linear light into the displayable range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ToneMapper {
    /// `ln(1 + L) / ln(1 + exposure)` on luma.
    #[default]
    Logarithmic,
    /// Narkowicz fit of the ACES filmic curve.
    AcesFilmic,
    /// Stephen Hill fit of the ACES RRT and ODT.
    AcesHill,
    /// Jim Hejl and Richard Burgess-Dawson filmic curve.
    HejlBurgess,
    /// John Hable's Uncharted 2 curve.
    HableFilmic,
    /// Hajime Uchimura's Gran Turismo curve.
    Uchimura,
    /// Hejl curve with a shadow toe of the given cutoff.
    Aldridge {
        /// Toe cutoff, `> 0`.
        cutoff: f32,
    },
    /// Drago adaptive logarithmic mapping on luma.
    Drago {
        /// Display white point in nits, `> 0`.
        sdr_white_point: f32,
    },
    /// Linear below the transition, a Möbius shoulder above it.
    Mobius {
        /// Where the shoulder starts.
        transition: f32,
        /// Value reached at infinity.
        peak: f32,
    },
}

impl ToneMapper {
    /// Map a linear RGB triple already scaled by `exposure`.
    ///
    /// `exposure` is also consulted by the luma based curves, which normalize
    /// against the exposed white.
    pub fn map(&self, rgb: [f32; 3], exposure: f32) -> [f32; 3] {
        match *self {
            ToneMapper::Logarithmic => {
                let den = 1.0 / (1.0 + exposure).ln();
                scale_by_luma(rgb, |l| (1.0 + l).abs().ln() * den)
            }
            ToneMapper::AcesFilmic => rgb.map(|x| {
                ((x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14)).clamp(0.0, 1.0)
            }),
            ToneMapper::AcesHill => {
                let v = mul3(&ACES_INPUT, rgb).map(|x| {
                    (x * (x + 0.024_578_6) - 0.000_090_537)
                        / (x * (0.983_729 * x + 0.432_951) + 0.238_081)
                });
                mul3(&ACES_OUTPUT, v).map(|x| x.clamp(0.0, 1.0))
            }
            ToneMapper::HejlBurgess => rgb.map(|c| hejl((c - 0.004).max(0.0))),
            ToneMapper::HableFilmic => rgb.map(hable),
            ToneMapper::Uchimura => rgb.map(uchimura),
            ToneMapper::Aldridge { cutoff } => rgb.map(|c| {
                let tmp = 2.0 * cutoff;
                let x = c + (tmp - c) * (tmp - c).clamp(0.0, 1.0) * (0.25 / cutoff) - cutoff;
                hejl(x)
            }),
            ToneMapper::Drago { sdr_white_point } => {
                const LWA: f32 = 1.0;
                const BIAS: f32 = 0.85;
                let lwa_p = LWA / (1.0 + BIAS - 0.85).powi(5);
                let lmax_p = sdr_white_point / lwa_p;
                let exponent = BIAS.ln() / 0.5f32.ln();
                let c1 = 0.01 * sdr_white_point / (1.0 + lmax_p).log10();
                scale_by_luma(rgb, |l| {
                    let lin_p = l / lwa_p;
                    let c2 = (1.0 + lin_p).ln() / (2.0 + 8.0 * (lin_p / lmax_p).powf(exponent)).ln();
                    c1 * c2
                })
            }
            ToneMapper::Mobius { transition, peak } => rgb.map(|x| mobius(x, transition, peak)),
        }
    }

    /// Check the curve parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if a cutoff, white point or peak is not positive.
    pub fn validate(&self) -> Result<(), ImageError> {
        let positive = |name: &'static str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ImageError::InvalidParameter(name, format!("must be > 0, got {v}")))
            }
        };
        match *self {
            ToneMapper::Aldridge { cutoff } => positive("cutoff", cutoff),
            ToneMapper::Drago { sdr_white_point } => positive("sdr_white_point", sdr_white_point),
            ToneMapper::Mobius { transition, peak } => {
                positive("peak", peak)?;
                if !(0.0..=1.0).contains(&transition) {
                    return Err(ImageError::InvalidParameter(
                        "transition",
                        format!("must be in [0, 1], got {transition}"),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Hejl curve, its output is gamma encoded so it is decoded with 2.4.
#[inline]
fn hejl(x: f32) -> f32 {
    let out = (x * (6.2 * x + 0.5)) / (x * (6.2 * x + 1.7) + 0.06);
    out.powf(2.4)
}

#[inline]
fn hable(x: f32) -> f32 {
    const A: f32 = 0.15;
    const B: f32 = 0.50;
    const C: f32 = 0.10;
    const D: f32 = 0.20;
    const E: f32 = 0.02;
    const F: f32 = 0.30;
    ((x * (A * x + C * B) + D * E) / (x * (A * x + B) + D * F)) - E / F
}

#[inline]
fn uchimura(x: f32) -> f32 {
    const P: f32 = 1.0; // max brightness
    const A: f32 = 1.0; // contrast
    const M: f32 = 0.22; // linear section start
    const L: f32 = 0.4; // linear section length
    const C: f32 = 1.33; // black tightness
    const B: f32 = 0.0; // pedestal

    let l0 = (P - M) * L / A;
    let s0 = M + l0;
    let s1 = M + A * l0;
    let c2 = A * P / (P - s1);
    let cp = -c2 / P;

    let w0 = 1.0 - smoothstep(0.0, M, x);
    let w2 = smoothstep(M + l0, M + l0, x);
    let w1 = 1.0 - w0 - w2;

    let toe = M * (x / M).powf(C) + B;
    let linear = M + A * (x - M);
    let shoulder = P - (P - s1) * (cp * (x - s0)).exp();
    toe * w0 + linear * w1 + shoulder * w2
}

#[inline]
fn mobius(x: f32, j: f32, peak: f32) -> f32 {
    if x <= j {
        return x;
    }
    let a = -j * j * (peak - 1.0) / (j * j - 2.0 * j + peak);
    let b = (j * j - 2.0 * j * peak + peak) / (peak - 1.0).max(1e-6);
    (b * b + 2.0 * b * j + j * j) / (b - a) * (x + a) / (x + b)
}

/// Parameters of [`tone_map`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneMapConfig {
    /// The curve.
    pub mapper: ToneMapper,
    /// Linear gain applied before the curve.
    pub exposure: f32,
}

impl Default for ToneMapConfig {
    fn default() -> Self {
        Self {
            mapper: ToneMapper::default(),
            exposure: 1.0,
        }
    }
}

impl ToneMapConfig {
    /// `mapper` at unit exposure.
    pub fn new(mapper: ToneMapper) -> Self {
        Self {
            mapper,
            exposure: 1.0,
        }
    }

    /// Set the exposure.
    pub fn with_exposure(mut self, exposure: f32) -> Self {
        self.exposure = exposure;
        self
    }

    /// Check the exposure and curve parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the exposure is negative or the curve is invalid.
    pub fn validate(&self) -> Result<(), ImageError> {
        ensure_exposure(self.exposure)?;
        self.mapper.validate()
    }
}

fn ensure_exposure(exposure: f32) -> Result<(), ImageError> {
    if !(exposure.is_finite() && exposure >= 0.0) {
        return Err(ImageError::InvalidParameter(
            "exposure",
            format!("must be >= 0, got {exposure}"),
        ));
    }
    Ok(())
}

/// Tone map an 8-bit raster in linear sRGB.
///
/// Samples are decoded, multiplied by the exposure, passed through the curve,
/// re-encoded and clipped.
///
/// # Errors
///
/// Returns an error if the config is invalid or the raster has fewer than
/// three channels.
///
/// # Example
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::tone::{tone_map, ToneMapConfig, ToneMapper};
///
/// let img = Image::<u8, 4>::from_size_val([2, 2].into(), 255).unwrap();
/// let out = tone_map(&img, &ToneMapConfig::new(ToneMapper::AcesFilmic)).unwrap();
/// assert!(out.as_slice()[0] < 255);
/// assert_eq!(out.as_slice()[3], 255);
/// ```
pub fn tone_map<const C: usize>(
    src: &Image<u8, C>,
    config: &ToneMapConfig,
) -> Result<Image<u8, C>, ImageError> {
    config.validate()?;
    log::debug!(
        "tone_map: {} {:?} exposure {}",
        src.size(),
        config.mapper,
        config.exposure
    );
    let (mapper, exposure) = (config.mapper, config.exposure);
    map_linear(src, "tone_map", move |rgb| {
        mapper.map(rgb.map(|v| v * exposure), exposure)
    })
}

/// Multiply linear light by `exposure`.
///
/// # Errors
///
/// Returns an error if the exposure is negative or the raster has fewer than
/// three channels.
pub fn exposure<const C: usize>(
    src: &Image<u8, C>,
    exposure: f32,
) -> Result<Image<u8, C>, ImageError> {
    ensure_exposure(exposure)?;
    log::debug!("exposure: {} {exposure}", src.size());
    map_linear(src, "exposure", move |rgb| rgb.map(|v| v * exposure))
}

/// Overlay a tint on the luma of each pixel.
///
/// `color` is `[r, g, b, amount]` in `[0, 1]`; `amount` blends between the
/// exposed source and the tinted result.
///
/// # Errors
///
/// Returns an error if the exposure is negative or the raster has fewer than
/// three channels.
pub fn monochrome<const C: usize>(
    src: &Image<u8, C>,
    color: [f32; 4],
    exposure: f32,
) -> Result<Image<u8, C>, ImageError> {
    ensure_exposure(exposure)?;
    log::debug!("monochrome: {} {color:?} exposure {exposure}", src.size());
    let amount = color[3];
    map_linear(src, "monochrome", move |rgb| {
        let rgb = rgb.map(|v| v * exposure);
        let l = luma(rgb);
        std::array::from_fn(|c| {
            let tinted = if l < 0.5 {
                2.0 * l * color[c]
            } else {
                1.0 - 2.0 * (1.0 - l) * (1.0 - color[c])
            };
            ((1.0 - amount) * rgb[c] + amount * tinted).clamp(0.0, 1.0)
        })
    })
}
