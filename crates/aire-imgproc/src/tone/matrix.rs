use aire_image::{Image, ImageError};

use super::map_encoded;

/// An affine transform of the RGB channels.
///
/// Rows produce red, green and blue; the fourth column is an offset added after
/// the product. Samples are scaled to `[0, 1]` before the transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    rows: [[f32; 4]; 3],
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

const fn m3(m: [f32; 9]) -> ColorMatrix {
    ColorMatrix {
        rows: [
            [m[0], m[1], m[2], 0.0],
            [m[3], m[4], m[5], 0.0],
            [m[6], m[7], m[8], 0.0],
        ],
    }
}

impl ColorMatrix {
    /// Leaves every pixel unchanged.
    pub const IDENTITY: Self = m3([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    /// Brown toned old photograph.
    pub const SEPIA: Self = m3([0.393, 0.769, 0.189, 0.349, 0.686, 0.168, 0.272, 0.534, 0.131]);
    /// Instant film look.
    pub const POLAROID: Self = m3([1.438, -0.062, 0.062, 0.122, 1.378, -0.122, -0.016, -0.016, 1.483]);
    /// Slightly blue cast.
    pub const COOL: Self = m3([0.99, 0.0, 0.0, 0.0, 0.93, 0.0, 0.0, 0.0, 1.08]);
    /// Slightly orange cast.
    pub const WARM: Self = m3([1.06, 0.0, 0.0, 0.0, 1.01, 0.0, 0.0, 0.0, 0.93]);
    /// Green phosphor look.
    pub const NIGHT_VISION: Self = m3([0.1, 0.4, 0.0, 0.3, 1.0, 0.3, 0.0, 0.4, 0.1]);
    /// Saturated slide film look.
    pub const CODA_CHROME: Self = m3([
        1.128_558_3, -0.396_738_23, -0.039_925_59,
        -0.164_043_4, 1.083_525_2, -0.054_988_053,
        -0.167_860_1, -0.560_341_66, 1.601_485_1,
    ]);
    /// Faded brown look.
    pub const BROWNI: Self = m3([
        0.599_702_36, 0.345_532_42, -0.270_829_86,
        -0.037_703_25, 0.860_957_74, 0.150_595_53,
        0.241_136_36, -0.074_410_38, 0.449_721_8,
    ]);
    /// Washed out print.
    pub const VINTAGE: Self = m3([
        0.627_934_6, 0.320_218_35, -0.039_654_084,
        0.025_783_977, 0.644_118_85, 0.032_591_276,
        0.046_605_557, -0.085_123_3, 0.524_164_8,
    ]);
    /// BT.601 luma on every channel.
    pub const ACHROMATOPSIA: Self = m3([0.299, 0.587, 0.114, 0.299, 0.587, 0.114, 0.299, 0.587, 0.114]);
    /// Partial colour blindness simulation.
    pub const ACHROMATOMALY: Self = m3([0.618, 0.320, 0.062, 0.163, 0.775, 0.062, 0.163, 0.320, 0.516]);
    /// Red-weak simulation.
    pub const PROTANOMALY: Self = m3([0.817, 0.183, 0.0, 0.333, 0.667, 0.0, 0.0, 0.125, 0.875]);
    /// Green-weak simulation.
    pub const DEUTERANOMALY: Self = m3([0.8, 0.2, 0.0, 0.258, 0.742, 0.0, 0.0, 0.142, 0.858]);
    /// Blue-weak simulation.
    pub const TRITANOMALY: Self = m3([0.967, 0.033, 0.0, 0.0, 0.733, 0.267, 0.0, 0.183, 0.817]);
    /// Red-blind simulation.
    pub const PROTANOPIA: Self = m3([0.567, 0.433, 0.0, 0.558, 0.442, 0.0, 0.0, 0.242, 0.758]);
    /// Green-blind simulation.
    pub const DEUTERANOPIA: Self = m3([0.625, 0.375, 0.0, 0.7, 0.3, 0.0, 0.0, 0.3, 0.7]);
    /// Blue-blind simulation.
    pub const TRITANOPIA: Self = m3([0.95, 0.05, 0.0, 0.0, 0.433, 0.567, 0.0, 0.475, 0.525]);

    /// A row-major 3x3 matrix.
    pub fn from_3x3(m: [f32; 9]) -> Self {
        m3(m)
    }

    /// A row-major 3x4 matrix, the last column of each row is an offset.
    pub fn from_3x4(m: [f32; 12]) -> Self {
        Self {
            rows: [
                [m[0], m[1], m[2], m[3]],
                [m[4], m[5], m[6], m[7]],
                [m[8], m[9], m[10], m[11]],
            ],
        }
    }

    /// Scale red up and blue down by `v`.
    pub fn temperature(v: f32) -> Self {
        m3([1.0 + v, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0 - v])
    }

    /// Rotate hues by `radians` around the luma axis.
    pub fn hue_rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        m3([
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ])
    }

    /// The matrix rows, offset last.
    pub fn rows(&self) -> &[[f32; 4]; 3] {
        &self.rows
    }

    /// Transform one RGB triple.
    #[inline]
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        self.rows
            .map(|r| r[0] * rgb[0] + r[1] * rgb[1] + r[2] * rgb[2] + r[3])
    }
}

/// Transform the colour channels by a [`ColorMatrix`].
///
/// # Errors
///
/// Returns an error if the raster has fewer than three channels.
///
/// # Example
///
/// ```
/// use aire_image::Image;
/// use aire_imgproc::tone::{color_matrix, ColorMatrix};
///
/// let img = Image::<u8, 4>::from_fn([2, 2].into(), |_, _| [10, 200, 30, 255]);
/// let out = color_matrix(&img, &ColorMatrix::ACHROMATOPSIA).unwrap();
/// let px = out.pixel(0, 0);
/// assert!(px[0] == px[1] && px[1] == px[2]);
/// ```
pub fn color_matrix<const C: usize>(
    src: &Image<u8, C>,
    matrix: &ColorMatrix,
) -> Result<Image<u8, C>, ImageError> {
    log::debug!("color_matrix: {} {:?}", src.size(), matrix.rows);
    let matrix = *matrix;
    map_encoded(src, "color_matrix", move |rgb| matrix.apply(rgb))
}
