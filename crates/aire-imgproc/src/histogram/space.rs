use crate::color::{
    hsl_to_rgb, hsv_to_rgb, lab_to_xyz, linear_to_oklab, luv_to_xyz, oklab_to_linear, rgb_to_hsl,
    rgb_to_hsv, rgb_to_xyz, rgb_to_yuv, xyz_to_lab, xyz_to_luv, xyz_to_rgb, yuv_to_rgb,
    TransferFunction,
};

/// The space whose lightness channel is equalized.
///
/// Chroma is kept, only lightness is remapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HistogramSpace {
    /// BT.709 full range luma.
    #[default]
    Yuv,
    /// HSV value.
    Hsv,
    /// HSL lightness.
    Hsl,
    /// CIE L*a*b* lightness.
    Lab,
    /// CIE L*u*v* lightness.
    Luv,
    /// Oklab lightness.
    Oklab,
}

const TF: TransferFunction = TransferFunction::Srgb;

impl HistogramSpace {
    /// Index of the lightness component in [`HistogramSpace::decompose`].
    pub fn lightness_index(&self) -> usize {
        match self {
            HistogramSpace::Hsv | HistogramSpace::Hsl => 2,
            _ => 0,
        }
    }

    /// Split encoded RGB in `[0, 1]` into components with lightness in `[0, 1]`.
    pub fn decompose(&self, rgb: [f32; 3]) -> [f32; 3] {
        let linear = || rgb.map(|v| TF.linearize(v));
        match self {
            HistogramSpace::Yuv => rgb_to_yuv(rgb),
            HistogramSpace::Hsv => rgb_to_hsv(rgb),
            HistogramSpace::Hsl => rgb_to_hsl(rgb),
            HistogramSpace::Lab => {
                let [l, a, b] = xyz_to_lab(rgb_to_xyz(linear()));
                [l / 100.0, a, b]
            }
            HistogramSpace::Luv => {
                let [l, u, v] = xyz_to_luv(rgb_to_xyz(linear()));
                [l / 100.0, u, v]
            }
            HistogramSpace::Oklab => linear_to_oklab(linear()),
        }
    }

    /// Inverse of [`HistogramSpace::decompose`], unclipped.
    pub fn compose(&self, v: [f32; 3]) -> [f32; 3] {
        let encode = |rgb: [f32; 3]| rgb.map(|c| TF.gamma(c));
        match self {
            HistogramSpace::Yuv => yuv_to_rgb(v),
            HistogramSpace::Hsv => hsv_to_rgb(v),
            HistogramSpace::Hsl => hsl_to_rgb(v),
            HistogramSpace::Lab => encode(xyz_to_rgb(lab_to_xyz([v[0] * 100.0, v[1], v[2]]))),
            HistogramSpace::Luv => encode(xyz_to_rgb(luv_to_xyz([v[0] * 100.0, v[1], v[2]]))),
            HistogramSpace::Oklab => encode(oklab_to_linear(v)),
        }
    }
}
