/// Gamma curve relating encoded samples to linear light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransferFunction {
    /// IEC 61966-2-1 piecewise curve.
    #[default]
    Srgb,
    /// ITU-R BT.709 camera curve.
    Rec709,
    /// Pure power 2.2.
    Gamma2p2,
    /// Pure power 2.8.
    Gamma2p8,
}

const REC709_ALPHA: f32 = 1.099_296_8;
const REC709_BETA: f32 = 0.018_053_97;

impl TransferFunction {
    /// Decode an encoded sample in `[0, 1]` to linear light.
    #[inline]
    pub fn linearize(&self, v: f32) -> f32 {
        let v = v.clamp(0.0, 1.0);
        match self {
            TransferFunction::Srgb => {
                if v <= 0.04045 {
                    v / 12.92
                } else {
                    ((v + 0.055) / 1.055).powf(2.4)
                }
            }
            TransferFunction::Rec709 => {
                if v < 4.5 * REC709_BETA {
                    v / 4.5
                } else {
                    ((v + REC709_ALPHA - 1.0) / REC709_ALPHA).powf(1.0 / 0.45)
                }
            }
            TransferFunction::Gamma2p2 => v.powf(2.2),
            TransferFunction::Gamma2p8 => v.powf(2.8),
        }
    }

    /// Encode a linear sample in `[0, 1]`.
    #[inline]
    pub fn gamma(&self, v: f32) -> f32 {
        let v = v.clamp(0.0, 1.0);
        match self {
            TransferFunction::Srgb => {
                if v <= 0.003_130_8 {
                    v * 12.92
                } else {
                    1.055 * v.powf(1.0 / 2.4) - 0.055
                }
            }
            TransferFunction::Rec709 => {
                if v < REC709_BETA {
                    v * 4.5
                } else {
                    REC709_ALPHA * v.powf(0.45) - (REC709_ALPHA - 1.0)
                }
            }
            TransferFunction::Gamma2p2 => v.powf(1.0 / 2.2),
            TransferFunction::Gamma2p8 => v.powf(1.0 / 2.8),
        }
    }

    /// Linear value of every 8-bit code.
    pub fn linearization_table(&self) -> [f32; 256] {
        std::array::from_fn(|i| self.linearize(i as f32 / 255.0))
    }
}
