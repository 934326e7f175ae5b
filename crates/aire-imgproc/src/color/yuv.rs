const KR: f32 = 0.2126;
const KB: f32 = 0.0722;
const KG: f32 = 1.0 - KR - KB;

/// Full range BT.709 luma and chroma from an RGB triple in `[0, 1]`.
///
/// `y` is in `[0, 1]`, `u` and `v` in `[-0.5, 0.5]`.
#[inline]
pub fn rgb_to_yuv(rgb: [f32; 3]) -> [f32; 3] {
    let [r, g, b] = rgb;
    let y = KR * r + KG * g + KB * b;
    let u = (b - y) / (2.0 * (1.0 - KB));
    let v = (r - y) / (2.0 * (1.0 - KR));
    [y, u, v]
}

/// Inverse of [`rgb_to_yuv`].
#[inline]
pub fn yuv_to_rgb(yuv: [f32; 3]) -> [f32; 3] {
    let [y, u, v] = yuv;
    let r = y + 2.0 * (1.0 - KR) * v;
    let b = y + 2.0 * (1.0 - KB) * u;
    let g = (y - KR * r - KB * b) / KG;
    [r, g, b]
}
