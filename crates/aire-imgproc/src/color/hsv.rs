/// Convert an RGB triple in `[0, 1]` to HSV.
///
/// # Returns
///
/// `[h, s, v]` with the hue in degrees `[0, 360)` and saturation/value in `[0, 1]`.
pub fn rgb_to_hsv(rgb: [f32; 3]) -> [f32; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = hue(r, g, b, max, delta);
    let s = if max == 0.0 { 0.0 } else { delta / max };
    [h, s, max]
}

/// Convert HSV back to an RGB triple in `[0, 1]`.
pub fn hsv_to_rgb(hsv: [f32; 3]) -> [f32; 3] {
    let [h, s, v] = hsv;
    let c = v * s;
    from_chroma(h, c, v - c)
}

/// Convert an RGB triple in `[0, 1]` to HSL.
///
/// # Returns
///
/// `[h, s, l]` with the hue in degrees `[0, 360)` and saturation/lightness in `[0, 1]`.
pub fn rgb_to_hsl(rgb: [f32; 3]) -> [f32; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = hue(r, g, b, max, delta);
    let l = (max + min) / 2.0;
    let s = if delta == 0.0 {
        0.0
    } else {
        delta / (1.0 - (2.0 * l - 1.0).abs())
    };
    [h, s, l]
}

/// Convert HSL back to an RGB triple in `[0, 1]`.
pub fn hsl_to_rgb(hsl: [f32; 3]) -> [f32; 3] {
    let [h, s, l] = hsl;
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    from_chroma(h, c, l - c / 2.0)
}

#[inline]
fn hue(r: f32, g: f32, b: f32, max: f32, delta: f32) -> f32 {
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    // Ensure h is in the range [0, 360)
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

#[inline]
fn from_chroma(h: f32, c: f32, m: f32) -> [f32; 3] {
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m]
}
