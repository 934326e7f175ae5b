use aire_image::{Image, ImageError};

use super::{ensure_rgb, map_encoded};
use crate::color::TransferFunction;
use crate::parallel;

const YIQ: [[f32; 3]; 3] = [
    [0.299, 0.587, 0.114],
    [0.596, -0.274, -0.322],
    [0.212, -0.523, 0.311],
];

const Q_LIMIT: f32 = 0.5226;

const WARM_FILTER: [f32; 3] = [0.93, 0.54, 0.0];

/// Rec.709 luma weights, applied to linear light.
pub const BT709_LUMA: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// Rec.601 luma weights.
pub const BT601_LUMA: [f32; 3] = [0.299, 0.587, 0.114];

fn invert3(m: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let [[a, b, c], [d, e, f], [g, h, i]] = *m;
    let co = [
        e * i - f * h,
        -(d * i - f * g),
        d * h - e * g,
    ];
    let det = a * co[0] + b * co[1] + c * co[2];
    let inv = 1.0 / det;
    [
        [co[0] * inv, -(b * i - c * h) * inv, (b * f - c * e) * inv],
        [co[1] * inv, (a * i - c * g) * inv, -(a * f - c * d) * inv],
        [co[2] * inv, -(a * h - b * g) * inv, (a * e - b * d) * inv],
    ]
}

#[inline]
fn mul3(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    std::array::from_fn(|r| m[r][0] * v[0] + m[r][1] * v[1] + m[r][2] * v[2])
}

#[inline]
fn overlay(base: f32, blend: f32) -> f32 {
    if base < 0.5 {
        2.0 * base * blend
    } else {
        1.0 - 2.0 * (1.0 - base) * (1.0 - blend)
    }
}

fn ensure_finite(name: &'static str, v: f32) -> Result<(), ImageError> {
    if !v.is_finite() {
        return Err(ImageError::InvalidParameter(name, format!("must be finite, got {v}")));
    }
    Ok(())
}

/// Warm or cool the image and shift it along the green-magenta axis.
///
/// `tint` moves the YIQ `q` component by `tint / 1000` of its range, then
/// `temperature` blends toward a warm overlay (`0` keeps the colours, `1` is
/// the full overlay, negative values move away from it).
///
/// # Errors
///
/// Returns an error if a parameter is not finite or the raster has fewer than
/// three channels.
pub fn white_balance<const C: usize>(
    src: &Image<u8, C>,
    temperature: f32,
    tint: f32,
) -> Result<Image<u8, C>, ImageError> {
    ensure_finite("temperature", temperature)?;
    ensure_finite("tint", tint)?;
    log::debug!("white_balance: {} temperature {temperature} tint {tint}", src.size());

    let to_rgb = invert3(&YIQ);
    let shift = tint / 100.0 * Q_LIMIT * 0.1;
    map_encoded(src, "white_balance", move |rgb| {
        let mut yiq = mul3(&YIQ, rgb);
        yiq[2] = (yiq[2] + shift).clamp(-Q_LIMIT, Q_LIMIT);
        let rgb = mul3(&to_rgb, yiq);
        std::array::from_fn(|c| {
            let warm = overlay(rgb[c], WARM_FILTER[c]);
            rgb[c] + (warm - rgb[c]) * temperature
        })
    })
}

/// Add `bias` to every colour sample in `[0, 1]` units.
///
/// # Errors
///
/// Returns an error if `bias` is not finite or the raster has fewer than three
/// channels.
pub fn brightness<const C: usize>(
    src: &Image<u8, C>,
    bias: f32,
) -> Result<Image<u8, C>, ImageError> {
    ensure_finite("bias", bias)?;
    log::debug!("brightness: {} {bias}", src.size());
    map_encoded(src, "brightness", move |rgb| rgb.map(|v| v + bias))
}

/// Scale colour samples around mid gray by `gain`.
///
/// # Errors
///
/// Returns an error if `gain` is not finite or the raster has fewer than three
/// channels.
pub fn contrast<const C: usize>(
    src: &Image<u8, C>,
    gain: f32,
) -> Result<Image<u8, C>, ImageError> {
    ensure_finite("gain", gain)?;
    log::debug!("contrast: {} {gain}", src.size());
    map_encoded(src, "contrast", move |rgb| {
        rgb.map(|v| gain * (v - 0.5) + 0.5)
    })
}

/// Raise every colour sample to `1 / gamma`.
///
/// Values above one brighten mid tones; black and white are fixed points.
///
/// # Errors
///
/// Returns an error if `gamma` is not positive or the raster has fewer than
/// three channels.
pub fn gamma<const C: usize>(
    src: &Image<u8, C>,
    gamma: f32,
) -> Result<Image<u8, C>, ImageError> {
    if !(gamma.is_finite() && gamma > 0.0) {
        return Err(ImageError::InvalidParameter(
            "gamma",
            format!("must be > 0, got {gamma}"),
        ));
    }
    ensure_rgb::<C>("gamma")?;
    log::debug!("gamma: {} {gamma}", src.size());

    let inv = 1.0 / gamma;
    let lut: [u8; 256] = std::array::from_fn(|i| {
        ((i as f32 / 255.0).powf(inv) * 255.0).round().clamp(0.0, 255.0) as u8
    });
    let mut dst = src.clone();
    parallel::par_iter_rows(src, &mut dst, |s, d| {
        for c in 0..3 {
            d[c] = lut[s[c] as usize];
        }
    });
    Ok(dst)
}

/// Mix each pixel with its luma: `0` is gray, `1` unchanged, above `1`
/// oversaturated.
///
/// Luma is taken with [`BT709_LUMA`] in linear light and re-encoded.
///
/// # Errors
///
/// Returns an error if `saturation` is not finite or the raster has fewer than
/// three channels.
pub fn saturation<const C: usize>(
    src: &Image<u8, C>,
    saturation: f32,
) -> Result<Image<u8, C>, ImageError> {
    ensure_finite("saturation", saturation)?;
    log::debug!("saturation: {} {saturation}", src.size());
    let tf = TransferFunction::Srgb;
    map_encoded(src, "saturation", move |rgb| {
        let lin = rgb.map(|v| tf.linearize(v));
        let luma = tf.gamma(
            lin[0] * BT709_LUMA[0] + lin[1] * BT709_LUMA[1] + lin[2] * BT709_LUMA[2],
        );
        rgb.map(|v| luma + (v - luma) * saturation)
    })
}

/// Push every channel of colourful pixels by `vibrance` times the distance
/// between their largest channel and their mean.
///
/// Neutral pixels are left alone.
///
/// # Errors
///
/// Returns an error if `vibrance` is not finite or the raster has fewer than
/// three channels.
pub fn vibrance<const C: usize>(
    src: &Image<u8, C>,
    vibrance: f32,
) -> Result<Image<u8, C>, ImageError> {
    ensure_finite("vibrance", vibrance)?;
    ensure_rgb::<C>("vibrance")?;
    log::debug!("vibrance: {} {vibrance}", src.size());

    let mut dst = src.clone();
    parallel::par_iter_rows(src, &mut dst, |s, d| {
        let (r, g, b) = (s[0] as i32, s[1] as i32, s[2] as i32);
        let avg = (r + g + b) / 3;
        let max = r.max(g).max(b);
        let boost = ((max - avg) as f32 * vibrance).clamp(-255.0, 255.0) as i32;
        for c in 0..3 {
            d[c] = (s[c] as i32 + boost).clamp(0, 255) as u8;
        }
    });
    Ok(dst)
}

/// Replace the colour channels by a weighted luma.
///
/// The weights apply to linear light; the result is re-encoded and written to
/// all three colour channels.
///
/// # Errors
///
/// Returns an error if a weight is negative or the raster has fewer than three
/// channels.
pub fn grayscale<const C: usize>(
    src: &Image<u8, C>,
    weights: [f32; 3],
) -> Result<Image<u8, C>, ImageError> {
    if weights.iter().any(|w| !(w.is_finite() && *w >= 0.0)) {
        return Err(ImageError::InvalidParameter(
            "weights",
            format!("must be finite and >= 0, got {weights:?}"),
        ));
    }
    log::debug!("grayscale: {} {weights:?}", src.size());
    let tf = TransferFunction::Srgb;
    let lut = tf.linearization_table();
    map_encoded(src, "grayscale", move |rgb| {
        let luma: f32 = (0..3)
            .map(|c| lut[(rgb[c] * 255.0).round() as usize] * weights[c])
            .sum();
        [tf.gamma(luma); 3]
    })
}

/// Binarize on the red channel: samples above `level` become white, the rest
/// black, and the mask is written to all three colour channels.
///
/// # Errors
///
/// Returns an error if the raster has fewer than three channels.
pub fn threshold<const C: usize>(
    src: &Image<u8, C>,
    level: u8,
) -> Result<Image<u8, C>, ImageError> {
    ensure_rgb::<C>("threshold")?;
    log::debug!("threshold: {} {level}", src.size());
    let mut dst = src.clone();
    parallel::par_iter_rows(src, &mut dst, |s, d| {
        let v = if s[0] > level { 255 } else { 0 };
        d[..3].fill(v);
    });
    Ok(dst)
}
