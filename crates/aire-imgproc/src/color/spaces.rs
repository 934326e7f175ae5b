//! Single pixel conversions between linear sRGB and the perceptual spaces.
//!
//! All spaces use the D65 white point. Linear RGB and XYZ are relative,
//! `Y = 1` for white.

/// D65 reference white.
pub const D65_WHITE: [f32; 3] = [0.950_47, 1.0, 1.088_83];

const LAB_EPSILON: f32 = 216.0 / 24389.0;
const LAB_KAPPA: f32 = 24389.0 / 27.0;

/// Luminance in cd/m² assigned to relative `Y = 1` for Jzazbz.
pub const JZAZBZ_WHITE_NITS: f64 = 203.0;

#[inline]
fn mul3(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

const RGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.412_456_4, 0.357_576_1, 0.180_437_5],
    [0.212_672_9, 0.715_152_2, 0.072_175_0],
    [0.019_333_9, 0.119_192_0, 0.950_304_1],
];

const XYZ_TO_RGB: [[f32; 3]; 3] = [
    [3.240_454_2, -1.537_138_5, -0.498_531_4],
    [-0.969_266_0, 1.876_010_8, 0.041_556_0],
    [0.055_643_4, -0.204_025_9, 1.057_225_2],
];

/// Linear sRGB to CIE XYZ.
#[inline]
pub fn rgb_to_xyz(rgb: [f32; 3]) -> [f32; 3] {
    mul3(&RGB_TO_XYZ, rgb)
}

/// CIE XYZ to linear sRGB.
#[inline]
pub fn xyz_to_rgb(xyz: [f32; 3]) -> [f32; 3] {
    mul3(&XYZ_TO_RGB, xyz)
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        (LAB_KAPPA * t + 16.0) / 116.0
    }
}

#[inline]
fn lab_f_inv(f: f32) -> f32 {
    let f3 = f * f * f;
    if f3 > LAB_EPSILON {
        f3
    } else {
        (116.0 * f - 16.0) / LAB_KAPPA
    }
}

/// CIE XYZ to CIE L*a*b*, `L` in `[0, 100]`.
pub fn xyz_to_lab(xyz: [f32; 3]) -> [f32; 3] {
    let fx = lab_f(xyz[0] / D65_WHITE[0]);
    let fy = lab_f(xyz[1] / D65_WHITE[1]);
    let fz = lab_f(xyz[2] / D65_WHITE[2]);
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// CIE L*a*b* to CIE XYZ.
pub fn lab_to_xyz(lab: [f32; 3]) -> [f32; 3] {
    let fy = (lab[0] + 16.0) / 116.0;
    let fx = lab[1] / 500.0 + fy;
    let fz = fy - lab[2] / 200.0;
    let yr = if lab[0] > LAB_KAPPA * LAB_EPSILON {
        fy * fy * fy
    } else {
        lab[0] / LAB_KAPPA
    };
    [
        lab_f_inv(fx) * D65_WHITE[0],
        yr * D65_WHITE[1],
        lab_f_inv(fz) * D65_WHITE[2],
    ]
}

#[inline]
fn uv_prime(xyz: [f32; 3]) -> (f32, f32) {
    let den = xyz[0] + 15.0 * xyz[1] + 3.0 * xyz[2];
    if den == 0.0 {
        return (0.0, 0.0);
    }
    (4.0 * xyz[0] / den, 9.0 * xyz[1] / den)
}

/// CIE XYZ to CIE L*u*v*.
pub fn xyz_to_luv(xyz: [f32; 3]) -> [f32; 3] {
    let (un, vn) = uv_prime(D65_WHITE);
    let yr = xyz[1] / D65_WHITE[1];
    let l = if yr > LAB_EPSILON {
        116.0 * yr.cbrt() - 16.0
    } else {
        LAB_KAPPA * yr
    };
    if xyz[0] + 15.0 * xyz[1] + 3.0 * xyz[2] == 0.0 {
        return [l, 0.0, 0.0];
    }
    let (u_p, v_p) = uv_prime(xyz);
    [l, 13.0 * l * (u_p - un), 13.0 * l * (v_p - vn)]
}

/// CIE L*u*v* to CIE XYZ.
pub fn luv_to_xyz(luv: [f32; 3]) -> [f32; 3] {
    let l = luv[0];
    if l <= 0.0 {
        return [0.0; 3];
    }
    let (un, vn) = uv_prime(D65_WHITE);
    let u_p = luv[1] / (13.0 * l) + un;
    let v_p = luv[2] / (13.0 * l) + vn;
    let y = if l > LAB_KAPPA * LAB_EPSILON {
        let f = (l + 16.0) / 116.0;
        f * f * f
    } else {
        l / LAB_KAPPA
    } * D65_WHITE[1];
    if v_p == 0.0 {
        return [0.0, y, 0.0];
    }
    let x = y * 9.0 * u_p / (4.0 * v_p);
    let z = y * (12.0 - 3.0 * u_p - 20.0 * v_p) / (4.0 * v_p);
    [x, y, z]
}

/// CIE L*u*v* to its cylindrical form LCh(uv), hue in degrees `[0, 360)`.
pub fn luv_to_lch(luv: [f32; 3]) -> [f32; 3] {
    let c = luv[1].hypot(luv[2]);
    let h = luv[2].atan2(luv[1]).to_degrees().rem_euclid(360.0);
    [luv[0], c, h]
}

/// LCh(uv) to CIE L*u*v*.
pub fn lch_to_luv(lch: [f32; 3]) -> [f32; 3] {
    let (sin, cos) = lch[2].to_radians().sin_cos();
    [lch[0], lch[1] * cos, lch[1] * sin]
}

/// Linear sRGB to Oklab.
pub fn linear_to_oklab(rgb: [f32; 3]) -> [f32; 3] {
    let lms = mul3(
        &[
            [0.412_221_46, 0.536_332_55, 0.051_445_995],
            [0.211_903_5, 0.680_699_5, 0.107_396_96],
            [0.088_302_46, 0.281_718_85, 0.629_978_7],
        ],
        rgb,
    );
    let lms = lms.map(f32::cbrt);
    mul3(
        &[
            [0.210_454_26, 0.793_617_8, -0.004_072_047],
            [1.977_998_5, -2.428_592_2, 0.450_593_7],
            [0.025_904_037, 0.782_771_77, -0.808_675_77],
        ],
        lms,
    )
}

/// Oklab to linear sRGB.
pub fn oklab_to_linear(lab: [f32; 3]) -> [f32; 3] {
    let lms = mul3(
        &[
            [1.0, 0.396_337_78, 0.215_803_76],
            [1.0, -0.105_561_346, -0.063_854_17],
            [1.0, -0.089_484_18, -1.291_485_5],
        ],
        lab,
    );
    let lms = lms.map(|v| v * v * v);
    mul3(
        &[
            [4.076_741_7, -3.307_711_6, 0.230_969_94],
            [-1.268_438, 2.609_757_4, -0.341_319_38],
            [-0.004_196_086_3, -0.703_418_6, 1.707_614_7],
        ],
        lms,
    )
}

mod jz {
    pub const B: f64 = 1.15;
    pub const G: f64 = 0.66;
    pub const C1: f64 = 3424.0 / 4096.0;
    pub const C2: f64 = 2413.0 / 128.0;
    pub const C3: f64 = 2392.0 / 128.0;
    pub const N: f64 = 2610.0 / 16384.0;
    pub const P: f64 = 1.7 * 2523.0 / 32.0;
    pub const D: f64 = -0.56;
    pub const D0: f64 = 1.629_549_953_282_156_6e-11;

    pub fn pq(x: f64) -> f64 {
        let xn = (x.max(0.0) / 10000.0).powf(N);
        ((C1 + C2 * xn) / (1.0 + C3 * xn)).powf(P)
    }

    pub fn pq_inv(v: f64) -> f64 {
        let vp = v.max(0.0).powf(1.0 / P);
        let num = (vp - C1).max(0.0);
        let den = C2 - C3 * vp;
        10000.0 * (num / den).powf(1.0 / N)
    }
}

/// CIE XYZ to Jzazbz, with relative white mapped to [`JZAZBZ_WHITE_NITS`].
pub fn xyz_to_jzazbz(xyz: [f32; 3]) -> [f32; 3] {
    use jz::*;
    let [x, y, z] = xyz.map(|v| v as f64 * JZAZBZ_WHITE_NITS);
    let xp = B * x - (B - 1.0) * z;
    let yp = G * y - (G - 1.0) * x;

    let l = 0.414_789_72 * xp + 0.579_999 * yp + 0.014_648 * z;
    let m = -0.201_51 * xp + 1.120_649 * yp + 0.053_100_8 * z;
    let s = -0.016_600_8 * xp + 0.264_8 * yp + 0.668_479_9 * z;

    let (lp, mp, sp) = (pq(l), pq(m), pq(s));
    let iz = 0.5 * lp + 0.5 * mp;
    let az = 3.524_000 * lp - 4.066_708 * mp + 0.542_708 * sp;
    let bz = 0.199_076 * lp + 1.096_799 * mp - 1.295_875 * sp;
    let jz = (1.0 + D) * iz / (1.0 + D * iz) - D0;
    [jz as f32, az as f32, bz as f32]
}

/// Jzazbz to CIE XYZ.
pub fn jzazbz_to_xyz(jab: [f32; 3]) -> [f32; 3] {
    use jz::*;
    let [jz, az, bz] = jab.map(|v| v as f64);
    let jz = jz + D0;
    let iz = jz / (1.0 + D - D * jz);

    let lp = iz + 0.138_605_043_271_539 * az + 0.058_047_316_156_118_9 * bz;
    let mp = iz - 0.138_605_043_271_539 * az - 0.058_047_316_156_118_9 * bz;
    let sp = iz - 0.096_019_242_026_319 * az - 0.811_891_896_056_039 * bz;
    let (l, m, s) = (pq_inv(lp), pq_inv(mp), pq_inv(sp));

    let xp = 1.924_226_435_787_606_7 * l - 1.004_792_312_595_365_7 * m
        + 0.037_651_404_030_618 * s;
    let yp = 0.350_316_762_094_999 * l + 0.726_481_193_931_655 * m
        - 0.065_384_422_948_085 * s;
    let z = -0.090_982_810_982_847_5 * l - 0.312_728_290_523_074 * m
        + 1.522_766_561_305_260_3 * s;

    let x = (xp + (B - 1.0) * z) / B;
    let y = (yp + (G - 1.0) * x) / G;
    [x, y, z].map(|v| (v / JZAZBZ_WHITE_NITS) as f32)
}
