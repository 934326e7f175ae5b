use std::f32::consts::PI;

use aire_image::ImageError;

use super::Kernel2D;

/// Check that a kernel size is odd and at least one.
pub(crate) fn ensure_odd(kernel_size: usize) -> Result<(), ImageError> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(ImageError::InvalidKernelSize(kernel_size));
    }
    Ok(())
}

/// Check that a sigma is finite and non-negative.
pub(crate) fn ensure_sigma(sigma: f32) -> Result<(), ImageError> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(ImageError::InvalidSigma(sigma));
    }
    Ok(())
}

/// Sigma used when the caller passes zero: `(kernel_size - 1) / 6`.
pub fn default_sigma(kernel_size: usize) -> f32 {
    kernel_size.saturating_sub(1) as f32 / 6.0
}

/// Create a box blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
///
/// # Returns
///
/// A vector of the kernel.
pub fn box_blur_kernel_1d(kernel_size: usize) -> Vec<f32> {
    vec![1.0 / kernel_size as f32; kernel_size]
}

/// Create a normalized square box kernel.
///
/// # Errors
///
/// Returns an error if `kernel_size` is not odd.
pub fn box_kernel(kernel_size: usize) -> Result<Kernel2D, ImageError> {
    ensure_odd(kernel_size)?;
    let n = kernel_size * kernel_size;
    Kernel2D::new(kernel_size, kernel_size, vec![1.0 / n as f32; n])
}

/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel, odd.
/// * `sigma` - The sigma of the gaussian kernel, `0` derives it from the size.
///
/// # Returns
///
/// A normalized, symmetric vector of the kernel.
///
/// # Errors
///
/// Returns an error if the size is even or the sigma is negative.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Result<Vec<f32>, ImageError> {
    ensure_odd(kernel_size)?;
    ensure_sigma(sigma)?;

    let sigma = if sigma == 0.0 {
        default_sigma(kernel_size)
    } else {
        sigma
    };

    let half = (kernel_size / 2) as isize;
    if sigma == 0.0 {
        // a zero-width gaussian is a delta
        return Ok((-half..=half)
            .map(|i| if i == 0 { 1.0 } else { 0.0 })
            .collect());
    }

    let sigma_sq = sigma * sigma;
    let mut kernel = (-half..=half)
        .map(|i| {
            let x = i as f32;
            (-(x * x) / (2.0 * sigma_sq)).exp()
        })
        .collect::<Vec<_>>();

    // normalize the kernel
    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    Ok(kernel)
}

/// Create a normalized 2D gaussian kernel as the outer product of two 1D kernels.
pub fn gaussian_kernel_2d(kernel_size: usize, sigma: f32) -> Result<Kernel2D, ImageError> {
    let k = gaussian_kernel_1d(kernel_size, sigma)?;
    Kernel2D::from_separable(&k, &k)
}

/// Create the separable sobel kernels `(derivative, smoothing)`.
///
/// # Errors
///
/// Only sizes 3 and 5 are supported.
pub fn sobel_kernels(kernel_size: usize) -> Result<(Vec<f32>, Vec<f32>), ImageError> {
    match kernel_size {
        3 => Ok((vec![-1.0, 0.0, 1.0], vec![1.0, 2.0, 1.0])),
        5 => Ok((
            vec![-1.0, -2.0, 0.0, 2.0, 1.0],
            vec![1.0, 4.0, 6.0, 4.0, 1.0],
        )),
        _ => Err(ImageError::InvalidKernelSize(kernel_size)),
    }
}

/// 4-connected 3x3 laplacian.
pub fn laplacian_kernel() -> Kernel2D {
    Kernel2D {
        width: 3,
        height: 3,
        weights: vec![0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0],
    }
}

/// 3x3 sharpening kernel, sums to one.
pub fn sharpen_kernel() -> Kernel2D {
    Kernel2D {
        width: 3,
        height: 3,
        weights: vec![0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0],
    }
}

/// 3x3 emboss kernel lit from the top left, sums to one.
pub fn emboss_kernel(strength: f32) -> Result<Kernel2D, ImageError> {
    if !strength.is_finite() || strength < 0.0 {
        return Err(ImageError::InvalidParameter(
            "strength",
            format!("must be finite and >= 0, got {strength}"),
        ));
    }
    let s = strength;
    Kernel2D::new(
        3,
        3,
        vec![-2.0 * s, -s, 0.0, -s, 1.0, s, 0.0, s, 2.0 * s],
    )
}

/// Unsharp mask as a single kernel: `(1 + amount) * delta - amount * gaussian`.
pub fn unsharp_kernel(kernel_size: usize, sigma: f32, amount: f32) -> Result<Kernel2D, ImageError> {
    if !amount.is_finite() {
        return Err(ImageError::InvalidParameter(
            "amount",
            format!("must be finite, got {amount}"),
        ));
    }
    let gauss = gaussian_kernel_2d(kernel_size, sigma)?;
    let center = (kernel_size * kernel_size) / 2;
    let weights = gauss
        .weights()
        .iter()
        .enumerate()
        .map(|(i, &g)| {
            let delta = if i == center { 1.0 + amount } else { 0.0 };
            delta - amount * g
        })
        .collect();
    Kernel2D::new(kernel_size, kernel_size, weights)
}

/// Anti-aliased line of length `kernel_size` through the center at `angle` degrees.
///
/// The angle is measured counter-clockwise from the positive x axis with y
/// pointing down.
///
/// # Errors
///
/// Returns an error if `kernel_size` is even or `angle` is not finite.
pub fn motion_kernel(kernel_size: usize, angle: f32) -> Result<Kernel2D, ImageError> {
    ensure_odd(kernel_size)?;
    if !angle.is_finite() {
        return Err(ImageError::InvalidParameter(
            "angle",
            format!("must be finite, got {angle}"),
        ));
    }

    let r = (kernel_size / 2) as f32;
    let (sin, cos) = (-angle).to_radians().sin_cos();
    let weights = shape_weights(kernel_size, |dx, dy| {
        let along = dx * cos + dy * sin;
        let across = (-dx * sin + dy * cos).abs();
        if along.abs() <= r + 0.5 {
            (1.0 - across).max(0.0)
        } else {
            0.0
        }
    });
    Ok(Kernel2D::new(kernel_size, kernel_size, weights)?.normalized())
}

/// Regular polygon aperture with `sides` vertices inscribed in the kernel.
///
/// # Errors
///
/// Returns an error if `kernel_size` is even or below 3, or `sides` is below 3.
pub fn bokeh_kernel(kernel_size: usize, sides: usize) -> Result<Kernel2D, ImageError> {
    ensure_odd(kernel_size)?;
    if kernel_size < 3 {
        return Err(ImageError::InvalidRadius {
            radius: kernel_size,
            min: 3,
            max: usize::MAX,
        });
    }
    if sides < 3 {
        return Err(ImageError::InvalidParameter(
            "sides",
            format!("a polygon needs at least 3 sides, got {sides}"),
        ));
    }

    let radius = (kernel_size / 2) as f32 + 0.5;
    let sector = 2.0 * PI / sides as f32;
    let apothem = radius * (sector / 2.0).cos();
    let weights = shape_weights(kernel_size, |dx, dy| {
        let dist = (dx * dx + dy * dy).sqrt();
        if dist == 0.0 {
            return 1.0;
        }
        // first vertex points up
        let theta = dy.atan2(dx) + PI / 2.0;
        let local = theta.rem_euclid(sector) - sector / 2.0;
        if dist * local.cos() <= apothem {
            1.0
        } else {
            0.0
        }
    });
    Ok(Kernel2D::new(kernel_size, kernel_size, weights)?.normalized())
}

/// One pixel wide ring touching the kernel border.
pub fn ring_kernel(kernel_size: usize) -> Result<Kernel2D, ImageError> {
    ensure_odd(kernel_size)?;
    let r = (kernel_size / 2) as f32;
    let weights = shape_weights(kernel_size, |dx, dy| {
        let d = (dx * dx + dy * dy).sqrt();
        if (d - r).abs() <= 0.5 {
            1.0
        } else {
            0.0
        }
    });
    with_center_fallback(kernel_size, weights)
}

/// Filled disc inscribed in the kernel.
pub fn circle_kernel(kernel_size: usize) -> Result<Kernel2D, ImageError> {
    ensure_odd(kernel_size)?;
    let r = (kernel_size / 2) as f32;
    let weights = shape_weights(kernel_size, |dx, dy| {
        if dx * dx + dy * dy <= r * r + 0.5 {
            1.0
        } else {
            0.0
        }
    });
    with_center_fallback(kernel_size, weights)
}

/// Center row and center column.
pub fn star_kernel(kernel_size: usize) -> Result<Kernel2D, ImageError> {
    ensure_odd(kernel_size)?;
    let weights = shape_weights(kernel_size, |dx, dy| {
        if dx == 0.0 || dy == 0.0 {
            1.0
        } else {
            0.0
        }
    });
    with_center_fallback(kernel_size, weights)
}

/// Both diagonals.
pub fn cross_kernel(kernel_size: usize) -> Result<Kernel2D, ImageError> {
    ensure_odd(kernel_size)?;
    let weights = shape_weights(kernel_size, |dx, dy| {
        if dx.abs() == dy.abs() {
            1.0
        } else {
            0.0
        }
    });
    with_center_fallback(kernel_size, weights)
}

fn shape_weights(kernel_size: usize, f: impl Fn(f32, f32) -> f32) -> Vec<f32> {
    let r = (kernel_size / 2) as f32;
    (0..kernel_size * kernel_size)
        .map(|i| {
            let dx = (i % kernel_size) as f32 - r;
            let dy = (i / kernel_size) as f32 - r;
            f(dx, dy)
        })
        .collect()
}

fn with_center_fallback(kernel_size: usize, mut weights: Vec<f32>) -> Result<Kernel2D, ImageError> {
    if weights.iter().all(|&w| w == 0.0) {
        weights[(kernel_size * kernel_size) / 2] = 1.0;
    }
    Ok(Kernel2D::new(kernel_size, kernel_size, weights)?.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sobel_kernels() -> Result<(), ImageError> {
        let (d, s) = sobel_kernels(3)?;
        assert_eq!(d, vec![-1.0, 0.0, 1.0]);
        assert_eq!(s, vec![1.0, 2.0, 1.0]);

        let (d, s) = sobel_kernels(5)?;
        assert_eq!(d, vec![-1.0, -2.0, 0.0, 2.0, 1.0]);
        assert_eq!(s, vec![1.0, 4.0, 6.0, 4.0, 1.0]);

        assert_eq!(sobel_kernels(7), Err(ImageError::InvalidKernelSize(7)));
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_1d() -> Result<(), ImageError> {
        let kernel = gaussian_kernel_1d(5, 0.5)?;

        let expected = [
            0.00026386508,
            0.10645077,
            0.78657067,
            0.10645077,
            0.00026386508,
        ];

        for (k, e) in kernel.iter().zip(expected) {
            assert_relative_eq!(*k, e, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn gaussian_rejects_bad_parameters() {
        assert_eq!(
            gaussian_kernel_1d(4, 1.0),
            Err(ImageError::InvalidKernelSize(4))
        );
        assert_eq!(
            gaussian_kernel_1d(3, -1.0),
            Err(ImageError::InvalidSigma(-1.0))
        );
    }

    #[test]
    fn gaussian_zero_sigma() -> Result<(), ImageError> {
        assert_eq!(gaussian_kernel_1d(1, 0.0)?, vec![1.0]);
        let k = gaussian_kernel_1d(7, 0.0)?;
        assert_relative_eq!(k.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert!(k[3] > k[2] && k[2] > k[1]);
        Ok(())
    }

    #[test]
    fn sharpen_and_emboss_preserve_flat_regions() -> Result<(), ImageError> {
        assert_relative_eq!(sharpen_kernel().sum(), 1.0);
        assert_relative_eq!(emboss_kernel(1.5)?.sum(), 1.0);
        assert_relative_eq!(unsharp_kernel(5, 1.0, 0.8)?.sum(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(laplacian_kernel().sum(), 0.0);
        Ok(())
    }

    #[test]
    fn motion_kernel_follows_angle() -> Result<(), ImageError> {
        let k = motion_kernel(5, 0.0)?;
        assert!(k.is_normalized());
        // horizontal line: only the center row is populated
        for (i, w) in k.weights().iter().enumerate() {
            assert_eq!(*w > 0.0, i / 5 == 2, "tap {i}");
        }

        let k = motion_kernel(5, 90.0)?;
        for (i, w) in k.weights().iter().enumerate() {
            assert_eq!(*w > 1e-6, i % 5 == 2, "tap {i}");
        }
        Ok(())
    }

    #[test]
    fn bokeh_kernel_is_polygon() -> Result<(), ImageError> {
        let k = bokeh_kernel(9, 6)?;
        assert!(k.is_normalized());
        let w = k.weights();
        // center and the top vertex are inside, the corners are outside
        assert!(w[4 * 9 + 4] > 0.0);
        assert!(w[4] > 0.0);
        assert_eq!(w[0], 0.0);
        assert_eq!(w[80], 0.0);

        assert!(bokeh_kernel(9, 2).is_err());
        assert!(matches!(
            bokeh_kernel(1, 5),
            Err(ImageError::InvalidRadius { min: 3, .. })
        ));
        Ok(())
    }

    #[test]
    fn shape_kernels() -> Result<(), ImageError> {
        let star = star_kernel(5)?;
        assert_eq!(star.weights().iter().filter(|&&w| w > 0.0).count(), 9);
        let cross = cross_kernel(5)?;
        assert_eq!(cross.weights().iter().filter(|&&w| w > 0.0).count(), 9);
        let ring = ring_kernel(7)?;
        assert_eq!(ring.weights()[3 * 7 + 3], 0.0);
        assert!(ring.is_normalized());
        let circle = circle_kernel(5)?;
        assert!(circle.weights()[2 * 5 + 2] > 0.0);
        assert_eq!(circle.weights()[0], 0.0);
        assert_eq!(ring_kernel(1)?.weights(), &[1.0]);
        Ok(())
    }
}
