use aire_image::ImageError;

/// Smallest side accepted for shaped structuring elements.
pub const MIN_ELEMENT_SIZE: usize = 3;

/// Shapes of a [`StructuringElement`].
///
/// All elements are anchored at `(width / 2, height / 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelShape {
    /// Every pixel of a `size x size` square.
    Box {
        /// Side of the square.
        size: usize,
    },
    /// The center row and column of a `size x size` square.
    Cross {
        /// Side of the square.
        size: usize,
    },
    /// Pixels inside the inscribed ellipse.
    Ellipse {
        /// Width of the ellipse.
        width: usize,
        /// Height of the ellipse.
        height: usize,
    },
}

/// A binary neighbourhood used by [`dilate`](super::dilate) and [`erode`](super::erode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    mask: Vec<bool>,
    width: usize,
    height: usize,
}

fn ensure_size(size: usize) -> Result<(), ImageError> {
    if size < MIN_ELEMENT_SIZE {
        return Err(ImageError::InvalidRadius {
            radius: size,
            min: MIN_ELEMENT_SIZE,
            max: usize::MAX,
        });
    }
    Ok(())
}

impl StructuringElement {
    /// Build an element from a shape.
    ///
    /// # Errors
    ///
    /// Returns an error if a side is below 3.
    ///
    /// # Example
    ///
    /// ```
    /// use aire_imgproc::morphology::{KernelShape, StructuringElement};
    ///
    /// let element = StructuringElement::new(KernelShape::Cross { size: 3 }).unwrap();
    /// assert_eq!(element.anchor(), (1, 1));
    /// assert_eq!(element.support(), 5);
    /// ```
    pub fn new(shape: KernelShape) -> Result<Self, ImageError> {
        let (width, height) = match shape {
            KernelShape::Box { size } | KernelShape::Cross { size } => (size, size),
            KernelShape::Ellipse { width, height } => (width, height),
        };
        ensure_size(width)?;
        ensure_size(height)?;

        let (cx, cy) = (width / 2, height / 2);
        let mut mask = vec![false; width * height];
        for y in 0..height {
            for x in 0..width {
                mask[y * width + x] = match shape {
                    KernelShape::Box { .. } => true,
                    KernelShape::Cross { .. } => x == cx || y == cy,
                    KernelShape::Ellipse { .. } => {
                        let dx = (x as f32 - cx as f32) / (width as f32 / 2.0);
                        let dy = (y as f32 - cy as f32) / (height as f32 / 2.0);
                        dx * dx + dy * dy <= 1.0
                    }
                };
            }
        }
        Ok(Self {
            mask,
            width,
            height,
        })
    }

    /// Build an element from a row-major mask.
    ///
    /// # Errors
    ///
    /// Returns an error if the mask does not fill `width x height` or selects no pixel.
    pub fn from_mask(width: usize, height: usize, mask: Vec<bool>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 || mask.len() != width * height {
            return Err(ImageError::InvalidKernelShape(mask.len(), width, height));
        }
        if !mask.iter().any(|&m| m) {
            return Err(ImageError::InvalidParameter(
                "mask",
                "the structuring element selects no pixel".to_string(),
            ));
        }
        Ok(Self {
            mask,
            width,
            height,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The anchor `(x, y)`.
    pub fn anchor(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    /// Row-major mask.
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Number of selected pixels.
    pub fn support(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Offsets `(dx, dy)` of the selected pixels relative to the anchor.
    pub(crate) fn offsets(&self) -> Vec<(isize, isize)> {
        let (ax, ay) = self.anchor();
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, &m)| m)
            .map(|(i, _)| {
                let (x, y) = (i % self.width, i / self.width);
                (x as isize - ax as isize, y as isize - ay as isize)
            })
            .collect()
    }
}

/// Circular structuring element of the given diameter.
///
/// # Errors
///
/// Returns an error if `size` is below 3.
pub fn structuring_element(size: usize) -> Result<StructuringElement, ImageError> {
    StructuringElement::new(KernelShape::Ellipse {
        width: size,
        height: size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(element: &StructuringElement) -> String {
        element
            .mask()
            .chunks(element.width())
            .map(|row| row.iter().map(|&m| if m { '#' } else { '.' }).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_box_element() -> Result<(), ImageError> {
        let element = StructuringElement::new(KernelShape::Box { size: 3 })?;
        assert_eq!(element.support(), 9);
        assert_eq!(element.anchor(), (1, 1));
        Ok(())
    }

    #[test]
    fn test_cross_element() -> Result<(), ImageError> {
        let element = StructuringElement::new(KernelShape::Cross { size: 5 })?;
        assert_eq!(
            render(&element),
            "..#..\n..#..\n#####\n..#..\n..#.."
        );
        Ok(())
    }

    #[test]
    fn test_circle_element() -> Result<(), ImageError> {
        let element = structuring_element(5)?;
        assert_eq!(
            render(&element),
            ".###.\n#####\n#####\n#####\n.###."
        );
        let mut offsets = element.offsets();
        offsets.sort();
        assert_eq!(offsets.first(), Some(&(-2, -1)));
        Ok(())
    }

    #[test]
    fn test_small_elements_are_rejected() {
        for size in [0, 1, 2] {
            assert_eq!(
                structuring_element(size),
                Err(ImageError::InvalidRadius {
                    radius: size,
                    min: 3,
                    max: usize::MAX
                })
            );
        }
    }

    #[test]
    fn test_from_mask() -> Result<(), ImageError> {
        let element = StructuringElement::from_mask(2, 1, vec![true, true])?;
        assert_eq!(element.offsets(), vec![(-1, 0), (0, 0)]);
        assert!(StructuringElement::from_mask(2, 2, vec![true]).is_err());
        assert!(StructuringElement::from_mask(1, 1, vec![false]).is_err());
        Ok(())
    }
}
