use crate::{Image, ImageError};

/// Per-sample saturating difference `a - b` of two 8-bit images.
///
/// # Errors
///
/// Returns an error if the sizes of `a` and `b` do not match.
pub fn saturating_sub<const C: usize>(
    a: &Image<u8, C>,
    b: &Image<u8, C>,
) -> Result<Image<u8, C>, ImageError> {
    if a.size() != b.size() {
        return Err(ImageError::InvalidImageSize(
            a.width(),
            a.height(),
            b.width(),
            b.height(),
        ));
    }

    let data = a
        .as_slice()
        .iter()
        .zip(b.as_slice().iter())
        .map(|(&x, &y)| x.saturating_sub(y))
        .collect();

    Image::new(a.size(), data)
}
