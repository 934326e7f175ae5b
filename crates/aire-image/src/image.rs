use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use aire_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels covered by the size.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Whether one of the dimensions is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

impl From<ImageSize> for [u32; 2] {
    fn from(size: ImageSize) -> Self {
        [size.width as u32, size.height as u32]
    }
}

/// Trait for image data types.
///
/// Send and Sync is required for the rayon row iterators.
pub trait ImageDtype:
    Copy + Default + Into<f32> + num_traits::NumCast + Send + Sync + 'static
{
    /// Largest representable sample, `1.0` for floating point samples.
    const MAX: f32;

    /// Convert a f32 value to the image data type, rounding and saturating.
    fn from_f32(x: f32) -> Self;
}

impl ImageDtype for f32 {
    const MAX: f32 = 1.0;

    fn from_f32(x: f32) -> Self {
        x
    }
}

impl ImageDtype for u8 {
    const MAX: f32 = 255.0;

    fn from_f32(x: f32) -> Self {
        x.round().clamp(0.0, 255.0) as u8
    }
}

impl ImageDtype for u16 {
    const MAX: f32 = 65535.0;

    fn from_f32(x: f32) -> Self {
        x.round().clamp(0.0, 65535.0) as u16
    }
}

/// Represents an image with pixel data.
///
/// Pixels are stored row-major and interleaved, `CHANNELS` samples per pixel.
/// An image never shares its buffer with another image: every transform in the
/// workspace reads one image and produces a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use aire_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 4>::new(
    ///     ImageSize {
    ///         width: 10,
    ///         height: 20,
    ///     },
    ///     vec![0u8; 10 * 20 * 4],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 4);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        if data.len() != size.width * size.height * CHANNELS {
            return Err(ImageError::InvalidChannelShape(
                data.len(),
                size.width * size.height * CHANNELS,
            ));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size and every sample set to `val`.
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        let data = vec![val; size.width * size.height * CHANNELS];
        Image::new(size, data)
    }

    /// Create a new image by evaluating `f(x, y)` for every pixel.
    ///
    /// # Examples
    ///
    /// ```
    /// use aire_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 1>::from_fn([3, 2].into(), |x, y| [(x + y * 3) as u8]);
    /// assert_eq!(image.as_slice(), &[0, 1, 2, 3, 4, 5]);
    /// ```
    pub fn from_fn(size: ImageSize, f: impl Fn(usize, usize) -> [T; CHANNELS]) -> Self
    where
        T: Copy,
    {
        let mut data = Vec::with_capacity(size.width * size.height * CHANNELS);
        for y in 0..size.height {
            for x in 0..size.width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { size, data }
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Number of samples in one row.
    pub fn row_stride(&self) -> usize {
        self.size.width * CHANNELS
    }

    /// The raw interleaved samples.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The raw interleaved samples, mutably.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Get a sample by `[row, col, channel]`, `None` when out of bounds.
    pub fn get(&self, index: [usize; 3]) -> Option<&T> {
        let [y, x, c] = index;
        if y >= self.size.height || x >= self.size.width || c >= CHANNELS {
            return None;
        }
        self.data.get((y * self.size.width + x) * CHANNELS + c)
    }

    /// Get a sample by pixel coordinate and channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate or the channel is out of bounds.
    pub fn get_pixel(&self, x: usize, y: usize, ch: usize) -> Result<&T, ImageError> {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }

        if ch >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, CHANNELS));
        }

        Ok(&self.data[(y * self.size.width + x) * CHANNELS + ch])
    }

    /// The samples of one pixel.
    ///
    /// PRECONDITION: `x < width` and `y < height`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[T] {
        let offset = (y * self.size.width + x) * CHANNELS;
        &self.data[offset..offset + CHANNELS]
    }

    /// The samples of one row.
    ///
    /// PRECONDITION: `y < height`.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        let stride = self.row_stride();
        &self.data[y * stride..(y + 1) * stride]
    }

    /// Cast the pixel data of the image to a different type.
    ///
    /// # Errors
    ///
    /// Returns an error if a sample is not representable in the target type.
    pub fn cast<U>(&self) -> Result<Image<U, CHANNELS>, ImageError>
    where
        U: num_traits::NumCast,
        T: num_traits::NumCast + Copy,
    {
        let casted_data = self
            .data
            .iter()
            .map(|&x| {
                U::from(x).ok_or_else(|| ImageError::CastError(std::any::type_name::<U>().into()))
            })
            .collect::<Result<Vec<U>, ImageError>>()?;

        Image::new(self.size, casted_data)
    }

    /// Get a channel of the image.
    ///
    /// # Errors
    ///
    /// If the channel index is out of bounds, an error is returned.
    pub fn channel(&self, channel: usize) -> Result<Image<T, 1>, ImageError>
    where
        T: Copy,
    {
        if channel >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(channel, CHANNELS));
        }

        let channel_data = self
            .data
            .chunks_exact(CHANNELS)
            .map(|px| px[channel])
            .collect();

        Image::new(self.size, channel_data)
    }
}

#[cfg(test)]
mod tests {
    use crate::image::{Image, ImageDtype, ImageError, ImageSize};

    #[test]
    fn image_size() {
        let image_size = ImageSize {
            width: 10,
            height: 20,
        };
        assert_eq!(image_size.width, 10);
        assert_eq!(image_size.height, 20);
        assert_eq!(image_size.area(), 200);
        assert!(!image_size.is_empty());
    }

    #[test]
    fn image_smoke() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 10,
                height: 20,
            },
            vec![0u8; 10 * 20 * 3],
        )?;
        assert_eq!(image.size().width, 10);
        assert_eq!(image.size().height, 20);
        assert_eq!(image.num_channels(), 3);
        assert_eq!(image.row_stride(), 30);

        Ok(())
    }

    #[test]
    fn image_wrong_length() {
        let res = Image::<u8, 4>::new([2, 2].into(), vec![0u8; 15]);
        assert_eq!(res, Err(ImageError::InvalidChannelShape(15, 16)));
    }

    #[test]
    fn image_cast() -> Result<(), ImageError> {
        let data = vec![0, 1, 2, 3, 4, 5];
        let image_u8 = Image::<u8, 3>::new(
            ImageSize {
                height: 2,
                width: 1,
            },
            data,
        )?;
        assert_eq!(image_u8.get([1, 0, 2]), Some(&5u8));

        let image_i32: Image<i32, 3> = image_u8.cast()?;
        assert_eq!(image_i32.get([1, 0, 2]), Some(&5i32));

        Ok(())
    }

    #[test]
    fn image_cast_out_of_range() -> Result<(), ImageError> {
        let image = Image::<i32, 1>::new([1, 1].into(), vec![300])?;
        assert!(matches!(image.cast::<u8>(), Err(ImageError::CastError(_))));
        Ok(())
    }

    #[test]
    fn image_pixel_access() -> Result<(), ImageError> {
        let image = Image::<u8, 2>::from_fn([3, 2].into(), |x, y| [x as u8, y as u8]);
        assert_eq!(image.pixel(2, 1), &[2, 1]);
        assert_eq!(image.row(1), &[0, 1, 1, 1, 2, 1]);
        assert_eq!(*image.get_pixel(1, 1, 0)?, 1);
        assert_eq!(
            image.get_pixel(3, 0, 0),
            Err(ImageError::PixelIndexOutOfBounds(3, 0, 3, 2))
        );
        assert_eq!(
            image.get_pixel(0, 0, 2),
            Err(ImageError::ChannelIndexOutOfBounds(2, 2))
        );
        Ok(())
    }

    #[test]
    fn dtype_saturates() {
        assert_eq!(u8::from_f32(300.0), 255);
        assert_eq!(u8::from_f32(-2.0), 0);
        assert_eq!(u8::from_f32(127.5), 128);
        assert_eq!(u16::from_f32(70000.0), 65535);
    }
}
