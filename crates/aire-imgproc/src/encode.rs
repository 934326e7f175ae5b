//! Boundaries to the external byte-stream encoders.
//!
//! The core never produces container formats itself. A host plugs in a
//! lossless (palette) encoder and a lossy encoder through the traits below;
//! the functions in this module validate the encoder parameters before any
//! pixel work and report whatever the encoder fails with as
//! [`ImageError::EncodingFailure`].

use aire_image::{Image, ImageError};

use crate::quantize::{quantize, Palette, QuantizeConfig, Quantized};

/// Highest accepted lossless compression level.
pub const MAX_COMPRESSION: u8 = 9;

/// Compression level used when the caller has no preference.
pub const DEFAULT_COMPRESSION: u8 = 7;

/// Highest accepted lossy quality.
pub const MAX_QUALITY: u8 = 100;

/// Quality used when the caller has no preference.
pub const DEFAULT_QUALITY: u8 = 76;

/// An encoder for palette images, typically PNG.
pub trait LosslessEncoder {
    /// Failure reported by the encoder.
    type Error: std::error::Error;

    /// Encode a quantized raster whose pixels all come from `palette`.
    fn encode(
        &self,
        image: &Image<u8, 4>,
        palette: &Palette,
        compression: u8,
    ) -> Result<Vec<u8>, Self::Error>;
}

/// An encoder with a quality knob, typically JPEG.
pub trait LossyEncoder<const C: usize> {
    /// Failure reported by the encoder.
    type Error: std::error::Error;

    /// Encode `image` at `quality` in `0..=100`.
    fn encode(&self, image: &Image<u8, C>, quality: u8) -> Result<Vec<u8>, Self::Error>;
}

fn check_compression(compression: u8) -> Result<(), ImageError> {
    if compression > MAX_COMPRESSION {
        return Err(ImageError::InvalidParameter(
            "compression",
            format!("expected 0..={MAX_COMPRESSION}, got {compression}"),
        ));
    }
    Ok(())
}

fn check_quality(quality: u8) -> Result<(), ImageError> {
    if quality > MAX_QUALITY {
        return Err(ImageError::InvalidParameter(
            "quality",
            format!("expected 0..={MAX_QUALITY}, got {quality}"),
        ));
    }
    Ok(())
}

/// Hand a palette image to `encoder`.
///
/// # Errors
///
/// Returns [`ImageError::InvalidParameter`] if `compression` exceeds
/// [`MAX_COMPRESSION`] and [`ImageError::EncodingFailure`] if the encoder
/// fails.
pub fn encode_lossless<E: LosslessEncoder>(
    encoder: &E,
    image: &Image<u8, 4>,
    palette: &Palette,
    compression: u8,
) -> Result<Vec<u8>, ImageError> {
    check_compression(compression)?;
    log::debug!(
        "encode_lossless: {} with {} colors at level {compression}",
        image.size(),
        palette.len()
    );
    encoder
        .encode(image, palette, compression)
        .map_err(|e| ImageError::EncodingFailure(e.to_string()))
}

/// Hand `image` unmodified to `encoder`.
///
/// # Errors
///
/// Returns [`ImageError::InvalidParameter`] if `quality` exceeds
/// [`MAX_QUALITY`] and [`ImageError::EncodingFailure`] if the encoder fails.
pub fn encode_lossy<E: LossyEncoder<C>, const C: usize>(
    encoder: &E,
    image: &Image<u8, C>,
    quality: u8,
) -> Result<Vec<u8>, ImageError> {
    check_quality(quality)?;
    log::debug!("encode_lossy: {} at quality {quality}", image.size());
    encoder
        .encode(image, quality)
        .map_err(|e| ImageError::EncodingFailure(e.to_string()))
}

/// Quantize `src` and encode the result with `encoder`.
///
/// Both the quantizer configuration and the compression level are checked
/// before the palette is built. The quantization result is returned next to
/// the encoded bytes.
///
/// # Errors
///
/// Returns an error if either parameter is invalid or the encoder fails.
pub fn quantize_and_encode<E: LosslessEncoder>(
    encoder: &E,
    src: &Image<u8, 4>,
    config: &QuantizeConfig,
    compression: u8,
) -> Result<(Quantized, Vec<u8>), ImageError> {
    check_compression(compression)?;
    config.validate()?;
    let quantized = quantize(src, config)?;
    let bytes = encode_lossless(encoder, &quantized.remapped, &quantized.palette, compression)?;
    Ok((quantized, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    /// Writes the palette index of every pixel after a small header.
    #[derive(Default)]
    struct IndexDump {
        calls: Cell<usize>,
    }

    impl LosslessEncoder for IndexDump {
        type Error = DiskFull;

        fn encode(
            &self,
            image: &Image<u8, 4>,
            palette: &Palette,
            compression: u8,
        ) -> Result<Vec<u8>, DiskFull> {
            self.calls.set(self.calls.get() + 1);
            let mut out = vec![compression, palette.len() as u8];
            for px in image.as_slice().chunks_exact(4) {
                let i = palette
                    .colors()
                    .iter()
                    .position(|c| c[..] == px[..])
                    .ok_or(DiskFull)?;
                out.push(i as u8);
            }
            Ok(out)
        }
    }

    struct Failing;

    impl LossyEncoder<3> for Failing {
        type Error = DiskFull;

        fn encode(&self, _: &Image<u8, 3>, _: u8) -> Result<Vec<u8>, DiskFull> {
            Err(DiskFull)
        }
    }

    struct Raw;

    impl LossyEncoder<3> for Raw {
        type Error = DiskFull;

        fn encode(&self, image: &Image<u8, 3>, quality: u8) -> Result<Vec<u8>, DiskFull> {
            let mut out = vec![quality];
            out.extend_from_slice(image.as_slice());
            Ok(out)
        }
    }

    #[test]
    fn quantized_pixels_come_from_the_palette() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_fn([6, 5].into(), |x, y| {
            [(x * 40) as u8, (y * 50) as u8, 90, 255]
        });
        let encoder = IndexDump::default();
        let (quantized, bytes) =
            quantize_and_encode(&encoder, &img, &QuantizeConfig::new(4), DEFAULT_COMPRESSION)?;
        assert_eq!(bytes[0], DEFAULT_COMPRESSION);
        assert_eq!(bytes[1] as usize, quantized.palette.len());
        assert_eq!(&bytes[2..], quantized.indices.as_slice());
        assert_eq!(encoder.calls.get(), 1);
        Ok(())
    }

    #[test]
    fn parameters_are_checked_before_encoding() -> Result<(), ImageError> {
        let img = Image::<u8, 4>::from_size_val([2, 2].into(), 7)?;
        let encoder = IndexDump::default();
        assert!(matches!(
            quantize_and_encode(&encoder, &img, &QuantizeConfig::new(4), 10),
            Err(ImageError::InvalidParameter("compression", _))
        ));
        assert!(matches!(
            quantize_and_encode(&encoder, &img, &QuantizeConfig::new(0), 5),
            Err(ImageError::InvalidColorCount(0))
        ));
        assert_eq!(encoder.calls.get(), 0);

        let rgb = Image::<u8, 3>::from_size_val([2, 2].into(), 7)?;
        assert!(matches!(
            encode_lossy(&Raw, &rgb, 101),
            Err(ImageError::InvalidParameter("quality", _))
        ));
        Ok(())
    }

    #[test]
    fn lossy_encoder_gets_the_raster_unchanged() -> Result<(), ImageError> {
        let rgb = Image::<u8, 3>::from_fn([3, 2].into(), |x, y| [x as u8, y as u8, 9]);
        let bytes = encode_lossy(&Raw, &rgb, DEFAULT_QUALITY)?;
        assert_eq!(bytes[0], DEFAULT_QUALITY);
        assert_eq!(&bytes[1..], rgb.as_slice());
        Ok(())
    }

    #[test]
    fn encoder_failures_are_wrapped() -> Result<(), ImageError> {
        let rgb = Image::<u8, 3>::from_size_val([2, 2].into(), 7)?;
        let err = encode_lossy(&Failing, &rgb, 50).err();
        assert_eq!(err, Some(ImageError::EncodingFailure("disk full".to_string())));
        assert_eq!(
            err.map(|e| e.kind()),
            Some(aire_image::ErrorKind::EncodingFailure)
        );
        Ok(())
    }
}
