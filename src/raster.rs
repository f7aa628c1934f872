//! Raster target and still-image encoding.
//!
//! A [`RasterTarget`] is a fixed-size RGB8 canvas matching the source's
//! native dimensions. The sampler creates one per run, a
//! [`DecodeSource`](crate::DecodeSource) draws each reached picture into it,
//! and [`RasterTarget::encode_jpeg`] turns it into the stored still.

use std::io::Cursor;

use image::{RgbImage, codecs::jpeg::JpegEncoder};

use crate::error::StillpickError;

/// Largest accepted width or height, in pixels.
pub const MAX_DIMENSION: u32 = 8_192;

/// Largest accepted pixel count (8K UHD).
pub const MAX_PIXELS: u64 = 7_680 * 4_320;

const BYTES_PER_PIXEL: usize = 3;

/// A fixed-size RGB8 drawing surface.
#[derive(Debug, Clone)]
pub struct RasterTarget {
    image: RgbImage,
}

impl RasterTarget {
    /// Create a black raster of `width` x `height` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`StillpickError::RasterTargetInit`] when either dimension is
    /// zero or the raster would exceed [`MAX_DIMENSION`] / [`MAX_PIXELS`].
    pub fn new(width: u32, height: u32) -> Result<Self, StillpickError> {
        let reject = |reason: &str| StillpickError::RasterTargetInit {
            width,
            height,
            reason: reason.to_string(),
        };

        if width == 0 || height == 0 {
            return Err(reject("dimensions must be non-zero"));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(reject("dimension exceeds the supported maximum"));
        }
        if u64::from(width) * u64::from(height) > MAX_PIXELS {
            return Err(reject("pixel count exceeds the supported maximum"));
        }

        // Metadata comes from untrusted files; an allocation failure must
        // fail the run rather than abort the process.
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|error| reject(&error.to_string()))?;
        buffer.resize(len, 0);

        let image = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| reject("buffer does not match the dimensions"))?;
        Ok(Self { image })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The raster as an image.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Mutable access for sources that draw pixel by pixel.
    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    /// Tightly-packed RGB8 pixel data.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    /// Copy rows of RGB8 data that may carry per-row padding.
    ///
    /// `stride` is the distance in bytes between row starts in `data`.
    ///
    /// # Errors
    ///
    /// Returns [`StillpickError::DecodeError`] when `data` is too short
    /// for the raster or `stride` is narrower than a row.
    pub fn fill_from_rows(&mut self, data: &[u8], stride: usize) -> Result<(), StillpickError> {
        let row_bytes = self.width() as usize * BYTES_PER_PIXEL;
        let rows = self.height() as usize;

        if stride < row_bytes {
            return Err(StillpickError::DecodeError(format!(
                "row stride {stride} is narrower than {row_bytes} bytes"
            )));
        }
        let needed = stride * (rows - 1) + row_bytes;
        if data.len() < needed {
            return Err(StillpickError::DecodeError(format!(
                "picture holds {} bytes, expected at least {needed}",
                data.len()
            )));
        }

        let pixels: &mut [u8] = &mut self.image;
        if stride == row_bytes {
            pixels.copy_from_slice(&data[..row_bytes * rows]);
        } else {
            for (row, destination) in pixels.chunks_exact_mut(row_bytes).enumerate() {
                let start = row * stride;
                destination.copy_from_slice(&data[start..start + row_bytes]);
            }
        }
        Ok(())
    }

    /// Encode the current raster as a JPEG still at `quality` (1-100).
    ///
    /// # Errors
    ///
    /// Returns [`StillpickError::EncodeError`] if the encoder rejects the
    /// raster.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, StillpickError> {
        let mut buffer = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        self.image
            .write_with_encoder(encoder)
            .map_err(|error| StillpickError::EncodeError(error.to_string()))?;
        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_dimensions() {
        assert!(RasterTarget::new(0, 10).is_err());
        assert!(RasterTarget::new(10, 0).is_err());
        assert!(RasterTarget::new(MAX_DIMENSION + 1, 1).is_err());
        assert!(RasterTarget::new(1, 1).is_ok());
    }

    #[test]
    fn rejects_rasters_above_the_pixel_budget() {
        let error = RasterTarget::new(MAX_DIMENSION, MAX_DIMENSION).unwrap_err();
        assert!(matches!(
            error,
            StillpickError::RasterTargetInit { width: MAX_DIMENSION, .. }
        ));
        assert!(RasterTarget::new(1_920, 1_080).is_ok());
    }

    #[test]
    fn strips_row_padding() {
        let mut target = RasterTarget::new(2, 2).unwrap();
        // 2 px * 3 bytes = 6 bytes per row, padded to 8.
        let data = [
            1, 2, 3, 4, 5, 6, 0, 0, //
            7, 8, 9, 10, 11, 12, 0, 0,
        ];
        target.fill_from_rows(&data, 8).unwrap();
        assert_eq!(
            target.image().as_raw().as_slice(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]
        );
    }

    #[test]
    fn short_picture_is_an_error() {
        let mut target = RasterTarget::new(4, 4).unwrap();
        assert!(target.fill_from_rows(&[0; 10], 12).is_err());
    }

    #[test]
    fn encoder_failure_is_an_encode_error() {
        // Baseline JPEG cannot describe more than 65535 columns.
        let target = RasterTarget {
            image: RgbImage::new(70_000, 1),
        };
        assert!(matches!(
            target.encode_jpeg(92),
            Err(StillpickError::EncodeError(_))
        ));
    }

    #[test]
    fn encodes_a_jpeg() {
        let target = RasterTarget::new(8, 8).unwrap();
        let bytes = target.encode_jpeg(92).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
