//! Lossless "Quite OK Image" (QOI) codec with buffered stream I/O.
//!
//! The encoder makes a single forward pass over the pixels, choosing per
//! pixel between a run of the previous pixel, a color-cache hit, a small or
//! luma-weighted delta, and a raw RGB/RGBA literal. The decoder replays the
//! same choices and rebuilds an identical color cache as it goes.
//!
//! ```
//! use qoiexp_rs::{Channels, ImageInfo, decode_from_slice, encode_to_vec};
//!
//! let info = ImageInfo::new(2, 1, Channels::Rgba, 0);
//! let pixels = [255, 0, 0, 255, 255, 0, 0, 255];
//! let encoded = encode_to_vec(&pixels, &info).unwrap();
//! let (decoded_info, decoded) = decode_from_slice(&encoded).unwrap();
//! assert_eq!(decoded_info, info);
//! assert_eq!(decoded, pixels);
//! ```

pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod pixel;
pub mod pnm;
pub mod split_copy;
pub mod stream_reader;
pub mod stream_writer;
pub mod traits;
pub mod wasm;

pub use decoder::{PixelDecoder, QoiDecoder, decode_from_file, decode_from_slice, read_info};
pub use encoder::{PixelEncoder, QoiEncoder, encode_to_file, encode_to_vec};
pub use error::{QoiError, Result};
pub use pixel::{ColorCache, Pixel};
pub use stream_reader::QoiStreamReader;
pub use stream_writer::QoiStreamWriter;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Number of interleaved samples per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Channels {
    Rgb = 3,
    Rgba = 4,
}

impl Channels {
    pub fn count(self) -> usize {
        u8::from(self) as usize
    }
}

/// Header metadata of a QOI image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    /// Passed through untouched; 0 = sRGB with linear alpha, 1 = all linear.
    pub colorspace: u8,
}

impl ImageInfo {
    pub fn new(width: u32, height: u32, channels: Channels, colorspace: u8) -> Self {
        Self {
            width,
            height,
            channels,
            colorspace,
        }
    }

    /// Builds image info from a caller-supplied raw channel count.
    pub fn from_raw(width: u32, height: u32, channels: u8, colorspace: u8) -> Result<Self> {
        let channels =
            Channels::try_from(channels).map_err(|_| QoiError::InvalidArgumentChannels(channels))?;
        Ok(Self::new(width, height, channels, colorspace))
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Size of the interleaved pixel buffer, `width * height * channels`.
    pub fn buffer_size(&self) -> Result<usize> {
        self.pixel_count()
            .checked_mul(self.channels.count() as u64)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or(QoiError::InvalidInput("image does not fit in memory"))
    }

    /// Checks caller-supplied dimensions before anything is encoded.
    pub fn validate(&self, pixel_limit: u64) -> Result<()> {
        if self.width == 0 {
            return Err(QoiError::InvalidArgumentWidth);
        }
        if self.height == 0 {
            return Err(QoiError::InvalidArgumentHeight);
        }
        let pixels = self.pixel_count();
        if pixels > pixel_limit {
            return Err(QoiError::TooManyPixels {
                pixels,
                limit: pixel_limit,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_PIXEL_LIMIT;

    #[test]
    fn test_channels_conversion() {
        assert_eq!(Channels::try_from(3u8).unwrap(), Channels::Rgb);
        assert_eq!(Channels::try_from(4u8).unwrap(), Channels::Rgba);
        assert!(Channels::try_from(1u8).is_err());
        assert_eq!(u8::from(Channels::Rgba), 4);
    }

    #[test]
    fn test_from_raw_rejects_channels() {
        assert!(matches!(
            ImageInfo::from_raw(1, 1, 2, 0),
            Err(QoiError::InvalidArgumentChannels(2))
        ));
    }

    #[test]
    fn test_validate() {
        let ok = ImageInfo::new(3, 2, Channels::Rgb, 0);
        assert!(ok.validate(DEFAULT_PIXEL_LIMIT).is_ok());
        assert_eq!(ok.buffer_size().unwrap(), 18);

        let zero_width = ImageInfo::new(0, 2, Channels::Rgb, 0);
        assert!(matches!(
            zero_width.validate(DEFAULT_PIXEL_LIMIT),
            Err(QoiError::InvalidArgumentWidth)
        ));
        let zero_height = ImageInfo::new(2, 0, Channels::Rgb, 0);
        assert!(matches!(
            zero_height.validate(DEFAULT_PIXEL_LIMIT),
            Err(QoiError::InvalidArgumentHeight)
        ));
        assert!(matches!(
            ok.validate(5),
            Err(QoiError::TooManyPixels { pixels: 6, limit: 5 })
        ));

        let huge = ImageInfo::new(20_000, 20_001, Channels::Rgba, 0);
        assert!(huge.validate(DEFAULT_PIXEL_LIMIT).is_ok());
        let widest = ImageInfo::new(u32::MAX, u32::MAX, Channels::Rgba, 0);
        assert!(widest.validate(DEFAULT_PIXEL_LIMIT).is_ok());
        assert!(widest.buffer_size().is_err());
    }
}
