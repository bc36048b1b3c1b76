//! QOI decoder.
//!
//! [`PixelDecoder`] mirrors [`crate::PixelEncoder`]: it consumes units from a
//! [`QoiStreamReader`] one pixel slot at a time and updates the color cache
//! after every pixel, run-filled ones included.

use crate::constants::{
    DEFAULT_PIXEL_LIMIT, QOI_END_MARKER, QOI_MAGIC, QOI_MASK_2, QOI_MASK_6, QOI_OP_DIFF,
    QOI_OP_INDEX, QOI_OP_LUMA, QOI_OP_RGB, QOI_OP_RGBA, QOI_OP_RUN,
};
use crate::error::{QoiError, Result};
use crate::pixel::{ColorCache, Pixel};
use crate::stream_reader::QoiStreamReader;
use crate::{Channels, ImageInfo};
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Per-pass decoder state. Create a fresh one for every image.
#[derive(Debug, Clone)]
pub struct PixelDecoder {
    cache: ColorCache,
    previous: Pixel,
    pending_run: u8,
}

impl PixelDecoder {
    pub fn new() -> Self {
        Self {
            cache: ColorCache::new(),
            previous: Pixel::START,
            pending_run: 0,
        }
    }

    pub fn cache(&self) -> &ColorCache {
        &self.cache
    }

    pub fn previous(&self) -> Pixel {
        self.previous
    }

    /// Pixels still owed by the last RUN unit.
    pub fn pending_run(&self) -> u8 {
        self.pending_run
    }

    /// Produces the next pixel. `remaining` counts the slots left in the
    /// image including this one; a run longer than that is corrupt.
    pub fn next_pixel<R: Read>(
        &mut self,
        reader: &mut QoiStreamReader<R>,
        remaining: u64,
    ) -> Result<Pixel> {
        let pixel = if self.pending_run > 0 {
            self.pending_run -= 1;
            self.previous
        } else {
            self.read_unit(reader, remaining)?
        };
        self.cache.store(pixel);
        self.previous = pixel;
        Ok(pixel)
    }

    fn read_unit<R: Read>(
        &mut self,
        reader: &mut QoiStreamReader<R>,
        remaining: u64,
    ) -> Result<Pixel> {
        let prev = self.previous;
        let tag = reader.read_u8()?;

        let pixel = match tag {
            QOI_OP_RGB => {
                let [r, g, b] = reader.read_array::<3>()?;
                Pixel::new(r, g, b, 255)
            }
            QOI_OP_RGBA => {
                let [r, g, b, a] = reader.read_array::<4>()?;
                Pixel::new(r, g, b, a)
            }
            _ => match tag & QOI_MASK_2 {
                QOI_OP_INDEX => self.cache.get((tag & QOI_MASK_6) as usize),
                QOI_OP_DIFF => {
                    let dr = (tag >> 4 & 0x03).wrapping_sub(2);
                    let dg = (tag >> 2 & 0x03).wrapping_sub(2);
                    let db = (tag & 0x03).wrapping_sub(2);
                    Pixel::new(
                        prev.r.wrapping_add(dr),
                        prev.g.wrapping_add(dg),
                        prev.b.wrapping_add(db),
                        prev.a,
                    )
                }
                QOI_OP_LUMA => {
                    let second = reader.read_u8()?;
                    let dg = (tag & QOI_MASK_6).wrapping_sub(32);
                    let dr_dg = (second >> 4).wrapping_sub(8);
                    let db_dg = (second & 0x0F).wrapping_sub(8);
                    Pixel::new(
                        prev.r.wrapping_add(dg).wrapping_add(dr_dg),
                        prev.g.wrapping_add(dg),
                        prev.b.wrapping_add(dg).wrapping_add(db_dg),
                        prev.a,
                    )
                }
                QOI_OP_RUN => {
                    let run = tag & QOI_MASK_6;
                    if run as u64 >= remaining {
                        return Err(QoiError::CorruptStream("run extends past the last pixel"));
                    }
                    // This slot is the first pixel of the run.
                    self.pending_run = run;
                    prev
                }
                _ => return Err(QoiError::CorruptStream("unrecognized tag byte")),
            },
        };
        Ok(pixel)
    }
}

impl Default for PixelDecoder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct QoiDecoder<R: Read> {
    reader: QoiStreamReader<R>,
    image_info: Option<ImageInfo>,
    pixel_limit: u64,
    verify_end_marker: bool,
}

impl<R: Read> QoiDecoder<R> {
    pub fn new(source: R) -> Self {
        Self::with_reader(QoiStreamReader::new(source))
    }

    pub fn with_reader(reader: QoiStreamReader<R>) -> Self {
        Self {
            reader,
            image_info: None,
            pixel_limit: DEFAULT_PIXEL_LIMIT,
            verify_end_marker: false,
        }
    }

    pub fn set_pixel_limit(&mut self, pixel_limit: u64) -> Result<()> {
        self.pixel_limit = pixel_limit;
        Ok(())
    }

    /// When enabled, `decode` also requires the 8-byte end marker.
    pub fn set_verify_end_marker(&mut self, verify: bool) -> Result<()> {
        self.verify_end_marker = verify;
        Ok(())
    }

    pub fn image_info(&self) -> Option<ImageInfo> {
        self.image_info
    }

    pub fn read_header(&mut self) -> Result<ImageInfo> {
        if let Some(info) = self.image_info {
            return Ok(info);
        }
        let info = self.read_header_fields().map_err(QoiError::into_truncated)?;
        debug!(
            "read header: {}x{}, {} channels, colorspace {}",
            info.width,
            info.height,
            info.channels.count(),
            info.colorspace
        );
        self.image_info = Some(info);
        Ok(info)
    }

    fn read_header_fields(&mut self) -> Result<ImageInfo> {
        let magic: [u8; 4] = self.reader.read_array()?;
        if magic != QOI_MAGIC {
            return Err(QoiError::InvalidFormat);
        }
        let width = self.reader.read_u32()?;
        let height = self.reader.read_u32()?;
        let channels = self.reader.read_u8()?;
        let colorspace = self.reader.read_u8()?;

        let channels = Channels::try_from(channels)
            .map_err(|_| QoiError::InvalidHeader("channel count must be 3 or 4"))?;
        if width == 0 || height == 0 {
            return Err(QoiError::InvalidHeader("zero image dimension"));
        }
        let info = ImageInfo::new(width, height, channels, colorspace);
        if info.pixel_count() > self.pixel_limit {
            return Err(QoiError::InvalidHeader("pixel count exceeds the limit"));
        }
        Ok(info)
    }

    /// Decodes the whole image into `width * height * channels` bytes.
    pub fn decode(&mut self) -> Result<Vec<u8>> {
        let info = self.read_header()?;
        let channels = info.channels.count();
        let mut pixels = vec![0u8; info.buffer_size()?];

        let mut state = PixelDecoder::new();
        let mut remaining = info.pixel_count();
        for slot in pixels.chunks_exact_mut(channels) {
            let pixel = state
                .next_pixel(&mut self.reader, remaining)
                .map_err(QoiError::into_truncated)?;
            pixel.write_samples(slot);
            remaining -= 1;
        }

        if self.verify_end_marker {
            let marker: [u8; 8] = self
                .reader
                .read_array()
                .map_err(QoiError::into_truncated)?;
            if marker != QOI_END_MARKER {
                return Err(QoiError::CorruptStream("missing end marker"));
            }
        }

        debug!(
            "decoded {} pixels from {} bytes",
            info.pixel_count(),
            self.reader.position()
        );
        Ok(pixels)
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

/// Decodes an in-memory QOI image.
pub fn decode_from_slice(data: &[u8]) -> Result<(ImageInfo, Vec<u8>)> {
    let mut decoder = QoiDecoder::new(data);
    let info = decoder.read_header()?;
    let pixels = decoder.decode()?;
    Ok((info, pixels))
}

/// Decodes a QOI file. The file is closed before this returns.
pub fn decode_from_file<P: AsRef<Path>>(path: P) -> Result<(ImageInfo, Vec<u8>)> {
    let mut decoder = QoiDecoder::new(File::open(path)?);
    let info = decoder.read_header()?;
    let pixels = decoder.decode()?;
    Ok((info, pixels))
}

/// Reads only the header of an in-memory QOI image.
pub fn read_info(data: &[u8]) -> Result<ImageInfo> {
    QoiDecoder::new(data).read_header()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::QOI_HEADER_SIZE;
    use crate::encode_to_vec;

    fn header(width: u32, height: u32, channels: u8) -> Vec<u8> {
        let mut bytes = QOI_MAGIC.to_vec();
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.push(channels);
        bytes.push(0);
        bytes
    }

    #[test]
    fn test_decode_handwritten_units() {
        let mut data = header(6, 1, 4);
        data.extend_from_slice(&[QOI_OP_RGBA, 10, 20, 30, 40]);
        data.push(QOI_OP_DIFF | 3 << 4 | 1 << 2 | 2); // +1 -1 0
        data.extend_from_slice(&[QOI_OP_LUMA | 40, 9 << 4 | 7]); // dg=8 dr=9 db=7
        data.push(QOI_OP_RUN | 1);
        data.push(QOI_OP_INDEX | Pixel::new(10, 20, 30, 40).hash_index() as u8);
        data.extend_from_slice(&QOI_END_MARKER);

        let (info, pixels) = decode_from_slice(&data).unwrap();
        assert_eq!(info, ImageInfo::new(6, 1, Channels::Rgba, 0));
        assert_eq!(
            pixels,
            vec![
                10, 20, 30, 40, //
                11, 19, 30, 40, //
                20, 27, 37, 40, //
                20, 27, 37, 40, //
                20, 27, 37, 40, //
                10, 20, 30, 40,
            ]
        );
    }

    #[test]
    fn test_rgb_unit_is_opaque() {
        let mut data = header(1, 1, 3);
        data.extend_from_slice(&[QOI_OP_RGB, 1, 2, 3]);
        let (_, pixels) = decode_from_slice(&data).unwrap();
        assert_eq!(pixels, vec![1, 2, 3]);

        let mut state = PixelDecoder::new();
        let mut reader = QoiStreamReader::new(&[QOI_OP_RGB, 1, 2, 3][..]);
        assert_eq!(state.next_pixel(&mut reader, 1).unwrap(), Pixel::new(1, 2, 3, 255));
    }

    #[test]
    fn test_rgb_unit_after_translucent_rgba() {
        let mut data = header(2, 1, 4);
        data.extend_from_slice(&[QOI_OP_RGBA, 1, 2, 3, 10]);
        data.extend_from_slice(&[QOI_OP_RGB, 4, 5, 6]);
        let (_, pixels) = decode_from_slice(&data).unwrap();
        assert_eq!(pixels, vec![1, 2, 3, 10, 4, 5, 6, 255]);
    }

    #[test]
    fn test_large_header_accepted_by_default() {
        let info = read_info(&header(20_000, 20_001, 4)).unwrap();
        assert_eq!(info.pixel_count(), 400_020_000);
    }

    #[test]
    fn test_header_fidelity() {
        let info = ImageInfo::new(1, 1, Channels::Rgba, 7);
        let encoded = encode_to_vec(&[9, 8, 7, 6], &info).unwrap();
        let decoded = read_info(&encoded).unwrap();
        assert_eq!(decoded.width, 1);
        assert_eq!(decoded.height, 1);
        assert_eq!(decoded.channels, Channels::Rgba);
        assert_eq!(decoded.colorspace, 7);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = header(1, 1, 4);
        data[0] = b'Q';
        assert!(matches!(decode_from_slice(&data), Err(QoiError::InvalidFormat)));
    }

    #[test]
    fn test_bad_header_fields() {
        let data = header(1, 1, 5);
        assert!(matches!(read_info(&data), Err(QoiError::InvalidHeader(_))));
        let data = header(0, 1, 3);
        assert!(matches!(read_info(&data), Err(QoiError::InvalidHeader(_))));

        let data = header(100, 100, 3);
        let mut decoder = QoiDecoder::new(&data[..]);
        decoder.set_pixel_limit(9_999).unwrap();
        assert!(matches!(
            decoder.read_header(),
            Err(QoiError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let data = header(2, 2, 3);
        assert!(matches!(
            read_info(&data[..9]),
            Err(QoiError::TruncatedStream)
        ));
    }

    #[test]
    fn test_truncated_after_one_byte() {
        // The first unit is an RGB literal, so one byte of it is not enough.
        let info = ImageInfo::new(2, 2, Channels::Rgb, 0);
        let encoded = encode_to_vec(&[200, 10, 90, 1, 2, 3, 50, 60, 70, 0, 0, 0], &info).unwrap();
        assert_eq!(encoded[QOI_HEADER_SIZE], QOI_OP_RGB);
        let truncated = &encoded[..QOI_HEADER_SIZE + 1];
        assert!(matches!(
            decode_from_slice(truncated),
            Err(QoiError::TruncatedStream)
        ));
    }

    #[test]
    fn test_run_past_end_is_corrupt() {
        let mut data = header(2, 1, 3);
        data.push(QOI_OP_RUN | 5);
        assert!(matches!(
            decode_from_slice(&data),
            Err(QoiError::CorruptStream(_))
        ));
    }

    #[test]
    fn test_end_marker_verification() {
        let info = ImageInfo::new(1, 2, Channels::Rgb, 0);
        let mut encoded = encode_to_vec(&[1, 2, 3, 1, 2, 3], &info).unwrap();

        let mut decoder = QoiDecoder::new(&encoded[..]);
        decoder.set_verify_end_marker(true).unwrap();
        assert_eq!(decoder.decode().unwrap(), vec![1, 2, 3, 1, 2, 3]);

        let last = encoded.len() - 1;
        encoded[last] = 2;
        let mut decoder = QoiDecoder::new(&encoded[..]);
        decoder.set_verify_end_marker(true).unwrap();
        assert!(matches!(decoder.decode(), Err(QoiError::CorruptStream(_))));

        // Without verification the marker is never read.
        assert!(decode_from_slice(&encoded[..encoded.len() - 8]).is_ok());
    }
}
