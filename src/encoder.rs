//! QOI encoder.
//!
//! [`PixelEncoder`] holds the per-pass state (color cache, previous pixel,
//! pending run) and turns one pixel at a time into zero or more units.
//! [`QoiEncoder`] wraps it with header/end-marker framing over a
//! [`QoiStreamWriter`].

use crate::constants::{
    DEFAULT_PIXEL_LIMIT, MAX_RUN_LENGTH, QOI_END_MARKER, QOI_HEADER_SIZE, QOI_MAGIC, QOI_OP_DIFF,
    QOI_OP_INDEX, QOI_OP_LUMA, QOI_OP_RGB, QOI_OP_RGBA, QOI_OP_RUN,
};
use crate::error::{QoiError, Result};
use crate::pixel::{ColorCache, Pixel};
use crate::stream_writer::QoiStreamWriter;
use crate::{Channels, ImageInfo};
use log::debug;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One encoded unit. Payloads are stored already biased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Run length minus one, 0..=61.
    Run(u8),
    Index(u8),
    Diff { dr: u8, dg: u8, db: u8 },
    Luma { dg: u8, dr_dg: u8, db_dg: u8 },
    Rgb(Pixel),
    Rgba(Pixel),
}

impl Op {
    pub fn write_to<W: Write>(self, writer: &mut QoiStreamWriter<W>) -> Result<()> {
        match self {
            Op::Run(bias) => writer.write_u8(QOI_OP_RUN | bias),
            Op::Index(index) => writer.write_u8(QOI_OP_INDEX | index),
            Op::Diff { dr, dg, db } => writer.write_u8(QOI_OP_DIFF | dr << 4 | dg << 2 | db),
            Op::Luma { dg, dr_dg, db_dg } => {
                writer.write_bytes(&[QOI_OP_LUMA | dg, dr_dg << 4 | db_dg])
            }
            Op::Rgb(p) => writer.write_bytes(&[QOI_OP_RGB, p.r, p.g, p.b]),
            Op::Rgba(p) => writer.write_bytes(&[QOI_OP_RGBA, p.r, p.g, p.b, p.a]),
        }
    }
}

/// Per-pass encoder state. Create a fresh one for every image.
#[derive(Debug, Clone)]
pub struct PixelEncoder {
    cache: ColorCache,
    previous: Pixel,
    run: u8,
    channels: Channels,
}

impl PixelEncoder {
    /// Literals are RGBA for four-channel images, RGB otherwise.
    pub fn new(channels: Channels) -> Self {
        Self {
            cache: ColorCache::new(),
            previous: Pixel::START,
            run: 0,
            channels,
        }
    }

    pub fn cache(&self) -> &ColorCache {
        &self.cache
    }

    pub fn previous(&self) -> Pixel {
        self.previous
    }

    pub fn pending_run(&self) -> u8 {
        self.run
    }

    /// Encodes `pixel`; `is_last` forces any pending run out.
    pub fn push<W: Write>(
        &mut self,
        pixel: Pixel,
        is_last: bool,
        writer: &mut QoiStreamWriter<W>,
    ) -> Result<()> {
        for op in self.next_ops(pixel, is_last).into_iter().flatten() {
            op.write_to(writer)?;
        }
        Ok(())
    }

    /// Returns the units for `pixel`: an optional run flush, then an
    /// optional unit for the pixel itself.
    pub fn next_ops(&mut self, pixel: Pixel, is_last: bool) -> [Option<Op>; 2] {
        if pixel == self.previous {
            self.run += 1;
            // Run pixels still refresh the cache so it tracks the decoder's.
            self.cache.store(pixel);
            if self.run == MAX_RUN_LENGTH || is_last {
                return [Some(self.take_run()), None];
            }
            return [None, None];
        }

        let flushed = (self.run > 0).then(|| self.take_run());
        let op = self.choose(pixel);
        self.previous = pixel;
        [flushed, Some(op)]
    }

    fn take_run(&mut self) -> Op {
        let op = Op::Run(self.run - 1);
        self.run = 0;
        op
    }

    fn choose(&mut self, pixel: Pixel) -> Op {
        let cached = self.cache.contains(pixel);
        let index = self.cache.store(pixel) as u8;

        let prev = self.previous;
        let alpha_unchanged = pixel.a == prev.a;
        let dr = pixel.r.wrapping_sub(prev.r) as i8;
        let dg = pixel.g.wrapping_sub(prev.g) as i8;
        let db = pixel.b.wrapping_sub(prev.b) as i8;
        let dr_dg = dr as i16 - dg as i16;
        let db_dg = db as i16 - dg as i16;

        let small = |d: i8| (-2..=1).contains(&d);

        match (cached, alpha_unchanged) {
            (true, _) => Op::Index(index),
            (false, true) if small(dr) && small(dg) && small(db) => Op::Diff {
                dr: (dr + 2) as u8,
                dg: (dg + 2) as u8,
                db: (db + 2) as u8,
            },
            (false, true)
                if (-32..=31).contains(&dg)
                    && (-8..=7).contains(&dr_dg)
                    && (-8..=7).contains(&db_dg) =>
            {
                Op::Luma {
                    dg: (dg + 32) as u8,
                    dr_dg: (dr_dg + 8) as u8,
                    db_dg: (db_dg + 8) as u8,
                }
            }
            _ => match self.channels {
                Channels::Rgba => Op::Rgba(pixel),
                Channels::Rgb => Op::Rgb(pixel),
            },
        }
    }
}

pub struct QoiEncoder<W: Write> {
    writer: QoiStreamWriter<W>,
    image_info: Option<ImageInfo>,
    pixel_limit: u64,
}

impl<W: Write> QoiEncoder<W> {
    pub fn new(sink: W) -> Self {
        Self::with_writer(QoiStreamWriter::new(sink))
    }

    pub fn with_writer(writer: QoiStreamWriter<W>) -> Self {
        Self {
            writer,
            image_info: None,
            pixel_limit: DEFAULT_PIXEL_LIMIT,
        }
    }

    pub fn set_image_info(&mut self, image_info: ImageInfo) -> Result<()> {
        image_info.validate(self.pixel_limit)?;
        self.image_info = Some(image_info);
        Ok(())
    }

    pub fn set_pixel_limit(&mut self, pixel_limit: u64) -> Result<()> {
        self.pixel_limit = pixel_limit;
        Ok(())
    }

    /// Encodes `source` (interleaved samples) and returns the bytes written.
    pub fn encode(&mut self, source: &[u8]) -> Result<usize> {
        let info = self
            .image_info
            .ok_or(QoiError::InvalidInput("image info not set"))?;
        info.validate(self.pixel_limit)?;
        let expected = info.buffer_size()?;
        if source.len() != expected {
            return Err(QoiError::InvalidArgumentSize {
                expected,
                actual: source.len(),
            });
        }

        let start = self.writer.len();
        self.write_header(&info)?;

        let channels = info.channels.count();
        let pixel_count = source.len() / channels;
        let mut state = PixelEncoder::new(info.channels);
        for (i, samples) in source.chunks_exact(channels).enumerate() {
            let pixel = Pixel::from_samples(samples, info.channels);
            state.push(pixel, i + 1 == pixel_count, &mut self.writer)?;
        }

        self.writer.write_bytes(&QOI_END_MARKER)?;
        self.writer.flush()?;

        let written = (self.writer.len() - start) as usize;
        debug!(
            "encoded {}x{} ({} channels) into {} bytes",
            info.width, info.height, channels, written
        );
        Ok(written)
    }

    pub fn finish(self) -> Result<W> {
        self.writer.finish()
    }

    fn write_header(&mut self, info: &ImageInfo) -> Result<()> {
        self.writer.write_bytes(&QOI_MAGIC)?;
        self.writer.write_u32(info.width)?;
        self.writer.write_u32(info.height)?;
        self.writer.write_u8(info.channels.into())?;
        self.writer.write_u8(info.colorspace)?;
        Ok(())
    }
}

/// Encodes into a freshly allocated byte vector.
pub fn encode_to_vec(source: &[u8], image_info: &ImageInfo) -> Result<Vec<u8>> {
    // Worst case is a tag byte plus the samples of every pixel.
    let capacity = source
        .len()
        .saturating_add(source.len() / image_info.channels.count())
        .saturating_add(QOI_HEADER_SIZE + QOI_END_MARKER.len());
    let mut encoder = QoiEncoder::new(Vec::with_capacity(capacity));
    encoder.set_image_info(*image_info)?;
    encoder.encode(source)?;
    encoder.finish()
}

/// Encodes into a new file at `path`, syncing it to disk before returning.
pub fn encode_to_file<P: AsRef<Path>>(
    path: P,
    source: &[u8],
    image_info: &ImageInfo,
) -> Result<usize> {
    // Reject bad input before creating the file.
    image_info.validate(DEFAULT_PIXEL_LIMIT)?;
    let file = File::create(path)?;
    let mut encoder = QoiEncoder::new(file);
    encoder.set_image_info(*image_info)?;
    let written = encoder.encode(source)?;
    let file = encoder.finish()?;
    file.sync_all()?;
    Ok(written)
}
