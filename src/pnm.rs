//! Binary Netpbm images (PPM `P6`, PAM `P7`) as a source and sink of raw
//! pixel buffers for the command-line tool.

use crate::error::{QoiError, Result};
use crate::{Channels, ImageInfo};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PnmImage {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    pub pixels: Vec<u8>,
}

impl PnmImage {
    pub fn image_info(&self, colorspace: u8) -> ImageInfo {
        ImageInfo::new(self.width, self.height, self.channels, colorspace)
    }
}

/// Splits whitespace-separated header tokens, skipping `#` comments.
struct HeaderTokens<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HeaderTokens<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn next_token(&mut self) -> Result<&'a str> {
        loop {
            match self.data.get(self.pos) {
                Some(b'#') => {
                    while self.data.get(self.pos).is_some_and(|&b| b != b'\n') {
                        self.pos += 1;
                    }
                }
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(_) => break,
                None => return Err(QoiError::InvalidInput("truncated PNM header")),
            }
        }
        let start = self.pos;
        while self
            .data
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        let data = self.data;
        std::str::from_utf8(&data[start..self.pos])
            .map_err(|_| QoiError::InvalidInput("non-ASCII PNM header"))
    }

    fn next_number(&mut self) -> Result<u32> {
        self.next_token()?
            .parse()
            .map_err(|_| QoiError::InvalidInput("bad number in PNM header"))
    }

    /// Consumes the single whitespace byte that ends a header.
    fn finish(mut self) -> Result<usize> {
        match self.data.get(self.pos) {
            Some(b) if b.is_ascii_whitespace() => {
                self.pos += 1;
                Ok(self.pos)
            }
            _ => Err(QoiError::InvalidInput("truncated PNM header")),
        }
    }
}

pub fn read_pnm(data: &[u8]) -> Result<PnmImage> {
    match data.get(..2) {
        Some(b"P6") => read_ppm(data),
        Some(b"P7") => read_pam(data),
        _ => Err(QoiError::InvalidInput("only binary PPM (P6) and PAM (P7) are supported")),
    }
}

fn read_ppm(data: &[u8]) -> Result<PnmImage> {
    let mut tokens = HeaderTokens::new(data, 2);
    let width = tokens.next_number()?;
    let height = tokens.next_number()?;
    let maxval = tokens.next_number()?;
    if maxval != 255 {
        return Err(QoiError::InvalidInput("only 8-bit PNM images are supported"));
    }
    let offset = tokens.finish()?;
    take_pixels(data, offset, width, height, Channels::Rgb)
}

fn read_pam(data: &[u8]) -> Result<PnmImage> {
    let mut tokens = HeaderTokens::new(data, 2);
    let (mut width, mut height, mut depth, mut maxval) = (None, None, None, None);
    loop {
        match tokens.next_token()? {
            "WIDTH" => width = Some(tokens.next_number()?),
            "HEIGHT" => height = Some(tokens.next_number()?),
            "DEPTH" => depth = Some(tokens.next_number()?),
            "MAXVAL" => maxval = Some(tokens.next_number()?),
            "TUPLTYPE" => {
                tokens.next_token()?;
            }
            "ENDHDR" => break,
            _ => return Err(QoiError::InvalidInput("unknown PAM header field")),
        }
    }
    let offset = tokens.finish()?;

    let (Some(width), Some(height), Some(depth)) = (width, height, depth) else {
        return Err(QoiError::InvalidInput("PAM header is missing a field"));
    };
    if maxval != Some(255) {
        return Err(QoiError::InvalidInput("only 8-bit PNM images are supported"));
    }
    let channels = u8::try_from(depth)
        .ok()
        .and_then(|d| Channels::try_from(d).ok())
        .ok_or(QoiError::InvalidInput("PAM depth must be 3 or 4"))?;
    take_pixels(data, offset, width, height, channels)
}

fn take_pixels(
    data: &[u8],
    offset: usize,
    width: u32,
    height: u32,
    channels: Channels,
) -> Result<PnmImage> {
    let size = ImageInfo::new(width, height, channels, 0).buffer_size()?;
    let pixels = data
        .get(offset..offset.saturating_add(size))
        .ok_or(QoiError::InvalidInput("PNM pixel data is truncated"))?;
    Ok(PnmImage {
        width,
        height,
        channels,
        pixels: pixels.to_vec(),
    })
}

/// Writes `P6` for RGB and `P7` (RGB_ALPHA) for RGBA images.
pub fn write_pnm<W: Write>(out: &mut W, image: &PnmImage) -> Result<()> {
    match image.channels {
        Channels::Rgb => {
            writeln!(out, "P6")?;
            writeln!(out, "{} {}", image.width, image.height)?;
            writeln!(out, "255")?;
        }
        Channels::Rgba => {
            writeln!(out, "P7")?;
            writeln!(out, "WIDTH {}", image.width)?;
            writeln!(out, "HEIGHT {}", image.height)?;
            writeln!(out, "DEPTH 4")?;
            writeln!(out, "MAXVAL 255")?;
            writeln!(out, "TUPLTYPE RGB_ALPHA")?;
            writeln!(out, "ENDHDR")?;
        }
    }
    out.write_all(&image.pixels)?;
    Ok(())
}
