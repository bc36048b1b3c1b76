pub const QOI_MAGIC: [u8; 4] = *b"qoif";

// magic + width + height + channels + colorspace
pub const QOI_HEADER_SIZE: usize = 14;

// Seven zero bytes followed by 0x01. No pixel unit sequence produces it.
pub const QOI_END_MARKER: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];

pub const QOI_OP_INDEX: u8 = 0b0000_0000;
pub const QOI_OP_DIFF: u8 = 0b0100_0000;
pub const QOI_OP_LUMA: u8 = 0b1000_0000;
pub const QOI_OP_RUN: u8 = 0b1100_0000;
pub const QOI_OP_RGB: u8 = 0b1111_1110;
pub const QOI_OP_RGBA: u8 = 0b1111_1111;

pub const QOI_MASK_2: u8 = 0b1100_0000;
pub const QOI_MASK_6: u8 = 0b0011_1111;

pub const COLOR_CACHE_SIZE: usize = 64;
pub const MAX_RUN_LENGTH: u8 = 62;

pub const COLORSPACE_SRGB: u8 = 0;
pub const COLORSPACE_LINEAR: u8 = 1;

// No limit. `set_pixel_limit` opts in to rejecting oversized images.
pub const DEFAULT_PIXEL_LIMIT: u64 = u64::MAX;

pub const DEFAULT_BUFFER_SIZE: usize = 1 << 13;
