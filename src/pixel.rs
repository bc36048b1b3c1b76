//! Pixel value and the 64-slot color cache shared by the encoder and decoder.

use crate::Channels;
use crate::constants::COLOR_CACHE_SIZE;

/// An RGBA sample. Three-channel images carry `a == 255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// All channels zero; the initial value of every cache slot.
    pub const ZERO: Pixel = Pixel::new(0, 0, 0, 0);

    /// The "previous pixel" at the start of every pass.
    pub const START: Pixel = Pixel::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a pixel from one interleaved sample group of `channels` bytes.
    pub fn from_samples(samples: &[u8], channels: Channels) -> Self {
        let a = match channels {
            Channels::Rgba => samples[3],
            Channels::Rgb => 255,
        };
        Self::new(samples[0], samples[1], samples[2], a)
    }

    /// Writes the first `dst.len()` channels (3 or 4) into `dst`.
    pub fn write_samples(self, dst: &mut [u8]) {
        let rgba = [self.r, self.g, self.b, self.a];
        let count = dst.len().min(rgba.len());
        dst[..count].copy_from_slice(&rgba[..count]);
    }

    /// Cache slot for this pixel: `(3r + 5g + 7b + 11a) mod 64`.
    pub fn hash_index(self) -> usize {
        let sum = self.r as usize * 3
            + self.g as usize * 5
            + self.b as usize * 7
            + self.a as usize * 11;
        sum % COLOR_CACHE_SIZE
    }
}

impl Default for Pixel {
    fn default() -> Self {
        Self::START
    }
}

/// Direct-mapped table of the most recently stored pixel per hash bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorCache {
    slots: [Pixel; COLOR_CACHE_SIZE],
}

impl ColorCache {
    pub fn new() -> Self {
        Self {
            slots: [Pixel::ZERO; COLOR_CACHE_SIZE],
        }
    }

    pub fn get(&self, index: usize) -> Pixel {
        self.slots[index % COLOR_CACHE_SIZE]
    }

    /// True when the slot `pixel` hashes to already holds it.
    pub fn contains(&self, pixel: Pixel) -> bool {
        self.slots[pixel.hash_index()] == pixel
    }

    /// Stores `pixel` in its slot, overwriting any previous occupant.
    pub fn store(&mut self, pixel: Pixel) -> usize {
        let index = pixel.hash_index();
        self.slots[index] = pixel;
        index
    }

    pub fn slots(&self) -> &[Pixel; COLOR_CACHE_SIZE] {
        &self.slots
    }
}

impl Default for ColorCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_includes_alpha() {
        let opaque = Pixel::new(10, 20, 30, 255);
        let clear = Pixel::new(10, 20, 30, 0);
        assert_eq!(opaque.hash_index(), (30 + 100 + 210 + 2805) % 64);
        assert_eq!(clear.hash_index(), (30 + 100 + 210) % 64);
        assert_ne!(opaque.hash_index(), clear.hash_index());
    }

    #[test]
    fn test_start_pixel_slot() {
        assert_eq!(Pixel::START.hash_index(), 53);
        assert_eq!(Pixel::ZERO.hash_index(), 0);
    }

    #[test]
    fn test_cache_starts_zeroed_and_overwrites() {
        let mut cache = ColorCache::new();
        assert!(cache.slots().iter().all(|p| *p == Pixel::ZERO));
        assert!(cache.contains(Pixel::ZERO));

        let first = Pixel::new(1, 0, 0, 0);
        let index = cache.store(first);
        assert_eq!(index, 3);
        assert!(cache.contains(first));

        // (0,0,0,0) + 64 on red lands in the same bucket as zero
        let collider = Pixel::new(64, 0, 0, 0);
        assert_eq!(collider.hash_index(), 0);
        cache.store(collider);
        assert!(!cache.contains(Pixel::ZERO));
        assert_eq!(cache.get(0), collider);
    }

    #[test]
    fn test_sample_conversion() {
        assert_eq!(
            Pixel::from_samples(&[1, 2, 3], Channels::Rgb),
            Pixel::new(1, 2, 3, 255)
        );
        assert_eq!(
            Pixel::from_samples(&[1, 2, 3, 4], Channels::Rgba),
            Pixel::new(1, 2, 3, 4)
        );

        let mut rgb = [0u8; 3];
        Pixel::new(9, 8, 7, 6).write_samples(&mut rgb);
        assert_eq!(rgb, [9, 8, 7]);
    }
}
