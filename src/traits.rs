use std::fmt::Debug;

/// Fixed-width integers stored most-significant byte first on the wire.
pub trait BigEndianInt: Copy + Debug + PartialEq {
    const SIZE: usize;

    /// Decodes from the first `SIZE` bytes of `bytes`.
    fn from_be_slice(bytes: &[u8]) -> Self;

    /// Encodes into the first `SIZE` bytes of `out`.
    fn write_be_slice(self, out: &mut [u8]);
}

macro_rules! impl_big_endian_int {
    ($($ty:ty),*) => {
        $(
            impl BigEndianInt for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn from_be_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$ty>::from_be_bytes(raw)
                }

                fn write_be_slice(self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_be_bytes());
                }
            }
        )*
    };
}

impl_big_endian_int!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Largest `SIZE` of any implementor; scratch space for typed reads/writes.
pub(crate) const MAX_INT_SIZE: usize = 8;
