/// Copies the longest common prefix of `src` into `dst` and returns its length.
///
/// The buffered reader and writer call this in a loop: copy what the current
/// buffer window allows, refill or flush, then copy the remainder.
pub fn split_copy(dst: &mut [u8], src: &[u8]) -> usize {
    let count = dst.len().min(src.len());
    dst[..count].copy_from_slice(&src[..count]);
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_by_shorter_side() {
        let mut dst = [0u8; 3];
        assert_eq!(split_copy(&mut dst, &[1, 2, 3, 4, 5]), 3);
        assert_eq!(dst, [1, 2, 3]);

        let mut dst = [9u8; 4];
        assert_eq!(split_copy(&mut dst, &[7]), 1);
        assert_eq!(dst, [7, 9, 9, 9]);

        assert_eq!(split_copy(&mut [], &[1, 2]), 0);
    }

    #[test]
    fn test_split_across_two_windows() {
        let value = [0xDE, 0xAD, 0xBE, 0xEF];
        let mut out = [0u8; 4];
        let first = split_copy(&mut out, &value[..1]);
        let second = split_copy(&mut out[first..], &value[first..]);
        assert_eq!((first, second), (1, 3));
        assert_eq!(out, value);
    }
}
