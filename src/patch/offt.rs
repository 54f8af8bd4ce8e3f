// Fixed-width integer encoding for the patch wire format.
//
// Every length field in the container header and every control-record field
// is an 8-byte little-endian sign-magnitude integer: bytes 0-6 plus the low
// seven bits of byte 7 hold the magnitude, the top bit of byte 7 holds the
// sign. Fixed width keeps the control stream trivially seekable (one record
// is always 24 bytes) and the mostly-small values compress well anyway.

/// Encoded width of every integer field, in bytes.
pub const OFFT_SIZE: usize = 8;

/// Encode `x` as 8 little-endian bytes with a sign-magnitude top bit.
///
/// The magnitude of `i64::MIN` does not fit in 63 bits; no field produced
/// by the encoder can reach it (all values are derived from buffer
/// lengths).
///
/// # Example
///
/// ```
/// use bsdelta::patch::offt::{decode_i64, encode_i64};
///
/// assert_eq!(decode_i64(&encode_i64(-300)), -300);
/// ```
pub fn encode_i64(x: i64) -> [u8; OFFT_SIZE] {
    debug_assert!(x != i64::MIN);
    let mut buf = x.unsigned_abs().to_le_bytes();
    if x < 0 {
        buf[7] |= 0x80;
    }
    buf
}

/// Decode 8 bytes produced by [`encode_i64`].
///
/// A sign bit over a zero magnitude decodes to `0`; the encoder never
/// emits that pattern but foreign patch data may contain it.
pub fn decode_i64(buf: &[u8; OFFT_SIZE]) -> i64 {
    let mut raw = *buf;
    let negative = raw[7] & 0x80 != 0;
    raw[7] &= 0x7F;
    let magnitude = u64::from_le_bytes(raw) as i64;
    if negative { -magnitude } else { magnitude }
}

/// Append the wire form of `x` to `out`.
pub fn write_i64(out: &mut Vec<u8>, x: i64) {
    out.extend_from_slice(&encode_i64(x));
}

/// Split one integer off the front of `buf`.
///
/// Returns `None` when fewer than [`OFFT_SIZE`] bytes remain.
pub fn read_i64(buf: &[u8]) -> Option<(i64, &[u8])> {
    let (head, rest) = buf.split_first_chunk::<OFFT_SIZE>()?;
    Some((decode_i64(head), rest))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_representative_values() {
        let values = [
            0i64,
            1,
            -1,
            127,
            -128,
            255,
            256,
            -4321,
            0x0123_4567,
            -0x0123_4567_89AB,
            i64::MAX,
            -i64::MAX,
        ];
        for &v in &values {
            assert_eq!(decode_i64(&encode_i64(v)), v, "value {v}");
        }
    }

    #[test]
    fn little_endian_layout() {
        assert_eq!(encode_i64(1), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode_i64(0x0102), [2, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode_i64(-2), [2, 0, 0, 0, 0, 0, 0, 0x80]);
    }

    #[test]
    fn sign_bit_over_zero_magnitude_decodes_to_zero() {
        let mut buf = [0u8; OFFT_SIZE];
        buf[7] = 0x80;
        assert_eq!(decode_i64(&buf), 0);
    }

    #[test]
    fn max_magnitude_uses_all_63_bits() {
        let enc = encode_i64(i64::MAX);
        assert_eq!(enc[7], 0x7F);
        let enc = encode_i64(-i64::MAX);
        assert_eq!(enc[7], 0xFF);
    }

    #[test]
    fn read_consumes_exactly_eight_bytes() {
        let mut buf = Vec::new();
        write_i64(&mut buf, 42);
        write_i64(&mut buf, -7);
        let (a, rest) = read_i64(&buf).unwrap();
        assert_eq!(a, 42);
        let (b, rest) = read_i64(rest).unwrap();
        assert_eq!(b, -7);
        assert!(rest.is_empty());
    }

    #[test]
    fn read_rejects_short_input() {
        assert!(read_i64(&[0u8; 7]).is_none());
        assert!(read_i64(&[]).is_none());
    }
}
