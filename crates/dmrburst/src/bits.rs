//! Bit-field access over corrected burst bits

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use bitvec::prelude::*;
use thiserror::Error;

/// Error accessing a field of a [`BitBuffer`]
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BitFieldErr {
    /// A bit index lies outside of the buffer
    #[error("bit index {index} is out of range for a {len}-bit buffer")]
    OutOfRange { index: usize, len: usize },

    /// The requested field is wider than the integer it is packed into
    #[error("a {width}-bit field does not fit in 64 bits")]
    TooWide { width: usize },

    /// The buffer does not have the length its format requires
    #[error("expected a {expected}-bit buffer, got {actual} bits")]
    WrongLength { expected: usize, actual: usize },
}

/// Error parsing a hexadecimal bit string
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HexParseErr {
    /// Input contains a character that is not a hex digit
    #[error("invalid hex digit '{0}'")]
    InvalidDigit(char),

    /// Requested bit length exceeds the number of digits supplied
    #[error("{digits} hex digits cannot hold {bits} bits")]
    TooShort { digits: usize, bits: usize },
}

/// Contiguous bit-index list
///
/// Builds the list `[start, start + 1, …, start + N - 1]`. Use it to
/// declare protocol field positions as constants:
///
/// ```
/// use dmrburst::span;
///
/// const VERSION: [usize; 4] = span(24);
/// assert_eq!(VERSION, [24, 25, 26, 27]);
/// ```
pub const fn span<const N: usize>(start: usize) -> [usize; N] {
    let mut out = [0usize; N];
    let mut i = 0;
    while i < N {
        out[i] = start + i;
        i += 1;
    }
    out
}

/// A fixed-length buffer of corrected bits
///
/// Bit `0` is the first bit received. Fields are read with
/// [`get_int()`](BitBuffer::get_int), which packs the bits at the
/// given indices MSB-first, in list order.
///
/// ```
/// use dmrburst::BitBuffer;
///
/// let bits = BitBuffer::from_hex("A5").unwrap();
/// assert_eq!(bits.len(), 8);
/// assert_eq!(bits.get_int(&[0, 1, 2, 3]).unwrap(), 0xA);
/// assert_eq!(bits.get_int(&[7, 6, 5, 4]).unwrap(), 0xA);
/// assert!(bits.get_int(&[8]).is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BitBuffer {
    bits: BitVec<u8, Msb0>,
}

impl BitBuffer {
    /// Buffer of `len` zero bits
    pub fn zeroed(len: usize) -> Self {
        Self {
            bits: bitvec![u8, Msb0; 0; len],
        }
    }

    /// Buffer holding every bit of `bytes`, MSB first
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bits: BitVec::from_slice(bytes),
        }
    }

    /// Parse hexadecimal digits, four bits per digit
    pub fn from_hex(hex: &str) -> Result<Self, HexParseErr> {
        let mut bits = BitVec::with_capacity(hex.len() * 4);
        for c in hex.chars() {
            let nibble = c.to_digit(16).ok_or(HexParseErr::InvalidDigit(c))?;
            for shift in (0..4).rev() {
                bits.push((nibble >> shift) & 1 != 0);
            }
        }
        Ok(Self { bits })
    }

    /// Parse hexadecimal digits and keep the first `len` bits
    ///
    /// Useful when the bit length is not a multiple of four.
    pub fn from_hex_truncated(hex: &str, len: usize) -> Result<Self, HexParseErr> {
        let mut out = Self::from_hex(hex)?;
        if out.len() < len {
            return Err(HexParseErr::TooShort {
                digits: hex.len(),
                bits: len,
            });
        }
        out.bits.truncate(len);
        Ok(out)
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True if the buffer holds no bits
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Read one bit
    pub fn get(&self, index: usize) -> Result<bool, BitFieldErr> {
        self.bits
            .get(index)
            .map(|bit| *bit)
            .ok_or(BitFieldErr::OutOfRange {
                index,
                len: self.len(),
            })
    }

    /// Write one bit
    pub fn set(&mut self, index: usize, value: bool) -> Result<(), BitFieldErr> {
        self.check_index(index)?;
        self.bits.set(index, value);
        Ok(())
    }

    /// Read an unsigned field
    ///
    /// The bits at `indices` are packed MSB-first in list order.
    /// Any out-of-range index is an error; the field is never
    /// silently truncated.
    pub fn get_int(&self, indices: &[usize]) -> Result<u64, BitFieldErr> {
        if indices.len() > 64 {
            return Err(BitFieldErr::TooWide {
                width: indices.len(),
            });
        }

        let mut value = 0u64;
        for &index in indices {
            value = (value << 1) | self.get(index)? as u64;
        }
        Ok(value)
    }

    /// Write an unsigned field
    ///
    /// The low `indices.len()` bits of `value` are stored MSB-first
    /// at `indices`. Higher bits of `value` are ignored.
    pub fn set_int(&mut self, indices: &[usize], value: u64) -> Result<(), BitFieldErr> {
        if indices.len() > 64 {
            return Err(BitFieldErr::TooWide {
                width: indices.len(),
            });
        }
        for &index in indices {
            self.check_index(index)?;
        }

        let width = indices.len();
        for (i, &index) in indices.iter().enumerate() {
            self.bits.set(index, (value >> (width - 1 - i)) & 1 != 0);
        }
        Ok(())
    }

    /// Copy out the bits of one or more ranges, in order
    pub fn extract(&self, ranges: &[Range<usize>]) -> Result<BitBuffer, BitFieldErr> {
        let mut bits = BitVec::new();
        for range in ranges {
            if range.end > self.len() {
                return Err(BitFieldErr::OutOfRange {
                    index: range.end.saturating_sub(1),
                    len: self.len(),
                });
            }
            bits.extend_from_bitslice(&self.bits[range.clone()]);
        }
        Ok(BitBuffer { bits })
    }

    /// Overwrite the bits starting at `start` with `src`
    pub fn splice(&mut self, start: usize, src: &BitBuffer) -> Result<(), BitFieldErr> {
        let end = start + src.len();
        if end > self.len() {
            return Err(BitFieldErr::OutOfRange {
                index: end.saturating_sub(1),
                len: self.len(),
            });
        }
        self.bits[start..end].copy_from_bitslice(&src.bits);
        Ok(())
    }

    /// Iterate over the bits, first bit first
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().by_vals()
    }

    /// Pack into bytes, MSB first
    ///
    /// A final partial byte is padded with zeros.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                let mut byte = 0u8;
                for bit in chunk {
                    byte = (byte << 1) | *bit as u8;
                }
                byte << (8 - chunk.len())
            })
            .collect()
    }

    /// Upper-case hexadecimal representation
    ///
    /// A final partial nibble is padded with zeros.
    pub fn to_hex_string(&self) -> String {
        self.bits
            .chunks(4)
            .map(|chunk| {
                let mut nibble = 0u32;
                for bit in chunk {
                    nibble = (nibble << 1) | *bit as u32;
                }
                nibble <<= 4 - chunk.len();
                char::from_digit(nibble, 16)
                    .unwrap_or('0')
                    .to_ascii_uppercase()
            })
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<(), BitFieldErr> {
        if index < self.len() {
            Ok(())
        } else {
            Err(BitFieldErr::OutOfRange {
                index,
                len: self.len(),
            })
        }
    }
}

impl FromIterator<bool> for BitBuffer {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl FromStr for BitBuffer {
    type Err = HexParseErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_hex_string().fmt(f)
    }
}

impl fmt::Debug for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitBuffer({} bits: {})", self.len(), self.to_hex_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // manual MSB-first packing, for comparison
    fn pack(bits: &[bool], indices: &[usize]) -> u64 {
        indices
            .iter()
            .fold(0u64, |acc, &i| (acc << 1) | bits[i] as u64)
    }

    #[test]
    fn test_get_int_matches_manual_packing() {
        let raw: Vec<bool> = (0..288).map(|i| (i * 7 + i / 3) % 5 < 2).collect();
        let buf: BitBuffer = raw.iter().copied().collect();
        assert_eq!(buf.len(), 288);

        const FIELDS: &[&[usize]] = &[
            &[0],
            &[16, 17, 18, 19, 20, 21, 22, 23],
            &[287, 0, 143, 5],
            &[63, 64, 65, 66, 67],
        ];
        for field in FIELDS {
            assert_eq!(buf.get_int(field).unwrap(), pack(&raw, field));
        }

        let wide: [usize; 64] = span(100);
        assert_eq!(buf.get_int(&wide).unwrap(), pack(&raw, &wide));

        // deterministic
        assert_eq!(buf.get_int(&wide), buf.get_int(&wide));
    }

    #[test]
    fn test_get_int_errors() {
        let buf = BitBuffer::zeroed(96);
        assert_eq!(
            buf.get_int(&[95, 96]),
            Err(BitFieldErr::OutOfRange { index: 96, len: 96 })
        );
        let too_wide: [usize; 65] = span(0);
        assert_eq!(
            buf.get_int(&too_wide),
            Err(BitFieldErr::TooWide { width: 65 })
        );
        assert_eq!(buf.get_int(&[]), Ok(0));
    }

    #[test]
    fn test_set_int() {
        let mut buf = BitBuffer::zeroed(16);
        buf.set_int(&span::<8>(4), 0xA5).unwrap();
        assert_eq!(buf.to_hex_string(), "0A50");
        assert_eq!(buf.get_int(&span::<8>(4)).unwrap(), 0xA5);

        // out of range leaves the buffer untouched
        assert!(buf.set_int(&[0, 16], 3).is_err());
        assert_eq!(buf.to_hex_string(), "0A50");
    }

    #[test]
    fn test_hex() {
        let buf = BitBuffer::from_hex("c0ffee").unwrap();
        assert_eq!(buf.len(), 24);
        assert_eq!(buf.to_hex_string(), "C0FFEE");
        assert_eq!(buf.to_bytes(), vec![0xC0, 0xFF, 0xEE]);
        assert_eq!(
            BitBuffer::from_hex("12G"),
            Err(HexParseErr::InvalidDigit('G'))
        );

        let short = BitBuffer::from_hex_truncated("FF", 5).unwrap();
        assert_eq!(short.len(), 5);
        assert_eq!(short.to_hex_string(), "F8");
        assert_eq!(short.to_bytes(), vec![0xF8]);
    }

    #[test]
    fn test_extract_and_splice() {
        let buf = BitBuffer::from_hex("F0F0").unwrap();
        let sub = buf.extract(&[0..4, 8..12]).unwrap();
        assert_eq!(sub.to_hex_string(), "FF");
        assert!(buf.extract(&[10..17]).is_err());

        let mut dst = BitBuffer::zeroed(16);
        dst.splice(4, &sub).unwrap();
        assert_eq!(dst.to_hex_string(), "0FF0");
        assert!(dst.splice(12, &sub).is_err());
    }
}
