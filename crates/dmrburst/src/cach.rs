//! Common Announcement Channel

use std::fmt;

use crate::bits::{BitBuffer, BitFieldErr};
use crate::fec::hamming74_parity;

/// Width of the CACH, in bits
pub const CACH_BITS: usize = 24;

/// Positions of the TACT bits within the CACH
///
/// AT, TC, LCSS(1), LCSS(0), then three Hamming(7,4) parity bits.
const TACT: [usize; 7] = [0, 4, 8, 12, 14, 18, 22];

/// Link control start/stop for the CACH signalling fragment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::FromRepr)]
#[repr(u8)]
pub enum Lcss {
    /// Single fragment
    Single = 0,

    /// First fragment of several
    First = 1,

    /// Last fragment
    Last = 2,

    /// Continuation fragment
    Continuation = 3,
}

/// Common Announcement Channel
///
/// Repeaters interleave a 24-bit CACH ahead of every outbound
/// burst. Its Tx Access Channel Type (TACT) announces whether
/// the *inbound* channel is busy and which timeslot the burst
/// belongs to. The remaining 17 bits carry fragments of short
/// link control, which we keep as raw bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cach {
    tact: u8,
    valid: bool,
    payload: u32,
}

impl Cach {
    /// Decode from the 24 CACH bits
    pub fn from_bits(bits: &BitBuffer) -> Result<Self, BitFieldErr> {
        if bits.len() != CACH_BITS {
            return Err(BitFieldErr::WrongLength {
                expected: CACH_BITS,
                actual: bits.len(),
            });
        }

        let tact = bits.get_int(&TACT)? as u8;
        let payload_idx: Vec<usize> = (0..CACH_BITS).filter(|i| !TACT.contains(i)).collect();
        let payload = bits.get_int(&payload_idx)? as u32;

        Ok(Self {
            tact,
            valid: hamming74_parity(tact >> 3) == tact & 0x7,
            payload,
        })
    }

    /// Decode from the first 24 bits of a burst buffer
    pub fn from_burst(bits: &BitBuffer) -> Result<Self, BitFieldErr> {
        Self::from_bits(&bits.extract(&[0..CACH_BITS])?)
    }

    /// Encode a CACH with valid TACT parity
    ///
    /// `timeslot` is 0 or 1. `payload` supplies the 17
    /// signalling bits.
    pub fn new(access_busy: bool, timeslot: u8, lcss: Lcss, payload: u32) -> Self {
        let data = (access_busy as u8) << 3 | (timeslot & 1) << 2 | lcss as u8;
        Self {
            tact: data << 3 | hamming74_parity(data),
            valid: true,
            payload: payload & 0x1_FFFF,
        }
    }

    /// Pack into 24 CACH bits
    pub fn encode(&self) -> BitBuffer {
        let mut out = BitBuffer::zeroed(CACH_BITS);
        let payload_idx: Vec<usize> = (0..CACH_BITS).filter(|i| !TACT.contains(i)).collect();

        out.set_int(&TACT, self.tact as u64).expect("CACH layout");
        out.set_int(&payload_idx, self.payload as u64)
            .expect("CACH layout");
        out
    }

    /// True if the inbound channel is busy
    pub fn access_busy(&self) -> bool {
        self.tact & 0x40 != 0
    }

    /// Timeslot of the burst which follows (0 or 1)
    pub fn timeslot(&self) -> u8 {
        (self.tact >> 5) & 1
    }

    /// Short link control fragment position
    pub fn lcss(&self) -> Lcss {
        Lcss::from_repr((self.tact >> 3) & 0x3).unwrap_or(Lcss::Single)
    }

    /// True if the TACT parity checks
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The 17 signalling bits, first bit in bit 16
    pub fn payload(&self) -> u32 {
        self.payload
    }
}

impl fmt::Display for Cach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            write!(f, "[CACH-ERROR] ")?;
        }
        write!(
            f,
            "TS:{} {}",
            self.timeslot(),
            if self.access_busy() { "BUSY" } else { "IDLE" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let cach = Cach::new(true, 1, Lcss::Last, 0x1_5A5A);
        assert!(cach.is_valid());
        assert!(cach.access_busy());
        assert_eq!(cach.timeslot(), 1);
        assert_eq!(cach.lcss(), Lcss::Last);
        assert_eq!(cach.payload(), 0x1_5A5A);
        assert_eq!("TS:1 BUSY", &format!("{}", cach));

        let bits = cach.encode();
        assert_eq!(bits.len(), CACH_BITS);
        assert_eq!(Cach::from_bits(&bits).unwrap(), cach);
    }

    #[test]
    fn test_tact_parity() {
        // AT=0 TC=0 LCSS=01: parity over 0001 is 011
        let cach = Cach::new(false, 0, Lcss::First, 0);
        assert_eq!(cach.tact, 0b000_1011);
        assert_eq!("TS:0 IDLE", &format!("{}", cach));

        let mut bits = cach.encode();
        bits.set(TACT[5], !bits.get(TACT[5]).unwrap()).unwrap();
        let bad = Cach::from_bits(&bits).unwrap();
        assert!(!bad.is_valid());
        assert_eq!("[CACH-ERROR] TS:0 IDLE", &format!("{}", bad));
    }

    #[test]
    fn test_encode_positions() {
        // TACT 0001011 lands on bits 12, 18, and 22; the last
        // payload bit is bit 23
        let bits = Cach::new(false, 0, Lcss::First, 1).encode();
        assert_eq!("000823", &bits.to_hex_string());
    }

    #[test]
    fn test_from_burst() {
        let mut burst = BitBuffer::zeroed(288);
        burst
            .splice(0, &Cach::new(false, 1, Lcss::Single, 7).encode())
            .unwrap();
        let cach = Cach::from_burst(&burst).unwrap();
        assert_eq!(cach.timeslot(), 1);
        assert_eq!(cach.payload(), 7);
        assert!(Cach::from_bits(&BitBuffer::zeroed(20)).is_err());
    }
}
