//! Slot type descriptor

use std::fmt;

use crate::bits::BitFieldErr;
use crate::burst::Burst;
use crate::fec::{golay2087_decode, golay2087_encode};

/// Payload class of a data burst
///
/// ```
/// use dmrburst::DataType;
///
/// assert_eq!(DataType::Csbk, DataType::from_value(3));
/// assert_eq!("CSBK", DataType::Csbk.as_str());
/// assert_eq!(DataType::Reserved, DataType::from_value(14));
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum_macros::FromRepr,
    strum_macros::IntoStaticStr,
    strum_macros::EnumIter,
)]
#[repr(u8)]
pub enum DataType {
    /// Privacy indicator header
    #[strum(serialize = "PI HEADER")]
    PiHeader = 0,

    /// Voice link control header
    #[strum(serialize = "VOICE HEADER")]
    VoiceLcHeader = 1,

    /// Terminator with link control
    #[strum(serialize = "TERMINATOR")]
    TerminatorWithLc = 2,

    /// Control signalling block
    #[strum(serialize = "CSBK")]
    Csbk = 3,

    /// Multi-block control header
    #[strum(serialize = "MBC HEADER")]
    MbcHeader = 4,

    /// Multi-block control continuation
    #[strum(serialize = "MBC CONTINUATION")]
    MbcContinuation = 5,

    /// Data header
    #[strum(serialize = "DATA HEADER")]
    DataHeader = 6,

    /// Rate ½ data
    #[strum(serialize = "RATE 1/2 DATA")]
    Rate12 = 7,

    /// Rate ¾ data
    #[strum(serialize = "RATE 3/4 DATA")]
    Rate34 = 8,

    /// Idle
    #[strum(serialize = "IDLE")]
    Idle = 9,

    /// Rate 1 data
    #[strum(serialize = "RATE 1 DATA")]
    Rate1 = 10,

    /// Unified single block data
    #[strum(serialize = "USBD")]
    UnifiedSingleBlock = 11,

    /// Any value from 12 to 15
    #[strum(serialize = "RESERVED")]
    Reserved = 15,
}

impl DataType {
    /// Convert from the four-bit wire value
    pub fn from_value(value: u8) -> Self {
        match Self::from_repr(value & 0xF) {
            Some(DataType::Reserved) | None => DataType::Reserved,
            Some(dt) => dt,
        }
    }

    /// Human-readable name
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

/// Color code and data type of a data burst
///
/// The slot type is split around the sync field: ten bits on
/// either side. It carries a four-bit color code, a four-bit
/// [`DataType`], and twelve bits of Golay(20,8) parity, which
/// repairs up to three bit errors.
///
/// Decoding never fails. If the Golay code cannot be
/// decoded, the descriptor is still produced with
/// `is_valid() == false`, and its fields are read directly
/// from the uncorrected bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotType {
    color_code: u8,
    data_type_value: u8,
    valid: bool,
    corrected: u32,
}

impl SlotType {
    /// Slot type with the given fields
    pub fn new(color_code: u8, data_type: DataType) -> Self {
        Self {
            color_code: color_code & 0xF,
            data_type_value: data_type as u8,
            valid: true,
            corrected: 0,
        }
    }

    /// Decode a 20-bit slot type codeword
    pub fn from_bits(word: u32) -> Self {
        match golay2087_decode(word) {
            Some((data, corrected)) => Self {
                color_code: data >> 4,
                data_type_value: data & 0xF,
                valid: true,
                corrected,
            },
            None => {
                let data = ((word >> 12) & 0xFF) as u8;
                Self {
                    color_code: data >> 4,
                    data_type_value: data & 0xF,
                    valid: false,
                    corrected: 0,
                }
            }
        }
    }

    /// Decode the slot type of a data burst
    pub fn from_burst(burst: &Burst) -> Result<Self, BitFieldErr> {
        Ok(Self::from_bits(burst.slot_type_word()?))
    }

    /// Encode as a 20-bit Golay(20,8) codeword
    pub fn encode(&self) -> u32 {
        golay2087_encode(self.color_code << 4 | self.data_type_value)
    }

    /// Color code (0 – 15)
    pub fn color_code(&self) -> u8 {
        self.color_code
    }

    /// Payload class
    pub fn data_type(&self) -> DataType {
        DataType::from_value(self.data_type_value)
    }

    /// True if the Golay code decoded
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of bit errors repaired
    pub fn corrected(&self) -> u32 {
        self.corrected
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CC:{} {}", self.color_code, self.data_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use strum::IntoEnumIterator;

    #[test]
    fn test_data_type_values() {
        for dt in DataType::iter() {
            assert_eq!(dt, DataType::from_value(dt as u8));
        }
        for value in 12..16 {
            assert_eq!(DataType::Reserved, DataType::from_value(value));
        }
        assert_eq!("IDLE", &format!("{}", DataType::Idle));
    }

    #[test]
    fn test_known_codewords() {
        // CC 0, voice LC header
        assert_eq!(SlotType::new(0, DataType::VoiceLcHeader).encode(), 0x0_18EB);
        assert_eq!(SlotType::new(0, DataType::TerminatorWithLc).encode(), 0x0_293E);
    }

    #[test]
    fn test_decode_with_errors() {
        let st = SlotType::new(7, DataType::Csbk);
        let word = st.encode();

        let clean = SlotType::from_bits(word);
        assert!(clean.is_valid());
        assert_eq!(clean.color_code(), 7);
        assert_eq!(clean.data_type(), DataType::Csbk);
        assert_eq!(clean.corrected(), 0);
        assert_eq!("CC:7 CSBK", &format!("{}", clean));

        let repaired = SlotType::from_bits(word ^ 0x4_0101);
        assert!(repaired.is_valid());
        assert_eq!(repaired.color_code(), 7);
        assert_eq!(repaired.data_type(), DataType::Csbk);
        assert_eq!(repaired.corrected(), 3);
    }

    #[test]
    fn test_decode_failure_is_best_effort() {
        // four errors, all in parity: best-effort fields are intact
        let word = SlotType::new(2, DataType::Idle).encode() ^ 0x0_0F00;
        let st = SlotType::from_bits(word);
        assert!(!st.is_valid());
        assert_eq!(st.color_code(), 2);
        assert_eq!(st.data_type(), DataType::Idle);
        assert_eq!(st.corrected(), 0);

        // four bits away from the all-zero codeword
        assert!(!SlotType::from_bits(0xF).is_valid());
    }
}
