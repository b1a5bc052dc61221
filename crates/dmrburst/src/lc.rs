//! Full link control
//!
//! Voice LC headers and terminators carry a 72-bit link
//! control word protected by Reed-Solomon(12,9). The three
//! parity bytes are XORed with a mask which differs between
//! headers and terminators.

use std::fmt;

use strum::EnumMessage;

use crate::bits::{span, BitBuffer, BitFieldErr};
use crate::csbk::Vendor;
use crate::fec::{bptc196x96_decode, rs129_parity, BPTC_PAYLOAD_BITS};
use crate::slottype::DataType;

const PROTECT_FLAG: usize = 0;
const FLCO: [usize; 6] = span(2);
const FEATURE_SET_ID: [usize; 8] = span(8);
const PARITY: [usize; 24] = span(72);

/// RS(12,9) parity mask for voice LC headers
pub const VOICE_HEADER_RS_MASK: u32 = 0x96_9696;

/// RS(12,9) parity mask for terminators with LC
pub const TERMINATOR_RS_MASK: u32 = 0x99_9999;

/// Full link control opcode, qualified by vendor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumMessage)]
pub enum LcOpcode {
    /// Group voice channel user
    #[strum(detailed_message = "GROUP VOICE CHANNEL USER")]
    StandardGroupVoiceChannelUser,

    /// Unit-to-unit voice channel user
    #[strum(detailed_message = "UNIT-TO-UNIT VOICE CHANNEL USER")]
    StandardUnitToUnitVoiceChannelUser,

    /// Any other vendor and opcode
    #[strum(detailed_message = "UNKNOWN LC")]
    Unknown(Vendor, u8),
}

impl LcOpcode {
    /// Classify a six-bit FLCO from the given feature set
    pub fn lookup(vendor: Vendor, value: u8) -> Self {
        match (vendor, value & 0x3F) {
            (Vendor::Standard, 0x00) => LcOpcode::StandardGroupVoiceChannelUser,
            (Vendor::Standard, 0x03) => LcOpcode::StandardUnitToUnitVoiceChannelUser,
            (vendor, value) => LcOpcode::Unknown(vendor, value),
        }
    }

    /// Feature set this opcode belongs to
    pub fn vendor(&self) -> Vendor {
        match self {
            LcOpcode::Unknown(vendor, _) => *vendor,
            _ => Vendor::Standard,
        }
    }

    /// Six-bit wire value
    pub fn value(&self) -> u8 {
        match self {
            LcOpcode::StandardGroupVoiceChannelUser => 0x00,
            LcOpcode::StandardUnitToUnitVoiceChannelUser => 0x03,
            LcOpcode::Unknown(_, value) => *value,
        }
    }

    /// Human-readable name
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().unwrap_or("UNKNOWN LC")
    }
}

impl fmt::Display for LcOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LcOpcode::Unknown(vendor, value) => {
                write!(f, "UNKNOWN LC {} FLCO:{:#04X}", vendor.as_str(), value)
            }
            _ => self.as_display_str().fmt(f),
        }
    }
}

// Parity mask for the burst type, if it carries full LC
fn rs_mask(data_type: DataType) -> Option<u32> {
    match data_type {
        DataType::VoiceLcHeader => Some(VOICE_HEADER_RS_MASK),
        DataType::TerminatorWithLc => Some(TERMINATOR_RS_MASK),
        _ => None,
    }
}

// RS(12,9) parity over the first 72 bits, as a 24-bit integer
fn parity_word(block: &BitBuffer) -> u32 {
    let bytes = block.to_bytes();
    let mut data = [0u8; 9];
    for (dst, src) in data.iter_mut().zip(bytes.iter()) {
        *dst = *src;
    }
    let parity = rs129_parity(&data);
    u32::from_be_bytes([0, parity[0], parity[1], parity[2]])
}

/// A decoded full link control word
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FullLc {
    bits: BitBuffer,
    ras: u8,
    valid: bool,
}

impl FullLc {
    /// Decode full LC from the 196 info bits of a voice header
    /// or terminator
    ///
    /// Other data types have no RS mask, and their LC is
    /// reported invalid.
    pub fn decode(info: &BitBuffer, data_type: DataType) -> Result<Self, BitFieldErr> {
        let block = bptc196x96_decode(info)?;
        let received = block.payload.get_int(&PARITY)? as u32;
        let valid = match rs_mask(data_type) {
            Some(mask) => parity_word(&block.payload) ^ mask == received,
            None => false,
        };

        Ok(Self {
            bits: block.payload,
            ras: block.reserved,
            valid: valid && !block.uncorrectable,
        })
    }

    /// Protect flag
    pub fn protect_flag(&self) -> bool {
        self.bits.get(PROTECT_FLAG).unwrap_or(false)
    }

    /// Feature set of the opcode
    pub fn vendor(&self) -> Vendor {
        Vendor::from_value(self.bits.get_int(&FEATURE_SET_ID).unwrap_or(0xFF) as u8)
    }

    /// Opcode, qualified by vendor
    pub fn opcode(&self) -> LcOpcode {
        LcOpcode::lookup(self.vendor(), self.bits.get_int(&FLCO).unwrap_or(0) as u8)
    }

    /// Reverse access sequence bits from the BPTC reserved bits
    pub fn ras(&self) -> u8 {
        self.ras
    }

    /// True if the Reed-Solomon parity checked
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The 96 payload bits
    pub fn bits(&self) -> &BitBuffer {
        &self.bits
    }
}

/// Start a 96-bit full LC payload with the given opcode
pub fn new_block(opcode: LcOpcode) -> BitBuffer {
    let mut block = BitBuffer::zeroed(BPTC_PAYLOAD_BITS);

    // fixed positions within a 96-bit block
    block
        .set_int(&FLCO, opcode.value() as u64)
        .expect("LC layout");
    block
        .set_int(&FEATURE_SET_ID, opcode.vendor().value() as u64)
        .expect("LC layout");
    block
}

/// Compute and store the masked RS(12,9) parity
///
/// `data_type` selects the mask and must be a voice LC header
/// or a terminator with LC.
pub fn seal(block: &mut BitBuffer, data_type: DataType) -> Result<(), BitFieldErr> {
    if block.len() != BPTC_PAYLOAD_BITS {
        return Err(BitFieldErr::WrongLength {
            expected: BPTC_PAYLOAD_BITS,
            actual: block.len(),
        });
    }
    let mask = rs_mask(data_type).unwrap_or(0);
    block.set_int(&PARITY, (parity_word(block) ^ mask) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fec::bptc196x96_encode;

    #[test]
    fn test_opcode() {
        assert_eq!(
            LcOpcode::StandardGroupVoiceChannelUser,
            LcOpcode::lookup(Vendor::Standard, 0)
        );
        assert_eq!(
            LcOpcode::Unknown(Vendor::ConnectPlus, 0),
            LcOpcode::lookup(Vendor::ConnectPlus, 0)
        );
        assert_eq!(
            "UNIT-TO-UNIT VOICE CHANNEL USER",
            &format!("{}", LcOpcode::StandardUnitToUnitVoiceChannelUser)
        );
        assert_eq!(
            "UNKNOWN LC STANDARD FLCO:0x3F",
            &format!("{}", LcOpcode::lookup(Vendor::Standard, 0x3F))
        );
    }

    #[test]
    fn test_new_block_header() {
        // PF=0, reserved, FLCO 0x03, then feature set 0x00
        let block = new_block(LcOpcode::StandardUnitToUnitVoiceChannelUser);
        assert_eq!(block.len(), BPTC_PAYLOAD_BITS);
        assert_eq!("030000000000000000000000", &block.to_hex_string());
    }

    #[test]
    fn test_header_and_terminator_masks() {
        let mut block = new_block(LcOpcode::StandardGroupVoiceChannelUser);
        block.set_int(&span::<24>(24), 1234).unwrap();
        block.set_int(&span::<24>(48), 3_101_234).unwrap();
        seal(&mut block, DataType::VoiceLcHeader).unwrap();

        let info = bptc196x96_encode(&block, 0).unwrap();
        let lc = FullLc::decode(&info, DataType::VoiceLcHeader).unwrap();
        assert!(lc.is_valid());
        assert_eq!(lc.opcode(), LcOpcode::StandardGroupVoiceChannelUser);
        assert_eq!(lc.vendor(), Vendor::Standard);
        assert!(!lc.protect_flag());

        // header parity is wrong for a terminator
        let lc = FullLc::decode(&info, DataType::TerminatorWithLc).unwrap();
        assert!(!lc.is_valid());

        seal(&mut block, DataType::TerminatorWithLc).unwrap();
        let info = bptc196x96_encode(&block, 0).unwrap();
        assert!(FullLc::decode(&info, DataType::TerminatorWithLc)
            .unwrap()
            .is_valid());
        assert!(!FullLc::decode(&info, DataType::Csbk).unwrap().is_valid());
    }

    #[test]
    fn test_data_error_detected() {
        let mut block = new_block(LcOpcode::StandardUnitToUnitVoiceChannelUser);
        block.set_int(&span::<24>(48), 0xABCDEF).unwrap();
        seal(&mut block, DataType::VoiceLcHeader).unwrap();
        block.set(60, !block.get(60).unwrap()).unwrap();

        let info = bptc196x96_encode(&block, 0).unwrap();
        assert!(!FullLc::decode(&info, DataType::VoiceLcHeader)
            .unwrap()
            .is_valid());
    }
}
