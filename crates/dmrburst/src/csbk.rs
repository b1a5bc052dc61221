//! Control signalling blocks
//!
//! A CSBK is a single 96-bit block, protected by BPTC(196,96)
//! and a masked CRC-CCITT:
//!
//! | Bits  | Field                       |
//! |-------|-----------------------------|
//! | 0     | last block                  |
//! | 1     | protect flag                |
//! | 2–7   | opcode                      |
//! | 8–15  | feature set ID (vendor)     |
//! | 16–79 | opcode-specific data        |
//! | 80–95 | CRC-CCITT, XOR 0xA5A5       |

use std::fmt;

use strum::EnumMessage;

use crate::bits::{span, BitBuffer, BitFieldErr};
use crate::crc::{ccitt16_check, ccitt16_seal, CSBK_CRC_MASK};
use crate::fec::{bptc196x96_decode, BPTC_PAYLOAD_BITS};

const LAST_BLOCK: usize = 0;
const PROTECT_FLAG: usize = 1;
const OPCODE: [usize; 6] = span(2);
const FEATURE_SET_ID: [usize; 8] = span(8);

/// Feature set ID
///
/// Identifies whose opcode table a CSBK or link control
/// opcode belongs to.
///
/// ```
/// use dmrburst::Vendor;
///
/// assert_eq!(Vendor::ConnectPlus, Vendor::from_value(6));
/// assert_eq!("CON+", Vendor::ConnectPlus.as_str());
/// assert_eq!(Vendor::Unknown, Vendor::from_value(0x55));
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
    strum_macros::EnumMessage,
    strum_macros::EnumIter,
)]
pub enum Vendor {
    /// ETSI standard feature set
    #[strum(serialize = "STANDARD", detailed_message = "Standard")]
    Standard,

    /// Flyde Micro
    #[strum(serialize = "FLYDE", detailed_message = "Flyde Micro")]
    FlydeMicro,

    /// PROD-EL SpA
    #[strum(serialize = "PROD-EL", detailed_message = "PROD-EL SpA")]
    ProdElSpa,

    /// Motorola Connect Plus
    #[strum(serialize = "CON+", detailed_message = "Motorola Connect Plus")]
    ConnectPlus,

    /// Radio Data
    #[strum(serialize = "RADIODATA", detailed_message = "Radio Data")]
    RadioData,

    /// Hytera, FID 0x08
    #[strum(serialize = "HYTERA", detailed_message = "Hytera")]
    Hytera8,

    /// Motorola Capacity Plus
    #[strum(serialize = "CAP+", detailed_message = "Motorola Capacity Plus")]
    CapacityPlus,

    /// EMC SpA
    #[strum(serialize = "EMC", detailed_message = "EMC SpA")]
    EmcSpa,

    /// Radio Activity
    #[strum(serialize = "RADIO ACTIVITY", detailed_message = "Radio Activity")]
    RadioActivity,

    /// JVC Kenwood
    #[strum(serialize = "KENWOOD", detailed_message = "JVC Kenwood")]
    JvcKenwood,

    /// Hytera, FID 0x68
    #[strum(serialize = "HYTERA68", detailed_message = "Hytera")]
    Hytera68,

    /// Any other feature set
    #[strum(serialize = "UNKNOWN", detailed_message = "Unknown vendor")]
    Unknown,
}

impl Vendor {
    /// Convert from the eight-bit feature set ID
    pub fn from_value(value: u8) -> Self {
        match value {
            0x00 => Vendor::Standard,
            0x04 => Vendor::FlydeMicro,
            0x05 => Vendor::ProdElSpa,
            0x06 => Vendor::ConnectPlus,
            0x07 => Vendor::RadioData,
            0x08 => Vendor::Hytera8,
            0x10 => Vendor::CapacityPlus,
            0x13 => Vendor::EmcSpa,
            0x1C => Vendor::RadioActivity,
            0x20 => Vendor::JvcKenwood,
            0x68 => Vendor::Hytera68,
            _ => Vendor::Unknown,
        }
    }

    /// Eight-bit feature set ID
    ///
    /// `Unknown` has no wire value and converts to `0xFF`.
    pub fn value(&self) -> u8 {
        match self {
            Vendor::Standard => 0x00,
            Vendor::FlydeMicro => 0x04,
            Vendor::ProdElSpa => 0x05,
            Vendor::ConnectPlus => 0x06,
            Vendor::RadioData => 0x07,
            Vendor::Hytera8 => 0x08,
            Vendor::CapacityPlus => 0x10,
            Vendor::EmcSpa => 0x13,
            Vendor::RadioActivity => 0x1C,
            Vendor::JvcKenwood => 0x20,
            Vendor::Hytera68 => 0x68,
            Vendor::Unknown => 0xFF,
        }
    }

    /// Short label, like "`CON+`"
    pub fn as_str(&self) -> &'static str {
        self.get_serializations()[0]
    }

    /// Human-readable name
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().unwrap_or_else(|| self.as_str())
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_display_str().fmt(f)
    }
}

/// CSBK opcode, qualified by vendor
///
/// The six-bit opcode means different things to different
/// feature sets. Opcodes we do not know are kept as
/// `Unknown` with their vendor and value, so that dispatch
/// misses remain observable.
///
/// ```
/// use dmrburst::{CsbkOpcode, Vendor};
///
/// let op = CsbkOpcode::lookup(Vendor::ConnectPlus, 0x1E);
/// assert_eq!(CsbkOpcode::ConnectPlusOtaAnnouncement, op);
/// assert_eq!("CON+ ANNOUNCE OTA", op.as_display_str());
///
/// let unk = CsbkOpcode::lookup(Vendor::Standard, 0x3F);
/// assert_eq!(CsbkOpcode::Unknown(Vendor::Standard, 0x3F), unk);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumMessage)]
pub enum CsbkOpcode {
    /// Unit-to-unit voice service request
    #[strum(detailed_message = "UNIT-TO-UNIT VOICE SERVICE REQUEST")]
    StandardUnitToUnitVoiceServiceRequest,

    /// Unit-to-unit voice service answer response
    #[strum(detailed_message = "UNIT-TO-UNIT VOICE SERVICE ANSWER RESPONSE")]
    StandardUnitToUnitVoiceServiceAnswerResponse,

    /// Aloha: random access invitation
    #[strum(detailed_message = "ALOHA")]
    StandardAloha,

    /// Private voice channel grant
    #[strum(detailed_message = "PRIVATE VOICE CHANNEL GRANT")]
    StandardPrivateVoiceChannelGrant,

    /// Talkgroup voice channel grant
    #[strum(detailed_message = "TALKGROUP VOICE CHANNEL GRANT")]
    StandardTalkgroupVoiceChannelGrant,

    /// Broadcast talkgroup voice channel grant
    #[strum(detailed_message = "BROADCAST TALKGROUP VOICE CHANNEL GRANT")]
    StandardBroadcastTalkgroupVoiceChannelGrant,

    /// Base station outbound activation
    #[strum(detailed_message = "BS OUTBOUND ACTIVATION")]
    StandardBaseStationOutboundActivation,

    /// Preamble ahead of a data or CSBK transmission
    #[strum(detailed_message = "PREAMBLE")]
    StandardPreamble,

    /// Connect Plus neighbor report
    #[strum(detailed_message = "CON+ NEIGHBOR REPORT")]
    ConnectPlusNeighborReport,

    /// Connect Plus voice channel user
    #[strum(detailed_message = "CON+ VOICE CHANNEL USER")]
    ConnectPlusVoiceChannelUser,

    /// Connect Plus data channel grant
    #[strum(detailed_message = "CON+ DATA CHANNEL GRANT")]
    ConnectPlusDataChannelGrant,

    /// Connect Plus channel terminate
    #[strum(detailed_message = "CON+ TERMINATE CHANNEL GRANT")]
    ConnectPlusTerminateChannelGrant,

    /// Connect Plus over-the-air programming announcement
    #[strum(detailed_message = "CON+ ANNOUNCE OTA")]
    ConnectPlusOtaAnnouncement,

    /// Any other vendor and opcode
    #[strum(detailed_message = "UNKNOWN CSBK")]
    Unknown(Vendor, u8),
}

impl CsbkOpcode {
    /// Classify a six-bit opcode from the given feature set
    pub fn lookup(vendor: Vendor, value: u8) -> Self {
        let value = value & 0x3F;
        match (vendor, value) {
            (Vendor::Standard, 0x04) => CsbkOpcode::StandardUnitToUnitVoiceServiceRequest,
            (Vendor::Standard, 0x05) => CsbkOpcode::StandardUnitToUnitVoiceServiceAnswerResponse,
            (Vendor::Standard, 0x19) => CsbkOpcode::StandardAloha,
            (Vendor::Standard, 0x30) => CsbkOpcode::StandardPrivateVoiceChannelGrant,
            (Vendor::Standard, 0x31) => CsbkOpcode::StandardTalkgroupVoiceChannelGrant,
            (Vendor::Standard, 0x32) => CsbkOpcode::StandardBroadcastTalkgroupVoiceChannelGrant,
            (Vendor::Standard, 0x38) => CsbkOpcode::StandardBaseStationOutboundActivation,
            (Vendor::Standard, 0x3D) => CsbkOpcode::StandardPreamble,
            (Vendor::ConnectPlus, 0x01) => CsbkOpcode::ConnectPlusNeighborReport,
            (Vendor::ConnectPlus, 0x03) => CsbkOpcode::ConnectPlusVoiceChannelUser,
            (Vendor::ConnectPlus, 0x06) => CsbkOpcode::ConnectPlusDataChannelGrant,
            (Vendor::ConnectPlus, 0x0C) => CsbkOpcode::ConnectPlusTerminateChannelGrant,
            (Vendor::ConnectPlus, 0x1E) => CsbkOpcode::ConnectPlusOtaAnnouncement,
            (vendor, value) => CsbkOpcode::Unknown(vendor, value),
        }
    }

    /// Feature set this opcode belongs to
    pub fn vendor(&self) -> Vendor {
        match self {
            CsbkOpcode::StandardUnitToUnitVoiceServiceRequest
            | CsbkOpcode::StandardUnitToUnitVoiceServiceAnswerResponse
            | CsbkOpcode::StandardAloha
            | CsbkOpcode::StandardPrivateVoiceChannelGrant
            | CsbkOpcode::StandardTalkgroupVoiceChannelGrant
            | CsbkOpcode::StandardBroadcastTalkgroupVoiceChannelGrant
            | CsbkOpcode::StandardBaseStationOutboundActivation
            | CsbkOpcode::StandardPreamble => Vendor::Standard,
            CsbkOpcode::ConnectPlusNeighborReport
            | CsbkOpcode::ConnectPlusVoiceChannelUser
            | CsbkOpcode::ConnectPlusDataChannelGrant
            | CsbkOpcode::ConnectPlusTerminateChannelGrant
            | CsbkOpcode::ConnectPlusOtaAnnouncement => Vendor::ConnectPlus,
            CsbkOpcode::Unknown(vendor, _) => *vendor,
        }
    }

    /// Six-bit wire value
    pub fn value(&self) -> u8 {
        match self {
            CsbkOpcode::StandardUnitToUnitVoiceServiceRequest => 0x04,
            CsbkOpcode::StandardUnitToUnitVoiceServiceAnswerResponse => 0x05,
            CsbkOpcode::StandardAloha => 0x19,
            CsbkOpcode::StandardPrivateVoiceChannelGrant => 0x30,
            CsbkOpcode::StandardTalkgroupVoiceChannelGrant => 0x31,
            CsbkOpcode::StandardBroadcastTalkgroupVoiceChannelGrant => 0x32,
            CsbkOpcode::StandardBaseStationOutboundActivation => 0x38,
            CsbkOpcode::StandardPreamble => 0x3D,
            CsbkOpcode::ConnectPlusNeighborReport => 0x01,
            CsbkOpcode::ConnectPlusVoiceChannelUser => 0x03,
            CsbkOpcode::ConnectPlusDataChannelGrant => 0x06,
            CsbkOpcode::ConnectPlusTerminateChannelGrant => 0x0C,
            CsbkOpcode::ConnectPlusOtaAnnouncement => 0x1E,
            CsbkOpcode::Unknown(_, value) => *value,
        }
    }

    /// Human-readable name, like "`CON+ ANNOUNCE OTA`"
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().unwrap_or("UNKNOWN CSBK")
    }
}

impl fmt::Display for CsbkOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsbkOpcode::Unknown(vendor, value) => {
                write!(f, "UNKNOWN CSBK {} OPCODE:{:#04X}", vendor.as_str(), value)
            }
            _ => self.as_display_str().fmt(f),
        }
    }
}

/// A decoded control signalling block
///
/// Holds the 96 payload bits recovered from the BPTC code,
/// whether or not the CRC checked. Opcode-specific fields are
/// read by the message decoders.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Csbk {
    bits: BitBuffer,
    ras: u8,
    corrected: u32,
    valid: bool,
}

impl Csbk {
    /// Decode a CSBK from the 196 info bits of a data burst
    pub fn decode(info: &BitBuffer) -> Result<Self, BitFieldErr> {
        let block = bptc196x96_decode(info)?;
        let crc_ok = ccitt16_check(&block.payload, CSBK_CRC_MASK)?;
        Ok(Self {
            valid: crc_ok && !block.uncorrectable,
            ras: block.reserved,
            corrected: block.corrected,
            bits: block.payload,
        })
    }

    /// Last block flag
    pub fn last_block(&self) -> bool {
        self.bits.get(LAST_BLOCK).unwrap_or(false)
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
    pub fn opcode(&self) -> CsbkOpcode {
        CsbkOpcode::lookup(
            self.vendor(),
            self.bits.get_int(&OPCODE).unwrap_or(0) as u8,
        )
    }

    /// Reverse access sequence bits from the BPTC reserved bits
    pub fn ras(&self) -> u8 {
        self.ras
    }

    /// Number of bits repaired by the BPTC code
    pub fn corrected(&self) -> u32 {
        self.corrected
    }

    /// True if the CRC checked
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The 96 payload bits
    pub fn bits(&self) -> &BitBuffer {
        &self.bits
    }
}

/// Start a 96-bit CSBK payload
///
/// Sets the last-block flag, the opcode, and the feature set
/// ID. Fill in the opcode-specific data, then [`seal()`] the
/// block to compute its CRC.
pub fn new_block(opcode: CsbkOpcode) -> BitBuffer {
    let mut block = BitBuffer::zeroed(BPTC_PAYLOAD_BITS);

    // fixed positions within a 96-bit block
    block.set(LAST_BLOCK, true).expect("CSBK layout");
    block
        .set_int(&OPCODE, opcode.value() as u64)
        .expect("CSBK layout");
    block
        .set_int(&FEATURE_SET_ID, opcode.vendor().value() as u64)
        .expect("CSBK layout");
    block
}

/// Compute and store the masked CRC of a 96-bit CSBK payload
pub fn seal(block: &mut BitBuffer) -> Result<(), BitFieldErr> {
    if block.len() != BPTC_PAYLOAD_BITS {
        return Err(BitFieldErr::WrongLength {
            expected: BPTC_PAYLOAD_BITS,
            actual: block.len(),
        });
    }
    ccitt16_seal(block, CSBK_CRC_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    use strum::IntoEnumIterator;

    use crate::fec::bptc196x96_encode;

    #[test]
    fn test_vendor_values() {
        for vendor in Vendor::iter() {
            if vendor != Vendor::Unknown {
                assert_eq!(vendor, Vendor::from_value(vendor.value()));
            }
        }
        assert_eq!(Vendor::Unknown, Vendor::from_value(0xFF));
        assert_eq!("Motorola Connect Plus", &format!("{}", Vendor::ConnectPlus));
    }

    #[test]
    fn test_opcode_lookup() {
        const KNOWN: &[(Vendor, u8)] = &[
            (Vendor::Standard, 0x04),
            (Vendor::Standard, 0x05),
            (Vendor::Standard, 0x19),
            (Vendor::Standard, 0x30),
            (Vendor::Standard, 0x31),
            (Vendor::Standard, 0x32),
            (Vendor::Standard, 0x38),
            (Vendor::Standard, 0x3D),
            (Vendor::ConnectPlus, 0x01),
            (Vendor::ConnectPlus, 0x03),
            (Vendor::ConnectPlus, 0x06),
            (Vendor::ConnectPlus, 0x0C),
            (Vendor::ConnectPlus, 0x1E),
        ];
        for &(vendor, value) in KNOWN {
            let op = CsbkOpcode::lookup(vendor, value);
            assert!(!matches!(op, CsbkOpcode::Unknown(..)));
            assert_eq!(op.vendor(), vendor);
            assert_eq!(op.value(), value);
        }

        // same value, different vendor
        assert_eq!(
            CsbkOpcode::lookup(Vendor::CapacityPlus, 0x1E),
            CsbkOpcode::Unknown(Vendor::CapacityPlus, 0x1E)
        );
        assert_eq!(
            "UNKNOWN CSBK CAP+ OPCODE:0x1E",
            &format!("{}", CsbkOpcode::lookup(Vendor::CapacityPlus, 0x1E))
        );
        assert_eq!("ALOHA", &format!("{}", CsbkOpcode::StandardAloha));
    }

    #[test]
    fn test_new_block_header() {
        // LB=1 PF=0 opcode 0x1E, then feature ID 0x06
        let block = new_block(CsbkOpcode::ConnectPlusOtaAnnouncement);
        assert_eq!(block.len(), BPTC_PAYLOAD_BITS);
        assert_eq!("9E0600000000000000000000", &block.to_hex_string());

        let block = new_block(CsbkOpcode::StandardAloha);
        assert_eq!("9900", &block.to_hex_string()[0..4]);
    }

    #[test]
    fn test_decode() {
        let mut block = new_block(CsbkOpcode::ConnectPlusOtaAnnouncement);
        block.set_int(&span::<8>(16), 5).unwrap();
        seal(&mut block).unwrap();

        let info = bptc196x96_encode(&block, 0b010).unwrap();
        let csbk = Csbk::decode(&info).unwrap();
        assert!(csbk.is_valid());
        assert!(csbk.last_block());
        assert!(!csbk.protect_flag());
        assert_eq!(csbk.vendor(), Vendor::ConnectPlus);
        assert_eq!(csbk.opcode(), CsbkOpcode::ConnectPlusOtaAnnouncement);
        assert_eq!(csbk.ras(), 0b010);
        assert_eq!(csbk.bits(), &block);

        // a data bit changed after sealing breaks the CRC
        block.set(40, true).unwrap();
        let info = bptc196x96_encode(&block, 0).unwrap();
        let csbk = Csbk::decode(&info).unwrap();
        assert!(!csbk.is_valid());
        assert_eq!(csbk.opcode(), CsbkOpcode::ConnectPlusOtaAnnouncement);

        assert!(seal(&mut BitBuffer::zeroed(80)).is_err());
    }
}
