//! Motorola Connect Plus CSBKs

use std::fmt;

use arrayvec::ArrayVec;
use strum::EnumMessage;

use crate::bits::{span, BitBuffer, BitFieldErr};
use crate::burst::Burst;
use crate::channel::DmrChannel;
use crate::identifier::{Identifier, IdentifierSet, Role};

use super::MessageKind;

/// Most neighbor sites in one report
pub const MAX_NEIGHBORS: usize = 5;

const NEIGHBOR_SITES: [[usize; 8]; MAX_NEIGHBORS] =
    [span(16), span(24), span(32), span(40), span(48)];

/// Neighbor site report
///
/// Lists the site numbers of up to five adjacent sites.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NeighborReport {
    sites: ArrayVec<u8, MAX_NEIGHBORS>,
}

impl NeighborReport {
    fn decode(bits: &BitBuffer) -> Result<Self, BitFieldErr> {
        let mut sites = ArrayVec::new();
        for field in &NEIGHBOR_SITES {
            let site = bits.get_int(field)? as u8;
            if site != 0 {
                sites.push(site);
            }
        }
        Ok(Self { sites })
    }

    /// Neighbor site numbers, in the order reported
    pub fn sites(&self) -> &[u8] {
        &self.sites
    }
}

impl fmt::Display for NeighborReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SITES:")?;
        if self.sites.is_empty() {
            return write!(f, "NONE");
        }
        for (i, site) in self.sites.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", site)?;
        }
        Ok(())
    }
}

const VCU_SOURCE: [usize; 24] = span(16);
const VCU_GROUP: [usize; 24] = span(40);
const VCU_LSN: [usize; 5] = span(64);

/// Voice channel user
///
/// Sent on the voice channel to announce who is talking to
/// which talkgroup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VoiceChannelUser {
    source: u32,
    group: u32,
    channel: DmrChannel,
}

impl VoiceChannelUser {
    fn decode(bits: &BitBuffer) -> Result<Self, BitFieldErr> {
        Ok(Self {
            source: bits.get_int(&VCU_SOURCE)? as u32,
            group: bits.get_int(&VCU_GROUP)? as u32,
            channel: DmrChannel::from_wire(bits.get_int(&VCU_LSN)?),
        })
    }

    /// Talking radio
    pub fn source(&self) -> u32 {
        self.source
    }

    /// Talkgroup
    pub fn group(&self) -> u32 {
        self.group
    }

    /// Channel in use
    pub fn channel(&self) -> &DmrChannel {
        &self.channel
    }

    pub(crate) fn channel_mut(&mut self) -> &mut DmrChannel {
        &mut self.channel
    }

    pub(crate) fn identifiers(&self, out: &mut IdentifierSet) {
        out.insert(Identifier::radio(self.source, Role::From));
        out.insert(Identifier::talkgroup(self.group, Role::To));
        if let Some(id) = self.channel.identifier(Role::Any) {
            out.insert(id);
        }
    }
}

impl fmt::Display for VoiceChannelUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FM:{} TO:{} CHAN:{}",
            self.source, self.group, self.channel
        )
    }
}

const DCG_TARGET: [usize; 24] = span(16);
const DCG_LSN: [usize; 5] = span(40);

/// Data channel grant
///
/// Directs a radio to a data revert channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DataChannelGrant {
    target: u32,
    channel: DmrChannel,
}

impl DataChannelGrant {
    fn decode(bits: &BitBuffer) -> Result<Self, BitFieldErr> {
        Ok(Self {
            target: bits.get_int(&DCG_TARGET)? as u32,
            channel: DmrChannel::from_wire(bits.get_int(&DCG_LSN)?),
        })
    }

    /// Radio granted the channel
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Granted channel
    pub fn channel(&self) -> &DmrChannel {
        &self.channel
    }

    pub(crate) fn channel_mut(&mut self) -> &mut DmrChannel {
        &mut self.channel
    }

    pub(crate) fn identifiers(&self, out: &mut IdentifierSet) {
        out.insert(Identifier::radio(self.target, Role::To));
        if let Some(id) = self.channel.identifier(Role::Any) {
            out.insert(id);
        }
    }
}

impl fmt::Display for DataChannelGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TO:{} CHAN:{}", self.target, self.channel)
    }
}

const OTA_MESSAGE_TYPE: [usize; 8] = span(16);
const OTA_VERSION: [usize; 16] = span(24);
const OTA_RESERVED: [usize; 23] = span(40);
const OTA_LSN: [usize; 5] = span(63);

/// Kind of update an OTA announcement offers
///
/// Values follow the radio's XCMP message types. Types we do
/// not name are kept as [`Unknown`](OtaMessageType::Unknown)
/// and render as a number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumMessage)]
pub enum OtaMessageType {
    /// Site and channel frequency plan
    #[strum(detailed_message = "NETWORK FREQUENCY FILE")]
    NetworkFrequencyFile,

    /// Any other type
    Unknown(u8),
}

impl OtaMessageType {
    /// Classify an eight-bit message type
    pub fn from_value(value: u8) -> Self {
        match value {
            0x0B => OtaMessageType::NetworkFrequencyFile,
            other => OtaMessageType::Unknown(other),
        }
    }

    /// Eight-bit wire value
    pub fn value(&self) -> u8 {
        match self {
            OtaMessageType::NetworkFrequencyFile => 0x0B,
            OtaMessageType::Unknown(value) => *value,
        }
    }
}

impl fmt::Display for OtaMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get_detailed_message() {
            Some(name) => name.fmt(f),
            None => self.value().fmt(f),
        }
    }
}

/// Over-the-air programming announcement
///
/// Announces that a programming update of the given type and
/// version is available on a data channel. The channel's
/// logical slot number is sent one-based.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OtaAnnouncement {
    message_type: OtaMessageType,
    version: u16,
    reserved: u32,
    channel: DmrChannel,
}

impl OtaAnnouncement {
    fn decode(bits: &BitBuffer) -> Result<Self, BitFieldErr> {
        Ok(Self {
            message_type: OtaMessageType::from_value(bits.get_int(&OTA_MESSAGE_TYPE)? as u8),
            version: bits.get_int(&OTA_VERSION)? as u16,
            reserved: bits.get_int(&OTA_RESERVED)? as u32,
            channel: DmrChannel::from_wire(bits.get_int(&OTA_LSN)?),
        })
    }

    /// Announcement sub-type
    pub fn message_type(&self) -> OtaMessageType {
        self.message_type
    }

    /// Update version
    pub fn version(&self) -> u16 {
        self.version
    }

    /// The 23 reserved bits
    pub fn reserved(&self) -> u32 {
        self.reserved
    }

    /// Channel where the update is available
    pub fn channel(&self) -> &DmrChannel {
        &self.channel
    }

    pub(crate) fn channel_mut(&mut self) -> &mut DmrChannel {
        &mut self.channel
    }

    pub(crate) fn identifiers(&self, out: &mut IdentifierSet) {
        if let Some(id) = self.channel.identifier(Role::Any) {
            out.insert(id);
        }
    }
}

impl fmt::Display for OtaAnnouncement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TYPE:{} VER:{} AVAILABLE ON {}",
            self.message_type, self.version, self.channel
        )
    }
}

pub(crate) fn decode_neighbor_report(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::ConnectPlusNeighborReport(
        NeighborReport::decode(block)?,
    ))
}

pub(crate) fn decode_voice_channel_user(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::ConnectPlusVoiceChannelUser(
        VoiceChannelUser::decode(block)?,
    ))
}

pub(crate) fn decode_data_channel_grant(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::ConnectPlusDataChannelGrant(
        DataChannelGrant::decode(block)?,
    ))
}

pub(crate) fn decode_ota_announcement(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::ConnectPlusOtaAnnouncement(
        OtaAnnouncement::decode(block)?,
    ))
}
