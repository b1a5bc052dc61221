//! Decoded DMR messages

mod connectplus;
mod linkcontrol;
mod standard;
mod voice;

pub use connectplus::{
    DataChannelGrant, NeighborReport, OtaAnnouncement, OtaMessageType, VoiceChannelUser,
    MAX_NEIGHBORS,
};
pub use linkcontrol::LinkControlChannelUser;
pub use standard::{
    Aloha, BsOutboundActivation, Preamble, ServiceOptions, UnitToUnitVoiceServiceRequest,
    VoiceChannelGrant,
};
pub use voice::{VoiceBurst, VoiceFrame};

pub(crate) use connectplus::{
    decode_data_channel_grant, decode_neighbor_report, decode_ota_announcement,
    decode_voice_channel_user,
};
pub(crate) use linkcontrol::{
    decode_group_voice_channel_user, decode_unit_to_unit_voice_channel_user,
};
pub(crate) use standard::{
    decode_aloha, decode_broadcast_talkgroup_voice_channel_grant, decode_bs_outbound_activation,
    decode_preamble, decode_private_voice_channel_grant, decode_talkgroup_voice_channel_grant,
    decode_unit_to_unit_voice_service_request,
};
pub(crate) use voice::decode_voice;

use std::fmt;
use std::sync::OnceLock;

use crate::bits::BitBuffer;
use crate::burst::Burst;
use crate::cach::Cach;
use crate::channel::{DmrChannel, PhysicalChannel, TimeslotFrequencyTable};
use crate::csbk::Csbk;
use crate::identifier::IdentifierSet;
use crate::lc::FullLc;
use crate::slottype::SlotType;
use crate::sync::SyncPattern;

/// The 96-bit payload block of a data burst
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PayloadBlock {
    /// Control signalling block
    Csbk(Csbk),

    /// Full link control
    Lc(FullLc),
}

impl PayloadBlock {
    /// The 96 payload bits
    pub fn bits(&self) -> &BitBuffer {
        match self {
            PayloadBlock::Csbk(csbk) => csbk.bits(),
            PayloadBlock::Lc(lc) => lc.bits(),
        }
    }

    /// Reverse access sequence bits
    pub fn ras(&self) -> u8 {
        match self {
            PayloadBlock::Csbk(csbk) => csbk.ras(),
            PayloadBlock::Lc(lc) => lc.ras(),
        }
    }

    /// True if the block's CRC or parity checked
    pub fn is_valid(&self) -> bool {
        match self {
            PayloadBlock::Csbk(csbk) => csbk.is_valid(),
            PayloadBlock::Lc(lc) => lc.is_valid(),
        }
    }
}

/// What a message says
///
/// Bursts which we cannot classify, or which fail validation
/// badly enough that their contents cannot be trusted, are
/// `Unknown`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Unrecognized or undecodable burst
    Unknown,

    /// Idle burst
    Idle,

    /// Voice superframe burst
    Voice(VoiceBurst),

    /// Connect Plus neighbor report CSBK
    ConnectPlusNeighborReport(NeighborReport),

    /// Connect Plus voice channel user CSBK
    ConnectPlusVoiceChannelUser(VoiceChannelUser),

    /// Connect Plus data channel grant CSBK
    ConnectPlusDataChannelGrant(DataChannelGrant),

    /// Connect Plus over-the-air programming announcement CSBK
    ConnectPlusOtaAnnouncement(OtaAnnouncement),

    /// Aloha CSBK
    Aloha(Aloha),

    /// Preamble CSBK
    Preamble(Preamble),

    /// Base station outbound activation CSBK
    BsOutboundActivation(BsOutboundActivation),

    /// Unit-to-unit voice service request CSBK
    UnitToUnitVoiceServiceRequest(UnitToUnitVoiceServiceRequest),

    /// Private voice channel grant CSBK
    PrivateVoiceChannelGrant(VoiceChannelGrant),

    /// Talkgroup voice channel grant CSBK
    TalkgroupVoiceChannelGrant(VoiceChannelGrant),

    /// Broadcast talkgroup voice channel grant CSBK
    BroadcastTalkgroupVoiceChannelGrant(VoiceChannelGrant),

    /// Group voice channel user link control
    GroupVoiceChannelUser(LinkControlChannelUser),

    /// Unit-to-unit voice channel user link control
    UnitToUnitVoiceChannelUser(LinkControlChannelUser),
}

impl MessageKind {
    /// Channel this message refers to, if any
    pub fn channel(&self) -> Option<&DmrChannel> {
        match self {
            MessageKind::ConnectPlusVoiceChannelUser(m) => Some(m.channel()),
            MessageKind::ConnectPlusDataChannelGrant(m) => Some(m.channel()),
            MessageKind::ConnectPlusOtaAnnouncement(m) => Some(m.channel()),
            MessageKind::PrivateVoiceChannelGrant(m)
            | MessageKind::TalkgroupVoiceChannelGrant(m)
            | MessageKind::BroadcastTalkgroupVoiceChannelGrant(m) => Some(m.channel()),
            _ => None,
        }
    }

    fn channel_mut(&mut self) -> Option<&mut DmrChannel> {
        match self {
            MessageKind::ConnectPlusVoiceChannelUser(m) => Some(m.channel_mut()),
            MessageKind::ConnectPlusDataChannelGrant(m) => Some(m.channel_mut()),
            MessageKind::ConnectPlusOtaAnnouncement(m) => Some(m.channel_mut()),
            MessageKind::PrivateVoiceChannelGrant(m)
            | MessageKind::TalkgroupVoiceChannelGrant(m)
            | MessageKind::BroadcastTalkgroupVoiceChannelGrant(m) => Some(m.channel_mut()),
            _ => None,
        }
    }

    // identifiers, in order: from, to, channel
    fn collect_identifiers(&self, out: &mut IdentifierSet) {
        match self {
            MessageKind::Unknown
            | MessageKind::Idle
            | MessageKind::Voice(_)
            | MessageKind::ConnectPlusNeighborReport(_) => {}
            MessageKind::ConnectPlusVoiceChannelUser(m) => m.identifiers(out),
            MessageKind::ConnectPlusDataChannelGrant(m) => m.identifiers(out),
            MessageKind::ConnectPlusOtaAnnouncement(m) => m.identifiers(out),
            MessageKind::Aloha(m) => m.identifiers(out),
            MessageKind::Preamble(m) => m.identifiers(out),
            MessageKind::BsOutboundActivation(m) => m.identifiers(out),
            MessageKind::UnitToUnitVoiceServiceRequest(m) => m.identifiers(out),
            MessageKind::PrivateVoiceChannelGrant(m)
            | MessageKind::TalkgroupVoiceChannelGrant(m)
            | MessageKind::BroadcastTalkgroupVoiceChannelGrant(m) => m.identifiers(out),
            MessageKind::GroupVoiceChannelUser(m) | MessageKind::UnitToUnitVoiceChannelUser(m) => {
                m.identifiers(out)
            }
        }
    }

    // opcode-specific fields, for display
    fn body(&self) -> Option<&dyn fmt::Display> {
        match self {
            MessageKind::Unknown | MessageKind::Idle => None,
            MessageKind::Voice(m) => Some(m),
            MessageKind::ConnectPlusNeighborReport(m) => Some(m),
            MessageKind::ConnectPlusVoiceChannelUser(m) => Some(m),
            MessageKind::ConnectPlusDataChannelGrant(m) => Some(m),
            MessageKind::ConnectPlusOtaAnnouncement(m) => Some(m),
            MessageKind::Aloha(m) => Some(m),
            MessageKind::Preamble(m) => Some(m),
            MessageKind::BsOutboundActivation(m) => Some(m),
            MessageKind::UnitToUnitVoiceServiceRequest(m) => Some(m),
            MessageKind::PrivateVoiceChannelGrant(m)
            | MessageKind::TalkgroupVoiceChannelGrant(m)
            | MessageKind::BroadcastTalkgroupVoiceChannelGrant(m) => Some(m),
            MessageKind::GroupVoiceChannelUser(m) | MessageKind::UnitToUnitVoiceChannelUser(m) => {
                Some(m)
            }
        }
    }
}

/// A classified DMR burst
///
/// Every burst handed to the decoder becomes a `Message`, even
/// if it fails validation. Check [`is_valid()`](Message::is_valid)
/// before trusting its contents. The originating [`Burst`] is
/// kept, along with the slot type and payload block of data
/// bursts.
///
/// Messages which refer to a logical channel can be resolved
/// to frequencies by [applying](Message::apply) a
/// [`TimeslotFrequencyTable`].
#[derive(Clone, Debug)]
pub struct Message {
    burst: Burst,
    slot_type: Option<SlotType>,
    block: Option<PayloadBlock>,
    valid: bool,
    kind: MessageKind,
    identifiers: OnceLock<IdentifierSet>,
}

impl Message {
    pub(crate) fn new(
        burst: Burst,
        slot_type: Option<SlotType>,
        block: Option<PayloadBlock>,
        valid: bool,
        kind: MessageKind,
    ) -> Self {
        Self {
            burst,
            slot_type,
            block,
            valid,
            kind,
            identifiers: OnceLock::new(),
        }
    }

    /// Originating burst
    pub fn burst(&self) -> &Burst {
        &self.burst
    }

    /// Sync pattern of the originating burst
    pub fn sync(&self) -> SyncPattern {
        self.burst.sync()
    }

    /// Timeslot, 0 or 1
    pub fn timeslot(&self) -> u8 {
        self.burst.timeslot()
    }

    /// Arrival time, in milliseconds
    pub fn timestamp(&self) -> u64 {
        self.burst.timestamp()
    }

    /// All 288 bits of the originating burst
    pub fn bits(&self) -> &BitBuffer {
        self.burst.bits()
    }

    /// CACH of the originating burst, if present
    pub fn cach(&self) -> Option<&Cach> {
        self.burst.cach()
    }

    /// Slot type, for data bursts
    pub fn slot_type(&self) -> Option<&SlotType> {
        self.slot_type.as_ref()
    }

    /// Payload block, for CSBK and link control bursts
    pub fn block(&self) -> Option<&PayloadBlock> {
        self.block.as_ref()
    }

    /// True if every check code on the burst passed
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Message contents
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// True for unclassified bursts
    pub fn is_unknown(&self) -> bool {
        self.kind == MessageKind::Unknown
    }

    /// Identifiers carried by this message
    ///
    /// Computed on first call and cached. Source identifiers
    /// come first, then destinations, then channels. Unknown
    /// messages, and messages which identify nobody, have an
    /// empty set.
    pub fn identifiers(&self) -> &IdentifierSet {
        self.identifiers.get_or_init(|| {
            let mut out = IdentifierSet::new();
            self.kind.collect_identifiers(&mut out);
            out
        })
    }

    /// Channels this message refers to
    pub fn channels(&self) -> impl Iterator<Item = &DmrChannel> {
        self.kind.channel().into_iter()
    }

    /// Resolve every channel against `table`
    ///
    /// Stores the resolution on the message's channels,
    /// replacing any earlier one. The table is not retained.
    pub fn apply(&mut self, table: &TimeslotFrequencyTable) {
        if let Some(channel) = self.kind.channel_mut() {
            channel.apply(table);
        }
    }

    /// Physical channels for this message under `table`
    ///
    /// Does not modify the message. Channels with no entry in
    /// `table` are omitted.
    pub fn resolve(&self, table: &TimeslotFrequencyTable) -> Vec<PhysicalChannel> {
        self.channels()
            .filter(|channel| channel.is_assigned())
            .filter_map(|channel| table.resolve(channel.lsn()))
            .collect()
    }

    /// Discard the classification, keeping the burst
    pub fn into_unknown(self) -> Self {
        Self::new(self.burst, self.slot_type, self.block, self.valid, MessageKind::Unknown)
    }

    fn fmt_unknown(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.burst.cach() {
            Some(cach) => write!(f, "{}", cach)?,
            None => write!(f, "TS:{}", self.burst.timeslot())?,
        }
        write!(
            f,
            " {} UNKNOWN DMR BURST {}",
            self.burst.sync(),
            self.burst.bits()
        )
    }

    fn fmt_block(
        &self,
        f: &mut fmt::Formatter<'_>,
        slot_type: &SlotType,
        block: &PayloadBlock,
    ) -> fmt::Result {
        let (error, class, name) = match block {
            PayloadBlock::Csbk(csbk) => ("[CRC-ERROR] ", "CSBK", csbk.opcode().to_string()),
            PayloadBlock::Lc(lc) => ("[RS-ERROR] ", "LC", lc.opcode().to_string()),
        };

        if !self.valid {
            write!(f, "{}", error)?;
        }
        write!(f, "CC:{}", slot_type.color_code())?;
        if block.ras() != 0 {
            write!(f, " RAS:{}", block.ras())?;
        }
        write!(f, " {} {}", class, name)?;
        if let Some(body) = self.kind.body() {
            write!(f, " {}", body)?;
        }
        write!(f, " MSG:{}", block.bits())
    }
}

impl PartialEq for Message {
    // identifiers are derived from the kind
    fn eq(&self, other: &Self) -> bool {
        self.burst == other.burst
            && self.slot_type == other.slot_type
            && self.block == other.block
            && self.valid == other.valid
            && self.kind == other.kind
    }
}

impl Eq for Message {}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.slot_type, &self.block) {
            (MessageKind::Unknown, _, _) => self.fmt_unknown(f),
            (MessageKind::Idle, Some(slot_type), _) => {
                write!(f, "CC:{} IDLE", slot_type.color_code())
            }
            (MessageKind::Voice(voice), _, _) => write!(
                f,
                "TS:{} {} {}",
                self.burst.timeslot(),
                self.burst.sync(),
                voice
            ),
            (_, Some(slot_type), Some(block)) => self.fmt_block(f, slot_type, block),
            _ => self.fmt_unknown(f),
        }
    }
}
