//! ETSI standard CSBKs

use std::fmt;

use crate::bits::{span, BitBuffer, BitFieldErr};
use crate::burst::Burst;
use crate::channel::DmrChannel;
use crate::identifier::{Form, Identifier, IdentifierSet, Role};

use super::MessageKind;

/// Service options octet
///
/// Carried by voice service requests and by voice link control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ServiceOptions(u8);

impl ServiceOptions {
    /// Wrap the raw octet
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    /// Raw octet
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Emergency call
    pub fn is_emergency(&self) -> bool {
        self.0 & 0x80 != 0
    }

    /// Voice is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.0 & 0x40 != 0
    }

    /// Broadcast call
    pub fn is_broadcast(&self) -> bool {
        self.0 & 0x08 != 0
    }

    /// Open voice call mode
    pub fn is_open_voice_call_mode(&self) -> bool {
        self.0 & 0x04 != 0
    }

    /// Call priority, 0 – 3
    pub fn priority(&self) -> u8 {
        self.0 & 0x03
    }
}

impl fmt::Display for ServiceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_emergency() {
            write!(f, "EMERGENCY ")?;
        }
        if self.is_encrypted() {
            write!(f, "ENCRYPTED ")?;
        }
        if self.is_broadcast() {
            write!(f, "BROADCAST ")?;
        }
        if self.is_open_voice_call_mode() {
            write!(f, "OVCM ")?;
        }
        write!(f, "PRIORITY:{}", self.priority())
    }
}

const ALOHA_SITE_TS_SYNC: usize = 18;
const ALOHA_VERSION: [usize; 3] = span(19);
const ALOHA_OFFSET: usize = 22;
const ALOHA_ACTIVE_CONNECTION: usize = 23;
const ALOHA_MASK: [usize; 5] = span(24);
const ALOHA_SERVICE_FUNCTION: [usize; 2] = span(29);
const ALOHA_NRAND_WAIT: [usize; 4] = span(31);
const ALOHA_REGISTRATION: usize = 35;
const ALOHA_BACKOFF: [usize; 4] = span(36);
const ALOHA_SYSTEM_IDENTITY: [usize; 16] = span(40);
const ALOHA_MS_ADDRESS: [usize; 24] = span(56);

/// Aloha
///
/// Invites radios to make random access requests and
/// advertises the system identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Aloha {
    site_timeslot_sync: bool,
    version: u8,
    offset: bool,
    active_connection: bool,
    mask: u8,
    service_function: u8,
    nrand_wait: u8,
    registration_required: bool,
    backoff: u8,
    system_identity: u16,
    ms_address: u32,
}

impl Aloha {
    fn decode(bits: &BitBuffer) -> Result<Self, BitFieldErr> {
        Ok(Self {
            site_timeslot_sync: bits.get(ALOHA_SITE_TS_SYNC)?,
            version: bits.get_int(&ALOHA_VERSION)? as u8,
            offset: bits.get(ALOHA_OFFSET)?,
            active_connection: bits.get(ALOHA_ACTIVE_CONNECTION)?,
            mask: bits.get_int(&ALOHA_MASK)? as u8,
            service_function: bits.get_int(&ALOHA_SERVICE_FUNCTION)? as u8,
            nrand_wait: bits.get_int(&ALOHA_NRAND_WAIT)? as u8,
            registration_required: bits.get(ALOHA_REGISTRATION)?,
            backoff: bits.get_int(&ALOHA_BACKOFF)? as u8,
            system_identity: bits.get_int(&ALOHA_SYSTEM_IDENTITY)? as u16,
            ms_address: bits.get_int(&ALOHA_MS_ADDRESS)? as u32,
        })
    }

    /// Site timeslots are synchronized
    pub fn site_timeslot_sync(&self) -> bool {
        self.site_timeslot_sync
    }

    /// Protocol version
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Timing offset flag
    pub fn offset(&self) -> bool {
        self.offset
    }

    /// The channel has an active connection
    pub fn active_connection(&self) -> bool {
        self.active_connection
    }

    /// Number of address bits which must match to respond
    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Which services may respond
    pub fn service_function(&self) -> u8 {
        self.service_function
    }

    /// Random access wait parameter
    pub fn nrand_wait(&self) -> u8 {
        self.nrand_wait
    }

    /// Radios must register before using the site
    pub fn registration_required(&self) -> bool {
        self.registration_required
    }

    /// Random access backoff parameter
    pub fn backoff(&self) -> u8 {
        self.backoff
    }

    /// System identity code
    pub fn system_identity(&self) -> u16 {
        self.system_identity
    }

    /// Addressed radio, or 0
    pub fn ms_address(&self) -> u32 {
        self.ms_address
    }

    pub(crate) fn identifiers(&self, out: &mut IdentifierSet) {
        if self.ms_address != 0 {
            out.insert(Identifier::radio(self.ms_address, Role::To));
        }
    }
}

impl fmt::Display for Aloha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SYS:{:04X} VER:{} MASK:{} BACKOFF:{} NRAND:{}",
            self.system_identity, self.version, self.mask, self.backoff, self.nrand_wait
        )?;
        if self.registration_required {
            write!(f, " REGISTRATION REQUIRED")?;
        }
        if self.ms_address != 0 {
            write!(f, " TO:{}", self.ms_address)?;
        }
        Ok(())
    }
}

const PREAMBLE_DATA_CONTENT: usize = 16;
const PREAMBLE_GROUP: usize = 17;
const PREAMBLE_BLOCKS_TO_FOLLOW: [usize; 8] = span(24);
const TARGET: [usize; 24] = span(32);
const SOURCE: [usize; 24] = span(56);

/// Preamble
///
/// Precedes a data or CSBK transmission to wake up the
/// addressed radios.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Preamble {
    data_content: bool,
    group: bool,
    blocks_to_follow: u8,
    target: u32,
    source: u32,
}

impl Preamble {
    fn decode(bits: &BitBuffer) -> Result<Self, BitFieldErr> {
        Ok(Self {
            data_content: bits.get(PREAMBLE_DATA_CONTENT)?,
            group: bits.get(PREAMBLE_GROUP)?,
            blocks_to_follow: bits.get_int(&PREAMBLE_BLOCKS_TO_FOLLOW)? as u8,
            target: bits.get_int(&TARGET)? as u32,
            source: bits.get_int(&SOURCE)? as u32,
        })
    }

    /// A data transmission follows, rather than CSBKs
    pub fn data_content(&self) -> bool {
        self.data_content
    }

    /// The target is a talkgroup
    pub fn group(&self) -> bool {
        self.group
    }

    /// Number of preamble blocks still to come
    pub fn blocks_to_follow(&self) -> u8 {
        self.blocks_to_follow
    }

    /// Target radio or talkgroup
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Source radio
    pub fn source(&self) -> u32 {
        self.source
    }

    pub(crate) fn identifiers(&self, out: &mut IdentifierSet) {
        out.insert(Identifier::radio(self.source, Role::From));
        if self.group {
            out.insert(Identifier::talkgroup(self.target, Role::To));
        } else {
            out.insert(Identifier::radio(self.target, Role::To));
        }
    }
}

impl fmt::Display for Preamble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} FM:{} TO:{}{} BLOCKS:{}",
            if self.data_content { "DATA" } else { "CSBK" },
            self.source,
            if self.group { "TG:" } else { "" },
            self.target,
            self.blocks_to_follow
        )
    }
}

/// Base station outbound activation
///
/// Asks a base station to key up its outbound channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BsOutboundActivation {
    bs_address: u32,
    source: u32,
}

impl BsOutboundActivation {
    fn decode(bits: &BitBuffer) -> Result<Self, BitFieldErr> {
        Ok(Self {
            bs_address: bits.get_int(&TARGET)? as u32,
            source: bits.get_int(&SOURCE)? as u32,
        })
    }

    /// Base station address
    pub fn bs_address(&self) -> u32 {
        self.bs_address
    }

    /// Requesting radio
    pub fn source(&self) -> u32 {
        self.source
    }

    pub(crate) fn identifiers(&self, out: &mut IdentifierSet) {
        out.insert(Identifier::radio(self.source, Role::From));
        out.insert(Identifier::radio(self.bs_address, Role::To));
    }
}

impl fmt::Display for BsOutboundActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FM:{} BS:{}", self.source, self.bs_address)
    }
}

const UU_SERVICE_OPTIONS: [usize; 8] = span(16);

/// Unit-to-unit voice service request
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnitToUnitVoiceServiceRequest {
    service_options: ServiceOptions,
    target: u32,
    source: u32,
}

impl UnitToUnitVoiceServiceRequest {
    fn decode(bits: &BitBuffer) -> Result<Self, BitFieldErr> {
        Ok(Self {
            service_options: ServiceOptions::new(bits.get_int(&UU_SERVICE_OPTIONS)? as u8),
            target: bits.get_int(&TARGET)? as u32,
            source: bits.get_int(&SOURCE)? as u32,
        })
    }

    /// Requested service options
    pub fn service_options(&self) -> ServiceOptions {
        self.service_options
    }

    /// Called radio
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Calling radio
    pub fn source(&self) -> u32 {
        self.source
    }

    pub(crate) fn identifiers(&self, out: &mut IdentifierSet) {
        out.insert(Identifier::radio(self.source, Role::From));
        out.insert(Identifier::radio(self.target, Role::To));
    }
}

impl fmt::Display for UnitToUnitVoiceServiceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FM:{} TO:{} {}",
            self.source, self.target, self.service_options
        )
    }
}

const GRANT_LPCN: [usize; 12] = span(16);
const GRANT_LCN: usize = 28;
const GRANT_LATE_ENTRY: usize = 29;
const GRANT_EMERGENCY: usize = 30;
const GRANT_OFFSET: usize = 31;

/// Voice channel grant
///
/// Directs the called and calling parties to a traffic
/// channel. Grants carry the repeater number (LPCN) and a
/// timeslot bit, which together form the logical slot number.
/// The target is a radio for private calls and a talkgroup
/// for talkgroup and broadcast calls.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VoiceChannelGrant {
    channel: DmrChannel,
    late_entry: bool,
    emergency: bool,
    offset: bool,
    target_form: Form,
    target: u32,
    source: u32,
}

impl VoiceChannelGrant {
    fn decode(bits: &BitBuffer, target_form: Form) -> Result<Self, BitFieldErr> {
        let lpcn = bits.get_int(&GRANT_LPCN)? as u32;
        let lcn = bits.get(GRANT_LCN)? as u32;
        Ok(Self {
            channel: DmrChannel::from_channel_timeslot(lpcn, lcn + 1),
            late_entry: bits.get(GRANT_LATE_ENTRY)?,
            emergency: bits.get(GRANT_EMERGENCY)?,
            offset: bits.get(GRANT_OFFSET)?,
            target_form,
            target: bits.get_int(&TARGET)? as u32,
            source: bits.get_int(&SOURCE)? as u32,
        })
    }

    /// Granted channel
    pub fn channel(&self) -> &DmrChannel {
        &self.channel
    }

    pub(crate) fn channel_mut(&mut self) -> &mut DmrChannel {
        &mut self.channel
    }

    /// Grant is a reminder for a call already in progress
    pub fn late_entry(&self) -> bool {
        self.late_entry
    }

    /// Emergency call
    pub fn emergency(&self) -> bool {
        self.emergency
    }

    /// Timing offset flag
    pub fn offset(&self) -> bool {
        self.offset
    }

    /// Whether the target is a radio or a talkgroup
    pub fn target_form(&self) -> Form {
        self.target_form
    }

    /// Called radio or talkgroup
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Calling radio
    pub fn source(&self) -> u32 {
        self.source
    }

    pub(crate) fn identifiers(&self, out: &mut IdentifierSet) {
        out.insert(Identifier::radio(self.source, Role::From));
        match self.target_form {
            Form::Radio => out.insert(Identifier::radio(self.target, Role::To)),
            _ => out.insert(Identifier::talkgroup(self.target, Role::To)),
        };
        if let Some(id) = self.channel.identifier(Role::Any) {
            out.insert(id);
        }
    }
}

impl fmt::Display for VoiceChannelGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FM:{} TO:{}{} CHAN:{}",
            self.source,
            if self.target_form == Form::Radio { "" } else { "TG:" },
            self.target,
            self.channel
        )?;
        if self.emergency {
            write!(f, " EMERGENCY")?;
        }
        if self.late_entry {
            write!(f, " LATE ENTRY")?;
        }
        Ok(())
    }
}

pub(crate) fn decode_aloha(_burst: &Burst, block: &BitBuffer) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::Aloha(Aloha::decode(block)?))
}

pub(crate) fn decode_preamble(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::Preamble(Preamble::decode(block)?))
}

pub(crate) fn decode_bs_outbound_activation(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::BsOutboundActivation(
        BsOutboundActivation::decode(block)?,
    ))
}

pub(crate) fn decode_unit_to_unit_voice_service_request(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::UnitToUnitVoiceServiceRequest(
        UnitToUnitVoiceServiceRequest::decode(block)?,
    ))
}

pub(crate) fn decode_private_voice_channel_grant(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::PrivateVoiceChannelGrant(
        VoiceChannelGrant::decode(block, Form::Radio)?,
    ))
}

pub(crate) fn decode_talkgroup_voice_channel_grant(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::TalkgroupVoiceChannelGrant(
        VoiceChannelGrant::decode(block, Form::Talkgroup)?,
    ))
}

pub(crate) fn decode_broadcast_talkgroup_voice_channel_grant(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::BroadcastTalkgroupVoiceChannelGrant(
        VoiceChannelGrant::decode(block, Form::Talkgroup)?,
    ))
}
