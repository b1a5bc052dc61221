//! Burst classification

#[cfg(not(test))]
use log::{debug, trace};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as trace;

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

use crate::bits::{BitBuffer, BitFieldErr};
use crate::burst::Burst;
use crate::csbk::{Csbk, CsbkOpcode};
use crate::lc::{FullLc, LcOpcode};
use crate::message::{self, Message, MessageKind, PayloadBlock};
use crate::slottype::{DataType, SlotType};
use crate::sync::BurstCategory;

/// Registry key, within a [`BurstCategory`]
///
/// Data bursts are keyed by the opcode of their payload block,
/// or by their data type alone when the data type carries no
/// opcode. Voice bursts share a single key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// CSBK opcode, qualified by vendor
    Csbk(CsbkOpcode),

    /// Full link control opcode, qualified by vendor
    Lc(LcOpcode),

    /// Data type without an opcode
    DataType(DataType),

    /// Any voice burst
    Voice,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Csbk(op) => write!(f, "CSBK {}", op),
            Opcode::Lc(op) => write!(f, "LC {}", op),
            Opcode::DataType(dt) => dt.fmt(f),
            Opcode::Voice => "VOICE".fmt(f),
        }
    }
}

/// True if a decoder is registered for `opcode`
pub fn is_registered(category: BurstCategory, opcode: Opcode) -> bool {
    REGISTRY.contains_key(&(category, opcode))
}

/// Classify a burst
///
/// Never fails. Bursts which cannot be classified, including
/// those with an unrecognized sync pattern, an undecodable slot
/// type, or an opcode with no registered decoder, become
/// [`MessageKind::Unknown`]. Bursts which fail their check
/// codes are still decoded, but are not
/// [valid](Message::is_valid).
pub fn classify(burst: Burst) -> Message {
    match burst.sync().category() {
        BurstCategory::Voice => dispatch(
            burst,
            None,
            None,
            true,
            BurstCategory::Voice,
            Opcode::Voice,
        ),
        BurstCategory::Data => classify_data(burst),
        BurstCategory::Other => {
            debug!("unrecognized sync pattern {}", burst.sync());
            Message::new(burst, None, None, false, MessageKind::Unknown)
        }
    }
}

fn classify_data(burst: Burst) -> Message {
    let slot_type = match SlotType::from_burst(&burst) {
        Ok(slot_type) => slot_type,
        Err(err) => {
            debug!("unable to read slot type: {}", err);
            return Message::new(burst, None, None, false, MessageKind::Unknown);
        }
    };

    if !slot_type.is_valid() {
        debug!("slot type failed Golay check");
        return Message::new(burst, Some(slot_type), None, false, MessageKind::Unknown);
    }

    let data_type = slot_type.data_type();
    let info = match burst.info_bits() {
        Ok(info) => info,
        Err(err) => {
            debug!("unable to read info bits: {}", err);
            return Message::new(burst, Some(slot_type), None, false, MessageKind::Unknown);
        }
    };

    let block = match data_type {
        DataType::Csbk => Csbk::decode(&info).map(PayloadBlock::Csbk),
        DataType::VoiceLcHeader | DataType::TerminatorWithLc => {
            FullLc::decode(&info, data_type).map(PayloadBlock::Lc)
        }
        _ => {
            return dispatch(
                burst,
                Some(slot_type),
                None,
                true,
                BurstCategory::Data,
                Opcode::DataType(data_type),
            );
        }
    };

    match block {
        Ok(block) => {
            let opcode = match &block {
                PayloadBlock::Csbk(csbk) => Opcode::Csbk(csbk.opcode()),
                PayloadBlock::Lc(lc) => Opcode::Lc(lc.opcode()),
            };
            let valid = block.is_valid();
            dispatch(
                burst,
                Some(slot_type),
                Some(block),
                valid,
                BurstCategory::Data,
                opcode,
            )
        }
        Err(err) => {
            debug!("unable to decode {} block: {}", data_type, err);
            Message::new(burst, Some(slot_type), None, false, MessageKind::Unknown)
        }
    }
}

fn dispatch(
    burst: Burst,
    slot_type: Option<SlotType>,
    block: Option<PayloadBlock>,
    valid: bool,
    category: BurstCategory,
    opcode: Opcode,
) -> Message {
    let decode = match REGISTRY.get(&(category, opcode)) {
        Some(decode) => decode,
        None => {
            debug!("no decoder for {} {}", category, opcode);
            return Message::new(burst, slot_type, block, valid, MessageKind::Unknown);
        }
    };

    let decoded = match &block {
        Some(block) => decode(&burst, block.bits()),
        None => match opcode {
            Opcode::Voice => decode(&burst, burst.bits()),
            _ => burst.info_bits().and_then(|info| decode(&burst, &info)),
        },
    };

    match decoded {
        Ok(kind) => {
            trace!("classified {} {}", category, opcode);
            Message::new(burst, slot_type, block, valid, kind)
        }
        Err(err) => {
            debug!("decoder for {} {} failed: {}", category, opcode, err);
            Message::new(burst, slot_type, block, false, MessageKind::Unknown)
        }
    }
}

/// Builds a [`MessageKind`] from a burst
///
/// The second argument is the 96-bit payload block for CSBK and
/// link control bursts, the 196 info bits for other data
/// bursts, or the whole burst for voice.
type DecodeFn = fn(&Burst, &BitBuffer) -> Result<MessageKind, BitFieldErr>;

fn decode_idle(_burst: &Burst, _block: &BitBuffer) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::Idle)
}

lazy_static! {
    static ref REGISTRY: HashMap<(BurstCategory, Opcode), DecodeFn> = {
        use BurstCategory::{Data, Voice};

        let csbk = |op: CsbkOpcode| (Data, Opcode::Csbk(op));
        let lc = |op: LcOpcode| (Data, Opcode::Lc(op));

        let entries: [((BurstCategory, Opcode), DecodeFn); 15] = [
            (csbk(CsbkOpcode::StandardAloha), message::decode_aloha),
            (csbk(CsbkOpcode::StandardPreamble), message::decode_preamble),
            (
                csbk(CsbkOpcode::StandardBaseStationOutboundActivation),
                message::decode_bs_outbound_activation,
            ),
            (
                csbk(CsbkOpcode::StandardUnitToUnitVoiceServiceRequest),
                message::decode_unit_to_unit_voice_service_request,
            ),
            (
                csbk(CsbkOpcode::StandardPrivateVoiceChannelGrant),
                message::decode_private_voice_channel_grant,
            ),
            (
                csbk(CsbkOpcode::StandardTalkgroupVoiceChannelGrant),
                message::decode_talkgroup_voice_channel_grant,
            ),
            (
                csbk(CsbkOpcode::StandardBroadcastTalkgroupVoiceChannelGrant),
                message::decode_broadcast_talkgroup_voice_channel_grant,
            ),
            (
                csbk(CsbkOpcode::ConnectPlusNeighborReport),
                message::decode_neighbor_report,
            ),
            (
                csbk(CsbkOpcode::ConnectPlusVoiceChannelUser),
                message::decode_voice_channel_user,
            ),
            (
                csbk(CsbkOpcode::ConnectPlusDataChannelGrant),
                message::decode_data_channel_grant,
            ),
            (
                csbk(CsbkOpcode::ConnectPlusOtaAnnouncement),
                message::decode_ota_announcement,
            ),
            (
                lc(LcOpcode::StandardGroupVoiceChannelUser),
                message::decode_group_voice_channel_user,
            ),
            (
                lc(LcOpcode::StandardUnitToUnitVoiceChannelUser),
                message::decode_unit_to_unit_voice_channel_user,
            ),
            ((Data, Opcode::DataType(DataType::Idle)), decode_idle),
            ((Voice, Opcode::Voice), message::decode_voice),
        ];

        entries.into_iter().collect()
    };
}
