//! # dmrburst: DMR Burst Decoding
//!
//! This crate decodes bursts of
//! [Digital Mobile Radio](https://en.wikipedia.org/wiki/Digital_mobile_radio)
//! (DMR) traffic into typed messages. It understands control
//! signalling blocks (CSBKs), the link control that opens and
//! closes every voice call, idle bursts, and voice bursts. It
//! also extracts the radios, talkgroups, and logical channels
//! which each message mentions.
//!
//! ## Disclaimer
//!
//! This crate is dual-licensed MIT and Apache 2.0. Read these licenses
//! carefully as they may affect your rights.
//!
//! This crate decodes only what is sent in the clear. It does not
//! and will not decrypt anything.
//!
//! ## Example
//!
//! You will first need a demodulator which recovers DMR
//! *bursts*: 288-bit frames, sync pattern, and timeslot. Obtaining
//! these is beyond the scope of this crate. Each burst is handed
//! to a [`DmrDecoder`], which is created by a
//! [builder](DmrDecoderBuilder).
//!
//! ```
//! use dmrburst::{
//!     csbk, BitBuffer, BurstBuilder, CsbkOpcode, DataType, DmrDecoderBuilder,
//!     MessageKind, SyncPattern, TimeslotFrequency,
//! };
//!
//! let mut decoder = DmrDecoderBuilder::new()
//!     .with_timeslot_frequencies([TimeslotFrequency::new(3, 451_125_000, 456_125_000)])
//!     .build();
//!
//! // let's synthesize a Connect Plus OTA announcement
//! let mut block = csbk::new_block(CsbkOpcode::ConnectPlusOtaAnnouncement);
//! block.set_int(&dmrburst::span::<5>(63), 4).unwrap();
//! csbk::seal(&mut block).unwrap();
//! let burst = BurstBuilder::new(SyncPattern::BaseStationData, 1)
//!     .build_data(1, DataType::Csbk, &block, 0)
//!     .unwrap();
//!
//! let msg = decoder.decode(burst);
//! assert!(msg.is_valid());
//! match msg.kind() {
//!     MessageKind::ConnectPlusOtaAnnouncement(ota) => {
//!         // logical slot numbers are sent one-based
//!         assert_eq!(ota.channel().lsn(), 3);
//!         assert_eq!(ota.channel().frequency().unwrap().downlink_hz(), 451_125_000);
//!     }
//!     _ => unreachable!(),
//! }
//! println!("{}", msg);
//! ```
//!
//! Every burst produces a [`Message`], even one which fails its
//! check codes or which we cannot classify. Check
//! [`Message::is_valid()`] before trusting the contents, or build
//! the decoder [`with_require_valid()`](DmrDecoderBuilder::with_require_valid).
//! Unclassified bursts are [`MessageKind::Unknown`].
//!
//! ## Background
//!
//! DMR is a two-slot TDMA protocol. Each 30 ms burst carries 288
//! bits. Repeater outbound bursts begin with a Common
//! Announcement Channel ([`Cach`]). The middle of each burst holds
//! a 48-bit [`SyncPattern`], which tells voice bursts from data.
//!
//! Data bursts carry a Golay-protected [`SlotType`] and 196 bits
//! of BPTC(196,96) coded payload. CSBKs are checked with a masked
//! CRC, and full link control with Reed-Solomon (12,9).
//!
//! Trunked systems refer to channels by *logical slot number*.
//! A [`TimeslotFrequencyTable`] maps these to frequencies. The
//! table can be updated while decoding through a
//! [`SharedTimeslotTable`].
//!
//! ## Crate features
//!
//! * `chrono`: Use chrono to view burst timestamps as true UTC
//!   [datetimes](Burst::datetime). If enabled, `chrono`
//!   becomes part of this crate's public API.
//!

mod bits;
mod builder;
mod burst;
mod cach;
mod channel;
mod crc;
pub mod csbk;
mod decoder;
mod dispatch;
mod fec;
mod identifier;
pub mod lc;
mod message;
mod slottype;
mod sync;

pub use bits::{span, BitBuffer, BitFieldErr, HexParseErr};
pub use builder::{BurstBuilder, DmrDecoderBuilder};
pub use burst::{Burst, BurstDecodeErr, BURST_LENGTH, VOICE_FRAME_BITS};
pub use cach::{Cach, Lcss};
pub use channel::{
    lsn_from_wire, DmrChannel, PhysicalChannel, SharedTimeslotTable, TimeslotFrequency,
    TimeslotFrequencyTable, DEFAULT_BANDWIDTH_HZ,
};
pub use csbk::{Csbk, CsbkOpcode, Vendor};
pub use decoder::{DecodeStats, DmrDecoder};
pub use dispatch::{classify, is_registered, Opcode};
pub use identifier::{Form, Identifier, IdentifierClass, IdentifierSet, Role};
pub use lc::{FullLc, LcOpcode};
pub use message::{
    Aloha, BsOutboundActivation, DataChannelGrant, LinkControlChannelUser, Message, MessageKind,
    NeighborReport, OtaAnnouncement, OtaMessageType, PayloadBlock, Preamble, ServiceOptions,
    UnitToUnitVoiceServiceRequest, VoiceBurst, VoiceChannelGrant, VoiceChannelUser, VoiceFrame,
    MAX_NEIGHBORS,
};
pub use slottype::{DataType, SlotType};
pub use sync::{BurstCategory, SyncPattern, SYNC_BITS};
