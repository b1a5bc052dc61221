//! Per-channel decoder

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use std::convert::From;

use crate::bits::BitBuffer;
use crate::builder::DmrDecoderBuilder;
use crate::burst::{Burst, BurstDecodeErr};
use crate::channel::SharedTimeslotTable;
use crate::dispatch::classify;
use crate::message::Message;
use crate::sync::SyncPattern;

/// Running totals kept by a [`DmrDecoder`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DecodeStats {
    /// Bursts decoded
    pub bursts: u64,

    /// Messages whose check codes passed
    pub valid: u64,

    /// Messages whose check codes failed
    pub invalid: u64,

    /// Messages which could not be classified
    pub unknown: u64,
}

/// Decodes the bursts of one DMR channel
///
/// The decoder classifies each burst it is given, resolves any
/// logical channels the message mentions against the current
/// timeslot frequency table, and keeps running statistics.
///
/// Create the decoder with a [`DmrDecoderBuilder`]:
///
/// ```
/// use dmrburst::{BitBuffer, DmrDecoderBuilder, SyncPattern};
///
/// let mut decoder = DmrDecoderBuilder::new().build();
/// let msg = decoder
///     .decode_bits(SyncPattern::Unknown, 0, 0, BitBuffer::zeroed(288))
///     .expect("well-formed burst");
/// assert!(msg.is_unknown());
/// assert_eq!(decoder.stats().unknown, 1);
///
/// assert!(decoder
///     .decode_bits(SyncPattern::Unknown, 0, 0, BitBuffer::zeroed(100))
///     .is_err());
/// ```
///
/// Bursts within one decoder are processed in order. To decode
/// several channels in parallel, give each its own decoder. The
/// decoders may share one [`SharedTimeslotTable`].
#[derive(Clone, Debug)]
pub struct DmrDecoder {
    require_valid: bool,
    timeslot_table: SharedTimeslotTable,
    stats: DecodeStats,
}

impl DmrDecoder {
    /// Decode one burst
    ///
    /// Always produces a message. Check
    /// [`Message::is_valid()`] before trusting it.
    pub fn decode(&mut self, burst: Burst) -> Message {
        let mut msg = classify(burst);

        if msg.channels().next().is_some() {
            msg.apply(&self.timeslot_table.snapshot());
        }

        if self.require_valid && !msg.is_valid() && !msg.is_unknown() {
            debug!("discarding invalid message: {}", msg);
            msg = msg.into_unknown();
        }

        self.stats.bursts += 1;
        if msg.is_valid() {
            self.stats.valid += 1;
        } else {
            self.stats.invalid += 1;
        }
        if msg.is_unknown() {
            self.stats.unknown += 1;
        }

        msg
    }

    /// Decode a burst from its parts
    ///
    /// The burst is checked for structure first. A burst of the
    /// wrong length or with a bad timeslot is an error, not a
    /// message. For base station bursts, the CACH is decoded
    /// from the first 24 bits.
    pub fn decode_bits(
        &mut self,
        sync: SyncPattern,
        timeslot: u8,
        timestamp: u64,
        bits: BitBuffer,
    ) -> Result<Message, BurstDecodeErr> {
        let burst = Burst::with_cach_from_bits(sync, timeslot, timestamp, bits)?;
        Ok(self.decode(burst))
    }

    /// Statistics since creation or the last reset
    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Clear statistics
    pub fn reset_stats(&mut self) {
        self.stats = DecodeStats::default();
    }

    /// Timeslot frequency table handle
    ///
    /// Updates made through this handle, or any of its clones,
    /// apply to the next burst.
    pub fn timeslot_table(&self) -> &SharedTimeslotTable {
        &self.timeslot_table
    }

    /// Are invalid messages downgraded to Unknown?
    pub fn require_valid(&self) -> bool {
        self.require_valid
    }
}

impl From<&DmrDecoderBuilder> for DmrDecoder {
    fn from(cfg: &DmrDecoderBuilder) -> Self {
        Self {
            require_valid: cfg.require_valid(),
            timeslot_table: cfg.timeslot_table().clone(),
            stats: DecodeStats::default(),
        }
    }
}
