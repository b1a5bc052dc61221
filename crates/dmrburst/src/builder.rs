use crate::bits::{BitBuffer, BitFieldErr};
use crate::burst::{
    Burst, BurstDecodeErr, BURST_LENGTH, INFO_HALF_1, INFO_HALF_2, SLOT_TYPE_HALF_1,
    SLOT_TYPE_HALF_2, SYNC_FIELD, VOICE_FRAME_BITS,
};
use crate::cach::{Cach, Lcss, CACH_BITS};
use crate::channel::{SharedTimeslotTable, TimeslotFrequency};
use crate::decoder::DmrDecoder;
use crate::fec::bptc196x96_encode;
use crate::slottype::{DataType, SlotType};
use crate::sync::SyncPattern;

/// Builds a DMR decoder
///
/// The defaults accept every burst, valid or not, and start
/// with an empty timeslot frequency table.
///
/// ```
/// use dmrburst::{DmrDecoderBuilder, TimeslotFrequency};
///
/// let decoder = DmrDecoderBuilder::new()
///     .with_require_valid(true)
///     .with_timeslot_frequencies([TimeslotFrequency::new(1, 451_125_000, 456_125_000)])
///     .build();
/// assert_eq!(decoder.timeslot_table().snapshot().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DmrDecoderBuilder {
    require_valid: bool,
    timeslot_table: SharedTimeslotTable,
}

impl DmrDecoderBuilder {
    /// New decoder builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a decoder
    ///
    /// The decoder shares this builder's timeslot table handle.
    pub fn build(&self) -> DmrDecoder {
        DmrDecoder::from(self)
    }

    /// Downgrade invalid messages to Unknown
    ///
    /// When set, any message whose check codes fail is
    /// reported as [`MessageKind::Unknown`](crate::MessageKind::Unknown).
    pub fn with_require_valid(&mut self, require_valid: bool) -> &mut Self {
        self.require_valid = require_valid;
        self
    }

    /// Resolve channels against a shared table
    ///
    /// Updates made through any clone of `table` are seen by
    /// the decoder on its next burst.
    pub fn with_timeslot_table(&mut self, table: &SharedTimeslotTable) -> &mut Self {
        self.timeslot_table = table.clone();
        self
    }

    /// Replace the contents of the timeslot table
    pub fn with_timeslot_frequencies<I>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = TimeslotFrequency>,
    {
        self.timeslot_table.replace(entries.into_iter().collect());
        self
    }

    /// Downgrade invalid messages to Unknown?
    pub fn require_valid(&self) -> bool {
        self.require_valid
    }

    /// Shared timeslot table handle
    pub fn timeslot_table(&self) -> &SharedTimeslotTable {
        &self.timeslot_table
    }
}

/// Synthesizes bursts
///
/// Packs payload blocks, slot types, sync, and CACH into
/// 288-bit bursts exactly as a repeater would send them. Useful
/// for testing and for demonstrations.
///
/// Base station bursts get an idle CACH for their timeslot
/// unless one is [provided](BurstBuilder::with_cach).
///
/// ```
/// use dmrburst::{BitBuffer, BurstBuilder, DataType, SyncPattern};
///
/// let burst = BurstBuilder::new(SyncPattern::BaseStationData, 1)
///     .with_timestamp(1_000)
///     .build_data(1, DataType::Idle, &BitBuffer::zeroed(96), 0)
///     .unwrap();
/// assert_eq!(burst.timeslot(), 1);
/// assert_eq!(burst.cach().unwrap().timeslot(), 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurstBuilder {
    sync: SyncPattern,
    timeslot: u8,
    timestamp: u64,
    cach: Option<Cach>,
}

impl BurstBuilder {
    /// Bursts with the given sync and timeslot
    pub fn new(sync: SyncPattern, timeslot: u8) -> Self {
        Self {
            sync,
            timeslot,
            timestamp: 0,
            cach: None,
        }
    }

    /// Arrival time, in milliseconds
    pub fn with_timestamp(&mut self, timestamp: u64) -> &mut Self {
        self.timestamp = timestamp;
        self
    }

    /// Send this CACH
    ///
    /// Only base station bursts carry a CACH. For other sync
    /// patterns, it is ignored.
    pub fn with_cach(&mut self, cach: Cach) -> &mut Self {
        self.cach = Some(cach);
        self
    }

    /// Build a data burst
    ///
    /// `block` is the 96-bit payload, which is protected with
    /// BPTC(196,96). `ras` supplies the three reserved bits. The
    /// payload's own check code must already be in place; see
    /// [`csbk::seal()`](crate::csbk::seal) and
    /// [`lc::seal()`](crate::lc::seal).
    pub fn build_data(
        &self,
        color_code: u8,
        data_type: DataType,
        block: &BitBuffer,
        ras: u8,
    ) -> Result<Burst, BurstDecodeErr> {
        let info = bptc196x96_encode(block, ras)?;
        let half = INFO_HALF_1.len();
        let slot_type = SlotType::new(color_code, data_type).encode() as u64;

        let slot_type_1: Vec<usize> = SLOT_TYPE_HALF_1.collect();
        let slot_type_2: Vec<usize> = SLOT_TYPE_HALF_2.collect();

        let mut bits = self.frame()?;
        bits.splice(INFO_HALF_1.start, &info.extract(&[0..half])?)?;
        bits.splice(INFO_HALF_2.start, &info.extract(&[half..info.len()])?)?;
        bits.set_int(&slot_type_1, slot_type >> slot_type_2.len())?;
        bits.set_int(&slot_type_2, slot_type & 0x3FF)?;

        self.finish(bits)
    }

    /// Build a voice burst from three 72-bit vocoder frames
    ///
    /// Embedded signalling for bursts B through F is left zero.
    pub fn build_voice(&self, frames: [BitBuffer; 3]) -> Result<Burst, BurstDecodeErr> {
        for frame in &frames {
            if frame.len() != VOICE_FRAME_BITS {
                return Err(BitFieldErr::WrongLength {
                    expected: VOICE_FRAME_BITS,
                    actual: frame.len(),
                }
                .into());
            }
        }

        // the middle frame straddles the sync
        let [first, middle, last] = frames;
        let middle_head = SYNC_FIELD.start - (CACH_BITS + VOICE_FRAME_BITS);

        let mut bits = self.frame()?;
        bits.splice(CACH_BITS, &first)?;
        bits.splice(
            CACH_BITS + VOICE_FRAME_BITS,
            &middle.extract(&[0..middle_head])?,
        )?;
        bits.splice(
            SYNC_FIELD.end,
            &middle.extract(&[middle_head..VOICE_FRAME_BITS])?,
        )?;
        bits.splice(BURST_LENGTH - VOICE_FRAME_BITS, &last)?;

        self.finish(bits)
    }

    // empty burst with CACH and sync
    fn frame(&self) -> Result<BitBuffer, BitFieldErr> {
        let mut bits = BitBuffer::zeroed(BURST_LENGTH);
        if let Some(cach) = self.burst_cach() {
            bits.splice(0, &cach.encode())?;
        }

        let sync: Vec<usize> = SYNC_FIELD.collect();
        bits.set_int(&sync, self.sync.pattern().unwrap_or(0))?;
        Ok(bits)
    }

    fn finish(&self, bits: BitBuffer) -> Result<Burst, BurstDecodeErr> {
        let burst = Burst::new(self.sync, self.timeslot, self.timestamp, bits)?;
        Ok(match self.burst_cach() {
            Some(cach) => burst.with_cach(cach),
            None => burst,
        })
    }

    fn burst_cach(&self) -> Option<Cach> {
        if !self.sync.has_cach() {
            return None;
        }
        Some(
            self.cach
                .unwrap_or_else(|| Cach::new(false, self.timeslot, Lcss::Single, 0)),
        )
    }
}
