//! Burst envelope

use std::fmt;
use std::ops::Range;

#[cfg(feature = "chrono")]
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::bits::{BitBuffer, BitFieldErr};
use crate::cach::{Cach, CACH_BITS};
use crate::sync::{SyncPattern, SYNC_BITS};

/// Width of every DMR burst, in bits
pub const BURST_LENGTH: usize = 288;

/// First half of the info field
pub const INFO_HALF_1: Range<usize> = 24..122;

/// First half of the slot type
pub const SLOT_TYPE_HALF_1: Range<usize> = 122..132;

/// Sync or embedded signalling
pub const SYNC_FIELD: Range<usize> = 132..180;

/// Second half of the slot type
pub const SLOT_TYPE_HALF_2: Range<usize> = 180..190;

/// Second half of the info field
pub const INFO_HALF_2: Range<usize> = 190..288;

/// Number of bits in one vocoder frame
pub const VOICE_FRAME_BITS: usize = 72;

/// Error constructing a [`Burst`]
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BurstDecodeErr {
    /// The bit buffer is not exactly one burst long
    #[error("burst must be 288 bits, got {0}")]
    WrongLength(usize),

    /// Timeslot is neither 0 nor 1
    #[error("timeslot {0} is not 0 or 1")]
    InvalidTimeslot(u8),

    /// A field could not be read
    #[error("malformed burst: {0}")]
    Field(#[from] BitFieldErr),
}

/// One received DMR burst
///
/// The external demodulator produces a `Burst` for each 30 ms
/// slot it recovers: 288 hard-decision bits, the sync pattern
/// it matched, the timeslot, and an arrival timestamp. Bursts
/// are immutable.
///
/// ```
/// use dmrburst::{BitBuffer, Burst, SyncPattern, BURST_LENGTH};
///
/// let bits = BitBuffer::zeroed(BURST_LENGTH);
/// let burst = Burst::new(SyncPattern::BaseStationData, 1, 1000, bits).unwrap();
/// assert_eq!(burst.timeslot(), 1);
/// assert!(burst.cach().is_none());
///
/// let short = BitBuffer::zeroed(200);
/// assert!(Burst::new(SyncPattern::BaseStationData, 1, 1000, short).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Burst {
    sync: SyncPattern,
    timeslot: u8,
    timestamp: u64,
    bits: BitBuffer,
    cach: Option<Cach>,
}

impl Burst {
    /// Validate and wrap a received burst
    ///
    /// `timestamp` is in milliseconds. It may be either monotonic
    /// or wall-clock time; the [`datetime()`](Burst::datetime)
    /// view assumes the latter.
    pub fn new(
        sync: SyncPattern,
        timeslot: u8,
        timestamp: u64,
        bits: BitBuffer,
    ) -> Result<Self, BurstDecodeErr> {
        if bits.len() != BURST_LENGTH {
            return Err(BurstDecodeErr::WrongLength(bits.len()));
        }
        if timeslot > 1 {
            return Err(BurstDecodeErr::InvalidTimeslot(timeslot));
        }

        Ok(Self {
            sync,
            timeslot,
            timestamp,
            bits,
            cach: None,
        })
    }

    /// As [`new()`](Burst::new), and decode the CACH
    ///
    /// The CACH is only present on base-station sourced bursts.
    /// For other sync patterns, no CACH is attached.
    pub fn with_cach_from_bits(
        sync: SyncPattern,
        timeslot: u8,
        timestamp: u64,
        bits: BitBuffer,
    ) -> Result<Self, BurstDecodeErr> {
        let mut out = Self::new(sync, timeslot, timestamp, bits)?;
        if sync.has_cach() {
            out.cach = Some(Cach::from_burst(&out.bits)?);
        }
        Ok(out)
    }

    /// Attach an already-decoded CACH
    pub fn with_cach(mut self, cach: Cach) -> Self {
        self.cach = Some(cach);
        self
    }

    /// Sync pattern the demodulator matched
    pub fn sync(&self) -> SyncPattern {
        self.sync
    }

    /// Timeslot, 0 or 1
    pub fn timeslot(&self) -> u8 {
        self.timeslot
    }

    /// Arrival time, in milliseconds
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Arrival time as a UTC datetime
    ///
    /// Interprets the timestamp as milliseconds since the Unix
    /// epoch. Requires `chrono`.
    #[cfg(feature = "chrono")]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        let ms = i64::try_from(self.timestamp).ok()?;
        Utc.timestamp_millis_opt(ms).single()
    }

    /// All 288 bits
    pub fn bits(&self) -> &BitBuffer {
        &self.bits
    }

    /// Decoded CACH, if present
    pub fn cach(&self) -> Option<&Cach> {
        self.cach.as_ref()
    }

    /// The 196 info bits, with the slot type and sync removed
    pub fn info_bits(&self) -> Result<BitBuffer, BitFieldErr> {
        self.bits.extract(&[INFO_HALF_1, INFO_HALF_2])
    }

    /// The 20-bit slot type codeword
    pub fn slot_type_word(&self) -> Result<u32, BitFieldErr> {
        let idx: Vec<usize> = SLOT_TYPE_HALF_1.chain(SLOT_TYPE_HALF_2).collect();
        Ok(self.bits.get_int(&idx)? as u32)
    }

    /// The 48-bit sync or embedded signalling field
    pub fn sync_bits(&self) -> Result<u64, BitFieldErr> {
        let idx: Vec<usize> = SYNC_FIELD.collect();
        debug_assert_eq!(idx.len(), SYNC_BITS);
        self.bits.get_int(&idx)
    }

    /// The three 72-bit vocoder frames of a voice burst
    ///
    /// The middle frame straddles the sync field.
    pub fn voice_frames(&self) -> Result<[BitBuffer; 3], BitFieldErr> {
        let start = CACH_BITS;
        let split = SYNC_FIELD.start;
        let resume = SYNC_FIELD.end;
        let mid_tail = VOICE_FRAME_BITS - (split - start - VOICE_FRAME_BITS);
        Ok([
            self.bits.extract(&[start..start + VOICE_FRAME_BITS])?,
            self.bits
                .extract(&[start + VOICE_FRAME_BITS..split, resume..resume + mid_tail])?,
            self.bits
                .extract(&[resume + mid_tail..BURST_LENGTH])?,
        ])
    }
}

impl fmt::Display for Burst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TS:{} {} {}", self.timeslot, self.sync, self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::cach::Lcss;

    fn patterned() -> BitBuffer {
        (0..BURST_LENGTH).map(|i| i % 3 == 0).collect()
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(
            Burst::new(SyncPattern::BaseStationData, 0, 0, BitBuffer::zeroed(287)),
            Err(BurstDecodeErr::WrongLength(287))
        );
        assert_eq!(
            Burst::new(SyncPattern::BaseStationData, 2, 0, BitBuffer::zeroed(288)),
            Err(BurstDecodeErr::InvalidTimeslot(2))
        );
    }

    #[test]
    fn test_regions() {
        let burst = Burst::new(SyncPattern::BaseStationVoice, 0, 12, patterned()).unwrap();
        assert_eq!(burst.info_bits().unwrap().len(), 196);
        assert_eq!(burst.timestamp(), 12);

        let frames = burst.voice_frames().unwrap();
        for frame in &frames {
            assert_eq!(frame.len(), VOICE_FRAME_BITS);
        }

        // first frame starts right after the CACH
        assert_eq!(frames[0].get(0).unwrap(), burst.bits().get(24).unwrap());

        // second frame: 36 bits before the sync, 36 after
        assert_eq!(frames[1].get(35).unwrap(), burst.bits().get(131).unwrap());
        assert_eq!(frames[1].get(36).unwrap(), burst.bits().get(180).unwrap());
        assert_eq!(frames[2].get(0).unwrap(), burst.bits().get(216).unwrap());
    }

    #[test]
    fn test_sync_bits() {
        let mut bits = BitBuffer::zeroed(BURST_LENGTH);
        bits.set_int(
            &SYNC_FIELD.collect::<Vec<_>>(),
            SyncPattern::BaseStationData.pattern().unwrap(),
        )
        .unwrap();
        let burst = Burst::new(SyncPattern::BaseStationData, 0, 0, bits).unwrap();
        assert_eq!(
            SyncPattern::from_bits(burst.sync_bits().unwrap()),
            SyncPattern::BaseStationData
        );
    }

    #[test]
    fn test_cach_only_on_base_station() {
        let mut bits = BitBuffer::zeroed(BURST_LENGTH);
        bits.splice(0, &Cach::new(true, 1, Lcss::Single, 0).encode())
            .unwrap();

        let bs = Burst::with_cach_from_bits(SyncPattern::BaseStationData, 1, 0, bits.clone())
            .unwrap();
        assert_eq!(bs.cach().map(|c| c.timeslot()), Some(1));

        let ms = Burst::with_cach_from_bits(SyncPattern::MobileStationData, 1, 0, bits).unwrap();
        assert!(ms.cach().is_none());
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_datetime() {
        let burst = Burst::new(
            SyncPattern::BaseStationData,
            0,
            1_616_554_380_250,
            BitBuffer::zeroed(BURST_LENGTH),
        )
        .unwrap();
        let dt = burst.datetime().unwrap();
        assert_eq!(dt.timestamp_millis(), 1_616_554_380_250);
        assert_eq!(
            "2021-03-24T02:53:00.250",
            dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
        );
    }
}
