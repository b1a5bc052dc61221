//! Burst sync patterns

use std::fmt;
use std::str::FromStr;

use phf::phf_map;
use strum::EnumMessage;

/// Broad class of a burst, as implied by its sync pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum_macros::IntoStaticStr)]
pub enum BurstCategory {
    /// Voice superframe bursts
    #[strum(serialize = "VOICE")]
    Voice,

    /// Data and control bursts, which carry a slot type
    #[strum(serialize = "DATA")]
    Data,

    /// Reverse channel and unrecognized bursts
    #[strum(serialize = "OTHER")]
    Other,
}

/// Recognized DMR sync sequences
///
/// The 48-bit sync field sits in the middle of every burst.
/// Voice bursts B through F carry an embedded signalling field
/// instead of a sync; the demodulator tags them by their
/// position in the voice superframe. A superframe which opens
/// with a base station voice sync continues with the `BS_VOICE_B`
/// through `BS_VOICE_F` bursts, which carry a CACH like the
/// sync burst did.
///
/// ```
/// use dmrburst::{BurstCategory, SyncPattern};
///
/// let sync = SyncPattern::from_bits(0xDFF57D75DF5D);
/// assert_eq!(SyncPattern::BaseStationData, sync);
/// assert_eq!(BurstCategory::Data, sync.category());
/// assert_eq!("BS_DATA", sync.as_str());
/// assert_eq!("BS_DATA", &format!("{}", sync));
///
/// assert_eq!(SyncPattern::Unknown, SyncPattern::from_name("HUH"));
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::EnumMessage,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
pub enum SyncPattern {
    /// Base station sourced voice
    #[strum(serialize = "BS_VOICE", detailed_message = "Base station voice")]
    BaseStationVoice,

    /// Base station sourced data
    #[strum(serialize = "BS_DATA", detailed_message = "Base station data")]
    BaseStationData,

    /// Mobile station sourced voice
    #[strum(serialize = "MS_VOICE", detailed_message = "Mobile station voice")]
    MobileStationVoice,

    /// Mobile station sourced data
    #[strum(serialize = "MS_DATA", detailed_message = "Mobile station data")]
    MobileStationData,

    /// Mobile station reverse channel
    #[strum(serialize = "RC", detailed_message = "Reverse channel")]
    ReverseChannel,

    /// Direct mode voice, timeslot 1
    #[strum(
        serialize = "DIRECT_VOICE_TS1",
        detailed_message = "Direct mode voice timeslot 1"
    )]
    DirectVoiceTs1,

    /// Direct mode data, timeslot 1
    #[strum(
        serialize = "DIRECT_DATA_TS1",
        detailed_message = "Direct mode data timeslot 1"
    )]
    DirectDataTs1,

    /// Direct mode voice, timeslot 2
    #[strum(
        serialize = "DIRECT_VOICE_TS2",
        detailed_message = "Direct mode voice timeslot 2"
    )]
    DirectVoiceTs2,

    /// Direct mode data, timeslot 2
    #[strum(
        serialize = "DIRECT_DATA_TS2",
        detailed_message = "Direct mode data timeslot 2"
    )]
    DirectDataTs2,

    /// Base station voice superframe burst B
    #[strum(serialize = "BS_VOICE_B", detailed_message = "Base station voice frame B")]
    BaseStationVoiceFrameB,

    /// Base station voice superframe burst C
    #[strum(serialize = "BS_VOICE_C", detailed_message = "Base station voice frame C")]
    BaseStationVoiceFrameC,

    /// Base station voice superframe burst D
    #[strum(serialize = "BS_VOICE_D", detailed_message = "Base station voice frame D")]
    BaseStationVoiceFrameD,

    /// Base station voice superframe burst E
    #[strum(serialize = "BS_VOICE_E", detailed_message = "Base station voice frame E")]
    BaseStationVoiceFrameE,

    /// Base station voice superframe burst F
    #[strum(serialize = "BS_VOICE_F", detailed_message = "Base station voice frame F")]
    BaseStationVoiceFrameF,

    /// Mobile or direct mode voice superframe burst B
    #[strum(serialize = "VOICE_B", detailed_message = "Voice frame B")]
    VoiceFrameB,

    /// Mobile or direct mode voice superframe burst C
    #[strum(serialize = "VOICE_C", detailed_message = "Voice frame C")]
    VoiceFrameC,

    /// Mobile or direct mode voice superframe burst D
    #[strum(serialize = "VOICE_D", detailed_message = "Voice frame D")]
    VoiceFrameD,

    /// Mobile or direct mode voice superframe burst E
    #[strum(serialize = "VOICE_E", detailed_message = "Voice frame E")]
    VoiceFrameE,

    /// Mobile or direct mode voice superframe burst F
    #[strum(serialize = "VOICE_F", detailed_message = "Voice frame F")]
    VoiceFrameF,

    /// No recognized sync
    #[strum(serialize = "UNKNOWN", detailed_message = "Unknown sync")]
    Unknown,
}

/// Sync field values, 48 bits, first bit in bit 47
static SYNC_PATTERNS: phf::Map<u64, SyncPattern> = phf_map! {
    0x755F_D7DF_75F7u64 => SyncPattern::BaseStationVoice,
    0xDFF5_7D75_DF5Du64 => SyncPattern::BaseStationData,
    0x7F7D_5DD5_7DFDu64 => SyncPattern::MobileStationVoice,
    0xD5D7_F77F_D757u64 => SyncPattern::MobileStationData,
    0x77D5_5F7D_FD77u64 => SyncPattern::ReverseChannel,
    0x5D57_7F77_57FFu64 => SyncPattern::DirectVoiceTs1,
    0xF7FD_D5DD_FD55u64 => SyncPattern::DirectDataTs1,
    0x7DFF_D5F5_5D5Fu64 => SyncPattern::DirectVoiceTs2,
    0xD755_7F5F_F7F5u64 => SyncPattern::DirectDataTs2,
};

/// Width of the sync field, in bits
pub const SYNC_BITS: usize = 48;

const SYNC_MASK: u64 = (1 << SYNC_BITS) - 1;

impl SyncPattern {
    /// Look up an exact 48-bit sync field
    ///
    /// Returns `Unknown` if `bits` is not a recognized sync.
    pub fn from_bits(bits: u64) -> Self {
        SYNC_PATTERNS
            .get(&(bits & SYNC_MASK))
            .copied()
            .unwrap_or(SyncPattern::Unknown)
    }

    /// Find the sync closest to `bits`
    ///
    /// Returns the pattern with the fewest bit errors relative
    /// to `bits`, provided it has no more than `max_errors`
    /// errors, along with the error count. DMR syncs are at
    /// least ten bits apart, so a `max_errors` of up to 4 is
    /// unambiguous.
    pub fn detect(bits: u64, max_errors: u32) -> Option<(Self, u32)> {
        SYNC_PATTERNS
            .entries()
            .map(|(pattern, sync)| (*sync, ((pattern ^ bits) & SYNC_MASK).count_ones()))
            .filter(|&(_, errors)| errors <= max_errors)
            .min_by_key(|&(_, errors)| errors)
    }

    /// The 48-bit sync field, if this pattern has one
    pub fn pattern(&self) -> Option<u64> {
        SYNC_PATTERNS
            .entries()
            .find(|(_, sync)| *sync == self)
            .map(|(pattern, _)| *pattern)
    }

    /// Burst category implied by this sync
    pub fn category(&self) -> BurstCategory {
        match self {
            SyncPattern::BaseStationVoice
            | SyncPattern::MobileStationVoice
            | SyncPattern::DirectVoiceTs1
            | SyncPattern::DirectVoiceTs2
            | SyncPattern::BaseStationVoiceFrameB
            | SyncPattern::BaseStationVoiceFrameC
            | SyncPattern::BaseStationVoiceFrameD
            | SyncPattern::BaseStationVoiceFrameE
            | SyncPattern::BaseStationVoiceFrameF
            | SyncPattern::VoiceFrameB
            | SyncPattern::VoiceFrameC
            | SyncPattern::VoiceFrameD
            | SyncPattern::VoiceFrameE
            | SyncPattern::VoiceFrameF => BurstCategory::Voice,
            SyncPattern::BaseStationData
            | SyncPattern::MobileStationData
            | SyncPattern::DirectDataTs1
            | SyncPattern::DirectDataTs2 => BurstCategory::Data,
            SyncPattern::ReverseChannel | SyncPattern::Unknown => BurstCategory::Other,
        }
    }

    /// True if bursts with this sync carry a CACH
    ///
    /// Only repeater outbound bursts do, including the embedded
    /// bursts of a base station voice superframe.
    pub fn has_cach(&self) -> bool {
        matches!(
            self,
            SyncPattern::BaseStationVoice
                | SyncPattern::BaseStationData
                | SyncPattern::BaseStationVoiceFrameB
                | SyncPattern::BaseStationVoiceFrameC
                | SyncPattern::BaseStationVoiceFrameD
                | SyncPattern::BaseStationVoiceFrameE
                | SyncPattern::BaseStationVoiceFrameF
        )
    }

    /// The embedded burst which follows this one in a voice superframe
    ///
    /// A voice sync burst (A) is followed by B, B by C, and so on
    /// through F. The superframe keeps the source of its sync
    /// burst: base station superframes continue with bursts that
    /// carry a CACH. Returns `None` for F, which ends the
    /// superframe, and for data or unknown syncs.
    ///
    /// ```
    /// use dmrburst::SyncPattern;
    ///
    /// let next = SyncPattern::BaseStationVoice.next_voice_frame();
    /// assert_eq!(Some(SyncPattern::BaseStationVoiceFrameB), next);
    /// assert!(next.unwrap().has_cach());
    ///
    /// let next = SyncPattern::MobileStationVoice.next_voice_frame();
    /// assert_eq!(Some(SyncPattern::VoiceFrameB), next);
    /// assert!(!next.unwrap().has_cach());
    /// ```
    pub fn next_voice_frame(&self) -> Option<Self> {
        match self {
            SyncPattern::BaseStationVoice => Some(SyncPattern::BaseStationVoiceFrameB),
            SyncPattern::BaseStationVoiceFrameB => Some(SyncPattern::BaseStationVoiceFrameC),
            SyncPattern::BaseStationVoiceFrameC => Some(SyncPattern::BaseStationVoiceFrameD),
            SyncPattern::BaseStationVoiceFrameD => Some(SyncPattern::BaseStationVoiceFrameE),
            SyncPattern::BaseStationVoiceFrameE => Some(SyncPattern::BaseStationVoiceFrameF),
            SyncPattern::MobileStationVoice
            | SyncPattern::DirectVoiceTs1
            | SyncPattern::DirectVoiceTs2 => Some(SyncPattern::VoiceFrameB),
            SyncPattern::VoiceFrameB => Some(SyncPattern::VoiceFrameC),
            SyncPattern::VoiceFrameC => Some(SyncPattern::VoiceFrameD),
            SyncPattern::VoiceFrameD => Some(SyncPattern::VoiceFrameE),
            SyncPattern::VoiceFrameE => Some(SyncPattern::VoiceFrameF),
            _ => None,
        }
    }

    /// Look up a sync by its short name
    ///
    /// Returns `Unknown` if `name` is not recognized.
    pub fn from_name(name: &str) -> Self {
        SyncPattern::from_str(name).unwrap_or(SyncPattern::Unknown)
    }

    /// Short name, like "`BS_DATA`"
    pub fn as_str(&self) -> &'static str {
        self.get_serializations()[0]
    }

    /// Human-readable name, like "`Base station data`"
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().unwrap_or_else(|| self.as_str())
    }
}

impl AsRef<str> for SyncPattern {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for SyncPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl fmt::Display for BurstCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = self.into();
        s.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use strum::IntoEnumIterator;

    #[test]
    fn test_names_round_trip() {
        for sync in SyncPattern::iter() {
            assert_eq!(sync, SyncPattern::from_name(sync.as_str()));
            assert!(!sync.as_display_str().is_empty());
        }

        // strict parsing reports unknown names
        assert_eq!(
            Ok(SyncPattern::BaseStationVoiceFrameB),
            SyncPattern::try_from("BS_VOICE_B")
        );
        assert!("bs_data".parse::<SyncPattern>().is_err());
        assert_eq!(SyncPattern::Unknown, SyncPattern::from_name("bs_data"));
    }

    #[test]
    fn test_patterns() {
        let mut with_pattern = 0;
        for sync in SyncPattern::iter() {
            if let Some(pattern) = sync.pattern() {
                assert_eq!(sync, SyncPattern::from_bits(pattern));
                assert_eq!(Some((sync, 0)), SyncPattern::detect(pattern, 4));
                with_pattern += 1;
            }
        }
        assert_eq!(with_pattern, 9);
        assert_eq!(None, SyncPattern::VoiceFrameC.pattern());
        assert_eq!(SyncPattern::Unknown, SyncPattern::from_bits(0));
    }

    #[test]
    fn test_patterns_are_far_apart() {
        let patterns: Vec<u64> = SYNC_PATTERNS.keys().copied().collect();
        for (i, a) in patterns.iter().enumerate() {
            for b in &patterns[i + 1..] {
                assert!((a ^ b).count_ones() >= 10, "{:012X} {:012X}", a, b);
            }
        }
    }

    #[test]
    fn test_detect_with_errors() {
        let noisy = 0xDFF5_7D75_DF5D ^ 0b1001_0000_0001;
        assert_eq!(
            Some((SyncPattern::BaseStationData, 3)),
            SyncPattern::detect(noisy, 4)
        );
        assert_eq!(None, SyncPattern::detect(noisy, 2));
        assert_eq!(SyncPattern::Unknown, SyncPattern::from_bits(noisy));
    }

    #[test]
    fn test_category() {
        assert_eq!(BurstCategory::Voice, SyncPattern::BaseStationVoice.category());
        assert_eq!(BurstCategory::Voice, SyncPattern::VoiceFrameE.category());
        assert_eq!(BurstCategory::Data, SyncPattern::DirectDataTs2.category());
        assert_eq!(BurstCategory::Other, SyncPattern::ReverseChannel.category());
        assert_eq!(BurstCategory::Other, SyncPattern::Unknown.category());
        assert_eq!("DATA", &format!("{}", BurstCategory::Data));

        assert!(SyncPattern::BaseStationData.has_cach());
        assert!(!SyncPattern::MobileStationData.has_cach());
    }

    #[test]
    fn test_voice_superframe() {
        // a base station superframe carries a CACH on every burst
        let mut sync = SyncPattern::BaseStationVoice;
        let mut count = 1;
        while let Some(next) = sync.next_voice_frame() {
            assert!(next.has_cach(), "{}", next);
            assert_eq!(BurstCategory::Voice, next.category());
            assert_eq!(None, next.pattern());
            sync = next;
            count += 1;
        }
        assert_eq!(count, 6);
        assert_eq!(sync, SyncPattern::BaseStationVoiceFrameF);
        assert_eq!("BS_VOICE_C", SyncPattern::BaseStationVoiceFrameC.as_str());

        // mobile and direct mode superframes never do
        let mut sync = SyncPattern::DirectVoiceTs2;
        while let Some(next) = sync.next_voice_frame() {
            assert!(!next.has_cach(), "{}", next);
            sync = next;
        }
        assert_eq!(sync, SyncPattern::VoiceFrameF);
        assert_eq!(None, SyncPattern::BaseStationData.next_voice_frame());
    }
}
