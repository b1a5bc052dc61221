//! Voice bursts

use std::fmt;

use crate::bits::{BitBuffer, BitFieldErr};
use crate::burst::Burst;
use crate::sync::SyncPattern;

use super::MessageKind;

/// Position of a burst within the six-burst voice superframe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VoiceFrame {
    /// Burst A, which carries the voice sync
    A,
    /// Burst B
    B,
    /// Burst C
    C,
    /// Burst D
    D,
    /// Burst E
    E,
    /// Burst F
    F,
}

impl VoiceFrame {
    fn from_sync(sync: SyncPattern) -> Self {
        match sync {
            SyncPattern::BaseStationVoiceFrameB | SyncPattern::VoiceFrameB => VoiceFrame::B,
            SyncPattern::BaseStationVoiceFrameC | SyncPattern::VoiceFrameC => VoiceFrame::C,
            SyncPattern::BaseStationVoiceFrameD | SyncPattern::VoiceFrameD => VoiceFrame::D,
            SyncPattern::BaseStationVoiceFrameE | SyncPattern::VoiceFrameE => VoiceFrame::E,
            SyncPattern::BaseStationVoiceFrameF | SyncPattern::VoiceFrameF => VoiceFrame::F,
            _ => VoiceFrame::A,
        }
    }
}

impl fmt::Display for VoiceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            VoiceFrame::A => "A",
            VoiceFrame::B => "B",
            VoiceFrame::C => "C",
            VoiceFrame::D => "D",
            VoiceFrame::E => "E",
            VoiceFrame::F => "F",
        };
        letter.fmt(f)
    }
}

/// One burst of a voice superframe
///
/// Carries three 72-bit vocoder frames. We do not decode
/// the audio.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VoiceBurst {
    frame: VoiceFrame,
    vocoder: [BitBuffer; 3],
}

impl VoiceBurst {
    /// Superframe position
    pub fn frame(&self) -> VoiceFrame {
        self.frame
    }

    /// The three vocoder frames, in transmission order
    pub fn vocoder_frames(&self) -> &[BitBuffer; 3] {
        &self.vocoder
    }
}

impl fmt::Display for VoiceBurst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VOICE FRAME {}", self.frame)
    }
}

pub(crate) fn decode_voice(burst: &Burst, _block: &BitBuffer) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::Voice(VoiceBurst {
        frame: VoiceFrame::from_sync(burst.sync()),
        vocoder: burst.voice_frames()?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::burst::BURST_LENGTH;

    #[test]
    fn test_decode_voice() {
        let bits: BitBuffer = (0..BURST_LENGTH).map(|i| i < 96).collect();
        let burst = Burst::new(SyncPattern::VoiceFrameD, 1, 0, bits).unwrap();
        match decode_voice(&burst, burst.bits()).unwrap() {
            MessageKind::Voice(voice) => {
                assert_eq!(voice.frame(), VoiceFrame::D);
                assert_eq!("VOICE FRAME D", &format!("{}", voice));

                // first frame is bits 24..96, all ones
                assert!(voice.vocoder_frames()[0].iter().all(|b| b));
                assert!(voice.vocoder_frames()[2].iter().all(|b| !b));
            }
            _ => unreachable!(),
        }

        assert_eq!(
            VoiceFrame::A,
            VoiceFrame::from_sync(SyncPattern::MobileStationVoice)
        );
        assert_eq!(
            VoiceFrame::E,
            VoiceFrame::from_sync(SyncPattern::BaseStationVoiceFrameE)
        );
    }
}
