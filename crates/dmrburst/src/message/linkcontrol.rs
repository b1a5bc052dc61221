//! Full link control carried in voice headers and terminators

use std::fmt;

use crate::bits::{span, BitBuffer, BitFieldErr};
use crate::burst::Burst;
use crate::identifier::{Form, Identifier, IdentifierSet, Role};

use super::standard::ServiceOptions;
use super::MessageKind;

const SERVICE_OPTIONS: [usize; 8] = span(16);
const TARGET: [usize; 24] = span(24);
const SOURCE: [usize; 24] = span(48);

/// Voice channel user link control
///
/// Identifies the talker and the called talkgroup or radio at
/// the start and end of every voice call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkControlChannelUser {
    service_options: ServiceOptions,
    target_form: Form,
    target: u32,
    source: u32,
}

impl LinkControlChannelUser {
    fn decode(bits: &BitBuffer, target_form: Form) -> Result<Self, BitFieldErr> {
        Ok(Self {
            service_options: ServiceOptions::new(bits.get_int(&SERVICE_OPTIONS)? as u8),
            target_form,
            target: bits.get_int(&TARGET)? as u32,
            source: bits.get_int(&SOURCE)? as u32,
        })
    }

    /// Call service options
    pub fn service_options(&self) -> ServiceOptions {
        self.service_options
    }

    /// Whether the target is a talkgroup or a radio
    pub fn target_form(&self) -> Form {
        self.target_form
    }

    /// Called talkgroup or radio
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Talking radio
    pub fn source(&self) -> u32 {
        self.source
    }

    pub(crate) fn identifiers(&self, out: &mut IdentifierSet) {
        out.insert(Identifier::radio(self.source, Role::From));
        if self.target_form == Form::Radio {
            out.insert(Identifier::radio(self.target, Role::To));
        } else {
            out.insert(Identifier::talkgroup(self.target, Role::To));
        }
    }
}

impl fmt::Display for LinkControlChannelUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FM:{} TO:{}{} {}",
            self.source,
            if self.target_form == Form::Radio { "" } else { "TG:" },
            self.target,
            self.service_options
        )
    }
}

pub(crate) fn decode_group_voice_channel_user(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::GroupVoiceChannelUser(
        LinkControlChannelUser::decode(block, Form::Talkgroup)?,
    ))
}

pub(crate) fn decode_unit_to_unit_voice_channel_user(
    _burst: &Burst,
    block: &BitBuffer,
) -> Result<MessageKind, BitFieldErr> {
    Ok(MessageKind::UnitToUnitVoiceChannelUser(
        LinkControlChannelUser::decode(block, Form::Radio)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::lc::{new_block, LcOpcode};

    #[test]
    fn test_group_voice_channel_user() {
        let mut block = new_block(LcOpcode::StandardGroupVoiceChannelUser);
        block.set_int(&SERVICE_OPTIONS, 0x40).unwrap();
        block.set_int(&TARGET, 31_100).unwrap();
        block.set_int(&SOURCE, 3_101_234).unwrap();

        let user = LinkControlChannelUser::decode(&block, Form::Talkgroup).unwrap();
        assert!(user.service_options().is_encrypted());
        assert_eq!(user.target(), 31_100);
        assert_eq!(user.source(), 3_101_234);
        assert_eq!(
            "FM:3101234 TO:TG:31100 ENCRYPTED PRIORITY:0",
            &format!("{}", user)
        );

        let mut ids = IdentifierSet::new();
        user.identifiers(&mut ids);
        assert_eq!(
            ids.as_slice(),
            &[
                Identifier::radio(3_101_234, Role::From),
                Identifier::talkgroup(31_100, Role::To),
            ]
        );
    }

    #[test]
    fn test_unit_to_unit_voice_channel_user() {
        let mut block = new_block(LcOpcode::StandardUnitToUnitVoiceChannelUser);
        block.set_int(&TARGET, 55).unwrap();
        block.set_int(&SOURCE, 66).unwrap();

        let user = LinkControlChannelUser::decode(&block, Form::Radio).unwrap();
        assert_eq!(user.target_form(), Form::Radio);
        assert_eq!("FM:66 TO:55 PRIORITY:0", &format!("{}", user));
    }
}
