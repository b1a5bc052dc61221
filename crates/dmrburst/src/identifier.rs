//! Identifiers carried by messages

use std::fmt;

/// Who the identified entity belongs to
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum_macros::IntoStaticStr,
)]
pub enum IdentifierClass {
    /// A subscriber, such as a radio or talkgroup
    #[strum(serialize = "USER")]
    User,

    /// Site infrastructure, such as a channel
    #[strum(serialize = "NETWORK")]
    Network,
}

/// What kind of thing is identified
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum_macros::IntoStaticStr,
)]
pub enum Form {
    /// Individual radio ID
    #[strum(serialize = "RADIO")]
    Radio,

    /// Talkgroup ID
    #[strum(serialize = "TALKGROUP")]
    Talkgroup,

    /// Patch group ID
    #[strum(serialize = "PATCH GROUP")]
    PatchGroup,

    /// Logical channel
    #[strum(serialize = "CHANNEL")]
    Channel,
}

/// Role of the identified entity in the message
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum_macros::IntoStaticStr,
)]
pub enum Role {
    /// Destination
    #[strum(serialize = "TO")]
    To,

    /// Source
    #[strum(serialize = "FROM")]
    From,

    /// Broadcast to all
    #[strum(serialize = "BROADCAST")]
    Broadcast,

    /// Neither source nor destination
    #[strum(serialize = "ANY")]
    Any,
}

/// A typed identifier value
///
/// Identifiers are plain values: two identifiers are equal when
/// their class, form, role, and value are all equal.
///
/// ```
/// use dmrburst::{Form, Identifier, Role};
///
/// let tg = Identifier::talkgroup(3100, Role::To);
/// assert_eq!(Form::Talkgroup, tg.form());
/// assert_eq!("TO TALKGROUP:3100", &format!("{}", tg));
/// assert_eq!(tg, Identifier::talkgroup(3100, Role::To));
/// assert_ne!(tg, Identifier::talkgroup(3100, Role::From));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    class: IdentifierClass,
    form: Form,
    role: Role,
    value: u32,
}

impl Identifier {
    /// Identifier from its parts
    pub fn new(class: IdentifierClass, form: Form, role: Role, value: u32) -> Self {
        Self {
            class,
            form,
            role,
            value,
        }
    }

    /// Radio ID
    pub fn radio(value: u32, role: Role) -> Self {
        Self::new(IdentifierClass::User, Form::Radio, role, value)
    }

    /// Talkgroup ID
    pub fn talkgroup(value: u32, role: Role) -> Self {
        Self::new(IdentifierClass::User, Form::Talkgroup, role, value)
    }

    /// Patch group ID
    pub fn patch_group(value: u32, role: Role) -> Self {
        Self::new(IdentifierClass::User, Form::PatchGroup, role, value)
    }

    /// Logical channel, identified by its logical slot number
    pub fn channel(lsn: u32, role: Role) -> Self {
        Self::new(IdentifierClass::Network, Form::Channel, role, lsn)
    }

    /// Identifier class
    pub fn class(&self) -> IdentifierClass {
        self.class
    }

    /// Identifier form
    pub fn form(&self) -> Form {
        self.form
    }

    /// Identifier role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Numeric value
    pub fn value(&self) -> u32 {
        self.value
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role: &'static str = self.role.into();
        let form: &'static str = self.form.into();
        write!(f, "{} {}:{}", role, form, self.value)
    }
}

/// Ordered set of identifiers without duplicates
///
/// Insertion order is preserved. Inserting an identifier which
/// is already present has no effect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IdentifierSet {
    ids: Vec<Identifier>,
}

impl IdentifierSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if it is not already present
    ///
    /// Returns `true` if it was added.
    pub fn insert(&mut self, id: Identifier) -> bool {
        if self.ids.contains(&id) {
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    /// True if `id` is present
    pub fn contains(&self, id: &Identifier) -> bool {
        self.ids.contains(id)
    }

    /// Number of identifiers
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if there are no identifiers
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Identifier> {
        self.ids.iter()
    }

    /// Identifiers in insertion order
    pub fn as_slice(&self) -> &[Identifier] {
        &self.ids
    }

    /// First identifier with the given form and role
    pub fn find(&self, form: Form, role: Role) -> Option<&Identifier> {
        self.ids
            .iter()
            .find(|id| id.form == form && id.role == role)
    }
}

impl FromIterator<Identifier> for IdentifierSet {
    fn from_iter<I: IntoIterator<Item = Identifier>>(iter: I) -> Self {
        let mut out = Self::new();
        for id in iter {
            out.insert(id);
        }
        out
    }
}

impl<'a> IntoIterator for &'a IdentifierSet {
    type Item = &'a Identifier;
    type IntoIter = std::slice::Iter<'a, Identifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for IdentifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            id.fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let ch = Identifier::channel(3, Role::Any);
        assert_eq!(ch.class(), IdentifierClass::Network);
        assert_eq!(ch.form(), Form::Channel);
        assert_eq!(ch.value(), 3);

        let radio = Identifier::radio(1234, Role::From);
        assert_eq!(radio.class(), IdentifierClass::User);
        assert_eq!(radio.role(), Role::From);
        assert_eq!("FROM RADIO:1234", &format!("{}", radio));

        assert_eq!(Form::PatchGroup, Identifier::patch_group(9, Role::To).form());
    }

    #[test]
    fn test_set_rejects_duplicates() {
        let mut set = IdentifierSet::new();
        assert!(set.insert(Identifier::radio(1, Role::From)));
        assert!(set.insert(Identifier::talkgroup(2, Role::To)));
        assert!(!set.insert(Identifier::radio(1, Role::From)));

        // same value, different form
        assert!(set.insert(Identifier::radio(2, Role::To)));
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.iter().map(|id| id.value()).collect::<Vec<_>>(),
            vec![1, 2, 2]
        );
        assert_eq!(
            set.find(Form::Talkgroup, Role::To),
            Some(&Identifier::talkgroup(2, Role::To))
        );
        assert!(set.find(Form::Channel, Role::Any).is_none());
        assert_eq!(
            "FROM RADIO:1 TO TALKGROUP:2 TO RADIO:2",
            &format!("{}", set)
        );

        let collected: IdentifierSet = set.iter().chain(set.iter()).copied().collect();
        assert_eq!(collected, set);
    }
}
