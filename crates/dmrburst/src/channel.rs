//! Logical channels and their physical frequencies
//!
//! Trunked DMR sites number their timeslots with a *logical slot
//! number* (LSN). Each repeater carries two timeslots, so
//! LSN 1 and 2 are repeater 1, LSN 3 and 4 are repeater 2,
//! and so on. The site operator configures which frequency
//! pair each LSN lives on; we receive that as a
//! [`TimeslotFrequencyTable`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::identifier::{Identifier, Role};

/// Default channel bandwidth, in Hz
pub const DEFAULT_BANDWIDTH_HZ: u32 = 12_500;

/// Convert a one-based wire field to a logical slot number
///
/// Wire value `v` is slot `v - 1`. A wire value of zero names
/// no slot at all and yields `None`.
///
/// ```
/// use dmrburst::lsn_from_wire;
///
/// assert_eq!(Some(3), lsn_from_wire(4));
/// assert_eq!(Some(0), lsn_from_wire(1));
/// assert_eq!(None, lsn_from_wire(0));
/// ```
pub fn lsn_from_wire(value: u64) -> Option<u32> {
    let lsn = value.checked_sub(1)?;
    u32::try_from(lsn).ok()
}

/// Frequencies assigned to one logical slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeslotFrequency {
    number: u32,
    downlink_hz: u64,
    uplink_hz: u64,
    bandwidth_hz: u32,
}

impl TimeslotFrequency {
    /// Assign `downlink_hz` and `uplink_hz` to LSN `number`
    ///
    /// The bandwidth defaults to 12.5 kHz.
    pub fn new(number: u32, downlink_hz: u64, uplink_hz: u64) -> Self {
        Self {
            number,
            downlink_hz,
            uplink_hz,
            bandwidth_hz: DEFAULT_BANDWIDTH_HZ,
        }
    }

    /// Override the channel bandwidth
    pub fn with_bandwidth(mut self, bandwidth_hz: u32) -> Self {
        self.bandwidth_hz = bandwidth_hz;
        self
    }

    /// Logical slot number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Repeater transmit frequency, in Hz
    pub fn downlink_hz(&self) -> u64 {
        self.downlink_hz
    }

    /// Repeater receive frequency, in Hz
    pub fn uplink_hz(&self) -> u64 {
        self.uplink_hz
    }

    /// Channel bandwidth, in Hz
    pub fn bandwidth_hz(&self) -> u32 {
        self.bandwidth_hz
    }

    /// Repeater transmit frequency, in MHz
    pub fn downlink_mhz(&self) -> f64 {
        self.downlink_hz as f64 / 1.0e6
    }

    /// Repeater receive frequency, in MHz
    pub fn uplink_mhz(&self) -> f64 {
        self.uplink_hz as f64 / 1.0e6
    }
}

/// Map from logical slot number to frequencies
///
/// Tables are immutable once built. To change an entry, build
/// a new table; see [`SharedTimeslotTable`].
///
/// ```
/// use dmrburst::{TimeslotFrequency, TimeslotFrequencyTable};
///
/// let table: TimeslotFrequencyTable = [
///     TimeslotFrequency::new(3, 451_125_000, 456_125_000),
///     TimeslotFrequency::new(4, 451_125_000, 456_125_000),
/// ]
/// .into_iter()
/// .collect();
///
/// let phys = table.resolve(3).unwrap();
/// assert_eq!(phys.repeater(), 2);
/// assert_eq!(phys.timeslot(), 1);
/// assert!(table.resolve(5).is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TimeslotFrequencyTable {
    entries: BTreeMap<u32, TimeslotFrequency>,
}

impl TimeslotFrequencyTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Frequencies for `lsn`, if known
    pub fn get(&self, lsn: u32) -> Option<&TimeslotFrequency> {
        self.entries.get(&lsn)
    }

    /// Physical channel for `lsn`
    ///
    /// A missing entry is `None`, never an error.
    pub fn resolve(&self, lsn: u32) -> Option<PhysicalChannel> {
        self.get(lsn).map(|freq| PhysicalChannel::new(lsn, *freq))
    }

    /// Copy of this table with `entry` added or replaced
    pub fn with_entry(&self, entry: TimeslotFrequency) -> Self {
        let mut out = self.clone();
        out.entries.insert(entry.number, entry);
        out
    }

    /// Copy of this table without `lsn`
    pub fn without_entry(&self, lsn: u32) -> Self {
        let mut out = self.clone();
        out.entries.remove(&lsn);
        out
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in LSN order
    pub fn iter(&self) -> impl Iterator<Item = &TimeslotFrequency> {
        self.entries.values()
    }
}

impl FromIterator<TimeslotFrequency> for TimeslotFrequencyTable {
    fn from_iter<I: IntoIterator<Item = TimeslotFrequency>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|tf| (tf.number, tf)).collect(),
        }
    }
}

/// A logical slot resolved to a repeater and frequencies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PhysicalChannel {
    lsn: u32,
    frequency: TimeslotFrequency,
}

impl PhysicalChannel {
    fn new(lsn: u32, frequency: TimeslotFrequency) -> Self {
        Self { lsn, frequency }
    }

    /// Logical slot number
    pub fn lsn(&self) -> u32 {
        self.lsn
    }

    /// One-based repeater (logical channel) number
    pub fn repeater(&self) -> u32 {
        repeater_of(self.lsn)
    }

    /// One-based timeslot on the repeater
    pub fn timeslot(&self) -> u32 {
        timeslot_of(self.lsn)
    }

    /// Assigned frequencies
    pub fn frequency(&self) -> &TimeslotFrequency {
        &self.frequency
    }
}

impl fmt::Display for PhysicalChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LSN:{} RPT:{} TS:{} {:.6} MHz",
            self.lsn,
            self.repeater(),
            self.timeslot(),
            self.frequency.downlink_mhz()
        )
    }
}

fn repeater_of(lsn: u32) -> u32 {
    if lsn == 0 {
        0
    } else {
        (lsn + 1) / 2
    }
}

fn timeslot_of(lsn: u32) -> u32 {
    if lsn == 0 {
        0
    } else {
        ((lsn - 1) % 2) + 1
    }
}

/// A logical channel referenced by a message
///
/// Holds the logical slot number and, once a table has been
/// [applied](DmrChannel::apply), the frequencies for it. The
/// channel never holds the table itself.
///
/// A one-based wire field of zero yields an *unassigned*
/// channel. It never resolves and is not reported as an
/// identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DmrChannel {
    lsn: u32,
    assigned: bool,
    frequency: Option<TimeslotFrequency>,
}

impl DmrChannel {
    /// Channel for logical slot `lsn`
    pub fn new(lsn: u32) -> Self {
        Self {
            lsn,
            assigned: true,
            frequency: None,
        }
    }

    /// Channel which names no logical slot
    pub fn unassigned() -> Self {
        Self {
            lsn: 0,
            assigned: false,
            frequency: None,
        }
    }

    /// Channel for a one-based wire LSN field
    pub fn from_wire(value: u64) -> Self {
        match lsn_from_wire(value) {
            Some(lsn) => Self::new(lsn),
            None => Self::unassigned(),
        }
    }

    /// Channel for a repeater number and timeslot
    ///
    /// `channel` and `timeslot` are both one-based, as carried in
    /// standard channel grants. Channel 0 yields LSN 0.
    pub fn from_channel_timeslot(channel: u32, timeslot: u32) -> Self {
        if channel == 0 {
            return Self::new(0);
        }
        Self::new((channel - 1) * 2 + timeslot)
    }

    /// Logical slot number
    ///
    /// Zero for an unassigned channel. Use
    /// [`is_assigned()`](DmrChannel::is_assigned) to tell it
    /// apart from LSN 0.
    pub fn lsn(&self) -> u32 {
        self.lsn
    }

    /// False if the message named no logical slot
    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    /// One-based repeater number, or 0 for LSN 0
    pub fn repeater(&self) -> u32 {
        repeater_of(self.lsn)
    }

    /// One-based timeslot, or 0 for LSN 0
    pub fn timeslot(&self) -> u32 {
        timeslot_of(self.lsn)
    }

    /// Resolve against `table`
    ///
    /// Replaces any previous resolution. If the table has no
    /// entry for this channel, the channel becomes unresolved.
    /// Applying the same table again has no further effect.
    pub fn apply(&mut self, table: &TimeslotFrequencyTable) {
        self.frequency = if self.assigned {
            table.get(self.lsn).copied()
        } else {
            None
        };
    }

    /// Frequencies from the most recently applied table
    pub fn frequency(&self) -> Option<&TimeslotFrequency> {
        self.frequency.as_ref()
    }

    /// Physical channel from the most recently applied table
    pub fn physical(&self) -> Option<PhysicalChannel> {
        self.frequency
            .map(|freq| PhysicalChannel::new(self.lsn, freq))
    }

    /// Identifier for this channel, if it is assigned
    pub fn identifier(&self, role: Role) -> Option<Identifier> {
        self.assigned.then(|| Identifier::channel(self.lsn, role))
    }
}

impl fmt::Display for DmrChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.assigned {
            return write!(f, "LSN:NONE");
        }
        write!(f, "LSN:{}", self.lsn)?;
        if let Some(freq) = &self.frequency {
            write!(f, " {:.6} MHz", freq.downlink_mhz())?;
        }
        Ok(())
    }
}

/// Timeslot table shared between a decoder and its updaters
///
/// Frequency announcements on the control channel may change
/// the table while bursts are being decoded. Readers take a
/// [`snapshot()`](SharedTimeslotTable::snapshot), which is an
/// `Arc` to an immutable table. Writers build a new table and
/// swap it in. The lock is held only to clone or replace the
/// `Arc`.
///
/// ```
/// use dmrburst::{SharedTimeslotTable, TimeslotFrequency};
///
/// let shared = SharedTimeslotTable::default();
/// let before = shared.snapshot();
/// shared.update(TimeslotFrequency::new(1, 451_000_000, 456_000_000));
///
/// assert!(before.get(1).is_none());
/// assert!(shared.snapshot().get(1).is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct SharedTimeslotTable {
    inner: Arc<RwLock<Arc<TimeslotFrequencyTable>>>,
}

impl SharedTimeslotTable {
    /// Share `table`
    pub fn new(table: TimeslotFrequencyTable) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    /// The current table
    pub fn snapshot(&self) -> Arc<TimeslotFrequencyTable> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the whole table
    pub fn replace(&self, table: TimeslotFrequencyTable) {
        self.swap(|_| table);
    }

    /// Add or replace one entry
    pub fn update(&self, entry: TimeslotFrequency) {
        self.swap(|current| current.with_entry(entry));
    }

    /// Remove one entry
    pub fn remove(&self, lsn: u32) {
        self.swap(|current| current.without_entry(lsn));
    }

    fn swap<F>(&self, build: F)
    where
        F: FnOnce(&TimeslotFrequencyTable) -> TimeslotFrequencyTable,
    {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current: &TimeslotFrequencyTable = &guard;
        let next = build(current);
        *guard = Arc::new(next);
    }
}

impl From<TimeslotFrequencyTable> for SharedTimeslotTable {
    fn from(table: TimeslotFrequencyTable) -> Self {
        Self::new(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    fn table() -> TimeslotFrequencyTable {
        [
            TimeslotFrequency::new(1, 451_000_000, 456_000_000),
            TimeslotFrequency::new(2, 451_000_000, 456_000_000),
            TimeslotFrequency::new(3, 451_125_000, 456_125_000),
            TimeslotFrequency::new(4, 451_125_000, 456_125_000).with_bandwidth(6_250),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_lsn_mapping() {
        const EXPECT: &[(u32, u32, u32)] = &[
            (0, 0, 0),
            (1, 1, 1),
            (2, 1, 2),
            (3, 2, 1),
            (4, 2, 2),
            (9, 5, 1),
        ];
        for &(lsn, repeater, timeslot) in EXPECT {
            let ch = DmrChannel::new(lsn);
            assert_eq!(ch.repeater(), repeater, "lsn {}", lsn);
            assert_eq!(ch.timeslot(), timeslot, "lsn {}", lsn);
            if lsn > 0 {
                assert_eq!(DmrChannel::from_channel_timeslot(repeater, timeslot), ch);
            }
        }
        assert_eq!(DmrChannel::from_channel_timeslot(0, 2).lsn(), 0);
        assert_eq!(DmrChannel::from_wire(4).lsn(), 3);
        assert_eq!(DmrChannel::from_wire(1).lsn(), 0);
        assert!(DmrChannel::from_wire(1).is_assigned());
    }

    #[test]
    fn test_unassigned_channel() {
        let table: TimeslotFrequencyTable =
            [TimeslotFrequency::new(0, 450_000_000, 455_000_000)]
                .into_iter()
                .collect();

        // wire 1 is LSN 0, which the table knows
        let mut lsn0 = DmrChannel::from_wire(1);
        lsn0.apply(&table);
        assert!(lsn0.physical().is_some());
        assert_eq!(lsn0.identifier(Role::Any), Some(Identifier::channel(0, Role::Any)));

        // wire 0 names no slot and never resolves
        let mut none = DmrChannel::from_wire(0);
        assert!(!none.is_assigned());
        assert_ne!(none, lsn0);
        none.apply(&table);
        assert!(none.frequency().is_none());
        assert!(none.physical().is_none());
        assert_eq!(none.identifier(Role::Any), None);
        assert_eq!("LSN:NONE", &format!("{}", none));
        assert_eq!(DmrChannel::unassigned(), DmrChannel::from_wire(0));
    }

    #[test]
    fn test_apply_is_idempotent_and_replaces() {
        let table = table();
        let mut ch = DmrChannel::new(3);
        assert!(ch.physical().is_none());
        assert_eq!("LSN:3", &format!("{}", ch));

        ch.apply(&table);
        let once = ch;
        ch.apply(&table);
        assert_eq!(once, ch);
        assert_eq!(ch.frequency().map(|f| f.downlink_hz()), Some(451_125_000));
        assert_eq!("LSN:3 451.125000 MHz", &format!("{}", ch));

        let other: TimeslotFrequencyTable =
            [TimeslotFrequency::new(3, 460_000_000, 465_000_000)].into_iter().collect();
        ch.apply(&other);
        assert_eq!(ch.frequency().map(|f| f.downlink_hz()), Some(460_000_000));

        // missing entry clears the resolution
        ch.apply(&TimeslotFrequencyTable::new());
        assert!(ch.frequency().is_none());
    }

    #[test]
    fn test_resolve() {
        let table = table();
        let phys = table.resolve(4).unwrap();
        assert_eq!(phys.lsn(), 4);
        assert_eq!(phys.repeater(), 2);
        assert_eq!(phys.timeslot(), 2);
        assert_eq!(phys.frequency().bandwidth_hz(), 6_250);
        assert_approx_eq!(phys.frequency().downlink_mhz(), 451.125);
        assert_approx_eq!(phys.frequency().uplink_mhz(), 456.125);
        assert_eq!("LSN:4 RPT:2 TS:2 451.125000 MHz", &format!("{}", phys));

        assert!(table.resolve(0).is_none());
        assert!(table.resolve(17).is_none());
        assert_eq!(table.len(), 4);
        assert_eq!(
            table.iter().map(|tf| tf.number()).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn test_shared_table() {
        let shared = SharedTimeslotTable::new(table());
        let snap = shared.snapshot();

        shared.update(TimeslotFrequency::new(3, 460_000_000, 465_000_000));
        shared.remove(1);

        // old snapshot is unaffected
        assert_eq!(snap.get(3).map(|f| f.downlink_hz()), Some(451_125_000));
        assert!(snap.get(1).is_some());

        let now = shared.snapshot();
        assert_eq!(now.get(3).map(|f| f.downlink_hz()), Some(460_000_000));
        assert!(now.get(1).is_none());

        shared.replace(TimeslotFrequencyTable::new());
        assert!(shared.snapshot().is_empty());
    }

    #[test]
    fn test_shared_table_across_threads() {
        let shared = SharedTimeslotTable::default();
        let writer = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for lsn in 1..=32 {
                    shared.update(TimeslotFrequency::new(lsn, 450_000_000, 455_000_000));
                }
            })
        };

        // every snapshot is a complete table: 1..=n for some n
        for _ in 0..100 {
            let snap = shared.snapshot();
            let n = snap.len() as u32;
            assert!(snap.iter().map(|tf| tf.number()).eq(1..=n));
        }

        writer.join().unwrap();
        assert_eq!(shared.snapshot().len(), 32);
    }
}
