//! Neighbor table — every node heard within radio range
//!
//! A fixed-capacity, insertion-ordered list of the neighbors whose hellos
//! we have processed. Entries are created on the first hello from an unseen
//! address, refreshed on every later one, and never removed; once the table
//! is full, new addresses are turned away.
//!
//! Lookups are linear scans. The table holds at most a few dozen entries, and
//! a Vec keeps insertion order (which breaks selector ties) for free.

use super::trust::clamp_trust;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// 2-byte link-layer address of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeAddress([u8; 2]);

impl NodeAddress {
    pub const fn new(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }

    /// Link address embedded in an IP address: its last two octets
    pub fn from_ip(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => {
                let o = v4.octets();
                Self([o[2], o[3]])
            }
            IpAddr::V6(v6) => {
                let o = v6.octets();
                Self([o[14], o[15]])
            }
        }
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}:{:02x}", self.0[0], self.0[1])
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid node address {0:?}: expected two hex octets like 0a:1f")]
pub struct AddressParseError(String);

impl FromStr for NodeAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AddressParseError(s.to_string());
        let (hi, lo) = s.split_once(':').ok_or_else(err)?;
        let hi = u8::from_str_radix(hi, 16).map_err(|_| err())?;
        let lo = u8::from_str_radix(lo, 16).map_err(|_| err())?;
        Ok(Self([hi, lo]))
    }
}

/// What we know about one neighbor
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRecord {
    pub(crate) address: NodeAddress,
    /// Confidence in this neighbor, always within [0.0, 1.0]
    pub(crate) trust: f32,
    /// Energy the neighbor last advertised
    pub(crate) residual_energy: u16,
    /// Host clock (ms) of the last processed hello
    pub(crate) last_seen: u64,
}

impl NeighborRecord {
    pub fn address(&self) -> NodeAddress {
        self.address
    }

    pub fn trust(&self) -> f32 {
        self.trust
    }

    pub fn residual_energy(&self) -> u16 {
        self.residual_energy
    }

    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Not refreshed within `timeout` ms of `now`
    pub fn is_stale(&self, now: u64, timeout: u64) -> bool {
        now.saturating_sub(self.last_seen) > timeout
    }
}

/// Why an upsert left the table untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TableFull,
}

/// Result of [`NeighborTable::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Rejected(RejectReason),
}

/// Bounded, insertion-ordered neighbor table
#[derive(Debug, Clone)]
pub struct NeighborTable {
    entries: Vec<NeighborRecord>,
    capacity: usize,
}

impl NeighborTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a hello from `address`.
    ///
    /// Known neighbors are overwritten in place; unknown ones are appended
    /// while there is room, otherwise rejected without touching the table.
    pub fn upsert(&mut self, address: NodeAddress, energy: u16, trust: f32, now: u64) -> UpsertOutcome {
        let trust = clamp_trust(trust);

        if let Some(record) = self.get_mut(&address) {
            record.residual_energy = energy;
            record.trust = trust;
            record.last_seen = now;
            return UpsertOutcome::Updated;
        }

        if self.is_full() {
            return UpsertOutcome::Rejected(RejectReason::TableFull);
        }

        self.entries.push(NeighborRecord {
            address,
            trust,
            residual_energy: energy,
            last_seen: now,
        });
        UpsertOutcome::Inserted
    }

    /// Insertion-order view of every record
    pub fn iter(&self) -> std::slice::Iter<'_, NeighborRecord> {
        self.entries.iter()
    }

    pub fn get(&self, address: &NodeAddress) -> Option<&NeighborRecord> {
        self.entries.iter().find(|r| r.address == *address)
    }

    pub(crate) fn get_mut(&mut self, address: &NodeAddress) -> Option<&mut NeighborRecord> {
        self.entries.iter_mut().find(|r| r.address == *address)
    }

    pub fn contains(&self, address: &NodeAddress) -> bool {
        self.get(address).is_some()
    }

    /// Records not heard from within `timeout` ms. Reporting only: stale
    /// neighbors stay in the table and stay selectable.
    pub fn stale(&self, now: u64, timeout: u64) -> impl Iterator<Item = &NeighborRecord> {
        self.entries.iter().filter(move |r| r.is_stale(now, timeout))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }
}

impl<'a> IntoIterator for &'a NeighborTable {
    type Item = &'a NeighborRecord;
    type IntoIter = std::slice::Iter<'a, NeighborRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
