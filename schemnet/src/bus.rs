//! Bus expansion
//!
//! A bus label `NAME[start..end]` stands for the member nets `NAME{i}`. Bus entries
//! fan a single member out of a labeled bus wire.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::core::SchemnetError;
use crate::model::{BusEntry, Point, Wire};

/// Parsed `NAME[start..end]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusLabel {
    pub name: String,
    pub range_start: u32,
    pub range_end: u32,
}

impl BusLabel {
    pub fn new(name: impl Into<String>, range_start: u32, range_end: u32) -> Self {
        Self {
            name: name.into(),
            range_start,
            range_end,
        }
    }

    fn bounds(&self) -> (u32, u32) {
        (
            self.range_start.min(self.range_end),
            self.range_start.max(self.range_end),
        )
    }

    /// Member net names, lowest index first regardless of declared direction.
    pub fn expand(&self) -> Vec<String> {
        let (lo, hi) = self.bounds();
        (lo..=hi).map(|i| format!("{}{}", self.name, i)).collect()
    }

    pub fn width(&self) -> u32 {
        self.range_start.abs_diff(self.range_end) + 1
    }

    pub fn contains(&self, index: u32) -> bool {
        let (lo, hi) = self.bounds();
        (lo..=hi).contains(&index)
    }
}

impl fmt::Display for BusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}..{}]", self.name, self.range_start, self.range_end)
    }
}

impl FromStr for BusLabel {
    type Err = SchemnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bus_label(s).ok_or_else(|| SchemnetError::InvalidBusLabel(s.to_string()))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Decimal index without sign or redundant leading zeros.
fn parse_index(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Parse `NAME[start..end]`; anything else is `None`.
pub fn parse_bus_label(label: &str) -> Option<BusLabel> {
    let body = label.strip_suffix(']')?;
    let (name, range) = body.split_once('[')?;
    if !is_identifier(name) {
        return None;
    }
    let (start, end) = range.split_once("..")?;
    Some(BusLabel {
        name: name.to_string(),
        range_start: parse_index(start)?,
        range_end: parse_index(end)?,
    })
}

pub fn format_bus_label(bus: &BusLabel) -> String {
    bus.to_string()
}

/// Members of a bus label string, empty when it does not parse.
pub fn expand_bus_label(label: &str) -> Vec<String> {
    parse_bus_label(label).map(|b| b.expand()).unwrap_or_default()
}

/// Map each resolvable entry's member name to its connection points.
///
/// An entry resolves when the first bus wire whose label names its bus declares a
/// range containing the entry's index. Other entries are dropped.
pub fn resolve_bus_entries(entries: &[BusEntry], wires: &[Wire]) -> BTreeMap<String, Vec<Point>> {
    let mut connections: BTreeMap<String, Vec<Point>> = BTreeMap::new();

    for entry in entries {
        let bus = wires
            .iter()
            .filter_map(|w| w.bus_label.as_deref())
            .filter_map(parse_bus_label)
            .find(|b| b.name == entry.bus_name);

        let Some(bus) = bus else {
            tracing::debug!("Bus entry {} names unknown bus '{}'", entry.id, entry.bus_name);
            continue;
        };
        if !bus.contains(entry.member_index) {
            tracing::debug!(
                "Bus entry {} index {} outside {}",
                entry.id,
                entry.member_index,
                bus
            );
            continue;
        }

        connections
            .entry(entry.member_name())
            .or_default()
            .push(entry.position);
    }

    connections
}

/// Distinct parsed labels of bus wires, in wire order.
pub fn bus_labels(wires: &[Wire]) -> Vec<BusLabel> {
    let mut seen = HashSet::new();
    wires
        .iter()
        .filter(|w| w.is_bus)
        .filter_map(|w| w.bus_label.as_deref())
        .filter(|label| seen.insert(*label))
        .filter_map(parse_bus_label)
        .collect()
}
