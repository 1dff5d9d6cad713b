//! Net naming and label merge
//!
//! Candidate nets that carry the same label name are unioned, then each merged
//! net gets its name from (in order) a label, a power symbol, a hand-written wire
//! tag, or a synthesized `net_{n}` / `Net{n}` pair. Bus nets ignore labels and
//! take their bus label as name.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::graph::{CandidateNet, PlacedPin};
use super::ConnectivityOptions;
use crate::library::SymbolLibrary;
use crate::model::{ComponentInstance, GridPoint, Net, NetLabel, PinRef, Point, Wire};

/// Disjoint-set forest with path halving.
#[derive(Debug, Clone)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Net tags that look machine-generated are never shown as names.
pub fn is_auto_generated_tag(tag: &str) -> bool {
    let tag = tag.trim();
    tag.is_empty() || tag.contains("net_") || tag.contains("NET_")
}

/// Finished nets of one sheet, with lookups by coordinate, pin and name.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    nets: Vec<Net>,
    point_index: HashMap<GridPoint, usize>,
    pin_index: HashMap<PinRef, usize>,
}

impl Netlist {
    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    pub fn into_nets(self) -> Vec<Net> {
        self.nets
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Net> {
        self.nets.iter()
    }

    /// Signal net whose node set contains the quantized `point`.
    pub fn net_at(&self, point: &Point) -> Option<&Net> {
        self.point_index.get(&point.grid()).map(|&i| &self.nets[i])
    }

    pub fn net_of_pin(&self, pin: &PinRef) -> Option<&Net> {
        self.pin_index.get(pin).map(|&i| &self.nets[i])
    }

    pub fn net_named(&self, name: &str) -> Option<&Net> {
        self.nets.iter().find(|n| n.name == name)
    }
}

/// Everything naming needs to know about the sheet being assembled.
pub(crate) struct NamingInput<'a> {
    pub library: &'a SymbolLibrary,
    pub components: &'a [ComponentInstance],
    pub wires: &'a [Wire],
    pub labels: &'a [NetLabel],
    pub pins: &'a [PlacedPin],
    pub options: &'a ConnectivityOptions,
}

/// Merge candidates that share a label name and name the result.
pub(crate) fn assemble(input: &NamingInput<'_>, candidates: Vec<CandidateNet>) -> Netlist {
    let mut at_point: HashMap<GridPoint, Vec<usize>> = HashMap::new();
    for (i, candidate) in candidates.iter().enumerate().filter(|(_, c)| !c.is_bus) {
        for point in &candidate.points {
            at_point.entry(*point).or_default().push(i);
        }
    }

    // Label name -> every candidate the label touches
    let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
    for label in input.labels {
        if let Some(hits) = at_point.get(&label.position.grid()) {
            by_name.entry(label.name.as_str()).or_default().extend(hits);
        }
    }

    let mut uf = UnionFind::new(candidates.len());
    for members in by_name.values() {
        if let Some((&first, rest)) = members.split_first() {
            for &other in rest {
                uf.union(first, other);
            }
        }
    }

    // Group by root, ordered by first appearance
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for i in 0..candidates.len() {
        let root = uf.find(i);
        let g = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(i);
    }

    if groups.len() < candidates.len() {
        tracing::debug!(
            "Label merge joined {} candidate nets into {}",
            candidates.len(),
            groups.len()
        );
    }

    let mut netlist = Netlist::default();
    for (n, group) in groups.iter().enumerate() {
        let mut pins: Vec<usize> = Vec::new();
        let mut wires: BTreeSet<usize> = BTreeSet::new();
        let mut points: HashSet<GridPoint> = HashSet::new();
        for &c in group {
            pins.extend(&candidates[c].pins);
            wires.extend(&candidates[c].wires);
            points.extend(&candidates[c].points);
        }

        let is_bus = group.iter().any(|&c| candidates[c].is_bus);
        let name = if is_bus {
            bus_net_name(input, &wires)
        } else {
            net_name(input, &pins, &wires, &points)
        };
        let counter = n + 1;
        let (id, name) = match name {
            Some(name) => (name.clone(), name),
            None => (format!("net_{}", counter), format!("Net{}", counter)),
        };

        let idx = netlist.nets.len();
        let pin_refs: Vec<PinRef> = pins.iter().map(|&p| input.pins[p].pin_ref.clone()).collect();
        for pin in &pin_refs {
            netlist.pin_index.entry(pin.clone()).or_insert(idx);
        }
        if !is_bus {
            for point in points {
                netlist.point_index.entry(point).or_insert(idx);
            }
        }
        netlist.nets.push(Net {
            id,
            name,
            pin_refs,
            wire_ids: wires.iter().map(|&w| input.wires[w].id.clone()).collect(),
            net_class_id: None,
            sheet_path: None,
        });
    }

    netlist
}

fn net_name(
    input: &NamingInput<'_>,
    pins: &[usize],
    wires: &BTreeSet<usize>,
    points: &HashSet<GridPoint>,
) -> Option<String> {
    // (a) label
    if let Some(label) = input
        .labels
        .iter()
        .find(|l| points.contains(&l.position.grid()))
    {
        return Some(label.name.clone());
    }

    // (b) power symbol
    for &p in pins {
        let component = &input.components[input.pins[p].component];
        if let Some(def) = input.library.definition_of(component) {
            if input.options.power_symbols.iter().any(|s| *s == def.name) {
                return Some(def.name.clone());
            }
        }
    }

    // (c) hand-written wire tag
    wires
        .iter()
        .filter_map(|&w| input.wires[w].net_tag.as_deref())
        .find(|tag| !is_auto_generated_tag(tag))
        .map(str::to_string)
}

fn bus_net_name(input: &NamingInput<'_>, wires: &BTreeSet<usize>) -> Option<String> {
    wires
        .iter()
        .find_map(|&w| input.wires[w].bus_label.clone())
        .filter(|label| !label.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find_transitive() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(1, 2);
        uf.union(3, 4);
        assert_eq!(uf.find(0), uf.find(2));
        assert_eq!(uf.find(3), uf.find(4));
        assert_ne!(uf.find(0), uf.find(4));
    }

    #[test]
    fn test_auto_generated_tags() {
        assert!(is_auto_generated_tag("net_17"));
        assert!(is_auto_generated_tag("NET_3"));
        assert!(is_auto_generated_tag("  "));
        assert!(!is_auto_generated_tag("SDA"));
        assert!(!is_auto_generated_tag("Net1"));
    }
}
