//! Reference designators
//!
//! Counters live in a [`RefDesCounter`] owned by each open document, so two
//! documents never share numbering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::library::SymbolLibrary;
use crate::model::ComponentInstance;

/// Per-prefix counters for `{prefix}{n}` references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefDesCounter {
    counters: HashMap<String, u32>,
}

impl RefDesCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free reference for `prefix`, starting at 1.
    pub fn next_ref(&mut self, prefix: &str) -> String {
        let n = self.counters.entry(prefix.to_string()).or_insert(0);
        *n += 1;
        format!("{}{}", prefix, n)
    }

    /// Current value for `prefix`; 0 when nothing has been issued.
    pub fn current(&self, prefix: &str) -> u32 {
        self.counters.get(prefix).copied().unwrap_or(0)
    }

    pub fn set(&mut self, prefix: &str, value: u32) {
        self.counters.insert(prefix.to_string(), value);
    }

    /// Raise counters to the highest number already used by `components`.
    /// References that are not letters followed by digits are ignored.
    pub fn seed_from(&mut self, components: &[ComponentInstance]) {
        for component in components {
            if let Some((prefix, n)) = split_reference(component.reference()) {
                let slot = self.counters.entry(prefix.to_string()).or_insert(0);
                *slot = (*slot).max(n);
            }
        }
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

/// Split `R12` into `("R", 12)`.
pub fn split_reference(reference: &str) -> Option<(&str, u32)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (prefix, digits) = reference.split_at(split);
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
        return None;
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|n| (prefix, n))
}

/// Renumber every component per symbol name, top to bottom then left to right.
///
/// Returns how many components were renamed. Components whose symbol is not in the
/// library keep their reference.
pub fn auto_annotate(
    library: &SymbolLibrary,
    components: &mut [ComponentInstance],
    counter: &mut RefDesCounter,
) -> usize {
    // Prefix -> component indices, in first-seen order
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, component) in components.iter().enumerate() {
        let Some(def) = library.definition_of(component) else {
            continue;
        };
        groups
            .entry(def.name.clone())
            .or_insert_with(|| {
                order.push(def.name.clone());
                Vec::new()
            })
            .push(i);
    }

    let mut renamed = 0;
    for prefix in order {
        let Some(mut members) = groups.remove(&prefix) else {
            continue;
        };
        members.sort_by(|&a, &b| {
            let (pa, pb) = (components[a].position, components[b].position);
            pa.y.partial_cmp(&pb.y)
                .unwrap_or(Ordering::Equal)
                .then(pa.x.partial_cmp(&pb.x).unwrap_or(Ordering::Equal))
        });
        for (n, &i) in members.iter().enumerate() {
            let reference = format!("{}{}", prefix, n + 1);
            if components[i].reference() != reference {
                renamed += 1;
            }
            components[i]
                .properties
                .insert("reference".to_string(), reference);
        }
        counter.set(&prefix, members.len() as u32);
    }

    tracing::debug!("Auto-annotation renamed {} components", renamed);
    renamed
}
