//! Net classes
//!
//! Routing constraints grouped by net name pattern. Assignment only looks at the
//! net's name, so it runs after naming and hierarchy resolution.

use serde::{Deserialize, Serialize};

use crate::model::Net;

/// Id of the fallback class every unmatched net belongs to.
pub const DEFAULT_NET_CLASS_ID: &str = "nc_default";

const DEFAULT_NET_CLASS_COLOR: &str = "#44dd88";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetClassConstraints {
    pub clearance: f64,
    pub trace_width: f64,
    pub via_size: f64,
    pub via_drill: f64,
}

impl Default for NetClassConstraints {
    fn default() -> Self {
        Self {
            clearance: 8.0,
            trace_width: 10.0,
            via_size: 24.0,
            via_drill: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetClass {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub color: String,
    pub constraints: NetClassConstraints,
    /// Exact names or `*` globs, matched case-insensitively
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl NetClass {
    fn builtin(
        id: &str,
        name: &str,
        description: &str,
        color: &str,
        constraints: NetClassConstraints,
        patterns: &[&str],
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            color: color.to_string(),
            constraints,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn matches(&self, net_name: &str) -> bool {
        self.patterns.iter().any(|p| pattern_matches(p, net_name))
    }
}

/// Default, Power and HighSpeed.
pub fn default_net_classes() -> Vec<NetClass> {
    vec![
        NetClass::builtin(
            DEFAULT_NET_CLASS_ID,
            "Default",
            "Standard signal nets",
            DEFAULT_NET_CLASS_COLOR,
            NetClassConstraints::default(),
            &[],
        ),
        NetClass::builtin(
            "nc_power",
            "Power",
            "Power supply rails (VCC, GND, +5V, etc.)",
            "#ff6644",
            NetClassConstraints {
                clearance: 10.0,
                trace_width: 20.0,
                via_size: 32.0,
                via_drill: 16.0,
            },
            &["VCC", "GND", "VDD", "VSS", "+*V", "-*V", "3V3", "5V", "12V"],
        ),
        NetClass::builtin(
            "nc_highspeed",
            "HighSpeed",
            "High-speed signals requiring controlled impedance",
            "#aa44ff",
            NetClassConstraints {
                clearance: 6.0,
                trace_width: 8.0,
                via_size: 20.0,
                via_drill: 10.0,
            },
            &["CLK*", "SCK*", "MISO*", "MOSI*", "SDA*", "SCL*", "TX*", "RX*", "USB*"],
        ),
    ]
}

/// Exact match, or a case-insensitive glob where `*` matches any run of characters.
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    if pattern == name {
        return true;
    }
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let name: Vec<char> = name.to_lowercase().chars().collect();

    let (mut p, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while n < name.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, n));
            p += 1;
        } else if p < pattern.len() && pattern[p] == name[n] {
            p += 1;
            n += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            n = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Id of the first non-default class whose patterns match the net name.
pub fn assign_net_class(net: &Net, classes: &[NetClass]) -> String {
    if net.name.is_empty() {
        return DEFAULT_NET_CLASS_ID.to_string();
    }
    classes
        .iter()
        .filter(|c| c.id != DEFAULT_NET_CLASS_ID)
        .find(|c| c.matches(&net.name))
        .map(|c| c.id.clone())
        .unwrap_or_else(|| DEFAULT_NET_CLASS_ID.to_string())
}

/// Fill in a class for every net that has none. Explicit assignments are kept.
pub fn auto_assign_net_classes(nets: &mut [Net], classes: &[NetClass]) {
    let mut assigned = 0;
    for net in nets.iter_mut().filter(|n| n.net_class_id.is_none()) {
        net.net_class_id = Some(assign_net_class(net, classes));
        assigned += 1;
    }
    tracing::debug!("Assigned net classes to {} nets", assigned);
}

pub fn net_constraints(net_class_id: &str, classes: &[NetClass]) -> NetClassConstraints {
    classes
        .iter()
        .find(|c| c.id == net_class_id)
        .map(|c| c.constraints)
        .unwrap_or_default()
}

pub fn net_class_color<'c>(net_class_id: &str, classes: &'c [NetClass]) -> &'c str {
    classes
        .iter()
        .find(|c| c.id == net_class_id)
        .map_or(DEFAULT_NET_CLASS_COLOR, |c| c.color.as_str())
}

/// True when no class other than `exclude_id` already uses `name`.
pub fn is_net_class_name_unique(name: &str, classes: &[NetClass], exclude_id: Option<&str>) -> bool {
    !classes
        .iter()
        .any(|c| c.name == name && Some(c.id.as_str()) != exclude_id)
}
