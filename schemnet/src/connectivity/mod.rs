//! Connectivity engine
//!
//! Turns one sheet's geometry into nets:
//! pin positions ([`geometry`]) -> connectivity graph ([`graph`]) -> label merge
//! and naming ([`naming`]).

pub mod geometry;
pub mod graph;
pub mod naming;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::bus::resolve_bus_entries;
use crate::library::SymbolLibrary;
use crate::model::{BusEntry, ComponentInstance, Junction, Net, NetLabel, Sheet, Wire};

pub use geometry::{pin_position, point_on_segment, points_near, resolve_pin_position, SNAP_EPS};
pub use graph::ConnectivityGraph;
pub use naming::{is_auto_generated_tag, Netlist};

/// Tunables for net extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityOptions {
    /// Proximity tolerance for pin-to-endpoint and junction tests (design units)
    pub snap_tolerance: f64,
    /// Library symbol names that name the net they sit on
    pub power_symbols: Vec<String>,
}

impl Default for ConnectivityOptions {
    fn default() -> Self {
        Self {
            snap_tolerance: SNAP_EPS,
            power_symbols: vec!["VCC".to_string(), "GND".to_string()],
        }
    }
}

/// Builds a [`Netlist`] for one sheet.
#[derive(Debug, Clone)]
pub struct NetlistBuilder<'a> {
    library: &'a SymbolLibrary,
    options: ConnectivityOptions,
}

impl<'a> NetlistBuilder<'a> {
    pub fn new(library: &'a SymbolLibrary) -> Self {
        Self {
            library,
            options: ConnectivityOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConnectivityOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ConnectivityOptions {
        &self.options
    }

    /// Nets from components, wires, junctions and labels.
    pub fn build(
        &self,
        components: &[ComponentInstance],
        wires: &[Wire],
        junctions: &[Junction],
        labels: &[NetLabel],
    ) -> Netlist {
        self.build_with_bus_entries(components, wires, junctions, labels, &[])
    }

    /// Like [`NetlistBuilder::build`], with bus entries acting as member-name labels
    /// at their connection points.
    pub fn build_with_bus_entries(
        &self,
        components: &[ComponentInstance],
        wires: &[Wire],
        junctions: &[Junction],
        labels: &[NetLabel],
        bus_entries: &[BusEntry],
    ) -> Netlist {
        let labels: Cow<'_, [NetLabel]> = if bus_entries.is_empty() {
            Cow::Borrowed(labels)
        } else {
            let mut all = labels.to_vec();
            for (member, points) in resolve_bus_entries(bus_entries, wires) {
                for point in points {
                    all.push(NetLabel::local(
                        format!("bus_entry:{}", member),
                        member.clone(),
                        point.x,
                        point.y,
                    ));
                }
            }
            Cow::Owned(all)
        };

        let graph = ConnectivityGraph::build(self.library, components, wires, junctions, &self.options);
        let candidates = graph.candidate_nets();
        let input = naming::NamingInput {
            library: self.library,
            components,
            wires,
            labels: &labels,
            pins: graph.pins(),
            options: &self.options,
        };
        let netlist = naming::assemble(&input, candidates);

        tracing::debug!(
            "Computed {} nets from {} components and {} wires",
            netlist.len(),
            components.len(),
            wires.len()
        );
        netlist
    }

    /// Nets of a whole sheet, bus entries included.
    pub fn build_sheet(&self, sheet: &Sheet) -> Netlist {
        self.build_with_bus_entries(
            &sheet.components,
            &sheet.wires,
            &sheet.junctions,
            &sheet.labels,
            &sheet.bus_entries,
        )
    }
}

/// Compute the nets of one sheet with default options.
pub fn compute_nets(
    library: &SymbolLibrary,
    components: &[ComponentInstance],
    wires: &[Wire],
    junctions: &[Junction],
    labels: &[NetLabel],
) -> Vec<Net> {
    NetlistBuilder::new(library)
        .build(components, wires, junctions, labels)
        .into_nets()
}
