//! Schemnet - schematic connectivity and electrical rules checking
//!
//! This library turns placed symbols, wires, junctions and labels into nets and
//! checks them against a set of electrical rules. It owns no file format and no
//! UI; host applications hand it their data model and read back nets and
//! violations.
//!
//! # Quick Start
//!
//! ```
//! use schemnet::{compute_nets, ComponentInstance, SymbolLibrary, Wire};
//!
//! let library = SymbolLibrary::builtin();
//! let components = vec![ComponentInstance::new("r1", "sym_resistor").with_reference("R1")];
//! let wires = vec![Wire::new("w1", [(20.0, -20.0), (20.0, -100.0)])];
//!
//! let nets = compute_nets(&library, &components, &wires, &[], &[]);
//! assert_eq!(nets.len(), 2);
//! ```
//!
//! # Features
//!
//! - **Connectivity**: integer-lattice graph, junction-only crossings, label merge
//! - **Hierarchy**: per-sheet nets joined through sheet ports and global labels
//! - **Buses**: `NAME[a..b]` parsing, expansion and bus-entry resolution
//! - **ERC**: ten independent rules behind the [`ErcRule`] trait
//! - **Net classes** and **reference-designator annotation** helpers

pub mod annotate;
pub mod bus;
pub mod connectivity;
pub mod core;
pub mod erc;
pub mod hierarchy;
pub mod library;
pub mod model;
pub mod netclass;

// Re-export main types
pub use crate::core::{AnalysisOptions, AnalysisResult, ErcStats, SchemnetError, SchematicCore};
pub use annotate::{auto_annotate, RefDesCounter};
pub use bus::{format_bus_label, parse_bus_label, resolve_bus_entries, BusLabel};
pub use connectivity::{compute_nets, resolve_pin_position, ConnectivityOptions, Netlist, NetlistBuilder};
pub use erc::{run_erc, ErcContext, ErcEngine, ErcOptions, ErcRule, ErcViolation, Severity};
pub use hierarchy::{find_unconnected_ports, resolve_hierarchical_nets};
pub use library::SymbolLibrary;
pub use model::*;
pub use netclass::{assign_net_class, auto_assign_net_classes, default_net_classes, NetClass};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AnalysisOptions, AnalysisResult, ComponentInstance, Design, ErcViolation, Net, NetLabel,
        SchematicCore, SchemnetError, Severity, Sheet, SymbolLibrary, Wire,
    };
}
