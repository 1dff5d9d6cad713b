//! Integration tests for bus labels and bus entries

use schemnet::prelude::*;
use schemnet::bus::{bus_labels, expand_bus_label};
use schemnet::{format_bus_label, parse_bus_label, BusEntry, BusLabel, NetlistBuilder};

#[test]
fn test_round_trip_for_valid_labels() {
    for s in ["DATA[0..7]", "ADDR[15..0]", "_io[3..3]", "Q2[10..12]"] {
        let parsed = parse_bus_label(s).unwrap();
        assert_eq!(format_bus_label(&parsed), s);
        assert_eq!(s.parse::<BusLabel>().unwrap(), parsed);
    }
}

#[test]
fn test_width_matches_expansion() {
    for s in ["DATA[0..7]", "ADDR[15..0]", "_io[3..3]"] {
        let bus = parse_bus_label(s).unwrap();
        assert_eq!(bus.expand().len() as u32, bus.width());
    }
    assert_eq!(expand_bus_label("D[2..0]"), vec!["D0", "D1", "D2"]);
}

#[test]
fn test_sheet_with_bus_entries() {
    let mut sheet = Sheet::new();
    sheet.wires.push(Wire::bus("bus", "D[0..1]", [(0.0, 0.0), (0.0, 200.0)]));
    sheet.wires.push(Wire::bus("bus2", "D[0..1]", [(0.0, 200.0), (0.0, 400.0)]));
    sheet.wires.push(Wire::new("a", [(20.0, 50.0), (200.0, 50.0)]));
    sheet.wires.push(Wire::new("b", [(20.0, 150.0), (200.0, 150.0)]));
    sheet.wires.push(Wire::new("c", [(20.0, 350.0), (200.0, 350.0)]));
    sheet.bus_entries.push(BusEntry::new("e0", "D", 0, 20.0, 50.0));
    sheet.bus_entries.push(BusEntry::new("e1", "D", 1, 20.0, 150.0));
    sheet.bus_entries.push(BusEntry::new("e2", "D", 0, 20.0, 350.0));

    let library = SymbolLibrary::new();
    let netlist = NetlistBuilder::new(&library).build_sheet(&sheet);

    // Two bus segments sharing an endpoint, plus the two member nets.
    assert_eq!(netlist.len(), 3);
    assert_eq!(netlist.net_named("D[0..1]").unwrap().wire_ids, vec!["bus", "bus2"]);
    assert!(netlist.net_named("D[0..1]").unwrap().pin_refs.is_empty());
    assert_eq!(netlist.net_named("D0").unwrap().wire_ids, vec!["a", "c"]);
    assert_eq!(netlist.net_named("D1").unwrap().wire_ids, vec!["b"]);
    assert_eq!(bus_labels(&sheet.wires).len(), 1);
}
