//! Timing checks at typical schematic scale (50 components, 200 wires)

use schemnet::prelude::*;
use schemnet::{compute_nets, run_erc};
use std::time::{Duration, Instant};

/// A chain of resistors; every column adds four wires.
fn resistor_ladder(columns: usize) -> Sheet {
    let mut sheet = Sheet::new();
    for i in 0..columns {
        let x = i as f64 * 100.0;
        sheet.components.push(
            ComponentInstance::new(format!("r{}", i), "sym_resistor")
                .at(x, 0.0)
                .with_reference(format!("R{}", i + 1)),
        );
        let pin_x = x + 20.0;
        sheet.wires.push(Wire::new(format!("wa{}", i), [(pin_x, -20.0), (pin_x, -60.0)]));
        sheet.wires.push(Wire::new(format!("wb{}", i), [(pin_x, -60.0), (pin_x + 100.0, -60.0)]));
        sheet.wires.push(Wire::new(format!("wc{}", i), [(pin_x, 100.0), (pin_x, 140.0)]));
        sheet.wires.push(Wire::new(format!("wd{}", i), [(pin_x, 140.0), (pin_x + 100.0, 140.0)]));
    }
    sheet
}

fn best_of<F: FnMut()>(runs: usize, mut f: F) -> Duration {
    (0..runs)
        .map(|_| {
            let start = Instant::now();
            f();
            start.elapsed()
        })
        .min()
        .unwrap()
}

#[test]
fn test_ladder_shape() {
    let sheet = resistor_ladder(50);
    assert_eq!(sheet.components.len(), 50);
    assert_eq!(sheet.wires.len(), 200);

    let nets = compute_nets(
        &SymbolLibrary::builtin(),
        &sheet.components,
        &sheet.wires,
        &sheet.junctions,
        &sheet.labels,
    );
    // Top and bottom rails each form one net.
    assert_eq!(nets.len(), 2);
    assert!(nets.iter().all(|n| n.pin_refs.len() == 50));
}

#[test]
fn test_compute_nets_is_fast() {
    let library = SymbolLibrary::builtin();
    let sheet = resistor_ladder(50);
    let elapsed = best_of(3, || {
        compute_nets(&library, &sheet.components, &sheet.wires, &sheet.junctions, &sheet.labels);
    });
    assert!(elapsed < Duration::from_millis(50), "compute_nets took {:?}", elapsed);
}

#[test]
fn test_erc_is_fast() {
    let library = SymbolLibrary::builtin();
    let sheet = resistor_ladder(50);
    let elapsed = best_of(3, || {
        run_erc(&library, &sheet, &[], "/");
    });
    assert!(elapsed < Duration::from_millis(100), "run_erc took {:?}", elapsed);
}
