use criterion::{black_box, criterion_group, criterion_main, Criterion};
use schemnet::prelude::*;
use schemnet::{compute_nets, run_erc};

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

fn bench_compute_nets(c: &mut Criterion) {
    let library = SymbolLibrary::builtin();
    let sheet = resistor_ladder(50);

    c.bench_function("compute_nets", |b| {
        b.iter(|| {
            compute_nets(
                black_box(&library),
                black_box(&sheet.components),
                black_box(&sheet.wires),
                black_box(&sheet.junctions),
                black_box(&sheet.labels),
            )
        });
    });
}

fn bench_run_erc(c: &mut Criterion) {
    let library = SymbolLibrary::builtin();
    let sheet = resistor_ladder(50);

    c.bench_function("run_erc", |b| {
        b.iter(|| run_erc(black_box(&library), black_box(&sheet), &[], "/"));
    });
}

criterion_group!(benches, bench_compute_nets, bench_run_erc);
criterion_main!(benches);
