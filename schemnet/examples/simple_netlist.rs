//! Simple netlist example: analyze a design file and print its nets.
//! Run with: cargo run --example simple_netlist [path/to/design.json]

use schemnet::prelude::*;
use std::path::Path;

fn main() -> Result<(), SchemnetError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/rc_filter.json".to_string());
    let path = Path::new(&path);

    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Cannot read {}: {}", path.display(), e);
            eprintln!("Usage: cargo run --example simple_netlist [path/to/design.json]");
            std::process::exit(1);
        }
    };
    let design: Design = serde_json::from_str(&json)?;
    design.validate()?;

    let library = SymbolLibrary::builtin();
    let result = SchematicCore::analyze(&library, &design, &AnalysisOptions::default());

    println!("Nets for: {}", path.display());
    for net in &result.nets {
        let pins: Vec<String> = net.pin_refs.iter().map(|p| p.to_string()).collect();
        println!(
            "  {:<12} [{}] pins: {}",
            net.name,
            net.net_class_id.as_deref().unwrap_or("-"),
            pins.join(", ")
        );
    }
    println!();

    println!(
        "ERC: {} errors, {} warnings, {} info",
        result.stats.errors, result.stats.warnings, result.stats.info
    );
    for violation in &result.violations {
        println!("  [{}] {}", violation.severity, violation.message);
    }

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
