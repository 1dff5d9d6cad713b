//! Example: adding a project-specific rule to the ERC engine.
//! Run with: cargo run --example custom_rules

use schemnet::prelude::*;
use schemnet::{ErcContext, ErcEngine, ErcOptions, ErcRule};
use std::sync::Arc;

/// Flags components that have no value set.
struct MissingValueRule;

impl ErcRule for MissingValueRule {
    fn id(&self) -> &str {
        "missing_value"
    }

    fn name(&self) -> &str {
        "Missing Component Value"
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
        ctx.sheet
            .components
            .iter()
            .filter(|c| c.value().is_empty() && !c.reference().starts_with('#'))
            .map(|c| {
                ErcViolation::new(
                    self.id(),
                    self.severity(),
                    format!("Component {} has no value", c.reference()),
                )
                .with_components([c.id.clone()])
            })
            .collect()
    }
}

fn main() {
    let library = SymbolLibrary::builtin();

    let mut sheet = Sheet::new();
    sheet.components.push(
        ComponentInstance::new("r1", "sym_resistor")
            .with_reference("R1")
            .with_value("10k"),
    );
    sheet
        .components
        .push(ComponentInstance::new("r2", "sym_resistor").at(100.0, 0.0).with_reference("R2"));
    sheet
        .wires
        .push(Wire::new("w1", [(20.0, 100.0), (20.0, 140.0), (120.0, 140.0), (120.0, 100.0)]));

    let mut engine = ErcEngine::with_default_rules();
    engine.add_rule(Arc::new(MissingValueRule));

    let ctx = ErcContext::new(&library, &sheet, &[], "/", &Default::default());
    let violations = engine.check(&ctx, &ErcOptions::default());

    println!("{} rules found {} violations", engine.rules().count(), violations.len());
    for v in &violations {
        println!("  {} [{}] {}: {}", v.id, v.severity, v.rule_id, v.message);
    }
}
