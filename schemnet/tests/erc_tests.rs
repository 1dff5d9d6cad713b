//! Integration tests for the electrical rules check

use schemnet::prelude::*;
use schemnet::{run_erc, ErcContext, ErcEngine, ErcOptions, ConnectivityOptions};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_design(name: &str) -> Design {
    let json = std::fs::read_to_string(fixture_path(name)).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn test_clean_design_has_no_violations() {
    let design = load_design("rc_filter.json");
    let violations = run_erc(&SymbolLibrary::builtin(), &design.root, &[], "/");
    assert!(
        violations.is_empty(),
        "Clean design should pass ERC: {:?}",
        violations.iter().map(|v| &v.message).collect::<Vec<_>>()
    );
}

#[test]
fn test_lone_resistor_reports_two_unconnected_pins() {
    let mut sheet = Sheet::new();
    sheet.components.push(ComponentInstance::new("r1", "sym_resistor").with_reference("R1"));

    let violations = run_erc(&SymbolLibrary::builtin(), &sheet, &[], "/");
    assert_eq!(violations.len(), 2);
    assert!(violations.iter().all(|v| v.rule_id == "unconnected_pin"));
    assert!(violations.iter().all(|v| v.severity == Severity::Warning));
    assert_eq!(violations[0].id, "erc_1");
    assert_eq!(violations[1].id, "erc_2");
}

#[test]
fn test_duplicate_reference_reported_once() {
    let mut design = load_design("rc_filter.json");
    design.root.components[2]
        .properties
        .insert("reference".to_string(), "R1".to_string());

    let violations = run_erc(&SymbolLibrary::builtin(), &design.root, &[], "/");
    let dups: Vec<_> = violations
        .iter()
        .filter(|v| v.rule_id == "duplicate_reference")
        .collect();
    assert_eq!(dups.len(), 1);
    assert_eq!(dups[0].message, "Duplicate reference designator: R1");
    assert_eq!(dups[0].component_ids, vec!["r1", "c1"]);
}

#[test]
fn test_wired_outputs_conflict() {
    let library = SymbolLibrary::builtin();
    let mut sheet = Sheet::new();
    // Op-amp outputs sit at (100, 40) relative to each instance.
    sheet.components.push(ComponentInstance::new("u1", "sym_opamp").with_reference("U1"));
    sheet.components.push(ComponentInstance::new("u2", "sym_opamp").with_reference("U2").at(0.0, 200.0));
    sheet.wires.push(Wire::new("w1", [(100.0, 40.0), (160.0, 40.0), (160.0, 240.0), (100.0, 240.0)]));

    let violations = run_erc(&library, &sheet, &[], "/");
    let conflicts: Vec<_> = violations
        .iter()
        .filter(|v| v.severity == Severity::Error && v.message.contains("conflict"))
        .collect();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].message, "Output-to-output conflict on Net3: U1.OUT, U2.OUT");
}

#[test]
fn test_regulator_without_source() {
    let library = SymbolLibrary::builtin();
    let mut sheet = Sheet::new();
    // 7805 input lead tip is at (0, 20); nothing drives the wire.
    sheet.components.push(ComponentInstance::new("u1", "sym_7805").with_reference("U1"));
    sheet.components.push(ComponentInstance::new("r1", "sym_resistor").with_reference("R1").at(-120.0, 40.0));
    sheet.wires.push(Wire::new("w1", [(0.0, 20.0), (-100.0, 20.0)]));

    let violations = run_erc(&library, &sheet, &[], "/");
    let power: Vec<&str> = violations
        .iter()
        .filter(|v| v.rule_id == "power_input_pin")
        .map(|v| v.message.as_str())
        .collect();
    assert!(power.contains(&"Power input pin U1.IN not connected to power source"));
    assert!(power.contains(&"Power input pin U1.GND not connected to any net"));
    // The regulator itself is a power-category symbol, so the flag rule stays quiet.
    assert!(!violations.iter().any(|v| v.rule_id == "power_flag"));
}

#[test]
fn test_engine_respects_rule_filter() {
    let design = load_design("rc_filter.json");
    let mut sheet = design.root.clone();
    sheet.components[0].properties.clear();
    sheet.labels.push(NetLabel::local("stray", "NC", 900.0, 900.0));

    let library = SymbolLibrary::builtin();
    let ctx = ErcContext::new(&library, &sheet, &[], "/", &ConnectivityOptions::default());
    let engine = ErcEngine::with_default_rules();

    let all = engine.check(&ctx, &ErcOptions::default());
    assert_eq!(all.len(), 2);

    let only_labels = engine.check(&ctx, &ErcOptions::only(["floating_label"]));
    assert_eq!(only_labels.len(), 1);
    assert_eq!(
        only_labels[0].message,
        "Net label \"NC\" at (900, 900) is not connected to any wire or pin"
    );
}

#[test]
fn test_analyze_fixture_stats() {
    let design = load_design("rc_filter.json");
    let result = SchematicCore::analyze(&SymbolLibrary::builtin(), &design, &AnalysisOptions::default());
    assert_eq!(result.nets.len(), 3);
    assert_eq!(result.stats.total(), 0);
    assert_eq!(
        result.nets.iter().map(|n| n.net_class_id.as_deref()).collect::<Vec<_>>(),
        vec![Some("nc_power"), Some("nc_default"), Some("nc_power")]
    );
}
