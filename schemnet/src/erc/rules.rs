use std::collections::{HashMap, HashSet};

use super::{ErcContext, ErcRule, ErcViolation, Severity};
use crate::model::{ElectricalType, Net, PinRef};

fn net_display_name(net: &Net) -> &str {
    if net.name.is_empty() {
        &net.id
    } else {
        &net.name
    }
}

pub struct UnconnectedPinRule;

impl ErcRule for UnconnectedPinRule {
    fn id(&self) -> &str {
        "unconnected_pin"
    }

    fn name(&self) -> &str {
        "Unconnected Pin"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
        let mut violations = Vec::new();

        for (component, pin) in ctx.placed_pins() {
            let pin_ref = PinRef::new(&component.id, &pin.id);
            let connected = ctx
                .netlist
                .net_of_pin(&pin_ref)
                .map_or(false, Net::connects_anything);
            if !connected {
                violations.push(
                    ErcViolation::new(
                        self.id(),
                        self.severity(),
                        format!("Unconnected pin: {}.{}", component.reference(), pin.name),
                    )
                    .with_components([component.id.clone()])
                    .with_pin(pin_ref),
                );
            }
        }

        violations
    }
}

/// Power-input pins must sit on a net, and that net needs a power output.
pub struct PowerInputPinRule;

impl ErcRule for PowerInputPinRule {
    fn id(&self) -> &str {
        "power_input_pin"
    }

    fn name(&self) -> &str {
        "Power Input Pin"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
        let mut violations = Vec::new();

        for (component, pin) in ctx.placed_pins() {
            if pin.electrical_type != ElectricalType::PowerIn {
                continue;
            }
            let pin_ref = PinRef::new(&component.id, &pin.id);
            let label = format!("{}.{}", component.reference(), pin.name);

            let violation = match ctx.netlist.net_of_pin(&pin_ref) {
                Some(net) if net.connects_anything() => {
                    let has_source = ctx
                        .pins_of_type(net, ElectricalType::PowerOut)
                        .next()
                        .is_some();
                    if has_source {
                        continue;
                    }
                    ErcViolation::new(
                        self.id(),
                        Severity::Warning,
                        format!("Power input pin {} not connected to power source", label),
                    )
                }
                _ => ErcViolation::new(
                    self.id(),
                    self.severity(),
                    format!("Power input pin {} not connected to any net", label),
                ),
            };

            violations.push(
                violation
                    .with_components([component.id.clone()])
                    .with_pin(pin_ref),
            );
        }

        violations
    }
}

pub struct OutputConflictRule;

impl ErcRule for OutputConflictRule {
    fn id(&self) -> &str {
        "output_conflict"
    }

    fn name(&self) -> &str {
        "Output-to-Output Conflict"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
        let mut violations = Vec::new();

        for net in ctx.nets() {
            let outputs: Vec<_> = ctx.pins_of_type(net, ElectricalType::Output).collect();
            if outputs.len() < 2 {
                continue;
            }

            let names: Vec<String> = outputs
                .iter()
                .map(|(_, component, pin)| format!("{}.{}", component.reference(), pin.name))
                .collect();
            let mut violation = ErcViolation::new(
                self.id(),
                self.severity(),
                format!(
                    "Output-to-output conflict on {}: {}",
                    net_display_name(net),
                    names.join(", ")
                ),
            )
            .with_components(outputs.iter().map(|(pin, _, _)| pin.component_id.clone()));
            for (pin, _, _) in &outputs {
                violation = violation.with_pin((*pin).clone());
            }
            violations.push(violation);
        }

        violations
    }
}

pub struct MissingReferenceRule;

impl ErcRule for MissingReferenceRule {
    fn id(&self) -> &str {
        "missing_reference"
    }

    fn name(&self) -> &str {
        "Missing Reference Designator"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
        ctx.sheet
            .components
            .iter()
            .filter(|c| c.reference().trim().is_empty())
            .map(|c| {
                ErcViolation::new(
                    self.id(),
                    self.severity(),
                    format!("Missing reference designator for symbol at {}", c.position),
                )
                .with_components([c.id.clone()])
            })
            .collect()
    }
}

pub struct DuplicateReferenceRule;

impl ErcRule for DuplicateReferenceRule {
    fn id(&self) -> &str {
        "duplicate_reference"
    }

    fn name(&self) -> &str {
        "Duplicate Reference Designator"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
        // Reference -> component ids, in first-seen order
        let mut order: Vec<&str> = Vec::new();
        let mut by_ref: HashMap<&str, Vec<String>> = HashMap::new();
        for component in &ctx.sheet.components {
            let reference = component.reference().trim();
            if reference.is_empty() {
                continue;
            }
            by_ref
                .entry(reference)
                .or_insert_with(|| {
                    order.push(reference);
                    Vec::new()
                })
                .push(component.id.clone());
        }

        let mut violations = Vec::new();
        for reference in order {
            let Some(ids) = by_ref.remove(reference) else {
                continue;
            };
            if ids.len() > 1 {
                violations.push(
                    ErcViolation::new(
                        self.id(),
                        self.severity(),
                        format!("Duplicate reference designator: {}", reference),
                    )
                    .with_components(ids),
                );
            }
        }
        violations
    }
}

/// A label whose coordinate is on no net.
pub struct FloatingLabelRule;

impl ErcRule for FloatingLabelRule {
    fn id(&self) -> &str {
        "floating_label"
    }

    fn name(&self) -> &str {
        "Floating Net Label"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
        ctx.sheet
            .labels
            .iter()
            .filter(|label| {
                !ctx.netlist
                    .net_at(&label.position)
                    .map_or(false, Net::has_pins_or_wires)
            })
            .map(|label| {
                ErcViolation::new(
                    self.id(),
                    self.severity(),
                    format!(
                        "Net label \"{}\" at {} is not connected to any wire or pin",
                        label.name, label.position
                    ),
                )
            })
            .collect()
    }
}

/// Logic outputs fighting more than one power output.
pub struct MultipleDriversRule;

impl ErcRule for MultipleDriversRule {
    fn id(&self) -> &str {
        "multiple_drivers"
    }

    fn name(&self) -> &str {
        "Multiple Drivers"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
        let mut violations = Vec::new();

        for net in ctx.nets() {
            let drivers: Vec<_> = net
                .pin_refs
                .iter()
                .filter_map(|pin| ctx.resolve_pin(pin))
                .filter(|(_, def)| {
                    matches!(
                        def.electrical_type,
                        ElectricalType::Output | ElectricalType::PowerOut
                    )
                })
                .collect();

            let outputs = drivers
                .iter()
                .filter(|(_, def)| def.electrical_type == ElectricalType::Output)
                .count();
            let power = drivers.len() - outputs;
            if power < 2 || outputs == 0 {
                continue;
            }

            let listed: Vec<String> = drivers
                .iter()
                .map(|(component, def)| {
                    format!("{}.{} ({})", component.reference(), def.name, def.electrical_type)
                })
                .collect();
            violations.push(
                ErcViolation::new(
                    self.id(),
                    self.severity(),
                    format!("Multiple drivers on net {}: {}", net_display_name(net), listed.join(", ")),
                )
                .with_components(drivers.iter().map(|(component, _)| component.id.clone())),
            );
        }

        violations
    }
}

pub struct UnusedNetRule;

impl ErcRule for UnusedNetRule {
    fn id(&self) -> &str {
        "unused_net"
    }

    fn name(&self) -> &str {
        "Unused Net"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
        // Buses never hold pins themselves
        let bus_wires: HashSet<&str> = ctx
            .sheet
            .wires
            .iter()
            .filter(|w| w.is_bus)
            .map(|w| w.id.as_str())
            .collect();

        ctx.nets()
            .iter()
            .filter(|net| !net.wire_ids.is_empty() && net.pin_refs.is_empty())
            .filter(|net| !net.wire_ids.iter().all(|w| bus_wires.contains(w.as_str())))
            .map(|net| {
                ErcViolation::new(
                    self.id(),
                    self.severity(),
                    format!(
                        "Unused net \"{}\" has wires but no pin connections",
                        net_display_name(net)
                    ),
                )
                .with_wires(net.wire_ids.iter().cloned())
            })
            .collect()
    }
}

/// Declared ports need a same-named net on this sheet; child sheet ports need
/// one on the parent.
pub struct SheetPortRule;

impl ErcRule for SheetPortRule {
    fn id(&self) -> &str {
        "sheet_port"
    }

    fn name(&self) -> &str {
        "Unconnected Sheet Port"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
        let mut violations = Vec::new();

        for port in &ctx.sheet.ports {
            let connected = ctx
                .nets()
                .iter()
                .any(|n| n.name == port.name && n.has_pins_or_wires());
            if !connected {
                violations.push(ErcViolation::new(
                    self.id(),
                    self.severity(),
                    format!("Sheet port \"{}\" is not connected to any net", port.name),
                ));
            }
        }

        for instance in &ctx.sheet.sheets {
            let Some(def) = ctx.sheet_defs.iter().find(|d| d.id == instance.sheet_def_id) else {
                continue;
            };
            for port in &def.sheet.ports {
                if !ctx.nets().iter().any(|n| n.name == port.name) {
                    violations.push(ErcViolation::new(
                        self.id(),
                        Severity::Warning,
                        format!(
                            "Sheet \"{}\" port \"{}\" has no matching net on parent sheet",
                            instance.name, port.name
                        ),
                    ));
                }
            }
        }

        violations
    }
}

/// Nets with power inputs need a power output or a power-category symbol.
pub struct PowerFlagRule;

impl ErcRule for PowerFlagRule {
    fn id(&self) -> &str {
        "power_flag"
    }

    fn name(&self) -> &str {
        "Power Flag"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
        let mut violations = Vec::new();

        for net in ctx.nets() {
            if ctx.pins_of_type(net, ElectricalType::PowerIn).next().is_none() {
                continue;
            }
            let has_source = ctx.pins_of_type(net, ElectricalType::PowerOut).next().is_some();
            let has_flag = net.pin_refs.iter().any(|pin| {
                ctx.component(&pin.component_id)
                    .and_then(|c| ctx.library.definition_of(c))
                    .map_or(false, |def| def.is_power_category())
            });

            if !has_source && !has_flag {
                violations.push(
                    ErcViolation::new(
                        self.id(),
                        self.severity(),
                        format!(
                            "Net \"{}\" has power input pins but no power source or power flag",
                            net_display_name(net)
                        ),
                    )
                    .with_components(net.pin_refs.iter().map(|p| p.component_id.clone())),
                );
            }
        }

        violations
    }
}
