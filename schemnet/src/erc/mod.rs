//! Electrical rules check
//!
//! Each rule looks at one sheet's nets plus the library metadata of its
//! components and reports [`ErcViolation`]s. Rules are independent; none of them
//! short-circuits another.

pub mod rules;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::connectivity::{ConnectivityOptions, Netlist, NetlistBuilder};
use crate::library::SymbolLibrary;
use crate::model::{ComponentInstance, ElectricalType, Net, PinDef, PinRef, Sheet, SheetDef};

pub use rules::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

/// One finding. `id` is `erc_{n}`, numbered from 1 on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErcViolation {
    pub id: String,
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wire_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pin_refs: Vec<PinRef>,
    pub sheet_path: String,
}

impl ErcViolation {
    pub fn new(rule_id: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            rule_id: rule_id.to_string(),
            severity,
            message: message.into(),
            component_ids: Vec::new(),
            wire_ids: Vec::new(),
            pin_refs: Vec::new(),
            sheet_path: String::new(),
        }
    }

    pub fn with_components(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.component_ids.extend(ids);
        self
    }

    pub fn with_wires(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.wire_ids.extend(ids);
        self
    }

    pub fn with_pin(mut self, pin: PinRef) -> Self {
        self.pin_refs.push(pin);
        self
    }
}

/// Which rules run. Empty means all of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErcOptions {
    pub rules: Vec<String>,
}

impl ErcOptions {
    pub fn only(rules: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    pub fn enables(&self, rule_id: &str) -> bool {
        self.rules.is_empty() || self.rules.iter().any(|r| r == rule_id)
    }
}

/// Everything a rule may inspect for one sheet.
pub struct ErcContext<'a> {
    pub library: &'a SymbolLibrary,
    pub sheet: &'a Sheet,
    pub sheet_defs: &'a [SheetDef],
    pub sheet_path: &'a str,
    pub netlist: Netlist,
    components: HashMap<&'a str, &'a ComponentInstance>,
}

impl<'a> ErcContext<'a> {
    pub fn new(
        library: &'a SymbolLibrary,
        sheet: &'a Sheet,
        sheet_defs: &'a [SheetDef],
        sheet_path: &'a str,
        options: &ConnectivityOptions,
    ) -> Self {
        let netlist = NetlistBuilder::new(library)
            .with_options(options.clone())
            .build_sheet(sheet);

        let mut components = HashMap::new();
        for component in &sheet.components {
            components.entry(component.id.as_str()).or_insert(component);
        }

        Self {
            library,
            sheet,
            sheet_defs,
            sheet_path,
            netlist,
            components,
        }
    }

    pub fn nets(&self) -> &[Net] {
        self.netlist.nets()
    }

    pub fn component(&self, id: &str) -> Option<&'a ComponentInstance> {
        self.components.get(id).copied()
    }

    /// Component and library pin behind a pin reference.
    pub fn resolve_pin(&self, pin: &PinRef) -> Option<(&'a ComponentInstance, &'a PinDef)> {
        let library = self.library;
        let component = self.component(&pin.component_id)?;
        let def = library.pin_of(component, &pin.pin_id)?;
        Some((component, def))
    }

    pub fn pin_type(&self, pin: &PinRef) -> Option<ElectricalType> {
        self.resolve_pin(pin).map(|(_, def)| def.electrical_type)
    }

    /// Every pin of every component whose symbol is in the library.
    pub fn placed_pins(&self) -> impl Iterator<Item = (&'a ComponentInstance, &'a PinDef)> + '_ {
        let library = self.library;
        let sheet = self.sheet;
        sheet.components.iter().flat_map(move |component| {
            library
                .definition_of(component)
                .into_iter()
                .flat_map(move |def| def.pins.iter().map(move |pin| (component, pin)))
        })
    }

    /// Pins of `net` with the given electrical type.
    pub fn pins_of_type<'n>(
        &'n self,
        net: &'n Net,
        kind: ElectricalType,
    ) -> impl Iterator<Item = (&'n PinRef, &'a ComponentInstance, &'a PinDef)> + 'n {
        net.pin_refs.iter().filter_map(move |pin| {
            let (component, def) = self.resolve_pin(pin)?;
            (def.electrical_type == kind).then_some((pin, component, def))
        })
    }
}

pub trait ErcRule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    /// Severity of the rule's primary finding
    fn severity(&self) -> Severity;
    fn check(&self, ctx: &ErcContext<'_>) -> Vec<ErcViolation>;
}

pub struct ErcEngine {
    rules: Vec<Arc<dyn ErcRule>>,
}

impl ErcEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Arc::new(UnconnectedPinRule));
        engine.add_rule(Arc::new(PowerInputPinRule));
        engine.add_rule(Arc::new(OutputConflictRule));
        engine.add_rule(Arc::new(MissingReferenceRule));
        engine.add_rule(Arc::new(DuplicateReferenceRule));
        engine.add_rule(Arc::new(FloatingLabelRule));
        engine.add_rule(Arc::new(MultipleDriversRule));
        engine.add_rule(Arc::new(UnusedNetRule));
        engine.add_rule(Arc::new(SheetPortRule));
        engine.add_rule(Arc::new(PowerFlagRule));
        engine
    }

    pub fn add_rule(&mut self, rule: Arc<dyn ErcRule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn ErcRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Run the enabled rules in registration order and number the results.
    pub fn check(&self, ctx: &ErcContext<'_>, options: &ErcOptions) -> Vec<ErcViolation> {
        let mut violations = Vec::new();
        for rule in self.rules.iter().filter(|r| options.enables(r.id())) {
            let found = rule.check(ctx);
            if !found.is_empty() {
                tracing::debug!("ERC rule '{}' reported {} violations", rule.id(), found.len());
            }
            violations.extend(found);
        }

        for (n, violation) in violations.iter_mut().enumerate() {
            violation.id = format!("erc_{}", n + 1);
            violation.sheet_path = ctx.sheet_path.to_string();
        }
        violations
    }
}

impl Default for ErcEngine {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

/// Run every default rule over one sheet.
pub fn run_erc(
    library: &SymbolLibrary,
    sheet: &Sheet,
    sheet_defs: &[SheetDef],
    sheet_path: &str,
) -> Vec<ErcViolation> {
    let ctx = ErcContext::new(library, sheet, sheet_defs, sheet_path, &ConnectivityOptions::default());
    ErcEngine::with_default_rules().check(&ctx, &ErcOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysRule;

    impl ErcRule for AlwaysRule {
        fn id(&self) -> &str {
            "always"
        }

        fn name(&self) -> &str {
            "Always Fires"
        }

        fn severity(&self) -> Severity {
            Severity::Info
        }

        fn check(&self, _ctx: &ErcContext<'_>) -> Vec<ErcViolation> {
            vec![
                ErcViolation::new(self.id(), self.severity(), "first"),
                ErcViolation::new(self.id(), self.severity(), "second"),
            ]
        }
    }

    #[test]
    fn test_ids_restart_every_run() {
        let library = SymbolLibrary::new();
        let sheet = Sheet::new();
        let ctx = ErcContext::new(&library, &sheet, &[], "/", &ConnectivityOptions::default());

        let mut engine = ErcEngine::new();
        engine.add_rule(Arc::new(AlwaysRule));

        for _ in 0..2 {
            let found = engine.check(&ctx, &ErcOptions::default());
            let ids: Vec<&str> = found.iter().map(|v| v.id.as_str()).collect();
            assert_eq!(ids, vec!["erc_1", "erc_2"]);
            assert!(found.iter().all(|v| v.sheet_path == "/"));
        }
    }

    #[test]
    fn test_options_filter_rules() {
        let library = SymbolLibrary::builtin();
        let mut sheet = Sheet::new();
        sheet.components.push(ComponentInstance::new("r1", "sym_resistor"));
        let ctx = ErcContext::new(&library, &sheet, &[], "/", &ConnectivityOptions::default());

        let engine = ErcEngine::with_default_rules();
        let all = engine.check(&ctx, &ErcOptions::default());
        assert!(all.iter().any(|v| v.rule_id == "missing_reference"));

        let only = engine.check(&ctx, &ErcOptions::only(["missing_reference"]));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].id, "erc_1");
    }

    #[test]
    fn test_default_engine_has_ten_rules() {
        let engine = ErcEngine::default();
        let ids: Vec<&str> = engine.rules().map(|r| r.id()).collect();
        assert_eq!(ids.len(), 10);
        assert_eq!(ids[0], "unconnected_pin");
        assert_eq!(ids[9], "power_flag");
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Warning).expect("json"), "\"warning\"");
        assert_eq!(Severity::Error.to_string(), "error");
    }
}
