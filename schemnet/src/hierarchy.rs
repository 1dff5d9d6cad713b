//! Hierarchy resolver
//!
//! Flattens a design into one net list. Each sheet is solved on its own, child
//! nets are folded into parent nets through same-named ports, and nets carrying a
//! global label name are merged across every sheet.

use std::collections::HashSet;

use crate::connectivity::{ConnectivityOptions, NetlistBuilder};
use crate::library::SymbolLibrary;
use crate::model::{Design, Net, PinRef, Sheet, SheetPort};

/// Path of the root sheet.
pub const ROOT_SHEET_PATH: &str = "/";

/// Resolve every net in `design`, tagged with the sheet path that owns it.
pub fn resolve_hierarchical_nets(
    library: &SymbolLibrary,
    design: &Design,
    options: &ConnectivityOptions,
) -> Vec<Net> {
    let resolver = HierarchyResolver {
        builder: NetlistBuilder::new(library).with_options(options.clone()),
        design,
        global_names: global_label_names(design),
    };
    let mut stack = Vec::new();
    let nets = resolver.resolve_sheet(&design.root, ROOT_SHEET_PATH, &mut stack);
    tracing::debug!(
        "Resolved {} nets across {} sheet definitions",
        nets.len(),
        design.sheet_defs.len()
    );
    nets
}

/// Names of every global label on the root sheet or any sheet definition.
fn global_label_names(design: &Design) -> HashSet<String> {
    std::iter::once(&design.root)
        .chain(design.sheet_defs.iter().map(|d| &d.sheet))
        .flat_map(|sheet| sheet.labels.iter())
        .filter(|label| label.is_global())
        .map(|label| label.name.clone())
        .collect()
}

struct HierarchyResolver<'a> {
    builder: NetlistBuilder<'a>,
    design: &'a Design,
    global_names: HashSet<String>,
}

impl<'a> HierarchyResolver<'a> {
    fn resolve_sheet(&self, sheet: &Sheet, sheet_path: &str, stack: &mut Vec<&'a str>) -> Vec<Net> {
        let mut all_nets = self.builder.build_sheet(sheet).into_nets();
        for net in &mut all_nets {
            net.sheet_path = Some(sheet_path.to_string());
        }
        let local_count = all_nets.len();

        let design = self.design;
        for instance in &sheet.sheets {
            let Some(def) = design.sheet_def(&instance.sheet_def_id) else {
                tracing::warn!(
                    "Sheet instance {} references unknown sheet definition '{}'",
                    instance.id,
                    instance.sheet_def_id
                );
                continue;
            };
            if stack.contains(&def.id.as_str()) {
                tracing::warn!(
                    "Sheet instance {} instantiates '{}' recursively; skipped",
                    instance.id,
                    def.id
                );
                continue;
            }

            let child_path = format!("{}{}/", sheet_path, instance.name);
            stack.push(def.id.as_str());
            let mut child_nets = self.resolve_sheet(&def.sheet, &child_path, stack);
            stack.pop();

            for port in &def.sheet.ports {
                let parent = all_nets[..local_count]
                    .iter()
                    .position(|n| n.name == port.name);
                let child = child_nets
                    .iter()
                    .position(|n| n.name == port.name && n.sheet_path.as_deref() == Some(child_path.as_str()));

                if let (Some(p), Some(c)) = (parent, child) {
                    let absorbed = child_nets.remove(c);
                    let target = &mut all_nets[p];
                    target.pin_refs.extend(
                        absorbed
                            .pin_refs
                            .into_iter()
                            .map(|pin| PinRef::new(format!("{}::{}", instance.id, pin.component_id), pin.pin_id)),
                    );
                    target.wire_ids.extend(
                        absorbed
                            .wire_ids
                            .into_iter()
                            .map(|w| format!("{}::{}", instance.id, w)),
                    );
                    tracing::debug!("Port '{}' joins {} to {}", port.name, child_path, sheet_path);
                }
            }

            all_nets.extend(child_nets);
        }

        self.merge_global_nets(all_nets)
    }

    /// Fold every net named after a global label into the first net with that name.
    fn merge_global_nets(&self, nets: Vec<Net>) -> Vec<Net> {
        let mut merged: Vec<Net> = Vec::with_capacity(nets.len());
        for net in nets {
            if self.global_names.contains(&net.name) {
                if let Some(primary) = merged.iter_mut().find(|n| n.name == net.name) {
                    primary.pin_refs.extend(net.pin_refs);
                    primary.wire_ids.extend(net.wire_ids);
                    continue;
                }
            }
            merged.push(net);
        }
        merged
    }
}

/// Ports of the sheet at `sheet_path` that no net there carries by name.
pub fn find_unconnected_ports<'p>(ports: &'p [SheetPort], nets: &[Net], sheet_path: &str) -> Vec<&'p SheetPort> {
    ports
        .iter()
        .filter(|port| {
            !nets.iter().any(|n| {
                n.sheet_path.as_deref() == Some(sheet_path) && n.name == port.name && n.has_pins_or_wires()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NetLabel, PortDirection, SheetDef, SheetInstance, Wire};

    fn child_def(id: &str, port: &str) -> SheetDef {
        let mut sheet = Sheet::new();
        sheet.wires.push(Wire::new("w1", [(0.0, 0.0), (100.0, 0.0)]));
        sheet.labels.push(NetLabel::local("l1", port, 0.0, 0.0));
        sheet.wires.push(Wire::new("w2", [(0.0, 200.0), (100.0, 200.0)]));
        sheet.ports.push(SheetPort::new("p1", port, PortDirection::Input));
        SheetDef {
            id: id.to_string(),
            name: id.to_string(),
            sheet,
        }
    }

    #[test]
    fn test_port_merges_child_net_into_parent() {
        let mut design = Design::default();
        design.root.wires.push(Wire::new("rw1", [(0.0, 0.0), (50.0, 0.0)]));
        design.root.labels.push(NetLabel::local("rl1", "SIG", 50.0, 0.0));
        design.root.sheets.push(SheetInstance::new("s1", "def_filter", "filter"));
        design.sheet_defs.push(child_def("def_filter", "SIG"));

        let nets = resolve_hierarchical_nets(&SymbolLibrary::new(), &design, &ConnectivityOptions::default());

        let sig = nets.iter().find(|n| n.name == "SIG").expect("SIG");
        assert_eq!(sig.sheet_path.as_deref(), Some("/"));
        assert_eq!(sig.wire_ids, vec!["rw1", "s1::w1"]);
        assert_eq!(nets.iter().filter(|n| n.name == "SIG").count(), 1);

        let leftover = nets.iter().find(|n| n.wire_ids == vec!["w2"]).expect("unmerged child net");
        assert_eq!(leftover.sheet_path.as_deref(), Some("/filter/"));
    }

    #[test]
    fn test_unknown_and_recursive_definitions_are_skipped() {
        let mut design = Design::default();
        design.root.sheets.push(SheetInstance::new("s1", "missing", "ghost"));
        design.root.sheets.push(SheetInstance::new("s2", "def_loop", "loop"));

        let mut looping = child_def("def_loop", "X");
        looping.sheet.sheets.push(SheetInstance::new("s3", "def_loop", "again"));
        design.sheet_defs.push(looping);

        let nets = resolve_hierarchical_nets(&SymbolLibrary::new(), &design, &ConnectivityOptions::default());
        assert_eq!(nets.len(), 2);
        assert!(nets.iter().all(|n| n.sheet_path.as_deref() == Some("/loop/")));
    }

    #[test]
    fn test_find_unconnected_ports() {
        let ports = vec![
            SheetPort::new("p1", "SIG", PortDirection::Input),
            SheetPort::new("p2", "OUT", PortDirection::Output),
        ];
        let nets = vec![Net {
            id: "SIG".into(),
            name: "SIG".into(),
            pin_refs: vec![],
            wire_ids: vec!["w1".into()],
            net_class_id: None,
            sheet_path: Some("/".into()),
        }];
        let open = find_unconnected_ports(&ports, &nets, "/");
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].name, "OUT");
        assert_eq!(find_unconnected_ports(&ports, &nets, "/child/").len(), 2);
    }
}
