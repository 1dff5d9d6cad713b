//! Built-in symbol set, embedded as JSON.

use crate::model::SymbolDef;

const EMBEDDED_PASSIVE: &str = include_str!("../../symbols/passive.json");
const EMBEDDED_ACTIVE: &str = include_str!("../../symbols/active.json");
const EMBEDDED_POWER: &str = include_str!("../../symbols/power.json");

/// Every built-in symbol definition. Groups that fail to parse are skipped.
pub fn builtin_symbols() -> Vec<SymbolDef> {
    let embedded_jsons = [
        ("passive", EMBEDDED_PASSIVE),
        ("active", EMBEDDED_ACTIVE),
        ("power", EMBEDDED_POWER),
    ];

    let mut symbols = Vec::new();

    for (group, json_str) in embedded_jsons {
        match serde_json::from_str::<Vec<SymbolDef>>(json_str) {
            Ok(defs) => symbols.extend(defs),
            Err(e) => {
                tracing::warn!("Failed to parse embedded {} symbols: {}", group, e);
            }
        }
    }

    tracing::debug!("Loaded {} built-in symbols", symbols.len());
    symbols
}
