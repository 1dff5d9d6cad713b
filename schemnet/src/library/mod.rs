//! Symbol library lookup
//!
//! The connectivity engine and ERC never own symbol definitions; they read them
//! through a [`SymbolLibrary`] keyed by symbol-definition id.

pub mod builtin;

use std::collections::HashMap;

use crate::core::SchemnetError;
use crate::model::{ComponentInstance, PinDef, SymbolDef};

/// Read-only map from symbol-definition id to definition.
#[derive(Debug, Clone, Default)]
pub struct SymbolLibrary {
    symbols: HashMap<String, SymbolDef>,
}

impl SymbolLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Library preloaded with the embedded built-in symbols.
    pub fn builtin() -> Self {
        let mut library = Self::new();
        library.extend(builtin::builtin_symbols());
        library
    }

    /// Parse a JSON array of symbol definitions.
    pub fn from_json_str(json: &str) -> Result<Self, SchemnetError> {
        let symbols: Vec<SymbolDef> = serde_json::from_str(json)?;
        let mut library = Self::new();
        library.extend(symbols);
        Ok(library)
    }

    /// Add or replace a definition.
    pub fn insert(&mut self, symbol: SymbolDef) {
        self.symbols.insert(symbol.id.clone(), symbol);
    }

    pub fn extend(&mut self, symbols: impl IntoIterator<Item = SymbolDef>) {
        for symbol in symbols {
            self.insert(symbol);
        }
    }

    pub fn get(&self, id: &str) -> Option<&SymbolDef> {
        self.symbols.get(id)
    }

    /// Definition behind a placed component.
    pub fn definition_of(&self, component: &ComponentInstance) -> Option<&SymbolDef> {
        self.get(&component.symbol_ref)
    }

    /// Pin definition of a placed component.
    pub fn pin_of(&self, component: &ComponentInstance, pin_id: &str) -> Option<&PinDef> {
        self.definition_of(component).and_then(|def| def.pin(pin_id))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolDef> {
        self.symbols.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElectricalType;

    #[test]
    fn test_builtin_library_loads() {
        let library = SymbolLibrary::builtin();
        assert_eq!(library.len(), 12);

        let regulator = library.get("sym_7805").expect("7805 present");
        assert!(regulator.is_power_category());
        assert_eq!(regulator.pin("out").map(|p| p.electrical_type), Some(ElectricalType::PowerOut));
    }

    #[test]
    fn test_pin_of_component() {
        let library = SymbolLibrary::builtin();
        let c = ComponentInstance::new("u1", "sym_opamp");
        assert_eq!(library.pin_of(&c, "out").map(|p| p.name.as_str()), Some("OUT"));
        assert!(library.pin_of(&c, "missing").is_none());
        assert!(library.pin_of(&ComponentInstance::new("x", "sym_nope"), "p1").is_none());
    }

    #[test]
    fn test_from_json_str_rejects_garbage() {
        assert!(matches!(
            SymbolLibrary::from_json_str("{ not json"),
            Err(SchemnetError::LibraryJson(_))
        ));

        let library = SymbolLibrary::from_json_str(
            r#"[{ "id": "sym_tp", "name": "TP", "category": "Misc", "width": 20, "height": 20,
                  "pins": [{ "id": "1", "name": "1", "x": 10, "y": 20 }] }]"#,
        )
        .expect("valid library");
        assert_eq!(library.get("sym_tp").map(|s| s.pins.len()), Some(1));
    }
}
