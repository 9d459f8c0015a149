use std::sync::Arc;

use strata_plugin_api::{SymbolDef, SymbolTable};

/// Per-activation symbol namespace.
///
/// Resolution walks an explicit fallback chain: platform built-ins, then
/// host-shared symbols, then symbols local to this package. The local layer
/// is private to one activation, so two contexts built from two different
/// packages can never see each other's local symbols.
pub struct LoadContext {
    platform: Arc<SymbolTable>,
    shared: Arc<SymbolTable>,
    local: SymbolTable,
}

impl LoadContext {
    pub(crate) fn new(
        platform: Arc<SymbolTable>,
        shared: Arc<SymbolTable>,
        local: SymbolTable,
    ) -> Self {
        Self {
            platform,
            shared,
            local,
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&SymbolDef> {
        self.platform
            .get(name)
            .or_else(|| self.shared.get(name))
            .or_else(|| self.local.get(name))
    }

    pub fn local_symbol_count(&self) -> usize {
        self.local.len()
    }
}

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod tests;
