use std::collections::HashMap;

use crate::{ComponentCtor, ListenerCtor};

/// A named constructor exported by a package bundle or shared by the host.
#[derive(Debug, Clone, Copy)]
pub enum SymbolDef {
    Component(ComponentCtor),
    Listener(ListenerCtor),
}

/// Insertion-ordered name → constructor map.
///
/// Order is preserved so that resolution over a manifest stays deterministic
/// for a given package.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    entries: Vec<(String, SymbolDef)>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, def: SymbolDef) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&at) => self.entries[at].1 = def,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, def));
            }
        }
    }

    pub fn component(&mut self, name: impl Into<String>, ctor: ComponentCtor) {
        self.insert(name, SymbolDef::Component(ctor));
    }

    pub fn listener(&mut self, name: impl Into<String>, ctor: ListenerCtor) {
        self.insert(name, SymbolDef::Listener(ctor));
    }

    pub fn get(&self, name: &str) -> Option<&SymbolDef> {
        self.index.get(name).map(|&at| &self.entries[at].1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
