use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use strata_plugin_api::{Component, ServiceResolver, SymbolDef};

use crate::context::LoadContext;
use crate::error::{Error, Result};
use crate::manifest::wiring_descriptor_path_for_package_root;

/// Declarative wiring read from `wiring.json` at the package root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WiringDescriptor {
    #[serde(default)]
    pub components: Vec<ComponentWiring>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentWiring {
    pub component: String,
    #[serde(default)]
    pub deps: Vec<String>,
}

/// Per-activation dependency-injection scope, parented to the host root
/// scope. Instances are memoized per scope: the same component name always
/// yields the same `Arc` within one activation.
///
/// Dependencies resolve against local declarations first, then fall back to
/// the parent chain's named services.
pub struct WiringScope {
    package: String,
    declarations: HashMap<String, ComponentWiring>,
    parent: Option<Arc<WiringScope>>,
    context: Option<Arc<LoadContext>>,
    instances: Mutex<HashMap<String, Arc<dyn Component>>>,
}

impl WiringScope {
    /// The host root scope: no parent, no declarations, services registered
    /// programmatically at start-up.
    pub fn root() -> Self {
        Self {
            package: "host".to_string(),
            declarations: HashMap::new(),
            parent: None,
            context: None,
            instances: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn for_package(
        package: &str,
        context: Arc<LoadContext>,
        package_root: &Path,
        parent: Arc<WiringScope>,
    ) -> Result<Self> {
        let path = wiring_descriptor_path_for_package_root(package_root);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            Error::wiring(package, format!("unreadable descriptor {}: {e}", path.display()))
        })?;
        let descriptor: WiringDescriptor = serde_json::from_str(&text).map_err(|e| {
            Error::wiring(package, format!("invalid descriptor {}: {e}", path.display()))
        })?;

        let mut declarations = HashMap::new();
        for item in descriptor.components {
            let name = item.component.clone();
            if declarations.insert(name.clone(), item).is_some() {
                return Err(Error::wiring(
                    package,
                    format!("component `{name}` declared more than once"),
                ));
            }
        }

        Ok(Self {
            package: package.to_string(),
            declarations,
            parent: Some(parent),
            context: Some(context),
            instances: Mutex::new(HashMap::new()),
        })
    }

    /// Registers a named service on this scope so child scopes can resolve
    /// it as a dependency. Intended for seeding the host root scope.
    pub fn register_service(&self, name: impl Into<String>, instance: Arc<dyn Component>) {
        if let Ok(mut map) = self.instances.lock() {
            map.insert(name.into(), instance);
        }
    }

    pub fn instance(&self, name: &str) -> Result<Arc<dyn Component>> {
        self.instance_guarded(name, &mut Vec::new())
    }

    fn instance_guarded(&self, name: &str, stack: &mut Vec<String>) -> Result<Arc<dyn Component>> {
        if let Some(found) = self.memoized(name) {
            return Ok(found);
        }
        let Some(declaration) = self.declarations.get(name) else {
            return Err(Error::wiring(
                &self.package,
                format!("component `{name}` is not declared in the wiring descriptor"),
            ));
        };
        if stack.iter().any(|n| n == name) {
            return Err(Error::wiring(
                &self.package,
                format!("dependency cycle through `{name}`"),
            ));
        }

        stack.push(name.to_string());
        for dep in &declaration.deps {
            if self.declarations.contains_key(dep) {
                self.instance_guarded(dep, stack)?;
            } else if self.find_service(dep).is_none() {
                return Err(Error::wiring(
                    &self.package,
                    format!("dependency `{dep}` of `{name}` is neither declared nor provided by the parent scope"),
                ));
            }
        }
        stack.pop();

        let ctor = match self.context.as_ref().and_then(|ctx| ctx.resolve(name)) {
            Some(SymbolDef::Component(ctor)) => *ctor,
            Some(SymbolDef::Listener(_)) => {
                return Err(Error::wiring(
                    &self.package,
                    format!("`{name}` resolves to a listener symbol"),
                ));
            }
            None => {
                return Err(Error::wiring(
                    &self.package,
                    format!("declared component `{name}` resolves to no symbol"),
                ));
            }
        };

        let instance = ctor(&self.as_resolver()).map_err(|e| {
            Error::wiring(&self.package, format!("constructor for `{name}` failed: {e}"))
        })?;
        if let Ok(mut map) = self.instances.lock() {
            map.insert(name.to_string(), instance.clone());
        }
        Ok(instance)
    }

    pub(crate) fn find_service(&self, name: &str) -> Option<Arc<dyn Component>> {
        if let Some(found) = self.memoized(name) {
            return Some(found);
        }
        self.parent.as_ref()?.find_service(name)
    }

    pub(crate) fn as_resolver(&self) -> ScopeResolver<'_> {
        ScopeResolver { scope: self }
    }

    fn memoized(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.instances.lock().ok()?.get(name).cloned()
    }
}

pub(crate) struct ScopeResolver<'a> {
    scope: &'a WiringScope,
}

impl ServiceResolver for ScopeResolver<'_> {
    fn service(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.scope.find_service(name)
    }
}

#[cfg(test)]
#[path = "tests/wiring_tests.rs"]
mod tests;
