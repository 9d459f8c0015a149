use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use strata_plugin_api::SymbolTable;
use tracing::info;

use crate::activation::{
    drive, ActivationHandle, ActivationOptions, ActivationRecord, ActivationState,
};
use crate::bundle::BundleLoader;
use crate::error::{Error, Result};
use crate::manifest::discover_packages;
use crate::registry::CapabilityRegistry;
use crate::wiring::WiringScope;

/// Host collaborators supplied once at start-up: the two shared symbol
/// layers every load context delegates to, the root wiring scope, and the
/// bundle backend.
pub struct HostEnv {
    pub platform_symbols: Arc<SymbolTable>,
    pub shared_symbols: Arc<SymbolTable>,
    pub root_scope: Arc<WiringScope>,
    pub loader: Arc<dyn BundleLoader>,
}

impl HostEnv {
    pub fn new(loader: Arc<dyn BundleLoader>) -> Self {
        Self {
            platform_symbols: Arc::new(SymbolTable::new()),
            shared_symbols: Arc::new(SymbolTable::new()),
            root_scope: Arc::new(WiringScope::root()),
            loader,
        }
    }
}

#[derive(Default)]
struct ActivationSlot {
    current: Option<Arc<ActivationRecord>>,
    retired: Vec<Arc<ActivationRecord>>,
}

impl ActivationSlot {
    fn set_current(&mut self, next: Arc<ActivationRecord>) {
        if let Some(cur) = self.current.take() {
            self.retired.push(cur);
        }
        self.current = Some(next);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivationInfo {
    pub code: String,
    pub name: Option<String>,
    pub state: ActivationState,
}

#[derive(Default)]
pub struct ActivationLoadReport {
    pub loaded: Vec<ActivationInfo>,
    pub errors: Vec<Error>,
}

/// The process-wide activation service.
///
/// Activations for different codes may run concurrently; nothing here is
/// locked during prepare or commit. The slot lock is held only to publish a
/// finished activation. A new activation for an existing code supersedes
/// the previous one, which is retired but kept reachable so instances
/// already captured by in-flight callers stay valid.
pub struct PluginHost {
    env: HostEnv,
    registry: Arc<CapabilityRegistry>,
    slots: Mutex<HashMap<String, ActivationSlot>>,
}

impl PluginHost {
    pub fn new(env: HostEnv) -> Self {
        Self {
            env,
            registry: Arc::new(CapabilityRegistry::new()),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> Arc<CapabilityRegistry> {
        self.registry.clone()
    }

    pub fn load_package(
        &self,
        package_path: impl AsRef<Path>,
        options: &ActivationOptions,
    ) -> Result<ActivationHandle> {
        let package_path = package_path.as_ref();
        let record = drive(&self.env, &self.registry, package_path, options)?;
        let code = record.code.clone();
        if let Ok(mut slots) = self.slots.lock() {
            slots
                .entry(code.clone())
                .or_default()
                .set_current(record.clone());
        }
        info!(
            target: "strata_plugins::host",
            code = %code,
            package = %package_path.display(),
            "package activated"
        );
        Ok(ActivationHandle::new(record))
    }

    /// Activates every package discovered under `dir`, each with the
    /// activation defaults its own manifest declares. Per-package failures
    /// are collected, not short-circuited.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<ActivationLoadReport> {
        let dir = dir.as_ref();
        let mut report = ActivationLoadReport::default();
        for discovered in discover_packages(dir)? {
            let options = ActivationOptions::from_manifest(&discovered.manifest);
            match self.load_package(&discovered.root_dir, &options) {
                Ok(handle) => report.loaded.push(info_for_record(&handle.record)),
                Err(error) => report.errors.push(error),
            }
        }
        info!(
            target: "strata_plugins::host",
            dir = %dir.display(),
            loaded = report.loaded.len(),
            errors = report.errors.len(),
            "package directory loaded"
        );
        Ok(report)
    }

    /// How many superseded activations of `code` are still retained. Old
    /// activations are never force-dropped: their load context and bundle
    /// keep-alive must outlive any instance captured before the swap.
    pub fn retired_activations(&self, code: &str) -> usize {
        self.slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(code).map(|slot| slot.retired.len()))
            .unwrap_or(0)
    }

    pub fn activation(&self, code: &str) -> Option<ActivationHandle> {
        let slots = self.slots.lock().ok()?;
        let record = slots.get(code)?.current.as_ref()?.clone();
        Some(ActivationHandle::new(record))
    }

    pub fn list_activations(&self) -> Vec<ActivationInfo> {
        let Ok(slots) = self.slots.lock() else {
            return Vec::new();
        };
        let mut out = slots
            .values()
            .filter_map(|slot| slot.current.as_ref())
            .map(|record| info_for_record(record))
            .collect::<Vec<_>>();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out
    }
}

fn info_for_record(record: &Arc<ActivationRecord>) -> ActivationInfo {
    ActivationInfo {
        code: record.code.clone(),
        name: record.manifest.name.clone(),
        state: record.state(),
    }
}

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod tests;
