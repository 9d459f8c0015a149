use std::any::Any;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use strata_plugin_api::{ActivationListener, HostContext};
use tracing::{info, warn};

use crate::context::LoadContext;
use crate::error::{Error, Result};
use crate::host::HostEnv;
use crate::manifest::PackageManifest;
use crate::registry::{CapabilityRegistry, RegistryEntry};
use crate::scan::{find_listener, scan};
use crate::types::{CapabilityKind, IdentityKind};
use crate::wiring::WiringScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ActivationState {
    Idle = 0,
    Preparing = 1,
    Prepared = 2,
    Committing = 3,
    Active = 4,
    Failed = 5,
}

pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(ActivationState::Idle as u8))
    }

    fn set(&self, state: ActivationState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn get(&self) -> ActivationState {
        match self.0.load(Ordering::Acquire) {
            0 => ActivationState::Idle,
            1 => ActivationState::Preparing,
            2 => ActivationState::Prepared,
            3 => ActivationState::Committing,
            4 => ActivationState::Active,
            _ => ActivationState::Failed,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActivationOptions {
    pub use_container: bool,
    pub identity_kind: IdentityKind,
    pub host_ctx: HostContext,
}

impl ActivationOptions {
    /// Activation defaults a package declares for itself, used by directory
    /// loading.
    pub fn from_manifest(manifest: &PackageManifest) -> Self {
        Self {
            use_container: manifest.wiring,
            identity_kind: manifest.identity,
            host_ctx: HostContext::default(),
        }
    }
}

/// One committed (or superseded) activation. Keeps the load context, wiring
/// scope, listener, and bundle keep-alive reachable for as long as any
/// handle or registered instance needs them.
pub(crate) struct ActivationRecord {
    pub(crate) code: String,
    pub(crate) manifest: PackageManifest,
    state: StateCell,
    _context: Arc<LoadContext>,
    _scope: Option<Arc<WiringScope>>,
    _listener: Option<Arc<dyn ActivationListener>>,
    _keepalive: Option<Box<dyn Any + Send + Sync>>,
}

impl ActivationRecord {
    pub(crate) fn state(&self) -> ActivationState {
        self.state.get()
    }
}

/// Caller-facing view of an activation: its `code` and current state, and
/// nothing else.
#[derive(Clone)]
pub struct ActivationHandle {
    pub(crate) record: Arc<ActivationRecord>,
}

impl ActivationHandle {
    pub(crate) fn new(record: Arc<ActivationRecord>) -> Self {
        Self { record }
    }

    pub fn code(&self) -> &str {
        &self.record.code
    }

    pub fn state(&self) -> ActivationState {
        self.record.state()
    }
}

struct ActivatedParts {
    manifest: PackageManifest,
    context: Arc<LoadContext>,
    scope: Option<Arc<WiringScope>>,
    listener: Option<Arc<dyn ActivationListener>>,
    keepalive: Option<Box<dyn Any + Send + Sync>>,
}

/// Drives one activation through prepare and commit.
pub(crate) fn drive(
    env: &HostEnv,
    registry: &CapabilityRegistry,
    package_path: &Path,
    options: &ActivationOptions,
) -> Result<Arc<ActivationRecord>> {
    let state = StateCell::new();
    match run_phases(env, registry, package_path, options, &state) {
        Ok(parts) => Ok(Arc::new(ActivationRecord {
            code: parts.manifest.code.clone(),
            manifest: parts.manifest,
            state,
            _context: parts.context,
            _scope: parts.scope,
            _listener: parts.listener,
            _keepalive: parts.keepalive,
        })),
        Err(error) => {
            state.set(ActivationState::Failed);
            warn!(
                target: "strata_plugins::activation",
                package = %package_path.display(),
                "activation failed: {error}"
            );
            Err(error)
        }
    }
}

fn run_phases(
    env: &HostEnv,
    registry: &CapabilityRegistry,
    package_path: &Path,
    options: &ActivationOptions,
    state: &StateCell,
) -> Result<ActivatedParts> {
    let started = Instant::now();
    state.set(ActivationState::Preparing);
    info!(
        target: "strata_plugins::activation",
        package = %package_path.display(),
        use_container = options.use_container,
        identity = ?options.identity_kind,
        "activation preparing"
    );

    // Everything built here is owned by this activation alone; the registry
    // stays untouched until the whole commit batch has resolved.
    let bundle = env.loader.load(package_path)?;
    let (manifest, symbols, keepalive) = bundle.into_parts();
    let code = manifest.code.clone();
    let context = Arc::new(LoadContext::new(
        env.platform_symbols.clone(),
        env.shared_symbols.clone(),
        symbols,
    ));

    let scope = if options.use_container {
        Some(Arc::new(WiringScope::for_package(
            &code,
            context.clone(),
            package_path,
            env.root_scope.clone(),
        )?))
    } else {
        None
    };

    let kinds = [
        options.identity_kind.capability_kind(),
        CapabilityKind::Extension,
    ];
    let scanned = scan(&context, package_path, &manifest, &kinds)?;
    let listener = find_listener(&context, package_path, &manifest)?;

    state.set(ActivationState::Prepared);
    info!(
        target: "strata_plugins::activation",
        code = %code,
        scanned = scanned.len(),
        listener = listener.is_some(),
        "activation prepared"
    );
    if let Some(listener) = listener.as_ref() {
        listener
            .on_prepared(&options.host_ctx)
            .map_err(|e| Error::listener_hook("on_prepared", e))?;
    }

    state.set(ActivationState::Committing);
    if options.identity_kind == IdentityKind::Partner {
        let partners = scanned
            .iter()
            .filter(|d| d.kind == CapabilityKind::Partner)
            .count();
        if partners > 1 {
            return Err(Error::configuration(
                "one partner package may declare at most one partner instance",
            ));
        }
    }

    // Resolve the whole batch before the registry sees any of it.
    let mut batch = Vec::with_capacity(scanned.len());
    for descriptor in &scanned {
        let instance = match scope.as_ref() {
            Some(scope) => scope.instance(&descriptor.identity)?,
            None => (descriptor.ctor)(&env.root_scope.as_resolver()).map_err(|e| {
                Error::configuration(format!(
                    "constructor for `{}` failed: {e}",
                    descriptor.identity
                ))
            })?,
        };
        batch.push((
            descriptor.kind,
            RegistryEntry {
                code: code.clone(),
                identity: descriptor.identity.clone(),
                instance,
            },
        ));
    }
    let entries = batch.len();
    registry.apply(batch);

    state.set(ActivationState::Active);
    info!(
        target: "strata_plugins::activation",
        code = %code,
        entries,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "activation committed"
    );
    if let Some(listener) = listener.as_ref() {
        // The swap is already visible to readers; the activation stays Active.
        if let Err(e) = listener.on_switched(&options.host_ctx) {
            warn!(
                target: "strata_plugins::activation",
                code = %code,
                "on_switched hook failed: {e}"
            );
        }
    }

    Ok(ActivatedParts {
        manifest,
        context,
        scope,
        listener,
        keepalive,
    })
}

#[cfg(test)]
#[path = "tests/activation_tests.rs"]
mod tests;
