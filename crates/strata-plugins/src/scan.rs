use std::path::Path;
use std::sync::Arc;

use strata_plugin_api::{ActivationListener, ComponentCtor, SymbolDef};

use crate::context::LoadContext;
use crate::error::{Error, Result};
use crate::manifest::PackageManifest;
use crate::types::CapabilityKind;

/// One declared component resolved to its constructor.
pub(crate) struct CapabilityDescriptor {
    pub(crate) kind: CapabilityKind,
    pub(crate) identity: String,
    pub(crate) ctor: ComponentCtor,
}

/// Resolves the manifest's per-kind component names through the load
/// context, in manifest order. A name the bundle does not export, or one
/// bound to the wrong symbol flavor, means the package is internally
/// inconsistent.
pub(crate) fn scan(
    context: &LoadContext,
    package_root: &Path,
    manifest: &PackageManifest,
    kinds: &[CapabilityKind],
) -> Result<Vec<CapabilityDescriptor>> {
    let mut out = Vec::new();
    for &kind in kinds {
        for name in manifest.components.for_kind(kind) {
            let ctor = match context.resolve(name) {
                Some(SymbolDef::Component(ctor)) => *ctor,
                Some(SymbolDef::Listener(_)) => {
                    return Err(Error::package_load(
                        package_root,
                        format!("declared {} component `{name}` is a listener symbol", kind.as_str()),
                    ));
                }
                None => {
                    return Err(Error::package_load(
                        package_root,
                        format!("declared {} component `{name}` resolves to no symbol", kind.as_str()),
                    ));
                }
            };
            out.push(CapabilityDescriptor {
                kind,
                identity: name.clone(),
                ctor,
            });
        }
    }
    Ok(out)
}

/// Resolves and directly instantiates the manifest's optional lifecycle
/// listener, bypassing the wiring scope so it can observe the phase
/// boundaries regardless of container health.
pub(crate) fn find_listener(
    context: &LoadContext,
    package_root: &Path,
    manifest: &PackageManifest,
) -> Result<Option<Arc<dyn ActivationListener>>> {
    let Some(name) = manifest.listener.as_deref() else {
        return Ok(None);
    };
    match context.resolve(name) {
        Some(SymbolDef::Listener(ctor)) => Ok(Some(ctor())),
        Some(SymbolDef::Component(_)) => Err(Error::package_load(
            package_root,
            format!("declared listener `{name}` is a component symbol"),
        )),
        None => Err(Error::package_load(
            package_root,
            format!("declared listener `{name}` resolves to no symbol"),
        )),
    }
}
