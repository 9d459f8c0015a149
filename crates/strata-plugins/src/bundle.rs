use std::any::Any;
use std::collections::HashMap;
use std::path::Path;

use libloading::{Library, Symbol};
use strata_plugin_api::{PackageEntry, SymbolTable, STRATA_PLUGIN_API_VERSION};

use crate::error::{Error, Result};
use crate::manifest::{manifest_path_for_package_root, read_manifest, PackageManifest};

/// A package bundle pulled into the process: its manifest, its local symbol
/// table, and whatever the backend must keep alive for the symbols to stay
/// valid (the `Library` handle, for dylib bundles).
pub struct LoadedBundle {
    pub manifest: PackageManifest,
    pub symbols: SymbolTable,
    keepalive: Option<Box<dyn Any + Send + Sync>>,
}

impl LoadedBundle {
    pub fn new(manifest: PackageManifest, symbols: SymbolTable) -> Self {
        Self {
            manifest,
            symbols,
            keepalive: None,
        }
    }

    pub fn with_keepalive(
        manifest: PackageManifest,
        symbols: SymbolTable,
        keepalive: Box<dyn Any + Send + Sync>,
    ) -> Self {
        Self {
            manifest,
            symbols,
            keepalive: Some(keepalive),
        }
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        PackageManifest,
        SymbolTable,
        Option<Box<dyn Any + Send + Sync>>,
    ) {
        (self.manifest, self.symbols, self.keepalive)
    }
}

/// Turns a package root into a loaded bundle.
pub trait BundleLoader: Send + Sync {
    fn load(&self, package_root: &Path) -> Result<LoadedBundle>;
}

fn check_manifest(package_root: &Path, manifest: &PackageManifest) -> Result<()> {
    if manifest.code.trim().is_empty() {
        return Err(Error::package_load(package_root, "manifest code is empty"));
    }
    if manifest.api_version != STRATA_PLUGIN_API_VERSION {
        return Err(Error::package_load(
            package_root,
            format!(
                "api_version mismatch: package={}, host={}",
                manifest.api_version, STRATA_PLUGIN_API_VERSION
            ),
        ));
    }
    Ok(())
}

/// Loads dylib-backed packages: the manifest names a dynamic library inside
/// the package, and its entry symbol hands back the local symbol table.
#[derive(Debug, Default)]
pub struct DylibBundleLoader;

impl DylibBundleLoader {
    pub fn new() -> Self {
        Self
    }
}

impl BundleLoader for DylibBundleLoader {
    fn load(&self, package_root: &Path) -> Result<LoadedBundle> {
        let manifest_path = manifest_path_for_package_root(package_root);
        let manifest = read_manifest(&manifest_path)
            .map_err(|e| Error::package_load(package_root, format!("bad manifest: {e}")))?;
        check_manifest(package_root, &manifest)?;

        let Some(library_rel) = manifest.library.as_deref() else {
            return Err(Error::package_load(
                package_root,
                "manifest declares no library",
            ));
        };
        let library_path = package_root.join(library_rel);
        if !library_path.exists() {
            return Err(Error::package_load(
                package_root,
                format!("library not found: {}", library_path.display()),
            ));
        }

        // SAFETY: loading a dynamic library and calling its entry symbol is
        // inherently unsafe; the entry contract is checked below.
        let lib = unsafe { Library::new(&library_path) }.map_err(|e| {
            Error::package_load(
                package_root,
                format!("failed to load library {}: {e}", library_path.display()),
            )
        })?;

        let entry_symbol = manifest.entry_symbol();
        // SAFETY: symbol type matches the entry contract of this api_version.
        let entry: Symbol<PackageEntry> = unsafe {
            lib.get(entry_symbol.as_bytes()).map_err(|e| {
                Error::package_load(
                    package_root,
                    format!(
                        "missing entry symbol `{entry_symbol}` in {}: {e}",
                        library_path.display()
                    ),
                )
            })?
        };

        // SAFETY: the entry allocates the module with Box::into_raw and the
        // host reclaims it exactly once here. Null and version checked below.
        let module_ptr = unsafe { (entry)() };
        if module_ptr.is_null() {
            return Err(Error::package_load(
                package_root,
                "entry returned null module",
            ));
        }
        let module = unsafe { Box::from_raw(module_ptr) };
        if module.api_version != STRATA_PLUGIN_API_VERSION {
            return Err(Error::package_load(
                package_root,
                format!(
                    "module api_version mismatch: package={}, host={}",
                    module.api_version, STRATA_PLUGIN_API_VERSION
                ),
            ));
        }

        Ok(LoadedBundle::with_keepalive(
            manifest,
            module.symbols,
            Box::new(lib),
        ))
    }
}

struct StaticPackage {
    manifest: PackageManifest,
    build: fn() -> SymbolTable,
}

/// Host-linked packages registered in-process, addressed by package roots
/// whose final path component matches the registered `code`. An on-disk
/// manifest at the root, when present, overrides the registered one so a
/// directory can still carry activation defaults and a wiring descriptor.
#[derive(Default)]
pub struct StaticBundleLoader {
    packages: HashMap<String, StaticPackage>,
}

impl StaticBundleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, manifest: PackageManifest, build: fn() -> SymbolTable) {
        self.packages
            .insert(manifest.code.clone(), StaticPackage { manifest, build });
    }
}

impl BundleLoader for StaticBundleLoader {
    fn load(&self, package_root: &Path) -> Result<LoadedBundle> {
        let manifest_path = manifest_path_for_package_root(package_root);
        let manifest = if manifest_path.is_file() {
            read_manifest(&manifest_path)
                .map_err(|e| Error::package_load(package_root, format!("bad manifest: {e}")))?
        } else {
            let code = package_root
                .file_name()
                .and_then(|v| v.to_str())
                .unwrap_or_default();
            let Some(registered) = self.packages.get(code) else {
                return Err(Error::package_load(
                    package_root,
                    format!("no static package registered as `{code}`"),
                ));
            };
            registered.manifest.clone()
        };
        check_manifest(package_root, &manifest)?;

        let Some(registered) = self.packages.get(&manifest.code) else {
            return Err(Error::package_load(
                package_root,
                format!("no static package registered as `{}`", manifest.code),
            ));
        };

        Ok(LoadedBundle::new(manifest, (registered.build)()))
    }
}

#[cfg(test)]
#[path = "tests/bundle_tests.rs"]
mod tests;
