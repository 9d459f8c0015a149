use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::{CapabilityKind, IdentityKind};

pub const PACKAGE_MANIFEST_FILE_NAME: &str = "package.json";
pub const WIRING_DESCRIPTOR_FILE_NAME: &str = "wiring.json";

/// Declarative metadata bundled at a package root.
///
/// The per-kind component lists replace runtime marker scanning: a package
/// states up front which exported symbols serve which capability kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    pub code: String,
    pub api_version: u32,

    #[serde(default)]
    pub name: Option<String>,

    /// Relative path of the dynamic library inside the package, for
    /// dylib-backed bundles. Host-linked packages leave it out.
    #[serde(default)]
    pub library: Option<String>,

    #[serde(default)]
    pub entry_symbol: Option<String>,

    #[serde(default)]
    pub components: ComponentDeclarations,

    #[serde(default)]
    pub listener: Option<String>,

    /// Activation defaults used by directory loading.
    #[serde(default)]
    pub wiring: bool,

    #[serde(default)]
    pub identity: IdentityKind,
}

impl PackageManifest {
    pub fn entry_symbol(&self) -> &str {
        self.entry_symbol
            .as_deref()
            .unwrap_or(strata_plugin_api::STRATA_PACKAGE_ENTRY_SYMBOL)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentDeclarations {
    #[serde(default)]
    pub pattern: Vec<String>,

    #[serde(default)]
    pub partner: Vec<String>,

    #[serde(default)]
    pub extension: Vec<String>,
}

impl ComponentDeclarations {
    pub fn for_kind(&self, kind: CapabilityKind) -> &[String] {
        match kind {
            CapabilityKind::Pattern => &self.pattern,
            CapabilityKind::Partner => &self.partner,
            CapabilityKind::Extension => &self.extension,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveredPackage {
    pub root_dir: PathBuf,
    pub manifest: PackageManifest,
}

pub fn manifest_path_for_package_root(root: &Path) -> PathBuf {
    root.join(PACKAGE_MANIFEST_FILE_NAME)
}

pub fn wiring_descriptor_path_for_package_root(root: &Path) -> PathBuf {
    root.join(WIRING_DESCRIPTOR_FILE_NAME)
}

pub fn read_manifest(path: &Path) -> Result<PackageManifest> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
    serde_json::from_str::<PackageManifest>(&text).map_err(|e| Error::json_at(path, e))
}

pub fn write_manifest(root: &Path, manifest: &PackageManifest) -> Result<()> {
    let path = manifest_path_for_package_root(root);
    let text = serde_json::to_string_pretty(manifest).map_err(|e| Error::json_at(&path, e))?;
    std::fs::write(&path, text).map_err(|e| Error::io_at(&path, e))
}

/// Walks a packages directory for manifests, skipping unreadable or
/// blank-`code` ones with a warning. Result order is deterministic.
pub fn discover_packages(dir: impl AsRef<Path>) -> Result<Vec<DiscoveredPackage>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .follow_links(false)
        .max_depth(4)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy() != PACKAGE_MANIFEST_FILE_NAME {
            continue;
        }

        let manifest_path = entry.path().to_path_buf();
        let Some(root_dir) = manifest_path.parent().map(Path::to_path_buf) else {
            continue;
        };

        let manifest = match read_manifest(&manifest_path) {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    target: "strata_plugins::discover",
                    manifest = %manifest_path.display(),
                    "skip unreadable package manifest: {e}"
                );
                continue;
            }
        };

        if manifest.code.trim().is_empty() {
            warn!(
                target: "strata_plugins::discover",
                manifest = %manifest_path.display(),
                "skip package manifest with empty code"
            );
            continue;
        }

        out.push(DiscoveredPackage { root_dir, manifest });
    }

    out.sort_by(|a, b| {
        a.manifest.code.cmp(&b.manifest.code).then_with(|| {
            a.root_dir
                .to_string_lossy()
                .cmp(&b.root_dir.to_string_lossy())
        })
    });
    Ok(out)
}

#[cfg(test)]
#[path = "tests/manifest_tests.rs"]
mod tests;
