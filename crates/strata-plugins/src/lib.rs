mod activation;
mod bundle;
mod context;
mod error;
mod host;
mod manifest;
mod registry;
mod scan;
mod types;
mod wiring;

pub use activation::{ActivationHandle, ActivationOptions, ActivationState};
pub use bundle::{BundleLoader, DylibBundleLoader, LoadedBundle, StaticBundleLoader};
pub use context::LoadContext;
pub use error::{Error, Result};
pub use host::{ActivationInfo, ActivationLoadReport, HostEnv, PluginHost};
pub use manifest::{
    discover_packages, manifest_path_for_package_root, read_manifest,
    wiring_descriptor_path_for_package_root, write_manifest, ComponentDeclarations,
    DiscoveredPackage, PackageManifest, PACKAGE_MANIFEST_FILE_NAME, WIRING_DESCRIPTOR_FILE_NAME,
};
pub use registry::{CapabilityRegistry, ComponentInstance, RegistryEntry};
pub use types::{CapabilityKind, IdentityKind};
pub use wiring::{ComponentWiring, WiringDescriptor, WiringScope};

pub use strata_plugin_api::{
    ActivationListener, BoxError, Component, ComponentCtor, HostContext, ListenerCtor,
    ServiceResolver, SymbolDef, SymbolTable, STRATA_PACKAGE_ENTRY_SYMBOL,
    STRATA_PLUGIN_API_VERSION,
};

#[cfg(test)]
#[path = "tests/support.rs"]
mod testsupport;

