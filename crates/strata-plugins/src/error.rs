use std::path::PathBuf;

use strata_plugin_api::BoxError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load package `{path}`: {details}")]
    PackageLoad { path: PathBuf, details: String },
    #[error("wiring failed for package `{package}`: {details}")]
    Wiring { package: String, details: String },
    #[error("invalid configuration: {details}")]
    Configuration { details: String },
    #[error("listener {hook} hook failed: {source}")]
    ListenerHook {
        hook: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("io failed at `{path}`: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json failed at `{path}`: {source}")]
    JsonAt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn package_load(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::PackageLoad {
            path: path.into(),
            details: details.into(),
        }
    }

    pub fn wiring(package: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Wiring {
            package: package.into(),
            details: details.into(),
        }
    }

    pub fn configuration(details: impl Into<String>) -> Self {
        Self::Configuration {
            details: details.into(),
        }
    }

    pub fn listener_hook(hook: &'static str, source: BoxError) -> Self {
        Self::ListenerHook { hook, source }
    }

    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }

    pub fn json_at(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonAt {
            path: path.into(),
            source,
        }
    }
}
