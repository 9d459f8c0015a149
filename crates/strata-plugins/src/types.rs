use serde::{Deserialize, Serialize};

/// Classifies what a declared component is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Pattern,
    Partner,
    Extension,
}

impl CapabilityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Partner => "partner",
            Self::Extension => "extension",
        }
    }
}

/// The identity-resolver kind selected by the caller for one activation.
///
/// A package activates as either a pattern pack or a partner pack, never
/// both, so the choice is its own type rather than a checked pair of flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    #[default]
    Pattern,
    Partner,
}

impl IdentityKind {
    pub fn capability_kind(self) -> CapabilityKind {
        match self {
            Self::Pattern => CapabilityKind::Pattern,
            Self::Partner => CapabilityKind::Partner,
        }
    }
}
