//! Token - Names that are only known at render time
//!
//! A resource the caller leaves unnamed holds an unresolved placeholder. The
//! render pass resolves it exactly once, against the scope the resource is
//! rendered in, and from then on only the resolved string is used.

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::scope::Scope;

/// Physical name of a declared resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Name {
    /// Name chosen by the caller
    Literal(String),
    /// Placeholder; resolved to `Scope::unique_id` of the resource's path
    #[default]
    Unresolved,
}

impl Name {
    pub fn literal(name: impl Into<String>) -> Self {
        Name::Literal(name.into())
    }

    /// Resolve against the scope, using `path` as the construct path of the
    /// resource that owns this name
    pub fn resolve(self, scope: &dyn Scope, path: &[&str]) -> String {
        match self {
            Name::Literal(name) => name,
            Name::Unresolved => {
                let name = scope.unique_id(path);
                log::debug!("resolved name for {} to {}", path.join("/"), name);
                name
            }
        }
    }
}

impl From<Option<String>> for Name {
    fn from(name: Option<String>) -> Self {
        name.map_or(Name::Unresolved, Name::Literal)
    }
}

/// An absent or null name deserializes as `Unresolved`; use with
/// `#[serde(default)]`
impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<String>::deserialize(deserializer).map(Name::from)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Literal(name) => write!(f, "{}", name),
            Name::Unresolved => write!(f, "${{Token[unresolved name]}}"),
        }
    }
}
