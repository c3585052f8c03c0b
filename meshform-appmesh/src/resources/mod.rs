//! Resource declarations
//!
//! A mesh owns its virtual gateways, nodes and routers, which in turn own
//! their routes. Rendering walks this tree depth-first in declaration order:
//! each declaration resolves its name, binds its listeners and specs, and
//! yields one validated `RenderedResource` per App Mesh resource.

pub mod gateway_route;
pub mod mesh;
pub mod route;
pub mod virtual_gateway;
pub mod virtual_node;
pub mod virtual_router;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use meshform_core::resource::Resource;
use meshform_core::schema::TypeError;
use meshform_core::scope::Scope;
use meshform_core::token::Name;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, Error, Result};
use crate::identity::{ResourceIdentity, ResourceKind};
use crate::schemas;

pub use gateway_route::GatewayRoute;
pub use mesh::Mesh;
pub use route::Route;
pub use virtual_gateway::VirtualGateway;
pub use virtual_node::VirtualNode;
pub use virtual_router::VirtualRouter;

/// A resource ready for emission
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResource {
    pub logical_id: String,
    pub identity: Arc<ResourceIdentity>,
    pub resource: Resource,
}

/// Construct ids from the root declaration down to a resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructPath(Vec<String>);

impl ConstructPath {
    pub fn root(id: impl Into<String>) -> Self {
        Self(vec![id.into()])
    }

    pub fn child(&self, id: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(id.into());
        Self(segments)
    }

    pub fn segments(&self) -> Vec<&str> {
        self.0.iter().map(String::as_str).collect()
    }

    /// Template logical id of the resource at this path
    pub fn logical_id(&self, scope: &dyn Scope) -> String {
        scope.unique_id(&self.segments())
    }

    /// Resolve a declared name; unnamed resources are named after their path
    pub fn resolve_name(&self, scope: &dyn Scope, name: Name) -> String {
        name.resolve(scope, &self.segments())
    }
}

impl fmt::Display for ConstructPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// The already rendered declaration a child is rendered under
pub struct Parent<'a> {
    pub identity: &'a Arc<ResourceIdentity>,
    pub path: &'a ConstructPath,
    pub logical_id: &'a str,
}

/// File access log of a virtual node or virtual gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccessLog {
    pub path: String,
}

impl AccessLog {
    pub fn file(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn bind(&self) -> std::result::Result<LoggingProperty, ConfigurationError> {
        if self.path.is_empty() {
            return Err(ConfigurationError::Empty { field: "path" });
        }
        Ok(LoggingProperty {
            access_log: AccessLogProperty {
                file: FileAccessLogProperty {
                    path: self.path.clone(),
                },
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingProperty {
    pub access_log: AccessLogProperty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessLogProperty {
    pub file: FileAccessLogProperty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAccessLogProperty {
    pub path: String,
}

/// Reject a second declaration of the same name among siblings
pub(crate) fn check_unique<'a>(
    kind: ResourceKind,
    names: impl IntoIterator<Item = &'a str>,
) -> std::result::Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigurationError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Reject two rendered resources sharing a logical id, which happens when
/// sibling declarations reuse a construct id
pub(crate) fn check_logical_ids(
    resources: &[RenderedResource],
) -> std::result::Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for rendered in resources {
        if !seen.insert(rendered.logical_id.as_str()) {
            return Err(ConfigurationError::DuplicateLogicalId {
                logical_id: rendered.logical_id.clone(),
            });
        }
    }
    Ok(())
}

/// Validate a rendered property bag against the kind's schema and wrap it
/// for emission
pub(crate) fn finish(
    identity: Arc<ResourceIdentity>,
    logical_id: String,
    properties: &impl Serialize,
    depends_on: Vec<String>,
) -> Result<RenderedResource> {
    let config = schemas::resource::config_for(identity.kind());

    let json = serde_json::to_value(properties).map_err(|source| Error::Serialization {
        resource: logical_id.clone(),
        source,
    })?;
    let mut resource = Resource::from_properties(config.aws_type_name, &logical_id, &json)
        .ok_or_else(|| Error::Schema {
            resource: logical_id.clone(),
            errors: vec![TypeError::TypeMismatch {
                expected: "Object".to_string(),
                got: "non-object".to_string(),
            }],
        })?;
    config
        .schema
        .validate(&resource.attributes)
        .map_err(|errors| Error::Schema {
            resource: logical_id.clone(),
            errors,
        })?;
    resource.depends_on = depends_on;

    log::debug!(
        "rendered {} {} as {}",
        identity.kind(),
        identity.name(),
        logical_id
    );
    Ok(RenderedResource {
        logical_id,
        identity,
        resource,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshform_core::scope::Stack;
    use serde_json::json;

    #[test]
    fn construct_path_drives_logical_ids_and_names() {
        let stack = Stack::new("S", "us-east-1", "123456789012");
        let path = ConstructPath::root("Mesh").child("Gateway");
        assert_eq!(path.to_string(), "Mesh/Gateway");
        assert_eq!(path.logical_id(&stack), stack.unique_id(&["Mesh", "Gateway"]));
        assert_eq!(
            path.resolve_name(&stack, Name::Unresolved),
            path.logical_id(&stack)
        );
        assert_eq!(path.resolve_name(&stack, Name::literal("gw")), "gw");
    }

    #[test]
    fn access_log_renders_file_path() {
        let rendered = AccessLog::file("/dev/stdout").bind().unwrap();
        assert_eq!(
            serde_json::to_value(rendered).unwrap(),
            json!({"accessLog": {"file": {"path": "/dev/stdout"}}})
        );
        assert!(AccessLog::file("").bind().is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        assert!(check_unique(ResourceKind::VirtualNode, ["a", "b"]).is_ok());
        assert_eq!(
            check_unique(ResourceKind::VirtualNode, ["a", "b", "a"]),
            Err(ConfigurationError::DuplicateName {
                kind: ResourceKind::VirtualNode,
                name: "a".to_string()
            })
        );
    }
}
