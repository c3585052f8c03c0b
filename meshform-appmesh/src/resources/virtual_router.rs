//! Virtual router declaration

use std::collections::HashMap;
use std::sync::Arc;

use meshform_core::scope::Scope;
use meshform_core::token::Name;
use serde::{Deserialize, Serialize};

use super::{Parent, RenderedResource, Route, check_unique, finish};
use crate::error::{ConfigurationError, Result};
use crate::identity::{IdentityAttributes, ResourceIdentity, ResourceKind};
use crate::listener::{DEFAULT_PORT, PortMapping, default_port};
use crate::protocol::Protocol;

/// Virtual routers support a single listener
pub const MAX_LISTENERS: usize = 1;

/// Port and protocol a virtual router accepts traffic on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VirtualRouterListener {
    #[serde(default = "default_port")]
    pub port: u32,
    pub protocol: Protocol,
}

impl VirtualRouterListener {
    pub fn new(port: u32, protocol: Protocol) -> Self {
        Self { port, protocol }
    }
}

impl Default for VirtualRouterListener {
    fn default() -> Self {
        Self::new(DEFAULT_PORT, Protocol::Http)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VirtualRouterListenerProperty {
    port_mapping: PortMapping,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VirtualRouterSpecProperty {
    listeners: Vec<VirtualRouterListenerProperty>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VirtualRouterProperties {
    mesh_name: String,
    virtual_router_name: String,
    spec: VirtualRouterSpecProperty,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VirtualRouter {
    pub id: String,
    #[serde(default)]
    pub name: Name,
    #[serde(default)]
    pub listeners: Vec<VirtualRouterListener>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl VirtualRouter {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Name::Unresolved,
            listeners: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Name::literal(name);
        self
    }

    pub fn add_listener(mut self, listener: VirtualRouterListener) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn add_route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Render the router followed by its routes. `node_logical_ids` maps the
    /// names of the nodes rendered in the same mesh to their logical ids, so
    /// routes can depend on the nodes they target.
    pub fn render(
        self,
        scope: &dyn Scope,
        mesh: &Parent<'_>,
        node_logical_ids: &HashMap<String, String>,
    ) -> Result<Vec<RenderedResource>> {
        let path = mesh.path.child(&self.id);
        let name = path.resolve_name(scope, self.name);

        if self.listeners.len() > MAX_LISTENERS {
            return Err(ConfigurationError::TooManyListeners {
                resource: format!("virtual router {}", name),
            }
            .into());
        }
        let listeners = if self.listeners.is_empty() {
            vec![VirtualRouterListener::default()]
        } else {
            self.listeners
        };
        let listeners = listeners
            .into_iter()
            .map(|listener| {
                PortMapping::new(listener.port, listener.protocol)
                    .map(|port_mapping| VirtualRouterListenerProperty { port_mapping })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let identity = Arc::new(ResourceIdentity::declared(
            scope,
            IdentityAttributes::VirtualRouter {
                virtual_router_name: name.clone(),
                mesh: mesh.identity.clone(),
            },
        )?);
        let logical_id = path.logical_id(scope);

        let properties = VirtualRouterProperties {
            mesh_name: identity.mesh_name().to_string(),
            virtual_router_name: name,
            spec: VirtualRouterSpecProperty { listeners },
        };
        let mut rendered = vec![finish(
            identity.clone(),
            logical_id.clone(),
            &properties,
            vec![mesh.logical_id.to_string()],
        )?];

        let parent = Parent {
            identity: &identity,
            path: &path,
            logical_id: &logical_id,
        };
        for route in self.routes {
            rendered.push(route.render(scope, &parent, node_logical_ids)?);
        }
        check_unique(
            ResourceKind::Route,
            rendered
                .iter()
                .filter(|r| r.identity.kind() == ResourceKind::Route)
                .map(|r| r.identity.name()),
        )?;

        Ok(rendered)
    }
}
