//! Route declaration

use std::collections::HashMap;
use std::sync::Arc;

use meshform_core::scope::Scope;
use meshform_core::token::Name;
use serde::{Deserialize, Serialize};

use super::{Parent, RenderedResource, finish};
use crate::error::Result;
use crate::identity::{IdentityAttributes, ResourceIdentity};
use crate::route_spec::{RouteSpec, RouteSpecProperty};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Route {
    pub id: String,
    #[serde(default)]
    pub name: Name,
    pub spec: RouteSpec,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteProperties {
    mesh_name: String,
    virtual_router_name: String,
    route_name: String,
    spec: RouteSpecProperty,
}

impl Route {
    pub fn new(id: impl Into<String>, spec: RouteSpec) -> Self {
        Self {
            id: id.into(),
            name: Name::Unresolved,
            spec,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Name::literal(name);
        self
    }

    /// Render the route under `router`. Targets that name a node rendered in
    /// the same mesh add that node to the route's dependencies.
    pub fn render(
        self,
        scope: &dyn Scope,
        router: &Parent<'_>,
        node_logical_ids: &HashMap<String, String>,
    ) -> Result<RenderedResource> {
        let path = router.path.child(&self.id);
        let name = path.resolve_name(scope, self.name);

        let mut depends_on = vec![router.logical_id.to_string()];
        for node in self.spec.target_nodes() {
            if let Some(logical_id) = node_logical_ids.get(node)
                && !depends_on.contains(logical_id)
            {
                depends_on.push(logical_id.clone());
            }
        }
        let spec = self.spec.bind(&name)?;

        let identity = Arc::new(ResourceIdentity::declared(
            scope,
            IdentityAttributes::Route {
                route_name: name.clone(),
                virtual_router: router.identity.clone(),
            },
        )?);

        let properties = RouteProperties {
            mesh_name: identity.mesh_name().to_string(),
            virtual_router_name: router.identity.name().to_string(),
            route_name: name,
            spec,
        };
        finish(identity, path.logical_id(scope), &properties, depends_on)
    }
}
