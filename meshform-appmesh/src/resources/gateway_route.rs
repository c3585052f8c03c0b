//! Gateway route declaration

use std::sync::Arc;

use meshform_core::scope::Scope;
use meshform_core::token::Name;
use serde::{Deserialize, Serialize};

use super::{Parent, RenderedResource, finish};
use crate::error::Result;
use crate::gateway_route_spec::{GatewayRouteSpec, GatewayRouteSpecProperty};
use crate::identity::{IdentityAttributes, ResourceIdentity};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GatewayRoute {
    pub id: String,
    #[serde(default)]
    pub name: Name,
    pub spec: GatewayRouteSpec,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewayRouteProperties {
    mesh_name: String,
    virtual_gateway_name: String,
    gateway_route_name: String,
    spec: GatewayRouteSpecProperty,
}

impl GatewayRoute {
    pub fn new(id: impl Into<String>, spec: GatewayRouteSpec) -> Self {
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

    pub fn render(self, scope: &dyn Scope, gateway: &Parent<'_>) -> Result<RenderedResource> {
        let path = gateway.path.child(&self.id);
        let name = path.resolve_name(scope, self.name);
        let spec = self.spec.bind(&name)?;

        let identity = Arc::new(ResourceIdentity::declared(
            scope,
            IdentityAttributes::GatewayRoute {
                gateway_route_name: name.clone(),
                virtual_gateway: gateway.identity.clone(),
            },
        )?);

        let properties = GatewayRouteProperties {
            mesh_name: identity.mesh_name().to_string(),
            virtual_gateway_name: gateway.identity.name().to_string(),
            gateway_route_name: name,
            spec,
        };
        finish(
            identity,
            path.logical_id(scope),
            &properties,
            vec![gateway.logical_id.to_string()],
        )
    }
}
