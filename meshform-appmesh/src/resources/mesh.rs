//! Mesh declaration

use std::collections::HashMap;
use std::sync::Arc;

use meshform_core::scope::Scope;
use meshform_core::token::Name;
use serde::{Deserialize, Serialize};

use super::{
    ConstructPath, Parent, RenderedResource, VirtualGateway, VirtualNode, VirtualRouter,
    check_logical_ids, check_unique, finish,
};
use crate::error::Result;
use crate::identity::{IdentityAttributes, ResourceIdentity, ResourceKind};

/// Whether traffic may leave the mesh for destinations outside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EgressFilter {
    AllowAll,
    DropAll,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Mesh {
    pub id: String,
    #[serde(default)]
    pub name: Name,
    #[serde(default)]
    pub egress_filter: Option<EgressFilter>,
    #[serde(default)]
    pub virtual_gateways: Vec<VirtualGateway>,
    #[serde(default)]
    pub virtual_nodes: Vec<VirtualNode>,
    #[serde(default)]
    pub virtual_routers: Vec<VirtualRouter>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EgressFilterProperty {
    #[serde(rename = "type")]
    filter_type: EgressFilter,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeshSpecProperty {
    egress_filter: EgressFilterProperty,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeshProperties {
    mesh_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    spec: Option<MeshSpecProperty>,
}

impl Mesh {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Name::Unresolved,
            egress_filter: None,
            virtual_gateways: Vec::new(),
            virtual_nodes: Vec::new(),
            virtual_routers: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Name::literal(name);
        self
    }

    pub fn with_egress_filter(mut self, egress_filter: EgressFilter) -> Self {
        self.egress_filter = Some(egress_filter);
        self
    }

    pub fn add_virtual_gateway(mut self, gateway: VirtualGateway) -> Self {
        self.virtual_gateways.push(gateway);
        self
    }

    pub fn add_virtual_node(mut self, node: VirtualNode) -> Self {
        self.virtual_nodes.push(node);
        self
    }

    pub fn add_virtual_router(mut self, router: VirtualRouter) -> Self {
        self.virtual_routers.push(router);
        self
    }

    /// Render the mesh and everything declared under it.
    ///
    /// The mesh comes first, followed by gateways with their gateway routes,
    /// nodes, and routers with their routes.
    pub fn render(self, scope: &dyn Scope) -> Result<Vec<RenderedResource>> {
        let path = ConstructPath::root(&self.id);
        let mesh_name = path.resolve_name(scope, self.name);
        let identity = Arc::new(ResourceIdentity::declared(
            scope,
            IdentityAttributes::Mesh {
                mesh_name: mesh_name.clone(),
            },
        )?);
        let logical_id = path.logical_id(scope);

        let properties = MeshProperties {
            mesh_name,
            spec: self.egress_filter.map(|filter_type| MeshSpecProperty {
                egress_filter: EgressFilterProperty { filter_type },
            }),
        };
        let mut rendered = vec![finish(
            identity.clone(),
            logical_id.clone(),
            &properties,
            Vec::new(),
        )?];

        let parent = Parent {
            identity: &identity,
            path: &path,
            logical_id: &logical_id,
        };

        let mut gateway_names = Vec::new();
        for gateway in self.virtual_gateways {
            let resources = gateway.render(scope, &parent)?;
            gateway_names.extend(names_of(&resources, ResourceKind::VirtualGateway));
            rendered.extend(resources);
        }
        check_unique(
            ResourceKind::VirtualGateway,
            gateway_names.iter().map(String::as_str),
        )?;

        let mut node_names = Vec::new();
        let mut node_logical_ids = HashMap::new();
        for node in self.virtual_nodes {
            let resource = node.render(scope, &parent)?;
            node_names.push(resource.identity.name().to_string());
            node_logical_ids.insert(
                resource.identity.name().to_string(),
                resource.logical_id.clone(),
            );
            rendered.push(resource);
        }
        check_unique(
            ResourceKind::VirtualNode,
            node_names.iter().map(String::as_str),
        )?;

        let mut router_names = Vec::new();
        for router in self.virtual_routers {
            let resources = router.render(scope, &parent, &node_logical_ids)?;
            router_names.extend(names_of(&resources, ResourceKind::VirtualRouter));
            rendered.extend(resources);
        }
        check_unique(
            ResourceKind::VirtualRouter,
            router_names.iter().map(String::as_str),
        )?;

        check_logical_ids(&rendered)?;

        log::debug!(
            "rendered mesh {} with {} resource(s)",
            identity.name(),
            rendered.len()
        );
        Ok(rendered)
    }
}

fn names_of(resources: &[RenderedResource], kind: ResourceKind) -> Vec<String> {
    resources
        .iter()
        .filter(|r| r.identity.kind() == kind)
        .map(|r| r.identity.name().to_string())
        .collect()
}
