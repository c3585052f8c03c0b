//! Resource identity resolution
//!
//! Every App Mesh resource is addressed by a name and an ARN whose resource
//! path nests it under its owners:
//!
//! ```text
//! mesh/{mesh}
//! mesh/{mesh}/virtualGateway/{gateway}
//! mesh/{mesh}/virtualGateway/{gateway}/gatewayRoute/{route}
//! ```
//!
//! An identity is built in one of three ways: for a resource declared in this
//! scope (`declared`), for an existing resource known by its ARN (`from_arn`),
//! or for an existing resource known by its name and owner (`from_attributes`).
//! Name and ARN are consistent on every path. Owners are shared and never
//! re-resolved.

use std::fmt;
use std::sync::Arc;

use meshform_core::scope::Scope;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, MalformedIdentityError};

/// Service segment of every App Mesh ARN
pub const SERVICE: &str = "appmesh";

/// App Mesh resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Mesh,
    VirtualGateway,
    VirtualNode,
    VirtualRouter,
    Route,
    GatewayRoute,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Mesh,
        ResourceKind::VirtualGateway,
        ResourceKind::VirtualNode,
        ResourceKind::VirtualRouter,
        ResourceKind::Route,
        ResourceKind::GatewayRoute,
    ];

    /// CloudFormation type name
    pub fn cfn_type(&self) -> &'static str {
        match self {
            ResourceKind::Mesh => "AWS::AppMesh::Mesh",
            ResourceKind::VirtualGateway => "AWS::AppMesh::VirtualGateway",
            ResourceKind::VirtualNode => "AWS::AppMesh::VirtualNode",
            ResourceKind::VirtualRouter => "AWS::AppMesh::VirtualRouter",
            ResourceKind::Route => "AWS::AppMesh::Route",
            ResourceKind::GatewayRoute => "AWS::AppMesh::GatewayRoute",
        }
    }

    /// Segment naming this kind in an ARN resource path
    pub fn path_segment(&self) -> &'static str {
        match self {
            ResourceKind::Mesh => "mesh",
            ResourceKind::VirtualGateway => "virtualGateway",
            ResourceKind::VirtualNode => "virtualNode",
            ResourceKind::VirtualRouter => "virtualRouter",
            ResourceKind::Route => "route",
            ResourceKind::GatewayRoute => "gatewayRoute",
        }
    }

    /// Kind of the resource this kind is nested under
    pub fn owner_kind(&self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Mesh => None,
            ResourceKind::VirtualGateway
            | ResourceKind::VirtualNode
            | ResourceKind::VirtualRouter => Some(ResourceKind::Mesh),
            ResourceKind::Route => Some(ResourceKind::VirtualRouter),
            ResourceKind::GatewayRoute => Some(ResourceKind::VirtualGateway),
        }
    }

    /// Owner segment used when formatting an ARN from attributes.
    ///
    /// Gateway routes are formatted under `virtualRouter` rather than
    /// `virtualGateway`.
    pub fn attribute_owner_segment(&self) -> Option<&'static str> {
        match self {
            ResourceKind::GatewayRoute => Some(ResourceKind::VirtualRouter.path_segment()),
            _ => self.owner_kind().map(|owner| owner.path_segment()),
        }
    }

    /// Kinds from the mesh down to this kind
    pub fn lineage(&self) -> Vec<ResourceKind> {
        let mut lineage = vec![*self];
        while let Some(owner) = lineage.last().and_then(|k| k.owner_kind()) {
            lineage.push(owner);
        }
        lineage.reverse();
        lineage
    }

    /// Number of `/`-separated segments in this kind's ARN resource path
    pub fn path_depth(&self) -> usize {
        self.lineage().len() * 2
    }

    /// Noun used in IAM action names, e.g. `DescribeVirtualGateway`
    pub fn action_noun(&self) -> &'static str {
        match self {
            ResourceKind::Mesh => "Mesh",
            ResourceKind::VirtualGateway => "VirtualGateway",
            ResourceKind::VirtualNode => "VirtualNode",
            ResourceKind::VirtualRouter => "VirtualRouter",
            ResourceKind::Route => "Route",
            ResourceKind::GatewayRoute => "GatewayRoute",
        }
    }

    /// Plural noun used by the List action, e.g. `ListMeshes`
    pub fn plural_action_noun(&self) -> String {
        match self {
            ResourceKind::Mesh => "Meshes".to_string(),
            other => format!("{}s", other.action_noun()),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Mesh => "mesh",
            ResourceKind::VirtualGateway => "virtual gateway",
            ResourceKind::VirtualNode => "virtual node",
            ResourceKind::VirtualRouter => "virtual router",
            ResourceKind::Route => "route",
            ResourceKind::GatewayRoute => "gateway route",
        };
        f.write_str(s)
    }
}

/// Name and owner of a resource, per kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityAttributes {
    Mesh {
        mesh_name: String,
    },
    VirtualGateway {
        virtual_gateway_name: String,
        mesh: Arc<ResourceIdentity>,
    },
    VirtualNode {
        virtual_node_name: String,
        mesh: Arc<ResourceIdentity>,
    },
    VirtualRouter {
        virtual_router_name: String,
        mesh: Arc<ResourceIdentity>,
    },
    Route {
        route_name: String,
        virtual_router: Arc<ResourceIdentity>,
    },
    GatewayRoute {
        gateway_route_name: String,
        virtual_gateway: Arc<ResourceIdentity>,
    },
}

impl IdentityAttributes {
    pub fn kind(&self) -> ResourceKind {
        match self {
            IdentityAttributes::Mesh { .. } => ResourceKind::Mesh,
            IdentityAttributes::VirtualGateway { .. } => ResourceKind::VirtualGateway,
            IdentityAttributes::VirtualNode { .. } => ResourceKind::VirtualNode,
            IdentityAttributes::VirtualRouter { .. } => ResourceKind::VirtualRouter,
            IdentityAttributes::Route { .. } => ResourceKind::Route,
            IdentityAttributes::GatewayRoute { .. } => ResourceKind::GatewayRoute,
        }
    }

    fn into_parts(self) -> (ResourceKind, String, Option<Arc<ResourceIdentity>>) {
        let kind = self.kind();
        match self {
            IdentityAttributes::Mesh { mesh_name } => (kind, mesh_name, None),
            IdentityAttributes::VirtualGateway {
                virtual_gateway_name: name,
                mesh: owner,
            }
            | IdentityAttributes::VirtualNode {
                virtual_node_name: name,
                mesh: owner,
            }
            | IdentityAttributes::VirtualRouter {
                virtual_router_name: name,
                mesh: owner,
            }
            | IdentityAttributes::Route {
                route_name: name,
                virtual_router: owner,
            }
            | IdentityAttributes::GatewayRoute {
                gateway_route_name: name,
                virtual_gateway: owner,
            } => (kind, name, Some(owner)),
        }
    }
}

/// Resolved name and ARN of an App Mesh resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    kind: ResourceKind,
    name: String,
    arn: String,
    owner: Option<Arc<ResourceIdentity>>,
}

impl ResourceIdentity {
    /// Identity of a resource declared in `scope`, with its name already
    /// resolved
    pub fn declared(
        scope: &dyn Scope,
        attributes: IdentityAttributes,
    ) -> Result<Self, ConfigurationError> {
        let (kind, name, owner) = attributes.into_parts();
        check_owner(kind, owner.as_deref())?;
        let path = match &owner {
            Some(owner) => format!("{}/{}/{}", owner.resource_path(), kind.path_segment(), name),
            None => format!("{}/{}", kind.path_segment(), name),
        };
        let arn = scope.format_arn(SERVICE, &path);
        log::debug!("declared {} identity {}", kind, arn);
        Ok(Self {
            kind,
            name,
            arn,
            owner,
        })
    }

    /// Identity of an existing resource known by name and owner
    pub fn from_attributes(
        scope: &dyn Scope,
        attributes: IdentityAttributes,
    ) -> Result<Self, ConfigurationError> {
        let (kind, name, owner) = attributes.into_parts();
        check_owner(kind, owner.as_deref())?;
        let path = match (&owner, kind.attribute_owner_segment()) {
            (Some(owner), Some(segment)) => {
                let owner_path = match &owner.owner {
                    Some(grand_owner) => {
                        format!("{}/{}/{}", grand_owner.resource_path(), segment, owner.name)
                    }
                    None => format!("{}/{}", segment, owner.name),
                };
                format!("{}/{}/{}", owner_path, kind.path_segment(), name)
            }
            _ => format!("{}/{}", kind.path_segment(), name),
        };
        let arn = scope.format_arn(SERVICE, &path);
        log::debug!("imported {} identity {} from attributes", kind, arn);
        Ok(Self {
            kind,
            name,
            arn,
            owner,
        })
    }

    /// Identity of an existing resource known by its ARN.
    ///
    /// The name is the last segment of the resource path. Owners are built
    /// from the leading segments. The path must have exactly the kind's
    /// depth, name the expected kinds and contain no empty names.
    pub fn from_arn(
        scope: &dyn Scope,
        kind: ResourceKind,
        arn: &str,
    ) -> Result<Self, MalformedIdentityError> {
        let malformed = |reason: String| MalformedIdentityError::new(kind, arn, reason);

        let parsed = scope.parse_arn(arn).map_err(|e| malformed(e.to_string()))?;
        if parsed.service != SERVICE {
            return Err(malformed(format!(
                "expected service '{}', got '{}'",
                SERVICE, parsed.service
            )));
        }

        let segments: Vec<&str> = parsed.resource.split('/').collect();
        if segments.len() != kind.path_depth() {
            return Err(malformed(format!(
                "expected {} path segments, got {}",
                kind.path_depth(),
                segments.len()
            )));
        }

        let lineage = kind.lineage();
        let mut owner: Option<Arc<ResourceIdentity>> = None;
        for (level, level_kind) in lineage.iter().copied().enumerate() {
            let segment = segments[level * 2];
            let name = segments[level * 2 + 1];

            let is_owner_level = level + 2 == lineage.len();
            let accepted = segment == level_kind.path_segment()
                || (is_owner_level && Some(segment) == kind.attribute_owner_segment());
            if !accepted {
                return Err(malformed(format!(
                    "expected '{}' at segment {}, got '{}'",
                    level_kind.path_segment(),
                    level * 2,
                    segment
                )));
            }
            if name.is_empty() {
                return Err(malformed(format!("empty {} name", level_kind)));
            }

            let identity = if level + 1 == lineage.len() {
                ResourceIdentity {
                    kind: level_kind,
                    name: name.to_string(),
                    arn: arn.to_string(),
                    owner: owner.take(),
                }
            } else {
                let path = match &owner {
                    Some(o) => format!("{}/{}/{}", o.resource_path(), level_kind.path_segment(), name),
                    None => format!("{}/{}", level_kind.path_segment(), name),
                };
                ResourceIdentity {
                    kind: level_kind,
                    name: name.to_string(),
                    arn: parsed.with_resource(path).to_string(),
                    owner: owner.take(),
                }
            };
            owner = Some(Arc::new(identity));
        }

        let resolved = owner
            .map(Arc::unwrap_or_clone)
            .ok_or_else(|| malformed("empty resource path".to_string()))?;
        log::debug!("imported {} identity {} from ARN", kind, arn);
        Ok(resolved)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arn(&self) -> &str {
        &self.arn
    }

    /// The mesh, virtual gateway or virtual router this resource is nested under
    pub fn owner(&self) -> Option<&Arc<ResourceIdentity>> {
        self.owner.as_ref()
    }

    /// Name of the mesh this resource resides in
    pub fn mesh_name(&self) -> &str {
        match &self.owner {
            Some(owner) => owner.mesh_name(),
            None => &self.name,
        }
    }

    /// Canonical ARN resource path, e.g. `mesh/m1/virtualNode/n1`
    pub fn resource_path(&self) -> String {
        match &self.owner {
            Some(owner) => format!(
                "{}/{}/{}",
                owner.resource_path(),
                self.kind.path_segment(),
                self.name
            ),
            None => format!("{}/{}", self.kind.path_segment(), self.name),
        }
    }
}

fn check_owner(
    kind: ResourceKind,
    owner: Option<&ResourceIdentity>,
) -> Result<(), ConfigurationError> {
    match (kind.owner_kind(), owner) {
        (Some(expected), Some(owner)) if owner.kind != expected => {
            Err(ConfigurationError::OwnerKindMismatch {
                expected,
                got: owner.kind,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshform_core::scope::Stack;

    const PREFIX: &str = "arn:aws:appmesh:us-east-1:123456789012:";

    fn stack() -> Stack {
        Stack::new("MeshStack", "us-east-1", "123456789012")
    }

    fn mesh(scope: &dyn Scope) -> Arc<ResourceIdentity> {
        Arc::new(
            ResourceIdentity::declared(
                scope,
                IdentityAttributes::Mesh {
                    mesh_name: "m1".to_string(),
                },
            )
            .unwrap(),
        )
    }

    fn gateway(scope: &dyn Scope) -> Arc<ResourceIdentity> {
        Arc::new(
            ResourceIdentity::declared(
                scope,
                IdentityAttributes::VirtualGateway {
                    virtual_gateway_name: "vg1".to_string(),
                    mesh: mesh(scope),
                },
            )
            .unwrap(),
        )
    }

    #[test]
    fn path_depths() {
        assert_eq!(ResourceKind::Mesh.path_depth(), 2);
        assert_eq!(ResourceKind::VirtualNode.path_depth(), 4);
        assert_eq!(ResourceKind::GatewayRoute.path_depth(), 6);
        assert_eq!(
            ResourceKind::Route.lineage(),
            vec![
                ResourceKind::Mesh,
                ResourceKind::VirtualRouter,
                ResourceKind::Route
            ]
        );
    }

    #[test]
    fn declared_identity_nests_under_owner() {
        let stack = stack();
        let vg = gateway(&stack);
        assert_eq!(vg.name(), "vg1");
        assert_eq!(vg.mesh_name(), "m1");
        assert_eq!(vg.arn(), format!("{}mesh/m1/virtualGateway/vg1", PREFIX));

        let route = ResourceIdentity::declared(
            &stack,
            IdentityAttributes::GatewayRoute {
                gateway_route_name: "r1".to_string(),
                virtual_gateway: vg.clone(),
            },
        )
        .unwrap();
        assert_eq!(
            route.arn(),
            format!("{}mesh/m1/virtualGateway/vg1/gatewayRoute/r1", PREFIX)
        );
        assert!(Arc::ptr_eq(route.owner().unwrap(), &vg));
    }

    #[test]
    fn gateway_route_from_attributes_uses_virtual_router_segment() {
        let stack = stack();
        let route = ResourceIdentity::from_attributes(
            &stack,
            IdentityAttributes::GatewayRoute {
                gateway_route_name: "r1".to_string(),
                virtual_gateway: gateway(&stack),
            },
        )
        .unwrap();
        assert_eq!(route.name(), "r1");
        assert_eq!(
            route.arn(),
            format!("{}mesh/m1/virtualRouter/vg1/gatewayRoute/r1", PREFIX)
        );
        assert_eq!(route.mesh_name(), "m1");
    }

    #[test]
    fn route_from_attributes() {
        let stack = stack();
        let router = Arc::new(
            ResourceIdentity::from_attributes(
                &stack,
                IdentityAttributes::VirtualRouter {
                    virtual_router_name: "vr1".to_string(),
                    mesh: mesh(&stack),
                },
            )
            .unwrap(),
        );
        let route = ResourceIdentity::from_attributes(
            &stack,
            IdentityAttributes::Route {
                route_name: "r1".to_string(),
                virtual_router: router,
            },
        )
        .unwrap();
        assert_eq!(
            route.arn(),
            format!("{}mesh/m1/virtualRouter/vr1/route/r1", PREFIX)
        );
    }

    #[test]
    fn from_attributes_rejects_wrong_owner_kind() {
        let stack = stack();
        let err = ResourceIdentity::from_attributes(
            &stack,
            IdentityAttributes::Route {
                route_name: "r1".to_string(),
                virtual_router: gateway(&stack),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::OwnerKindMismatch {
                expected: ResourceKind::VirtualRouter,
                got: ResourceKind::VirtualGateway,
            }
        );
        assert_eq!(
            err.to_string(),
            "expected a virtual router as owner, got a virtual gateway"
        );
    }

    #[test]
    fn from_arn_resolves_name_and_owners() {
        let arn = "arn:aws:appmesh:eu-west-1:210987654321:mesh/m1/virtualRouter/vr1/route/r1";
        let route = ResourceIdentity::from_arn(&stack(), ResourceKind::Route, arn).unwrap();
        assert_eq!(route.name(), "r1");
        assert_eq!(route.arn(), arn);
        assert_eq!(route.mesh_name(), "m1");

        let router = route.owner().unwrap();
        assert_eq!(router.kind(), ResourceKind::VirtualRouter);
        assert_eq!(router.name(), "vr1");
        assert_eq!(
            router.arn(),
            "arn:aws:appmesh:eu-west-1:210987654321:mesh/m1/virtualRouter/vr1"
        );
        let mesh = router.owner().unwrap();
        assert_eq!(mesh.kind(), ResourceKind::Mesh);
        assert_eq!(mesh.arn(), "arn:aws:appmesh:eu-west-1:210987654321:mesh/m1");
        assert!(mesh.owner().is_none());
    }

    #[test]
    fn from_arn_accepts_both_gateway_route_forms() {
        let stack = stack();
        for owner_segment in ["virtualGateway", "virtualRouter"] {
            let arn = format!("{}mesh/m1/{}/vg1/gatewayRoute/r1", PREFIX, owner_segment);
            let route =
                ResourceIdentity::from_arn(&stack, ResourceKind::GatewayRoute, &arn).unwrap();
            assert_eq!(route.name(), "r1");
            let gateway = route.owner().unwrap();
            assert_eq!(gateway.kind(), ResourceKind::VirtualGateway);
            assert_eq!(gateway.name(), "vg1");
            assert_eq!(gateway.arn(), format!("{}mesh/m1/virtualGateway/vg1", PREFIX));
        }
    }

    #[test]
    fn from_arn_round_trips_from_attributes() {
        let stack = stack();
        let imported = ResourceIdentity::from_attributes(
            &stack,
            IdentityAttributes::GatewayRoute {
                gateway_route_name: "r1".to_string(),
                virtual_gateway: gateway(&stack),
            },
        )
        .unwrap();
        let parsed =
            ResourceIdentity::from_arn(&stack, ResourceKind::GatewayRoute, imported.arn()).unwrap();
        assert_eq!(parsed.name(), imported.name());
        assert_eq!(parsed.arn(), imported.arn());
        assert_eq!(parsed.mesh_name(), "m1");
    }

    #[test]
    fn from_arn_is_strict() {
        let stack = stack();
        let cases = [
            (ResourceKind::VirtualNode, "not-an-arn".to_string()),
            (ResourceKind::VirtualNode, format!("{}mesh/m1", PREFIX)),
            (ResourceKind::VirtualNode, format!("{}mesh/m1/virtualNode/", PREFIX)),
            (ResourceKind::VirtualNode, format!("{}mesh/m1/virtualGateway/n1", PREFIX)),
            (ResourceKind::Mesh, format!("{}mesh/m1/virtualNode/n1", PREFIX)),
            (ResourceKind::Route, format!("{}mesh/m1/virtualGateway/vg1/route/r1", PREFIX)),
            (
                ResourceKind::Mesh,
                "arn:aws:s3:us-east-1:123456789012:mesh/m1".to_string(),
            ),
        ];
        for (kind, arn) in cases {
            let err = ResourceIdentity::from_arn(&stack, kind, &arn).unwrap_err();
            assert_eq!(err.kind, kind);
            assert_eq!(err.arn, arn);
        }
    }

    #[test]
    fn short_arn_reports_segment_count() {
        let err = ResourceIdentity::from_arn(
            &stack(),
            ResourceKind::GatewayRoute,
            &format!("{}mesh/m1/virtualGateway/vg1", PREFIX),
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected 6 path segments, got 4"));
    }

    #[test]
    fn action_nouns() {
        assert_eq!(ResourceKind::Mesh.plural_action_noun(), "Meshes");
        assert_eq!(
            ResourceKind::GatewayRoute.plural_action_noun(),
            "GatewayRoutes"
        );
    }
}
