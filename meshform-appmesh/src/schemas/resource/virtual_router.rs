//! virtual_router schema definition
//!
//! Derived from CloudFormation resource schema: AWS::AppMesh::VirtualRouter

use super::{AppMeshSchemaConfig, mesh_name_attribute, mesh_owner_attribute, spec_attribute};
use crate::identity::ResourceKind;
use meshform_core::schema::{AttributeSchema, ResourceSchema};

use crate::schemas::resource_name;

/// Returns the schema config for virtual_router (AWS::AppMesh::VirtualRouter)
pub fn virtual_router_config() -> AppMeshSchemaConfig {
    AppMeshSchemaConfig {
        aws_type_name: "AWS::AppMesh::VirtualRouter",
        kind: ResourceKind::VirtualRouter,
        schema: ResourceSchema::new("appmesh.virtual_router")
        .with_description("Creates a virtual router within a service mesh. Virtual routers handle traffic for one or more virtual services.")
        .attribute(mesh_name_attribute())
        .attribute(mesh_owner_attribute())
        .attribute(
            AttributeSchema::new("virtualRouterName", resource_name())
                .required()
                .with_description("The name of the virtual router."),
        )
        .attribute(spec_attribute(true, "The virtual router specification to apply.")),
    }
}
