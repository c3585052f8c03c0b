//! route schema definition
//!
//! Derived from CloudFormation resource schema: AWS::AppMesh::Route

use super::{AppMeshSchemaConfig, mesh_name_attribute, mesh_owner_attribute, spec_attribute};
use crate::identity::ResourceKind;
use meshform_core::schema::{AttributeSchema, ResourceSchema};

use crate::schemas::resource_name;

/// Returns the schema config for route (AWS::AppMesh::Route)
pub fn route_config() -> AppMeshSchemaConfig {
    AppMeshSchemaConfig {
        aws_type_name: "AWS::AppMesh::Route",
        kind: ResourceKind::Route,
        schema: ResourceSchema::new("appmesh.route")
        .with_description("Creates a route that is associated with a virtual router.")
        .attribute(mesh_name_attribute())
        .attribute(mesh_owner_attribute())
        .attribute(
            AttributeSchema::new("routeName", resource_name())
                .required()
                .with_description("The name of the route."),
        )
        .attribute(
            AttributeSchema::new("virtualRouterName", resource_name())
                .required()
                .with_description("The name of the virtual router in which to create the route."),
        )
        .attribute(spec_attribute(true, "The route specification to apply.")),
    }
}
