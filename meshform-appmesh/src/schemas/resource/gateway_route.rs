//! gateway_route schema definition
//!
//! Derived from CloudFormation resource schema: AWS::AppMesh::GatewayRoute

use super::{AppMeshSchemaConfig, mesh_name_attribute, mesh_owner_attribute, spec_attribute};
use crate::identity::ResourceKind;
use meshform_core::schema::{AttributeSchema, ResourceSchema};

use crate::schemas::resource_name;

/// Returns the schema config for gateway_route (AWS::AppMesh::GatewayRoute)
pub fn gateway_route_config() -> AppMeshSchemaConfig {
    AppMeshSchemaConfig {
        aws_type_name: "AWS::AppMesh::GatewayRoute",
        kind: ResourceKind::GatewayRoute,
        schema: ResourceSchema::new("appmesh.gateway_route")
        .with_description("Creates a gateway route. A gateway route is attached to a virtual gateway and routes traffic to an existing virtual service.")
        .attribute(mesh_name_attribute())
        .attribute(mesh_owner_attribute())
        .attribute(
            AttributeSchema::new("gatewayRouteName", resource_name())
                .required()
                .with_description("The name of the gateway route."),
        )
        .attribute(
            AttributeSchema::new("virtualGatewayName", resource_name())
                .required()
                .with_description("The virtual gateway that the gateway route is associated with."),
        )
        .attribute(spec_attribute(true, "The specifications of the gateway route.")),
    }
}
