//! virtual_gateway schema definition
//!
//! Derived from CloudFormation resource schema: AWS::AppMesh::VirtualGateway

use super::{AppMeshSchemaConfig, mesh_name_attribute, mesh_owner_attribute, spec_attribute};
use crate::identity::ResourceKind;
use meshform_core::schema::{AttributeSchema, ResourceSchema};

use crate::schemas::resource_name;

/// Returns the schema config for virtual_gateway (AWS::AppMesh::VirtualGateway)
pub fn virtual_gateway_config() -> AppMeshSchemaConfig {
    AppMeshSchemaConfig {
        aws_type_name: "AWS::AppMesh::VirtualGateway",
        kind: ResourceKind::VirtualGateway,
        schema: ResourceSchema::new("appmesh.virtual_gateway")
        .with_description("Creates a virtual gateway. A virtual gateway allows resources outside your mesh to communicate to resources inside your mesh.")
        .attribute(mesh_name_attribute())
        .attribute(mesh_owner_attribute())
        .attribute(
            AttributeSchema::new("virtualGatewayName", resource_name())
                .required()
                .with_description("The name of the virtual gateway."),
        )
        .attribute(spec_attribute(true, "The specifications of the virtual gateway.")),
    }
}
