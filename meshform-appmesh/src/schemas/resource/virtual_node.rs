//! virtual_node schema definition
//!
//! Derived from CloudFormation resource schema: AWS::AppMesh::VirtualNode

use super::{AppMeshSchemaConfig, mesh_name_attribute, mesh_owner_attribute, spec_attribute};
use crate::identity::ResourceKind;
use meshform_core::schema::{AttributeSchema, ResourceSchema};

use crate::schemas::resource_name;

/// Returns the schema config for virtual_node (AWS::AppMesh::VirtualNode)
pub fn virtual_node_config() -> AppMeshSchemaConfig {
    AppMeshSchemaConfig {
        aws_type_name: "AWS::AppMesh::VirtualNode",
        kind: ResourceKind::VirtualNode,
        schema: ResourceSchema::new("appmesh.virtual_node")
        .with_description("Creates a virtual node within a service mesh. A virtual node acts as a logical pointer to a particular task group.")
        .attribute(mesh_name_attribute())
        .attribute(mesh_owner_attribute())
        .attribute(
            AttributeSchema::new("virtualNodeName", resource_name())
                .required()
                .with_description("The name of the virtual node."),
        )
        .attribute(spec_attribute(true, "The virtual node specification to apply.")),
    }
}
