//! mesh schema definition
//!
//! Derived from CloudFormation resource schema: AWS::AppMesh::Mesh

use super::{AppMeshSchemaConfig, mesh_name_attribute, spec_attribute};
use crate::identity::ResourceKind;
use meshform_core::schema::ResourceSchema;

/// Returns the schema config for mesh (AWS::AppMesh::Mesh)
pub fn mesh_config() -> AppMeshSchemaConfig {
    AppMeshSchemaConfig {
        aws_type_name: "AWS::AppMesh::Mesh",
        kind: ResourceKind::Mesh,
        schema: ResourceSchema::new("appmesh.mesh")
        .with_description("Creates a service mesh. A service mesh is a logical boundary for network traffic between services.")
        .attribute(mesh_name_attribute())
        .attribute(spec_attribute(false, "The service mesh specification to apply.")),
    }
}
