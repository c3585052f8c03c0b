//! App Mesh resource schemas
//!
//! One schema per CloudFormation resource type. Attribute names are the
//! camelCase keys the engine renders; template keys are derived from them
//! when the resource is emitted.

use meshform_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::identity::ResourceKind;

use super::resource_name;

/// App Mesh schema configuration
///
/// Combines the ResourceSchema with the CloudFormation type it is emitted as.
pub struct AppMeshSchemaConfig {
    /// AWS CloudFormation type name (e.g., "AWS::AppMesh::VirtualGateway")
    pub aws_type_name: &'static str,
    /// Resource kind this schema describes
    pub kind: ResourceKind,
    /// The resource schema with attribute definitions
    pub schema: ResourceSchema,
}

/// `meshName`, present on every App Mesh resource
fn mesh_name_attribute() -> AttributeSchema {
    AttributeSchema::new("meshName", resource_name())
        .required()
        .with_description("The name of the service mesh the resource resides in.")
}

/// `meshOwner`, the account id of the mesh owner when the mesh is shared
fn mesh_owner_attribute() -> AttributeSchema {
    AttributeSchema::new("meshOwner", AttributeType::String)
        .with_description("The AWS IAM account ID of the service mesh owner.")
}

fn spec_attribute(required: bool, description: &str) -> AttributeSchema {
    let schema = AttributeSchema::new("spec", AttributeType::Object)
        .with_description(description);
    if required { schema.required() } else { schema }
}

pub mod gateway_route;
pub mod mesh;
pub mod route;
pub mod virtual_gateway;
pub mod virtual_node;
pub mod virtual_router;

/// Schema config for a resource kind
pub fn config_for(kind: ResourceKind) -> AppMeshSchemaConfig {
    match kind {
        ResourceKind::Mesh => mesh::mesh_config(),
        ResourceKind::VirtualGateway => virtual_gateway::virtual_gateway_config(),
        ResourceKind::VirtualNode => virtual_node::virtual_node_config(),
        ResourceKind::VirtualRouter => virtual_router::virtual_router_config(),
        ResourceKind::Route => route::route_config(),
        ResourceKind::GatewayRoute => gateway_route::gateway_route_config(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use meshform_core::resource::Value;

    use super::*;

    #[test]
    fn every_kind_has_a_config_with_matching_type() {
        let mut schema_types = HashSet::new();
        for kind in ResourceKind::ALL {
            let config = config_for(kind);
            assert_eq!(config.kind, kind);
            assert_eq!(config.aws_type_name, kind.cfn_type());
            assert!(config.schema.attributes.contains_key("meshName"));
            assert!(schema_types.insert(config.schema.resource_type));
        }
    }

    #[test]
    fn gateway_route_requires_owner_and_spec() {
        let schema = config_for(ResourceKind::GatewayRoute).schema;
        let attrs = HashMap::from([("meshName".to_string(), Value::String("m1".to_string()))]);
        let errors = schema.validate(&attrs).unwrap_err();
        let missing: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            missing,
            vec![
                "Required attribute 'gatewayRouteName' is missing",
                "Required attribute 'spec' is missing",
                "Required attribute 'virtualGatewayName' is missing",
            ]
        );
    }

    #[test]
    fn mesh_name_length_is_checked() {
        let schema = config_for(ResourceKind::Mesh).schema;
        let attrs = HashMap::from([("meshName".to_string(), Value::String("x".repeat(300)))]);
        assert!(schema.validate(&attrs).is_err());
    }
}
