//! Structural bounds for rendered health check policies

use meshform_core::resource::Value;
use meshform_core::schema::{AttributeSchema, AttributeType, ResourceSchema, TypeError, types};

use crate::protocol::Protocol;

/// Schema for a rendered health check policy (camelCase keys, as rendered)
pub fn health_check_policy_schema() -> ResourceSchema {
    let protocols = [Protocol::Http, Protocol::Http2, Protocol::Grpc, Protocol::Tcp]
        .iter()
        .map(|p| p.as_str().to_string())
        .collect();

    ResourceSchema::new("healthCheck")
        .with_description("Health check policy of a virtual node or virtual gateway listener")
        .attribute(
            AttributeSchema::new("healthyThreshold", AttributeType::IntRange { min: 2, max: 10 })
                .required()
                .with_description("Consecutive successful checks before marking healthy"),
        )
        .attribute(
            AttributeSchema::new("unhealthyThreshold", AttributeType::IntRange { min: 2, max: 10 })
                .required()
                .with_description("Consecutive failed checks before marking unhealthy"),
        )
        .attribute(
            AttributeSchema::new(
                "intervalMillis",
                AttributeType::IntRange {
                    min: 5000,
                    max: 300_000,
                },
            )
            .required()
            .with_description("Time between health checks"),
        )
        .attribute(
            AttributeSchema::new(
                "timeoutMillis",
                AttributeType::IntRange {
                    min: 2000,
                    max: 60_000,
                },
            )
            .required()
            .with_description("Time to wait for a health check response"),
        )
        .attribute(AttributeSchema::new("port", types::port()).required())
        .attribute(AttributeSchema::new("protocol", AttributeType::Enum(protocols)).required())
        .attribute(AttributeSchema::new("path", AttributeType::String))
}

/// Validate a rendered policy given as a JSON object
pub fn validate(policy: &serde_json::Value) -> Result<(), Vec<TypeError>> {
    match Value::from_json(policy) {
        Some(Value::Map(attributes)) => health_check_policy_schema().validate(&attributes),
        _ => Err(vec![TypeError::TypeMismatch {
            expected: "Object".to_string(),
            got: "non-object".to_string(),
        }]),
    }
}
