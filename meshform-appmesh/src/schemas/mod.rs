//! App Mesh schema definitions
//!
//! - `resource` - one schema per App Mesh resource type, checked against
//!   every rendered property bag before emission
//! - `health_check` - bounds for rendered health check policies

pub mod health_check;
pub mod resource;

use meshform_core::resource::Value;
use meshform_core::schema::AttributeType;

/// Longest name App Mesh accepts for any of its resources
pub const MAX_NAME_LENGTH: usize = 255;

/// Name of an App Mesh resource: 1 to 255 characters, no `/` since names
/// are ARN path segments
pub fn resource_name() -> AttributeType {
    AttributeType::Custom {
        name: "ResourceName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                let len = s.chars().count();
                if !(1..=MAX_NAME_LENGTH).contains(&len) {
                    Err(format!(
                        "name must be between 1 and {} characters, got {}",
                        MAX_NAME_LENGTH, len
                    ))
                } else if s.contains('/') {
                    Err(format!("name '{}' must not contain '/'", s))
                } else {
                    Ok(())
                }
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshform_core::schema::TypeError;

    #[test]
    fn resource_name_bounds() {
        let t = resource_name();
        assert!(t.validate(&Value::String("gateway".to_string())).is_ok());
        assert!(t.validate(&Value::String(String::new())).is_err());
        assert!(t.validate(&Value::String("x".repeat(256))).is_err());
        assert!(t.validate(&Value::Int(1)).is_err());
        assert_eq!(
            t.validate(&Value::String("orders/v1".to_string())),
            Err(TypeError::ValidationFailed {
                message: "name 'orders/v1' must not contain '/'".to_string(),
            })
        );
    }
}
