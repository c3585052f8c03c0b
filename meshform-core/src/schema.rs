//! Schema - Define type schemas for property bags
//!
//! Engines define schemas for each rendered resource type (and for nested
//! records that need a structural check), so that a property bag can be
//! validated before it reaches the emitter.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer within an inclusive range
    IntRange { min: i64, max: i64 },
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// Nested record of arbitrary shape
    Object,
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Object, Value::Map(_)) => Ok(()),

            (AttributeType::IntRange { min, max }, Value::Int(n)) => {
                if n < min {
                    Err(TypeError::BelowMinimum {
                        min: *min,
                        got: *n,
                    })
                } else if n > max {
                    Err(TypeError::AboveMaximum {
                        max: *max,
                        got: *n,
                    })
                } else {
                    Ok(())
                }
            }

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::IntRange { min, max } => format!("Int({}..={})", min, max),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::Object => "Object".to_string(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("value is below the minimum threshold (expected >={min}, got {got})")]
    BelowMinimum { min: i64, got: i64 },

    #[error("value is above the maximum threshold (expected <={max}, got {got})")]
    AboveMaximum { max: i64, got: i64 },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("'{name}': {inner}")]
    InvalidAttribute { name: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource attributes.
    ///
    /// Errors are reported in attribute-name order so that messages are stable.
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        let mut names: Vec<&String> = self.attributes.keys().collect();
        names.sort();

        // Check required attributes
        for name in &names {
            if self.attributes[*name].required && !attributes.contains_key(*name) {
                errors.push(TypeError::MissingRequired {
                    name: (*name).clone(),
                });
            }
        }

        // Type check each attribute
        for name in names {
            if let Some(value) = attributes.get(name)
                && let Err(e) = self.attributes[name].attr_type.validate(value)
            {
                errors.push(TypeError::InvalidAttribute {
                    name: name.clone(),
                    inner: Box::new(e),
                });
            }
        }
        // Unknown attributes are allowed (for flexibility)

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// TCP/UDP port number
    pub fn port() -> AttributeType {
        AttributeType::IntRange { min: 1, max: 65535 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert_eq!(
            t.validate(&Value::Int(42)),
            Err(TypeError::TypeMismatch {
                expected: "String".to_string(),
                got: "Int".to_string(),
            })
        );
        assert!(t.validate(&Value::Bool(true)).is_err());
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::Enum(vec!["a".to_string(), "b".to_string()]);
        assert!(t.validate(&Value::String("a".to_string())).is_ok());
        assert!(t.validate(&Value::String("c".to_string())).is_err());
    }

    #[test]
    fn validate_int_range() {
        let t = AttributeType::IntRange { min: 2, max: 10 };
        assert!(t.validate(&Value::Int(2)).is_ok());
        assert!(t.validate(&Value::Int(10)).is_ok());
        assert_eq!(
            t.validate(&Value::Int(1)),
            Err(TypeError::BelowMinimum { min: 2, got: 1 })
        );
        assert_eq!(
            t.validate(&Value::Int(11)),
            Err(TypeError::AboveMaximum { max: 10, got: 11 })
        );
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("count", AttributeType::IntRange { min: 0, max: 10 }))
            .attribute(AttributeSchema::new("spec", AttributeType::Object));

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("my-resource".to_string()));
        attrs.insert("count".to_string(), Value::Int(5));
        attrs.insert("spec".to_string(), Value::Map(HashMap::new()));

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn invalid_attribute_is_named() {
        let schema = ResourceSchema::new("healthCheck")
            .attribute(AttributeSchema::new("port", types::port()));

        let attrs = HashMap::from([("port".to_string(), Value::Int(70000))]);
        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "'port': value is above the maximum threshold (expected <=65535, got 70000)"
        );
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("mesh")
            .attribute(AttributeSchema::new("meshName", AttributeType::String).required());

        let attrs = HashMap::new();
        let result = schema.validate(&attrs);
        assert!(matches!(
            result.unwrap_err().as_slice(),
            [TypeError::MissingRequired { name }] if name == "meshName"
        ));
    }
}
