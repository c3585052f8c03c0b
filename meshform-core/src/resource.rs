//! Resource - Rendered resources and their property bags

use std::collections::HashMap;

/// Unique identifier for a rendered resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "AWS::AppMesh::VirtualGateway")
    pub resource_type: String,
    /// Logical id of the resource within the template
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Property value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    /// Convert a JSON value into a property value.
    ///
    /// Nulls have no property representation and yield `None`; inside maps
    /// and lists they are dropped.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(|f| Value::Int(f as i64))
                }
            }
            serde_json::Value::Array(arr) => {
                Some(Value::List(arr.iter().filter_map(Value::from_json).collect()))
            }
            serde_json::Value::Object(obj) => Some(Value::Map(
                obj.iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }

    /// Convert back into JSON. Map keys come out sorted.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A rendered resource: its id plus the property bag handed to the emitter
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// Logical ids of resources that must be created first
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_dependency(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    /// Build a resource from a JSON object of properties.
    ///
    /// Returns `None` if `properties` is not an object.
    pub fn from_properties(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        properties: &serde_json::Value,
    ) -> Option<Self> {
        match Value::from_json(properties)? {
            Value::Map(attributes) => Some(Self {
                id: ResourceId::new(resource_type, name),
                attributes,
                depends_on: Vec::new(),
            }),
            _ => None,
        }
    }

    /// Property bag as a JSON object
    pub fn properties_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_drops_nulls() {
        let value = Value::from_json(&json!({"a": 1, "b": null, "c": [null, "x"]})).unwrap();
        let Value::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&Value::Int(1)));
        assert_eq!(
            map.get("c"),
            Some(&Value::List(vec![Value::String("x".to_string())]))
        );
    }

    #[test]
    fn from_properties_requires_object() {
        assert!(Resource::from_properties("T", "Id", &json!("scalar")).is_none());
        let resource = Resource::from_properties("T", "Id", &json!({"meshName": "m"})).unwrap();
        assert_eq!(resource.id.to_string(), "T.Id");
        assert_eq!(resource.properties_json(), json!({"meshName": "m"}));
    }
}
