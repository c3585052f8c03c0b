//! Emitter - Trait abstracting the low-level resource constructor
//!
//! An emitter receives fully rendered, validated resources and turns them
//! into the final infrastructure description. `TemplateEmitter` produces a
//! CloudFormation-style JSON template.

use std::collections::BTreeMap;

use serde_json::json;

use crate::case_convert::keys_to_pascal_case;
use crate::resource::{Resource, ResourceId};

/// Error type for emitter operations
#[derive(Debug)]
pub struct EmitError {
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for EmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}] {}", id, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for EmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl EmitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type EmitResult<T> = Result<T, EmitError>;

/// Low-level resource constructor
pub trait ResourceEmitter {
    /// Add one rendered resource to the output
    fn emit(&mut self, resource: &Resource) -> EmitResult<()>;
}

/// Collects resources into a CloudFormation-style template
#[derive(Debug, Default)]
pub struct TemplateEmitter {
    description: Option<String>,
    resources: BTreeMap<String, serde_json::Value>,
}

impl TemplateEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// The template document. Resource keys are sorted by logical id.
    pub fn template(&self) -> serde_json::Value {
        let mut template = serde_json::Map::new();
        template.insert("AWSTemplateFormatVersion".to_string(), json!("2010-09-09"));
        if let Some(description) = &self.description {
            template.insert("Description".to_string(), json!(description));
        }
        template.insert(
            "Resources".to_string(),
            serde_json::Value::Object(self.resources.clone().into_iter().collect()),
        );
        serde_json::Value::Object(template)
    }

    pub fn to_json_pretty(&self) -> EmitResult<String> {
        serde_json::to_string_pretty(&self.template())
            .map_err(|e| EmitError::new("Failed to serialize template").with_cause(e))
    }
}

impl ResourceEmitter for TemplateEmitter {
    fn emit(&mut self, resource: &Resource) -> EmitResult<()> {
        let logical_id = &resource.id.name;
        if self.resources.contains_key(logical_id) {
            return Err(EmitError::new(format!(
                "Duplicate logical id '{}'",
                logical_id
            ))
            .for_resource(resource.id.clone()));
        }

        let mut entry = serde_json::Map::new();
        entry.insert("Type".to_string(), json!(resource.id.resource_type));
        entry.insert(
            "Properties".to_string(),
            keys_to_pascal_case(&resource.properties_json()),
        );
        if !resource.depends_on.is_empty() {
            let mut depends_on = resource.depends_on.clone();
            depends_on.sort();
            depends_on.dedup();
            entry.insert("DependsOn".to_string(), json!(depends_on));
        }

        log::debug!("emitting {}", resource.id);
        self.resources
            .insert(logical_id.clone(), serde_json::Value::Object(entry));
        Ok(())
    }
}
