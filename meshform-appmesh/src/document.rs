//! Mesh document
//!
//! The serde input form of a deployment: the stack environment, the meshes
//! declared in it, and permission grants on App Mesh resources identified by
//! ARN. `render_document` runs the whole pipeline and yields resources ready
//! for emission.

use meshform_core::emitter::{ResourceEmitter, TemplateEmitter};
use meshform_core::iam::{Grant, Role};
use meshform_core::scope::{Scope, Stack};
use serde::Deserialize;

use crate::error::{ConfigurationError, Result};
use crate::grant;
use crate::identity::{ResourceIdentity, ResourceKind};
use crate::resources::{Mesh, RenderedResource, check_logical_ids, check_unique};

/// Stack name used when the document does not set one
pub const DEFAULT_STACK_NAME: &str = "Meshform";

/// Deployment environment; region and account must be set here or by the
/// caller before rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StackConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub partition: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
}

impl StackConfig {
    /// Replace region and account with the given values when present
    pub fn with_overrides(mut self, region: Option<String>, account: Option<String>) -> Self {
        if region.is_some() {
            self.region = region;
        }
        if account.is_some() {
            self.account = account;
        }
        self
    }

    pub fn to_stack(&self) -> std::result::Result<Stack, ConfigurationError> {
        let region = self
            .region
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or(ConfigurationError::MissingStackSetting { field: "region" })?;
        let account = self
            .account
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or(ConfigurationError::MissingStackSetting { field: "account" })?;
        let stack = Stack::new(
            self.name.as_deref().unwrap_or(DEFAULT_STACK_NAME),
            region,
            account,
        );
        Ok(match &self.partition {
            Some(partition) => stack.with_partition(partition),
            None => stack,
        })
    }
}

/// Permission level requested for a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Access {
    Read,
    Write,
    StreamAggregatedResources,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GrantRequest {
    pub role: Role,
    pub kind: ResourceKind,
    pub arn: String,
    pub access: Access,
}

impl GrantRequest {
    pub fn resolve(&self, scope: &dyn Scope) -> Result<Grant> {
        let identity = ResourceIdentity::from_arn(scope, self.kind, &self.arn)?;
        Ok(match self.access {
            Access::Read => grant::grant_read(&identity, &self.role),
            Access::Write => grant::grant_write(&identity, &self.role),
            Access::StreamAggregatedResources => {
                grant::grant_stream_aggregated_resources(&identity, &self.role)?
            }
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MeshDocument {
    #[serde(default)]
    pub stack: StackConfig,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub grants: Vec<GrantRequest>,
}

/// Output of `render_document`
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub stack: Stack,
    pub description: Option<String>,
    pub resources: Vec<RenderedResource>,
    pub grants: Vec<Grant>,
}

impl RenderedDocument {
    /// Emit every resource in render order
    pub fn emit_all(&self, emitter: &mut dyn ResourceEmitter) -> Result<()> {
        for rendered in &self.resources {
            emitter.emit(&rendered.resource)?;
        }
        log::info!(
            "emitted {} resource(s) for stack {}",
            self.resources.len(),
            self.stack.name
        );
        Ok(())
    }

    /// Collect all resources into a template
    pub fn to_template(&self) -> Result<TemplateEmitter> {
        let mut emitter = match &self.description {
            Some(description) => TemplateEmitter::new().with_description(description),
            None => TemplateEmitter::new(),
        };
        self.emit_all(&mut emitter)?;
        Ok(emitter)
    }
}

/// Render every mesh and resolve every grant in the document. Nothing is
/// returned unless the whole document is valid.
pub fn render_document(document: MeshDocument) -> Result<RenderedDocument> {
    let stack = document.stack.to_stack()?;
    log::info!(
        "rendering {} mesh(es) into stack {} ({}/{})",
        document.meshes.len(),
        stack.name,
        stack.region,
        stack.account
    );

    let mut resources = Vec::new();
    let mut mesh_names = Vec::new();
    for mesh in document.meshes {
        let rendered = mesh.render(&stack)?;
        if let Some(first) = rendered.first() {
            mesh_names.push(first.identity.name().to_string());
        }
        resources.extend(rendered);
    }
    check_unique(ResourceKind::Mesh, mesh_names.iter().map(String::as_str))?;
    check_logical_ids(&resources)?;

    let grants = document
        .grants
        .iter()
        .map(|request| request.resolve(&stack))
        .collect::<Result<Vec<_>>>()?;

    log::info!(
        "rendered {} resource(s) and {} grant(s)",
        resources.len(),
        grants.len()
    );
    Ok(RenderedDocument {
        stack,
        description: document.description,
        resources,
        grants,
    })
}
