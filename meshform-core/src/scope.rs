//! Scope - Stack-scoped ARN formatting and unique id generation
//!
//! A `Scope` is the platform context a resource is declared in. Engines use it
//! to format ARNs for resources they declare and to derive names for
//! resources the caller left unnamed.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Longest id `unique_id` will produce
pub const MAX_UNIQUE_ID_LENGTH: usize = 255;

/// Length of the hash suffix appended by `unique_id`
const HASH_LENGTH: usize = 8;

static ARN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:([^:]+):([^:]+):([^:]*):([^:]*):(.+)$").expect("ARN pattern is valid")
});

/// ARN parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArnError {
    #[error("'{arn}' is not of the form arn:partition:service:region:account:resource")]
    InvalidFormat { arn: String },
}

/// A parsed ARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account: String,
    /// Everything after the account, e.g. "mesh/m1/virtualGateway/vg1"
    pub resource: String,
}

impl Arn {
    pub fn parse(arn: &str) -> Result<Self, ArnError> {
        let caps = ARN_PATTERN
            .captures(arn)
            .ok_or_else(|| ArnError::InvalidFormat {
                arn: arn.to_string(),
            })?;
        Ok(Self {
            partition: caps[1].to_string(),
            service: caps[2].to_string(),
            region: caps[3].to_string(),
            account: caps[4].to_string(),
            resource: caps[5].to_string(),
        })
    }

    /// Same partition, service, region and account with a different resource
    pub fn with_resource(&self, resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account, self.resource
        )
    }
}

/// Platform context resources are declared in
pub trait Scope {
    /// Format an ARN for a resource owned by this scope's account and region
    fn format_arn(&self, service: &str, resource: &str) -> String;

    /// Deterministic id for a construct path, unique within the scope
    fn unique_id(&self, path: &[&str]) -> String;

    fn parse_arn(&self, arn: &str) -> Result<Arn, ArnError> {
        Arn::parse(arn)
    }
}

/// A deployment stack: the default `Scope`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    pub name: String,
    pub partition: String,
    pub region: String,
    pub account: String,
}

impl Stack {
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            partition: "aws".to_string(),
            region: region.into(),
            account: account.into(),
        }
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = partition.into();
        self
    }
}

impl Scope for Stack {
    fn format_arn(&self, service: &str, resource: &str) -> String {
        Arn {
            partition: self.partition.clone(),
            service: service.to_string(),
            region: self.region.clone(),
            account: self.account.clone(),
            resource: resource.to_string(),
        }
        .to_string()
    }

    /// Alphanumeric path components prefixed by the stack name, followed by
    /// an 8 character hash of the full path. Every component counts, so a
    /// child never shares its parent's id.
    fn unique_id(&self, path: &[&str]) -> String {
        let components: Vec<&str> = std::iter::once(self.name.as_str())
            .chain(path.iter().copied())
            .collect();

        let digest = Sha256::digest(components.join("/").as_bytes());
        let hash = hex::encode_upper(&digest[..HASH_LENGTH / 2]);

        let human: String = components
            .iter()
            .flat_map(|c| c.chars().filter(|ch| ch.is_ascii_alphanumeric()))
            .take(MAX_UNIQUE_ID_LENGTH - HASH_LENGTH)
            .collect();

        format!("{}{}", human, hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> Stack {
        Stack::new("MeshStack", "us-east-1", "123456789012")
    }

    #[test]
    fn parse_arn() {
        let arn = Arn::parse("arn:aws:appmesh:us-east-1:123456789012:mesh/m1/virtualNode/n1")
            .unwrap();
        assert_eq!(arn.partition, "aws");
        assert_eq!(arn.service, "appmesh");
        assert_eq!(arn.region, "us-east-1");
        assert_eq!(arn.account, "123456789012");
        assert_eq!(arn.resource, "mesh/m1/virtualNode/n1");
        assert_eq!(
            arn.to_string(),
            "arn:aws:appmesh:us-east-1:123456789012:mesh/m1/virtualNode/n1"
        );
    }

    #[test]
    fn parse_arn_rejects_garbage() {
        assert!(Arn::parse("not-an-arn").is_err());
        assert!(Arn::parse("arn:aws:appmesh:us-east-1").is_err());
        assert!(Arn::parse("arn:aws:appmesh:us-east-1:123456789012:").is_err());
    }

    #[test]
    fn format_arn_uses_stack_environment() {
        let stack = stack().with_partition("aws-cn");
        assert_eq!(
            stack.format_arn("appmesh", "mesh/m1"),
            "arn:aws-cn:appmesh:us-east-1:123456789012:mesh/m1"
        );
    }

    #[test]
    fn unique_id_is_deterministic_and_path_sensitive() {
        let stack = stack();
        let a = stack.unique_id(&["Mesh", "Gateway"]);
        let b = stack.unique_id(&["Mesh", "Gateway"]);
        let c = stack.unique_id(&["Mesh", "Gateway2"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("MeshStackMeshGateway"));
        assert_eq!(a.len(), "MeshStackMeshGateway".len() + 8);
    }

    #[test]
    fn unique_id_strips_punctuation() {
        let id = stack().unique_id(&["my-mesh", "gw_1"]);
        assert!(id.starts_with("MeshStackmymeshgw1"));
    }

    #[test]
    fn default_child_does_not_collide_with_parent() {
        let stack = stack();
        let parent = stack.unique_id(&["Mesh", "Router"]);
        let child = stack.unique_id(&["Mesh", "Router", "Default"]);
        assert_ne!(parent, child);
        assert!(child.starts_with("MeshStackMeshRouterDefault"));
    }

    #[test]
    fn unique_id_is_bounded() {
        let long = "a".repeat(400);
        let id = stack().unique_id(&[long.as_str()]);
        assert_eq!(id.len(), MAX_UNIQUE_ID_LENGTH);
    }
}
