//! IAM - Permission grants
//!
//! The grant primitive: an action list and resource ARNs attached to a
//! grantee's principal as a single Allow statement.

use serde::Serialize;

/// Something permissions can be granted to
pub trait Grantee {
    /// Name used when reporting the grant
    fn grantee_name(&self) -> &str;

    /// ARN of the principal the policy is attached to
    fn principal_arn(&self) -> &str;
}

/// An IAM role
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: String,
    pub arn: String,
}

impl Role {
    pub fn new(name: impl Into<String>, arn: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arn: arn.into(),
        }
    }
}

impl Grantee for Role {
    fn grantee_name(&self) -> &str {
        &self.name
    }

    fn principal_arn(&self) -> &str {
        &self.arn
    }
}

/// Grants only ever allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
}

/// A single policy statement, serialized in IAM policy document form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    pub action: Vec<String>,
    pub resource: Vec<String>,
}

/// Result of granting actions on resources to a grantee
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub principal_arn: String,
    pub statement: PolicyStatement,
}

impl Grant {
    /// Attach an Allow statement for `actions` on `resource_arns` to the
    /// grantee's principal
    pub fn add_to_principal(
        grantee: &dyn Grantee,
        actions: Vec<String>,
        resource_arns: Vec<String>,
    ) -> Self {
        log::debug!(
            "granting {} action(s) on {} resource(s) to {}",
            actions.len(),
            resource_arns.len(),
            grantee.grantee_name()
        );
        Self {
            principal_arn: grantee.principal_arn().to_string(),
            statement: PolicyStatement {
                effect: Effect::Allow,
                action: actions,
                resource: resource_arns,
            },
        }
    }

    pub fn actions(&self) -> &[String] {
        &self.statement.action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn grant_builds_allow_statement() {
        let role = Role::new("app", "arn:aws:iam::123456789012:role/app");
        let grant = Grant::add_to_principal(
            &role,
            vec!["appmesh:DescribeMesh".to_string()],
            vec!["arn:aws:appmesh:us-east-1:123456789012:mesh/m1".to_string()],
        );
        assert_eq!(grant.principal_arn, "arn:aws:iam::123456789012:role/app");
        assert_eq!(grant.actions(), ["appmesh:DescribeMesh".to_string()]);
        assert_eq!(
            serde_json::to_value(&grant.statement).unwrap(),
            json!({
                "Effect": "Allow",
                "Action": ["appmesh:DescribeMesh"],
                "Resource": ["arn:aws:appmesh:us-east-1:123456789012:mesh/m1"],
            })
        );
    }
}
