//! Permission grants on App Mesh resources
//!
//! Read and write access map to fixed, disjoint action sets per resource
//! kind, scoped to the resource's ARN.

use meshform_core::iam::{Grant, Grantee};

use crate::error::ConfigurationError;
use crate::identity::{ResourceIdentity, ResourceKind};

const ACTION_PREFIX: &str = "appmesh:";

/// Action used by Envoy proxies to fetch their configuration
pub const STREAM_AGGREGATED_RESOURCES: &str = "appmesh:StreamAggregatedResources";

/// `Describe<Kind>` and `List<Kind>s`
pub fn read_actions(kind: ResourceKind) -> Vec<String> {
    vec![
        format!("{}Describe{}", ACTION_PREFIX, kind.action_noun()),
        format!("{}List{}", ACTION_PREFIX, kind.plural_action_noun()),
    ]
}

/// `Create<Kind>`, `Update<Kind>`, `Delete<Kind>` and tagging
pub fn write_actions(kind: ResourceKind) -> Vec<String> {
    let noun = kind.action_noun();
    vec![
        format!("{}Create{}", ACTION_PREFIX, noun),
        format!("{}Update{}", ACTION_PREFIX, noun),
        format!("{}Delete{}", ACTION_PREFIX, noun),
        format!("{}TagResource", ACTION_PREFIX),
        format!("{}UntagResource", ACTION_PREFIX),
    ]
}

/// Every action declared for the kind
pub fn all_actions(kind: ResourceKind) -> Vec<String> {
    let mut actions = read_actions(kind);
    actions.extend(write_actions(kind));
    actions
}

pub fn grant_read(identity: &ResourceIdentity, grantee: &dyn Grantee) -> Grant {
    Grant::add_to_principal(
        grantee,
        read_actions(identity.kind()),
        vec![identity.arn().to_string()],
    )
}

pub fn grant_write(identity: &ResourceIdentity, grantee: &dyn Grantee) -> Grant {
    Grant::add_to_principal(
        grantee,
        write_actions(identity.kind()),
        vec![identity.arn().to_string()],
    )
}

/// Allow an Envoy proxy running as `grantee` to fetch the configuration of
/// a virtual node or virtual gateway
pub fn grant_stream_aggregated_resources(
    identity: &ResourceIdentity,
    grantee: &dyn Grantee,
) -> Result<Grant, ConfigurationError> {
    match identity.kind() {
        ResourceKind::VirtualNode | ResourceKind::VirtualGateway => Ok(Grant::add_to_principal(
            grantee,
            vec![STREAM_AGGREGATED_RESOURCES.to_string()],
            vec![identity.arn().to_string()],
        )),
        kind => Err(ConfigurationError::NotStreamable { kind }),
    }
}
