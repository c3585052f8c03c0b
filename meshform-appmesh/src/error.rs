//! Error taxonomy
//!
//! All failures are deterministic functions of caller input and surface
//! before anything is emitted.

use std::time::Duration;

use meshform_core::emitter::EmitError;
use meshform_core::schema::TypeError;

use crate::identity::ResourceKind;
use crate::protocol::Protocol;

/// A variant's cross-field invariant or bound was violated
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("TCP health checks are not permitted for gateway listeners")]
    TcpHealthCheckOnGateway,

    #[error("The path property cannot be set with protocol {protocol}")]
    PathNotAllowed { protocol: Protocol },

    #[error("{field} must be a whole number of milliseconds, got {duration:?}")]
    FractionalMillis {
        field: &'static str,
        duration: Duration,
    },

    #[error("invalid {subject}: {}", join_errors(errors))]
    Invalid {
        subject: String,
        errors: Vec<TypeError>,
    },

    #[error("'{field}' must be between {min} and {max}, got {got}")]
    OutOfRange {
        field: &'static str,
        min: u64,
        max: u64,
        got: u64,
    },

    #[error("'{field}' must not be empty")]
    Empty { field: &'static str },

    #[error("{resource} may have at most one listener")]
    TooManyListeners { resource: String },

    #[error("Service discovery information is required for virtual node {resource} with a listener")]
    MissingServiceDiscovery { resource: String },

    #[error("a route must have at least one weighted target")]
    NoWeightedTargets,

    #[error("a route may have at most {max} weighted targets, got {count}")]
    TooManyWeightedTargets { max: usize, count: usize },

    #[error("the total weight of a route's targets must be positive")]
    ZeroTotalWeight,

    #[error("a retry policy must specify at least one retry event")]
    MissingRetryEvents,

    #[error("a gRPC method name requires a service name")]
    MethodWithoutService,

    #[error("prefix path '{prefix}' must start with '/'")]
    InvalidPathPrefix { prefix: String },

    #[error("expected a {expected} as owner, got a {got}")]
    OwnerKindMismatch {
        expected: ResourceKind,
        got: ResourceKind,
    },

    #[error("{kind} name '{name}' is declared more than once")]
    DuplicateName { kind: ResourceKind, name: String },

    #[error("logical id '{logical_id}' is produced by more than one declaration")]
    DuplicateLogicalId { logical_id: String },

    #[error("{kind} does not stream aggregated resources")]
    NotStreamable { kind: ResourceKind },

    #[error("stack {field} is not configured")]
    MissingStackSetting { field: &'static str },
}

/// An ARN could not be resolved into an identity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {kind} ARN '{arn}': {reason}")]
pub struct MalformedIdentityError {
    pub kind: ResourceKind,
    pub arn: String,
    pub reason: String,
}

impl MalformedIdentityError {
    pub fn new(kind: ResourceKind, arn: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            arn: arn.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    MalformedIdentity(#[from] MalformedIdentityError),

    #[error("{resource}: {}", join_errors(errors))]
    Schema {
        resource: String,
        errors: Vec<TypeError>,
    },

    #[error("failed to serialize {resource}: {source}")]
    Serialization {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Emit(#[from] EmitError),
}

pub type Result<T> = std::result::Result<T, Error>;

fn join_errors(errors: &[TypeError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
