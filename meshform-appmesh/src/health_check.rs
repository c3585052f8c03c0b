//! Health check policy builder
//!
//! A listener carries an optional, partially specified `HealthCheck`. At
//! render time it is completed from the listener's own protocol and port,
//! checked against the listener family's invariants and the structural
//! bounds in `schemas::health_check`, and rendered as a `HealthCheckPolicy`.

use std::time::Duration;

use meshform_core::schema::TypeError;
use serde::{Deserialize, Serialize};

use crate::duration::whole_millis;
use crate::error::ConfigurationError;
use crate::protocol::Protocol;
use crate::schemas;

pub const DEFAULT_THRESHOLD: u32 = 2;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Health check settings as supplied by the caller; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HealthCheck {
    #[serde(default)]
    pub protocol: Option<Protocol>,
    #[serde(default)]
    pub port: Option<u32>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub healthy_threshold: Option<u32>,
    #[serde(default)]
    pub unhealthy_threshold: Option<u32>,
    #[serde(default, deserialize_with = "crate::duration::option::deserialize")]
    pub interval: Option<Duration>,
    #[serde(default, deserialize_with = "crate::duration::option::deserialize")]
    pub timeout: Option<Duration>,
}

impl HealthCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn with_port(mut self, port: u32) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_healthy_threshold(mut self, threshold: u32) -> Self {
        self.healthy_threshold = Some(threshold);
        self
    }

    pub fn with_unhealthy_threshold(mut self, threshold: u32) -> Self {
        self.unhealthy_threshold = Some(threshold);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Which listener family a health check is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerContext {
    Gateway,
    Node,
}

/// Complete, validated health check policy as rendered into a listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckPolicy {
    pub healthy_threshold: u32,
    pub interval_millis: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub port: u32,
    pub protocol: Protocol,
    pub timeout_millis: u64,
    pub unhealthy_threshold: u32,
}

impl HealthCheckPolicy {
    fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |errors| ConfigurationError::Invalid {
            subject: "health check".to_string(),
            errors,
        };
        let rendered = serde_json::to_value(self).map_err(|e| {
            invalid(vec![TypeError::ValidationFailed {
                message: e.to_string(),
            }])
        })?;
        schemas::health_check::validate(&rendered).map_err(invalid)
    }
}

/// Complete `raw` with the listener's defaults and validate the result.
///
/// Protocol defaults to the listener's protocol and port to the listener's
/// port. Path defaults to `/` for HTTP and HTTP2 and is absent otherwise.
pub fn build(
    raw: &HealthCheck,
    context: ListenerContext,
    listener_protocol: Protocol,
    listener_port: u32,
) -> Result<HealthCheckPolicy, ConfigurationError> {
    let protocol = raw.protocol.unwrap_or(listener_protocol);

    if context == ListenerContext::Gateway && protocol == Protocol::Tcp {
        return Err(ConfigurationError::TcpHealthCheckOnGateway);
    }
    if raw.path.is_some() && !protocol.has_path() {
        return Err(ConfigurationError::PathNotAllowed { protocol });
    }

    let path = raw
        .path
        .clone()
        .or_else(|| protocol.has_path().then(|| "/".to_string()));

    let policy = HealthCheckPolicy {
        healthy_threshold: raw.healthy_threshold.unwrap_or(DEFAULT_THRESHOLD),
        interval_millis: whole_millis("interval", raw.interval.unwrap_or(DEFAULT_INTERVAL))?,
        path,
        port: raw.port.unwrap_or(listener_port),
        protocol,
        timeout_millis: whole_millis("timeout", raw.timeout.unwrap_or(DEFAULT_TIMEOUT))?,
        unhealthy_threshold: raw.unhealthy_threshold.unwrap_or(DEFAULT_THRESHOLD),
    };
    policy.validate()?;

    log::debug!(
        "built {} health check on port {} for {:?} listener",
        policy.protocol,
        policy.port,
        context
    );
    Ok(policy)
}
