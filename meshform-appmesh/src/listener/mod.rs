//! Listeners of virtual nodes and virtual gateways
//!
//! - `node` - HTTP, HTTP2, gRPC and TCP listeners of a virtual node
//! - `gateway` - HTTP, HTTP2 and gRPC listeners of a virtual gateway
//!
//! Both families render a port mapping, an optional health check and an
//! optional TLS block. The protocol specific blocks shared between them
//! (timeouts and connection pools) live here.

pub mod gateway;
pub mod node;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::DurationProperty;
use crate::error::ConfigurationError;
use crate::health_check::{self, HealthCheck, HealthCheckPolicy, ListenerContext};
use crate::protocol::Protocol;

pub use gateway::VirtualGatewayListener;
pub use node::VirtualNodeListener;

/// Port a listener binds when none is given
pub const DEFAULT_PORT: u32 = 8080;

pub(crate) fn default_port() -> u32 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    pub port: u32,
    pub protocol: Protocol,
}

impl PortMapping {
    pub fn new(port: u32, protocol: Protocol) -> Result<Self, ConfigurationError> {
        in_range("port", port, 1, 65535)?;
        Ok(Self { port, protocol })
    }
}

/// Check `value` lies within `min..=max`
pub(crate) fn in_range(
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<u32, ConfigurationError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigurationError::OutOfRange {
            field,
            min: min.into(),
            max: max.into(),
            got: value.into(),
        })
    }
}

pub(crate) fn positive(field: &'static str, value: u32) -> Result<u32, ConfigurationError> {
    in_range(field, value, 1, u32::MAX)
}

/// Health check of a listener, completed from the listener's protocol and port
pub(crate) fn bind_health_check(
    health_check: Option<&HealthCheck>,
    context: ListenerContext,
    protocol: Protocol,
    port: u32,
) -> Result<Option<HealthCheckPolicy>, ConfigurationError> {
    health_check
        .map(|raw| health_check::build(raw, context, protocol, port))
        .transpose()
}

/// Idle and per-request timeouts of an HTTP, HTTP2 or gRPC listener or route
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpTimeout {
    #[serde(default, deserialize_with = "crate::duration::option::deserialize")]
    pub idle: Option<Duration>,
    #[serde(default, deserialize_with = "crate::duration::option::deserialize")]
    pub per_request: Option<Duration>,
}

impl HttpTimeout {
    /// Unkeyed rendering, as used by routes
    pub fn render(&self) -> Result<TimeoutProperty, ConfigurationError> {
        Ok(TimeoutProperty {
            idle: self
                .idle
                .map(|d| DurationProperty::millis("idle", d))
                .transpose()?,
            per_request: self
                .per_request
                .map(|d| DurationProperty::millis("perRequest", d))
                .transpose()?,
        })
    }
}

/// Idle timeout of a TCP listener or route
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TcpTimeout {
    #[serde(default, deserialize_with = "crate::duration::option::deserialize")]
    pub idle: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle: Option<DurationProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_request: Option<DurationProperty>,
}

/// Listener timeout, keyed by the listener's protocol
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerTimeoutProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<TimeoutProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http2: Option<TimeoutProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc: Option<TimeoutProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp: Option<TimeoutProperty>,
}

impl ListenerTimeoutProperty {
    fn keyed(protocol: Protocol, timeout: TimeoutProperty) -> Self {
        let mut keyed = Self::default();
        let slot = match protocol {
            Protocol::Http => &mut keyed.http,
            Protocol::Http2 => &mut keyed.http2,
            Protocol::Grpc => &mut keyed.grpc,
            Protocol::Tcp => &mut keyed.tcp,
        };
        *slot = Some(timeout);
        keyed
    }
}

/// Protocol specific listener timeout input
pub trait ListenerTimeout {
    fn bind(&self, protocol: Protocol) -> Result<ListenerTimeoutProperty, ConfigurationError>;
}

impl ListenerTimeout for HttpTimeout {
    fn bind(&self, protocol: Protocol) -> Result<ListenerTimeoutProperty, ConfigurationError> {
        Ok(ListenerTimeoutProperty::keyed(protocol, self.render()?))
    }
}

impl ListenerTimeout for TcpTimeout {
    fn bind(&self, protocol: Protocol) -> Result<ListenerTimeoutProperty, ConfigurationError> {
        let idle = self
            .idle
            .map(|d| DurationProperty::millis("idle", d))
            .transpose()?;
        Ok(ListenerTimeoutProperty::keyed(
            protocol,
            TimeoutProperty {
                idle,
                per_request: None,
            },
        ))
    }
}

/// HTTP connection pool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpConnectionPool {
    pub max_connections: u32,
    #[serde(default)]
    pub max_pending_requests: Option<u32>,
}

/// HTTP2 and gRPC connection pool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Http2ConnectionPool {
    pub max_requests: u32,
}

/// TCP connection pool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TcpConnectionPool {
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConnectionPoolProperty {
    pub max_connections: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pending_requests: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Http2ConnectionPoolProperty {
    pub max_requests: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpConnectionPoolProperty {
    pub max_connections: u32,
}

/// Connection pool, keyed by the listener's protocol
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPoolProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConnectionPoolProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http2: Option<Http2ConnectionPoolProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc: Option<Http2ConnectionPoolProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp: Option<TcpConnectionPoolProperty>,
}

/// Protocol specific connection pool input
pub trait ConnectionPool {
    fn bind(&self, protocol: Protocol) -> Result<ConnectionPoolProperty, ConfigurationError>;
}

impl ConnectionPool for HttpConnectionPool {
    fn bind(&self, _protocol: Protocol) -> Result<ConnectionPoolProperty, ConfigurationError> {
        Ok(ConnectionPoolProperty {
            http: Some(HttpConnectionPoolProperty {
                max_connections: positive("maxConnections", self.max_connections)?,
                max_pending_requests: self
                    .max_pending_requests
                    .map(|n| positive("maxPendingRequests", n))
                    .transpose()?,
            }),
            ..Default::default()
        })
    }
}

impl ConnectionPool for Http2ConnectionPool {
    fn bind(&self, protocol: Protocol) -> Result<ConnectionPoolProperty, ConfigurationError> {
        let pool = Some(Http2ConnectionPoolProperty {
            max_requests: positive("maxRequests", self.max_requests)?,
        });
        Ok(match protocol {
            Protocol::Grpc => ConnectionPoolProperty {
                grpc: pool,
                ..Default::default()
            },
            _ => ConnectionPoolProperty {
                http2: pool,
                ..Default::default()
            },
        })
    }
}

impl ConnectionPool for TcpConnectionPool {
    fn bind(&self, _protocol: Protocol) -> Result<ConnectionPoolProperty, ConfigurationError> {
        Ok(ConnectionPoolProperty {
            tcp: Some(TcpConnectionPoolProperty {
                max_connections: positive("maxConnections", self.max_connections)?,
            }),
            ..Default::default()
        })
    }
}
