//! Virtual node listeners

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    ConnectionPool, ConnectionPoolProperty, DEFAULT_PORT, Http2ConnectionPool, HttpConnectionPool,
    HttpTimeout, ListenerTimeout, ListenerTimeoutProperty, PortMapping, TcpConnectionPool,
    TcpTimeout, bind_health_check, default_port, in_range, positive,
};
use crate::duration::DurationProperty;
use crate::error::ConfigurationError;
use crate::health_check::{HealthCheck, HealthCheckPolicy, ListenerContext};
use crate::protocol::Protocol;
use crate::tls::{ListenerTls, ListenerTlsCertificate, ListenerTlsProperty};

/// Options shared by every virtual node listener; `T` and `P` are the
/// protocol's timeout and connection pool inputs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    rename_all = "camelCase",
    deny_unknown_fields,
    bound(deserialize = "T: Deserialize<'de>, P: Deserialize<'de>")
)]
pub struct NodeListenerOptions<T, P> {
    #[serde(default = "default_port")]
    pub port: u32,
    #[serde(default)]
    pub health_check: Option<HealthCheck>,
    #[serde(default)]
    pub tls: Option<ListenerTls>,
    #[serde(default)]
    pub timeout: Option<T>,
    #[serde(default)]
    pub connection_pool: Option<P>,
    #[serde(default)]
    pub outlier_detection: Option<OutlierDetection>,
}

impl<T, P> Default for NodeListenerOptions<T, P> {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            health_check: None,
            tls: None,
            timeout: None,
            connection_pool: None,
            outlier_detection: None,
        }
    }
}

impl<T, P> NodeListenerOptions<T, P> {
    pub fn with_port(mut self, port: u32) -> Self {
        self.port = port;
        self
    }

    pub fn with_health_check(mut self, health_check: HealthCheck) -> Self {
        self.health_check = Some(health_check);
        self
    }

    pub fn with_tls(mut self, tls: ListenerTls) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_timeout(mut self, timeout: T) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connection_pool(mut self, connection_pool: P) -> Self {
        self.connection_pool = Some(connection_pool);
        self
    }

    pub fn with_outlier_detection(mut self, outlier_detection: OutlierDetection) -> Self {
        self.outlier_detection = Some(outlier_detection);
        self
    }
}

pub type HttpNodeListenerOptions = NodeListenerOptions<HttpTimeout, HttpConnectionPool>;
pub type Http2NodeListenerOptions = NodeListenerOptions<HttpTimeout, Http2ConnectionPool>;
pub type GrpcNodeListenerOptions = NodeListenerOptions<HttpTimeout, Http2ConnectionPool>;
pub type TcpNodeListenerOptions = NodeListenerOptions<TcpTimeout, TcpConnectionPool>;

/// Ejects misbehaving hosts from the load balancing pool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutlierDetection {
    pub max_server_errors: u32,
    pub max_ejection_percent: u32,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub interval: Duration,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub base_ejection_duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierDetectionProperty {
    pub base_ejection_duration: DurationProperty,
    pub interval: DurationProperty,
    pub max_ejection_percent: u32,
    pub max_server_errors: u32,
}

impl OutlierDetection {
    pub fn bind(&self) -> Result<OutlierDetectionProperty, ConfigurationError> {
        Ok(OutlierDetectionProperty {
            base_ejection_duration: DurationProperty::millis(
                "baseEjectionDuration",
                self.base_ejection_duration,
            )?,
            interval: DurationProperty::millis("interval", self.interval)?,
            max_ejection_percent: in_range("maxEjectionPercent", self.max_ejection_percent, 0, 100)?,
            max_server_errors: positive("maxServerErrors", self.max_server_errors)?,
        })
    }
}

/// A listener of a virtual node
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum VirtualNodeListener {
    Http(HttpNodeListenerOptions),
    Http2(Http2NodeListenerOptions),
    Grpc(GrpcNodeListenerOptions),
    Tcp(TcpNodeListenerOptions),
}

/// Rendered virtual node listener (`Listener`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNodeListenerProperty {
    pub port_mapping: PortMapping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheckPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<ListenerTlsProperty<ListenerTlsCertificate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<ListenerTimeoutProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_pool: Option<ConnectionPoolProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_detection: Option<OutlierDetectionProperty>,
}

impl VirtualNodeListener {
    pub fn http(options: HttpNodeListenerOptions) -> Self {
        VirtualNodeListener::Http(options)
    }

    pub fn http2(options: Http2NodeListenerOptions) -> Self {
        VirtualNodeListener::Http2(options)
    }

    pub fn grpc(options: GrpcNodeListenerOptions) -> Self {
        VirtualNodeListener::Grpc(options)
    }

    pub fn tcp(options: TcpNodeListenerOptions) -> Self {
        VirtualNodeListener::Tcp(options)
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            VirtualNodeListener::Http(_) => Protocol::Http,
            VirtualNodeListener::Http2(_) => Protocol::Http2,
            VirtualNodeListener::Grpc(_) => Protocol::Grpc,
            VirtualNodeListener::Tcp(_) => Protocol::Tcp,
        }
    }

    pub fn port(&self) -> u32 {
        match self {
            VirtualNodeListener::Http(o) => o.port,
            VirtualNodeListener::Http2(o) | VirtualNodeListener::Grpc(o) => o.port,
            VirtualNodeListener::Tcp(o) => o.port,
        }
    }

    /// Render the listener for the virtual node named `owner`. Consumes the
    /// listener; each listener is rendered exactly once.
    pub fn bind(self, owner: &str) -> Result<VirtualNodeListenerProperty, ConfigurationError> {
        let protocol = self.protocol();
        let rendered = match self {
            VirtualNodeListener::Http(options) => bind_options(protocol, options),
            VirtualNodeListener::Http2(options) | VirtualNodeListener::Grpc(options) => {
                bind_options(protocol, options)
            }
            VirtualNodeListener::Tcp(options) => bind_options(protocol, options),
        }?;
        log::debug!(
            "bound {} listener on port {} for virtual node {}",
            protocol,
            rendered.port_mapping.port,
            owner
        );
        Ok(rendered)
    }
}

fn bind_options<T: ListenerTimeout, P: ConnectionPool>(
    protocol: Protocol,
    options: NodeListenerOptions<T, P>,
) -> Result<VirtualNodeListenerProperty, ConfigurationError> {
    let port_mapping = PortMapping::new(options.port, protocol)?;
    Ok(VirtualNodeListenerProperty {
        port_mapping,
        health_check: bind_health_check(
            options.health_check.as_ref(),
            ListenerContext::Node,
            protocol,
            options.port,
        )?,
        tls: options
            .tls
            .as_ref()
            .map(|tls| tls.bind().map(|bound| bound.node))
            .transpose()?,
        timeout: options
            .timeout
            .as_ref()
            .map(|timeout| timeout.bind(protocol))
            .transpose()?,
        connection_pool: options
            .connection_pool
            .as_ref()
            .map(|pool| pool.bind(protocol))
            .transpose()?,
        outlier_detection: options
            .outlier_detection
            .as_ref()
            .map(OutlierDetection::bind)
            .transpose()?,
    })
}
