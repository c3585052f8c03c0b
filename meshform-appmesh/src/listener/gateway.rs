//! Virtual gateway listeners
//!
//! Gateways terminate HTTP, HTTP2 and gRPC only; there is no TCP variant.

use serde::{Deserialize, Serialize};

use super::{
    ConnectionPool, ConnectionPoolProperty, DEFAULT_PORT, Http2ConnectionPool, HttpConnectionPool,
    PortMapping, bind_health_check, default_port,
};
use crate::error::ConfigurationError;
use crate::health_check::{HealthCheck, HealthCheckPolicy, ListenerContext};
use crate::protocol::Protocol;
use crate::tls::{ListenerTls, ListenerTlsProperty, VirtualGatewayListenerTlsCertificate};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    rename_all = "camelCase",
    deny_unknown_fields,
    bound(deserialize = "P: Deserialize<'de>")
)]
pub struct GatewayListenerOptions<P> {
    #[serde(default = "default_port")]
    pub port: u32,
    #[serde(default)]
    pub health_check: Option<HealthCheck>,
    #[serde(default)]
    pub tls: Option<ListenerTls>,
    #[serde(default)]
    pub connection_pool: Option<P>,
}

impl<P> Default for GatewayListenerOptions<P> {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            health_check: None,
            tls: None,
            connection_pool: None,
        }
    }
}

impl<P> GatewayListenerOptions<P> {
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

    pub fn with_connection_pool(mut self, connection_pool: P) -> Self {
        self.connection_pool = Some(connection_pool);
        self
    }
}

pub type HttpGatewayListenerOptions = GatewayListenerOptions<HttpConnectionPool>;
pub type Http2GatewayListenerOptions = GatewayListenerOptions<Http2ConnectionPool>;
pub type GrpcGatewayListenerOptions = GatewayListenerOptions<Http2ConnectionPool>;

/// A listener of a virtual gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum VirtualGatewayListener {
    Http(HttpGatewayListenerOptions),
    Http2(Http2GatewayListenerOptions),
    Grpc(GrpcGatewayListenerOptions),
}

impl Default for VirtualGatewayListener {
    /// HTTP on port 8080
    fn default() -> Self {
        VirtualGatewayListener::Http(Default::default())
    }
}

/// Rendered virtual gateway listener (`VirtualGatewayListener`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualGatewayListenerProperty {
    pub port_mapping: PortMapping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheckPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<ListenerTlsProperty<VirtualGatewayListenerTlsCertificate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_pool: Option<ConnectionPoolProperty>,
}

impl VirtualGatewayListener {
    pub fn http(options: HttpGatewayListenerOptions) -> Self {
        VirtualGatewayListener::Http(options)
    }

    pub fn http2(options: Http2GatewayListenerOptions) -> Self {
        VirtualGatewayListener::Http2(options)
    }

    pub fn grpc(options: GrpcGatewayListenerOptions) -> Self {
        VirtualGatewayListener::Grpc(options)
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            VirtualGatewayListener::Http(_) => Protocol::Http,
            VirtualGatewayListener::Http2(_) => Protocol::Http2,
            VirtualGatewayListener::Grpc(_) => Protocol::Grpc,
        }
    }

    /// Render the listener for the virtual gateway named `owner`. Consumes
    /// the listener; each listener is rendered exactly once.
    pub fn bind(self, owner: &str) -> Result<VirtualGatewayListenerProperty, ConfigurationError> {
        let protocol = self.protocol();
        let rendered = match self {
            VirtualGatewayListener::Http(options) => bind_options(protocol, options),
            VirtualGatewayListener::Http2(options) | VirtualGatewayListener::Grpc(options) => {
                bind_options(protocol, options)
            }
        }?;
        log::debug!(
            "bound {} listener on port {} for virtual gateway {}",
            protocol,
            rendered.port_mapping.port,
            owner
        );
        Ok(rendered)
    }
}

fn bind_options<P: ConnectionPool>(
    protocol: Protocol,
    options: GatewayListenerOptions<P>,
) -> Result<VirtualGatewayListenerProperty, ConfigurationError> {
    let port_mapping = PortMapping::new(options.port, protocol)?;
    Ok(VirtualGatewayListenerProperty {
        port_mapping,
        health_check: bind_health_check(
            options.health_check.as_ref(),
            ListenerContext::Gateway,
            protocol,
            options.port,
        )?,
        tls: options
            .tls
            .as_ref()
            .map(|tls| tls.bind().map(|bound| bound.gateway))
            .transpose()?,
        connection_pool: options
            .connection_pool
            .as_ref()
            .map(|pool| pool.bind(protocol))
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::{CertificateReference, TlsCertificate, TlsMode};
    use serde_json::json;

    #[test]
    fn default_listener_is_http_8080() {
        let rendered = VirtualGatewayListener::default().bind("gw").unwrap();
        assert_eq!(
            serde_json::to_value(rendered).unwrap(),
            json!({"portMapping": {"port": 8080, "protocol": "http"}})
        );
    }

    #[test]
    fn tcp_health_check_is_rejected_for_every_protocol() {
        let health_check = HealthCheck::new().with_protocol(Protocol::Tcp);
        let listeners = [
            VirtualGatewayListener::http(
                HttpGatewayListenerOptions::default().with_health_check(health_check.clone()),
            ),
            VirtualGatewayListener::http2(
                Http2GatewayListenerOptions::default().with_health_check(health_check.clone()),
            ),
            VirtualGatewayListener::grpc(
                GrpcGatewayListenerOptions::default().with_health_check(health_check),
            ),
        ];
        for listener in listeners {
            assert_eq!(
                listener.bind("gw"),
                Err(ConfigurationError::TcpHealthCheckOnGateway)
            );
        }
    }

    #[test]
    fn grpc_health_check_with_path_is_rejected() {
        let listener = VirtualGatewayListener::http(
            HttpGatewayListenerOptions::default().with_health_check(
                HealthCheck::new()
                    .with_protocol(Protocol::Grpc)
                    .with_path("/"),
            ),
        );
        assert!(matches!(
            listener.bind("gw"),
            Err(ConfigurationError::PathNotAllowed { .. })
        ));
    }

    #[test]
    fn tls_uses_gateway_certificate_shape() {
        let arn = "arn:aws:acm:us-east-1:123456789012:certificate/abc";
        let listener = VirtualGatewayListener::http2(
            Http2GatewayListenerOptions::default()
                .with_port(443)
                .with_tls(ListenerTls::new(
                    TlsCertificate::acm(CertificateReference {
                        certificate_arn: arn.to_string(),
                        domain_name: None,
                    }),
                    TlsMode::Permissive,
                ))
                .with_connection_pool(Http2ConnectionPool { max_requests: 8 }),
        );
        assert_eq!(
            serde_json::to_value(listener.bind("gw").unwrap()).unwrap(),
            json!({
                "portMapping": {"port": 443, "protocol": "http2"},
                "tls": {"certificate": {"acm": {"certificateArn": arn}}, "mode": "PERMISSIVE"},
                "connectionPool": {"http2": {"maxRequests": 8}},
            })
        );
    }

    #[test]
    fn tcp_is_not_a_gateway_protocol() {
        assert!(serde_json::from_value::<VirtualGatewayListener>(json!({"protocol": "tcp"})).is_err());
        let listener: VirtualGatewayListener =
            serde_json::from_value(json!({"protocol": "grpc", "port": 9000})).unwrap();
        assert_eq!(listener.protocol(), Protocol::Grpc);
    }

    #[test]
    fn gateway_listeners_reject_node_only_options() {
        let parsed = serde_json::from_value::<VirtualGatewayListener>(json!({
            "protocol": "http",
            "outlierDetection": {
                "maxServerErrors": 1,
                "maxEjectionPercent": 10,
                "interval": "10s",
                "baseEjectionDuration": "10s",
            }
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn deserializes_pool_without_default_impl() {
        let listener: VirtualGatewayListener = serde_json::from_value(json!({
            "protocol": "grpc",
            "connectionPool": {"maxRequests": 16},
        }))
        .unwrap();
        assert_eq!(
            listener,
            VirtualGatewayListener::grpc(
                GrpcGatewayListenerOptions::default()
                    .with_connection_pool(Http2ConnectionPool { max_requests: 16 })
            )
        );

        let listener: VirtualGatewayListener =
            serde_json::from_value(json!({"protocol": "http2"})).unwrap();
        assert_eq!(
            listener,
            VirtualGatewayListener::http2(Http2GatewayListenerOptions::default())
        );
    }
}
