//! Gateway route specifications
//!
//! A gateway route matches requests arriving at a virtual gateway and sends
//! them to a virtual service inside the mesh. As with routes, exactly one of
//! `httpRoute`, `http2Route` and `grpcRoute` is present in a rendered spec.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::listener::in_range;
use crate::protocol::Protocol;
use crate::route_spec::{MAX_PRIORITY, check_prefix};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServiceProperty {
    pub virtual_service_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRouteTargetProperty {
    pub virtual_service: VirtualServiceProperty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRouteActionProperty {
    pub target: GatewayRouteTargetProperty,
}

fn bind_action(virtual_service: &str) -> Result<GatewayRouteActionProperty, ConfigurationError> {
    if virtual_service.is_empty() {
        return Err(ConfigurationError::Empty {
            field: "virtualServiceName",
        });
    }
    Ok(GatewayRouteActionProperty {
        target: GatewayRouteTargetProperty {
            virtual_service: VirtualServiceProperty {
                virtual_service_name: virtual_service.to_string(),
            },
        },
    })
}

/// HTTP or HTTP2 gateway route
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpGatewayRouteSpec {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    pub virtual_service: String,
    #[serde(default)]
    pub priority: Option<u32>,
}

fn default_prefix() -> String {
    "/".to_string()
}

impl HttpGatewayRouteSpec {
    pub fn new(prefix: impl Into<String>, virtual_service: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            virtual_service: virtual_service.into(),
            priority: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpGatewayRouteMatchProperty {
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpGatewayRouteProperty {
    pub action: GatewayRouteActionProperty,
    #[serde(rename = "match")]
    pub route_match: HttpGatewayRouteMatchProperty,
}

fn bind_http(spec: &HttpGatewayRouteSpec) -> Result<HttpGatewayRouteProperty, ConfigurationError> {
    check_prefix(&spec.prefix)?;
    Ok(HttpGatewayRouteProperty {
        action: bind_action(&spec.virtual_service)?,
        route_match: HttpGatewayRouteMatchProperty {
            prefix: spec.prefix.clone(),
        },
    })
}

/// gRPC gateway route
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GrpcGatewayRouteSpec {
    pub service_name: String,
    pub virtual_service: String,
    #[serde(default)]
    pub priority: Option<u32>,
}

impl GrpcGatewayRouteSpec {
    pub fn new(service_name: impl Into<String>, virtual_service: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            virtual_service: virtual_service.into(),
            priority: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcGatewayRouteMatchProperty {
    pub service_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcGatewayRouteProperty {
    pub action: GatewayRouteActionProperty,
    #[serde(rename = "match")]
    pub route_match: GrpcGatewayRouteMatchProperty,
}

/// Specification of a gateway route, tagged by protocol
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum GatewayRouteSpec {
    Http(HttpGatewayRouteSpec),
    Http2(HttpGatewayRouteSpec),
    Grpc(GrpcGatewayRouteSpec),
}

/// Rendered gateway route spec (`GatewayRouteSpec`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRouteSpecProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_route: Option<HttpGatewayRouteProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http2_route: Option<HttpGatewayRouteProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_route: Option<GrpcGatewayRouteProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

impl GatewayRouteSpec {
    pub fn http(spec: HttpGatewayRouteSpec) -> Self {
        GatewayRouteSpec::Http(spec)
    }

    pub fn http2(spec: HttpGatewayRouteSpec) -> Self {
        GatewayRouteSpec::Http2(spec)
    }

    pub fn grpc(spec: GrpcGatewayRouteSpec) -> Self {
        GatewayRouteSpec::Grpc(spec)
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            GatewayRouteSpec::Http(_) => Protocol::Http,
            GatewayRouteSpec::Http2(_) => Protocol::Http2,
            GatewayRouteSpec::Grpc(_) => Protocol::Grpc,
        }
    }

    /// Render the spec for the gateway route named `owner`
    pub fn bind(self, owner: &str) -> Result<GatewayRouteSpecProperty, ConfigurationError> {
        let protocol = self.protocol();
        let rendered = match &self {
            GatewayRouteSpec::Http(spec) => GatewayRouteSpecProperty {
                http_route: Some(bind_http(spec)?),
                priority: bind_priority(spec.priority)?,
                ..Default::default()
            },
            GatewayRouteSpec::Http2(spec) => GatewayRouteSpecProperty {
                http2_route: Some(bind_http(spec)?),
                priority: bind_priority(spec.priority)?,
                ..Default::default()
            },
            GatewayRouteSpec::Grpc(spec) => {
                if spec.service_name.is_empty() {
                    return Err(ConfigurationError::Empty {
                        field: "serviceName",
                    });
                }
                GatewayRouteSpecProperty {
                    grpc_route: Some(GrpcGatewayRouteProperty {
                        action: bind_action(&spec.virtual_service)?,
                        route_match: GrpcGatewayRouteMatchProperty {
                            service_name: spec.service_name.clone(),
                        },
                    }),
                    priority: bind_priority(spec.priority)?,
                    ..Default::default()
                }
            }
        };
        log::debug!("bound {} gateway route spec for {}", protocol, owner);
        Ok(rendered)
    }
}

fn bind_priority(priority: Option<u32>) -> Result<Option<u32>, ConfigurationError> {
    priority
        .map(|p| in_range("priority", p, 0, MAX_PRIORITY))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_exactly_one_route_kind() {
        let specs = [
            (
                GatewayRouteSpec::http(HttpGatewayRouteSpec::new("/", "svc.local")),
                "httpRoute",
            ),
            (
                GatewayRouteSpec::http2(HttpGatewayRouteSpec::new("/", "svc.local")),
                "http2Route",
            ),
            (
                GatewayRouteSpec::grpc(GrpcGatewayRouteSpec::new("pkg.Svc", "svc.local")),
                "grpcRoute",
            ),
        ];
        for (spec, field) in specs {
            let rendered = serde_json::to_value(spec.bind("gr").unwrap()).unwrap();
            let keys: Vec<&String> = rendered.as_object().unwrap().keys().collect();
            assert_eq!(keys, vec![field]);
        }
    }

    #[test]
    fn http_gateway_route_shape() {
        let spec = GatewayRouteSpec::http(HttpGatewayRouteSpec::new("/orders", "orders.local"));
        assert_eq!(
            serde_json::to_value(spec.bind("gr").unwrap()).unwrap(),
            json!({
                "httpRoute": {
                    "action": {"target": {"virtualService": {"virtualServiceName": "orders.local"}}},
                    "match": {"prefix": "/orders"},
                }
            })
        );
    }

    #[test]
    fn prefix_must_start_with_slash() {
        let spec = GatewayRouteSpec::http2(HttpGatewayRouteSpec::new("orders", "orders.local"));
        assert!(matches!(
            spec.bind("gr"),
            Err(ConfigurationError::InvalidPathPrefix { .. })
        ));
    }

    #[test]
    fn grpc_service_name_must_not_be_empty() {
        let spec = GatewayRouteSpec::grpc(GrpcGatewayRouteSpec::new("", "svc.local"));
        assert_eq!(
            spec.bind("gr"),
            Err(ConfigurationError::Empty {
                field: "serviceName"
            })
        );
    }

    #[test]
    fn target_must_not_be_empty() {
        let spec = GatewayRouteSpec::http(HttpGatewayRouteSpec::new("/", ""));
        assert_eq!(
            spec.bind("gr"),
            Err(ConfigurationError::Empty {
                field: "virtualServiceName"
            })
        );
    }

    #[test]
    fn deserializes_with_default_prefix() {
        let spec: GatewayRouteSpec = serde_json::from_value(json!({
            "protocol": "http",
            "virtualService": "svc.local",
            "priority": 5,
        }))
        .unwrap();
        let rendered = spec.bind("gr").unwrap();
        assert_eq!(rendered.priority, Some(5));
        assert_eq!(rendered.http_route.unwrap().route_match.prefix, "/");
    }
}
