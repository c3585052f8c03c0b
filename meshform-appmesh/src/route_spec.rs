//! Route specifications
//!
//! A route matches requests arriving at a virtual router and spreads them
//! over weighted virtual node targets. Each protocol renders into its own
//! field of the route spec; exactly one of `httpRoute`, `http2Route` and
//! `grpcRoute` is present in every rendered spec.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::DurationProperty;
use crate::error::ConfigurationError;
use crate::listener::{HttpTimeout, TimeoutProperty, in_range};
use crate::protocol::Protocol;

/// Most weighted targets a single route may have
pub const MAX_WEIGHTED_TARGETS: usize = 10;

/// Highest (least preferred) route priority
pub const MAX_PRIORITY: u32 = 1000;

/// A virtual node receiving a share of a route's traffic
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WeightedTarget {
    pub virtual_node: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub port: Option<u32>,
}

fn default_weight() -> u32 {
    1
}

impl WeightedTarget {
    pub fn new(virtual_node: impl Into<String>, weight: u32) -> Self {
        Self {
            virtual_node: virtual_node.into(),
            weight,
            port: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedTargetProperty {
    pub virtual_node: String,
    pub weight: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteActionProperty {
    pub weighted_targets: Vec<WeightedTargetProperty>,
}

fn bind_targets(targets: &[WeightedTarget]) -> Result<RouteActionProperty, ConfigurationError> {
    if targets.is_empty() {
        return Err(ConfigurationError::NoWeightedTargets);
    }
    if targets.len() > MAX_WEIGHTED_TARGETS {
        return Err(ConfigurationError::TooManyWeightedTargets {
            max: MAX_WEIGHTED_TARGETS,
            count: targets.len(),
        });
    }

    let mut weighted_targets = Vec::with_capacity(targets.len());
    for target in targets {
        if target.virtual_node.is_empty() {
            return Err(ConfigurationError::Empty {
                field: "virtualNode",
            });
        }
        weighted_targets.push(WeightedTargetProperty {
            virtual_node: target.virtual_node.clone(),
            weight: in_range("weight", target.weight, 0, 100)?,
            port: target
                .port
                .map(|port| in_range("port", port, 1, 65535))
                .transpose()?,
        });
    }

    if weighted_targets.iter().map(|t| t.weight).sum::<u32>() == 0 {
        return Err(ConfigurationError::ZeroTotalWeight);
    }
    Ok(RouteActionProperty { weighted_targets })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HttpRetryEvent {
    ServerError,
    GatewayError,
    ClientError,
    StreamError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TcpRetryEvent {
    ConnectionError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrpcRetryEvent {
    Cancelled,
    DeadlineExceeded,
    Internal,
    ResourceExhausted,
    Unavailable,
}

/// Request match of an HTTP or HTTP2 route
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpRouteMatch {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub method: Option<HttpMethod>,
}

fn default_prefix() -> String {
    "/".to_string()
}

impl Default for HttpRouteMatch {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            method: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRouteMatchProperty {
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
}

pub(crate) fn check_prefix(prefix: &str) -> Result<(), ConfigurationError> {
    if prefix.starts_with('/') {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidPathPrefix {
            prefix: prefix.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpRetryPolicy {
    pub max_retries: u32,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub per_retry_timeout: Duration,
    #[serde(default)]
    pub http_retry_events: Vec<HttpRetryEvent>,
    #[serde(default)]
    pub tcp_retry_events: Vec<TcpRetryEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRetryPolicyProperty {
    pub max_retries: u32,
    pub per_retry_timeout: DurationProperty,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub http_retry_events: Vec<HttpRetryEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tcp_retry_events: Vec<TcpRetryEvent>,
}

impl HttpRetryPolicy {
    pub fn bind(&self) -> Result<HttpRetryPolicyProperty, ConfigurationError> {
        if self.http_retry_events.is_empty() && self.tcp_retry_events.is_empty() {
            return Err(ConfigurationError::MissingRetryEvents);
        }
        Ok(HttpRetryPolicyProperty {
            max_retries: self.max_retries,
            per_retry_timeout: DurationProperty::millis("perRetryTimeout", self.per_retry_timeout)?,
            http_retry_events: self.http_retry_events.clone(),
            tcp_retry_events: self.tcp_retry_events.clone(),
        })
    }
}

/// HTTP or HTTP2 route
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpRouteSpec {
    #[serde(default, rename = "match")]
    pub route_match: HttpRouteMatch,
    pub weighted_targets: Vec<WeightedTarget>,
    #[serde(default)]
    pub retry_policy: Option<HttpRetryPolicy>,
    #[serde(default)]
    pub timeout: Option<HttpTimeout>,
    #[serde(default)]
    pub priority: Option<u32>,
}

impl HttpRouteSpec {
    pub fn new(weighted_targets: Vec<WeightedTarget>) -> Self {
        Self {
            route_match: HttpRouteMatch::default(),
            weighted_targets,
            retry_policy: None,
            timeout: None,
            priority: None,
        }
    }

    pub fn with_match(mut self, route_match: HttpRouteMatch) -> Self {
        self.route_match = route_match;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: HttpRetryPolicy) -> Self {
        self.retry_policy = Some(retry_policy);
        self
    }

    pub fn with_timeout(mut self, timeout: HttpTimeout) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRouteProperty {
    pub action: RouteActionProperty,
    #[serde(rename = "match")]
    pub route_match: HttpRouteMatchProperty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<HttpRetryPolicyProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutProperty>,
}

/// Shared by the HTTP and HTTP2 variants
fn bind_http(spec: &HttpRouteSpec) -> Result<HttpRouteProperty, ConfigurationError> {
    check_prefix(&spec.route_match.prefix)?;
    Ok(HttpRouteProperty {
        action: bind_targets(&spec.weighted_targets)?,
        route_match: HttpRouteMatchProperty {
            prefix: spec.route_match.prefix.clone(),
            method: spec.route_match.method,
        },
        retry_policy: spec
            .retry_policy
            .as_ref()
            .map(HttpRetryPolicy::bind)
            .transpose()?,
        timeout: spec.timeout.as_ref().map(HttpTimeout::render).transpose()?,
    })
}

/// Request match of a gRPC route
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GrpcRouteMatch {
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub method_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcRouteMatchProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
}

impl GrpcRouteMatch {
    fn bind(&self) -> Result<GrpcRouteMatchProperty, ConfigurationError> {
        if self.service_name.as_deref() == Some("") {
            return Err(ConfigurationError::Empty {
                field: "serviceName",
            });
        }
        if self.method_name.is_some() && self.service_name.is_none() {
            return Err(ConfigurationError::MethodWithoutService);
        }
        Ok(GrpcRouteMatchProperty {
            service_name: self.service_name.clone(),
            method_name: self.method_name.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GrpcRetryPolicy {
    pub max_retries: u32,
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub per_retry_timeout: Duration,
    #[serde(default)]
    pub grpc_retry_events: Vec<GrpcRetryEvent>,
    #[serde(default)]
    pub http_retry_events: Vec<HttpRetryEvent>,
    #[serde(default)]
    pub tcp_retry_events: Vec<TcpRetryEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcRetryPolicyProperty {
    pub max_retries: u32,
    pub per_retry_timeout: DurationProperty,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grpc_retry_events: Vec<GrpcRetryEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub http_retry_events: Vec<HttpRetryEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tcp_retry_events: Vec<TcpRetryEvent>,
}

impl GrpcRetryPolicy {
    pub fn bind(&self) -> Result<GrpcRetryPolicyProperty, ConfigurationError> {
        if self.grpc_retry_events.is_empty()
            && self.http_retry_events.is_empty()
            && self.tcp_retry_events.is_empty()
        {
            return Err(ConfigurationError::MissingRetryEvents);
        }
        Ok(GrpcRetryPolicyProperty {
            max_retries: self.max_retries,
            per_retry_timeout: DurationProperty::millis("perRetryTimeout", self.per_retry_timeout)?,
            grpc_retry_events: self.grpc_retry_events.clone(),
            http_retry_events: self.http_retry_events.clone(),
            tcp_retry_events: self.tcp_retry_events.clone(),
        })
    }
}

/// gRPC route
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GrpcRouteSpec {
    #[serde(default, rename = "match")]
    pub route_match: GrpcRouteMatch,
    pub weighted_targets: Vec<WeightedTarget>,
    #[serde(default)]
    pub retry_policy: Option<GrpcRetryPolicy>,
    #[serde(default)]
    pub timeout: Option<HttpTimeout>,
    #[serde(default)]
    pub priority: Option<u32>,
}

impl GrpcRouteSpec {
    pub fn new(weighted_targets: Vec<WeightedTarget>) -> Self {
        Self {
            route_match: GrpcRouteMatch::default(),
            weighted_targets,
            retry_policy: None,
            timeout: None,
            priority: None,
        }
    }

    pub fn with_match(mut self, route_match: GrpcRouteMatch) -> Self {
        self.route_match = route_match;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: GrpcRetryPolicy) -> Self {
        self.retry_policy = Some(retry_policy);
        self
    }

    pub fn with_timeout(mut self, timeout: HttpTimeout) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcRouteProperty {
    pub action: RouteActionProperty,
    #[serde(rename = "match")]
    pub route_match: GrpcRouteMatchProperty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<GrpcRetryPolicyProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutProperty>,
}

/// Specification of a route, tagged by protocol
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum RouteSpec {
    Http(HttpRouteSpec),
    Http2(HttpRouteSpec),
    Grpc(GrpcRouteSpec),
}

/// Rendered route spec (`RouteSpec`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpecProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_route: Option<HttpRouteProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http2_route: Option<HttpRouteProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_route: Option<GrpcRouteProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

impl RouteSpec {
    pub fn http(spec: HttpRouteSpec) -> Self {
        RouteSpec::Http(spec)
    }

    pub fn http2(spec: HttpRouteSpec) -> Self {
        RouteSpec::Http2(spec)
    }

    pub fn grpc(spec: GrpcRouteSpec) -> Self {
        RouteSpec::Grpc(spec)
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            RouteSpec::Http(_) => Protocol::Http,
            RouteSpec::Http2(_) => Protocol::Http2,
            RouteSpec::Grpc(_) => Protocol::Grpc,
        }
    }

    pub fn priority(&self) -> Option<u32> {
        match self {
            RouteSpec::Http(spec) | RouteSpec::Http2(spec) => spec.priority,
            RouteSpec::Grpc(spec) => spec.priority,
        }
    }

    /// Names of the virtual nodes this route sends traffic to
    pub fn target_nodes(&self) -> Vec<&str> {
        let targets = match self {
            RouteSpec::Http(spec) | RouteSpec::Http2(spec) => &spec.weighted_targets,
            RouteSpec::Grpc(spec) => &spec.weighted_targets,
        };
        targets.iter().map(|t| t.virtual_node.as_str()).collect()
    }

    /// Render the spec for the route named `owner`
    pub fn bind(self, owner: &str) -> Result<RouteSpecProperty, ConfigurationError> {
        let priority = self
            .priority()
            .map(|p| in_range("priority", p, 0, MAX_PRIORITY))
            .transpose()?;
        let protocol = self.protocol();
        let rendered = match &self {
            RouteSpec::Http(spec) => RouteSpecProperty {
                http_route: Some(bind_http(spec)?),
                priority,
                ..Default::default()
            },
            RouteSpec::Http2(spec) => RouteSpecProperty {
                http2_route: Some(bind_http(spec)?),
                priority,
                ..Default::default()
            },
            RouteSpec::Grpc(spec) => RouteSpecProperty {
                grpc_route: Some(GrpcRouteProperty {
                    action: bind_targets(&spec.weighted_targets)?,
                    route_match: spec.route_match.bind()?,
                    retry_policy: spec
                        .retry_policy
                        .as_ref()
                        .map(GrpcRetryPolicy::bind)
                        .transpose()?,
                    timeout: spec.timeout.as_ref().map(HttpTimeout::render).transpose()?,
                }),
                priority,
                ..Default::default()
            },
        };
        log::debug!("bound {} route spec for route {}", protocol, owner);
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn targets() -> Vec<WeightedTarget> {
        vec![WeightedTarget::new("node-a", 80), WeightedTarget::new("node-b", 20)]
    }

    fn populated(rendered: &RouteSpecProperty) -> Vec<&'static str> {
        let mut fields = vec![];
        if rendered.http_route.is_some() {
            fields.push("httpRoute");
        }
        if rendered.http2_route.is_some() {
            fields.push("http2Route");
        }
        if rendered.grpc_route.is_some() {
            fields.push("grpcRoute");
        }
        fields
    }

    #[test]
    fn exactly_one_route_kind_is_populated() {
        let specs = [
            (RouteSpec::http(HttpRouteSpec::new(targets())), "httpRoute"),
            (RouteSpec::http2(HttpRouteSpec::new(targets())), "http2Route"),
            (RouteSpec::grpc(GrpcRouteSpec::new(targets())), "grpcRoute"),
        ];
        for (spec, field) in specs {
            let rendered = spec.bind("route").unwrap();
            assert_eq!(populated(&rendered), vec![field]);
            let json = serde_json::to_value(&rendered).unwrap();
            assert_eq!(json.as_object().unwrap().len(), 1);
        }
    }

    #[test]
    fn http_route_renders_match_and_targets() {
        let spec = RouteSpec::http(
            HttpRouteSpec::new(targets())
                .with_match(HttpRouteMatch {
                    prefix: "/api".to_string(),
                    method: Some(HttpMethod::Get),
                })
                .with_priority(10)
                .with_timeout(HttpTimeout {
                    idle: None,
                    per_request: Some(Duration::from_secs(15)),
                })
                .with_retry_policy(HttpRetryPolicy {
                    max_retries: 3,
                    per_retry_timeout: Duration::from_secs(2),
                    http_retry_events: vec![HttpRetryEvent::ServerError],
                    tcp_retry_events: vec![],
                }),
        );
        assert_eq!(
            serde_json::to_value(spec.bind("route").unwrap()).unwrap(),
            json!({
                "httpRoute": {
                    "action": {"weightedTargets": [
                        {"virtualNode": "node-a", "weight": 80},
                        {"virtualNode": "node-b", "weight": 20},
                    ]},
                    "match": {"prefix": "/api", "method": "GET"},
                    "retryPolicy": {
                        "maxRetries": 3,
                        "perRetryTimeout": {"unit": "ms", "value": 2000},
                        "httpRetryEvents": ["server-error"],
                    },
                    "timeout": {"perRequest": {"unit": "ms", "value": 15000}},
                },
                "priority": 10,
            })
        );
    }

    #[test]
    fn weighted_target_rules() {
        let bind = |targets: Vec<WeightedTarget>| {
            RouteSpec::http(HttpRouteSpec::new(targets)).bind("route")
        };
        assert_eq!(bind(vec![]), Err(ConfigurationError::NoWeightedTargets));
        assert_eq!(
            bind(vec![WeightedTarget::new("a", 0), WeightedTarget::new("b", 0)]),
            Err(ConfigurationError::ZeroTotalWeight)
        );
        assert!(matches!(
            bind(vec![WeightedTarget::new("a", 101)]),
            Err(ConfigurationError::OutOfRange { field: "weight", .. })
        ));
        let eleven = (0..11).map(|i| WeightedTarget::new(format!("n{}", i), 1)).collect();
        assert_eq!(
            bind(eleven),
            Err(ConfigurationError::TooManyWeightedTargets { max: 10, count: 11 })
        );
        assert!(bind(vec![WeightedTarget::new("a", 0), WeightedTarget::new("b", 1)]).is_ok());
    }

    #[test]
    fn priority_is_bounded() {
        let spec = RouteSpec::http2(HttpRouteSpec::new(targets()).with_priority(1001));
        assert!(matches!(
            spec.bind("route"),
            Err(ConfigurationError::OutOfRange { field: "priority", .. })
        ));
    }

    #[test]
    fn retry_policy_needs_events() {
        let spec = RouteSpec::grpc(GrpcRouteSpec::new(targets()).with_retry_policy(
            GrpcRetryPolicy {
                max_retries: 1,
                per_retry_timeout: Duration::from_secs(1),
                grpc_retry_events: vec![],
                http_retry_events: vec![],
                tcp_retry_events: vec![],
            },
        ));
        assert_eq!(spec.bind("route"), Err(ConfigurationError::MissingRetryEvents));
    }

    #[test]
    fn prefix_must_be_absolute() {
        let spec = RouteSpec::http(HttpRouteSpec::new(targets()).with_match(HttpRouteMatch {
            prefix: "api".to_string(),
            method: None,
        }));
        assert_eq!(
            spec.bind("route"),
            Err(ConfigurationError::InvalidPathPrefix {
                prefix: "api".to_string()
            })
        );
    }

    #[test]
    fn grpc_method_requires_service() {
        let spec = RouteSpec::grpc(GrpcRouteSpec::new(targets()).with_match(GrpcRouteMatch {
            service_name: None,
            method_name: Some("Get".to_string()),
        }));
        assert_eq!(spec.bind("route"), Err(ConfigurationError::MethodWithoutService));
    }

    #[test]
    fn grpc_route_renders_timeout() {
        let spec = RouteSpec::grpc(GrpcRouteSpec::new(targets()).with_timeout(HttpTimeout {
            idle: Some(Duration::from_secs(60)),
            per_request: Some(Duration::from_millis(250)),
        }));
        let rendered = serde_json::to_value(spec.bind("route").unwrap()).unwrap();
        assert_eq!(
            rendered["grpcRoute"]["timeout"],
            json!({
                "idle": {"unit": "ms", "value": 60000},
                "perRequest": {"unit": "ms", "value": 250},
            })
        );
    }

    #[test]
    fn deserializes_from_document_form() {
        let spec: RouteSpec = serde_json::from_value(json!({
            "protocol": "grpc",
            "match": {"serviceName": "orders.Orders"},
            "weightedTargets": [{"virtualNode": "orders"}],
            "retryPolicy": {
                "maxRetries": 2,
                "perRetryTimeout": "500ms",
                "grpcRetryEvents": ["unavailable", "deadline-exceeded"],
            },
        }))
        .unwrap();
        assert_eq!(spec.target_nodes(), vec!["orders"]);
        let rendered = serde_json::to_value(spec.bind("route").unwrap()).unwrap();
        assert_eq!(
            rendered["grpcRoute"]["action"]["weightedTargets"][0],
            json!({"virtualNode": "orders", "weight": 1})
        );
        assert_eq!(
            rendered["grpcRoute"]["retryPolicy"]["grpcRetryEvents"],
            json!(["unavailable", "deadline-exceeded"])
        );
    }
}
