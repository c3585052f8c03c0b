//! Virtual gateway declaration

use std::sync::Arc;

use meshform_core::scope::Scope;
use meshform_core::token::Name;
use serde::{Deserialize, Serialize};

use super::{AccessLog, GatewayRoute, LoggingProperty, Parent, RenderedResource, check_unique, finish};
use crate::error::{ConfigurationError, Result};
use crate::identity::{IdentityAttributes, ResourceIdentity, ResourceKind};
use crate::listener::VirtualGatewayListener;
use crate::listener::gateway::VirtualGatewayListenerProperty;

/// Virtual gateways support a single listener
pub const MAX_LISTENERS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VirtualGateway {
    pub id: String,
    #[serde(default)]
    pub name: Name,
    #[serde(default)]
    pub listeners: Vec<VirtualGatewayListener>,
    #[serde(default)]
    pub access_log: Option<AccessLog>,
    #[serde(default)]
    pub gateway_routes: Vec<GatewayRoute>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VirtualGatewaySpecProperty {
    listeners: Vec<VirtualGatewayListenerProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logging: Option<LoggingProperty>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VirtualGatewayProperties {
    mesh_name: String,
    virtual_gateway_name: String,
    spec: VirtualGatewaySpecProperty,
}

impl VirtualGateway {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Name::Unresolved,
            listeners: Vec::new(),
            access_log: None,
            gateway_routes: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Name::literal(name);
        self
    }

    pub fn add_listener(mut self, listener: VirtualGatewayListener) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_access_log(mut self, access_log: AccessLog) -> Self {
        self.access_log = Some(access_log);
        self
    }

    pub fn add_gateway_route(mut self, route: GatewayRoute) -> Self {
        self.gateway_routes.push(route);
        self
    }

    /// Render the gateway followed by its gateway routes. A gateway declared
    /// without listeners gets an HTTP listener on port 8080.
    pub fn render(self, scope: &dyn Scope, mesh: &Parent<'_>) -> Result<Vec<RenderedResource>> {
        let path = mesh.path.child(&self.id);
        let name = path.resolve_name(scope, self.name);

        if self.listeners.len() > MAX_LISTENERS {
            return Err(ConfigurationError::TooManyListeners {
                resource: format!("virtual gateway {}", name),
            }
            .into());
        }
        let listeners = if self.listeners.is_empty() {
            vec![VirtualGatewayListener::default()]
        } else {
            self.listeners
        };
        let listeners = listeners
            .into_iter()
            .map(|listener| listener.bind(&name))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let identity = Arc::new(ResourceIdentity::declared(
            scope,
            IdentityAttributes::VirtualGateway {
                virtual_gateway_name: name.clone(),
                mesh: mesh.identity.clone(),
            },
        )?);
        let logical_id = path.logical_id(scope);

        let properties = VirtualGatewayProperties {
            mesh_name: identity.mesh_name().to_string(),
            virtual_gateway_name: name,
            spec: VirtualGatewaySpecProperty {
                listeners,
                logging: self.access_log.as_ref().map(AccessLog::bind).transpose()?,
            },
        };
        let mut rendered = vec![finish(
            identity.clone(),
            logical_id.clone(),
            &properties,
            vec![mesh.logical_id.to_string()],
        )?];

        let parent = Parent {
            identity: &identity,
            path: &path,
            logical_id: &logical_id,
        };
        for route in self.gateway_routes {
            rendered.push(route.render(scope, &parent)?);
        }
        check_unique(
            ResourceKind::GatewayRoute,
            rendered
                .iter()
                .filter(|r| r.identity.kind() == ResourceKind::GatewayRoute)
                .map(|r| r.identity.name()),
        )?;

        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::gateway_route_spec::{GatewayRouteSpec, HttpGatewayRouteSpec};
    use crate::health_check::HealthCheck;
    use crate::listener::gateway::HttpGatewayListenerOptions;
    use crate::protocol::Protocol;
    use crate::resources::ConstructPath;
    use meshform_core::scope::Stack;
    use serde_json::json;

    fn stack() -> Stack {
        Stack::new("MeshStack", "us-east-1", "123456789012")
    }

    fn render(gateway: VirtualGateway) -> Result<Vec<RenderedResource>> {
        let stack = stack();
        let mesh = Arc::new(
            ResourceIdentity::declared(
                &stack,
                IdentityAttributes::Mesh {
                    mesh_name: "m1".to_string(),
                },
            )
            .unwrap(),
        );
        let path = ConstructPath::root("Mesh");
        let parent = Parent {
            identity: &mesh,
            path: &path,
            logical_id: "MeshLogicalId",
        };
        gateway.render(&stack, &parent)
    }

    #[test]
    fn gateway_without_listeners_gets_default_listener() {
        let rendered = render(VirtualGateway::new("Gateway").with_name("vg1")).unwrap();
        assert_eq!(rendered.len(), 1);
        let gateway = &rendered[0];
        assert_eq!(
            gateway.resource.properties_json(),
            json!({
                "meshName": "m1",
                "virtualGatewayName": "vg1",
                "spec": {"listeners": [{"portMapping": {"port": 8080, "protocol": "http"}}]},
            })
        );
        assert_eq!(gateway.resource.depends_on, vec!["MeshLogicalId"]);
        assert_eq!(
            gateway.identity.arn(),
            "arn:aws:appmesh:us-east-1:123456789012:mesh/m1/virtualGateway/vg1"
        );
    }

    #[test]
    fn more_than_one_listener_is_rejected() {
        let gateway = VirtualGateway::new("Gateway")
            .add_listener(VirtualGatewayListener::default())
            .add_listener(VirtualGatewayListener::default());
        assert!(matches!(
            render(gateway),
            Err(Error::Configuration(ConfigurationError::TooManyListeners { .. }))
        ));
    }

    #[test]
    fn tcp_health_check_fails_before_emission() {
        let gateway = VirtualGateway::new("Gateway").add_listener(VirtualGatewayListener::http(
            HttpGatewayListenerOptions::default()
                .with_health_check(HealthCheck::new().with_protocol(Protocol::Tcp)),
        ));
        assert!(matches!(
            render(gateway),
            Err(Error::Configuration(
                ConfigurationError::TcpHealthCheckOnGateway
            ))
        ));
    }

    #[test]
    fn renders_access_log_and_gateway_routes() {
        let gateway = VirtualGateway::new("Gateway")
            .with_name("vg1")
            .with_access_log(AccessLog::file("/dev/stdout"))
            .add_gateway_route(
                GatewayRoute::new(
                    "Route",
                    GatewayRouteSpec::http(HttpGatewayRouteSpec::new("/", "svc.local")),
                )
                .with_name("r1"),
            );
        let rendered = render(gateway).unwrap();
        assert_eq!(rendered.len(), 2);
        assert_eq!(
            rendered[0].resource.properties_json()["spec"]["logging"],
            json!({"accessLog": {"file": {"path": "/dev/stdout"}}})
        );
        let route = &rendered[1];
        assert_eq!(route.identity.kind(), ResourceKind::GatewayRoute);
        assert_eq!(route.resource.depends_on, vec![rendered[0].logical_id.clone()]);
        assert_eq!(
            route.identity.arn(),
            "arn:aws:appmesh:us-east-1:123456789012:mesh/m1/virtualGateway/vg1/gatewayRoute/r1"
        );
    }
}
