//! Virtual node declaration

use std::sync::Arc;

use meshform_core::scope::Scope;
use meshform_core::token::Name;
use serde::{Deserialize, Serialize};

use super::{AccessLog, LoggingProperty, Parent, RenderedResource, finish};
use crate::error::{ConfigurationError, Result};
use crate::gateway_route_spec::VirtualServiceProperty;
use crate::identity::{IdentityAttributes, ResourceIdentity};
use crate::listener::VirtualNodeListener;
use crate::listener::node::VirtualNodeListenerProperty;

/// Virtual nodes support a single listener
pub const MAX_LISTENERS: usize = 1;

/// How the tasks behind a virtual node are found
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", deny_unknown_fields)]
pub enum ServiceDiscovery {
    Dns {
        hostname: String,
    },
    CloudMap {
        namespace_name: String,
        service_name: String,
    },
}

impl ServiceDiscovery {
    pub fn dns(hostname: impl Into<String>) -> Self {
        ServiceDiscovery::Dns {
            hostname: hostname.into(),
        }
    }

    pub fn cloud_map(namespace_name: impl Into<String>, service_name: impl Into<String>) -> Self {
        ServiceDiscovery::CloudMap {
            namespace_name: namespace_name.into(),
            service_name: service_name.into(),
        }
    }

    fn bind(&self) -> std::result::Result<ServiceDiscoveryProperty, ConfigurationError> {
        match self {
            ServiceDiscovery::Dns { hostname } => {
                if hostname.is_empty() {
                    return Err(ConfigurationError::Empty { field: "hostname" });
                }
                Ok(ServiceDiscoveryProperty {
                    dns: Some(DnsProperty {
                        hostname: hostname.clone(),
                    }),
                    aws_cloud_map: None,
                })
            }
            ServiceDiscovery::CloudMap {
                namespace_name,
                service_name,
            } => {
                if namespace_name.is_empty() {
                    return Err(ConfigurationError::Empty {
                        field: "namespaceName",
                    });
                }
                if service_name.is_empty() {
                    return Err(ConfigurationError::Empty {
                        field: "serviceName",
                    });
                }
                Ok(ServiceDiscoveryProperty {
                    dns: None,
                    aws_cloud_map: Some(CloudMapProperty {
                        namespace_name: namespace_name.clone(),
                        service_name: service_name.clone(),
                    }),
                })
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DnsProperty {
    hostname: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CloudMapProperty {
    namespace_name: String,
    service_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceDiscoveryProperty {
    #[serde(skip_serializing_if = "Option::is_none")]
    dns: Option<DnsProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aws_cloud_map: Option<CloudMapProperty>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BackendProperty {
    virtual_service: VirtualServiceProperty,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VirtualNodeSpecProperty {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    listeners: Vec<VirtualNodeListenerProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_discovery: Option<ServiceDiscoveryProperty>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    backends: Vec<BackendProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logging: Option<LoggingProperty>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VirtualNodeProperties {
    mesh_name: String,
    virtual_node_name: String,
    spec: VirtualNodeSpecProperty,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VirtualNode {
    pub id: String,
    #[serde(default)]
    pub name: Name,
    #[serde(default)]
    pub listeners: Vec<VirtualNodeListener>,
    #[serde(default)]
    pub service_discovery: Option<ServiceDiscovery>,
    /// Names of the virtual services this node sends traffic to
    #[serde(default)]
    pub backends: Vec<String>,
    #[serde(default)]
    pub access_log: Option<AccessLog>,
}

impl VirtualNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Name::Unresolved,
            listeners: Vec::new(),
            service_discovery: None,
            backends: Vec::new(),
            access_log: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Name::literal(name);
        self
    }

    pub fn add_listener(mut self, listener: VirtualNodeListener) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_service_discovery(mut self, service_discovery: ServiceDiscovery) -> Self {
        self.service_discovery = Some(service_discovery);
        self
    }

    pub fn add_backend(mut self, virtual_service_name: impl Into<String>) -> Self {
        self.backends.push(virtual_service_name.into());
        self
    }

    pub fn with_access_log(mut self, access_log: AccessLog) -> Self {
        self.access_log = Some(access_log);
        self
    }

    pub fn render(self, scope: &dyn Scope, mesh: &Parent<'_>) -> Result<RenderedResource> {
        let path = mesh.path.child(&self.id);
        let name = path.resolve_name(scope, self.name);

        if self.listeners.len() > MAX_LISTENERS {
            return Err(ConfigurationError::TooManyListeners {
                resource: format!("virtual node {}", name),
            }
            .into());
        }
        if !self.listeners.is_empty() && self.service_discovery.is_none() {
            return Err(ConfigurationError::MissingServiceDiscovery { resource: name }.into());
        }

        let listeners = self
            .listeners
            .into_iter()
            .map(|listener| listener.bind(&name))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let backends = self
            .backends
            .into_iter()
            .map(|virtual_service_name| {
                if virtual_service_name.is_empty() {
                    return Err(ConfigurationError::Empty {
                        field: "virtualServiceName",
                    });
                }
                Ok(BackendProperty {
                    virtual_service: VirtualServiceProperty {
                        virtual_service_name,
                    },
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let identity = Arc::new(ResourceIdentity::declared(
            scope,
            IdentityAttributes::VirtualNode {
                virtual_node_name: name.clone(),
                mesh: mesh.identity.clone(),
            },
        )?);

        let properties = VirtualNodeProperties {
            mesh_name: identity.mesh_name().to_string(),
            virtual_node_name: name,
            spec: VirtualNodeSpecProperty {
                listeners,
                service_discovery: self
                    .service_discovery
                    .as_ref()
                    .map(ServiceDiscovery::bind)
                    .transpose()?,
                backends,
                logging: self.access_log.as_ref().map(AccessLog::bind).transpose()?,
            },
        };
        finish(
            identity,
            path.logical_id(scope),
            &properties,
            vec![mesh.logical_id.to_string()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::listener::node::{HttpNodeListenerOptions, TcpNodeListenerOptions};
    use crate::listener::{TcpConnectionPool, TcpTimeout};
    use crate::resources::ConstructPath;
    use meshform_core::emitter::{ResourceEmitter, TemplateEmitter};
    use meshform_core::scope::Stack;
    use serde_json::json;
    use std::time::Duration;

    fn render(node: VirtualNode) -> Result<RenderedResource> {
        let stack = Stack::new("MeshStack", "us-east-1", "123456789012");
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
        node.render(
            &stack,
            &Parent {
                identity: &mesh,
                path: &path,
                logical_id: "MeshLogicalId",
            },
        )
    }

    #[test]
    fn bare_node_renders_empty_spec() {
        let rendered = render(VirtualNode::new("Node").with_name("n1")).unwrap();
        assert_eq!(
            rendered.resource.properties_json(),
            json!({"meshName": "m1", "virtualNodeName": "n1", "spec": {}})
        );
        assert_eq!(
            rendered.identity.arn(),
            "arn:aws:appmesh:us-east-1:123456789012:mesh/m1/virtualNode/n1"
        );
    }

    #[test]
    fn renders_listener_discovery_and_backends() {
        let node = VirtualNode::new("Node")
            .with_name("n1")
            .add_listener(VirtualNodeListener::tcp(
                TcpNodeListenerOptions::default().with_port(9000),
            ))
            .with_service_discovery(ServiceDiscovery::cloud_map("local", "orders"))
            .add_backend("payments.local");
        let spec = &render(node).unwrap().resource.properties_json()["spec"];
        assert_eq!(
            spec["listeners"],
            json!([{"portMapping": {"port": 9000, "protocol": "tcp"}}])
        );
        assert_eq!(
            spec["serviceDiscovery"],
            json!({"awsCloudMap": {"namespaceName": "local", "serviceName": "orders"}})
        );
        assert_eq!(
            spec["backends"],
            json!([{"virtualService": {"virtualServiceName": "payments.local"}}])
        );
    }

    #[test]
    fn tcp_timeout_and_pool_use_protocol_acronyms_in_template() {
        let node = VirtualNode::new("Node")
            .with_name("db")
            .with_service_discovery(ServiceDiscovery::dns("db.local"))
            .add_listener(VirtualNodeListener::tcp(
                TcpNodeListenerOptions::default()
                    .with_port(5432)
                    .with_timeout(TcpTimeout {
                        idle: Some(Duration::from_secs(1)),
                    })
                    .with_connection_pool(TcpConnectionPool { max_connections: 5 }),
            ));
        let rendered = render(node).unwrap();
        let mut emitter = TemplateEmitter::new();
        emitter.emit(&rendered.resource).unwrap();

        let template = emitter.template();
        let listener =
            &template["Resources"][&rendered.logical_id]["Properties"]["Spec"]["Listeners"][0];
        assert_eq!(
            listener["Timeout"],
            json!({"TCP": {"Idle": {"Unit": "ms", "Value": 1000}}})
        );
        assert_eq!(listener["ConnectionPool"], json!({"TCP": {"MaxConnections": 5}}));
        assert_eq!(
            listener["PortMapping"],
            json!({"Port": 5432, "Protocol": "tcp"})
        );
    }

    #[test]
    fn listener_requires_service_discovery() {
        let node = VirtualNode::new("Node")
            .with_name("n1")
            .add_listener(VirtualNodeListener::http(HttpNodeListenerOptions::default()));
        let err = render(node).unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::MissingServiceDiscovery { .. })
        ));
        assert_eq!(
            err.to_string(),
            "Service discovery information is required for virtual node n1 with a listener"
        );
    }

    #[test]
    fn more_than_one_listener_is_rejected() {
        let node = VirtualNode::new("Node")
            .with_service_discovery(ServiceDiscovery::dns("n1.local"))
            .add_listener(VirtualNodeListener::http(HttpNodeListenerOptions::default()))
            .add_listener(VirtualNodeListener::tcp(TcpNodeListenerOptions::default()));
        assert!(matches!(
            render(node),
            Err(Error::Configuration(ConfigurationError::TooManyListeners { .. }))
        ));
    }

    #[test]
    fn deserializes_service_discovery() {
        let node: VirtualNode = serde_json::from_value(json!({
            "id": "Node",
            "serviceDiscovery": {"dns": {"hostname": "n1.local"}},
            "listeners": [{"protocol": "http", "port": 8080}],
        }))
        .unwrap();
        assert_eq!(node.service_discovery, Some(ServiceDiscovery::dns("n1.local")));
        let spec = &render(node).unwrap().resource.properties_json()["spec"];
        assert_eq!(spec["serviceDiscovery"], json!({"dns": {"hostname": "n1.local"}}));
    }
}
