//! Meshform App Mesh engine
//!
//! Typed, validated App Mesh resource specifications that render into
//! CloudFormation property bags.
//!
//! ## Module Structure
//!
//! - `health_check` - Health check policy builder
//! - `tls` - Listener TLS certificates and validation contexts
//! - `listener` - Virtual node and virtual gateway listeners
//! - `route_spec` / `gateway_route_spec` - Route specifications
//! - `resources` - Resource declarations (mesh, gateways, nodes, routers, routes)
//! - `identity` - Name/ARN resolution for declared and imported resources
//! - `grant` - IAM action sets per resource kind
//! - `schemas` - Resource schemas checked before emission
//! - `document` - Serde mesh document and render pipeline

pub mod document;
pub mod duration;
pub mod error;
pub mod gateway_route_spec;
pub mod grant;
pub mod health_check;
pub mod identity;
pub mod listener;
pub mod protocol;
pub mod resources;
pub mod route_spec;
pub mod schemas;
pub mod tls;

// Re-export main types
pub use document::{MeshDocument, RenderedDocument, render_document};
pub use error::{ConfigurationError, Error, MalformedIdentityError, Result};
pub use identity::{IdentityAttributes, ResourceIdentity, ResourceKind};
pub use protocol::Protocol;
pub use resources::{
    GatewayRoute, Mesh, RenderedResource, Route, VirtualGateway, VirtualNode, VirtualRouter,
};
