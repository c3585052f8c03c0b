//! Case conversion for rendered property names
//!
//! Engines render properties with camelCase keys (e.g., `virtualGatewayName`,
//! `portMapping`); templates use PascalCase (e.g., `VirtualGatewayName`,
//! `PortMapping`). Only keys are converted; values such as `"http"` or
//! `"STRICT"` are left as rendered.

use heck::ToUpperCamelCase;

/// Template keys spelled as acronyms
const ACRONYM_KEYS: &[(&str, &str)] = &[
    ("acm", "ACM"),
    ("awsCloudMap", "AWSCloudMap"),
    ("dns", "DNS"),
    ("sds", "SDS"),
    ("tls", "TLS"),
];

/// Objects whose per-protocol keys are spelled as acronyms
const PROTOCOL_KEYED_PARENTS: &[&str] = &["timeout", "connectionPool"];

/// Protocol keys under `timeout` and `connectionPool`
const PROTOCOL_KEYS: &[(&str, &str)] = &[
    ("grpc", "GRPC"),
    ("http", "HTTP"),
    ("http2", "HTTP2"),
    ("tcp", "TCP"),
];

/// Convert camelCase or snake_case to PascalCase
/// e.g., "http2Route" -> "Http2Route", "tls" -> "TLS"
pub fn to_pascal_case(s: &str) -> String {
    ACRONYM_KEYS
        .iter()
        .find(|(key, _)| *key == s)
        .map(|(_, acronym)| acronym.to_string())
        .unwrap_or_else(|| s.to_upper_camel_case())
}

/// Convert a key given the camelCase key of the object holding it
fn key_to_pascal_case(key: &str, parent: Option<&str>) -> String {
    if let Some(parent) = parent
        && PROTOCOL_KEYED_PARENTS.contains(&parent)
        && let Some((_, acronym)) = PROTOCOL_KEYS.iter().find(|(k, _)| *k == key)
    {
        return acronym.to_string();
    }
    to_pascal_case(key)
}

/// Recursively convert object keys to PascalCase
pub fn keys_to_pascal_case(value: &serde_json::Value) -> serde_json::Value {
    convert_keys(value, None)
}

fn convert_keys(value: &serde_json::Value, parent: Option<&str>) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (key_to_pascal_case(k, parent), convert_keys(v, Some(k.as_str()))))
                .collect(),
        ),
        // Array items keep the key holding the array as their parent
        serde_json::Value::Array(items) => serde_json::Value::Array(
            items.iter().map(|item| convert_keys(item, parent)).collect(),
        ),
        other => other.clone(),
    }
}
