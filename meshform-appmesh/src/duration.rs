//! Durations: input parsing and millisecond rendering

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigurationError;

static DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*(ms|s|m|h)\s*$").expect("duration pattern is valid"));

/// Rendered duration (`{"unit": "ms", "value": n}`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationProperty {
    pub unit: &'static str,
    pub value: u64,
}

impl DurationProperty {
    pub fn millis(field: &'static str, duration: Duration) -> Result<Self, ConfigurationError> {
        Ok(Self {
            unit: "ms",
            value: whole_millis(field, duration)?,
        })
    }
}

/// Duration as a whole number of milliseconds.
///
/// Sub-millisecond remainders are rejected rather than rounded.
pub fn whole_millis(field: &'static str, duration: Duration) -> Result<u64, ConfigurationError> {
    if duration.subsec_nanos() % 1_000_000 != 0 {
        return Err(ConfigurationError::FractionalMillis { field, duration });
    }
    Ok(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Parse "250ms", "5s", "1m" or "2h"
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let caps = DURATION_PATTERN
        .captures(s)
        .ok_or_else(|| format!("invalid duration '{}', expected e.g. 250ms, 5s, 1m", s))?;
    let amount: u64 = caps[1]
        .parse()
        .map_err(|_| format!("duration '{}' is too large", s))?;
    let duration = match &caps[2] {
        "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        _ => Duration::from_secs(amount.saturating_mul(3600)),
    };
    Ok(duration)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Millis(u64),
    Text(String),
}

impl RawDuration {
    fn into_duration<E: serde::de::Error>(self) -> Result<Duration, E> {
        match self {
            RawDuration::Millis(ms) => Ok(Duration::from_millis(ms)),
            RawDuration::Text(s) => parse_duration(&s).map_err(E::custom),
        }
    }
}

/// Deserialize a duration given as integer milliseconds or a string
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    RawDuration::deserialize(deserializer)?.into_duration()
}

/// `deserialize` for optional fields; use with `#[serde(default)]`
pub mod option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<RawDuration>::deserialize(deserializer)?
            .map(RawDuration::into_duration)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "super::deserialize")]
        required: Duration,
        #[serde(default, deserialize_with = "super::option::deserialize")]
        optional: Option<Duration>,
    }

    #[test]
    fn parses_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration(" 2m "), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("1.5s").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn deserializes_millis_or_text() {
        let h: Holder = serde_json::from_str(r#"{"required": 1500, "optional": "5s"}"#).unwrap();
        assert_eq!(h.required, Duration::from_millis(1500));
        assert_eq!(h.optional, Some(Duration::from_secs(5)));

        let h: Holder = serde_json::from_str(r#"{"required": "2s"}"#).unwrap();
        assert_eq!(h.optional, None);

        assert!(serde_json::from_str::<Holder>(r#"{"required": "soon"}"#).is_err());
    }

    #[test]
    fn whole_millis_rejects_fractions() {
        assert_eq!(whole_millis("interval", Duration::from_secs(5)), Ok(5000));
        assert!(matches!(
            whole_millis("interval", Duration::from_micros(1500)),
            Err(ConfigurationError::FractionalMillis { field: "interval", .. })
        ));
    }

    #[test]
    fn duration_property_is_in_millis() {
        let rendered = DurationProperty::millis("idle", Duration::from_secs(10)).unwrap();
        assert_eq!(
            serde_json::to_value(rendered).unwrap(),
            serde_json::json!({"unit": "ms", "value": 10000})
        );
    }
}
