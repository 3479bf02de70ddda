//! Provider configuration for the OPNsense Terraform provider.
//!
//! Explicit provider attributes are layered over `OPNSENSE_*` environment
//! variables, validated, and translated into [`opnsense_api::Options`].
//! Attributes left null in the provider block never shadow the
//! environment.

use figment::{
    Figment, Provider,
    providers::{Env, Serialized},
    value::Value,
};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use url::Url;

pub const ENV_PREFIX: &str = "OPNSENSE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent from both the provider block and
    /// the environment.
    #[error(
        "missing {field}: set the `{field}` provider attribute or the {env} environment variable"
    )]
    Missing { field: &'static str, env: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    /// Provider attribute the error is about, if any.
    pub fn attribute(&self) -> Option<&'static str> {
        match self {
            Self::Missing { field, .. } | Self::Validation { field, .. } => Some(field),
            Self::Figment(_) => None,
        }
    }

    fn missing(field: &'static str) -> Self {
        Self::Missing {
            field,
            env: format!("{ENV_PREFIX}{}", field.to_ascii_uppercase()),
        }
    }
}

// ── Provider block ──────────────────────────────────────────────────

/// Attributes as written in the `provider "opnsense"` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_insecure: Option<bool>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_backoff: Option<i64>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_backoff: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<i64>,
}

impl ProviderConfig {
    /// Range checks on explicitly configured values. Environment values
    /// are not held to these; malformed ones fall back to client defaults.
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_backoff", self.max_backoff),
            ("min_backoff", self.min_backoff),
        ] {
            if let Some(secs) = value.filter(|secs| *secs < 1) {
                return Err(ConfigError::Validation {
                    field,
                    reason: format!("must be at least 1, got {secs}"),
                });
            }
        }
        if let Some(retries) = self
            .retries
            .filter(|r| !(1..=i64::from(i32::MAX)).contains(r))
        {
            return Err(ConfigError::Validation {
                field: "retries",
                reason: format!("must be between 1 and {}, got {retries}", i32::MAX),
            });
        }
        Ok(())
    }
}

// ── Layered view ────────────────────────────────────────────────────

/// Merged view of environment plus provider block. Numeric and boolean
/// values are parsed leniently because environment values arrive as
/// loosely typed strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Layered {
    #[serde(deserialize_with = "lenient_text")]
    uri: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    api_key: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    api_secret: Option<String>,
    #[serde(deserialize_with = "lenient_flag")]
    allow_insecure: bool,
    #[serde(deserialize_with = "lenient_int")]
    max_backoff: i64,
    #[serde(deserialize_with = "lenient_int")]
    min_backoff: i64,
    #[serde(deserialize_with = "lenient_int")]
    retries: i64,
}

/// The environment layer parses all-digit values as numbers; keys and
/// secrets still need them as text.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(_, s)) => Some(s),
        Some(other) => other.to_i128().map(|i| i.to_string()),
        None => None,
    })
}

/// Malformed values decode as `0`, meaning "use the client default".
fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| match v {
            Value::String(_, s) => s.trim().parse().ok(),
            other => other.to_i128().and_then(|i| i64::try_from(i).ok()),
        })
        .unwrap_or(0))
}

/// Accepts the usual spellings of true/false; anything else is `false`.
fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(_, b)) => b,
        Some(Value::String(_, s)) => matches!(s.trim(), "1" | "t" | "T" | "true" | "TRUE" | "True"),
        Some(other) => other.to_i128() == Some(1),
        None => false,
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::missing(field))
}

// ── Resolved settings ───────────────────────────────────────────────

/// Fully resolved provider settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub uri: Url,
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub allow_insecure: bool,
    /// Seconds; `0` keeps the client default.
    pub max_backoff: i64,
    /// Seconds; `0` keeps the client default.
    pub min_backoff: i64,
    /// `0` keeps the client default.
    pub retries: i64,
}

impl Settings {
    /// Translate into client options.
    pub fn to_options(&self) -> opnsense_api::Options {
        opnsense_api::Options {
            uri: self.uri.as_str().trim_end_matches('/').to_owned(),
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
            allow_insecure: self.allow_insecure,
            max_backoff: self.max_backoff,
            min_backoff: self.min_backoff,
            max_retries: self.retries,
        }
    }
}

/// Resolve settings from the provider block and the process environment.
pub fn resolve(explicit: &ProviderConfig) -> Result<Settings, ConfigError> {
    resolve_with(explicit, Env::prefixed(ENV_PREFIX))
}

/// Resolve settings with an explicit stand-in for the environment layer.
///
/// `env` must expose keys without the prefix, lowercased (`uri`,
/// `api_key`, `max_backoff`, ...), as `Env::prefixed` does.
pub fn resolve_with<P: Provider>(
    explicit: &ProviderConfig,
    env: P,
) -> Result<Settings, ConfigError> {
    explicit.validate()?;

    let layered: Layered = Figment::new()
        .merge(env)
        .merge(Serialized::defaults(explicit))
        .extract()?;

    let uri = required(layered.uri, "uri")?;
    let api_key = required(layered.api_key, "api_key")?;
    let api_secret = required(layered.api_secret, "api_secret")?;

    let uri = Url::parse(&uri).map_err(|e| ConfigError::Validation {
        field: "uri",
        reason: format!("'{uri}' is not a valid URL: {e}"),
    })?;
    if !matches!(uri.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "uri",
            reason: format!("scheme must be http or https, got '{}'", uri.scheme()),
        });
    }

    Ok(Settings {
        uri,
        api_key: SecretString::from(api_key),
        api_secret: SecretString::from(api_secret),
        allow_insecure: layered.allow_insecure,
        max_backoff: layered.max_backoff,
        min_backoff: layered.min_backoff,
        retries: layered.retries,
    })
}
