use std::collections::BTreeMap;

use thiserror::Error;

/// Top-level error type for the `opnsense-api` crate.
///
/// Covers every failure mode of a request against the appliance:
/// authentication, transport, the mutation envelopes, and decoding.
/// `opnsense-provider` maps these into diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// API key or secret rejected (HTTP 401/403).
    #[error("Authentication failed (HTTP {status}): check the API key and secret")]
    Authentication { status: u16 },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client build error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Any non-200 response that is not an auth failure.
    #[error("status code non-200; status code {status}: {body}")]
    Status { status: u16, body: String },

    /// The item does not exist on the appliance (the get endpoint returned `[]`).
    #[error("unable to find {kind} '{id}'. it may have been deleted upstream")]
    NotFound { kind: &'static str, id: String },

    /// An add/set call answered with something other than `"saved"`.
    #[error("{kind} not changed. result: {result}. errors: {}", format_validations(.validations))]
    NotSaved {
        kind: &'static str,
        result: String,
        validations: BTreeMap<String, serde_json::Value>,
    },

    /// A delete call answered with something other than `"deleted"`.
    #[error("{kind} not deleted. result: {result}")]
    NotDeleted { kind: &'static str, result: String },

    /// A reconfigure/apply endpoint did not report `"ok"`.
    #[error("reconfigure failed at {endpoint}. status: {status}")]
    Reconfigure { endpoint: String, status: String },

    /// The item was created (and has an ID) but a follow-up step failed.
    #[error("{kind} '{id}' was created, but a follow-up step failed: {source}")]
    PartialCreate {
        kind: &'static str,
        id: String,
        #[source]
        source: Box<Error>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// Request body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the remote object is gone.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Status { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// ID allocated by the appliance before the failure, if any.
    pub fn created_id(&self) -> Option<&str> {
        match self {
            Self::PartialCreate { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Statuses the client retries: throttling and server errors, except
/// 501 which will never succeed.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    status == 429 || (status >= 500 && status != 501)
}

fn format_validations(validations: &BTreeMap<String, serde_json::Value>) -> String {
    if validations.is_empty() {
        return "none".into();
    }
    validations
        .iter()
        .map(|(field, msg)| match msg {
            serde_json::Value::String(s) => format!("{field}: {s}"),
            other => format!("{field}: {other}"),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_saved_lists_validations() {
        let mut validations = BTreeMap::new();
        validations.insert(
            "route.network".to_owned(),
            serde_json::Value::String("invalid network".into()),
        );
        let err = Error::NotSaved {
            kind: "route",
            result: "failed".into(),
            validations,
        };
        assert_eq!(
            err.to_string(),
            "route not changed. result: failed. errors: route.network: invalid network"
        );
    }

    #[test]
    fn partial_create_exposes_id() {
        let err = Error::PartialCreate {
            kind: "vlan",
            id: "abc".into(),
            source: Box::new(Error::Reconfigure {
                endpoint: "/interfaces/vlan_settings/reconfigure".into(),
                status: "failed".into(),
            }),
        };
        assert_eq!(err.created_id(), Some("abc"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(501));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(200));
    }

    #[test]
    fn only_retryable_statuses_are_transient() {
        let status = |status| Error::Status {
            status,
            body: String::new(),
        };
        assert!(status(503).is_transient());
        assert!(!status(501).is_transient());
        assert!(!Error::Authentication { status: 401 }.is_transient());
        assert!(
            !Error::NotFound {
                kind: "route",
                id: "x".into()
            }
            .is_transient()
        );
    }
}
