// Transport configuration for building the reqwest::Client.
//
// TLS verification and timeouts live here so the request pipeline in
// `client` never has to touch builder details.

use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("terraform-provider-opnsense/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the bundled webpki roots.
    Verify,
    /// Accept any certificate (appliances commonly ship self-signed).
    DangerAcceptInvalid,
}

impl TlsMode {
    pub fn from_allow_insecure(allow_insecure: bool) -> Self {
        if allow_insecure {
            Self::DangerAcceptInvalid
        } else {
            Self::Verify
        }
    }
}

/// Transport configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::Verify,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        if self.tls == TlsMode::DangerAcceptInvalid {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
