// Async HTTP client for the OPNsense REST API.
//
// Base path: {uri}/api/
// Auth: HTTP basic with the API key as user and the API secret as password.
//
// Every model-backed endpoint follows the same envelope: the item sits
// under a wrapper key (`{"route": {...}}`), mutations answer with
// `{"result": "saved", "uuid": ...}` or `{"result": "deleted"}`, and a
// service reconfigure/apply call makes the change live.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::transport::{TlsMode, TransportConfig};

// ── Options ──────────────────────────────────────────────────────────

/// Connection settings for [`Client::new`].
///
/// Zero for any of the backoff/retry knobs keeps the client default
/// (30s max backoff, 1s min backoff, 4 retries).
#[derive(Debug, Clone)]
pub struct Options {
    pub uri: String,
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub allow_insecure: bool,
    /// Seconds.
    pub max_backoff: i64,
    /// Seconds.
    pub min_backoff: i64,
    pub max_retries: i64,
}

// ── Item descriptors ─────────────────────────────────────────────────

/// Service controller an item belongs to. Writes are serialized per
/// controller because the appliance drops changes made while the
/// service is reconfiguring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    Firewall,
    Interfaces,
    Ipsec,
    Routes,
    Unbound,
    Wireguard,
}

/// Endpoint set for one model-backed item type.
#[derive(Debug, Clone, Copy)]
pub struct Endpoints {
    pub controller: Controller,
    pub add: &'static str,
    pub get: &'static str,
    pub set: &'static str,
    pub delete: &'static str,
    /// `None` for items whose changes are live without a service reload.
    pub reconfigure: Option<&'static str>,
}

/// A wire struct that can be created, read, updated and deleted.
pub trait Item: Serialize + DeserializeOwned + Send + Sync {
    /// Human readable kind, used in error messages.
    const KIND: &'static str;
    /// Wrapper key of the request/response body.
    const KEY: &'static str;
    const ENDPOINTS: Endpoints;
}

// ── Response envelopes ───────────────────────────────────────────────

#[derive(Deserialize)]
struct SaveResponse {
    #[serde(default)]
    result: String,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    validations: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    result: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: String,
}

/// First 200 bytes of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body.get(..end).unwrap_or_default()
}

// ── Client ───────────────────────────────────────────────────────────

struct Locks {
    firewall: Mutex<()>,
    interfaces: Mutex<()>,
    ipsec: Mutex<()>,
    routes: Mutex<()>,
    unbound: Mutex<()>,
    wireguard: Mutex<()>,
}

struct Inner {
    http: reqwest::Client,
    base: String,
    api_key: SecretString,
    api_secret: SecretString,
    retry: RetryPolicy,
    locks: Locks,
}

/// Async client for the OPNsense API.
///
/// Cheap to clone; clones share the HTTP pool and the per-controller
/// write locks.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base", &self.inner.base)
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

impl Client {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from provider options.
    pub fn new(options: Options) -> Result<Self, Error> {
        let transport = TransportConfig {
            tls: TlsMode::from_allow_insecure(options.allow_insecure),
            ..TransportConfig::default()
        };
        let retry = RetryPolicy::from_settings(
            options.max_backoff,
            options.min_backoff,
            options.max_retries,
        );
        Self::with_client(
            transport.build_client()?,
            &options.uri,
            options.api_key,
            options.api_secret,
            retry,
        )
    }

    /// Wrap an existing `reqwest::Client` with an explicit retry policy.
    pub fn with_client(
        http: reqwest::Client,
        uri: &str,
        api_key: SecretString,
        api_secret: SecretString,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        // Validate once so request URLs can be built infallibly later.
        let parsed = Url::parse(uri)?;
        let base = parsed.as_str().trim_end_matches('/').to_owned();

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base,
                api_key,
                api_secret,
                retry,
                locks: Locks {
                    firewall: Mutex::new(()),
                    interfaces: Mutex::new(()),
                    ipsec: Mutex::new(()),
                    routes: Mutex::new(()),
                    unbound: Mutex::new(()),
                    wireguard: Mutex::new(()),
                },
            }),
        })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, endpoint: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}/api{endpoint}", self.inner.base))?)
    }

    // ── Request pipeline ─────────────────────────────────────────────

    /// Send a request, retrying transient failures, and return the body
    /// of a 200 response.
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String, Error> {
        let url = self.url(endpoint)?;
        let policy = &self.inner.retry;
        let mut attempt: u32 = 0;

        loop {
            debug!(%method, %url, attempt, "sending request");
            if let Some(body) = body {
                trace!(%url, %body, "request body");
            }

            let mut request = self
                .inner
                .http
                .request(method.clone(), url.clone())
                .basic_auth(
                    self.inner.api_key.expose_secret(),
                    Some(self.inner.api_secret.expose_secret()),
                );
            if let Some(body) = body {
                request = request.json(body);
            }

            let result = match request.send().await {
                Ok(resp) => Self::read_body(resp).await,
                Err(e) => Err(Error::from(e)),
            };

            match result {
                Err(err) if err.is_transient() && attempt < policy.max_retries => {
                    let delay = policy.backoff(attempt);
                    warn!(%url, attempt, ?delay, error = %err, "request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn read_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let body = resp.text().await?;
        trace!(status = status.as_u16(), %body, "response body");

        match status.as_u16() {
            200 => Ok(body),
            code @ (401 | 403) => Err(Error::Authentication { status: code }),
            code => Err(Error::Status {
                status: code,
                body: preview(&body).to_owned(),
            }),
        }
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
        serde_json::from_str(body).map_err(|e| {
            Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(body)),
                body: body.to_owned(),
            }
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, Error> {
        let body = self.send(Method::GET, endpoint, None).await?;
        Self::decode(&body)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, Error> {
        let text = self.send(Method::POST, endpoint, body).await?;
        Self::decode(&text)
    }

    async fn lock(&self, controller: Controller) -> MutexGuard<'_, ()> {
        let locks = &self.inner.locks;
        match controller {
            Controller::Firewall => locks.firewall.lock().await,
            Controller::Interfaces => locks.interfaces.lock().await,
            Controller::Ipsec => locks.ipsec.lock().await,
            Controller::Routes => locks.routes.lock().await,
            Controller::Unbound => locks.unbound.lock().await,
            Controller::Wireguard => locks.wireguard.lock().await,
        }
    }

    // ── Service reconfigure ──────────────────────────────────────────

    /// Apply pending changes for the service behind `endpoint`.
    pub async fn reconfigure(&self, endpoint: &str) -> Result<(), Error> {
        let resp: StatusResponse = self.post_json(endpoint, None).await?;
        if resp.status.trim().eq_ignore_ascii_case("ok") {
            Ok(())
        } else {
            Err(Error::Reconfigure {
                endpoint: endpoint.to_owned(),
                status: resp.status,
            })
        }
    }

    // ── Generic item CRUD ────────────────────────────────────────────

    fn wrap<T: Item>(item: &T) -> Result<serde_json::Value, Error> {
        let mut map = serde_json::Map::new();
        map.insert(T::KEY.to_owned(), serde_json::to_value(item)?);
        Ok(serde_json::Value::Object(map))
    }

    /// Save an item. Returns the UUID from the save response, which only
    /// add endpoints carry.
    async fn save<T: Item>(&self, endpoint: &str, item: &T) -> Result<Option<String>, Error> {
        let body = Self::wrap(item)?;
        let resp: SaveResponse = self.post_json(endpoint, Some(&body)).await?;

        if resp.result != "saved" {
            return Err(Error::NotSaved {
                kind: T::KIND,
                result: resp.result,
                validations: resp.validations,
            });
        }

        Ok(resp.uuid.filter(|id| !id.is_empty()))
    }

    /// Create an item. Returns the UUID assigned by the appliance.
    ///
    /// If the item was saved but the reconfigure failed, the error is
    /// [`Error::PartialCreate`] carrying the new UUID.
    pub async fn add_item<T: Item>(&self, item: &T) -> Result<String, Error> {
        let endpoints = T::ENDPOINTS;
        let _guard = self.lock(endpoints.controller).await;

        let id = self
            .save(endpoints.add, item)
            .await?
            .ok_or_else(|| Error::Deserialization {
                message: format!("{} saved without a uuid", T::KIND),
                body: String::new(),
            })?;
        debug!(kind = T::KIND, %id, "item created");

        if let Some(reconfigure) = endpoints.reconfigure {
            if let Err(source) = self.reconfigure(reconfigure).await {
                return Err(Error::PartialCreate {
                    kind: T::KIND,
                    id,
                    source: Box::new(source),
                });
            }
        }

        Ok(id)
    }

    /// Read an item by UUID.
    pub async fn get_item<T: Item>(&self, id: &str) -> Result<T, Error> {
        let endpoint = format!("{}/{id}", T::ENDPOINTS.get);
        let body = self.send(Method::GET, &endpoint, None).await?;
        let value: serde_json::Value = Self::decode(&body)?;

        // A missing UUID answers with an empty array instead of an object.
        let serde_json::Value::Object(mut envelope) = value else {
            return Err(Error::NotFound {
                kind: T::KIND,
                id: id.to_owned(),
            });
        };

        let inner = envelope.remove(T::KEY).ok_or_else(|| Error::Deserialization {
            message: format!("missing '{}' key in {} response", T::KEY, T::KIND),
            body: body.clone(),
        })?;

        serde_json::from_value(inner).map_err(|e| Error::Deserialization {
            message: format!("{e}"),
            body,
        })
    }

    /// Replace an item in place.
    pub async fn update_item<T: Item>(&self, id: &str, item: &T) -> Result<(), Error> {
        let endpoints = T::ENDPOINTS;
        let _guard = self.lock(endpoints.controller).await;

        self.save(&format!("{}/{id}", endpoints.set), item).await?;
        debug!(kind = T::KIND, %id, "item updated");

        if let Some(reconfigure) = endpoints.reconfigure {
            self.reconfigure(reconfigure).await?;
        }
        Ok(())
    }

    /// Delete an item by UUID.
    pub async fn delete_item<T: Item>(&self, id: &str) -> Result<(), Error> {
        let endpoints = T::ENDPOINTS;
        let _guard = self.lock(endpoints.controller).await;

        let resp: DeleteResponse = self
            .post_json(&format!("{}/{id}", endpoints.delete), None)
            .await?;
        if resp.result != "deleted" {
            return Err(Error::NotDeleted {
                kind: T::KIND,
                result: resp.result,
            });
        }
        debug!(kind = T::KIND, %id, "item deleted");

        if let Some(reconfigure) = endpoints.reconfigure {
            self.reconfigure(reconfigure).await?;
        }
        Ok(())
    }

    // ── Domain accessors ─────────────────────────────────────────────

    pub fn firewall(&self) -> crate::firewall::Firewall<'_> {
        crate::firewall::Firewall::new(self)
    }

    pub fn interfaces(&self) -> crate::interfaces::Interfaces<'_> {
        crate::interfaces::Interfaces::new(self)
    }

    pub fn ipsec(&self) -> crate::ipsec::Ipsec<'_> {
        crate::ipsec::Ipsec::new(self)
    }

    pub fn routes(&self) -> crate::routes::Routes<'_> {
        crate::routes::Routes::new(self)
    }

    pub fn unbound(&self) -> crate::unbound::Unbound<'_> {
        crate::unbound::Unbound::new(self)
    }

    pub fn wireguard(&self) -> crate::wireguard::Wireguard<'_> {
        crate::wireguard::Wireguard::new(self)
    }

    pub fn diagnostics(&self) -> crate::diagnostics::Diagnostics<'_> {
        crate::diagnostics::Diagnostics::new(self)
    }
}
