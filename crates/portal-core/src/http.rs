//! Authenticated HTTP client for the primary backend and client-site APIs.
//!
//! Every request carries the token of the scope the client resolves to. A
//! `401` answer tears the session down: the scoped and default tokens are
//! removed and the user is sent to the matching login page with a full page
//! load.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AuthScheme, PortalConfig};
use crate::error::Error;
use crate::navigation::{Navigation, Navigator};
use crate::sites::origin_of;
use crate::token::TokenStore;

/// Hosts that stand for "running locally".
const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "[::1]"];

/// Which token an [`ApiClient`] presents.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    /// Primary backend. The scope is derived from the page origin and falls
    /// back to the default token.
    Primary { current_domain: String },
    /// A single client site's own API.
    Tenant { domain: String },
}

/// JSON client with token injection and `401` teardown.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    binding: Binding,
    tokens: TokenStore,
    scheme: AuthScheme,
    navigator: Arc<dyn Navigator>,
    config: Arc<PortalConfig>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client for the primary backend at `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the underlying HTTP client cannot be
    /// built (e.g. TLS backend initialization fails).
    pub fn new(
        config: Arc<PortalConfig>,
        tokens: TokenStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, Error> {
        let http = build_http(&config)?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            binding: Binding::Primary {
                current_domain: current_domain(&config),
            },
            tokens,
            scheme: config.auth_scheme,
            navigator,
            config,
        })
    }

    /// A fresh client bound to a client site's own origin, presenting that
    /// site's token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty domain and [`Error::Network`]
    /// if the HTTP client cannot be built.
    pub fn for_tenant(&self, domain: &str) -> Result<Self, Error> {
        if domain.trim().is_empty() {
            return Err(Error::Config("client site domain is empty".to_owned()));
        }
        Ok(Self {
            http: build_http(&self.config)?,
            base_url: origin_of(domain),
            binding: Binding::Tenant {
                domain: domain.to_owned(),
            },
            tokens: self.tokens.clone(),
            scheme: self.scheme,
            navigator: Arc::clone(&self.navigator),
            config: Arc::clone(&self.config),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Domain whose token scope this client tries first.
    #[must_use]
    pub fn scope_domain(&self) -> &str {
        match &self.binding {
            Binding::Primary { current_domain } => current_domain,
            Binding::Tenant { domain } => domain,
        }
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.send(Method::GET, path, &[], None).await
    }

    /// `GET` with query parameters.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        self.send(Method::GET, path, query, None).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, &[], Some(body)).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let body = serde_json::to_value(body)?;
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    /// `DELETE` a resource, ignoring any response body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn delete(&self, path: &str) -> Result<(), Error> {
        self.send::<Value>(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    /// Send a request with the resolved token attached.
    ///
    /// An empty success body decodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] on `401`, after the session was torn down
    /// - [`Error::Rejected`] for any other non-2xx status
    /// - [`Error::Timeout`] / [`Error::SiteUnreachable`] / [`Error::Network`]
    ///   for transport failures
    /// - [`Error::Decode`] if the body does not match `T`
    /// - [`Error::Storage`] if the token store fails
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<T, Error> {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "api request");

        let mut req = self
            .http
            .request(method, &url)
            .header("Accept", "application/json");
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(token) = self.resolve_token().await? {
            req = req.header("Authorization", self.scheme.header_value(&token));
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::from_transport(e, &self.base_url))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::from_transport(e, &self.base_url))?;

        if status == StatusCode::UNAUTHORIZED {
            self.tear_down().await?;
            return Err(Error::Unauthorized);
        }
        if !status.is_success() {
            return Err(Error::rejected(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(serde_json::from_str("null")?);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Scoped token first, then the default one (primary binding only).
    async fn resolve_token(&self) -> Result<Option<String>, Error> {
        match &self.binding {
            Binding::Primary { current_domain } => {
                if let Some(token) = self.tokens.get_token(Some(current_domain)).await? {
                    return Ok(Some(token));
                }
                Ok(self.tokens.get_token(None).await?)
            }
            Binding::Tenant { domain } => Ok(self.tokens.get_token(Some(domain)).await?),
        }
    }

    async fn tear_down(&self) -> Result<(), Error> {
        let domain = self.scope_domain();
        // Must be read before the removal below clears it.
        let last_tenant = self.tokens.last_tenant().await?;

        self.tokens.remove_token(Some(domain)).await?;
        if matches!(self.binding, Binding::Primary { .. }) {
            self.tokens.remove_token(None).await?;
        }

        let target = if last_tenant.as_deref() == Some(domain) {
            &self.config.client_login_page
        } else {
            &self.config.login_page
        };
        warn!(%domain, %target, "session rejected with 401, signing out");
        self.navigator
            .navigate(&Navigation::FullPage(target.clone()));
        Ok(())
    }
}

fn build_http(config: &PortalConfig) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .timeout(config.api_timeout)
        .user_agent(concat!("portal/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(Error::Network)
}

/// The domain whose token the primary client tries first. Local development
/// hosts all map to the configured backend origin.
fn current_domain(config: &PortalConfig) -> String {
    let host = reqwest::Url::parse(&config.page_origin)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned));
    match host {
        Some(host) if LOCAL_HOSTS.contains(&host.as_str()) => config.dev_backend_origin.clone(),
        _ => config.page_origin.clone(),
    }
}
