//! Login into a client site's own admin panel.
//!
//! The portal posts the user's credentials straight to the client site's
//! login endpoint, keeps the returned token under that site's scope and
//! works out where the user should land next. No cookies are kept or sent:
//! the client site's cookie jar is not ours to share.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::PortalConfig;
use crate::error::{Error, GENERIC_LOGIN_FAILURE, backend_message};
use crate::navigation::Navigation;
use crate::sites::{ClientSite, SiteRegistry};
use crate::token::TokenStore;

/// Credentials for one client site.
#[derive(Debug, Clone, Serialize)]
pub struct ClientCredentials {
    pub username: String,
    pub password: String,
    /// Catalog domain of the target site, exactly as listed.
    #[serde(skip)]
    pub domain: String,
}

/// Outcome of a successful client-site login.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSession {
    pub token: String,
    /// Relative admin path when the site shares the portal's origin,
    /// otherwise an absolute URL.
    pub redirect_url: String,
    /// Profile as returned by the client site, if it sent one.
    pub user: Option<Value>,
}

impl ClientSession {
    /// How to follow [`redirect_url`](Self::redirect_url).
    #[must_use]
    pub fn navigation(&self) -> Navigation {
        Navigation::classify(&self.redirect_url)
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    user: Option<Value>,
}

/// Authenticates against client sites listed in a [`SiteRegistry`].
#[derive(Clone)]
pub struct ClientAuthGateway {
    http: reqwest::Client,
    registry: Arc<SiteRegistry>,
    tokens: TokenStore,
    page_origin: String,
}

impl std::fmt::Debug for ClientAuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientAuthGateway")
            .field("page_origin", &self.page_origin)
            .field("sites", &self.registry.list_sites().len())
            .finish_non_exhaustive()
    }
}

impl ClientAuthGateway {
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(
        config: &PortalConfig,
        registry: Arc<SiteRegistry>,
        tokens: TokenStore,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.client_login_timeout)
            .user_agent(concat!("portal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            http,
            registry,
            tokens,
            page_origin: config.page_origin.clone(),
        })
    }

    /// Log into the client site named by `creds.domain`.
    ///
    /// # Errors
    ///
    /// In order of precedence:
    /// - [`Error::TenantNotConfigured`] if the domain is not catalogued (no
    ///   request is sent)
    /// - [`Error::Timeout`] if the site does not answer within the time
    ///   limit, [`Error::SiteUnreachable`] for any other transport failure
    /// - [`Error::LoginNotSupported`] on `404`
    /// - [`Error::InvalidCredentials`] on `401`
    /// - [`Error::InsufficientPrivileges`] on `403`
    /// - [`Error::Rejected`] with the site's message, or a generic one, for
    ///   any other failure status
    /// - [`Error::Decode`] if a success body has no token
    /// - [`Error::Storage`] if the token cannot be saved
    pub async fn login_to_client_site(
        &self,
        creds: &ClientCredentials,
    ) -> Result<ClientSession, Error> {
        let site = self
            .registry
            .find_site(&creds.domain)
            .ok_or_else(|| Error::TenantNotConfigured {
                domain: creds.domain.clone(),
            })?;
        let origin = site.origin();
        let endpoint = site.login_endpoint();
        debug!(%endpoint, "client-site login");

        let resp = self
            .http
            .post(&endpoint)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .json(creds)
            .send()
            .await
            .map_err(|e| Error::from_site_transport(&e, &origin))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::from_site_transport(&e, &origin))?;

        match status.as_u16() {
            404 => return Err(Error::LoginNotSupported { origin }),
            401 => return Err(Error::InvalidCredentials),
            403 => return Err(Error::InsufficientPrivileges),
            _ if !status.is_success() => {
                return Err(Error::Rejected {
                    status: status.as_u16(),
                    message: backend_message(&text)
                        .unwrap_or_else(|| GENERIC_LOGIN_FAILURE.to_owned()),
                });
            }
            _ => {}
        }

        let login: LoginResponse = serde_json::from_str(&text)?;
        self.tokens.set_token(&login.token, Some(&site.domain)).await?;
        info!(domain = %site.domain, "logged into client site");

        Ok(ClientSession {
            redirect_url: redirect_url(site, &self.page_origin),
            token: login.token,
            user: login.user,
        })
    }

    /// Domain of the most recently logged-into client site.
    ///
    /// # Errors
    ///
    /// Only [`Error::Storage`].
    pub async fn last_client_domain(&self) -> Result<Option<String>, Error> {
        Ok(self.tokens.last_tenant().await?)
    }

    /// Stored token for a client site.
    ///
    /// # Errors
    ///
    /// Only [`Error::Storage`].
    pub async fn client_token(&self, domain: &str) -> Result<Option<String>, Error> {
        Ok(self.tokens.get_token(Some(domain)).await?)
    }

    /// Forget the token for a client site.
    ///
    /// # Errors
    ///
    /// Only [`Error::Storage`].
    pub async fn logout_from_client_site(&self, domain: &str) -> Result<(), Error> {
        self.tokens.remove_token(Some(domain)).await?;
        info!(%domain, "logged out of client site");
        Ok(())
    }

    /// The catalog this gateway resolves domains against.
    #[must_use]
    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }
}

/// Where to send the user after logging into `site` from `page_origin`.
///
/// A custom redirect wins outright. Otherwise the admin path stays relative
/// when the portal and the site share an origin, and is made absolute when
/// they don't.
#[must_use]
pub fn redirect_url(site: &ClientSite, page_origin: &str) -> String {
    if let Some(url) = site.custom_redirect_url.as_deref().filter(|u| !u.is_empty()) {
        return url.to_owned();
    }
    let origin = site.origin();
    let admin_path = site.admin_path();
    if same_origin(page_origin, &origin) {
        admin_path
    } else {
        format!("{origin}{admin_path}")
    }
}

fn same_origin(a: &str, b: &str) -> bool {
    match (reqwest::Url::parse(a), reqwest::Url::parse(b)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin(),
        _ => a.trim_end_matches('/') == b.trim_end_matches('/'),
    }
}
