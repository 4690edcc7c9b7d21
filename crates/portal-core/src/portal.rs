//! One place that wires storage, configuration, the site catalog and the
//! navigator into the portal's gateways and services.

use std::sync::Arc;

use portal_storage::{MemoryBackend, StorageBackend};
use tracing::debug;

use crate::auth::AuthGateway;
use crate::client_auth::ClientAuthGateway;
use crate::config::PortalConfig;
use crate::error::Error;
use crate::http::ApiClient;
use crate::navigation::{Navigator, TracingNavigator};
use crate::services::{AnalyticsService, DashboardService, UserService, WebsiteService};
use crate::sites::SiteRegistry;
use crate::token::TokenStore;

/// Builder for [`Portal`].
///
/// Anything left unset gets a default: an in-memory store, configuration
/// from [`PortalConfig::default`], the catalog from `config.sites_file` or
/// the built-in one, and a [`TracingNavigator`].
#[derive(Default)]
pub struct PortalBuilder {
    storage: Option<Arc<dyn StorageBackend>>,
    config: Option<PortalConfig>,
    sites: Option<SiteRegistry>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl PortalBuilder {
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn config(mut self, config: PortalConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn sites(mut self, sites: SiteRegistry) -> Self {
        self.sites = Some(sites);
        self
    }

    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] or [`Error::Decode`] if `config.sites_file`
    /// is set but cannot be loaded, and [`Error::Network`] if an HTTP client
    /// cannot be built.
    pub fn build(self) -> Result<Portal, Error> {
        let config = Arc::new(self.config.unwrap_or_default());
        let sites = match (self.sites, &config.sites_file) {
            (Some(sites), _) => sites,
            (None, Some(path)) => SiteRegistry::load(path)?,
            (None, None) => SiteRegistry::builtin(),
        };
        let sites = Arc::new(sites);
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryBackend::new()));
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(TracingNavigator));

        let tokens = TokenStore::new(storage);
        let api = ApiClient::new(Arc::clone(&config), tokens.clone(), navigator)?;
        let auth = AuthGateway::new(&config, tokens.clone())?;
        let client_auth = ClientAuthGateway::new(&config, Arc::clone(&sites), tokens.clone())?;
        debug!(api_url = %config.api_url, sites = sites.list_sites().len(), "portal ready");

        Ok(Portal {
            config,
            sites,
            tokens,
            api,
            auth,
            client_auth,
        })
    }
}

/// Entry point to the portal core.
#[derive(Debug, Clone)]
pub struct Portal {
    config: Arc<PortalConfig>,
    sites: Arc<SiteRegistry>,
    tokens: TokenStore,
    api: ApiClient,
    auth: AuthGateway,
    client_auth: ClientAuthGateway,
}

impl Portal {
    #[must_use]
    pub fn builder() -> PortalBuilder {
        PortalBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Agency login, signup, logout and session restore.
    #[must_use]
    pub fn auth(&self) -> &AuthGateway {
        &self.auth
    }

    /// Login into client sites' admin panels.
    #[must_use]
    pub fn client_auth(&self) -> &ClientAuthGateway {
        &self.client_auth
    }

    /// Authenticated client for the primary backend.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Authenticated client for a client site's own API, using that site's
    /// token.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::for_tenant`].
    pub fn api_for_tenant(&self, domain: &str) -> Result<ApiClient, Error> {
        self.api.for_tenant(domain)
    }

    #[must_use]
    pub fn users(&self) -> UserService {
        UserService::new(self.api.clone())
    }

    #[must_use]
    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(self.api.clone())
    }

    #[must_use]
    pub fn websites(&self) -> WebsiteService {
        WebsiteService::new(self.api.clone())
    }

    #[must_use]
    pub fn analytics(&self) -> AnalyticsService {
        AnalyticsService::new(self.api.clone())
    }

    #[must_use]
    pub fn sites(&self) -> &SiteRegistry {
        &self.sites
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }
}
