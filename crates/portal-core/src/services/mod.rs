//! Typed wrappers over the primary backend's resource endpoints.
//!
//! Every service goes through [`ApiClient`](crate::http::ApiClient), so the
//! agency token is attached and a `401` signs the user out.

mod analytics;
mod dashboard;
mod settings;
mod websites;

pub use analytics::AnalyticsService;
pub use dashboard::DashboardService;
pub use settings::UserService;
pub use websites::WebsiteService;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    use std::sync::Arc;

    use httpmock::MockServer;
    use portal_storage::MemoryBackend;

    use crate::config::PortalConfig;
    use crate::http::ApiClient;
    use crate::navigation::RecordingNavigator;
    use crate::token::TokenStore;

    /// An [`ApiClient`] against `server`, signed in with `Token main`.
    pub async fn signed_in(server: &MockServer) -> (ApiClient, RecordingNavigator) {
        let config = PortalConfig {
            api_url: server.url("/api"),
            page_origin: "https://portal.webcraft.al".to_owned(),
            ..PortalConfig::default()
        };
        let tokens = TokenStore::new(Arc::new(MemoryBackend::new()));
        tokens.set_token("main", None).await.unwrap();
        let navigator = RecordingNavigator::new();
        let api = ApiClient::new(Arc::new(config), tokens, Arc::new(navigator.clone())).unwrap();
        (api, navigator)
    }
}
