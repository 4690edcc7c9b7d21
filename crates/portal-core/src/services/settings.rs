use crate::error::Error;
use crate::http::ApiClient;
use crate::types::UserSettings;

const SETTINGS_PATH: &str = "/auth/user/settings/";

/// Account settings of the signed-in agency user.
#[derive(Debug, Clone)]
pub struct UserService {
    api: ApiClient,
}

impl UserService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Anything [`ApiClient::send`] returns.
    pub async fn get_settings(&self) -> Result<UserSettings, Error> {
        self.api.get(SETTINGS_PATH).await
    }

    /// Replace the settings and return what the backend stored.
    ///
    /// # Errors
    ///
    /// Anything [`ApiClient::send`] returns.
    pub async fn update_settings(&self, settings: &UserSettings) -> Result<UserSettings, Error> {
        self.api.put(SETTINGS_PATH, settings).await
    }
}
