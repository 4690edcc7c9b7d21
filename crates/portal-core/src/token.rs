//! Scope-partitioned token storage.
//!
//! Each scope holds at most one token. The default scope belongs to the
//! agency-side session; every client site gets its own scope derived from its
//! domain. A separate pointer remembers which client site was logged into
//! most recently.
//!
//! Storage layout:
//!
//! | key                              | value                    |
//! |----------------------------------|--------------------------|
//! | `token`                          | default-scope token      |
//! | `client_token_<normalized>`      | client-site token        |
//! | `last_client_domain`             | raw domain of last login |

use std::sync::Arc;

use portal_storage::{StorageBackend, StorageError};
use tracing::{debug, warn};

pub const DEFAULT_TOKEN_KEY: &str = "token";
pub const CLIENT_TOKEN_PREFIX: &str = "client_token_";
pub const LAST_CLIENT_DOMAIN_KEY: &str = "last_client_domain";

/// Storage key for a client-site domain.
///
/// Every character outside `[A-Za-z0-9]` becomes `_`, so the mapping is
/// deterministic but not injective: `a.b` and `a-b` share a key.
#[must_use]
pub fn scope_key(domain: &str) -> String {
    let normalized: String = domain
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{CLIENT_TOKEN_PREFIX}{normalized}")
}

/// Token persistence over any [`StorageBackend`].
///
/// `scope == None` (or an empty domain) addresses the default scope.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Store `value` under `scope`, replacing any previous token.
    ///
    /// A client-site scope also becomes the last-used tenant. If that pointer
    /// cannot be written, the token write is undone and nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StorageError`] if either write fails.
    pub async fn set_token(&self, value: &str, scope: Option<&str>) -> Result<(), StorageError> {
        match tenant(scope) {
            Some(domain) => {
                let key = scope_key(domain);
                self.backend.put(&key, value.as_bytes()).await?;
                if let Err(e) = self
                    .backend
                    .put(LAST_CLIENT_DOMAIN_KEY, domain.as_bytes())
                    .await
                {
                    // A token without its pointer would escape the 401 teardown routing.
                    if let Err(undo) = self.backend.delete(&key).await {
                        warn!(%key, error = %undo, "failed to roll back client-site token");
                    }
                    return Err(e);
                }
                debug!(%key, "stored client-site token");
            }
            None => {
                self.backend.put(DEFAULT_TOKEN_KEY, value.as_bytes()).await?;
                debug!("stored default token");
            }
        }
        Ok(())
    }

    /// Token stored under `scope`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the backend fails or the stored
    /// value is not UTF-8.
    pub async fn get_token(&self, scope: Option<&str>) -> Result<Option<String>, StorageError> {
        self.read_string(&key_for(scope)).await
    }

    /// Whether a token is stored under `scope`, without reading it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the backend fails.
    pub async fn has_token(&self, scope: Option<&str>) -> Result<bool, StorageError> {
        self.backend.exists(&key_for(scope)).await
    }

    /// Number of client-site scopes currently holding a token, including
    /// sites no longer in the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::List`] if the backend fails.
    pub async fn client_token_count(&self) -> Result<usize, StorageError> {
        Ok(self.backend.list(CLIENT_TOKEN_PREFIX).await?.len())
    }

    /// Remove the token under `scope`. Removing an absent token is a no-op.
    ///
    /// If `scope` is the last-used tenant, that pointer is cleared too.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StorageError`] if a delete fails.
    pub async fn remove_token(&self, scope: Option<&str>) -> Result<(), StorageError> {
        let Some(domain) = tenant(scope) else {
            self.backend.delete(DEFAULT_TOKEN_KEY).await?;
            debug!("removed default token");
            return Ok(());
        };

        let key = scope_key(domain);
        self.backend.delete(&key).await?;
        if self.last_tenant().await?.as_deref() == Some(domain) {
            self.backend.delete(LAST_CLIENT_DOMAIN_KEY).await?;
        }
        debug!(%key, "removed client-site token");
        Ok(())
    }

    /// Domain of the most recently authenticated client site.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the backend fails.
    pub async fn last_tenant(&self) -> Result<Option<String>, StorageError> {
        self.read_string(LAST_CLIENT_DOMAIN_KEY).await
    }

    async fn read_string(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(bytes) = self.backend.get(key).await? else {
            return Ok(None);
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| StorageError::Read {
                key: key.to_owned(),
                reason: "stored value is not valid UTF-8".to_owned(),
            })
    }
}

fn tenant(scope: Option<&str>) -> Option<&str> {
    scope.filter(|s| !s.is_empty())
}

fn key_for(scope: Option<&str>) -> String {
    tenant(scope).map_or_else(|| DEFAULT_TOKEN_KEY.to_owned(), scope_key)
}
