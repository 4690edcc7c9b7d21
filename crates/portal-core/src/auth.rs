//! Agency-side session against the primary backend.
//!
//! These calls bypass [`ApiClient`](crate::http::ApiClient) on purpose: a
//! rejected login is an answer for the caller, not a reason to tear down the
//! session and navigate away.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::{AuthScheme, PortalConfig};
use crate::error::Error;
use crate::token::TokenStore;
use crate::types::{AuthResponse, SignupRequest, User, split_name};

pub const LOGIN_PATH: &str = "/auth/login/";
pub const SIGNUP_PATH: &str = "/auth/signup/";
pub const LOGOUT_PATH: &str = "/auth/logout/";
pub const CURRENT_USER_PATH: &str = "/auth/user/";

/// Login, signup, logout and session restore for the default token scope.
#[derive(Clone)]
pub struct AuthGateway {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
    scheme: AuthScheme,
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AuthGateway {
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(config: &Arc<PortalConfig>, tokens: TokenStore) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .user_agent(concat!("portal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            tokens,
            scheme: config.auth_scheme,
        })
    }

    /// Log in with email and password and keep the returned token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] with the backend's message on a non-2xx
    /// answer (nothing is stored), a transport error, or [`Error::Storage`]
    /// if the token cannot be saved.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, Error> {
        let auth: AuthResponse = self
            .post(LOGIN_PATH, &json!({ "email": email, "password": password }), None)
            .await?;
        self.tokens.set_token(&auth.token, None).await?;
        info!(user_id = auth.user.id, "logged in");
        Ok(auth.user)
    }

    /// Register a new account and keep the returned token.
    ///
    /// `name` is split on its first space into first and last name; the
    /// email doubles as the username.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login).
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User, Error> {
        let (first_name, last_name) = split_name(name);
        let payload = SignupRequest {
            username: email,
            email,
            password,
            password2: password,
            first_name,
            last_name,
        };
        let auth: AuthResponse = self
            .post(SIGNUP_PATH, &serde_json::to_value(&payload)?, None)
            .await?;
        self.tokens.set_token(&auth.token, None).await?;
        info!(user_id = auth.user.id, "signed up");
        Ok(auth.user)
    }

    /// Tell the backend the session is over, then drop the local token.
    ///
    /// The backend call is best effort; its failure is logged and ignored.
    ///
    /// # Errors
    ///
    /// Only [`Error::Storage`], if the token cannot be read or removed.
    pub async fn logout(&self) -> Result<(), Error> {
        let token = self.tokens.get_token(None).await?;
        if let Err(e) = self
            .post::<Value>(LOGOUT_PATH, &json!({}), token.as_deref())
            .await
        {
            warn!(error = %e, "logout request failed, removing local session anyway");
        }
        self.tokens.remove_token(None).await?;
        info!("logged out");
        Ok(())
    }

    /// Restore the signed-in user, if any.
    ///
    /// Without a stored token this returns `None` without touching the
    /// network. Any failure of the profile request (expired token, backend
    /// down) drops the token and also yields `None`, so this is safe to call
    /// unconditionally at startup.
    ///
    /// # Errors
    ///
    /// Only [`Error::Storage`].
    pub async fn current_user(&self) -> Result<Option<User>, Error> {
        let Some(token) = self.tokens.get_token(None).await? else {
            return Ok(None);
        };
        match self.get::<User>(CURRENT_USER_PATH, &token).await {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "could not restore session, discarding token");
                self.tokens.remove_token(None).await?;
                Ok(None)
            }
        }
    }

    /// Whether a default-scope token is stored. No network call.
    ///
    /// # Errors
    ///
    /// Only [`Error::Storage`].
    pub async fn is_authenticated(&self) -> Result<bool, Error> {
        Ok(self.tokens.get_token(None).await?.is_some())
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> Result<T, Error> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "auth request");
        let mut req = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .json(body);
        if let Some(token) = token {
            req = req.header("Authorization", self.scheme.header_value(token));
        }
        self.finish(req).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, Error> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "auth request");
        let req = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("Authorization", self.scheme.header_value(token));
        self.finish(req).await
    }

    async fn finish<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, Error> {
        let resp = req
            .send()
            .await
            .map_err(|e| Error::from_transport(e, &self.base_url))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::from_transport(e, &self.base_url))?;
        if !status.is_success() {
            return Err(Error::rejected(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(serde_json::from_str("null")?);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use portal_storage::MemoryBackend;

    use super::*;

    fn gateway(server: &MockServer) -> (AuthGateway, TokenStore, MemoryBackend) {
        let config = Arc::new(PortalConfig {
            api_url: server.url("/api"),
            ..PortalConfig::default()
        });
        let backend = MemoryBackend::new();
        let tokens = TokenStore::new(Arc::new(backend.clone()));
        (AuthGateway::new(&config, tokens.clone()).unwrap(), tokens, backend)
    }

    fn user_json() -> Value {
        json!({
            "id": 42,
            "username": "ana@example.com",
            "email": "ana@example.com",
            "first_name": "Ana",
            "last_name": "Hoxha",
            "role": "client"
        })
    }

    #[tokio::test]
    async fn login_stores_default_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/auth/login/")
                .json_body(json!({"email": "ana@example.com", "password": "s3cret"}));
            then.status(200)
                .json_body(json!({"token": "tok-1", "user": user_json()}));
        });

        let (auth, tokens, _) = gateway(&server);
        let user = auth.login("ana@example.com", "s3cret").await.unwrap();

        assert_eq!(user.id, 42);
        assert_eq!(user.display_name(), "Ana Hoxha");
        assert_eq!(tokens.get_token(None).await.unwrap().as_deref(), Some("tok-1"));
        assert!(auth.is_authenticated().await.unwrap());
        mock.assert();
    }

    #[tokio::test]
    async fn failed_login_stores_nothing() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login/");
            then.status(400).json_body(
                json!({"non_field_errors": ["Unable to log in with provided credentials."]}),
            );
        });

        let (auth, tokens, _) = gateway(&server);
        let err = auth.login("ana@example.com", "wrong").await.unwrap_err();

        assert_eq!(err.to_string(), "Unable to log in with provided credentials.");
        assert_eq!(err.status(), Some(400));
        assert_eq!(tokens.get_token(None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn signup_splits_name_on_first_space() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/auth/signup/").json_body(json!({
                "username": "ana@example.com",
                "email": "ana@example.com",
                "password": "s3cret",
                "password2": "s3cret",
                "first_name": "Ana",
                "last_name": "Maria Hoxha"
            }));
            then.status(201)
                .json_body(json!({"token": "tok-new", "user": user_json()}));
        });

        let (auth, tokens, _) = gateway(&server);
        auth.signup("Ana Maria Hoxha", "ana@example.com", "s3cret")
            .await
            .unwrap();
        assert_eq!(tokens.get_token(None).await.unwrap().as_deref(), Some("tok-new"));
        mock.assert();
    }

    #[tokio::test]
    async fn signup_single_word_name_has_empty_last_name() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/auth/signup/")
                .body_includes(r#""first_name":"Ana""#)
                .body_includes(r#""last_name":"""#);
            then.status(201)
                .json_body(json!({"token": "tok", "user": user_json()}));
        });

        let (auth, _, _) = gateway(&server);
        auth.signup("Ana", "ana@example.com", "pw").await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn logout_sends_token_then_clears_it() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/auth/logout/")
                .header("authorization", "Token tok-1");
            then.status(200).json_body(json!({"success": "Logged out"}));
        });

        let (auth, tokens, _) = gateway(&server);
        tokens.set_token("tok-1", None).await.unwrap();
        auth.logout().await.unwrap();

        assert_eq!(tokens.get_token(None).await.unwrap(), None);
        mock.assert();
    }

    #[tokio::test]
    async fn logout_clears_token_even_if_backend_fails() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/logout/");
            then.status(500);
        });

        let (auth, tokens, _) = gateway(&server);
        tokens.set_token("tok-1", None).await.unwrap();
        auth.logout().await.unwrap();
        assert!(!auth.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn current_user_without_token_makes_no_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/auth/user/");
            then.status(200).json_body(user_json());
        });

        let (auth, _, _) = gateway(&server);
        assert_eq!(auth.current_user().await.unwrap(), None);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn current_user_returns_profile() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/auth/user/")
                .header("authorization", "Token tok-1");
            then.status(200).json_body(user_json());
        });

        let (auth, tokens, _) = gateway(&server);
        tokens.set_token("tok-1", None).await.unwrap();
        let user = auth.current_user().await.unwrap().unwrap();
        assert_eq!(user.email, "ana@example.com");
        mock.assert();
    }

    #[tokio::test]
    async fn current_user_discards_rejected_token() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/auth/user/");
            then.status(401).json_body(json!({"detail": "Invalid token."}));
        });

        let (auth, tokens, _) = gateway(&server);
        tokens.set_token("expired", None).await.unwrap();
        assert_eq!(auth.current_user().await.unwrap(), None);
        assert_eq!(tokens.get_token(None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn storage_failure_during_login_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login/");
            then.status(200)
                .json_body(json!({"token": "tok-1", "user": user_json()}));
        });

        let (auth, _, backend) = gateway(&server);
        backend.reject_writes(true);
        let err = auth.login("ana@example.com", "s3cret").await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
