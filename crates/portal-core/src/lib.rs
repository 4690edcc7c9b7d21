//! Core library for the agency portal.
//!
//! Keeps one bearer token per backend (the agency's own plus one per client
//! site) in a [`StorageBackend`](portal_storage::StorageBackend), signs users
//! into the primary backend and into client sites' admin panels, and provides
//! an [`ApiClient`] that attaches the right token to every request and signs
//! the user out when the backend stops accepting it.
//!
//! # Example
//!
//! ```rust,no_run
//! use portal_core::{ClientCredentials, Portal};
//!
//! # async fn example() -> Result<(), portal_core::Error> {
//! let portal = Portal::builder().build()?;
//! let session = portal
//!     .client_auth()
//!     .login_to_client_site(&ClientCredentials {
//!         username: "admin".into(),
//!         password: "secret".into(),
//!         domain: "artisancrafts.al".into(),
//!     })
//!     .await?;
//! tracing::info!(redirect = %session.redirect_url, "signed in");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client_auth;
pub mod config;
pub mod error;
pub mod http;
pub mod navigation;
mod portal;
pub mod services;
pub mod sites;
pub mod token;
pub mod types;

pub use auth::AuthGateway;
pub use client_auth::{ClientAuthGateway, ClientCredentials, ClientSession};
pub use config::{AuthScheme, PortalConfig};
pub use error::Error;
pub use http::ApiClient;
pub use navigation::{Navigation, Navigator, RecordingNavigator, TracingNavigator};
pub use portal::{Portal, PortalBuilder};
pub use sites::{ClientSite, SiteRegistry};
pub use token::TokenStore;
