//! Catalog of client sites the portal can log into.
//!
//! The catalog is fixed for the lifetime of the process: either the
//! built-in list or one loaded from a JSON file at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Path of the login endpoint every client site exposes.
pub const CLIENT_LOGIN_PATH: &str = "/api/auth/login/";
/// Admin panel path used when a site does not configure its own.
pub const DEFAULT_ADMIN_PATH: &str = "/admin/";

/// Origin for a catalogued domain: an explicit `http://` or `https://` is
/// kept, a bare host gets `https://`. Trailing slashes are dropped.
#[must_use]
pub fn origin_of(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('/');
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_owned()
    } else {
        format!("https://{domain}")
    }
}

/// A client site (tenant) with its own admin panel and login API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSite {
    /// Display name.
    pub name: String,
    /// Unique key. Either a bare host (`artisancrafts.al`) or a full origin
    /// (`http://127.0.0.1:8000`).
    pub domain: String,
    /// Logo path for tenant pickers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Admin panel path on the site's own origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_path: Option<String>,
    /// Redirect target used verbatim after login, overriding `admin_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_redirect_url: Option<String>,
}

impl ClientSite {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            logo: None,
            admin_path: None,
            custom_redirect_url: None,
        }
    }

    #[must_use]
    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = Some(logo.into());
        self
    }

    #[must_use]
    pub fn with_admin_path(mut self, path: impl Into<String>) -> Self {
        self.admin_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_custom_redirect(mut self, url: impl Into<String>) -> Self {
        self.custom_redirect_url = Some(url.into());
        self
    }

    /// The site's origin. An explicit `http://` or `https://` in the domain
    /// is kept as given; otherwise `https://` is assumed.
    #[must_use]
    pub fn origin(&self) -> String {
        origin_of(&self.domain)
    }

    /// Admin panel path, always starting with `/`.
    #[must_use]
    pub fn admin_path(&self) -> String {
        match self.admin_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => {
                if path.starts_with('/') {
                    path.to_owned()
                } else {
                    format!("/{path}")
                }
            }
            _ => DEFAULT_ADMIN_PATH.to_owned(),
        }
    }

    /// Absolute URL of the site's login endpoint.
    #[must_use]
    pub fn login_endpoint(&self) -> String {
        format!("{}{CLIENT_LOGIN_PATH}", self.origin())
    }
}

/// Read-only, ordered list of client sites.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    sites: Vec<ClientSite>,
}

impl SiteRegistry {
    /// Build a registry, keeping the given display order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if two sites share a domain or a domain is
    /// empty.
    pub fn new(sites: Vec<ClientSite>) -> Result<Self, Error> {
        for (i, site) in sites.iter().enumerate() {
            if site.domain.trim().is_empty() {
                return Err(Error::Config(format!("client site '{}' has no domain", site.name)));
            }
            if sites[..i].iter().any(|s| s.domain == site.domain) {
                return Err(Error::Config(format!(
                    "client site domain '{}' is listed twice",
                    site.domain
                )));
            }
        }
        Ok(Self { sites })
    }

    /// The catalog shipped with the portal.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            sites: vec![
                ClientSite::new("TolaTiles", "https://tolatiles.com")
                    .with_logo("/client-logos/tolatiles.png")
                    .with_custom_redirect("https://tolatiles.com/admin/"),
                ClientSite::new("Artisan Crafts Albania", "artisancrafts.al")
                    .with_logo("/client-logos/artisancrafts.png"),
                ClientSite::new("Tirana Financial Group", "tiranafinancial.al")
                    .with_logo("/client-logos/tiranafinancial.png")
                    .with_admin_path("/dashboard"),
                ClientSite::new("TolaTiles (local)", "http://127.0.0.1:8000")
                    .with_logo("/client-logos/tolatiles.png"),
            ],
        }
    }

    /// Parse a catalog from a JSON array of sites.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for malformed JSON and [`Error::Config`] for
    /// duplicate or empty domains.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let sites: Vec<ClientSite> = serde_json::from_str(json)?;
        Self::new(sites)
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read, plus anything
    /// [`from_json`](Self::from_json) returns.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// All sites in display order.
    #[must_use]
    pub fn list_sites(&self) -> &[ClientSite] {
        &self.sites
    }

    /// The site whose domain equals `domain` exactly (case-sensitive, no
    /// scheme or host normalization).
    #[must_use]
    pub fn find_site(&self, domain: &str) -> Option<&ClientSite> {
        self.sites.iter().find(|s| s.domain == domain)
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn origin_defaults_to_https() {
        let site = ClientSite::new("Artisan", "artisancrafts.al");
        assert_eq!(site.origin(), "https://artisancrafts.al");
        assert_eq!(
            site.login_endpoint(),
            "https://artisancrafts.al/api/auth/login/"
        );
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let local = ClientSite::new("Local", "http://127.0.0.1:8000/");
        assert_eq!(local.origin(), "http://127.0.0.1:8000");
        assert_eq!(local.login_endpoint(), "http://127.0.0.1:8000/api/auth/login/");

        let secure = ClientSite::new("Secure", "https://tolatiles.com");
        assert_eq!(secure.origin(), "https://tolatiles.com");
    }

    #[test]
    fn admin_path_defaults_and_gains_leading_slash() {
        assert_eq!(ClientSite::new("a", "a.al").admin_path(), "/admin/");
        assert_eq!(
            ClientSite::new("a", "a.al").with_admin_path("dashboard").admin_path(),
            "/dashboard"
        );
        assert_eq!(
            ClientSite::new("a", "a.al").with_admin_path("  ").admin_path(),
            "/admin/"
        );
    }

    #[test]
    fn find_site_is_exact() {
        let registry = SiteRegistry::builtin();
        assert!(registry.find_site("https://tolatiles.com").is_some());
        assert!(registry.find_site("tolatiles.com").is_none());
        assert!(registry.find_site("HTTPS://TOLATILES.COM").is_none());
        assert!(registry.find_site("unknown.example").is_none());
    }

    #[test]
    fn list_keeps_display_order() {
        let registry = SiteRegistry::builtin();
        let names: Vec<_> = registry.list_sites().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names[0], "TolaTiles");
        assert_eq!(names[1], "Artisan Crafts Albania");
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn duplicate_domains_are_rejected() {
        let err = SiteRegistry::new(vec![
            ClientSite::new("One", "same.al"),
            ClientSite::new("Two", "same.al"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn json_catalog_uses_camel_case() {
        let registry = SiteRegistry::from_json(
            r#"[
                {"name": "Shop", "domain": "shop.al", "adminPath": "/manage/"},
                {"name": "Blog", "domain": "https://blog.al", "customRedirectUrl": "https://blog.al/wp-admin/"}
            ]"#,
        )
        .unwrap();
        let shop = registry.find_site("shop.al").unwrap();
        assert_eq!(shop.admin_path(), "/manage/");
        assert_eq!(shop.logo, None);
        let blog = registry.find_site("https://blog.al").unwrap();
        assert_eq!(
            blog.custom_redirect_url.as_deref(),
            Some("https://blog.al/wp-admin/")
        );
    }

    #[test]
    fn catalog_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.json");
        std::fs::write(&path, r#"[{"name": "Shop", "domain": "shop.al"}]"#).unwrap();
        let registry = SiteRegistry::load(&path).unwrap();
        assert_eq!(registry.list_sites().len(), 1);

        let missing = SiteRegistry::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, Error::Config(_)));
    }
}
