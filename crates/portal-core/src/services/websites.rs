use crate::error::Error;
use crate::http::ApiClient;
use crate::types::{Listing, Website, WebsiteSection};

/// Websites owned by the signed-in user and their editable sections.
#[derive(Debug, Clone)]
pub struct WebsiteService {
    api: ApiClient,
}

impl WebsiteService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Anything [`ApiClient::send`] returns.
    pub async fn list(&self) -> Result<Vec<Website>, Error> {
        let listing: Listing<Website> = self.api.get("/websites/").await?;
        Ok(listing.into_items())
    }

    /// Sections of a website, in the order the backend returns them.
    ///
    /// # Errors
    ///
    /// Anything [`ApiClient::send`] returns.
    pub async fn sections(&self, website_id: i64) -> Result<Vec<WebsiteSection>, Error> {
        let listing: Listing<WebsiteSection> = self
            .api
            .get(&format!("/websites/{website_id}/sections/"))
            .await?;
        Ok(listing.into_items())
    }

    /// # Errors
    ///
    /// Anything [`ApiClient::send`] returns.
    pub async fn section(&self, website_id: i64, section_id: i64) -> Result<WebsiteSection, Error> {
        self.api
            .get(&format!("/websites/{website_id}/sections/{section_id}/"))
            .await
    }

    /// Replace a section and return the stored version.
    ///
    /// # Errors
    ///
    /// Anything [`ApiClient::send`] returns.
    pub async fn update_section(
        &self,
        website_id: i64,
        section_id: i64,
        section: &WebsiteSection,
    ) -> Result<WebsiteSection, Error> {
        self.api
            .put(&format!("/websites/{website_id}/sections/{section_id}/"), section)
            .await
    }
}
