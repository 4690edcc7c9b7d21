use crate::error::Error;
use crate::http::ApiClient;
use crate::types::DashboardSummary;

const SUMMARY_PATH: &str = "/dashboard/summary/";

/// Landing-page summary for the signed-in user's website.
#[derive(Debug, Clone)]
pub struct DashboardService {
    api: ApiClient,
}

impl DashboardService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Anything [`ApiClient::send`] returns. A user without websites gets
    /// [`Error::Rejected`] with status 404.
    pub async fn summary(&self) -> Result<DashboardSummary, Error> {
        self.api.get(SUMMARY_PATH).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::services::testing::signed_in;
    use crate::types::{ActivityKind, WebsiteStatus};

    #[tokio::test]
    async fn summary_with_activity() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/dashboard/summary/");
            then.status(200).json_body(json!({
                "websiteUrl": "https://artisancrafts.al",
                "websiteName": "Artisan Crafts",
                "status": "live",
                "visitors": 1204,
                "pageViews": 3518,
                "avgTime": "2m 14s",
                "bounceRate": "38%",
                "recentActivity": [
                    {"id": 1, "description": "Hero section updated", "date": "2024-05-02", "type": "update"},
                    {"id": 2, "description": "Backup completed", "date": "2024-05-01", "type": "system"}
                ]
            }));
        });
        let (api, _) = signed_in(&server).await;

        let summary = DashboardService::new(api).summary().await.unwrap();
        assert_eq!(summary.status, WebsiteStatus::Live);
        assert_eq!(summary.page_views, 3518);
        assert_eq!(summary.recent_activity.len(), 2);
        assert_eq!(summary.recent_activity[1].kind, ActivityKind::System);
    }

    #[tokio::test]
    async fn no_website_is_a_rejection() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/dashboard/summary/");
            then.status(404).json_body(json!({"error": "No websites found"}));
        });
        let (api, navigator) = signed_in(&server).await;

        let err = DashboardService::new(api).summary().await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "No websites found");
        assert!(navigator.visits().is_empty());
    }
}
