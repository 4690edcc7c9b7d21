use crate::error::Error;
use crate::http::ApiClient;
use crate::types::{AnalyticsData, TimeRange};

const ANALYTICS_PATH: &str = "/analytics/data/";

/// Traffic figures for one website.
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    api: ApiClient,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Anything [`ApiClient::send`] returns.
    pub async fn analytics(&self, website_id: i64, range: TimeRange) -> Result<AnalyticsData, Error> {
        self.api
            .get_with_query(
                ANALYTICS_PATH,
                &[
                    ("website_id", website_id.to_string()),
                    ("time_range", range.as_str().to_owned()),
                ],
            )
            .await
    }
}
