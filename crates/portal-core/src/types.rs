//! Wire types for the primary backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Profile of the signed-in agency user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Display name, when the backend sends one instead of first/last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `client` or `admin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    /// Best human-readable name available.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_owned();
        }
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if !full.is_empty() {
            return full.to_owned();
        }
        if self.username.is_empty() {
            self.email.clone()
        } else {
            self.username.clone()
        }
    }
}

/// Body of a successful login or signup.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Registration payload. The email doubles as the username.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SignupRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password2: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Split a full name on its first space: `"Ana Maria Hoxha"` becomes
/// `("Ana", "Maria Hoxha")`, a single word becomes `(word, "")`.
#[must_use]
pub fn split_name(name: &str) -> (&str, &str) {
    name.split_once(' ').unwrap_or((name, ""))
}

/// Editable account settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    pub email_notifications: bool,
    pub marketing_emails: bool,
    pub language: String,
}

/// Lifecycle state of a website.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebsiteStatus {
    Development,
    Live,
    Maintenance,
    Offline,
}

impl std::fmt::Display for WebsiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Live => "live",
            Self::Maintenance => "maintenance",
            Self::Offline => "offline",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Website {
    pub id: i64,
    pub name: String,
    pub domain: String,
    pub status: WebsiteStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
}

/// One value inside a section's content map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl SectionValue {
    /// Parse a CLI-style literal: `true`/`false`, a number, or text.
    #[must_use]
    pub fn parse_literal(raw: &str) -> Self {
        match raw {
            "true" => Self::Flag(true),
            "false" => Self::Flag(false),
            _ => raw
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map_or_else(|| Self::Text(raw.to_owned()), Self::Number),
        }
    }
}

impl std::fmt::Display for SectionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// An editable block of a website (hero, services, contact, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteSection {
    pub id: i64,
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub content: BTreeMap<String, SectionValue>,
    #[serde(default)]
    pub order: i64,
}

/// Analytics window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Year,
}

impl TimeRange {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(format!("unknown time range '{other}', expected week, month or year")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalytics {
    pub path: String,
    pub views: u64,
    pub avg_time: String,
    pub bounce_rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub total_visitors: u64,
    pub visitors_delta: String,
    pub page_views: u64,
    pub page_views_delta: String,
    pub avg_session_duration: String,
    pub session_duration_delta: String,
    pub bounce_rate: String,
    pub bounce_rate_delta: String,
    #[serde(default)]
    pub top_pages: Vec<PageAnalytics>,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Update,
    Visitor,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub description: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub website_url: String,
    pub website_name: String,
    pub status: WebsiteStatus,
    pub visitors: u64,
    pub page_views: u64,
    pub avg_time: String,
    pub bounce_rate: String,
    #[serde(default)]
    pub recent_activity: Vec<Activity>,
}

/// A list endpoint answer: paginated envelope or bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Page {
        #[serde(default = "Vec::new")]
        results: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Page { results } | Self::Bare(results) => results,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn split_name_on_first_space() {
        assert_eq!(split_name("Ana Maria Hoxha"), ("Ana", "Maria Hoxha"));
        assert_eq!(split_name("Ana"), ("Ana", ""));
        assert_eq!(split_name("Ana "), ("Ana", ""));
    }

    #[test]
    fn display_name_fallbacks() {
        let mut user: User =
            serde_json::from_str(r#"{"id": 1, "username": "ana", "email": "ana@example.com"}"#)
                .unwrap();
        assert_eq!(user.display_name(), "ana");
        user.first_name = "Ana".to_owned();
        assert_eq!(user.display_name(), "Ana");
        user.name = Some("Ana H.".to_owned());
        assert_eq!(user.display_name(), "Ana H.");
    }

    #[test]
    fn section_content_is_typed() {
        let section: WebsiteSection = serde_json::from_str(
            r#"{"id": 3, "name": "Hero", "key": "hero", "order": 1,
                "content": {"title": "Welcome", "columns": 3, "visible": true}}"#,
        )
        .unwrap();
        assert_eq!(section.content["title"], SectionValue::Text("Welcome".to_owned()));
        assert_eq!(section.content["columns"], SectionValue::Number(3.0));
        assert_eq!(section.content["visible"], SectionValue::Flag(true));
    }

    #[test]
    fn section_literals() {
        assert_eq!(SectionValue::parse_literal("true"), SectionValue::Flag(true));
        assert_eq!(SectionValue::parse_literal("4.5"), SectionValue::Number(4.5));
        assert_eq!(
            SectionValue::parse_literal("Call us"),
            SectionValue::Text("Call us".to_owned())
        );
        assert_eq!(
            SectionValue::parse_literal("NaN"),
            SectionValue::Text("NaN".to_owned())
        );
    }

    #[test]
    fn listing_accepts_both_shapes() {
        let page: Listing<i64> = serde_json::from_str(r#"{"count": 2, "results": [1, 2]}"#).unwrap();
        assert_eq!(page.into_items(), vec![1, 2]);
        let bare: Listing<i64> = serde_json::from_str("[3]").unwrap();
        assert_eq!(bare.into_items(), vec![3]);
        let empty: Listing<i64> = serde_json::from_str(r#"{"count": 0}"#).unwrap();
        assert!(empty.into_items().is_empty());
    }

    #[test]
    fn activity_kind_uses_type_field() {
        let activity: Activity = serde_json::from_str(
            r#"{"id": 1, "description": "Section 'Hero' updated", "date": "2025-03-01", "type": "update"}"#,
        )
        .unwrap();
        assert_eq!(activity.kind, ActivityKind::Update);
    }
}
