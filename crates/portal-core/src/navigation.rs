//! Where the user is sent after a login or a torn-down session.
//!
//! The core never navigates by itself; it hands a [`Navigation`] to whatever
//! [`Navigator`] the embedding front end provides.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

/// A navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// A path within the portal, reachable with an in-app route change.
    InApp(String),
    /// A full page load, either to another origin or to tear the session
    /// down completely.
    FullPage(String),
}

impl Navigation {
    /// `http://` and `https://` targets need a full page load, anything else
    /// is a route inside the portal.
    #[must_use]
    pub fn classify(target: &str) -> Self {
        if target.starts_with("http://") || target.starts_with("https://") {
            Self::FullPage(target.to_owned())
        } else {
            Self::InApp(target.to_owned())
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::InApp(t) | Self::FullPage(t) => t,
        }
    }

    #[must_use]
    pub fn is_full_page(&self) -> bool {
        matches!(self, Self::FullPage(_))
    }
}

/// Performs navigation on behalf of the core.
pub trait Navigator: Send + Sync {
    fn navigate(&self, to: &Navigation);
}

/// Navigator that only records the request in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, to: &Navigation) {
        info!(target = to.target(), full_page = to.is_full_page(), "navigation requested");
    }
}

/// Navigator that keeps every request for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    visits: Arc<Mutex<Vec<Navigation>>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All navigations requested so far, oldest first.
    #[must_use]
    pub fn visits(&self) -> Vec<Navigation> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent navigation, if any.
    #[must_use]
    pub fn last(&self) -> Option<Navigation> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, to: &Navigation) {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(to.clone());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_scheme() {
        assert!(Navigation::classify("https://tolatiles.com/admin/").is_full_page());
        assert!(Navigation::classify("http://127.0.0.1:8000/admin/").is_full_page());
        assert_eq!(
            Navigation::classify("/dashboard"),
            Navigation::InApp("/dashboard".to_owned())
        );
    }

    #[test]
    fn recorder_keeps_order() {
        let nav = RecordingNavigator::new();
        nav.navigate(&Navigation::classify("/login"));
        nav.navigate(&Navigation::classify("/client-login"));
        assert_eq!(nav.visits().len(), 2);
        assert_eq!(nav.last().unwrap().target(), "/client-login");
    }
}
