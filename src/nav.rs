//! Navigation adapter: keeps the current step token in an addressable URL.

use std::sync::{Mutex, PoisonError};
use url::Url;

/// Options for replacing a URL query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavOptions {
    /// Whether the view should scroll to the top after the change
    pub scroll: bool,
}

/// Reads and replaces the step token in the current location.
///
/// Implementations must update the location in place: no reload, no loss of
/// in-memory wizard state.
pub trait Navigator: Send + Sync {
    fn get_param(&self, name: &str) -> Option<String>;

    fn set_param(&self, name: &str, value: &str, options: NavOptions);

    /// Leave the wizard route entirely.
    fn leave(&self, route: &str);
}

/// Navigator backed by an in-memory `Url`.
#[derive(Debug)]
pub struct UrlNavigator {
    url: Mutex<Url>,
    left: Mutex<Option<String>>,
}

impl UrlNavigator {
    pub fn new(url: Url) -> Self {
        Self {
            url: Mutex::new(url),
            left: Mutex::new(None),
        }
    }

    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(url)?))
    }

    /// Build `<base><route>` with no query.
    pub fn for_route(base_url: &str, route: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base_url)?;
        Ok(Self::new(base.join(route)?))
    }

    pub fn current_url(&self) -> String {
        self.url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_string()
    }

    /// Route passed to `leave`, if the wizard has left.
    pub fn left_route(&self) -> Option<String> {
        self.left
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for UrlNavigator {
    fn get_param(&self, name: &str) -> Option<String> {
        self.url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    fn set_param(&self, name: &str, value: &str, options: NavOptions) {
        let mut url = self.url.lock().unwrap_or_else(PoisonError::into_inner);

        // First occurrence keeps its slot, later duplicates are dropped.
        let mut replaced = false;
        let mut pairs: Vec<(String, String)> = Vec::new();
        for (k, v) in url.query_pairs() {
            if k != name {
                pairs.push((k.into_owned(), v.into_owned()));
            } else if !replaced {
                pairs.push((k.into_owned(), value.to_string()));
                replaced = true;
            }
        }
        if !replaced {
            pairs.push((name.to_string(), value.to_string()));
        }

        url.query_pairs_mut().clear().extend_pairs(pairs);
        tracing::debug!(url = %url, scroll = options.scroll, "replaced location");
    }

    fn leave(&self, route: &str) {
        let mut url = self.url.lock().unwrap_or_else(PoisonError::into_inner);
        url.set_query(None);
        url.set_path(route);
        *self.left.lock().unwrap_or_else(PoisonError::into_inner) = Some(route.to_string());
        tracing::debug!(url = %url, "left wizard route");
    }
}
