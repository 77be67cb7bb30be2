//! Headless navigation link
//!
//! Decides whether a click on a link is routed client-side or left to the
//! browser, and builds the `click` intent when it is routed.

use serde_json::Value;
use url::Url;

use tramline_history::Location;

use crate::error::RouterError;
use crate::intent::{NavigationIntent, NavigationType};
use crate::store::{Dispatcher, RouteStore};
use crate::Result;

/// Mouse click as seen by a link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickEvent {
    /// 0 is the primary button
    pub button: u16,
    pub meta: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
}

impl ClickEvent {
    pub fn primary() -> Self {
        Self::default()
    }

    /// Clicks that ask the browser for a new tab or window, or a download
    pub fn is_modified(&self) -> bool {
        self.button != 0 || self.meta || self.alt || self.ctrl || self.shift
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Let the browser follow the link
    BrowserDefault,
    /// Navigation dispatched; the browser default must be prevented
    Dispatched(NavigationIntent),
}

#[derive(Debug, Clone, Default)]
pub struct NavLink {
    href: Option<String>,
    route_name: Option<String>,
    nav_params: Option<Value>,
    follow_link: bool,
}

impl NavLink {
    /// Link to a fixed URL
    pub fn to(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            ..Self::default()
        }
    }

    /// Link to a named route, resolved through the store
    pub fn route(name: impl Into<String>) -> Self {
        Self {
            route_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.nav_params = Some(params);
        self
    }

    /// Always let the browser handle the click
    pub fn follow_link(mut self, follow: bool) -> Self {
        self.follow_link = follow;
        self
    }

    pub fn resolve_href(&self, store: &dyn RouteStore) -> Result<String> {
        if let Some(href) = &self.href {
            return Ok(href.clone());
        }
        let name = self.route_name.as_deref().ok_or(RouterError::MissingHref)?;
        store
            .make_path(name, self.nav_params.as_ref())
            .ok_or_else(|| RouterError::UnresolvedRoute(name.to_string()))
    }

    /// Whether the link points at the current route
    pub fn is_active(&self, store: &dyn RouteStore) -> bool {
        self.resolve_href(store)
            .is_ok_and(|href| store.is_active(&href))
    }

    pub fn handle_click(
        &self,
        click: &ClickEvent,
        location: &Location,
        store: &dyn RouteStore,
        dispatcher: Option<&dyn Dispatcher>,
    ) -> Result<ClickOutcome> {
        if click.is_modified() || self.follow_link {
            return Ok(ClickOutcome::BrowserDefault);
        }

        let href = self.resolve_href(store)?;
        if href.starts_with('#') {
            return Ok(ClickOutcome::BrowserDefault);
        }
        let Some(url) = same_origin_url(&href, location) else {
            tracing::debug!(href = %href, "Link leaves the origin");
            return Ok(ClickOutcome::BrowserDefault);
        };

        let Some(dispatcher) = dispatcher else {
            tracing::warn!(href = %href, "Missing dispatcher, link will load from server");
            return Err(RouterError::MissingDispatcher);
        };

        let mut intent = NavigationIntent::new(NavigationType::Click, url.as_str())
            .with_params(self.nav_params.clone());
        if let Some(parsed) = tramline_url::parse_url(url.as_str()) {
            intent = intent.with_path(parsed.pathname);
        }
        tracing::debug!(url = %intent.url, "Link click dispatched");
        dispatcher.execute_action(intent.clone());
        Ok(ClickOutcome::Dispatched(intent))
    }
}

/// `href` as the router sees it, or `None` when it points at another origin.
/// Absolute same-origin URLs are reduced to `path?query#fragment`.
fn same_origin_url(href: &str, location: &Location) -> Option<String> {
    let Ok(base) = Url::parse(&location.href()) else {
        return Some(href.to_string());
    };
    let target = base.join(href).ok()?;
    if target.origin() != base.origin() {
        return None;
    }
    if Url::parse(href).is_err() {
        return Some(href.to_string());
    }

    let mut reduced = target.path().to_string();
    if let Some(query) = target.query() {
        reduced.push('?');
        reduced.push_str(query);
    }
    if let Some(fragment) = target.fragment() {
        reduced.push('#');
        reduced.push_str(fragment);
    }
    Some(reduced)
}
