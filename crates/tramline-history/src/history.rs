//! History abstraction

use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

use tramline_url::ParsedUrl;

use crate::mode::HistoryMode;
use crate::options::{HashRouteTransformer, HistoryOptions};
use crate::window::{EventKind, Listener, ListenerId, Location, Window};
use crate::Result;

/// Fragments whose entry state is kept without `pushState`; the least
/// recently written is forgotten first.
const MAX_EMULATED_STATES: usize = 64;

/// Where a route lands when it is carried in the fragment
struct HashTarget {
    /// Fragment text without `#`
    fragment: String,
    /// `pathname + search + #fragment`
    relative: String,
    /// `protocol//host` + relative
    absolute: String,
}

/// Uniform push/replace/listen interface over the host's history.
///
/// The mode is decided from the window's capabilities and the options at
/// construction and every operation dispatches on it.
pub struct History {
    window: Rc<dyn Window>,
    mode: HistoryMode,
    transformer: Option<Rc<dyn HashRouteTransformer>>,
    /// Entry state for hash routing without `pushState`, keyed by fragment,
    /// oldest write first
    emulated_states: RefCell<Vec<(String, Value)>>,
}

impl History {
    pub fn new(window: Rc<dyn Window>) -> Self {
        Self::with_options(window, HistoryOptions::default())
    }

    pub fn with_options(window: Rc<dyn Window>, options: HistoryOptions) -> Self {
        let has_push_state = window.has_push_state();
        let use_hash_route = options
            .use_hash_route
            .resolve(window.as_ref(), has_push_state);
        let mode = HistoryMode::select(has_push_state, use_hash_route);

        tracing::debug!(
            mode = %mode,
            event = %mode.change_event(),
            has_transformer = options.hash_route_transformer.is_some(),
            "History initialized"
        );

        Self {
            window,
            mode,
            transformer: options.hash_route_transformer,
            emulated_states: RefCell::new(Vec::new()),
        }
    }

    pub fn window(&self) -> &Rc<dyn Window> {
        &self.window
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    /// Whether native history mutation was detected
    pub fn has_push_state(&self) -> bool {
        self.mode.has_push_state()
    }

    pub fn use_hash_route(&self) -> bool {
        self.mode.uses_hash()
    }

    /// `popstate` with native support, `hashchange` otherwise
    pub fn change_event(&self) -> EventKind {
        self.mode.change_event()
    }

    pub fn on(&self, listener: Listener) -> ListenerId {
        self.window
            .add_event_listener(self.change_event(), listener)
    }

    pub fn off(&self, id: ListenerId) {
        self.window.remove_event_listener(self.change_event(), id);
    }

    /// Current fragment without `#`, reverse-transformed. Empty when there is
    /// no fragment.
    pub fn get_hash(&self) -> String {
        self.route_from_hash(&self.window.location())
    }

    /// Logical route path: the fragment route when hash routing is on and a
    /// fragment is present, otherwise `pathname + search`.
    pub fn get_path(&self) -> String {
        let location = self.window.location();
        if self.use_hash_route() {
            let hash = self.route_from_hash(&location);
            if !hash.is_empty() {
                return hash;
            }
        }
        location.path_and_query()
    }

    /// Relative URL of the current location. Under hash routing the path part
    /// comes from the fragment.
    pub fn get_relative_url(&self) -> String {
        let location = self.window.location();
        if !self.use_hash_route() {
            return format!("{}{}", location.path_and_query(), location.hash);
        }

        let route = self.route_from_hash(&location);
        let path = if route.is_empty() {
            location.pathname.clone()
        } else if route.starts_with('/') {
            route
        } else {
            format!("/{}", route)
        };
        format!("{}{}", path, location.search)
    }

    /// URL to compare against the route store. Ignores the fragment unless it
    /// carries the route.
    pub fn get_url(&self) -> String {
        if self.use_hash_route() {
            self.get_relative_url()
        } else {
            self.window.location().path_and_query()
        }
    }

    /// State attached to the current entry
    pub fn state(&self) -> Option<Value> {
        match self.mode {
            HistoryMode::HashEmulated {
                native_writes: false,
            } => {
                let location = self.window.location();
                let key = location.hash.strip_prefix('#').unwrap_or(&location.hash);
                self.emulated_states
                    .borrow()
                    .iter()
                    .find(|(fragment, _)| fragment == key)
                    .map(|(_, state)| state.clone())
            }
            _ => self.window.history_state(),
        }
    }

    /// Record a new location, always adding a history entry.
    pub fn push_state(&self, state: Option<Value>, title: Option<&str>, url: &str) -> Result<()> {
        tracing::debug!(mode = %self.mode, url = %url, "pushState");

        match self.mode {
            HistoryMode::Native => self.window.push_state(state.as_ref(), title, url),
            HistoryMode::HashEmulated { native_writes } => {
                let target = self.hash_target(url);
                if native_writes {
                    self.window
                        .push_state(state.as_ref(), title, &target.relative)
                } else {
                    self.remember(target.fragment, state);
                    self.window.assign(&target.absolute)
                }
            }
            HistoryMode::FullReload => self.window.assign(url),
        }
    }

    /// Rewrite the current entry without adding one. `None` keeps the URL and
    /// only updates the state.
    pub fn replace_state(
        &self,
        state: Option<Value>,
        title: Option<&str>,
        url: Option<&str>,
    ) -> Result<()> {
        tracing::debug!(mode = %self.mode, url = ?url, "replaceState");

        match (self.mode, url) {
            (HistoryMode::Native, url) => self.window.replace_state(state.as_ref(), title, url),
            (HistoryMode::HashEmulated { native_writes }, Some(url)) => {
                let target = self.hash_target(url);
                if native_writes {
                    self.window
                        .replace_state(state.as_ref(), title, Some(&target.relative))
                } else {
                    self.remember(target.fragment, state);
                    self.window.replace_location(&target.absolute)
                }
            }
            (HistoryMode::HashEmulated { native_writes }, None) => {
                if native_writes {
                    self.window.replace_state(state.as_ref(), title, None)
                } else {
                    let location = self.window.location();
                    let key = location.hash.strip_prefix('#').unwrap_or(&location.hash);
                    self.remember(key.to_string(), state);
                    Ok(())
                }
            }
            (HistoryMode::FullReload, Some(url)) => self.window.replace_location(url),
            (HistoryMode::FullReload, None) => {
                tracing::debug!("replaceState without URL ignored, no state persistence");
                Ok(())
            }
        }
    }

    fn route_from_hash(&self, location: &Location) -> String {
        let hash = location.hash.strip_prefix('#').unwrap_or(&location.hash);
        if hash.is_empty() {
            return String::new();
        }
        match &self.transformer {
            Some(transformer) => transformer.reverse(hash),
            None => hash.to_string(),
        }
    }

    fn hash_target(&self, url: &str) -> HashTarget {
        let location = self.window.location();
        let parsed = ParsedUrl::parse(url);
        if parsed.has_hash() {
            tracing::debug!(url = %url, "Fragment dropped, route is carried in the hash");
        }

        let fragment = match &self.transformer {
            Some(transformer) => transformer.transform(&parsed.pathname),
            None => parsed.pathname.clone(),
        };
        let hash = if fragment.is_empty() {
            String::new()
        } else {
            format!("#{}", fragment)
        };
        let relative = format!("{}{}{}", location.pathname, parsed.search_or_empty(), hash);
        let absolute = format!("{}{}", location.origin(), relative);

        HashTarget {
            fragment,
            relative,
            absolute,
        }
    }

    fn remember(&self, fragment: String, state: Option<Value>) {
        let mut states = self.emulated_states.borrow_mut();
        states.retain(|(existing, _)| *existing != fragment);
        if let Some(state) = state {
            states.push((fragment, state));
            if states.len() > MAX_EMULATED_STATES {
                let forgotten = states.remove(0);
                tracing::trace!(fragment = %forgotten.0, "Emulated entry state forgotten");
            }
        }
    }
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("mode", &self.mode)
            .field("has_transformer", &self.transformer.is_some())
            .finish()
    }
}
