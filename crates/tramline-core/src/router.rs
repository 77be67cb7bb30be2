//! Navigation orchestrator
//!
//! Keeps the route store and browser history in step:
//! - history changes (back/forward) become `popstate` navigations
//! - store changes are rendered and, for clicks, written to history
//! - scroll offsets are saved into the current entry and restored on popstate

use serde_json::{json, Map, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tramline_history::{
    EventKind, History, HistoryOptions, ListenerId, ScrollPosition, TimerId, Window, WindowEvent,
};

use tramline_url::ParsedUrl;

use crate::config::{RouterConfig, ScrollRestoreOrder};
use crate::error::RouterError;
use crate::intent::{NavigationIntent, NavigationType, Route};
use crate::store::{Dispatcher, RouteRenderer, RouteStore};
use crate::Result;

/// Builds the `History` a router uses once mounted
pub type HistoryFactory = Box<dyn Fn(Rc<dyn Window>, &RouterConfig) -> History>;

/// Factory used unless one is supplied: hash routing follows
/// `RouterConfig::use_hash_route`.
pub fn default_history_factory(window: Rc<dyn Window>, config: &RouterConfig) -> History {
    History::with_options(
        window,
        HistoryOptions::new().with_hash_route(config.use_hash_route),
    )
}

/// Routes are compared by normalized pathname and query. The fragment never
/// takes part: under hash routing it carries the route itself.
fn same_route(a: &str, b: &str) -> bool {
    ParsedUrl::parse(a).path == ParsedUrl::parse(b).path
}

fn scroll_value(position: ScrollPosition) -> Value {
    json!({ "x": position.x, "y": position.y })
}

/// State shared with the listeners registered at mount
struct Session {
    window: Rc<dyn Window>,
    store: Rc<dyn RouteStore>,
    dispatcher: Rc<dyn Dispatcher>,
    renderer: Option<Rc<dyn RouteRenderer>>,
    config: RouterConfig,
    history: History,
    last_route: RefCell<Option<Route>>,
    scroll_timer: Cell<Option<TimerId>>,
    pageload_timer: Cell<Option<TimerId>>,
}

impl Session {
    fn on_history_change(&self, event: &WindowEvent) {
        let url = self.history.get_url();
        let current = self.store.current_route().map(|route| route.url);
        if current.as_deref().is_some_and(|current| same_route(current, &url)) {
            tracing::trace!(url = %url, "History change matches current route");
            return;
        }

        let state = event.state.clone().or_else(|| self.history.state());
        let params = state.and_then(|s| s.get("params").cloned());
        tracing::debug!(url = %url, event = %event.kind, "History change, dispatching popstate");
        self.dispatcher.execute_action(
            NavigationIntent::new(NavigationType::PopState, url).with_params(params),
        );
    }

    fn on_scroll(self: &Rc<Self>) {
        if let Some(id) = self.scroll_timer.take() {
            self.window.clear_timeout(id);
        }
        let session = Rc::downgrade(self);
        let id = self.window.set_timeout(
            self.config.scroll_debounce(),
            Box::new(move || {
                if let Some(session) = session.upgrade() {
                    session.scroll_timer.set(None);
                    session.save_scroll_position();
                }
            }),
        );
        self.scroll_timer.set(Some(id));
    }

    fn save_scroll_position(&self) {
        let mut state = match self.history.state() {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let position = self.window.scroll_position();
        tracing::debug!(x = position.x, y = position.y, "Saving scroll position");
        state.insert("scroll".to_string(), scroll_value(position));

        if let Err(e) = self
            .history
            .replace_state(Some(Value::Object(state)), None, None)
        {
            tracing::warn!(error = %e, "Failed to save scroll position");
        }
    }

    fn on_store_change(&self) {
        let route = self.store.current_route();
        let previous = self.last_route.replace(route.clone());
        let url = route.as_ref().map(|r| r.url.as_str());
        let unchanged = match (previous.as_ref().map(|r| r.url.as_str()), url) {
            (Some(a), Some(b)) => same_route(a, b),
            (a, b) => a == b,
        };
        if unchanged {
            return;
        }

        let navigate = self.store.current_navigate();
        let nav_type = navigate
            .as_ref()
            .map_or(NavigationType::Default, |n| n.nav_type);
        tracing::info!(nav_type = %nav_type, url = ?url, "Route changed");

        let scroll_order = self.config.scroll_restore;
        if scroll_order == ScrollRestoreOrder::BeforeRender {
            self.apply_scroll(nav_type);
        }
        if let Some(renderer) = &self.renderer {
            renderer.render(route.as_ref());
        }
        if nav_type.writes_history() {
            self.push_history(navigate.as_ref(), route.as_ref());
        }
        if scroll_order == ScrollRestoreOrder::AfterRender {
            self.apply_scroll(nav_type);
        }
    }

    fn push_history(&self, navigate: Option<&NavigationIntent>, route: Option<&Route>) {
        let Some(url) = navigate
            .map(|n| n.url.clone())
            .or_else(|| route.map(|r| r.url.clone()))
        else {
            return;
        };
        let params = navigate
            .and_then(|n| n.params.clone())
            .unwrap_or_else(|| json!({}));
        let title = params
            .get("pageTitle")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut state = Map::new();
        state.insert("params".to_string(), params);
        if self.config.enable_scroll {
            state.insert("scroll".to_string(), scroll_value(ScrollPosition::default()));
        }

        if let Err(e) = self
            .history
            .push_state(Some(Value::Object(state)), title.as_deref(), &url)
        {
            tracing::warn!(url = %url, error = %e, "Failed to push history entry");
        }
    }

    fn apply_scroll(&self, nav_type: NavigationType) {
        if !self.config.enable_scroll {
            return;
        }
        match nav_type {
            NavigationType::Click | NavigationType::Default => {
                self.window.scroll_to(0.0, 0.0);
            }
            NavigationType::PopState => {
                let scroll = self
                    .history
                    .state()
                    .and_then(|state| state.get("scroll").cloned());
                let coord = |key: &str| {
                    scroll
                        .as_ref()
                        .and_then(|s| s.get(key))
                        .and_then(Value::as_f64)
                        .unwrap_or(0.0)
                };
                let (x, y) = (coord("x"), coord("y"));
                tracing::debug!(x, y, "Restoring scroll position");
                self.window.scroll_to(x, y);
            }
            NavigationType::PageLoad => {}
        }
    }

    fn check_page_load(self: &Rc<Self>) {
        let url = self.history.get_url();
        let current = self.store.current_route().map(|route| route.url);
        if current.as_deref().is_some_and(|current| same_route(current, &url)) {
            return;
        }

        tracing::debug!(url = %url, current = ?current, "Page load URL differs from store route");
        let session = Rc::downgrade(self);
        let id = self.window.set_timeout(
            Duration::ZERO,
            Box::new(move || {
                if let Some(session) = session.upgrade() {
                    session.pageload_timer.set(None);
                    session
                        .dispatcher
                        .execute_action(NavigationIntent::new(NavigationType::PageLoad, url));
                }
            }),
        );
        self.pageload_timer.set(Some(id));
    }

    fn cancel_timers(&self) {
        for timer in [&self.scroll_timer, &self.pageload_timer] {
            if let Some(id) = timer.take() {
                self.window.clear_timeout(id);
            }
        }
    }
}

struct Mounted {
    session: Rc<Session>,
    store_listener: ListenerId,
    history_listener: ListenerId,
    scroll_listener: Option<ListenerId>,
}

/// Binds a route store to the browser history of one window
pub struct Router {
    window: Rc<dyn Window>,
    store: Rc<dyn RouteStore>,
    dispatcher: Rc<dyn Dispatcher>,
    renderer: Option<Rc<dyn RouteRenderer>>,
    config: RouterConfig,
    history_factory: HistoryFactory,
    mounted: Option<Mounted>,
}

impl Router {
    pub fn new(
        window: Rc<dyn Window>,
        store: Rc<dyn RouteStore>,
        dispatcher: Rc<dyn Dispatcher>,
        config: RouterConfig,
    ) -> Self {
        Self {
            window,
            store,
            dispatcher,
            renderer: None,
            config,
            history_factory: Box::new(default_history_factory),
            mounted: None,
        }
    }

    pub fn with_renderer(mut self, renderer: impl RouteRenderer + 'static) -> Self {
        self.renderer = Some(Rc::new(renderer));
        self
    }

    pub fn with_history_factory(
        mut self,
        factory: impl Fn(Rc<dyn Window>, &RouterConfig) -> History + 'static,
    ) -> Self {
        self.history_factory = Box::new(factory);
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// History in use while mounted
    pub fn history(&self) -> Option<&History> {
        self.mounted.as_ref().map(|m| &m.session.history)
    }

    pub fn current_route(&self) -> Option<Route> {
        self.store.current_route()
    }

    /// Navigate programmatically
    pub fn navigate(&self, url: &str, params: Option<Value>) {
        let mut intent = NavigationIntent::new(NavigationType::Default, url).with_params(params);
        if let Some(parsed) = tramline_url::parse_url(url) {
            intent = intent.with_path(parsed.pathname);
        }
        self.dispatcher.execute_action(intent);
    }

    /// Start listening to the store, the history and (optionally) scrolling.
    ///
    /// With `check_route_on_page_load`, a URL the store does not reflect yet
    /// is dispatched as a `pageload` navigation on the next tick.
    pub fn mount(&mut self) -> Result<()> {
        if self.mounted.is_some() {
            return Err(RouterError::AlreadyMounted);
        }

        let history = (self.history_factory)(self.window.clone(), &self.config);
        let current = self.store.current_route();
        let session = Rc::new(Session {
            window: self.window.clone(),
            store: self.store.clone(),
            dispatcher: self.dispatcher.clone(),
            renderer: self.renderer.clone(),
            config: self.config.clone(),
            history,
            last_route: RefCell::new(current.clone()),
            scroll_timer: Cell::new(None),
            pageload_timer: Cell::new(None),
        });

        let weak = Rc::downgrade(&session);
        let store_listener = self.store.add_change_listener(Rc::new(move || {
            if let Some(session) = weak.upgrade() {
                session.on_store_change();
            }
        }));

        let weak = Rc::downgrade(&session);
        let history_listener = session.history.on(Rc::new(move |event: &WindowEvent| {
            if let Some(session) = weak.upgrade() {
                session.on_history_change(event);
            }
        }));

        let scroll_listener = if self.config.enable_scroll {
            let weak = Rc::downgrade(&session);
            Some(self.window.add_event_listener(
                EventKind::Scroll,
                Rc::new(move |_: &WindowEvent| {
                    if let Some(session) = weak.upgrade() {
                        session.on_scroll();
                    }
                }),
            ))
        } else {
            None
        };

        tracing::info!(
            mode = %session.history.mode(),
            url = %session.history.get_url(),
            route = ?current.as_ref().map(|r| &r.url),
            "Router mounted"
        );

        if self.config.check_route_on_page_load {
            session.check_page_load();
        }
        if let Some(renderer) = &self.renderer {
            renderer.render(current.as_ref());
        }

        self.mounted = Some(Mounted {
            session,
            store_listener,
            history_listener,
            scroll_listener,
        });
        Ok(())
    }

    /// Remove every listener and pending timer, and drop the history.
    pub fn unmount(&mut self) -> Result<()> {
        let mounted = self.mounted.take().ok_or(RouterError::NotMounted)?;

        mounted.session.history.off(mounted.history_listener);
        self.store.remove_change_listener(mounted.store_listener);
        if let Some(id) = mounted.scroll_listener {
            self.window.remove_event_listener(EventKind::Scroll, id);
        }
        mounted.session.cancel_timers();

        tracing::info!("Router unmounted");
        Ok(())
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        if self.mounted.is_some() {
            let _ = self.unmount();
        }
    }
}
