//! Collaborator seams and a static route store
//!
//! The router never owns routing state. It reads the current route from a
//! `RouteStore`, asks a `Dispatcher` to navigate and hands the route to a
//! `RouteRenderer`.

use serde_json::{Map, Value};
use std::cell::RefCell;
use std::rc::Rc;

use tramline_history::ListenerId;
use tramline_url::parse_url_path;

use crate::intent::{NavigationIntent, Route};

/// Callback for store changes
pub type ChangeListener = Rc<dyn Fn()>;

pub trait RouteStore {
    fn current_route(&self) -> Option<Route>;

    /// Intent that produced the current route
    fn current_navigate(&self) -> Option<NavigationIntent>;

    fn add_change_listener(&self, listener: ChangeListener) -> ListenerId;

    fn remove_change_listener(&self, id: ListenerId);

    /// Whether `href` is the current route's URL
    fn is_active(&self, href: &str) -> bool;

    /// Build the URL of a named route
    fn make_path(&self, name: &str, params: Option<&Value>) -> Option<String>;
}

pub trait Dispatcher {
    fn execute_action(&self, intent: NavigationIntent);
}

impl<F> Dispatcher for F
where
    F: Fn(NavigationIntent),
{
    fn execute_action(&self, intent: NavigationIntent) {
        self(intent)
    }
}

pub trait RouteRenderer {
    fn render(&self, route: Option<&Route>);
}

impl<F> RouteRenderer for F
where
    F: Fn(Option<&Route>),
{
    fn render(&self, route: Option<&Route>) {
        self(route)
    }
}

#[derive(Debug, Clone)]
struct RouteDef {
    name: String,
    segments: Vec<String>,
}

impl RouteDef {
    fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            segments: split_path(pattern),
        }
    }

    fn matches(&self, segments: &[String]) -> Option<Map<String, Value>> {
        if self.segments.len() != segments.len() {
            return None;
        }
        let mut params = Map::new();
        for (pattern, segment) in self.segments.iter().zip(segments) {
            match pattern.strip_prefix(':') {
                Some(key) => {
                    params.insert(key.to_string(), Value::String(segment.clone()));
                }
                None if pattern == segment => {}
                None => return None,
            }
        }
        Some(params)
    }

    fn build(&self, params: Option<&Value>) -> Option<String> {
        let mut path = String::new();
        for segment in &self.segments {
            let part = match segment.strip_prefix(':') {
                Some(key) => match params?.get(key)? {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                },
                None => segment.clone(),
            };
            path.push('/');
            path.push_str(&part);
        }
        if path.is_empty() {
            path.push('/');
        }
        Some(path)
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Default)]
struct StoreState {
    routes: Vec<RouteDef>,
    current_route: Option<Route>,
    current_navigate: Option<NavigationIntent>,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_id: u64,
}

/// `RouteStore` over a fixed table of named `/path/:param` routes
#[derive(Default)]
pub struct StaticRouteStore {
    state: RefCell<StoreState>,
}

impl StaticRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(self, name: &str, pattern: &str) -> Self {
        self.state
            .borrow_mut()
            .routes
            .push(RouteDef::new(name, pattern));
        self
    }

    /// Start at `url` without notifying listeners, as after server rendering
    pub fn with_current_url(self, url: &str) -> Self {
        let route = self.match_url(url);
        self.state.borrow_mut().current_route = Some(route);
        self
    }

    /// Match `url` against the table. Unknown URLs give an unnamed route.
    pub fn match_url(&self, url: &str) -> Route {
        let segments = parse_url_path(url)
            .map(|path| split_path(&path))
            .unwrap_or_default();
        let state = self.state.borrow();
        state
            .routes
            .iter()
            .find_map(|def| {
                def.matches(&segments)
                    .map(|params| Route::named(def.name.clone(), url, Value::Object(params)))
            })
            .unwrap_or_else(|| Route::new(url))
    }

    /// Apply a navigation and notify change listeners
    pub fn handle_navigate(&self, intent: &NavigationIntent) {
        let route = self.match_url(&intent.url);
        tracing::debug!(
            nav_type = %intent.nav_type,
            url = %intent.url,
            route = ?route.name,
            "Route store navigate"
        );

        let listeners: Vec<ChangeListener> = {
            let mut state = self.state.borrow_mut();
            state.current_route = Some(route);
            state.current_navigate = Some(intent.clone());
            state.listeners.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

impl RouteStore for StaticRouteStore {
    fn current_route(&self) -> Option<Route> {
        self.state.borrow().current_route.clone()
    }

    fn current_navigate(&self) -> Option<NavigationIntent> {
        self.state.borrow().current_navigate.clone()
    }

    fn add_change_listener(&self, listener: ChangeListener) -> ListenerId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = ListenerId::new(state.next_id);
        state.listeners.push((id, listener));
        id
    }

    fn remove_change_listener(&self, id: ListenerId) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|(existing, _)| *existing != id);
    }

    fn is_active(&self, href: &str) -> bool {
        self.state
            .borrow()
            .current_route
            .as_ref()
            .is_some_and(|route| route.url == href)
    }

    fn make_path(&self, name: &str, params: Option<&Value>) -> Option<String> {
        let state = self.state.borrow();
        let def = state.routes.iter().find(|def| def.name == name)?;
        def.build(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::NavigationType;
    use serde_json::json;
    use std::cell::Cell;

    fn store() -> StaticRouteStore {
        StaticRouteStore::new()
            .with_route("home", "/")
            .with_route("foo", "/foo")
            .with_route("user", "/user/:id")
            .with_route("post", "/user/:id/post/:post")
    }

    #[test]
    fn test_make_path() {
        let store = store();
        assert_eq!(store.make_path("home", None).as_deref(), Some("/"));
        assert_eq!(store.make_path("foo", None).as_deref(), Some("/foo"));
        assert_eq!(
            store
                .make_path("post", Some(&json!({"id": "ann", "post": 7})))
                .as_deref(),
            Some("/user/ann/post/7")
        );
        assert_eq!(store.make_path("user", None), None);
        assert_eq!(store.make_path("missing", None), None);
    }

    #[test]
    fn test_match_url() {
        let store = store();
        let route = store.match_url("/user/ann/?tab=1");
        assert_eq!(route.name.as_deref(), Some("user"));
        assert_eq!(route.url, "/user/ann/?tab=1");
        assert_eq!(route.params, json!({"id": "ann"}));

        let route = store.match_url("/nowhere");
        assert_eq!(route.name, None);
        assert_eq!(route.url, "/nowhere");
    }

    #[test]
    fn test_handle_navigate_notifies() {
        let store = store().with_current_url("/");
        assert!(store.is_active("/"));

        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        let id = store.add_change_listener(Rc::new(move || sink.set(sink.get() + 1)));

        store.handle_navigate(&NavigationIntent::new(NavigationType::Click, "/foo"));
        assert_eq!(count.get(), 1);
        assert!(store.is_active("/foo"));
        assert!(!store.is_active("/"));
        assert_eq!(
            store.current_navigate().map(|n| n.nav_type),
            Some(NavigationType::Click)
        );

        store.remove_change_listener(id);
        store.handle_navigate(&NavigationIntent::new(NavigationType::Click, "/"));
        assert_eq!(count.get(), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_closures_as_collaborators() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let dispatcher = move |intent: NavigationIntent| sink.borrow_mut().push(intent.url);
        dispatcher.execute_action(NavigationIntent::new(NavigationType::Default, "/a"));
        assert_eq!(*seen.borrow(), vec!["/a".to_string()]);

        let rendered = Rc::new(Cell::new(false));
        let flag = rendered.clone();
        let renderer = move |route: Option<&Route>| flag.set(route.is_some());
        renderer.render(Some(&Route::new("/")));
        assert!(rendered.get());
    }
}
