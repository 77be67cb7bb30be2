//! In-memory window
//!
//! A deterministic `Window` with a session history stack, a virtual clock
//! and a log of every history call. Used by the test suites and the
//! simulator binary.

use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::error::HistoryError;
use crate::window::{
    EventKind, Listener, ListenerId, Location, ScrollPosition, TimerCallback, TimerId, Window,
    WindowEvent,
};
use crate::Result;

/// A history or location call as the window received it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryCall {
    Push {
        state: Option<Value>,
        title: Option<String>,
        url: String,
    },
    Replace {
        state: Option<Value>,
        title: Option<String>,
        url: Option<String>,
    },
    Assign(String),
    ReplaceLocation(String),
}

impl HistoryCall {
    pub fn push(state: Option<Value>, title: Option<&str>, url: &str) -> Self {
        HistoryCall::Push {
            state,
            title: title.map(str::to_string),
            url: url.to_string(),
        }
    }

    pub fn replace(state: Option<Value>, title: Option<&str>, url: Option<&str>) -> Self {
        HistoryCall::Replace {
            state,
            title: title.map(str::to_string),
            url: url.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    url: Url,
    state: Option<Value>,
    /// Entries created by `pushState` or fragment navigation share the
    /// document of the entry they came from
    document: u64,
}

enum Task {
    Timer(TimerCallback),
    Event(WindowEvent),
}

struct Pending {
    id: TimerId,
    due: Duration,
    task: Task,
}

struct Inner {
    push_state_supported: bool,
    entries: Vec<Entry>,
    index: usize,
    scroll: ScrollPosition,
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
    pending: Vec<Pending>,
    calls: Vec<HistoryCall>,
    page_loads: Vec<String>,
    now: Duration,
    next_id: u64,
}

impl Inner {
    fn current(&self) -> &Entry {
        &self.entries[self.index]
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        self.current()
            .url
            .join(url)
            .map_err(|e| HistoryError::InvalidUrl(format!("{}: {}", url, e)))
    }

    fn push_entry(&mut self, entry: Entry) {
        self.entries.truncate(self.index + 1);
        self.entries.push(entry);
        self.index = self.entries.len() - 1;
    }

    fn schedule(&mut self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId::new(self.next_id());
        let due = self.now + delay;
        self.pending.push(Pending { id, due, task });
        id
    }

    /// Earliest task due at or before `limit`; ties run in scheduling order
    fn take_due(&mut self, limit: Duration) -> Option<Pending> {
        let position = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= limit)
            .min_by_key(|(_, p)| (p.due, p.id))
            .map(|(i, _)| i)?;
        Some(self.pending.remove(position))
    }
}

fn same_document(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

fn fragment_of(url: &Url) -> &str {
    url.fragment().unwrap_or("")
}

fn location_of(url: &Url) -> Location {
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    Location {
        protocol: format!("{}:", url.scheme()),
        host,
        pathname: url.path().to_string(),
        search: url
            .query()
            .filter(|q| !q.is_empty())
            .map(|q| format!("?{}", q))
            .unwrap_or_default(),
        hash: url
            .fragment()
            .filter(|f| !f.is_empty())
            .map(|f| format!("#{}", f))
            .unwrap_or_default(),
    }
}

pub struct MemoryWindow {
    inner: RefCell<Inner>,
}

impl MemoryWindow {
    /// Window with `pushState` support, starting at `href`
    pub fn new(href: &str) -> Result<Self> {
        Self::build(href, true)
    }

    /// Window without `pushState`, starting at `href`
    pub fn legacy(href: &str) -> Result<Self> {
        Self::build(href, false)
    }

    fn build(href: &str, push_state_supported: bool) -> Result<Self> {
        let url =
            Url::parse(href).map_err(|e| HistoryError::InvalidUrl(format!("{}: {}", href, e)))?;
        Ok(Self {
            inner: RefCell::new(Inner {
                push_state_supported,
                entries: vec![Entry {
                    url,
                    state: None,
                    document: 0,
                }],
                index: 0,
                scroll: ScrollPosition::default(),
                listeners: HashMap::new(),
                pending: Vec::new(),
                calls: Vec::new(),
                page_loads: Vec::new(),
                now: Duration::ZERO,
                next_id: 0,
            }),
        })
    }

    pub fn href(&self) -> String {
        self.inner.borrow().current().url.to_string()
    }

    pub fn entry_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn index(&self) -> usize {
        self.inner.borrow().index
    }

    pub fn calls(&self) -> Vec<HistoryCall> {
        self.inner.borrow().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<HistoryCall> {
        std::mem::take(&mut self.inner.borrow_mut().calls)
    }

    /// Full-document navigations, by absolute URL
    pub fn page_loads(&self) -> Vec<String> {
        self.inner.borrow().page_loads.clone()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(&kind)
            .map_or(0, Vec::len)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Virtual time elapsed since creation
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    pub fn back(&self) -> bool {
        self.go(-1)
    }

    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Traverse the session history like the browser's back/forward buttons.
    ///
    /// `popstate` fires right away when supported; `hashchange` is queued
    /// when the fragment changed. Returns false when `delta` is out of range.
    pub fn go(&self, delta: isize) -> bool {
        let popstate = {
            let mut inner = self.inner.borrow_mut();
            let target = inner.index as isize + delta;
            if delta == 0 || target < 0 || target >= inner.entries.len() as isize {
                return false;
            }

            let from = inner.current().clone();
            inner.index = target as usize;
            let to = inner.current().clone();
            tracing::debug!(delta, url = %to.url, "Traversing history");

            if from.document != to.document {
                inner.page_loads.push(to.url.to_string());
                return true;
            }
            if fragment_of(&from.url) != fragment_of(&to.url) {
                inner.schedule(Duration::ZERO, Task::Event(WindowEvent::new(EventKind::HashChange)));
            }
            inner
                .push_state_supported
                .then(|| WindowEvent::with_state(EventKind::PopState, to.state))
        };

        if let Some(event) = popstate {
            self.dispatch(&event);
        }
        true
    }

    /// Scroll as the user would, firing a `scroll` event
    pub fn user_scroll(&self, x: f64, y: f64) {
        self.inner.borrow_mut().scroll = ScrollPosition::new(x, y);
        self.dispatch(&WindowEvent::new(EventKind::Scroll));
    }

    /// Move the virtual clock forward, running everything that falls due
    pub fn advance(&self, by: Duration) {
        let limit = self.inner.borrow().now + by;
        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                let next = inner.take_due(limit);
                if let Some(pending) = &next {
                    inner.now = pending.due;
                }
                next
            };
            match next {
                Some(Pending { task, .. }) => match task {
                    Task::Timer(callback) => callback(),
                    Task::Event(event) => self.dispatch(&event),
                },
                None => break,
            }
        }
        self.inner.borrow_mut().now = limit;
    }

    /// Run whatever is due now
    pub fn run_pending(&self) {
        self.advance(Duration::ZERO);
    }

    fn dispatch(&self, event: &WindowEvent) {
        let listeners: Vec<Listener> = self
            .inner
            .borrow()
            .listeners
            .get(&event.kind)
            .map(|l| l.iter().map(|(_, listener)| listener.clone()).collect())
            .unwrap_or_default();
        for listener in listeners {
            listener(event);
        }
    }

    fn navigate(&self, url: &str, replace: bool) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let target = inner.resolve(url)?;
        let from = inner.current().clone();
        let reload = !same_document(&from.url, &target);
        let document = if reload {
            inner.next_id()
        } else {
            from.document
        };
        let entry = Entry {
            url: target.clone(),
            state: None,
            document,
        };
        if replace {
            let index = inner.index;
            inner.entries[index] = entry;
        } else {
            inner.push_entry(entry);
        }

        if reload {
            tracing::debug!(url = %target, "Page load");
            inner.page_loads.push(target.to_string());
        } else if fragment_of(&from.url) != fragment_of(&target) {
            inner.schedule(Duration::ZERO, Task::Event(WindowEvent::new(EventKind::HashChange)));
        }
        Ok(())
    }
}

impl Window for MemoryWindow {
    fn has_push_state(&self) -> bool {
        self.inner.borrow().push_state_supported
    }

    fn location(&self) -> Location {
        location_of(&self.inner.borrow().current().url)
    }

    fn history_state(&self) -> Option<Value> {
        self.inner.borrow().current().state.clone()
    }

    fn push_state(&self, state: Option<&Value>, title: Option<&str>, url: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner
            .calls
            .push(HistoryCall::push(state.cloned(), title, url));
        if !inner.push_state_supported {
            return Err(HistoryError::Unsupported("pushState"));
        }

        let target = inner.resolve(url)?;
        if target.origin() != inner.current().url.origin() {
            return Err(HistoryError::Native(format!(
                "pushState to another origin: {}",
                target
            )));
        }
        let document = inner.current().document;
        inner.push_entry(Entry {
            url: target,
            state: state.cloned(),
            document,
        });
        Ok(())
    }

    fn replace_state(
        &self,
        state: Option<&Value>,
        title: Option<&str>,
        url: Option<&str>,
    ) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner
            .calls
            .push(HistoryCall::replace(state.cloned(), title, url));
        if !inner.push_state_supported {
            return Err(HistoryError::Unsupported("replaceState"));
        }

        let target = match url {
            Some(url) => inner.resolve(url)?,
            None => inner.current().url.clone(),
        };
        if target.origin() != inner.current().url.origin() {
            return Err(HistoryError::Native(format!(
                "replaceState to another origin: {}",
                target
            )));
        }
        let index = inner.index;
        let document = inner.current().document;
        inner.entries[index] = Entry {
            url: target,
            state: state.cloned(),
            document,
        };
        Ok(())
    }

    fn assign(&self, url: &str) -> Result<()> {
        self.inner
            .borrow_mut()
            .calls
            .push(HistoryCall::Assign(url.to_string()));
        self.navigate(url, false)
    }

    fn replace_location(&self, url: &str) -> Result<()> {
        self.inner
            .borrow_mut()
            .calls
            .push(HistoryCall::ReplaceLocation(url.to_string()));
        self.navigate(url, true)
    }

    fn add_event_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId::new(inner.next_id());
        inner.listeners.entry(kind).or_default().push((id, listener));
        id
    }

    fn remove_event_listener(&self, kind: EventKind, id: ListenerId) {
        if let Some(listeners) = self.inner.borrow_mut().listeners.get_mut(&kind) {
            listeners.retain(|(existing, _)| *existing != id);
        }
    }

    fn scroll_position(&self) -> ScrollPosition {
        self.inner.borrow().scroll
    }

    fn scroll_to(&self, x: f64, y: f64) {
        self.inner.borrow_mut().scroll = ScrollPosition::new(x, y);
    }

    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        self.inner
            .borrow_mut()
            .schedule(delay, Task::Timer(callback))
    }

    fn clear_timeout(&self, id: TimerId) {
        self.inner.borrow_mut().pending.retain(|p| p.id != id);
    }
}

impl std::fmt::Debug for MemoryWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MemoryWindow")
            .field("href", &inner.current().url.as_str())
            .field("index", &inner.index)
            .field("entries", &inner.entries.len())
            .field("now", &inner.now)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter(window: &MemoryWindow, kind: EventKind) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        window.add_event_listener(kind, Rc::new(move |_: &WindowEvent| sink.set(sink.get() + 1)));
        count
    }

    #[test]
    fn test_invalid_start_url() {
        assert!(matches!(
            MemoryWindow::new("not a url"),
            Err(HistoryError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_location_fields() {
        let window = MemoryWindow::new("https://example.com:8443/a/b?x=1#frag").unwrap();
        let location = window.location();
        assert_eq!(location.protocol, "https:");
        assert_eq!(location.host, "example.com:8443");
        assert_eq!(location.pathname, "/a/b");
        assert_eq!(location.search, "?x=1");
        assert_eq!(location.hash, "#frag");

        let window = MemoryWindow::new("http://example.com/a?#").unwrap();
        assert_eq!(window.location().search, "");
        assert_eq!(window.location().hash, "");
    }

    #[test]
    fn test_push_state_truncates_forward_entries() {
        let window = MemoryWindow::new("http://example.com/").unwrap();
        window.push_state(Some(&json!(1)), None, "/a").unwrap();
        window.push_state(Some(&json!(2)), None, "/b").unwrap();
        assert!(window.back());
        window.push_state(Some(&json!(3)), None, "/c").unwrap();

        assert_eq!(window.entry_count(), 3);
        assert_eq!(window.href(), "http://example.com/c");
        assert!(!window.forward());
    }

    #[test]
    fn test_push_state_rejects_other_origin() {
        let window = MemoryWindow::new("http://example.com/").unwrap();
        let result = window.push_state(None, None, "http://other.com/");
        assert!(matches!(result, Err(HistoryError::Native(_))));
        assert_eq!(window.entry_count(), 1);
    }

    #[test]
    fn test_legacy_rejects_push_state() {
        let window = MemoryWindow::legacy("http://example.com/").unwrap();
        assert_eq!(
            window.push_state(None, None, "/a"),
            Err(HistoryError::Unsupported("pushState"))
        );
        assert_eq!(window.calls().len(), 1);
    }

    #[test]
    fn test_back_fires_popstate_with_state() {
        let window = MemoryWindow::new("http://example.com/").unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        window.add_event_listener(
            EventKind::PopState,
            Rc::new(move |event: &WindowEvent| sink.borrow_mut().push(event.state.clone())),
        );

        window.push_state(Some(&json!({"n": 1})), None, "/a").unwrap();
        window.push_state(Some(&json!({"n": 2})), None, "/b").unwrap();
        assert!(seen.borrow().is_empty());

        window.back();
        assert_eq!(*seen.borrow(), vec![Some(json!({"n": 1}))]);
        assert_eq!(window.location().pathname, "/a");
    }

    #[test]
    fn test_fragment_navigation_queues_hashchange() {
        let window = MemoryWindow::legacy("http://example.com/page").unwrap();
        let hashchanges = counter(&window, EventKind::HashChange);

        window.assign("#/a").unwrap();
        assert_eq!(hashchanges.get(), 0);
        assert_eq!(window.pending_count(), 1);
        window.run_pending();
        assert_eq!(hashchanges.get(), 1);
        assert_eq!(window.entry_count(), 2);
        assert!(window.page_loads().is_empty());

        window.back();
        window.run_pending();
        assert_eq!(hashchanges.get(), 2);
        assert_eq!(window.location().hash, "");
    }

    #[test]
    fn test_document_navigation_is_a_page_load() {
        let window = MemoryWindow::legacy("http://example.com/page").unwrap();
        let hashchanges = counter(&window, EventKind::HashChange);

        window.assign("/other#x").unwrap();
        window.run_pending();
        assert_eq!(hashchanges.get(), 0);
        assert_eq!(window.page_loads(), vec!["http://example.com/other#x".to_string()]);

        window.replace_location("/third").unwrap();
        assert_eq!(window.entry_count(), 2);
        assert_eq!(window.href(), "http://example.com/third");
    }

    #[test]
    fn test_timers_run_in_due_order() {
        let window = MemoryWindow::new("http://example.com/").unwrap();
        let order = Rc::new(RefCell::new(Vec::new()));

        for (label, ms) in [("late", 20), ("early", 5), ("also-early", 5)] {
            let sink = order.clone();
            window.set_timeout(
                Duration::from_millis(ms),
                Box::new(move || sink.borrow_mut().push(label)),
            );
        }
        let sink = order.clone();
        let cancelled = window.set_timeout(
            Duration::from_millis(1),
            Box::new(move || sink.borrow_mut().push("cancelled")),
        );
        window.clear_timeout(cancelled);

        window.advance(Duration::from_millis(10));
        assert_eq!(*order.borrow(), vec!["early", "also-early"]);
        assert_eq!(window.now(), Duration::from_millis(10));

        window.advance(Duration::from_millis(10));
        assert_eq!(*order.borrow(), vec!["early", "also-early", "late"]);
        assert_eq!(window.pending_count(), 0);
    }

    #[test]
    fn test_timer_scheduled_from_timer() {
        let window = Rc::new(MemoryWindow::new("http://example.com/").unwrap());
        let fired = Rc::new(Cell::new(false));

        let inner_window = window.clone();
        let flag = fired.clone();
        window.set_timeout(
            Duration::from_millis(5),
            Box::new(move || {
                inner_window.set_timeout(Duration::from_millis(5), Box::new(move || flag.set(true)));
            }),
        );

        window.advance(Duration::from_millis(10));
        assert!(fired.get());
    }

    #[test]
    fn test_scrolling() {
        let window = MemoryWindow::new("http://example.com/").unwrap();
        let scrolls = counter(&window, EventKind::Scroll);

        window.user_scroll(0.0, 120.0);
        assert_eq!(scrolls.get(), 1);
        assert_eq!(window.scroll_position(), ScrollPosition::new(0.0, 120.0));

        window.scroll_to(0.0, 0.0);
        assert_eq!(scrolls.get(), 1);
        assert_eq!(window.scroll_position(), ScrollPosition::default());
    }

    #[test]
    fn test_remove_listener() {
        let window = MemoryWindow::new("http://example.com/").unwrap();
        let id = window.add_event_listener(EventKind::Scroll, Rc::new(|_: &WindowEvent| {}));
        assert_eq!(window.listener_count(EventKind::Scroll), 1);
        window.remove_event_listener(EventKind::Scroll, id);
        assert_eq!(window.listener_count(EventKind::Scroll), 0);
    }
}
