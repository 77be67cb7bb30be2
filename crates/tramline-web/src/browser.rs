//! `Window` over the browser's global window

use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use tramline_history::{
    EventKind, HistoryError, Listener, ListenerId, Location, Result, ScrollPosition,
    TimerCallback, TimerId, Window, WindowEvent,
};

use crate::convert::{from_js, js_error, to_js};

type EventClosure = Closure<dyn FnMut(web_sys::Event)>;

/// Returned when `setTimeout` throws. Browsers only hand out positive
/// handles, so this never names a live timer.
const UNSCHEDULED: u64 = 0;

pub struct BrowserWindow {
    window: web_sys::Window,
    has_push_state: bool,
    /// Registered closures; dropping one invalidates the JS callback
    listeners: RefCell<HashMap<ListenerId, (EventKind, EventClosure)>>,
    next_id: Cell<u64>,
}

impl BrowserWindow {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or(HistoryError::Unsupported("window"))?;
        let has_push_state = window
            .history()
            .ok()
            .and_then(|history| js_sys::Reflect::get(&history, &JsValue::from_str("pushState")).ok())
            .is_some_and(|push_state| push_state.is_function());

        tracing::debug!(has_push_state, "Browser window attached");

        Ok(Self {
            window,
            has_push_state,
            listeners: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        })
    }

    fn history(&self) -> Result<web_sys::History> {
        self.window
            .history()
            .map_err(|e| js_error("window.history", e))
    }

    fn event_state(kind: EventKind, event: &web_sys::Event) -> Option<Value> {
        if kind != EventKind::PopState {
            return None;
        }
        event
            .dyn_ref::<web_sys::PopStateEvent>()
            .and_then(|e| from_js(&e.state()))
    }
}

impl Window for BrowserWindow {
    fn has_push_state(&self) -> bool {
        self.has_push_state
    }

    fn location(&self) -> Location {
        let location = self.window.location();
        Location {
            protocol: location.protocol().unwrap_or_default(),
            host: location.host().unwrap_or_default(),
            pathname: location.pathname().unwrap_or_default(),
            search: location.search().unwrap_or_default(),
            hash: location.hash().unwrap_or_default(),
        }
    }

    fn history_state(&self) -> Option<Value> {
        let state = self.history().ok()?.state().ok()?;
        from_js(&state)
    }

    fn push_state(&self, state: Option<&Value>, title: Option<&str>, url: &str) -> Result<()> {
        let state = to_js(state)?;
        self.history()?
            .push_state_with_url(&state, title.unwrap_or(""), Some(url))
            .map_err(|e| js_error("history.pushState", e))
    }

    fn replace_state(
        &self,
        state: Option<&Value>,
        title: Option<&str>,
        url: Option<&str>,
    ) -> Result<()> {
        let state = to_js(state)?;
        self.history()?
            .replace_state_with_url(&state, title.unwrap_or(""), url)
            .map_err(|e| js_error("history.replaceState", e))
    }

    fn assign(&self, url: &str) -> Result<()> {
        self.window
            .location()
            .assign(url)
            .map_err(|e| js_error("location.assign", e))
    }

    fn replace_location(&self, url: &str) -> Result<()> {
        self.window
            .location()
            .replace(url)
            .map_err(|e| js_error("location.replace", e))
    }

    fn add_event_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId::new(self.next_id.get() + 1);
        self.next_id.set(id.raw());

        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let state = Self::event_state(kind, &event);
            listener(&WindowEvent::with_state(kind, state));
        }) as Box<dyn FnMut(_)>);

        if let Err(e) = self
            .window
            .add_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref())
        {
            tracing::warn!(event = %kind, error = ?e, "Failed to add event listener");
        }
        self.listeners.borrow_mut().insert(id, (kind, closure));
        id
    }

    fn remove_event_listener(&self, kind: EventKind, id: ListenerId) {
        let removed = self.listeners.borrow_mut().remove(&id);
        if let Some((registered, closure)) = removed {
            debug_assert_eq!(registered, kind);
            let _ = self.window.remove_event_listener_with_callback(
                registered.as_str(),
                closure.as_ref().unchecked_ref(),
            );
        }
    }

    fn scroll_position(&self) -> ScrollPosition {
        ScrollPosition::new(
            self.window.scroll_x().unwrap_or(0.0),
            self.window.scroll_y().unwrap_or(0.0),
        )
    }

    fn scroll_to(&self, x: f64, y: f64) {
        self.window.scroll_to_with_x_and_y(x, y);
    }

    /// The callback is dropped when scheduling fails; the returned id is then
    /// `UNSCHEDULED` and clearing it does nothing.
    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let closure = Closure::once_into_js(move || callback());
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(closure.unchecked_ref(), millis)
        {
            Ok(handle) => TimerId::new(handle as u64),
            Err(e) => {
                tracing::warn!(error = ?e, delay_ms = millis, "Failed to schedule timer, callback dropped");
                TimerId::new(UNSCHEDULED)
            }
        }
    }

    fn clear_timeout(&self, id: TimerId) {
        if id.raw() == UNSCHEDULED {
            return;
        }
        self.window.clear_timeout_with_handle(id.raw() as i32);
    }
}

impl Drop for BrowserWindow {
    fn drop(&mut self) {
        for (_, (kind, closure)) in self.listeners.borrow_mut().drain() {
            let _ = self
                .window
                .remove_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref());
        }
    }
}
