#[cfg(target_arch = "wasm32")]
mod wasm_browser_tests {
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;
    use tramline_core::{
        History, HistoryMode, NavigationIntent, Router, RouterConfig, StaticRouteStore,
    };
    use tramline_history::{EventKind, TimerId, Window, WindowEvent};
    use tramline_web::BrowserWindow;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_detects_push_state() {
        let window = BrowserWindow::new().unwrap();
        assert!(window.has_push_state());
        assert!(window.location().protocol.ends_with(':'));
    }

    #[wasm_bindgen_test]
    fn test_push_and_replace_state_round_trip() {
        let window = BrowserWindow::new().unwrap();
        window
            .push_state(Some(&json!({"params": {"a": 1}})), None, "/tramline-push?x=1")
            .unwrap();
        assert_eq!(window.location().pathname, "/tramline-push");
        assert_eq!(window.location().search, "?x=1");
        assert_eq!(window.history_state(), Some(json!({"params": {"a": 1}})));

        window
            .replace_state(Some(&json!({"scroll": {"x": 0.0, "y": 5.0}})), None, None)
            .unwrap();
        assert_eq!(window.location().pathname, "/tramline-push");
        assert_eq!(
            window.history_state(),
            Some(json!({"scroll": {"x": 0.0, "y": 5.0}}))
        );
    }

    #[wasm_bindgen_test]
    fn test_listener_add_and_remove() {
        let window = BrowserWindow::new().unwrap();
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        let id = window.add_event_listener(
            EventKind::Scroll,
            Rc::new(move |_: &WindowEvent| sink.set(sink.get() + 1)),
        );
        window.remove_event_listener(EventKind::Scroll, id);
        assert_eq!(count.get(), 0);
    }

    #[wasm_bindgen_test]
    fn test_timer_handles_are_positive() {
        let window = BrowserWindow::new().unwrap();
        let fired = Rc::new(Cell::new(false));
        let sink = fired.clone();
        let id = window.set_timeout(Duration::from_millis(10), Box::new(move || sink.set(true)));
        assert!(id.raw() > 0);
        window.clear_timeout(id);

        // clearing the unscheduled id leaves live timers alone
        window.clear_timeout(TimerId::new(0));
        assert!(!fired.get());
    }

    #[wasm_bindgen_test]
    fn test_history_uses_native_mode() {
        let history = History::new(Rc::new(BrowserWindow::new().unwrap()));
        assert_eq!(history.mode(), HistoryMode::Native);
        assert_eq!(history.change_event(), EventKind::PopState);
    }

    #[wasm_bindgen_test]
    fn test_router_mounts_on_browser() {
        let window = Rc::new(BrowserWindow::new().unwrap());
        let store = Rc::new(StaticRouteStore::new().with_route("home", "/"));
        let mut router = Router::new(
            window,
            store,
            Rc::new(|_: NavigationIntent| {}),
            RouterConfig::default(),
        );
        router.mount().unwrap();
        assert!(router.is_mounted());
        router.unmount().unwrap();
    }
}
