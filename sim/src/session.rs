//! Scripted navigation session over `MemoryWindow`

use serde::Serialize;
use std::rc::Rc;
use std::time::Duration;

use tramline_core::{
    ClickEvent, ClickOutcome, Dispatcher, HistoryCall, MemoryWindow, NavLink, NavigationIntent,
    RouteStore, Router, RouterConfig, ScrollPosition, StaticRouteStore, Window,
};

use crate::script::Step;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// URL the browser starts at
    pub start_url: String,
    /// Route the store holds before the first navigation. Defaults to the
    /// path and query of `start_url`.
    pub server_route: Option<String>,
    /// Browser without `pushState`
    pub legacy: bool,
    /// Named routes as `(name, pattern)`
    pub routes: Vec<(String, String)>,
    pub config: RouterConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            start_url: "http://localhost/".to_string(),
            server_route: None,
            legacy: false,
            routes: Vec::new(),
            config: RouterConfig::default(),
        }
    }
}

/// What one step did
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: String,
    pub href: String,
    pub route: Option<String>,
    pub scroll: ScrollPosition,
    pub calls: Vec<HistoryCall>,
    /// Set when the browser handled a click itself
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub browser_default: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub mode: String,
    pub steps: Vec<StepReport>,
    pub page_loads: Vec<String>,
}

pub struct Session {
    window: Rc<MemoryWindow>,
    store: Rc<StaticRouteStore>,
    dispatcher: Rc<dyn Dispatcher>,
    router: Router,
}

impl Session {
    pub fn new(options: SessionOptions) -> anyhow::Result<Self> {
        let window = Rc::new(if options.legacy {
            MemoryWindow::legacy(&options.start_url)?
        } else {
            MemoryWindow::new(&options.start_url)?
        });

        let server_route = options
            .server_route
            .clone()
            .unwrap_or_else(|| window.location().path_and_query());
        let store = options
            .routes
            .iter()
            .fold(StaticRouteStore::new(), |store, (name, pattern)| {
                store.with_route(name, pattern)
            })
            .with_current_url(&server_route);
        let store = Rc::new(store);

        let dispatcher: Rc<dyn Dispatcher> = {
            let store = store.clone();
            Rc::new(move |intent: NavigationIntent| store.handle_navigate(&intent))
        };

        let mut router = Router::new(
            window.clone(),
            store.clone(),
            dispatcher.clone(),
            options.config,
        );
        router.mount()?;
        window.run_pending();

        Ok(Self {
            window,
            store,
            dispatcher,
            router,
        })
    }

    pub fn window(&self) -> &MemoryWindow {
        &self.window
    }

    pub fn run_step(&mut self, step: &Step) -> anyhow::Result<StepReport> {
        tracing::debug!(step = %step, "Running step");
        let mut browser_default = false;

        match step {
            Step::Click { href, params } => {
                let mut link = NavLink::to(href.as_str());
                if let Some(params) = params {
                    link = link.with_params(params.clone());
                }
                let outcome = link.handle_click(
                    &ClickEvent::primary(),
                    &self.window.location(),
                    self.store.as_ref(),
                    Some(self.dispatcher.as_ref()),
                )?;
                if outcome == ClickOutcome::BrowserDefault {
                    browser_default = true;
                    self.window.assign(href)?;
                }
            }
            Step::Navigate { url } => self.router.navigate(url, None),
            Step::Back => {
                self.window.back();
            }
            Step::Forward => {
                self.window.forward();
            }
            Step::Scroll { x, y } => self.window.user_scroll(*x, *y),
            Step::Wait { millis } => self.window.advance(Duration::from_millis(*millis)),
        }
        self.window.run_pending();

        Ok(StepReport {
            step: step.to_string(),
            href: self.window.href(),
            route: self.store.current_route().map(|route| route.url),
            scroll: self.window.scroll_position(),
            calls: self.window.take_calls(),
            browser_default,
        })
    }

    pub fn run(mut self, steps: &[Step]) -> anyhow::Result<SessionReport> {
        let mut reports = Vec::with_capacity(steps.len());
        for step in steps {
            reports.push(self.run_step(step)?);
        }

        let mode = self
            .router
            .history()
            .map(|history| history.mode().to_string())
            .unwrap_or_default();
        self.router.unmount()?;

        Ok(SessionReport {
            mode,
            steps: reports,
            page_loads: self.window.page_loads(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_script;
    use serde_json::json;

    fn options() -> SessionOptions {
        SessionOptions {
            routes: vec![
                ("home".to_string(), "/".to_string()),
                ("foo".to_string(), "/foo".to_string()),
                ("bar".to_string(), "/bar".to_string()),
            ],
            ..SessionOptions::default()
        }
    }

    #[test]
    fn test_click_and_back() {
        let steps = parse_script("click /foo {\"pageTitle\": \"Foo\"}\nback").unwrap();
        let report = Session::new(options()).unwrap().run(&steps).unwrap();

        assert_eq!(report.mode, "native");
        assert_eq!(report.steps[0].href, "http://localhost/foo");
        assert_eq!(
            report.steps[0].calls,
            vec![HistoryCall::push(
                Some(json!({"params": {"pageTitle": "Foo"}, "scroll": {"x": 0.0, "y": 0.0}})),
                Some("Foo"),
                "/foo"
            )]
        );
        assert_eq!(report.steps[1].route.as_deref(), Some("/"));
        assert!(report.steps[1].calls.is_empty());
    }

    #[test]
    fn test_scroll_is_restored_on_back() {
        let steps = parse_script("click /foo\nscroll 0 300\nwait 200\nclick /bar\nback").unwrap();
        let report = Session::new(options()).unwrap().run(&steps).unwrap();

        assert_eq!(report.steps[2].calls.len(), 1);
        assert_eq!(report.steps[3].scroll, ScrollPosition::default());
        assert_eq!(report.steps[4].scroll, ScrollPosition::new(0.0, 300.0));
    }

    #[test]
    fn test_external_click_loads_page() {
        let steps = parse_script("click https://elsewhere.org/").unwrap();
        let report = Session::new(options()).unwrap().run(&steps).unwrap();

        assert!(report.steps[0].browser_default);
        assert_eq!(report.page_loads, vec!["https://elsewhere.org/".to_string()]);
    }

    #[test]
    fn test_legacy_browser_uses_hash() {
        let options = SessionOptions {
            start_url: "http://localhost/app".to_string(),
            legacy: true,
            ..options()
        };
        let steps = parse_script("click /foo").unwrap();
        let report = Session::new(options).unwrap().run(&steps).unwrap();

        assert_eq!(report.mode, "hash_emulated");
        assert_eq!(report.steps[0].href, "http://localhost/app#/foo");
    }

    #[test]
    fn test_page_load_check_at_start() {
        let options = SessionOptions {
            start_url: "http://localhost/foo".to_string(),
            server_route: Some("/".to_string()),
            config: RouterConfig {
                check_route_on_page_load: true,
                ..RouterConfig::default()
            },
            ..options()
        };
        let session = Session::new(options).unwrap();
        assert!(session.window().calls().is_empty());
        assert_eq!(
            session.store.current_route().map(|route| route.url),
            Some("/foo".to_string())
        );
    }
}
