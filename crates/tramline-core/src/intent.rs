//! Navigation intents and routes

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What started a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationType {
    /// Link click handled by the router
    Click,
    /// Browser back/forward
    PopState,
    /// URL found on first load that the store does not reflect yet
    PageLoad,
    /// Programmatic navigation
    Default,
}

impl NavigationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationType::Click => "click",
            NavigationType::PopState => "popstate",
            NavigationType::PageLoad => "pageload",
            NavigationType::Default => "default",
        }
    }

    /// Whether the resulting route change must be written to history
    pub fn writes_history(&self) -> bool {
        matches!(self, NavigationType::Click | NavigationType::Default)
    }
}

impl std::fmt::Display for NavigationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NavigationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "click" => Ok(NavigationType::Click),
            "popstate" => Ok(NavigationType::PopState),
            "pageload" => Ok(NavigationType::PageLoad),
            "default" => Ok(NavigationType::Default),
            _ => Err(format!("Unknown navigation type: {}", s)),
        }
    }
}

/// Request handed to the dispatcher to change the current route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationIntent {
    #[serde(rename = "type")]
    pub nav_type: NavigationType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl NavigationIntent {
    pub fn new(nav_type: NavigationType, url: impl Into<String>) -> Self {
        Self {
            nav_type,
            url: url.into(),
            path: None,
            params: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_params(mut self, params: Option<Value>) -> Self {
        self.params = params;
        self
    }
}

/// A matched route as reported by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: Option<String>,
    pub url: String,
    #[serde(default)]
    pub params: Value,
}

impl Route {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: None,
            url: url.into(),
            params: Value::Object(Default::default()),
        }
    }

    pub fn named(name: impl Into<String>, url: impl Into<String>, params: Value) -> Self {
        Self {
            name: Some(name.into()),
            url: url.into(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_navigation_type_names() {
        assert_eq!(NavigationType::PopState.to_string(), "popstate");
        assert_eq!("PageLoad".parse::<NavigationType>(), Ok(NavigationType::PageLoad));
        assert!("reload".parse::<NavigationType>().is_err());
        assert!(NavigationType::Default.writes_history());
        assert!(!NavigationType::PageLoad.writes_history());
    }

    #[test]
    fn test_intent_wire_format() {
        let intent = NavigationIntent::new(NavigationType::Click, "/foo?x=1")
            .with_path("/foo")
            .with_params(Some(json!({"a": 1})));
        assert_eq!(
            serde_json::to_value(&intent).unwrap(),
            json!({"type": "click", "url": "/foo?x=1", "path": "/foo", "params": {"a": 1}})
        );

        let intent: NavigationIntent =
            serde_json::from_value(json!({"type": "pageload", "url": "/"})).unwrap();
        assert_eq!(intent, NavigationIntent::new(NavigationType::PageLoad, "/"));
    }
}
