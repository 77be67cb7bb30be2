//! Construction options for `History`

use std::fmt;
use std::rc::Rc;

use crate::window::Window;

/// Rewrites routes to and from a custom fragment syntax.
///
/// For example `/about/this/path` ↔ `about-this-path`. Both directions
/// default to the identity.
pub trait HashRouteTransformer {
    /// Route path → fragment text written into the URL
    fn transform(&self, url: &str) -> String {
        url.to_string()
    }

    /// Fragment text read from the URL → route path
    fn reverse(&self, hash: &str) -> String {
        hash.to_string()
    }
}

/// Transformer built from a pair of closures
pub struct FnTransformer<T, R> {
    transform: T,
    reverse: R,
}

impl<T, R> FnTransformer<T, R>
where
    T: Fn(&str) -> String,
    R: Fn(&str) -> String,
{
    pub fn new(transform: T, reverse: R) -> Self {
        Self { transform, reverse }
    }
}

impl<T, R> HashRouteTransformer for FnTransformer<T, R>
where
    T: Fn(&str) -> String,
    R: Fn(&str) -> String,
{
    fn transform(&self, url: &str) -> String {
        (self.transform)(url)
    }

    fn reverse(&self, hash: &str) -> String {
        (self.reverse)(hash)
    }
}

/// Whether routes live in the URL fragment
#[derive(Default)]
pub enum UseHashRoute {
    /// Hash routing exactly when `pushState` is missing
    #[default]
    Auto,
    Fixed(bool),
    /// Decided by inspecting the window once, at construction
    Predicate(Box<dyn Fn(&dyn Window) -> bool>),
}

impl UseHashRoute {
    pub fn predicate(f: impl Fn(&dyn Window) -> bool + 'static) -> Self {
        UseHashRoute::Predicate(Box::new(f))
    }

    pub(crate) fn resolve(&self, window: &dyn Window, has_push_state: bool) -> bool {
        match self {
            UseHashRoute::Auto => !has_push_state,
            UseHashRoute::Fixed(value) => *value,
            UseHashRoute::Predicate(f) => f(window),
        }
    }
}

impl From<bool> for UseHashRoute {
    fn from(value: bool) -> Self {
        UseHashRoute::Fixed(value)
    }
}

impl From<Option<bool>> for UseHashRoute {
    fn from(value: Option<bool>) -> Self {
        value.map_or(UseHashRoute::Auto, UseHashRoute::Fixed)
    }
}

impl fmt::Debug for UseHashRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UseHashRoute::Auto => f.write_str("Auto"),
            UseHashRoute::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            UseHashRoute::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[derive(Default)]
pub struct HistoryOptions {
    pub use_hash_route: UseHashRoute,
    pub hash_route_transformer: Option<Rc<dyn HashRouteTransformer>>,
}

impl HistoryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hash_route(mut self, use_hash_route: impl Into<UseHashRoute>) -> Self {
        self.use_hash_route = use_hash_route.into();
        self
    }

    pub fn with_transformer(mut self, transformer: impl HashRouteTransformer + 'static) -> Self {
        self.hash_route_transformer = Some(Rc::new(transformer));
        self
    }
}

impl fmt::Debug for HistoryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryOptions")
            .field("use_hash_route", &self.use_hash_route)
            .field("has_transformer", &self.hash_route_transformer.is_some())
            .finish()
    }
}
