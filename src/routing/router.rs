//! Route registration and lookup.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Resolve (path, method) to a handler and typed parameters
//! - Return an explicit no-match rather than an error
//!
//! # Design Decisions
//! - Immutable after startup (shared via Arc, no locks)
//! - O(routes × segments) scan; route tables are small and static
//! - Overlapping patterns are decided purely by registration order

use std::collections::BTreeSet;

use crate::routing::converter::PathParams;
use crate::routing::pattern::PathPattern;
use crate::routing::split_path;

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route<H> {
    pattern: PathPattern,
    methods: BTreeSet<String>,
    handler: H,
}

impl<H> Route<H> {
    pub fn new<I, S>(path: &str, handler: H, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            pattern: PathPattern::compile(path),
            methods: methods
                .into_iter()
                .map(|m| m.as_ref().to_uppercase())
                .collect(),
            handler,
        }
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(String::as_str)
    }

    pub fn allows(&self, method: &str) -> bool {
        self.methods.contains(method)
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<'a, H> {
    pub handler: &'a H,
    pub params: PathParams,
}

/// Ordered route table.
#[derive(Debug, Clone)]
pub struct Router<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Duplicates are kept; the earlier one wins on overlap.
    pub fn add_route<I, S>(&mut self, path: &str, handler: H, methods: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let route = Route::new(path, handler, methods);
        tracing::debug!(
            path = %path,
            methods = ?route.methods,
            segments = route.pattern.segments().len(),
            "Route registered"
        );
        self.routes.push(route);
    }

    /// Find the first route matching `method` and `path`.
    pub fn resolve(&self, path: &str, method: &str) -> Option<RouteMatch<'_, H>> {
        let components = split_path(path);

        self.routes
            .iter()
            .filter(|route| route.allows(method))
            .find_map(|route| {
                route
                    .pattern
                    .match_components(&components)
                    .map(|params| RouteMatch {
                        handler: &route.handler,
                        params,
                    })
            })
    }

    pub fn routes(&self) -> &[Route<H>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::ParamValue;

    #[test]
    fn test_router_basic() {
        let mut router = Router::new();
        router.add_route("/hello", "hello", ["GET"]);
        let m = router.resolve("/hello", "GET").unwrap();
        assert_eq!(*m.handler, "hello");
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_router_path_params() {
        let mut router = Router::new();
        router.add_route("/user/{user_id:int}", "user", ["GET"]);
        let m = router.resolve("/user/123", "GET").unwrap();
        assert_eq!(m.params.get("user_id"), Some(&ParamValue::Int(123)));
    }

    #[test]
    fn test_router_invalid_int() {
        let mut router = Router::new();
        router.add_route("/item/{id:int}", "item", ["GET"]);
        assert!(router.resolve("/item/abc", "GET").is_none());
    }

    #[test]
    fn test_conversion_failure_falls_through_in_order() {
        let mut router = Router::new();
        router.add_route("/item/{id:int}", "typed", ["GET"]);
        router.add_route("/item/abc", "literal", ["GET"]);
        router.add_route("/item/{name}", "catch", ["GET"]);

        assert_eq!(*router.resolve("/item/abc", "GET").unwrap().handler, "literal");
        assert_eq!(*router.resolve("/item/7", "GET").unwrap().handler, "typed");
        assert_eq!(*router.resolve("/item/xyz", "GET").unwrap().handler, "catch");
    }

    #[test]
    fn test_first_registered_wins() {
        let mut router = Router::new();
        router.add_route("/item/{name}", "dynamic", ["GET"]);
        router.add_route("/item/abc", "literal", ["GET"]);
        assert_eq!(*router.resolve("/item/abc", "GET").unwrap().handler, "dynamic");
    }

    #[test]
    fn test_router_str_param() {
        let mut router = Router::new();
        router.add_route("/search/{query:str}", "search", ["GET"]);
        let m = router.resolve("/search/hello%20world", "GET").unwrap();
        assert_eq!(m.params.get_str("query"), Some("hello%20world"));
    }

    #[test]
    fn test_router_not_found() {
        let mut router = Router::new();
        router.add_route("/api/data", "data", ["GET"]);
        assert!(router.resolve("/api/missing", "GET").is_none());
    }

    #[test]
    fn test_method_mismatch() {
        let mut router = Router::new();
        router.add_route("/submit", "submit", ["post"]);
        assert!(router.resolve("/submit", "GET").is_none());
        assert!(router.resolve("/submit", "POST").is_some());
    }

    #[test]
    fn test_segment_count_must_match() {
        let mut router = Router::new();
        router.add_route("/a/{b}", "ab", ["GET"]);
        for path in ["/", "/a", "/a/x/y", "/a/x/y/z"] {
            assert!(router.resolve(path, "GET").is_none(), "{path} should not match");
        }
        assert!(router.resolve("/a/x/", "GET").is_some());
    }

    #[test]
    fn test_root_route() {
        let mut router = Router::new();
        router.add_route("/", "root", ["GET"]);
        assert_eq!(*router.resolve("/", "GET").unwrap().handler, "root");
        assert_eq!(*router.resolve("", "GET").unwrap().handler, "root");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut router = Router::new();
        router.add_route("/user/{id:int}/posts/{slug}", "posts", ["GET"]);
        let first = router.resolve("/user/9/posts/intro", "GET");
        let second = router.resolve("/user/9/posts/intro", "GET");
        assert_eq!(first, second);
    }
}
