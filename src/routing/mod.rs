//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     "/user/{user_id:int}"
//!     → pattern.rs (split into literal / placeholder segments)
//!     → converter.rs (bind a typed parser to each placeholder)
//!     → router.rs (append to ordered route list)
//!
//! Incoming request (path, method)
//!     → router.rs (linear scan in registration order)
//!     → Return: handler + typed PathParams, or no match
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex and no prefix tree: positional segment comparison only
//! - Deterministic: first registered match wins
//! - Converter failure is a non-match, never an error

pub mod converter;
pub mod pattern;
pub mod router;

pub use converter::{ConversionError, Converter, ParamValue, PathParams};
pub use pattern::{PathPattern, Segment};
pub use router::{Route, RouteMatch, Router};

/// Split a request path into its components, ignoring leading/trailing slashes.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}
