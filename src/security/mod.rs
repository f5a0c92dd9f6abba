//! Security middleware subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (outermost first):
//!     → cors.rs (OPTIONS short-circuit, header injection on the way out)
//!     → csrf.rs (token validation, cookie on the way out)
//!     → rate_limit.rs (sliding window per client)
//!     → dispatcher
//! ```
//!
//! # Design Decisions
//! - Each middleware is a decorator implementing `App` around an owned inner app
//! - Outbound rewriting uses decorator sinks that touch only the start event
//! - Rejections are short-circuit responses (403 / 429), not errors
//! - Non-HTTP scopes always pass through untouched

pub mod cors;
pub mod csrf;
pub mod rate_limit;

pub use cors::Cors;
pub use csrf::Csrf;
pub use rate_limit::{RateLimit, SlidingWindow};
