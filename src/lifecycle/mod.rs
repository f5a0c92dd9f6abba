//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! SIGINT/SIGTERM ─▶ Shutdown::trigger
//!     → ShutdownSignal::recv resolves in every subscriber
//!     → server stops accepting → in-flight requests drain → lifespan shutdown
//! ```

pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownSignal};
