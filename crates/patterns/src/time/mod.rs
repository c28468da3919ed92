//! Time and scheduling utilities backing the patterns
//!
//! - **[`cancel`]**: clonable cooperative cancellation handle used by retry
//!   waits and poll loops
//! - **[`ticker`]**: owned recurring background task with explicit teardown,
//!   used by the rate limiter's window tick

pub mod cancel;
pub mod ticker;

pub use cancel::CancelHandle;
pub use ticker::{recurring, TickerHandle};
