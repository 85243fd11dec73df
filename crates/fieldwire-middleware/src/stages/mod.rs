//! Built-in middleware layers.
//!
//! - [`timing`] - Log the elapsed time of every action

pub mod timing;

// Re-export main types
pub use timing::TimingMiddleware;
