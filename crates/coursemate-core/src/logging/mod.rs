//! Logging
//!
//! Components take an `Arc<dyn Logger>` at construction instead of writing
//! to a global subscriber, so hosts decide where lines end up.

mod console;
mod memory;
mod noop;
mod traits;

pub use console::ConsoleLogger;
pub use memory::MemoryLogger;
pub use noop::NoOpLogger;
pub use traits::{LogLevel, Logger, SharedLogger};
