//! In-memory implementations of the folio capabilities.
//!
//! Lets the view core run without a browser: integration tests, and any
//! host that wants to pre-compute layout-driven state from known geometry.

mod capturer;
mod dom;
mod host;
mod scheduler;

pub use capturer::ScriptedCapturer;
pub use dom::HeadlessDom;
pub use host::HeadlessHost;
pub use scheduler::ManualScheduler;
