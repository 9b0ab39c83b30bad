//! System-level modules
//!
//! - `logging`: tracing subscriber 初始化

pub mod logging;

pub use logging::init_logging;
