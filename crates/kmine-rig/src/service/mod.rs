//! Service wiring: configuration and the tool set built from it.

mod config;
mod tools;

pub use config::ChatWithDataConfig;
pub use tools::ChatWithDataTools;
