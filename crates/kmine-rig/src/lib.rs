#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
mod resolver;
mod router;
mod service;
pub mod sql;
pub mod tool;

pub use error::{Error, Result};
pub use resolver::{AzureClientResolver, ClientResolver};
pub use router::{FunctionRouter, RoutedAnswer};
pub use service::{ChatWithDataConfig, ChatWithDataTools};
pub use tool::{Answer, ToolKind};

/// Tracing target for the main library.
pub const TRACING_TARGET: &str = "kmine_rig";

/// Tracing target for client resolution.
pub const TRACING_TARGET_RESOLVER: &str = "kmine_rig::resolver";

/// Tracing target for SQL synthesis and execution.
pub const TRACING_TARGET_SQL: &str = "kmine_rig::sql";

/// Tracing target for tool invocations.
pub const TRACING_TARGET_TOOL: &str = "kmine_rig::tool";

/// Tracing target for function routing.
pub const TRACING_TARGET_ROUTER: &str = "kmine_rig::router";
