pub mod config;
pub mod context;
pub mod core;
pub mod dispatcher;
pub mod operations;
pub mod providers;
pub mod registry;
pub mod server;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ServiceConfig;
pub use context::{AdapterBase, ServiceContext};
pub use core::error::{ConfigError, ErrorKind, ProviderError, ToolError};
pub use core::types::*;
pub use dispatcher::ToolDispatcher;
pub use operations::StatusResolver;
pub use registry::{ToolDefinition, ToolRegistry};
pub use server::McpServer;
