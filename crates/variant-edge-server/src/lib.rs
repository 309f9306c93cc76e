//! variant-edge server — HTTP entry point, configuration and CLI commands.

pub mod cli;
pub mod config;
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use server::{router, serve};
