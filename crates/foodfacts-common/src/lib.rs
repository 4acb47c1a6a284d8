//! Food Facts Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the Food Facts workspace members:
//!
//! - **Logging**: `tracing` subscriber bootstrap driven by `LOG_*` variables
//! - **Environment**: typed access to environment variables with defaults
//! - **Error Handling**: the shared [`CommonError`] type
//!
//! # Example
//!
//! ```no_run
//! use foodfacts_common::{env, logging::{init_logging, LogConfig}};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     let port: u16 = env::parse_or("FOODFACTS_PORT", 3000)?;
//!     tracing::info!(port, "Configured");
//!     Ok(())
//! }
//! ```

pub mod env;
pub mod error;
pub mod logging;

pub use error::{CommonError, Result};
