//! Logging setup.
//!
//! The crate logs through the `log` facade; `init_logging` installs `env_logger`
//! behind it.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
