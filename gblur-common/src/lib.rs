//! # gblur common library
//!
//! Shared code for the blur service and its client:
//! - Error type
//! - Bootstrap configuration (TOML, environment, compiled defaults)
//! - Logging initialisation
//! - Control header codec for the request wire format

pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;

pub use config::{LoggingConfig, OutputFormat, TomlConfig};
pub use error::{Error, Result};
pub use protocol::{ControlHeader, HEADER_LEN};
