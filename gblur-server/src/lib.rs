//! # gblur server library
//!
//! Network-accessible Gaussian blur service.
//!
//! A client sends an 8-byte control header (worker count, radius) followed
//! by an encoded image; the server replies with the blurred image and closes
//! the connection.
//!
//! **Architecture:** tokio accept loop with one task per connection; the
//! convolution runs on a blocking thread that fans out to one OS thread per
//! row band.

pub mod blur;
pub mod codec;
pub mod error;
pub mod handler;
pub mod server;

pub use error::{Error, Result};
pub use handler::{handle_connection, HandlerSettings};
pub use server::BlurServer;
