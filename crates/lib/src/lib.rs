//! mobilectl core library: phonebook store, action dispatcher, platform strategies,
//! and the HTTP API, shared by the CLI.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod exec;
pub mod init;
pub mod phonebook;
pub mod platform;

pub use dispatch::{Action, ActionResult, Dispatcher, Params};
pub use error::{ActionError, ErrorKind};
