//! Inter-process communication with the terminal host.
//!
//! This module provides:
//! - `protocol`: wire types exchanged as JSON lines over the Unix socket
//! - `connection`: socket tasks and request/response correlation
//! - `listener`: subscription registry and the dispatch loop

mod connection;
mod listener;
mod protocol;

pub use connection::{Connection, Outbox};
pub use listener::Listener;
pub use protocol::{socket_path, AppInfo, Method, Notification, NotificationClass};
