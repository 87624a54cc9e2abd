//! session-monitor: reactive session state for AI coding agent dashboards

pub mod error;
mod session;
mod status;

pub use error::{Error, Result};
pub use session::*;
pub use status::*;

pub mod bridge;
pub mod demo;
pub mod demo_mode;
pub mod display;
pub mod ipc;
pub mod preferences;
pub mod provider;
pub mod random;
pub mod server;
pub mod signal;
pub mod simulation;
pub mod store;
pub mod views;

pub use provider::{SessionProvider, StatusMessages};
pub use store::SessionStore;
