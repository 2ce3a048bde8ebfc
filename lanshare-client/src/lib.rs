//! Lanshare Client Library
//!
//! Server discovery, the control connection, and collision-safe downloads,
//! tied together by the [`App`] context that UI shells drive.

pub mod app;
pub mod config;
pub mod connection;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod transfers;

pub use app::App;
pub use config::{ClientConfig, DiscoveryConfig};
pub use connection::ControlClient;
pub use error::ClientError;
