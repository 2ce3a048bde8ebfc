//! Lanshare Server Library
//!
//! The discovery responder and control channel server. The `lanshared`
//! binary is a thin wrapper; the client crate embeds the same server to
//! share a directory while browsing others.

pub mod config;
pub mod connection;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod files;
pub mod server;
pub mod transfer;

pub use config::ServerConfig;
pub use error::ServerError;
pub use files::SharedDirectory;
pub use server::Server;
