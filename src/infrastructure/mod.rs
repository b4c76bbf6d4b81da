//! # Infrastructure
//!
//! - [`provider`] - provider registry and vendor adapters
//! - [`server`] - REST front-end over the dispatcher
pub mod provider;
pub mod server;
