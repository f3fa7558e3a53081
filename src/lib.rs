//! Shelter - Offline-First Application Shell Cache
//!
//! Keeps a durable local mirror of a web application shell in agreement
//! with a build-produced resource manifest, and resolves requests against
//! that mirror cache-first (online-first for the document root).

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod reconcile;
pub mod store;
pub mod ui;
pub mod worker;

pub use error::{ShelterError, ShelterResult};
