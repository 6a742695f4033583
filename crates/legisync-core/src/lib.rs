//! Legisync Core Library
//!
//! Domain models, error taxonomy, and configuration for the congressional
//! hearing synchronization engine.

pub mod config;
pub mod error;
pub mod keywords;
pub mod model;

pub use error::{SyncError, SyncResult};
