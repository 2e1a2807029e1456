//! Tarmac orchestrator
//!
//! Launch-time configuration resolution for job templates: decides which
//! overrides a launch may apply, plans the resulting jobs and stores them.

pub mod config;
pub mod error;
pub mod launch;
pub mod repository;
pub mod service;

pub use config::Config;
pub use error::LaunchError;
