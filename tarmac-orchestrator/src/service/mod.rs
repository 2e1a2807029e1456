//! Service Module
//!
//! Async layer between the repositories and the launch engine.
//! Services load records, call into `crate::launch` and persist the outcome.

pub mod facts;
pub mod host_summary;
pub mod launch;
pub mod relaunch;

// Re-export for convenience
pub use facts as fact_service;
pub use host_summary as host_summary_service;
pub use launch as launch_service;
pub use relaunch as relaunch_service;
