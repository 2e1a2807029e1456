//! Core domain types
//!
//! This module contains the core domain structures used across Tarmac crates.
//! Templates, resources and jobs are value snapshots: the orchestrator reads them
//! from its repositories and hands immutable copies to the launch engine.

pub mod host_summary;
pub mod job;
pub mod launch_config;
pub mod prompt;
pub mod resource;
pub mod survey;
pub mod template;
