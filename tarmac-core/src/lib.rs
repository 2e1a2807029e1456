//! Tarmac Core
//!
//! Core types and abstractions for the Tarmac job template system.
//!
//! This crate contains:
//! - Domain types: Core business entities (Template, Job, LaunchConfig, etc.)
//! - DTOs: Launch requests, resolution results and launch plans exchanged
//!   between the orchestrator and its callers

pub mod domain;
pub mod dto;
