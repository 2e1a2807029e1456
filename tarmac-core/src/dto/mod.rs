//! Data Transfer Objects
//!
//! DTOs exchanged between callers and the launch engine: what a caller asks for
//! (`launch`), what the engine decided (`resolution`) and what will be created
//! (`plan`).

pub mod launch;
pub mod plan;
pub mod resolution;
