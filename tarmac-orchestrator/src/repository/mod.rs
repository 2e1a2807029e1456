//! Repository layer
//!
//! Storage seams for the launch services. Repositories only load and store
//! records; every launch decision is made in `crate::launch`.
//!
//! All repositories are trait-based so backends can be swapped and tests can run
//! against the in-memory store.

mod hosts;
mod jobs;
mod memory;
mod templates;

// Re-export traits
pub use hosts::{HostSummaryRepository, InventoryRepository};
pub use jobs::JobRepository;
pub use templates::TemplateRepository;

// Re-export implementations
pub use memory::InMemoryStore;
