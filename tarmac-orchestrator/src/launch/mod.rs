//! Launch engine
//!
//! Pure, synchronous decision logic. Nothing here touches storage; services
//! load the inputs, call into these modules and persist the outcome.

pub mod admission;
pub mod credentials;
pub mod instance_groups;
pub mod meta;
pub mod notifications;
pub mod policy;
pub mod readiness;
pub mod relaunch;
pub mod resolver;
pub mod slicing;
pub mod variables;

pub use admission::AdmissionGate;
pub use relaunch::TemplatePolicySnapshot;
pub use resolver::ConfigResolver;
