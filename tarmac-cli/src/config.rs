//! Configuration module
//!
//! Handles CLI configuration: engine settings and output format.

use tarmac_orchestrator::Config as EngineConfig;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings passed to the launch engine
    pub engine: EngineConfig,

    /// Print machine-readable JSON instead of formatted text
    pub json: bool,
}
