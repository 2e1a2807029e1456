//! Orchestrator configuration
//!
//! Settings that used to be process-wide globals. The launch engine never reads
//! the environment itself; callers pass a `Config` explicitly.

use uuid::Uuid;

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Highest `forks` value a launch may request; 0 disables the ceiling
    pub max_forks: u32,

    /// Active jobs per template before new launches are refused
    pub schedule_max_jobs: usize,

    /// Facts older than this many seconds are not written to the fact cache;
    /// 0 disables the staleness filter
    pub fact_cache_timeout: u64,

    /// Hosts per bulk fact update
    pub fact_batch_size: usize,

    /// Instance groups used when nothing more specific is configured
    pub global_instance_groups: Vec<Uuid>,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            max_forks: 0,
            schedule_max_jobs: 10,
            fact_cache_timeout: 0,
            fact_batch_size: 100,
            global_instance_groups: Vec::new(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - TARMAC_MAX_FORKS (default: 0)
    /// - TARMAC_SCHEDULE_MAX_JOBS (default: 10)
    /// - TARMAC_FACT_CACHE_TIMEOUT (seconds, default: 0)
    /// - TARMAC_FACT_BATCH_SIZE (default: 100)
    /// - TARMAC_GLOBAL_INSTANCE_GROUPS (comma separated ids)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::new();

        let max_forks = std::env::var("TARMAC_MAX_FORKS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.max_forks);

        let schedule_max_jobs = std::env::var("TARMAC_SCHEDULE_MAX_JOBS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.schedule_max_jobs);

        let fact_cache_timeout = std::env::var("TARMAC_FACT_CACHE_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.fact_cache_timeout);

        let fact_batch_size = std::env::var("TARMAC_FACT_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.fact_batch_size);

        let global_instance_groups = match std::env::var("TARMAC_GLOBAL_INSTANCE_GROUPS") {
            Ok(raw) => parse_id_list(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            max_forks,
            schedule_max_jobs,
            fact_cache_timeout,
            fact_batch_size,
            global_instance_groups,
        })
    }

    /// Sets the global instance groups (builder pattern)
    pub fn with_global_instance_groups(mut self, groups: Vec<Uuid>) -> Self {
        self.global_instance_groups = groups;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.schedule_max_jobs == 0 {
            anyhow::bail!("schedule_max_jobs must be greater than 0");
        }

        if self.fact_batch_size == 0 {
            anyhow::bail!("fact_batch_size must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a comma separated list of ids, ignoring blank entries
pub fn parse_id_list(raw: &str) -> anyhow::Result<Vec<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|e| anyhow::anyhow!("invalid instance group id '{}': {}", s, e))
        })
        .collect()
}
