//! Per-host job results

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task counters reported for one host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostCounters {
    pub ok: u32,
    pub changed: u32,
    pub failures: u32,
    pub dark: u32,
    pub skipped: u32,
    pub processed: u32,
    pub rescued: u32,
    pub ignored: u32,
}

/// Outcome of one job on one host
///
/// Unique per (job, host name). `failed` is always derived from the counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSummary {
    pub job_id: Uuid,
    pub host_name: String,
    pub counters: HostCounters,
    failed: bool,
    pub modified_at: chrono::DateTime<chrono::Utc>,
}

impl HostSummary {
    pub fn new(job_id: Uuid, host_name: impl Into<String>, counters: HostCounters) -> Self {
        Self {
            job_id,
            host_name: host_name.into(),
            counters,
            failed: counters.dark > 0 || counters.failures > 0,
            modified_at: chrono::Utc::now(),
        }
    }

    /// Replace the counters and recompute `failed`
    pub fn update(&mut self, counters: HostCounters) {
        self.counters = counters;
        self.failed = counters.dark > 0 || counters.failures > 0;
        self.modified_at = chrono::Utc::now();
    }

    pub fn failed(&self) -> bool {
        self.failed
    }
}

/// Unknown host status in a retry filter
#[derive(Debug, thiserror::Error)]
#[error("{0} is not a valid status option.")]
pub struct InvalidStatusFilter(pub String);

/// Which hosts of a finished job a retry should target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatusFilter {
    All,
    Failed,
    Ok,
    Changed,
    Unreachable,
}

impl HostStatusFilter {
    pub fn parse(status: &str) -> Result<Self, InvalidStatusFilter> {
        match status {
            "all" => Ok(HostStatusFilter::All),
            "failed" => Ok(HostStatusFilter::Failed),
            "ok" => Ok(HostStatusFilter::Ok),
            "changed" => Ok(HostStatusFilter::Changed),
            "unreachable" => Ok(HostStatusFilter::Unreachable),
            other => Err(InvalidStatusFilter(other.to_string())),
        }
    }

    pub fn matches(&self, summary: &HostSummary) -> bool {
        let counters = &summary.counters;
        match self {
            HostStatusFilter::All => true,
            HostStatusFilter::Failed => summary.failed(),
            HostStatusFilter::Ok => counters.ok > 0,
            HostStatusFilter::Changed => counters.changed > 0,
            HostStatusFilter::Unreachable => counters.dark > 0,
        }
    }
}

impl std::str::FromStr for HostStatusFilter {
    type Err = InvalidStatusFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HostStatusFilter::parse(s)
    }
}

impl std::fmt::Display for HostStatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HostStatusFilter::All => "all",
            HostStatusFilter::Failed => "failed",
            HostStatusFilter::Ok => "ok",
            HostStatusFilter::Changed => "changed",
            HostStatusFilter::Unreachable => "unreachable",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_is_derived() {
        let job_id = Uuid::new_v4();
        let unreachable = HostSummary::new(
            job_id,
            "web1",
            HostCounters {
                dark: 1,
                ..Default::default()
            },
        );
        assert!(unreachable.failed());

        let mut summary = HostSummary::new(
            job_id,
            "web2",
            HostCounters {
                ok: 4,
                ..Default::default()
            },
        );
        assert!(!summary.failed());

        summary.update(HostCounters {
            failures: 2,
            ..Default::default()
        });
        assert!(summary.failed());
    }

    #[test]
    fn test_parse_status_filter() {
        assert_eq!(
            HostStatusFilter::parse("unreachable").unwrap(),
            HostStatusFilter::Unreachable
        );
        let err = HostStatusFilter::parse("bogus").unwrap_err();
        assert_eq!(err.to_string(), "bogus is not a valid status option.");
    }

    #[test]
    fn test_filter_matches() {
        let summary = HostSummary::new(
            Uuid::new_v4(),
            "db1",
            HostCounters {
                ok: 1,
                changed: 1,
                ..Default::default()
            },
        );
        assert!(HostStatusFilter::All.matches(&summary));
        assert!(HostStatusFilter::Changed.matches(&summary));
        assert!(!HostStatusFilter::Failed.matches(&summary));
        assert!(!HostStatusFilter::Unreachable.matches(&summary));
    }
}
