//! Host Summary Service
//!
//! Per-host results of a job, and the host selection used by retries.

use tarmac_core::domain::host_summary::{HostCounters, HostStatusFilter, HostSummary};
use uuid::Uuid;

use crate::error::{LaunchError, Result};
use crate::repository::{HostSummaryRepository, JobRepository};

/// Record the counters of one host for a job still in progress
///
/// Replaces any earlier summary for the same host.
pub async fn record_host_summary<S>(
    store: &S,
    job_id: Uuid,
    host_name: &str,
    counters: HostCounters,
) -> Result<HostSummary>
where
    S: JobRepository + HostSummaryRepository + ?Sized,
{
    let job = store
        .find_job(job_id)
        .await?
        .ok_or(LaunchError::JobNotFound(job_id))?;
    if job.status.is_finished() {
        return Err(LaunchError::InvalidState(format!(
            "Job {} is {}, host summaries can no longer change",
            job.id, job.status
        )));
    }

    let existing = store
        .list_summaries(job_id)
        .await?
        .into_iter()
        .find(|summary| summary.host_name == host_name);
    let summary = match existing {
        Some(mut summary) => {
            summary.update(counters);
            summary
        }
        None => HostSummary::new(job_id, host_name, counters),
    };

    tracing::debug!(
        "Host {} of job {}: failed={}",
        host_name,
        job_id,
        summary.failed()
    );
    store.upsert_summary(summary.clone()).await?;
    Ok(summary)
}

/// Get the host summaries of a job
pub async fn list_host_summaries<S>(store: &S, job_id: Uuid) -> Result<Vec<HostSummary>>
where
    S: JobRepository + HostSummaryRepository + ?Sized,
{
    store
        .find_job(job_id)
        .await?
        .ok_or(LaunchError::JobNotFound(job_id))?;
    Ok(store.list_summaries(job_id).await?)
}

/// Names of the hosts of a job whose results match `status`
///
/// `status` is one of `all`, `failed`, `ok`, `changed` or `unreachable`.
pub async fn retry_hosts<S>(store: &S, job_id: Uuid, status: &str) -> Result<Vec<String>>
where
    S: JobRepository + HostSummaryRepository + ?Sized,
{
    let filter = HostStatusFilter::parse(status)?;
    let hosts = list_host_summaries(store, job_id)
        .await?
        .into_iter()
        .filter(|summary| filter.matches(summary))
        .map(|summary| summary.host_name)
        .collect();
    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use tarmac_core::domain::job::{Job, JobStatus, LaunchType};
    use tarmac_core::domain::template::SystemJobType;
    use tarmac_core::dto::plan::SystemJobSpec;

    async fn store_with_job() -> (InMemoryStore, Uuid) {
        let store = InMemoryStore::new();
        let job = Job::system(SystemJobSpec {
            template_id: Uuid::new_v4(),
            name: "cleanup".to_string(),
            job_type: SystemJobType::CleanupJobs,
            launch_type: LaunchType::Manual,
            extra_vars: Default::default(),
        });
        let id = job.id;
        store.create_job(job).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_record_updates_existing_summary() {
        let (store, job_id) = store_with_job().await;

        let ok = HostCounters {
            ok: 3,
            ..Default::default()
        };
        let failing = HostCounters {
            failures: 1,
            ..Default::default()
        };
        record_host_summary(&store, job_id, "web-1", ok).await.unwrap();
        let summary = record_host_summary(&store, job_id, "web-1", failing)
            .await
            .unwrap();

        assert!(summary.failed());
        assert_eq!(list_host_summaries(&store, job_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_finished_job_rejects_summaries() {
        let (store, job_id) = store_with_job().await;
        store.update_status(job_id, JobStatus::Succeeded).await.unwrap();

        let err = record_host_summary(&store, job_id, "web-1", HostCounters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LaunchError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_retry_hosts_by_status() {
        let (store, job_id) = store_with_job().await;
        let changed = HostCounters {
            ok: 1,
            changed: 1,
            ..Default::default()
        };
        let dark = HostCounters {
            dark: 1,
            ..Default::default()
        };
        record_host_summary(&store, job_id, "db-1", changed).await.unwrap();
        record_host_summary(&store, job_id, "db-2", dark).await.unwrap();

        assert_eq!(retry_hosts(&store, job_id, "changed").await.unwrap(), vec!["db-1"]);
        assert_eq!(retry_hosts(&store, job_id, "unreachable").await.unwrap(), vec!["db-2"]);
        assert_eq!(retry_hosts(&store, job_id, "all").await.unwrap().len(), 2);

        let err = retry_hosts(&store, job_id, "skipped").await.unwrap_err();
        assert_eq!(err.to_string(), "skipped is not a valid status option.");
    }
}
