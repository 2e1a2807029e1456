//! Fact Cache Service
//!
//! Before a playbook runs, the cached facts of each targeted host are written to
//! one JSON file per host. Afterwards the files are read back: changed files
//! become fact updates, deleted files clear the host's facts.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use serde_json::{Map, Value};
use tarmac_core::domain::resource::{FactUpdate, Host};
use tarmac_core::dto::plan::JobSpec;

use crate::config::Config;
use crate::error::Result;
use crate::launch::slicing::slice_hosts;
use crate::repository::InventoryRepository;

/// Per-job fact cache directory
#[derive(Debug, Clone)]
pub struct FactCache {
    destination: PathBuf,
    batch_size: usize,
}

/// Outcome of writing the cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactCacheStart {
    pub written: usize,

    /// Modification time of the last file written
    pub last_write: Option<SystemTime>,
}

/// Outcome of reading the cache back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactCacheFinish {
    pub updated: usize,
    pub cleared: usize,
    pub unmodified: usize,

    /// Fact updates to apply, at most `batch_size` per batch
    pub batches: Vec<Vec<FactUpdate>>,
}

impl FactCache {
    pub fn new(destination: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            destination: destination.into(),
            batch_size: batch_size.max(1),
        }
    }

    /// Cache file of a host, or `None` when the name would leave the destination
    ///
    /// An existing file is resolved through symlinks and must still lie inside
    /// the destination.
    fn host_path(&self, host_name: &str) -> Option<PathBuf> {
        let mut components = Path::new(host_name).components();
        let path = match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => self.destination.join(name),
            _ => return None,
        };

        if fs::symlink_metadata(&path).is_err() {
            return Some(path);
        }
        let root = fs::canonicalize(&self.destination).ok()?;
        let real = fs::canonicalize(&path).ok()?;
        real.starts_with(&root).then_some(path)
    }

    /// Write the facts of `hosts` to the cache directory
    ///
    /// Hosts whose facts were last modified before `staleness_cutoff` are
    /// skipped. A host that cannot be written is logged and skipped.
    pub fn start(
        &self,
        hosts: &[Host],
        staleness_cutoff: Option<chrono::DateTime<chrono::Utc>>,
    ) -> io::Result<FactCacheStart> {
        create_private_dir(&self.destination)?;

        let mut outcome = FactCacheStart::default();
        for host in hosts {
            if let Some(cutoff) = staleness_cutoff {
                if host.facts_modified.is_none_or(|modified| modified < cutoff) {
                    continue;
                }
            }

            let Some(path) = self.host_path(&host.name) else {
                tracing::error!("facts for host {} could not be cached", host.name);
                continue;
            };
            match write_facts(&path, &host.facts) {
                Ok(modified) => {
                    outcome.written += 1;
                    outcome.last_write = Some(modified);
                }
                Err(e) => {
                    tracing::error!("facts for host {} could not be cached: {}", host.name, e);
                }
            }
        }

        tracing::debug!(
            "Host facts prepared for {} hosts in {}",
            outcome.written,
            self.destination.display()
        );
        Ok(outcome)
    }

    /// Read the cache back after the job ran
    ///
    /// A file modified after `facts_write_time` (or any file, when there is no
    /// write time) updates the host. A missing file clears the host's facts.
    /// Files that do not hold a JSON object are skipped.
    pub fn finish(&self, hosts: &[Host], facts_write_time: Option<SystemTime>) -> FactCacheFinish {
        let mut outcome = FactCacheFinish::default();
        let mut updates = Vec::new();

        for host in hosts {
            let Some(path) = self.host_path(&host.name) else {
                tracing::error!("facts for host {} could not be cached", host.name);
                continue;
            };

            let modified = match fs::metadata(&path) {
                Ok(metadata) => metadata.modified().ok(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    updates.push(FactUpdate {
                        host_name: host.name.clone(),
                        facts: Map::new(),
                        modified_at: chrono::Utc::now(),
                    });
                    tracing::info!("Facts cleared for host {}", host.name);
                    outcome.cleared += 1;
                    continue;
                }
                Err(e) => {
                    tracing::error!("facts for host {} could not be read: {}", host.name, e);
                    continue;
                }
            };

            let changed = match (facts_write_time, modified) {
                (Some(written), Some(modified)) => modified > written,
                _ => true,
            };
            if !changed {
                outcome.unmodified += 1;
                continue;
            }

            let Some(facts) = read_facts(&path) else {
                continue;
            };
            updates.push(FactUpdate {
                host_name: host.name.clone(),
                facts,
                modified_at: chrono::Utc::now(),
            });
            tracing::info!("New facts for host {}", host.name);
            outcome.updated += 1;
        }

        outcome.batches = updates
            .chunks(self.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        outcome
    }
}

fn create_private_dir(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path)
}

fn write_facts(path: &Path, facts: &Map<String, Value>) -> io::Result<SystemTime> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let file = options.open(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, facts)?;
    writer.flush()?;
    drop(writer);

    fs::metadata(path)?.modified()
}

fn read_facts(path: &Path) -> Option<Map<String, Value>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("facts file {} could not be read: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str::<Map<String, Value>>(&text) {
        Ok(facts) => Some(facts),
        Err(e) => {
            tracing::warn!("ignoring invalid facts file {}: {}", path.display(), e);
            None
        }
    }
}

// ============================================================================
// Service operations
// ============================================================================

/// Hosts of the job's inventory that its slice targets
async fn job_hosts<S>(store: &S, spec: &JobSpec) -> Result<Vec<Host>>
where
    S: InventoryRepository + ?Sized,
{
    let Some(inventory) = &spec.inventory else {
        return Ok(Vec::new());
    };
    let hosts = store.hosts(inventory.id).await?;
    Ok(slice_hosts(&hosts, spec.slice))
}

/// Write the fact cache for a job about to run
pub async fn prepare_fact_cache<S>(
    store: &S,
    config: &Config,
    spec: &JobSpec,
    destination: PathBuf,
) -> Result<FactCacheStart>
where
    S: InventoryRepository + ?Sized,
{
    let hosts = job_hosts(store, spec).await?;
    let cutoff = match config.fact_cache_timeout {
        0 => None,
        timeout => i64::try_from(timeout)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .map(|age| chrono::Utc::now() - age),
    };

    let cache = FactCache::new(destination, config.fact_batch_size);
    let outcome = tokio::task::spawn_blocking(move || cache.start(&hosts, cutoff))
        .await
        .map_err(io::Error::from)??;
    Ok(outcome)
}

/// Read the fact cache of a finished job and store the changes
pub async fn collect_fact_cache<S>(
    store: &S,
    config: &Config,
    spec: &JobSpec,
    destination: PathBuf,
    facts_write_time: Option<SystemTime>,
) -> Result<FactCacheFinish>
where
    S: InventoryRepository + ?Sized,
{
    let Some(inventory_id) = spec.inventory.as_ref().map(|inventory| inventory.id) else {
        return Ok(FactCacheFinish::default());
    };
    let hosts = job_hosts(store, spec).await?;

    let cache = FactCache::new(destination, config.fact_batch_size);
    let outcome = tokio::task::spawn_blocking(move || cache.finish(&hosts, facts_write_time))
        .await
        .map_err(io::Error::from)?;

    for batch in &outcome.batches {
        store.update_facts(inventory_id, batch.clone()).await?;
    }

    tracing::info!(
        "Host facts for {}: updated {}, cleared {}, unchanged {}",
        spec.name,
        outcome.updated,
        outcome.cleared,
        outcome.unmodified
    );
    Ok(outcome)
}
