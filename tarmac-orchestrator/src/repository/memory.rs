//! In-memory repository implementation
//!
//! Backs the CLI and the service tests. All state lives behind one lock so each
//! repository call is atomic on its own; sequences of calls are not.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use tarmac_core::domain::host_summary::HostSummary;
use tarmac_core::domain::job::{Job, JobStatus, WorkflowJob};
use tarmac_core::domain::launch_config::LaunchConfig;
use tarmac_core::domain::resource::{FactUpdate, Host, Organization};
use tarmac_core::domain::template::Template;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{HostSummaryRepository, InventoryRepository, JobRepository, TemplateRepository};

#[derive(Debug, Default)]
struct State {
    templates: HashMap<Uuid, Template>,
    organizations: HashMap<Uuid, Organization>,
    jobs: Vec<Job>,
    workflows: HashMap<Uuid, WorkflowJob>,
    launch_configs: HashMap<Uuid, LaunchConfig>,
    summaries: BTreeMap<(Uuid, String), HostSummary>,
    hosts: HashMap<Uuid, Vec<Host>>,
}

/// Store implementing every repository trait in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_organization(&self, organization: Organization) {
        let mut state = self.state.write().await;
        state.organizations.insert(organization.id, organization);
    }

    /// Adds hosts to an inventory
    pub async fn insert_hosts(&self, inventory_id: Uuid, hosts: Vec<Host>) {
        let mut state = self.state.write().await;
        state.hosts.entry(inventory_id).or_default().extend(hosts);
    }

    pub async fn find_workflow(&self, id: Uuid) -> Option<WorkflowJob> {
        self.state.read().await.workflows.get(&id).cloned()
    }

    /// Every job, in creation order
    pub async fn jobs(&self) -> Vec<Job> {
        self.state.read().await.jobs.clone()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryStore {
    async fn find_template(&self, id: Uuid) -> Result<Option<Template>> {
        Ok(self.state.read().await.templates.get(&id).cloned())
    }

    async fn save_template(&self, template: Template) -> Result<()> {
        let mut state = self.state.write().await;
        state.templates.insert(template.id(), template);
        Ok(())
    }

    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>> {
        Ok(self.state.read().await.organizations.get(&id).cloned())
    }
}

#[async_trait]
impl JobRepository for InMemoryStore {
    async fn count_active(&self, template_id: Uuid) -> Result<usize> {
        let state = self.state.read().await;
        Ok(crate::launch::admission::count_active(&state.jobs, template_id))
    }

    async fn create_job(&self, job: Job) -> Result<()> {
        let mut state = self.state.write().await;
        if state.jobs.iter().any(|existing| existing.id == job.id) {
            anyhow::bail!("job {} already exists", job.id);
        }
        state.jobs.push(job);
        Ok(())
    }

    async fn create_workflow(&self, workflow: WorkflowJob) -> Result<()> {
        let mut state = self.state.write().await;
        state.workflows.insert(workflow.id, workflow);
        Ok(())
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        let state = self.state.read().await;
        Ok(state.jobs.iter().find(|job| job.id == id).cloned())
    }

    async fn jobs_for_workflow(&self, workflow_id: Uuid) -> Result<Vec<Job>> {
        let state = self.state.read().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .iter()
            .filter(|job| job.workflow_id == Some(workflow_id))
            .cloned()
            .collect();
        jobs.sort_by_key(|job| job.spec().map(|spec| spec.slice.number).unwrap_or_default());
        Ok(jobs)
    }

    async fn save_launch_config(&self, config: LaunchConfig) -> Result<()> {
        let mut state = self.state.write().await;
        state.launch_configs.insert(config.job_id(), config);
        Ok(())
    }

    async fn find_launch_config(&self, job_id: Uuid) -> Result<Option<LaunchConfig>> {
        Ok(self.state.read().await.launch_configs.get(&job_id).cloned())
    }

    async fn update_status(&self, id: Uuid, status: JobStatus) -> Result<Option<Job>> {
        let mut state = self.state.write().await;
        let Some(job) = state.jobs.iter_mut().find(|job| job.id == id) else {
            return Ok(None);
        };
        job.status = status;
        job.finished_at = status.is_finished().then(chrono::Utc::now);
        Ok(Some(job.clone()))
    }
}

#[async_trait]
impl HostSummaryRepository for InMemoryStore {
    async fn upsert_summary(&self, summary: HostSummary) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .summaries
            .insert((summary.job_id, summary.host_name.clone()), summary);
        Ok(())
    }

    async fn list_summaries(&self, job_id: Uuid) -> Result<Vec<HostSummary>> {
        let state = self.state.read().await;
        Ok(state
            .summaries
            .values()
            .filter(|summary| summary.job_id == job_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InventoryRepository for InMemoryStore {
    async fn hosts(&self, inventory_id: Uuid) -> Result<Vec<Host>> {
        let state = self.state.read().await;
        Ok(state.hosts.get(&inventory_id).cloned().unwrap_or_default())
    }

    async fn update_facts(&self, inventory_id: Uuid, updates: Vec<FactUpdate>) -> Result<usize> {
        let mut state = self.state.write().await;
        let Some(hosts) = state.hosts.get_mut(&inventory_id) else {
            return Ok(0);
        };

        let mut updated = 0;
        for update in updates {
            if let Some(host) = hosts.iter_mut().find(|h| h.name == update.host_name) {
                host.facts = update.facts;
                host.facts_modified = Some(update.modified_at);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarmac_core::domain::host_summary::HostCounters;
    use tarmac_core::domain::job::LaunchType;
    use tarmac_core::domain::template::{SystemJobTemplate, SystemJobType};
    use tarmac_core::dto::plan::SystemJobSpec;

    fn system_job(template_id: Uuid) -> Job {
        Job::system(SystemJobSpec {
            template_id,
            name: "cleanup".to_string(),
            job_type: SystemJobType::CleanupJobs,
            launch_type: LaunchType::Manual,
            extra_vars: Default::default(),
        })
    }

    #[tokio::test]
    async fn test_template_round_trip() {
        let store = InMemoryStore::new();
        let template: Template = SystemJobTemplate::new("cleanup", SystemJobType::CleanupTokens).into();
        let id = template.id();

        store.save_template(template.clone()).await.unwrap();
        assert_eq!(store.find_template(id).await.unwrap(), Some(template));
        assert!(store.find_template(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status_updates_drive_active_count() {
        let store = InMemoryStore::new();
        let template_id = Uuid::new_v4();
        let job = system_job(template_id);
        let job_id = job.id;

        store.create_job(job.clone()).await.unwrap();
        assert!(store.create_job(job).await.is_err());
        assert_eq!(store.count_active(template_id).await.unwrap(), 1);

        let finished = store
            .update_status(job_id, JobStatus::Succeeded)
            .await
            .unwrap()
            .unwrap();
        assert!(finished.finished_at.is_some());
        assert_eq!(store.count_active(template_id).await.unwrap(), 0);
        assert!(
            store
                .update_status(Uuid::new_v4(), JobStatus::Failed)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_summaries_unique_per_host() {
        let store = InMemoryStore::new();
        let job_id = Uuid::new_v4();

        store
            .upsert_summary(HostSummary::new(job_id, "web-2", HostCounters::default()))
            .await
            .unwrap();
        store
            .upsert_summary(HostSummary::new(job_id, "web-1", HostCounters::default()))
            .await
            .unwrap();
        let counters = HostCounters {
            failures: 1,
            ..Default::default()
        };
        store
            .upsert_summary(HostSummary::new(job_id, "web-2", counters))
            .await
            .unwrap();

        let summaries = store.list_summaries(job_id).await.unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.host_name.as_str()).collect();
        assert_eq!(names, vec!["web-1", "web-2"]);
        assert!(summaries[1].failed());
    }

    #[tokio::test]
    async fn test_update_facts_counts_known_hosts() {
        let store = InMemoryStore::new();
        let inventory_id = Uuid::new_v4();
        store
            .insert_hosts(
                inventory_id,
                vec![Host {
                    name: "db-1".to_string(),
                    inventory_id,
                    facts: Default::default(),
                    facts_modified: None,
                }],
            )
            .await;

        let now = chrono::Utc::now();
        let mut facts = serde_json::Map::new();
        facts.insert("os".to_string(), serde_json::Value::String("linux".to_string()));
        let updates = vec![
            FactUpdate {
                host_name: "db-1".to_string(),
                facts,
                modified_at: now,
            },
            FactUpdate {
                host_name: "ghost".to_string(),
                facts: Default::default(),
                modified_at: now,
            },
        ];

        assert_eq!(store.update_facts(inventory_id, updates).await.unwrap(), 1);
        let hosts = store.hosts(inventory_id).await.unwrap();
        assert_eq!(hosts[0].facts["os"], "linux");
        assert_eq!(hosts[0].facts_modified, Some(now));
    }
}
