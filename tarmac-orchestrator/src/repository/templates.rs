//! Template repository

use anyhow::Result;
use async_trait::async_trait;
use tarmac_core::domain::resource::Organization;
use tarmac_core::domain::template::Template;
use uuid::Uuid;

/// Repository trait for templates and the organizations that own them
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Fetches a template by id
    async fn find_template(&self, id: Uuid) -> Result<Option<Template>>;

    /// Inserts or replaces a template
    async fn save_template(&self, template: Template) -> Result<()>;

    /// Fetches an organization by id
    async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>>;
}
