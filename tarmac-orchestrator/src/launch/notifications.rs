//! Notification template lookup

use tarmac_core::domain::resource::{NotificationTemplates, Organization};
use tarmac_core::domain::template::Template;

/// Notification templates to fire for jobs of `template`, per trigger
///
/// Job templates combine their own lists with their project's and their
/// organization's. System templates only use their own.
pub fn notification_templates(
    template: &Template,
    organization: Option<&Organization>,
) -> NotificationTemplates {
    match template {
        Template::Job(t) => {
            let mut combined = t.notifications.clone();
            if let Some(project) = &t.project {
                combined.merge(&project.notifications);
            }
            if let Some(org) = organization {
                combined.merge(&org.notifications);
            }
            combined
        }
        Template::System(t) => t.notifications.clone(),
    }
}
