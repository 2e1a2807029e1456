//! Preferred instance groups

use std::collections::BTreeSet;

use tarmac_core::domain::resource::Organization;
use tarmac_core::domain::template::JobTemplate;
use tarmac_core::dto::plan::JobSpec;
use uuid::Uuid;

/// Instance groups a job should run on, in priority order
///
/// Groups chosen at launch win. An explicitly empty choice opts out of every
/// configured level and falls back to the global groups. Otherwise the template,
/// inventory and organization groups are combined in that order, stopping after
/// the first level that prevents fallback.
pub fn preferred_instance_groups(
    spec: &JobSpec,
    template: Option<&JobTemplate>,
    organization: Option<&Organization>,
    global: &[Uuid],
) -> Vec<Uuid> {
    match &spec.instance_groups {
        Some(prompted) if !prompted.is_empty() => return prompted.clone(),
        Some(_) => return global.to_vec(),
        None => {}
    }

    let levels: [Option<(&[Uuid], bool)>; 3] = [
        template.map(|t| (t.instance_groups.as_slice(), spec.prevent_instance_group_fallback)),
        spec.inventory
            .as_ref()
            .map(|inv| (inv.instance_groups.as_slice(), inv.prevent_instance_group_fallback)),
        organization.map(|org| (org.instance_groups.as_slice(), false)),
    ];

    let mut seen = BTreeSet::new();
    let mut selected = Vec::new();
    for (groups, prevent_fallback) in levels.into_iter().flatten() {
        selected.extend(groups.iter().copied().filter(|id| seen.insert(*id)));
        if prevent_fallback {
            break;
        }
    }

    if selected.is_empty() {
        return global.to_vec();
    }
    selected
}
