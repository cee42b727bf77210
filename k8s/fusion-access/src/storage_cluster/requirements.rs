use super::table::NodesSelectionTable;
use crate::session::{Alert, AlertVariant, PageStore};

/// Key of the page alert listing the unmet requirements.
pub const MINIMUM_REQUIREMENTS_ALERT_KEY: &str = "minimum-shared-disks-and-nodes";

const SHARED_DISKS_REQUIREMENT: &str = "Selected nodes must share at least one disk";
const NODES_REQUIREMENT: &str = "At least three nodes must be selected.";

/// Outcome of the minimum requirements check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementsCheck {
    /// Whether the storage cluster creation is blocked.
    pub is_disabled: bool,
    /// The unmet requirements.
    pub unmet: Vec<String>,
}

/// Check the selection against the storage cluster minimums: enough nodes, and once more
/// than one node is selected, at least one disk shared by all of them.
pub fn check_minimum_requirements(selected_nodes: usize, shared_disks: usize) -> RequirementsCheck {
    let missing_shared_disks =
        selected_nodes >= 2 && shared_disks < utils::MINIMUM_AMOUNT_OF_SHARED_DISKS;
    let missing_nodes = selected_nodes < utils::MINIMUM_AMOUNT_OF_NODES;

    let unmet = [
        (missing_shared_disks, SHARED_DISKS_REQUIREMENT),
        (missing_nodes, NODES_REQUIREMENT),
    ]
    .into_iter()
    .filter(|(unmet, _)| *unmet)
    .map(|(_, message)| message.to_string())
    .collect();

    RequirementsCheck {
        is_disabled: missing_nodes || missing_shared_disks,
        unmet,
    }
}

/// Apply the check to the page: toggle the create button and keep a single alert listing
/// the unmet requirements, replaced in place on every run. Nothing is done until the
/// table is loaded.
pub fn validate_minimum_requirements(
    store: &PageStore,
    table: &NodesSelectionTable,
) -> Option<RequirementsCheck> {
    if !table.is_loaded {
        return None;
    }
    let check = check_minimum_requirements(table.selected_nodes.len(), table.shared_disks_count);
    store.set_cta_disabled(check.is_disabled);
    if check.is_disabled {
        store.add_alert(
            Alert::new(AlertVariant::Warning, "Storage cluster requirements")
                .with_key(MINIMUM_REQUIREMENTS_ALERT_KEY)
                .with_description(check.unmet.clone()),
        );
    } else {
        store.dismiss_alert(MINIMUM_REQUIREMENTS_ALERT_KEY);
    }
    Some(check)
}
