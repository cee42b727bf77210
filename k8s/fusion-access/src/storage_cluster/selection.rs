use crate::{
    client::StorageApi,
    resources::node::{is_storage_node, storage_role_label_patch},
    session::{Alert, PageStore},
};
use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use parking_lot::Mutex;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, warn};

/// Whether a node is a member of the storage cluster, as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SelectionStatus {
    Selected,
    /// A label patch is in flight, further toggles are dropped.
    SelectionPending,
    Unselected,
}

impl SelectionStatus {
    fn of(node: &Node) -> Self {
        match is_storage_node(node) {
            true => Self::Selected,
            false => Self::Unselected,
        }
    }
}

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// The node was pending or unknown, nothing was sent.
    Ignored,
    /// The node settled to this status.
    Settled(SelectionStatus),
}

/// The selection state of the listed nodes, keyed by node uid.
///
/// Toggles on different nodes run independently; a node is locked while its label
/// patch is in flight.
#[derive(Debug, Clone, Default)]
pub struct NodeSelection {
    statuses: Arc<Mutex<BTreeMap<String, SelectionStatus>>>,
}

impl NodeSelection {
    pub fn new(nodes: &[Node]) -> Self {
        let selection = Self::default();
        selection.sync(nodes);
        selection
    }

    /// Reload the statuses from a fresh node listing. Pending nodes stay pending until
    /// their own toggle settles them.
    pub fn sync(&self, nodes: &[Node]) {
        let mut statuses = self.statuses.lock();
        let previous = std::mem::take(&mut *statuses);
        for node in nodes {
            let Some(uid) = node.uid() else { continue };
            let status = match previous.get(&uid) {
                Some(SelectionStatus::SelectionPending) => SelectionStatus::SelectionPending,
                _ => SelectionStatus::of(node),
            };
            statuses.insert(uid, status);
        }
    }

    pub fn status(&self, uid: &str) -> Option<SelectionStatus> {
        self.statuses.lock().get(uid).copied()
    }

    /// The uids of the selected nodes.
    pub fn selected(&self) -> Vec<String> {
        self.statuses
            .lock()
            .iter()
            .filter(|(_, s)| **s == SelectionStatus::Selected)
            .map(|(uid, _)| uid.clone())
            .collect()
    }

    /// Lock the node, unless it is already locked.
    fn begin(&self, uid: &str) -> bool {
        let mut statuses = self.statuses.lock();
        match statuses.get_mut(uid) {
            Some(status) if *status != SelectionStatus::SelectionPending => {
                *status = SelectionStatus::SelectionPending;
                true
            }
            _ => false,
        }
    }

    fn settle(&self, uid: &str, status: SelectionStatus) {
        if let Some(current) = self.statuses.lock().get_mut(uid) {
            *current = status;
        }
    }

    /// Add the node to, or remove it from, the storage cluster by patching its storage
    /// role label.
    ///
    /// On failure the alert is raised and the node's label is read back, so the status
    /// reflects what the server holds rather than the opposite of the attempt.
    #[tracing::instrument(skip_all, fields(node.name = %node.name_any(), checked = checked))]
    pub async fn toggle(
        &self,
        api: &dyn StorageApi,
        store: &PageStore,
        node: &Node,
        checked: bool,
    ) -> Toggle {
        let Some(uid) = node.uid() else {
            return Toggle::Ignored;
        };
        if !self.begin(&uid) {
            debug!("Selection pending, toggle dropped");
            return Toggle::Ignored;
        }

        let name = node.name_any();
        let status = match api.patch_node(&name, storage_role_label_patch(checked)).await {
            Ok(_) => match checked {
                true => SelectionStatus::Selected,
                false => SelectionStatus::Unselected,
            },
            Err(error) => {
                warn!(%error, "Failed to update the node's storage role");
                store.add_alert(Alert::danger(
                    format!("Failed to update node {name}"),
                    error.to_string(),
                ));
                match api.get_node(&name).await {
                    Ok(current) => SelectionStatus::of(&current),
                    Err(error) => {
                        warn!(%error, "Failed to read back the node");
                        SelectionStatus::of(node)
                    }
                }
            }
        };
        self.settle(&uid, status);
        Toggle::Settled(status)
    }
}
