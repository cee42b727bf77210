use super::{
    disks::{shared_disk_count, shared_disks_message},
    selection::{NodeSelection, SelectionStatus},
};
use crate::{
    resources::{
        node::{cpu, is_storage_node, memory_bytes, role, NodeRole},
        LocalVolumeDiscoveryResult,
    },
    watch::{joint, Watched},
};
use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use std::collections::BTreeSet;
use utils::bytes::{into_human_fixed, to_gib};

/// Why a node may be unfit for the storage cluster.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::AsRefStr, strum_macros::Display,
)]
pub enum NodeWarning {
    InsufficientMemory,
}

/// A row of the nodes selection table.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub uid: String,
    pub name: String,
    pub role: NodeRole,
    pub cpu: Option<String>,
    /// Memory capacity in the largest fitting binary unit, `--` when unknown.
    pub memory: String,
    pub status: SelectionStatus,
    pub warnings: BTreeSet<NodeWarning>,
}

impl NodeRow {
    fn new(node: &Node, status: SelectionStatus) -> Self {
        let mut warnings = BTreeSet::new();
        let memory = match memory_bytes(node) {
            Some(Ok(bytes)) => {
                if to_gib(bytes) < utils::MINIMUM_AMOUNT_OF_MEMORY_GIB {
                    warnings.insert(NodeWarning::InsufficientMemory);
                }
                into_human_fixed(bytes, 2)
            }
            _ => utils::VALUE_NOT_AVAILABLE.to_string(),
        };
        Self {
            uid: node.uid().unwrap_or_default(),
            name: node.name_any(),
            role: role(node),
            cpu: cpu(node).map(|q| q.0.clone()),
            memory,
            status,
            warnings,
        }
    }
}

/// The nodes selection table of the storage cluster creation page.
#[derive(Debug, Clone, PartialEq)]
pub struct NodesSelectionTable {
    pub is_loaded: bool,
    pub load_error: Option<String>,
    pub rows: Vec<NodeRow>,
    /// Names of the selected nodes.
    pub selected_nodes: Vec<String>,
    pub shared_disks_count: usize,
    pub shared_disks_message: String,
}

impl NodesSelectionTable {
    /// Derive the table from the watched nodes and discovery results and the session's
    /// selection state.
    pub fn new(
        nodes: &Watched<Vec<Node>>,
        discovery: &Watched<Vec<LocalVolumeDiscoveryResult>>,
        selection: &NodeSelection,
    ) -> Self {
        let (is_loaded, error) = joint(&[nodes, discovery]);
        let rows: Vec<NodeRow> = nodes
            .data()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|n| {
                let status = n
                    .uid()
                    .and_then(|uid| selection.status(&uid))
                    .unwrap_or_else(|| match is_storage_node(n) {
                        true => SelectionStatus::Selected,
                        false => SelectionStatus::Unselected,
                    });
                NodeRow::new(n, status)
            })
            .collect();
        let selected_nodes: Vec<String> = rows
            .iter()
            .filter(|r| r.status == SelectionStatus::Selected)
            .map(|r| r.name.clone())
            .collect();
        let shared_disks_count = shared_disk_count(
            selected_nodes.iter().map(String::as_str),
            discovery.data().map(Vec::as_slice).unwrap_or_default(),
        );

        Self {
            is_loaded,
            load_error: error.map(|e| e.to_string()),
            shared_disks_message: shared_disks_message(selected_nodes.len(), shared_disks_count),
            rows,
            selected_nodes,
            shared_disks_count,
        }
    }
}
