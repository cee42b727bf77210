use super::{
    has_label,
    quantity::{parse_quantity, QuantityError},
};
use k8s_openapi::{api::core::v1::Node, apimachinery::pkg::api::resource::Quantity};
use std::collections::BTreeMap;

/// The role of a node, derived from its role labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr, strum_macros::Display)]
pub enum NodeRole {
    #[strum(serialize = "worker")]
    Worker,
    #[strum(serialize = "master")]
    Master,
    #[strum(serialize = "control-plane")]
    ControlPlane,
    #[strum(serialize = "--")]
    NotAvailable,
}

/// The role of the node. Worker takes precedence over master, which takes precedence over
/// control-plane.
pub fn role(node: &Node) -> NodeRole {
    if has_label(node, utils::WORKER_NODE_ROLE_LABEL, "") {
        NodeRole::Worker
    } else if has_label(node, utils::MASTER_NODE_ROLE_LABEL, "") {
        NodeRole::Master
    } else if has_label(node, utils::CPLANE_NODE_ROLE_LABEL, "") {
        NodeRole::ControlPlane
    } else {
        NodeRole::NotAvailable
    }
}

fn capacity<'a>(node: &'a Node, resource: &str) -> Option<&'a Quantity> {
    node.status
        .as_ref()
        .and_then(|s| s.capacity.as_ref())
        .and_then(|c| c.get(resource))
}

/// The CPU capacity of the node.
pub fn cpu(node: &Node) -> Option<&Quantity> {
    capacity(node, "cpu")
}

/// The memory capacity of the node, in bytes.
pub fn memory_bytes(node: &Node) -> Option<Result<f64, QuantityError>> {
    capacity(node, "memory").map(|q| parse_quantity(&q.0))
}

/// Whether the node is a member of the storage cluster.
pub fn is_storage_node(node: &Node) -> bool {
    has_label(
        node,
        utils::STORAGE_ROLE_LABEL_KEY,
        utils::STORAGE_ROLE_LABEL_VALUE,
    )
}

/// Merge patch adding or removing the storage role label.
pub fn storage_role_label_patch(selected: bool) -> serde_json::Value {
    let value = match selected {
        true => serde_json::Value::from(utils::STORAGE_ROLE_LABEL_VALUE),
        false => serde_json::Value::Null,
    };
    serde_json::json!({ "metadata": { "labels": { (utils::STORAGE_ROLE_LABEL_KEY): value } } })
}

/// The node selector matching the storage cluster members.
pub fn storage_role_node_selector() -> BTreeMap<String, String> {
    BTreeMap::from([(
        utils::STORAGE_ROLE_LABEL_KEY.to_string(),
        utils::STORAGE_ROLE_LABEL_VALUE.to_string(),
    )])
}
