use crate::resources::discovery::{discovered_devices, LocalVolumeDiscoveryResult};
use std::collections::BTreeSet;

/// The WWNs of the devices discovered on the node, empty when the node has no discovery
/// result yet.
fn node_wwns<'a>(results: &'a [LocalVolumeDiscoveryResult], node_name: &str) -> BTreeSet<&'a str> {
    discovered_devices(results, node_name)
        .iter()
        .map(|d| d.wwn())
        .collect()
}

/// The number of disks visible on every selected node.
///
/// A single node cannot share a disk, so fewer than two nodes always count zero. A selected
/// node without a discovery result empties the intersection: disks are never reported as
/// shared until every selected node has been discovered.
pub fn shared_disk_count<'a>(
    selected_nodes: impl IntoIterator<Item = &'a str>,
    results: &[LocalVolumeDiscoveryResult],
) -> usize {
    let sets: Vec<BTreeSet<&str>> = selected_nodes
        .into_iter()
        .map(|n| node_wwns(results, n))
        .collect();
    if sets.len() < 2 {
        return 0;
    }
    sets.into_iter()
        .reduce(|shared, wwns| shared.intersection(&wwns).copied().collect())
        .map_or(0, |shared| shared.len())
}

/// Summary of the node selection shown above the nodes table.
pub fn shared_disks_message(selected_nodes: usize, shared_disks: usize) -> String {
    match (selected_nodes, shared_disks) {
        (0, _) => "No nodes selected".to_string(),
        (1, _) => "1 node selected".to_string(),
        (n, 1) => format!("{n} nodes selected with 1 shared disk"),
        (n, s) => format!("{n} nodes selected with {s} shared disks"),
    }
}
