//! The LUNs offered when creating a file system.

use crate::{
    resources::{
        job::LunSpec, node::is_storage_node, DiscoveredDevice, Filesystem, LocalDisk,
        LocalVolumeDiscoveryResult,
    },
    watch::Watched,
};
use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use std::collections::BTreeSet;
use utils::bytes::to_gib;

/// A selectable LUN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lun {
    /// Unique row id: the WWN of a discovered device or the name of a reused LocalDisk.
    pub id: String,
    /// Device path on the node.
    pub path: String,
    /// WWN without the discovery prefix, empty for reused LocalDisks.
    pub wwn: String,
    pub node: String,
    pub capacity: String,
    pub is_selected: bool,
    /// Backed by an existing, unused LocalDisk.
    pub is_reused: bool,
    pub local_disk_name: Option<String>,
}

impl Lun {
    fn discovered(device: &DiscoveredDevice, node: &str) -> Self {
        Self {
            id: device.wwn().to_string(),
            path: device.path.clone(),
            wwn: device.wwn().to_string(),
            node: node.to_string(),
            // GiB shown with the GB suffix, as the storage product does
            capacity: format!("{:.2} GB", to_gib(device.size as f64)),
            is_selected: false,
            is_reused: false,
            local_disk_name: None,
        }
    }
    fn reused(disk: &UnusedLocalDisk) -> Self {
        Self {
            id: disk.name.clone(),
            path: disk.device.clone(),
            wwn: String::new(),
            node: disk.node.clone(),
            capacity: disk
                .capacity
                .clone()
                .unwrap_or_else(|| utils::VALUE_NOT_AVAILABLE.to_string()),
            is_selected: false,
            is_reused: true,
            local_disk_name: Some(disk.name.clone()),
        }
    }
    /// What the creation job needs to know about the LUN.
    pub fn spec(&self) -> LunSpec {
        LunSpec {
            path: self.path.clone(),
            wwn: self.wwn.clone(),
            node: self.node.clone(),
            is_reused: self.is_reused,
            local_disk_name: self.local_disk_name.clone(),
        }
    }
}

/// A LocalDisk which no file system references any longer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedLocalDisk {
    pub name: String,
    pub device: String,
    pub node: String,
    pub capacity: Option<String>,
}

/// The LocalDisks not referenced by any file system pool. Disks without a device or a
/// node cannot be reused and are left out.
pub fn unused_local_disks(disks: &[LocalDisk], filesystems: &[Filesystem]) -> Vec<UnusedLocalDisk> {
    let used: BTreeSet<String> = filesystems
        .iter()
        .flat_map(|fs| fs.local_disk_names())
        .collect();
    disks
        .iter()
        .filter(|d| !used.contains(&d.name_any()))
        .filter(|d| !d.spec.device.is_empty() && !d.spec.node.is_empty())
        .map(|d| UnusedLocalDisk {
            name: d.name_any(),
            device: d.spec.device.clone(),
            node: d.spec.node.clone(),
            capacity: d.size().map(ToString::to_string),
        })
        .collect()
}

/// The discovery results of the storage nodes.
pub fn storage_nodes_discovery(
    nodes: &[Node],
    results: &[LocalVolumeDiscoveryResult],
) -> Vec<LocalVolumeDiscoveryResult> {
    let storage_nodes: BTreeSet<String> = nodes
        .iter()
        .filter(|n| is_storage_node(n))
        .map(|n| n.name_any())
        .collect();
    results
        .iter()
        .filter(|r| storage_nodes.contains(r.node_name()))
        .cloned()
        .collect()
}

/// The LUN selection table.
///
/// Storage nodes share their disks by construction, so the first storage node's
/// discovery result stands for all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LunsTable {
    pub loaded: bool,
    pub node_name: Option<String>,
    pub luns: Vec<Lun>,
}

impl LunsTable {
    pub fn new(storage_results: &Watched<Vec<LocalVolumeDiscoveryResult>>, unused: &[UnusedLocalDisk]) -> Self {
        let first = storage_results.data().and_then(|r| r.first());
        let node_name = first.map(|r| r.node_name().to_string());
        let mut luns: Vec<Lun> = match first {
            Some(result) => result
                .discovered_devices()
                .iter()
                .map(|d| Lun::discovered(d, result.node_name()))
                .collect(),
            None => vec![],
        };
        luns.extend(unused.iter().map(Lun::reused));
        Self {
            loaded: storage_results.loaded && node_name.is_some(),
            node_name,
            luns,
        }
    }

    /// Rebuild the table from fresh watch data, keeping the selection of the LUNs still
    /// present.
    pub fn refresh(&mut self, fresh: LunsTable) {
        let selected: BTreeSet<String> = self.selected().map(|l| l.id.clone()).collect();
        *self = fresh;
        for lun in &mut self.luns {
            lun.is_selected = selected.contains(&lun.id);
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.luns.iter().any(|l| l.id == id && l.is_selected)
    }
    pub fn set_selected(&mut self, id: &str, is_selected: bool) {
        if let Some(lun) = self.luns.iter_mut().find(|l| l.id == id) {
            lun.is_selected = is_selected;
        }
    }
    pub fn set_all_selected(&mut self, is_selected: bool) {
        self.luns.iter_mut().for_each(|l| l.is_selected = is_selected);
    }
    pub fn selected(&self) -> impl Iterator<Item = &Lun> {
        self.luns.iter().filter(|l| l.is_selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        resources::{node::tests::node, LocalDiskSpec, FilesystemSpec},
        storage_cluster::disks::tests::discovery,
    };

    fn local_disk(name: &str, device: &str, node: &str) -> LocalDisk {
        LocalDisk::new(name, LocalDiskSpec::new(device, node))
    }

    #[test]
    fn discovered_and_reused_luns() {
        let results = vec![discovery("w0", &["A", "B"])];
        let disks = vec![
            local_disk("sdd-c", "/dev/sdd", "w0"),
            local_disk("sde-d", "/dev/sde", "w0"),
            local_disk("broken", "", "w0"),
        ];
        let filesystems = vec![Filesystem::new("fs1", FilesystemSpec::shared(vec!["sde-d".into()]))];
        let unused = unused_local_disks(&disks, &filesystems);
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].name, "sdd-c");

        let table = LunsTable::new(&Watched::ready(results), &unused);
        assert!(table.loaded);
        assert_eq!(table.node_name.as_deref(), Some("w0"));
        assert_eq!(table.luns.len(), 3);
        assert_eq!(table.luns[0].id, "A");
        assert_eq!(table.luns[0].path, "/dev/sdb");
        assert_eq!(table.luns[0].capacity, "100.00 GB");
        assert!(!table.luns[0].is_reused);

        let reused = &table.luns[2];
        assert!(reused.is_reused);
        assert_eq!(reused.capacity, "--");
        assert_eq!(reused.spec().local_disk_name.as_deref(), Some("sdd-c"));
    }

    #[test]
    fn not_loaded_without_storage_node() {
        let table = LunsTable::new(&Watched::ready(vec![]), &[]);
        assert!(!table.loaded);
        let table = LunsTable::new(&Watched::loading(), &[]);
        assert!(!table.loaded);
        assert!(table.luns.is_empty());
    }

    #[test]
    fn selection() {
        let mut table = LunsTable::new(&Watched::ready(vec![discovery("w0", &["A", "B"])]), &[]);
        table.set_selected("A", true);
        table.set_selected("missing", true);
        assert!(table.is_selected("A"));
        assert_eq!(table.selected().count(), 1);
        table.set_all_selected(true);
        assert_eq!(table.selected().count(), 2);
        table.set_all_selected(false);
        table.set_selected("B", true);

        table.refresh(LunsTable::new(
            &Watched::ready(vec![discovery("w0", &["B", "C"])]),
            &[],
        ));
        assert!(table.is_selected("B"));
        assert!(!table.is_selected("C"));
    }

    #[test]
    fn storage_nodes_only() {
        let nodes = vec![
            node("w0", &[(utils::STORAGE_ROLE_LABEL_KEY, "storage")], None),
            node("w1", &[], None),
        ];
        let results = vec![discovery("w1", &["A"]), discovery("w0", &["A"])];
        let filtered = storage_nodes_discovery(&nodes, &results);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].node_name(), "w0");
    }
}
