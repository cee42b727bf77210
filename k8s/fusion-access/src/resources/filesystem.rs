use super::condition::{find_condition, ResourceCondition};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(CustomResource, Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "scale.spectrum.ibm.com",
    version = "v1beta1",
    kind = "Filesystem",
    plural = "filesystems",
    namespaced,
    status = "FilesystemStatus",
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
/// The shared file system built from pools of LocalDisks.
pub struct FilesystemSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalFilesystemSpec>,
}

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalFilesystemSpec {
    #[serde(default)]
    pub pools: Vec<FilesystemPool>,
    #[serde(default)]
    pub replication: String,
    #[serde(default, rename = "type")]
    pub type_: String,
}

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilesystemPool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Names of the LocalDisks composing the pool.
    #[serde(default)]
    pub disks: Vec<String>,
}

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilesystemStatus {
    #[serde(default)]
    pub conditions: Vec<ResourceCondition>,
    #[serde(default)]
    pub pools: Vec<FilesystemPoolStatus>,
}

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilesystemPoolStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_disk_size: Option<String>,
}

/// Replication used for file systems created by the console.
pub const REPLICATION: &str = "1-way";
/// Type of file systems created by the console.
pub const SHARED: &str = "shared";

impl FilesystemSpec {
    /// A shared, single pool file system spec made of the given LocalDisks.
    /// Duplicate disk names are dropped, preserving the first occurrence.
    pub fn shared(disks: impl IntoIterator<Item = String>) -> Self {
        let mut seen = BTreeSet::new();
        let disks = disks
            .into_iter()
            .filter(|d| !d.is_empty() && seen.insert(d.clone()))
            .collect();
        Self {
            local: Some(LocalFilesystemSpec {
                pools: vec![FilesystemPool { name: None, disks }],
                replication: REPLICATION.to_string(),
                type_: SHARED.to_string(),
            }),
        }
    }
}

impl Filesystem {
    /// The status conditions, or none.
    pub fn conditions(&self) -> &[ResourceCondition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }
    /// The condition of the given type.
    pub fn condition(&self, type_: &str) -> Option<&ResourceCondition> {
        find_condition(self.conditions(), type_)
    }
    /// Whether a deletion is in flight.
    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }
    /// The union of the LocalDisk names referenced by all pools, in first seen order.
    pub fn local_disk_names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.spec
            .local
            .iter()
            .flat_map(|l| l.pools.iter())
            .flat_map(|p| p.disks.iter())
            .filter(|d| seen.insert(d.as_str()))
            .cloned()
            .collect()
    }
    /// Raw capacity of the file system.
    /// Only single pool file systems are created, so the first pool is the whole capacity.
    pub fn raw_capacity(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.pools.first())
            .and_then(|p| p.total_disk_size.as_deref())
    }
    /// Whether the admission webhook will let the file system be deleted.
    pub fn is_delete_allowed(&self) -> bool {
        super::has_label_key(self, utils::FS_ALLOW_DELETE_LABEL)
    }
}

/// Merge patch adding the label the admission webhook requires before a file system may
/// be deleted.
pub fn allow_delete_patch() -> serde_json::Value {
    serde_json::json!({ "metadata": { "labels": { (utils::FS_ALLOW_DELETE_LABEL): "" } } })
}
