//! Typed views of the remote resources observed and mutated by the console.
//!
//! Custom resources are declared with `kube::CustomResource`; core kinds come from
//! `k8s-openapi`. Nearly every field the server populates is optional and must be
//! checked before use.

pub mod cluster;
pub mod condition;
pub mod discovery;
pub mod filesystem;
pub mod job;
pub mod localdisk;
pub mod node;
pub mod quantity;
pub mod storageclass;

pub use cluster::{Cluster, ClusterSpec};
pub use condition::{find_condition, ResourceCondition};
pub use discovery::{DiscoveredDevice, LocalVolumeDiscoveryResult};
pub use filesystem::{Filesystem, FilesystemSpec, FilesystemStatus};
pub use localdisk::{LocalDisk, LocalDiskSpec};

use kube::ResourceExt;

/// Check whether the object carries the label `key` with exactly `value`.
pub fn has_label<K: ResourceExt>(obj: &K, key: &str, value: &str) -> bool {
    obj.labels().get(key).map(String::as_str) == Some(value)
}

/// Check whether the object carries the label `key`, whatever its value.
pub fn has_label_key<K: ResourceExt>(obj: &K, key: &str) -> bool {
    obj.labels().contains_key(key)
}
