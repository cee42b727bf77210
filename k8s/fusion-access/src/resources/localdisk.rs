use super::condition::{find_condition, ResourceCondition};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone, JsonSchema)]
#[kube(
    group = "scale.spectrum.ibm.com",
    version = "v1beta1",
    kind = "LocalDisk",
    plural = "localdisks",
    namespaced,
    status = "LocalDiskStatus",
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
/// A claim of one physical device on one node.
pub struct LocalDiskSpec {
    /// The device path on the node, eg: /dev/sdb.
    pub device: String,
    /// The node the device is claimed on.
    pub node: String,
}

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalDiskStatus {
    #[serde(default)]
    pub conditions: Vec<ResourceCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<String>,
}

/// The condition reporting whether a file system still uses the disk.
pub const USED_CONDITION: &str = "Used";

impl LocalDiskSpec {
    /// Create a new spec claiming `device` on `node`.
    pub fn new(device: &str, node: &str) -> Self {
        Self {
            device: device.to_string(),
            node: node.to_string(),
        }
    }
}

impl LocalDisk {
    /// The status conditions, or none.
    pub fn conditions(&self) -> &[ResourceCondition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }
    /// A disk is unused when its "Used" condition is "False" or was never reported.
    pub fn is_unused(&self) -> bool {
        find_condition(self.conditions(), USED_CONDITION).map_or(true, |c| c.is_false())
    }
    /// The size reported by the storage scale operator.
    pub fn size(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.size.as_deref())
    }
}

/// Make a valid resource name out of `name`: lower case, `_`, `:` and `.` replaced by `-`,
/// truncated to the maximum resource name length without a trailing `-`.
pub fn sanitize_name(name: &str) -> String {
    let name: String = name
        .chars()
        .map(|c| match c {
            '_' | ':' | '.' => '-',
            c => c.to_ascii_lowercase(),
        })
        .take(utils::MAX_RESOURCE_NAME_LENGTH)
        .collect();
    name.trim_end_matches('-').to_string()
}

/// The LocalDisk name for the LUN at `path` with the world wide name `wwn`.
pub fn local_disk_name(path: &str, wwn: &str) -> String {
    let device = path.strip_prefix("/dev/").unwrap_or(path);
    sanitize_name(&format!("{device}-{wwn}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(local_disk_name("/dev/sdb", "600A0980.3830"), "sdb-600a0980-3830");
        assert_eq!(local_disk_name("/dev/disk_1", "naa:1"), "disk-1-naa-1");
        let long = local_disk_name("/dev/sdb", &"a".repeat(100));
        assert_eq!(long.len(), utils::MAX_RESOURCE_NAME_LENGTH);
        assert_eq!(sanitize_name(&format!("{}.b", "a".repeat(62))), "a".repeat(62));
    }

    #[test]
    fn used_condition() {
        let mut disk = LocalDisk::new("sdb-1", LocalDiskSpec::new("/dev/sdb", "worker-0"));
        assert!(disk.is_unused());
        disk.status = Some(LocalDiskStatus {
            conditions: vec![ResourceCondition::new("Used", "True", "InUse")],
            ..Default::default()
        });
        assert!(!disk.is_unused());
        disk.status = Some(LocalDiskStatus {
            conditions: vec![ResourceCondition::new("Used", "False", "NotUsed")],
            ..Default::default()
        });
        assert!(disk.is_unused());
    }
}
