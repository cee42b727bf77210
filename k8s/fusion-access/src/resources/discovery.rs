use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "fusion.storage.openshift.io",
    version = "v1alpha1",
    kind = "LocalVolumeDiscoveryResult",
    plural = "localvolumediscoveryresults",
    namespaced,
    status = "LocalVolumeDiscoveryResultStatus",
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
/// The per node report of the block devices visible on that node.
pub struct LocalVolumeDiscoveryResultSpec {
    /// The node the devices were discovered on.
    pub node_name: String,
}

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalVolumeDiscoveryResultStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_time: Option<String>,
    #[serde(default)]
    pub discovered_devices: Vec<DiscoveredDevice>,
}

/// A block device (LUN) visible on a node.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredDevice {
    #[serde(default, rename = "deviceID")]
    pub device_id: String,
    pub path: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub serial: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: i64,
    /// The world wide name, prefixed with `uuid.`.
    #[serde(default, rename = "WWN")]
    pub wwn: String,
}

impl DiscoveredDevice {
    /// The world wide name without the discovery report's prefix.
    pub fn wwn(&self) -> &str {
        self.wwn
            .strip_prefix(utils::WWN_PREFIX)
            .unwrap_or(self.wwn.as_str())
    }
}

impl LocalVolumeDiscoveryResult {
    /// The node the report belongs to.
    pub fn node_name(&self) -> &str {
        &self.spec.node_name
    }
    /// The devices reported, or none if the status is not populated yet.
    pub fn discovered_devices(&self) -> &[DiscoveredDevice] {
        self.status
            .as_ref()
            .map(|s| s.discovered_devices.as_slice())
            .unwrap_or_default()
    }
}

/// The discovered devices of the named node, or none if it has no report.
pub fn discovered_devices<'a>(
    results: &'a [LocalVolumeDiscoveryResult],
    node_name: &str,
) -> &'a [DiscoveredDevice] {
    results
        .iter()
        .find(|r| r.node_name() == node_name)
        .map(|r| r.discovered_devices())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wwn_prefix_is_stripped() {
        let device = DiscoveredDevice {
            wwn: "uuid.600a0980383030".to_string(),
            ..Default::default()
        };
        assert_eq!(device.wwn(), "600a0980383030");

        let device = DiscoveredDevice {
            wwn: "naa.600a".to_string(),
            ..Default::default()
        };
        assert_eq!(device.wwn(), "naa.600a");
    }

    #[test]
    fn discovered_devices_deserialize() {
        let result: LocalVolumeDiscoveryResult = serde_json::from_value(serde_json::json!({
            "apiVersion": "fusion.storage.openshift.io/v1alpha1",
            "kind": "LocalVolumeDiscoveryResult",
            "metadata": { "name": "discovery-result-worker-0", "namespace": "ibm-fusion-access" },
            "spec": { "nodeName": "worker-0" },
            "status": {
                "discoveredDevices": [
                    { "deviceID": "/dev/disk/by-id/wwn-0x1", "path": "/dev/sdb", "size": 107374182400_i64, "WWN": "uuid.1" }
                ]
            }
        }))
        .unwrap();
        let results = vec![result];
        let devices = discovered_devices(&results, "worker-0");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].path, "/dev/sdb");
        assert_eq!(devices[0].wwn(), "1");
        assert!(discovered_devices(&results, "worker-1").is_empty());
    }
}
