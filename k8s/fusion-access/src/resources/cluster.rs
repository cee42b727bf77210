use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Serialize, Deserialize, Default, Debug, PartialEq, Clone, JsonSchema)]
#[kube(
    group = "scale.spectrum.ibm.com",
    version = "v1beta1",
    kind = "Cluster",
    plural = "clusters",
    derive = "PartialEq",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
/// The storage cluster control resource. There is at most one per installation.
pub struct ClusterSpec {
    /// The license the cluster runs under.
    pub license: ClusterLicense,
    /// Placement of the storage daemons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemon: Option<NodeSelectorSpec>,
    /// Placement of the performance collectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmcollector: Option<NodeSelectorSpec>,
}

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone, JsonSchema)]
pub struct ClusterLicense {
    pub accept: bool,
    pub license: String,
}

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelectorSpec {
    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,
}

impl ClusterSpec {
    /// A cluster spec accepting the given license, with daemons and collectors placed on
    /// the nodes matching `node_selector`.
    pub fn new(license: &str, node_selector: BTreeMap<String, String>) -> Self {
        Self {
            license: ClusterLicense {
                accept: true,
                license: license.to_string(),
            },
            daemon: Some(NodeSelectorSpec {
                node_selector: node_selector.clone(),
            }),
            pmcollector: Some(NodeSelectorSpec { node_selector }),
        }
    }
}
