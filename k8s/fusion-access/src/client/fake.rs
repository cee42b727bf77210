//! In-memory [`StorageApi`] recording every call it receives.

use super::StorageApi;
use crate::{
    error::Error,
    resources::{
        localdisk::{LocalDiskStatus, USED_CONDITION},
        Cluster, Filesystem, LocalDisk, ResourceCondition,
    },
};
use async_trait::async_trait;
use k8s_openapi::api::{batch::v1::Job, core::v1::Node, storage::v1::StorageClass};
use kube::{core::ErrorResponse, ResourceExt};
use parking_lot::Mutex;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::Semaphore;

#[derive(Default)]
pub(crate) struct FakeState {
    pub(crate) nodes: BTreeMap<String, Node>,
    pub(crate) clusters: Vec<Cluster>,
    pub(crate) jobs: BTreeMap<String, Job>,
    pub(crate) job_patches: Vec<(String, serde_json::Value)>,
    pub(crate) filesystems: BTreeMap<String, Filesystem>,
    pub(crate) storage_classes: BTreeMap<String, StorageClass>,
    pub(crate) local_disks: BTreeMap<String, LocalDisk>,
    /// Remaining gets for which a LocalDisk still reports `Used=True`.
    pub(crate) used_for: BTreeMap<String, usize>,
    /// Calls which fail, keyed like the recorded calls.
    pub(crate) failures: BTreeMap<String, String>,
    pub(crate) calls: Vec<String>,
}

#[derive(Default, Clone)]
pub(crate) struct FakeStorageApi {
    pub(crate) state: Arc<Mutex<FakeState>>,
    /// When set, node patches wait for a permit.
    pub(crate) node_patch_gate: Option<Arc<Semaphore>>,
}

fn rejected(message: &str) -> Error {
    Error::Kube {
        source: kube::Error::Api(ErrorResponse {
            status: "Failure".into(),
            message: message.to_string(),
            reason: "Forbidden".into(),
            code: 403,
        }),
    }
}

fn not_found(kind: &str, name: &str, namespace: &str) -> Error {
    Error::NotFound {
        kind: kind.to_string(),
        name: name.to_string(),
        namespace: namespace.to_string(),
    }
}

impl FakeStorageApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }
    pub(crate) fn with_node_patch_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.node_patch_gate = Some(gate);
        self
    }
    pub(crate) fn add_node(&self, node: Node) {
        self.state.lock().nodes.insert(node.name_any(), node);
    }
    pub(crate) fn add_filesystem(&self, filesystem: Filesystem) {
        self.state
            .lock()
            .filesystems
            .insert(filesystem.name_any(), filesystem);
    }
    pub(crate) fn add_local_disk(&self, disk: LocalDisk) {
        self.state.lock().local_disks.insert(disk.name_any(), disk);
    }
    pub(crate) fn add_storage_class(&self, storage_class: StorageClass) {
        self.state
            .lock()
            .storage_classes
            .insert(storage_class.name_any(), storage_class);
    }
    pub(crate) fn add_job(&self, job: Job) {
        self.state.lock().jobs.insert(job.name_any(), job);
    }
    /// The LocalDisk reports `Used=True` for the next `gets` gets.
    pub(crate) fn keep_used(&self, disk: &str, gets: usize) {
        self.state.lock().used_for.insert(disk.to_string(), gets);
    }
    /// Make the call fail with an API rejection carrying `message`.
    /// A call ending with `*` matches every call starting with it.
    pub(crate) fn fail(&self, call: &str, message: &str) {
        self.state
            .lock()
            .failures
            .insert(call.to_string(), message.to_string());
    }
    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }
    /// Calls starting with `prefix`.
    pub(crate) fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }
    fn record(&self, call: String) -> Result<(), Error> {
        let mut state = self.state.lock();
        let failure = state
            .failures
            .iter()
            .find(|(key, _)| match key.strip_suffix('*') {
                Some(prefix) => call.starts_with(prefix),
                None => **key == call,
            })
            .map(|(_, message)| message.clone());
        state.calls.push(call);
        match failure {
            Some(message) => Err(rejected(&message)),
            None => Ok(()),
        }
    }
}

fn merge_labels(labels: &mut BTreeMap<String, String>, patch: &serde_json::Value) {
    if let Some(patch) = patch
        .get("metadata")
        .and_then(|m| m.get("labels"))
        .and_then(|l| l.as_object())
    {
        for (key, value) in patch {
            match value.as_str() {
                Some(value) => {
                    labels.insert(key.clone(), value.to_string());
                }
                None => {
                    labels.remove(key);
                }
            }
        }
    }
}

#[async_trait]
impl StorageApi for FakeStorageApi {
    async fn get_node(&self, name: &str) -> Result<Node, Error> {
        self.record(format!("get_node {name}"))?;
        self.state
            .lock()
            .nodes
            .get(name)
            .cloned()
            .ok_or_else(|| not_found("Node", name, ""))
    }
    async fn patch_node(&self, name: &str, patch: serde_json::Value) -> Result<Node, Error> {
        if let Some(gate) = &self.node_patch_gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.record(format!("patch_node {name}"))?;
        let mut state = self.state.lock();
        let node = state
            .nodes
            .get_mut(name)
            .ok_or_else(|| not_found("Node", name, ""))?;
        merge_labels(node.labels_mut(), &patch);
        Ok(node.clone())
    }

    async fn create_cluster(&self, cluster: &Cluster) -> Result<Cluster, Error> {
        self.record(format!("create_cluster {}", cluster.name_any()))?;
        self.state.lock().clusters.push(cluster.clone());
        Ok(cluster.clone())
    }

    async fn create_job(&self, job: &Job) -> Result<Job, Error> {
        self.record(format!("create_job {}", job.name_any()))?;
        self.state.lock().jobs.insert(job.name_any(), job.clone());
        Ok(job.clone())
    }
    async fn patch_job(
        &self,
        name: &str,
        _namespace: &str,
        patch: serde_json::Value,
    ) -> Result<(), Error> {
        self.record(format!("patch_job {name}"))?;
        self.state.lock().job_patches.push((name.to_string(), patch));
        Ok(())
    }
    async fn delete_job(&self, name: &str, namespace: &str) -> Result<(), Error> {
        self.record(format!("delete_job {name}"))?;
        self.state
            .lock()
            .jobs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("Job", name, namespace))
    }

    async fn get_filesystem(&self, name: &str, namespace: &str) -> Result<Filesystem, Error> {
        self.record(format!("get_filesystem {name}"))?;
        self.state
            .lock()
            .filesystems
            .get(name)
            .cloned()
            .ok_or_else(|| not_found("Filesystem", name, namespace))
    }
    async fn create_filesystem(&self, filesystem: &Filesystem) -> Result<Filesystem, Error> {
        self.record(format!("create_filesystem {}", filesystem.name_any()))?;
        self.add_filesystem(filesystem.clone());
        Ok(filesystem.clone())
    }
    async fn patch_filesystem(
        &self,
        name: &str,
        namespace: &str,
        patch: serde_json::Value,
    ) -> Result<(), Error> {
        self.record(format!("patch_filesystem {name}"))?;
        let mut state = self.state.lock();
        let filesystem = state
            .filesystems
            .get_mut(name)
            .ok_or_else(|| not_found("Filesystem", name, namespace))?;
        merge_labels(filesystem.labels_mut(), &patch);
        Ok(())
    }
    async fn delete_filesystem(&self, name: &str, namespace: &str) -> Result<(), Error> {
        self.record(format!("delete_filesystem {name}"))?;
        self.state
            .lock()
            .filesystems
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("Filesystem", name, namespace))
    }

    async fn create_storage_class(&self, storage_class: &StorageClass) -> Result<StorageClass, Error> {
        self.record(format!("create_storage_class {}", storage_class.name_any()))?;
        self.add_storage_class(storage_class.clone());
        Ok(storage_class.clone())
    }
    async fn delete_storage_class(&self, name: &str) -> Result<(), Error> {
        self.record(format!("delete_storage_class {name}"))?;
        self.state
            .lock()
            .storage_classes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("StorageClass", name, ""))
    }

    async fn get_local_disk(&self, name: &str, namespace: &str) -> Result<LocalDisk, Error> {
        self.record(format!("get_local_disk {name}"))?;
        let mut state = self.state.lock();
        let mut disk = state
            .local_disks
            .get(name)
            .cloned()
            .ok_or_else(|| not_found("LocalDisk", name, namespace))?;
        let used = match state.used_for.get_mut(name) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                "True"
            }
            _ => "False",
        };
        disk.status = Some(LocalDiskStatus {
            conditions: vec![ResourceCondition::new(USED_CONDITION, used, "Fake")],
            ..Default::default()
        });
        Ok(disk)
    }
    async fn create_local_disk(&self, disk: &LocalDisk) -> Result<LocalDisk, Error> {
        self.record(format!("create_local_disk {}", disk.name_any()))?;
        self.add_local_disk(disk.clone());
        Ok(disk.clone())
    }
    async fn delete_local_disk(&self, name: &str, namespace: &str) -> Result<(), Error> {
        self.record(format!("delete_local_disk {name}"))?;
        self.state
            .lock()
            .local_disks
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("LocalDisk", name, namespace))
    }
}
