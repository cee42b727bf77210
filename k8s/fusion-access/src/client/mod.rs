//! The remote API calls issued by the console workflows and the filesystem job.

#[cfg(test)]
pub(crate) mod fake;

use crate::{
    error::Error,
    resources::{Cluster, Filesystem, LocalDisk},
};
use async_trait::async_trait;
use k8s_openapi::api::{batch::v1::Job, core::v1::Node, storage::v1::StorageClass};
use kube::{
    api::{DeleteParams, Patch, PatchParams, PostParams},
    Api, Client, ResourceExt,
};

/// Create, patch, get and delete calls against the typed resources.
///
/// Every get fails with [`Error::NotFound`] when the resource does not exist. Patches
/// are JSON merge patches.
#[async_trait]
pub trait StorageApi: Send + Sync {
    async fn get_node(&self, name: &str) -> Result<Node, Error>;
    async fn patch_node(&self, name: &str, patch: serde_json::Value) -> Result<Node, Error>;

    async fn create_cluster(&self, cluster: &Cluster) -> Result<Cluster, Error>;

    async fn create_job(&self, job: &Job) -> Result<Job, Error>;
    async fn patch_job(
        &self,
        name: &str,
        namespace: &str,
        patch: serde_json::Value,
    ) -> Result<(), Error>;
    async fn delete_job(&self, name: &str, namespace: &str) -> Result<(), Error>;

    async fn get_filesystem(&self, name: &str, namespace: &str) -> Result<Filesystem, Error>;
    async fn create_filesystem(&self, filesystem: &Filesystem) -> Result<Filesystem, Error>;
    async fn patch_filesystem(
        &self,
        name: &str,
        namespace: &str,
        patch: serde_json::Value,
    ) -> Result<(), Error>;
    async fn delete_filesystem(&self, name: &str, namespace: &str) -> Result<(), Error>;

    async fn create_storage_class(&self, storage_class: &StorageClass) -> Result<StorageClass, Error>;
    async fn delete_storage_class(&self, name: &str) -> Result<(), Error>;

    async fn get_local_disk(&self, name: &str, namespace: &str) -> Result<LocalDisk, Error>;
    async fn create_local_disk(&self, disk: &LocalDisk) -> Result<LocalDisk, Error>;
    async fn delete_local_disk(&self, name: &str, namespace: &str) -> Result<(), Error>;
}

/// [`StorageApi`] over a kube client.
#[derive(Clone)]
pub struct KubeStorageApi {
    client: Client,
}

impl KubeStorageApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
    /// Connect with the inferred configuration, in cluster or from the kubeconfig.
    pub async fn try_default() -> Result<Self, Error> {
        Ok(Self::new(Client::try_default().await?))
    }
    fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
    fn all<K>(&self) -> Api<K>
    where
        K: kube::Resource,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::all(self.client.clone())
    }
}

/// Map a 404 into a typed not found error.
fn api_error(error: kube::Error, kind: &str, name: &str, namespace: &str) -> Error {
    match error {
        kube::Error::Api(response) if response.code == 404 => Error::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        },
        source => Error::Kube { source },
    }
}

fn namespace_of<K: ResourceExt>(obj: &K, kind: &str) -> Result<String, Error> {
    obj.namespace().ok_or_else(|| Error::MissingField {
        field: format!("{kind}.metadata.namespace"),
    })
}

fn merge(patch: &serde_json::Value) -> Patch<&serde_json::Value> {
    Patch::Merge(patch)
}

#[async_trait]
impl StorageApi for KubeStorageApi {
    async fn get_node(&self, name: &str) -> Result<Node, Error> {
        self.all::<Node>()
            .get(name)
            .await
            .map_err(|e| api_error(e, "Node", name, ""))
    }
    async fn patch_node(&self, name: &str, patch: serde_json::Value) -> Result<Node, Error> {
        self.all::<Node>()
            .patch(name, &PatchParams::default(), &merge(&patch))
            .await
            .map_err(|e| api_error(e, "Node", name, ""))
    }

    async fn create_cluster(&self, cluster: &Cluster) -> Result<Cluster, Error> {
        Ok(self
            .all::<Cluster>()
            .create(&PostParams::default(), cluster)
            .await?)
    }

    async fn create_job(&self, job: &Job) -> Result<Job, Error> {
        let namespace = namespace_of(job, "job")?;
        Ok(self
            .namespaced::<Job>(&namespace)
            .create(&PostParams::default(), job)
            .await?)
    }
    async fn patch_job(
        &self,
        name: &str,
        namespace: &str,
        patch: serde_json::Value,
    ) -> Result<(), Error> {
        self.namespaced::<Job>(namespace)
            .patch(name, &PatchParams::default(), &merge(&patch))
            .await
            .map_err(|e| api_error(e, "Job", name, namespace))?;
        Ok(())
    }
    async fn delete_job(&self, name: &str, namespace: &str) -> Result<(), Error> {
        // remove the job's pods along with it
        let params = DeleteParams::background();
        self.namespaced::<Job>(namespace)
            .delete(name, &params)
            .await
            .map_err(|e| api_error(e, "Job", name, namespace))?;
        Ok(())
    }

    async fn get_filesystem(&self, name: &str, namespace: &str) -> Result<Filesystem, Error> {
        self.namespaced::<Filesystem>(namespace)
            .get(name)
            .await
            .map_err(|e| api_error(e, "Filesystem", name, namespace))
    }
    async fn create_filesystem(&self, filesystem: &Filesystem) -> Result<Filesystem, Error> {
        let namespace = namespace_of(filesystem, "filesystem")?;
        Ok(self
            .namespaced::<Filesystem>(&namespace)
            .create(&PostParams::default(), filesystem)
            .await?)
    }
    async fn patch_filesystem(
        &self,
        name: &str,
        namespace: &str,
        patch: serde_json::Value,
    ) -> Result<(), Error> {
        self.namespaced::<Filesystem>(namespace)
            .patch(name, &PatchParams::default(), &merge(&patch))
            .await
            .map_err(|e| api_error(e, "Filesystem", name, namespace))?;
        Ok(())
    }
    async fn delete_filesystem(&self, name: &str, namespace: &str) -> Result<(), Error> {
        self.namespaced::<Filesystem>(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| api_error(e, "Filesystem", name, namespace))?;
        Ok(())
    }

    async fn create_storage_class(&self, storage_class: &StorageClass) -> Result<StorageClass, Error> {
        Ok(self
            .all::<StorageClass>()
            .create(&PostParams::default(), storage_class)
            .await?)
    }
    async fn delete_storage_class(&self, name: &str) -> Result<(), Error> {
        self.all::<StorageClass>()
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| api_error(e, "StorageClass", name, ""))?;
        Ok(())
    }

    async fn get_local_disk(&self, name: &str, namespace: &str) -> Result<LocalDisk, Error> {
        self.namespaced::<LocalDisk>(namespace)
            .get(name)
            .await
            .map_err(|e| api_error(e, "LocalDisk", name, namespace))
    }
    async fn create_local_disk(&self, disk: &LocalDisk) -> Result<LocalDisk, Error> {
        let namespace = namespace_of(disk, "localdisk")?;
        Ok(self
            .namespaced::<LocalDisk>(&namespace)
            .create(&PostParams::default(), disk)
            .await?)
    }
    async fn delete_local_disk(&self, name: &str, namespace: &str) -> Result<(), Error> {
        self.namespaced::<LocalDisk>(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| api_error(e, "LocalDisk", name, namespace))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::{core::ErrorResponse, ResourceExt};

    #[test]
    fn not_found_mapping() {
        let error = api_error(
            kube::Error::Api(ErrorResponse {
                status: "Failure".into(),
                message: "localdisks \"d1\" not found".into(),
                reason: "NotFound".into(),
                code: 404,
            }),
            "LocalDisk",
            "d1",
            "ibm-spectrum-scale",
        );
        assert!(error.is_not_found());
        assert_eq!(
            error.to_string(),
            "LocalDisk 'd1' not found in namespace 'ibm-spectrum-scale'"
        );

        let error = api_error(
            kube::Error::Api(ErrorResponse {
                status: "Failure".into(),
                message: "admission webhook denied the request".into(),
                reason: "Forbidden".into(),
                code: 403,
            }),
            "LocalDisk",
            "d1",
            "ibm-spectrum-scale",
        );
        assert!(!error.is_not_found());
        assert_eq!(error.to_string(), "admission webhook denied the request");
    }

    #[test]
    fn created_objects_need_a_namespace() {
        let disk = LocalDisk::new(
            "sdb-1",
            crate::resources::LocalDiskSpec::new("/dev/sdb", "worker-0"),
        );
        assert!(disk.namespace().is_none());
        assert_eq!(
            namespace_of(&disk, "localdisk").unwrap_err().to_string(),
            "Invalid resource field: localdisk.metadata.namespace"
        );
    }
}
