//! Deletion of a file system together with its StorageClasses and LocalDisks.

use super::waiter::wait_for_local_disk_unused;
use crate::{
    client::StorageApi,
    config::LocalDiskWait,
    error::{Error, WaitErrorReason},
    resources::{
        filesystem::allow_delete_patch, storageclass::filesystem_storage_classes, Filesystem,
    },
};
use futures::future::join_all;
use k8s_openapi::api::storage::v1::StorageClass;
use kube::ResourceExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// First line of the error list when some LocalDisks could not be deleted.
pub const LOCAL_DISKS_DELETE_ERROR: &str = "Failed to delete the following local disks:";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteModalState {
    pub filesystem: Option<Filesystem>,
    pub is_open: bool,
    pub is_deleting: bool,
    pub errors: Vec<String>,
}

/// The delete confirmation modal of the file systems list.
#[derive(Debug, Clone, Default)]
pub struct DeleteModal {
    state: Arc<Mutex<DeleteModalState>>,
}

impl DeleteModal {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn state(&self) -> DeleteModalState {
        self.state.lock().clone()
    }
    /// Ask for confirmation of the deletion of `filesystem`.
    pub fn open(&self, filesystem: Filesystem) {
        let mut state = self.state.lock();
        state.filesystem = Some(filesystem);
        state.is_open = true;
        state.is_deleting = false;
        state.errors.clear();
    }
    pub fn close(&self) {
        self.state.lock().is_open = false;
    }
    fn begin(&self) {
        let mut state = self.state.lock();
        state.is_deleting = true;
        state.errors.clear();
    }
    fn finish(&self) {
        let mut state = self.state.lock();
        state.is_deleting = false;
        state.is_open = false;
    }
    fn fail(&self, errors: Vec<String>) {
        let mut state = self.state.lock();
        state.is_deleting = false;
        state.errors = errors;
    }
}

/// Delete the file system of the modal and everything it was built from, closing the
/// modal once all of it is gone.
///
/// Steps are not transactional: a failure to label or delete the file system aborts
/// right away, while failures on StorageClasses and LocalDisks are collected and leave
/// the modal open for a retry.
#[tracing::instrument(skip_all)]
pub async fn delete_filesystem(
    api: &dyn StorageApi,
    modal: &DeleteModal,
    storage_classes: &[StorageClass],
    wait: &LocalDiskWait,
) {
    let Some(filesystem) = modal.state().filesystem else {
        return;
    };
    let (name, Some(namespace)) = (filesystem.name_any(), filesystem.namespace()) else {
        return;
    };

    modal.begin();
    let result =
        delete_filesystem_resources(api, &filesystem, &name, &namespace, storage_classes, wait)
            .await;
    match result {
        Ok(failures) if failures.is_empty() => {
            info!(filesystem.name = %name, "Filesystem deleted");
            modal.finish();
        }
        Ok(failures) => {
            let errors = std::iter::once(LOCAL_DISKS_DELETE_ERROR.to_string())
                .chain(failures)
                .collect();
            modal.fail(errors);
        }
        Err(error) => {
            warn!(%error, filesystem.name = %name, "Failed to delete filesystem");
            modal.fail(vec![error.to_string()]);
        }
    }
}

/// Returns the `<disk> - <error>` lines of the LocalDisks which could not be deleted.
async fn delete_filesystem_resources(
    api: &dyn StorageApi,
    filesystem: &Filesystem,
    name: &str,
    namespace: &str,
    storage_classes: &[StorageClass],
    wait: &LocalDiskWait,
) -> Result<Vec<String>, Error> {
    if !filesystem.is_delete_allowed() {
        api.patch_filesystem(name, namespace, allow_delete_patch()).await?;
    }
    api.delete_filesystem(name, namespace).await?;

    let deletions = filesystem_storage_classes(name, storage_classes)
        .into_iter()
        .map(|sc| async move {
            let sc_name = sc.name_any();
            if let Err(error) = api.delete_storage_class(&sc_name).await {
                warn!(%error, storage_class.name = %sc_name, "Failed to delete StorageClass");
            }
        });
    join_all(deletions).await;

    let disks = filesystem.local_disk_names();
    let deletions = disks
        .iter()
        .map(|disk| delete_local_disk(api, disk, namespace, wait));
    let failures = join_all(deletions)
        .await
        .into_iter()
        .zip(&disks)
        .filter_map(|(result, disk)| result.err().map(|error| format!("{disk} - {error}")))
        .collect();
    Ok(failures)
}

/// Delete the LocalDisk once no file system uses it any longer. A disk which is already
/// gone counts as deleted.
async fn delete_local_disk(
    api: &dyn StorageApi,
    disk: &str,
    namespace: &str,
    wait: &LocalDiskWait,
) -> Result<(), Error> {
    match wait_for_local_disk_unused(api, disk, namespace, wait).await {
        Ok(()) => api.delete_local_disk(disk, namespace).await,
        Err(error) if error.wait_reason() == Some(WaitErrorReason::ResourceNotFound) => Ok(()),
        Err(error) => Err(error),
    }
}
