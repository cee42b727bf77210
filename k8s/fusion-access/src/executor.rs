//! The operations of the filesystem job.
//!
//! The console only submits a job; the job creates or removes the storage resources in
//! the cluster and reports the progress of a creation through annotations on itself.

use crate::{
    client::StorageApi,
    error::{CreateResourceSnafu, Error, SerializeSnafu, ValidationSnafu},
    resources::{
        filesystem::allow_delete_patch,
        job::{phase_annotations, CreatedResources, JobPhase, LunSpec, PhaseDetails},
        localdisk::local_disk_name,
        storageclass::filesystem_storage_class,
        Filesystem, FilesystemSpec, LocalDisk, LocalDiskSpec,
    },
};
use kube::ResourceExt;
use snafu::ResultExt;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// A job, by name and namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    pub name: String,
    pub namespace: String,
}

impl JobRef {
    /// A reference, if both parts are given and not empty.
    pub fn new(name: Option<&str>, namespace: Option<&str>) -> Option<Self> {
        match (name, namespace) {
            (Some(name), Some(namespace)) if !name.is_empty() && !namespace.is_empty() => Some(Self {
                name: name.to_string(),
                namespace: namespace.to_string(),
            }),
            _ => None,
        }
    }
}

/// Parse a JSON encoded LUN list, an absent list being empty.
pub fn parse_luns(json: Option<&str>, what: &str) -> Result<Vec<LunSpec>, Error> {
    match json.filter(|j| !j.is_empty()) {
        Some(json) => serde_json::from_str(json).context(SerializeSnafu { what }),
        None => Ok(vec![]),
    }
}

/// Everything a file system creation needs.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub filesystem: String,
    /// Namespace of the LocalDisks and of the file system.
    pub namespace: String,
    /// The job running the creation, which progress is reported on.
    pub job: JobRef,
    pub new_luns: Vec<LunSpec>,
    pub reused_luns: Vec<LunSpec>,
}

/// Records the phases of a creation on the job running it.
struct PhaseReporter<'a> {
    api: &'a dyn StorageApi,
    job: &'a JobRef,
}

impl PhaseReporter<'_> {
    /// Failing to report a phase must not fail the creation, so errors are only logged.
    async fn report(&self, phase: JobPhase, details: PhaseDetails, resources: &CreatedResources) {
        info!(%phase, details = %details.message, "Phase update");
        let annotations = match phase_annotations(phase, &details, resources) {
            Ok(annotations) => annotations,
            Err(error) => {
                warn!(%error, "Failed to encode the job phase");
                return;
            }
        };
        let patch = serde_json::json!({ "metadata": { "annotations": annotations } });
        if let Err(error) = self
            .api
            .patch_job(&self.job.name, &self.job.namespace, patch)
            .await
        {
            warn!(%error, job.name = %self.job.name, "Failed to update job phase");
        }
    }
}

/// The labels of the LocalDisks created for the file system `filesystem`.
fn local_disk_labels(filesystem: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (utils::filesystem_job_label(), "true".to_string()),
        (utils::filesystem_name_label(), filesystem.to_string()),
    ])
}

async fn create_local_disks(
    api: &dyn StorageApi,
    request: &CreateRequest,
    resources: &mut CreatedResources,
) -> Result<(), Error> {
    let count = request.new_luns.len();
    for (index, lun) in request.new_luns.iter().enumerate() {
        let name = local_disk_name(&lun.path, &lun.wwn);
        let mut disk = LocalDisk::new(&name, LocalDiskSpec::new(&lun.path, &lun.node));
        disk.metadata.namespace = Some(request.namespace.clone());
        disk.metadata.labels = Some(local_disk_labels(&request.filesystem));

        info!(local_disk.name = %name, "Creating LocalDisk {}/{count}", index + 1);
        api.create_local_disk(&disk).await.context(CreateResourceSnafu {
            kind: "LocalDisk",
            name: &name,
        })?;
        resources.local_disks.push(name);
    }
    Ok(())
}

/// Create the LocalDisks of the new LUNs, then the file system over those and the reused
/// LocalDisks, then its StorageClass.
///
/// On failure the phase which failed is recorded with the error and nothing is rolled
/// back: the LocalDisks are kept for reuse and the cleanup removes the rest.
#[tracing::instrument(skip_all, fields(filesystem.name = %request.filesystem))]
pub async fn create_filesystem(
    api: &dyn StorageApi,
    request: &CreateRequest,
) -> Result<CreatedResources, Error> {
    let name = request.filesystem.as_str();
    if request.new_luns.is_empty() && request.reused_luns.is_empty() {
        return ValidationSnafu {
            message: "no LUNs provided for filesystem creation",
        }
        .fail();
    }
    info!(
        new = request.new_luns.len(),
        reused = request.reused_luns.len(),
        "Creating filesystem"
    );

    let reporter = PhaseReporter {
        api,
        job: &request.job,
    };
    let mut resources = CreatedResources::default();

    reporter
        .report(
            JobPhase::Starting,
            PhaseDetails::new(JobPhase::Starting, format!("Starting creation of filesystem {name}"), "0/3"),
            &resources,
        )
        .await;

    let phase = JobPhase::CreatingLocalDisks;
    reporter
        .report(
            phase,
            PhaseDetails::new(
                phase,
                format!("Creating {} new LocalDisk resources", request.new_luns.len()),
                "1/3",
            ),
            &resources,
        )
        .await;
    if let Err(error) = create_local_disks(api, request, &mut resources).await {
        let details = PhaseDetails::new(phase, "Failed to create LocalDisks", "1/3").with_error(&error);
        reporter.report(phase, details, &resources).await;
        return Err(error);
    }
    for lun in &request.reused_luns {
        if let Some(disk) = lun.local_disk_name.as_ref().filter(|d| !d.is_empty()) {
            info!(local_disk.name = %disk, "Reusing existing LocalDisk");
            resources.local_disks.push(disk.clone());
        }
    }

    let phase = JobPhase::CreatingFilesystem;
    reporter
        .report(
            phase,
            PhaseDetails::new(
                phase,
                format!(
                    "Creating FileSystem {name} with {} LocalDisks",
                    resources.local_disks.len()
                ),
                "2/3",
            ),
            &resources,
        )
        .await;
    let mut filesystem = Filesystem::new(name, FilesystemSpec::shared(resources.local_disks.clone()));
    filesystem.metadata.namespace = Some(request.namespace.clone());
    let created = api
        .create_filesystem(&filesystem)
        .await
        .context(CreateResourceSnafu {
            kind: "FileSystem",
            name,
        });
    if let Err(error) = created {
        let details = PhaseDetails::new(
            phase,
            "Failed to create FileSystem - LocalDisks have been preserved for reuse",
            "2/3",
        )
        .with_error(&error);
        reporter.report(phase, details, &resources).await;
        return Err(error);
    }
    resources.file_system = Some(name.to_string());

    let phase = JobPhase::CreatingStorageClass;
    reporter
        .report(
            phase,
            PhaseDetails::new(phase, format!("Creating StorageClass {name}"), "3/3"),
            &resources,
        )
        .await;
    let created = api
        .create_storage_class(&filesystem_storage_class(name))
        .await
        .context(CreateResourceSnafu {
            kind: "StorageClass",
            name,
        });
    if let Err(error) = created {
        let details = PhaseDetails::new(
            phase,
            "FileSystem created successfully, but StorageClass creation failed",
            "3/3",
        )
        .with_error(&error);
        reporter.report(phase, details, &resources).await;
        return Err(error);
    }
    resources.storage_class = Some(name.to_string());

    reporter
        .report(
            JobPhase::Completed,
            PhaseDetails::new(
                JobPhase::Completed,
                format!("Successfully created filesystem {name} with all components"),
                "3/3",
            ),
            &resources,
        )
        .await;
    info!("All resources created");
    Ok(resources)
}

async fn delete_job_best_effort(api: &dyn StorageApi, job: &JobRef) {
    match api.delete_job(&job.name, &job.namespace).await {
        Ok(()) => info!(job.name = %job.name, "Deleted failed job"),
        Err(error) => warn!(%error, job.name = %job.name, "Failed to delete job, continuing"),
    }
}

/// Remove what a failed creation left behind, in reverse order of creation, and the
/// failed job. LocalDisks are kept for reuse. Every step is best-effort.
#[tracing::instrument(skip_all)]
pub async fn cleanup_failed_job(
    api: &dyn StorageApi,
    target_namespace: &str,
    failed_job: Option<&JobRef>,
    created: &CreatedResources,
) {
    if let Some(storage_class) = &created.storage_class {
        match api.delete_storage_class(storage_class).await {
            Ok(()) => info!(storage_class.name = %storage_class, "Deleted StorageClass"),
            Err(error) => {
                warn!(%error, storage_class.name = %storage_class, "Failed to delete StorageClass, continuing")
            }
        }
    }
    if let Some(filesystem) = &created.file_system {
        match api.delete_filesystem(filesystem, target_namespace).await {
            Ok(()) => info!(filesystem.name = %filesystem, "Deleted FileSystem"),
            Err(error) => {
                warn!(%error, filesystem.name = %filesystem, "Failed to delete FileSystem, continuing")
            }
        }
    }
    if let Some(job) = failed_job {
        delete_job_best_effort(api, job).await;
    }
}

/// Remove the failed job of a file system, then the file system itself.
#[tracing::instrument(skip_all, fields(filesystem.name = %name))]
pub async fn cleanup_filesystem(
    api: &dyn StorageApi,
    name: &str,
    namespace: &str,
    failed_job: Option<&JobRef>,
) -> Result<(), Error> {
    if let Some(job) = failed_job {
        delete_job_best_effort(api, job).await;
    }
    delete_filesystem(api, name, namespace).await
}

/// Delete the file system and its StorageClass. Its LocalDisks are kept for reuse.
#[tracing::instrument(skip_all, fields(filesystem.name = %name))]
pub async fn delete_filesystem(api: &dyn StorageApi, name: &str, namespace: &str) -> Result<(), Error> {
    let filesystem = api.get_filesystem(name, namespace).await?;
    if !filesystem.is_delete_allowed() {
        info!("Adding deletion label");
        api.patch_filesystem(name, namespace, allow_delete_patch())
            .await?;
    }
    api.delete_filesystem(&filesystem.name_any(), namespace).await?;
    info!("Deleted FileSystem");

    match api.delete_storage_class(name).await {
        Ok(()) => info!(storage_class.name = %name, "Deleted StorageClass"),
        Err(error) => warn!(%error, storage_class.name = %name, "Failed to delete StorageClass, continuing"),
    }
    Ok(())
}
