//! Cleanup of failed creations, delegated to a job running in the operator namespace.

use super::list::FilesystemRow;
use crate::{
    client::StorageApi,
    config::ConsoleConfig,
    error::{Error, SerializeSnafu},
    resources::{
        job::{FilesystemJobStatus, JobOperation, JobTemplate},
        localdisk::sanitize_name,
        Filesystem,
    },
};
use k8s_openapi::api::batch::v1::Job;
use kube::ResourceExt;
use parking_lot::Mutex;
use snafu::ResultExt;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{error, info};

/// What a cleanup is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum CleanupTargetType {
    /// A creation job failed before the file system existed.
    FailedJob,
    /// A creation job failed after the file system was created.
    FailedFilesystem,
    Filesystem,
}

impl CleanupTargetType {
    /// The operation the cleanup job runs.
    pub fn operation(&self) -> JobOperation {
        match self {
            Self::FailedJob => JobOperation::CleanupFailedJob,
            Self::FailedFilesystem => JobOperation::CleanupFilesystem,
            Self::Filesystem => JobOperation::DeleteFilesystem,
        }
    }
    /// Title of the confirmation modal.
    pub fn title(&self) -> &'static str {
        match self {
            Self::FailedJob => "Clean up failed job",
            Self::FailedFilesystem => "Clean up filesystem",
            Self::Filesystem => "Delete filesystem",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanupTarget {
    pub type_: CleanupTargetType,
    pub name: String,
    pub namespace: String,
    pub job: Option<FilesystemJobStatus>,
    pub filesystem: Option<Filesystem>,
}

impl CleanupTarget {
    /// The cleanup offered by a list row, if any.
    pub fn for_row(row: &FilesystemRow, config: &ConsoleConfig) -> Option<Self> {
        if row.filesystem.is_some() && row.is_in_use {
            return None;
        }
        let failed_job = row.job.as_ref().filter(|j| j.failed);
        let type_ = match (&row.filesystem, failed_job) {
            (None, Some(_)) => CleanupTargetType::FailedJob,
            (Some(_), Some(_)) => CleanupTargetType::FailedFilesystem,
            (Some(_), None) => CleanupTargetType::Filesystem,
            (None, None) => return None,
        };
        let namespace = match &row.filesystem {
            Some(fs) => fs.namespace().unwrap_or_else(|| config.storage_namespace.clone()),
            None => config.storage_namespace.clone(),
        };
        Some(Self {
            type_,
            name: row.name.clone(),
            namespace,
            job: failed_job.cloned(),
            filesystem: row.filesystem.clone(),
        })
    }
}

/// The job cleaning up `target`. Like the creation job it is never retried and never
/// garbage collected.
pub fn cleanup_job(config: &ConsoleConfig, target: &CleanupTarget, millis: i64) -> Result<Job, Error> {
    let operation = target.type_.operation();
    let name = sanitize_name(&format!("cleanup-job-{}-{millis}", target.name));

    let mut env = vec![
        ("TARGET_NAME".to_string(), target.name.clone()),
        ("TARGET_NAMESPACE".to_string(), target.namespace.clone()),
    ];
    if let (CleanupTargetType::FailedJob | CleanupTargetType::FailedFilesystem, Some(job)) =
        (target.type_, &target.job)
    {
        env.push(("FAILED_JOB_NAME".into(), job.name.clone()));
        env.push(("FAILED_JOB_NAMESPACE".into(), job.namespace.clone()));
        if let (CleanupTargetType::FailedJob, Some(resources)) =
            (target.type_, &job.created_resources)
        {
            let resources = serde_json::to_string(resources).context(SerializeSnafu {
                what: "created resources",
            })?;
            env.push(("CREATED_RESOURCES".into(), resources));
        }
    }
    env.push(("OPERATION".into(), operation.to_string()));

    Ok(JobTemplate {
        name,
        namespace: config.fusion_namespace.clone(),
        labels: BTreeMap::from([
            (utils::cleanup_job_label(), "true".to_string()),
            (utils::target_name_label(), target.name.clone()),
            (utils::operation_label(), operation.to_string()),
        ]),
        env,
        image: config.job_image.clone(),
        service_account: config.job_service_account.clone(),
        deadline: config.cleanup_job_deadline,
    }
    .build())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupModalState {
    pub target: Option<CleanupTarget>,
    pub is_open: bool,
    pub is_processing: bool,
    pub errors: Vec<String>,
}

/// The cleanup confirmation modal.
#[derive(Debug, Clone, Default)]
pub struct CleanupModal {
    state: Arc<Mutex<CleanupModalState>>,
}

impl CleanupModal {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn state(&self) -> CleanupModalState {
        self.state.lock().clone()
    }
    /// Ask for confirmation of the cleanup of `target`, forgetting earlier errors.
    pub fn handle_cleanup(&self, target: CleanupTarget) {
        let mut state = self.state.lock();
        state.target = Some(target);
        state.is_open = true;
        state.errors.clear();
    }
    pub fn close(&self) {
        self.state.lock().is_open = false;
    }
}

/// Submit the cleanup job of the modal's target and close the modal. The cleanup itself
/// happens in the background; only the submission can fail here.
#[tracing::instrument(skip_all)]
pub async fn cleanup(api: &dyn StorageApi, modal: &CleanupModal, config: &ConsoleConfig) {
    let Some(target) = modal.state().target else {
        return;
    };
    {
        let mut state = modal.state.lock();
        state.errors.clear();
        state.is_processing = true;
    }

    let millis = chrono::Utc::now().timestamp_millis();
    let result = match cleanup_job(config, &target, millis) {
        Ok(job) => api.create_job(&job).await,
        Err(error) => Err(error),
    };
    match result {
        Ok(job) => {
            info!(
                job.name = %job.name_any(),
                cleanup.kind = %target.type_,
                cleanup.target = %target.name,
                "Cleanup job created"
            );
            modal.close();
        }
        Err(error) => {
            error!(%error, cleanup.target = %target.name, "Failed to create cleanup job");
            modal.state.lock().errors = error
                .to_string()
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(ToString::to_string)
                .collect();
        }
    }
    modal.state.lock().is_processing = false;
}
