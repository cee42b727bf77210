//! The background Jobs which create and clean up file systems, and the annotations they
//! use to report their progress.

use k8s_openapi::{
    api::{
        batch::v1::{Job, JobSpec},
        core::v1::{Container, EnvVar, PodSpec, PodTemplateSpec},
    },
    apimachinery::pkg::apis::meta::v1::Time,
};
use kube::{api::ObjectMeta, ResourceExt};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Duration};
use tracing::warn;

/// The operations the filesystem job executes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "kebab-case")]
pub enum JobOperation {
    CreateFilesystem,
    CleanupFailedJob,
    CleanupFilesystem,
    DeleteFilesystem,
}

/// The phases of a filesystem creation job, in the order they are reached.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
    strum_macros::Display,
)]
pub enum JobPhase {
    #[strum(serialize = "unknown")]
    Unknown,
    #[strum(serialize = "starting")]
    Starting,
    #[strum(serialize = "creating-localdisks")]
    CreatingLocalDisks,
    #[strum(serialize = "creating-filesystem")]
    CreatingFilesystem,
    #[strum(serialize = "creating-storageclass")]
    CreatingStorageClass,
    #[strum(serialize = "completed")]
    Completed,
    #[strum(serialize = "failed")]
    Failed,
}

impl JobPhase {
    /// Parse the phase annotation, anything unrecognised is `Unknown`.
    pub fn parse(phase: &str) -> Self {
        phase.parse().unwrap_or(Self::Unknown)
    }
    /// Whether the phase is one of the creation steps.
    pub fn is_creating(&self) -> bool {
        matches!(
            self,
            Self::Starting
                | Self::CreatingLocalDisks
                | Self::CreatingFilesystem
                | Self::CreatingStorageClass
        )
    }
}

/// Details of the current phase, stored JSON encoded in the phase details annotation.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDetails {
    pub current_phase: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PhaseDetails {
    /// New details for `phase` with the given message and `n/3` style progress.
    pub fn new(phase: JobPhase, message: impl Into<String>, progress: &str) -> Self {
        Self {
            current_phase: phase.to_string(),
            message: message.into(),
            progress: Some(progress.to_string()),
            error: None,
        }
    }
    /// Record the error which stopped the phase.
    pub fn with_error(self, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..self
        }
    }
}

/// Names of the resources a creation job created so far, stored JSON encoded in the
/// created resources annotation.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResources {
    #[serde(default)]
    pub local_disks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

/// A LUN handed to the creation job.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LunSpec {
    pub path: String,
    pub wwn: String,
    pub node: String,
    #[serde(default)]
    pub is_reused: bool,
    /// The existing LocalDisk of a reused LUN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_disk_name: Option<String>,
}

/// The progress of a filesystem job, as derived from its annotations and conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct FilesystemJobStatus {
    pub name: String,
    pub namespace: String,
    pub filesystem_name: String,
    pub phase: JobPhase,
    pub phase_details: Option<PhaseDetails>,
    pub created_resources: Option<CreatedResources>,
    /// Finished, either way.
    pub completed: bool,
    pub succeeded: bool,
    pub failed: bool,
    pub start_time: Option<Time>,
    pub completion_time: Option<Time>,
}

fn parse_annotation<T: serde::de::DeserializeOwned>(
    annotations: &BTreeMap<String, String>,
    key: &str,
) -> Option<T> {
    let value = annotations.get(key)?;
    match serde_json::from_str(value) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            warn!(%error, annotation = key, "Failed to parse job annotation");
            None
        }
    }
}

impl From<&Job> for FilesystemJobStatus {
    fn from(job: &Job) -> Self {
        let annotations = job.annotations();
        let condition = |type_: &str| {
            job.status
                .as_ref()
                .and_then(|s| s.conditions.as_ref())
                .and_then(|c| c.iter().find(|c| c.type_ == type_))
                .map_or(false, |c| c.status == "True")
        };
        let succeeded = condition("Complete");
        let failed = condition("Failed");

        Self {
            name: job.name_any(),
            namespace: job.namespace().unwrap_or_default(),
            filesystem_name: job
                .labels()
                .get(&utils::filesystem_name_label())
                .cloned()
                .unwrap_or_else(|| "unknown".to_string()),
            phase: annotations
                .get(&utils::phase_annotation())
                .map_or(JobPhase::Unknown, |p| JobPhase::parse(p)),
            phase_details: parse_annotation(annotations, &utils::phase_details_annotation()),
            created_resources: parse_annotation(
                annotations,
                &utils::created_resources_annotation(),
            ),
            completed: succeeded || failed,
            succeeded,
            failed,
            start_time: job.status.as_ref().and_then(|s| s.start_time.clone()),
            completion_time: job.status.as_ref().and_then(|s| s.completion_time.clone()),
        }
    }
}

/// The annotations recording `phase` on a creation job.
pub fn phase_annotations(
    phase: JobPhase,
    details: &PhaseDetails,
    resources: &CreatedResources,
) -> Result<BTreeMap<String, String>, serde_json::Error> {
    Ok(BTreeMap::from([
        (utils::phase_annotation(), phase.to_string()),
        (
            utils::phase_details_annotation(),
            serde_json::to_string(details)?,
        ),
        (
            utils::created_resources_annotation(),
            serde_json::to_string(resources)?,
        ),
    ]))
}

/// Everything needed to build a filesystem job.
#[derive(Debug, Clone)]
pub struct JobTemplate {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub env: Vec<(String, String)>,
    pub image: String,
    pub service_account: String,
    pub deadline: Duration,
}

impl JobTemplate {
    /// Build the Job. It is never retried and never garbage collected, so a failed
    /// attempt stays around to be inspected.
    pub fn build(self) -> Job {
        Job {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some(self.namespace),
                labels: Some(self.labels),
                ..Default::default()
            },
            spec: Some(JobSpec {
                backoff_limit: Some(0),
                active_deadline_seconds: Some(self.deadline.as_secs() as i64),
                ttl_seconds_after_finished: None,
                template: PodTemplateSpec {
                    metadata: None,
                    spec: Some(PodSpec {
                        restart_policy: Some("Never".to_string()),
                        service_account_name: Some(self.service_account),
                        containers: vec![Container {
                            name: utils::FILESYSTEM_JOB_CONTAINER.to_string(),
                            image: Some(self.image),
                            image_pull_policy: Some("Always".to_string()),
                            env: Some(
                                self.env
                                    .into_iter()
                                    .map(|(name, value)| EnvVar {
                                        name,
                                        value: Some(value),
                                        value_from: None,
                                    })
                                    .collect(),
                            ),
                            ..Default::default()
                        }],
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            status: None,
        }
    }
}

/// The value of the environment variable `name` in the job's first container.
pub fn job_env<'a>(job: &'a Job, name: &str) -> Option<&'a str> {
    job.spec
        .as_ref()?
        .template
        .spec
        .as_ref()?
        .containers
        .first()?
        .env
        .as_ref()?
        .iter()
        .find(|e| e.name == name)
        .and_then(|e| e.value.as_deref())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use k8s_openapi::api::batch::v1::{JobCondition, JobStatus};

    pub(crate) fn job(
        name: &str,
        filesystem: &str,
        phase: Option<JobPhase>,
        details: Option<PhaseDetails>,
        failed: bool,
        succeeded: bool,
    ) -> Job {
        let mut annotations = BTreeMap::new();
        if let Some(phase) = phase {
            annotations.insert(utils::phase_annotation(), phase.to_string());
        }
        if let Some(details) = details {
            annotations.insert(
                utils::phase_details_annotation(),
                serde_json::to_string(&details).unwrap(),
            );
        }
        let mut conditions = vec![];
        if failed {
            conditions.push(JobCondition {
                type_: "Failed".into(),
                status: "True".into(),
                ..Default::default()
            });
        }
        if succeeded {
            conditions.push(JobCondition {
                type_: "Complete".into(),
                status: "True".into(),
                ..Default::default()
            });
        }
        Job {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(utils::FUSION_NAMESPACE.to_string()),
                labels: Some(BTreeMap::from([
                    (utils::filesystem_job_label(), "true".to_string()),
                    (utils::filesystem_name_label(), filesystem.to_string()),
                ])),
                annotations: Some(annotations),
                ..Default::default()
            },
            spec: None,
            status: Some(JobStatus {
                conditions: Some(conditions),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn phases_are_ordered() {
        assert!(JobPhase::Starting < JobPhase::CreatingLocalDisks);
        assert!(JobPhase::CreatingLocalDisks < JobPhase::CreatingFilesystem);
        assert!(JobPhase::CreatingFilesystem < JobPhase::CreatingStorageClass);
        assert!(JobPhase::CreatingStorageClass < JobPhase::Completed);
        assert_eq!(JobPhase::parse("creating-localdisks"), JobPhase::CreatingLocalDisks);
        assert_eq!(JobPhase::parse("bogus"), JobPhase::Unknown);
        assert_eq!(JobOperation::CleanupFailedJob.as_ref(), "cleanup-failed-job");
        assert_eq!(
            "delete-filesystem".parse::<JobOperation>().ok(),
            Some(JobOperation::DeleteFilesystem)
        );
    }

    #[test]
    fn status_from_job() {
        let details = PhaseDetails::new(JobPhase::CreatingFilesystem, "Creating", "2/3")
            .with_error("webhook denied");
        let mut job = job(
            "create-fs1",
            "fs1",
            Some(JobPhase::CreatingFilesystem),
            Some(details.clone()),
            true,
            false,
        );
        job.metadata.annotations.as_mut().unwrap().insert(
            utils::created_resources_annotation(),
            r#"{"localDisks":["sdb-1"]}"#.to_string(),
        );
        let status = FilesystemJobStatus::from(&job);
        assert_eq!(status.filesystem_name, "fs1");
        assert_eq!(status.phase, JobPhase::CreatingFilesystem);
        assert_eq!(status.phase_details, Some(details));
        assert_eq!(
            status.created_resources.unwrap().local_disks,
            vec!["sdb-1".to_string()]
        );
        assert!(status.failed && status.completed && !status.succeeded);
    }

    #[test]
    fn broken_annotations_are_ignored() {
        let mut job = job("j", "fs", None, None, false, false);
        job.metadata
            .annotations
            .as_mut()
            .unwrap()
            .insert(utils::phase_details_annotation(), "{not json".to_string());
        let status = FilesystemJobStatus::from(&job);
        assert_eq!(status.phase, JobPhase::Unknown);
        assert_eq!(status.phase_details, None);
        assert!(!status.completed);
    }

    #[test]
    fn template_never_retries() {
        let job = JobTemplate {
            name: "j".into(),
            namespace: "ns".into(),
            labels: Default::default(),
            env: vec![("OPERATION".into(), "create-filesystem".into())],
            image: "image".into(),
            service_account: "sa".into(),
            deadline: Duration::from_secs(600),
        }
        .build();
        let spec = job.spec.as_ref().unwrap();
        assert_eq!(spec.backoff_limit, Some(0));
        assert_eq!(spec.active_deadline_seconds, Some(600));
        assert_eq!(spec.ttl_seconds_after_finished, None);
        assert_eq!(job_env(&job, "OPERATION"), Some("create-filesystem"));
        assert_eq!(job_env(&job, "MISSING"), None);
    }
}
