//! The file systems list: existing file systems merged with the jobs creating them.

use super::status::{classify, component_statuses, progress, ComponentStatus, Status};
use crate::{
    config::ConsoleConfig,
    resources::{job::FilesystemJobStatus, storageclass::is_filesystem_in_use, Filesystem},
    watch::{joint, Subscription, Watched},
};
use k8s_openapi::api::{
    batch::v1::Job, core::v1::PersistentVolumeClaim, storage::v1::StorageClass,
};
use kube::{runtime::watcher, Api, Client, ResourceExt};
use std::{collections::BTreeSet, sync::Arc};

/// A row of the file systems list.
#[derive(Debug, Clone, PartialEq)]
pub struct FilesystemRow {
    pub name: String,
    /// The file system, absent while its creation job has not created it yet.
    pub filesystem: Option<Filesystem>,
    /// The most recent creation job of the file system.
    pub job: Option<FilesystemJobStatus>,
    pub status: Status,
    pub components: Vec<ComponentStatus>,
    /// Creation progress, for rows backed by a job only.
    pub progress: Option<u8>,
    pub raw_capacity: String,
    /// Claims consume one of its StorageClasses; such a file system cannot be deleted.
    pub is_in_use: bool,
}

impl FilesystemRow {
    /// Whether the row offers the delete action.
    pub fn can_delete(&self) -> bool {
        use super::status::FilesystemState::*;
        self.filesystem.is_some()
            && !self.is_in_use
            && !matches!(self.status.state, Deleting | Creating)
    }
    /// Whether the row offers the cleanup action of a failed creation.
    /// Claims on a file system block its cleanup as well.
    pub fn can_cleanup(&self) -> bool {
        self.job.as_ref().map_or(false, |j| j.failed) && !self.is_in_use
    }
}

/// The creation jobs of the file system `name`, most recently started first.
pub fn related_job<'a>(name: &str, jobs: &'a [FilesystemJobStatus]) -> Option<&'a FilesystemJobStatus> {
    jobs.iter()
        .filter(|j| j.filesystem_name == name)
        .max_by(|a, b| a.start_time.cmp(&b.start_time))
}

/// Merge the watched file systems and creation jobs into list rows. A file system and
/// a job of the same name make a single row.
pub fn filesystem_rows(
    filesystems: &[Filesystem],
    jobs: &[Job],
    storage_classes: &[StorageClass],
    claims: &[PersistentVolumeClaim],
) -> Vec<FilesystemRow> {
    let jobs: Vec<FilesystemJobStatus> = jobs.iter().map(FilesystemJobStatus::from).collect();
    let mut names = BTreeSet::new();

    let mut rows: Vec<FilesystemRow> = filesystems
        .iter()
        .map(|fs| {
            let name = fs.name_any();
            let job = related_job(&name, &jobs);
            names.insert(name.clone());
            FilesystemRow {
                status: classify(Some(fs), job),
                components: component_statuses(Some(fs), job),
                progress: None,
                raw_capacity: fs
                    .raw_capacity()
                    .unwrap_or(utils::VALUE_NOT_AVAILABLE)
                    .to_string(),
                is_in_use: is_filesystem_in_use(&name, storage_classes, claims),
                filesystem: Some(fs.clone()),
                job: job.cloned(),
                name,
            }
        })
        .collect();

    let pending: BTreeSet<&str> = jobs
        .iter()
        .map(|j| j.filesystem_name.as_str())
        .filter(|name| !names.contains(*name))
        .collect();
    rows.extend(pending.into_iter().filter_map(|name| {
        let job = related_job(name, &jobs)?;
        Some(FilesystemRow {
            name: name.to_string(),
            filesystem: None,
            status: classify(None, Some(job)),
            components: component_statuses(None, Some(job)),
            progress: Some(progress(job)),
            raw_capacity: utils::VALUE_NOT_AVAILABLE.to_string(),
            is_in_use: false,
            job: Some(job.clone()),
        })
    }));
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

/// Selects the file system creation jobs.
pub fn filesystem_jobs_watch_config() -> watcher::Config {
    watcher::Config::default().labels(&format!("{}=true", utils::filesystem_job_label()))
}

/// Subscribe to the file system creation jobs of the operator namespace.
pub fn watch_filesystem_jobs(client: Client, config: &ConsoleConfig) -> Subscription<Job> {
    Subscription::new(
        Api::namespaced(client, &config.fusion_namespace),
        filesystem_jobs_watch_config(),
    )
}

fn slice<T>(watched: &Watched<Vec<T>>) -> &[T] {
    watched.data().map(Vec::as_slice).unwrap_or_default()
}

/// The file systems list with the joint state of the watches it is built from.
#[derive(Debug, Clone, Default)]
pub struct FilesystemsTable {
    pub loaded: bool,
    pub error: Option<Arc<crate::Error>>,
    pub rows: Vec<FilesystemRow>,
}

impl FilesystemsTable {
    pub fn new(
        filesystems: &Watched<Vec<Filesystem>>,
        jobs: &Watched<Vec<Job>>,
        storage_classes: &Watched<Vec<StorageClass>>,
        claims: &Watched<Vec<PersistentVolumeClaim>>,
    ) -> Self {
        let (loaded, error) = joint(&[filesystems, jobs, storage_classes, claims]);
        let rows = filesystem_rows(
            slice(filesystems),
            slice(jobs),
            slice(storage_classes),
            slice(claims),
        );
        Self { loaded, error, rows }
    }
    pub fn row(&self, name: &str) -> Option<&FilesystemRow> {
        self.rows.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{super::status::tests::filesystem, *};
    use crate::{
        filesystems::status::FilesystemState,
        resources::{
            filesystem::FilesystemPoolStatus,
            job::{tests::job, JobPhase},
            storageclass::filesystem_storage_class,
            FilesystemStatus, ResourceCondition,
        },
    };
    use chrono::{TimeZone, Utc};
    use k8s_openapi::{
        api::core::v1::PersistentVolumeClaimSpec, apimachinery::pkg::apis::meta::v1::Time,
    };

    fn started(mut job: Job, secs: i64) -> Job {
        if let Some(status) = job.status.as_mut() {
            status.start_time = Utc.timestamp_opt(secs, 0).single().map(Time);
        }
        job
    }

    pub(crate) fn claim(storage_class: &str) -> PersistentVolumeClaim {
        PersistentVolumeClaim {
            spec: Some(PersistentVolumeClaimSpec {
                storage_class_name: Some(storage_class.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn filesystem_wins_over_job_row() {
        let mut fs = filesystem(
            "fs1",
            vec![
                ResourceCondition::new("Success", "True", "Created"),
                ResourceCondition::new("Healthy", "True", "Healthy"),
            ],
        );
        fs.status = fs.status.map(|s| FilesystemStatus {
            pools: vec![FilesystemPoolStatus {
                name: None,
                total_disk_size: Some("200 GiB".into()),
            }],
            ..s
        });
        let jobs = vec![
            job("create-fs1", "fs1", Some(JobPhase::Completed), None, false, true),
            job("create-fs2", "fs2", Some(JobPhase::CreatingFilesystem), None, false, false),
        ];
        let rows = filesystem_rows(&[fs], &jobs, &[filesystem_storage_class("fs1")], &[claim("fs1")]);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].name, "fs1");
        assert_eq!(rows[0].status.state, FilesystemState::Ready);
        assert_eq!(rows[0].raw_capacity, "200 GiB");
        assert!(rows[0].is_in_use);
        assert!(!rows[0].can_delete());
        assert_eq!(rows[0].progress, None);

        assert_eq!(rows[1].name, "fs2");
        assert!(rows[1].filesystem.is_none());
        assert_eq!(rows[1].status.state, FilesystemState::Creating);
        assert_eq!(rows[1].progress, Some(60));
        assert_eq!(rows[1].raw_capacity, "--");
    }

    #[test]
    fn most_recent_job_is_related() {
        let jobs = vec![
            started(job("old", "fs1", Some(JobPhase::CreatingLocalDisks), None, true, false), 10),
            started(job("new", "fs1", Some(JobPhase::CreatingStorageClass), None, false, false), 20),
        ];
        let rows = filesystem_rows(&[], &jobs, &[], &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].job.as_ref().map(|j| j.name.as_str()), Some("new"));
        assert_eq!(rows[0].progress, Some(90));
        assert!(!rows[0].can_cleanup());
    }

    #[test]
    fn jobs_selector() {
        assert_eq!(
            filesystem_jobs_watch_config().label_selector.as_deref(),
            Some("fusion.storage.openshift.io/filesystem-job=true")
        );
    }

    #[test]
    fn table_joins_watch_states() {
        let table = FilesystemsTable::new(
            &Watched::ready(vec![filesystem("fs1", vec![])]),
            &Watched::ready(vec![]),
            &Watched::loading(),
            &Watched::ready(vec![]),
        );
        assert!(!table.loaded);
        assert!(table.error.is_none());
        assert_eq!(table.row("fs1").map(|r| r.status.state), Some(FilesystemState::Unknown));
        assert!(table.row("fs1").map_or(false, FilesystemRow::can_delete));
    }
}
