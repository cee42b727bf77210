use crate::error::{Error, InvalidDurationSnafu};
use snafu::ResultExt;
use std::time::Duration;

/// Bounds of the wait for a LocalDisk to become unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDiskWait {
    /// Overall deadline.
    pub timeout: Duration,
    /// Delay after the first check, doubled after each check.
    pub initial_delay: Duration,
    /// Cap of the delay.
    pub max_delay: Duration,
}

/// Where the console creates its resources and how long it waits for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Namespace of the LocalDisk and Filesystem resources.
    pub storage_namespace: String,
    /// Namespace of the filesystem jobs.
    pub fusion_namespace: String,
    pub job_image: String,
    pub job_service_account: String,
    pub create_job_deadline: Duration,
    pub cleanup_job_deadline: Duration,
    pub local_disk_wait: LocalDiskWait,
}

fn duration(value: &str) -> Result<Duration, Error> {
    humantime::parse_duration(value).context(InvalidDurationSnafu { value })
}

impl ConsoleConfig {
    /// The product defaults.
    pub fn try_default() -> Result<Self, Error> {
        Ok(Self {
            storage_namespace: utils::STORAGE_NAMESPACE.to_string(),
            fusion_namespace: utils::FUSION_NAMESPACE.to_string(),
            job_image: utils::FILESYSTEM_JOB_IMAGE.to_string(),
            job_service_account: utils::FILESYSTEM_JOB_SERVICE_ACCOUNT.to_string(),
            create_job_deadline: duration(utils::CREATE_FILESYSTEM_JOB_DEADLINE)?,
            cleanup_job_deadline: duration(utils::CLEANUP_JOB_DEADLINE)?,
            local_disk_wait: LocalDiskWait {
                timeout: duration(utils::LOCAL_DISK_WAIT_TIMEOUT)?,
                initial_delay: duration(utils::LOCAL_DISK_WAIT_INITIAL_DELAY)?,
                max_delay: duration(utils::LOCAL_DISK_WAIT_MAX_DELAY)?,
            },
        })
    }
}
