//! Classification of a file system, or of the job creating it, into the status shown in
//! the file systems list.

use crate::resources::{
    job::{FilesystemJobStatus, JobPhase},
    Filesystem,
};

/// The Filesystem condition reporting whether it was established.
pub const SUCCESS_CONDITION: &str = "Success";
/// The Filesystem condition reporting its health.
pub const HEALTHY_CONDITION: &str = "Healthy";

/// Success condition reasons of a file system still being set up.
const CREATING_REASONS: [&str; 3] = [
    "FilesystemNotEstablished",
    "LocalDiskNotReady",
    "LocalDiskWrongType",
];

/// The status of a file system row, in order of precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum FilesystemState {
    Deleting,
    Failed,
    Creating,
    NotReady,
    Ready,
    Unknown,
}

impl FilesystemState {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Deleting => "Deleting",
            Self::Failed => "Failed",
            Self::Creating => "Creating",
            Self::NotReady => "Not healthy",
            Self::Ready => "Healthy",
            Self::Unknown => "Unknown",
        }
    }
    pub fn icon(&self) -> StatusIcon {
        match self {
            Self::Deleting | Self::Creating => StatusIcon::InProgress,
            Self::Failed => StatusIcon::Danger,
            Self::NotReady => StatusIcon::Warning,
            Self::Ready => StatusIcon::Success,
            Self::Unknown => StatusIcon::Unknown,
        }
    }
}

/// Icon shown next to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum StatusIcon {
    InProgress,
    Danger,
    Warning,
    Success,
    Pending,
    Unknown,
}

/// A classified status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub state: FilesystemState,
    pub title: &'static str,
    pub description: Option<String>,
    pub icon: StatusIcon,
}

impl Status {
    fn new(state: FilesystemState, description: Option<String>) -> Self {
        Self {
            state,
            title: state.title(),
            description,
            icon: state.icon(),
        }
    }
}

/// The message of a failed job: what failed and why.
fn job_failure(job: &FilesystemJobStatus) -> Option<String> {
    let details = job.phase_details.as_ref()?;
    Some(match &details.error {
        Some(error) if !details.message.is_empty() => format!("{}: {error}", details.message),
        Some(error) => error.clone(),
        None => details.message.clone(),
    })
}

/// Classify a file system and its most recent creation job, either of which may be
/// missing.
pub fn classify(filesystem: Option<&Filesystem>, job: Option<&FilesystemJobStatus>) -> Status {
    if filesystem.map_or(false, Filesystem::is_deleting) {
        return Status::new(FilesystemState::Deleting, None);
    }
    let success = filesystem.and_then(|fs| fs.condition(SUCCESS_CONDITION));
    let healthy = filesystem.and_then(|fs| fs.condition(HEALTHY_CONDITION));
    let success_message = success.and_then(|c| c.message.clone());

    let job_failed = job.map_or(false, |j| j.failed);
    if job_failed || success.map_or(false, |c| c.reason() == "Failed") {
        let description = match job_failed {
            true => job.and_then(job_failure).or(success_message),
            false => success_message,
        };
        return Status::new(FilesystemState::Failed, description);
    }

    let job_creating = job.map_or(false, |j| {
        j.phase.is_creating() || (!j.completed && j.phase == JobPhase::Unknown)
    });
    let success_pending = success.map_or(false, |c| {
        CREATING_REASONS.contains(&c.reason()) || !c.is_true()
    });
    if job_creating || success_pending {
        let description = match success_pending {
            true => success_message,
            false => job
                .and_then(|j| j.phase_details.as_ref())
                .map(|d| d.message.clone()),
        };
        return Status::new(FilesystemState::Creating, description);
    }

    match (success, healthy) {
        (Some(_), Some(healthy)) if healthy.is_true() => Status::new(FilesystemState::Ready, None),
        (Some(_), healthy) => Status::new(
            FilesystemState::NotReady,
            healthy.and_then(|c| c.message.clone()),
        ),
        // the job is done but the file system has not shown up yet
        (None, _) if filesystem.is_none() && job.map_or(false, |j| j.succeeded) => {
            Status::new(FilesystemState::Creating, None)
        }
        (None, _) => Status::new(FilesystemState::Unknown, None),
    }
}

/// Percentage reached by a creation job.
///
/// A failed job stays at the percentage of the phase it failed in, except in the first
/// phase where nothing was done yet.
pub fn progress(job: &FilesystemJobStatus) -> u8 {
    if job.succeeded {
        return 100;
    }
    match (job.phase, job.failed) {
        (JobPhase::Starting, true) => 0,
        (phase, _) => phase_progress(phase),
    }
}

/// Percentage of a phase.
pub fn phase_progress(phase: JobPhase) -> u8 {
    match phase {
        JobPhase::Unknown | JobPhase::Failed => 0,
        JobPhase::Starting => 5,
        JobPhase::CreatingLocalDisks => 25,
        JobPhase::CreatingFilesystem => 60,
        JobPhase::CreatingStorageClass => 90,
        JobPhase::Completed => 100,
    }
}

/// The parts a file system is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr, strum_macros::Display)]
pub enum Component {
    LocalDisk,
    FileSystem,
    StorageClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ComponentState {
    Created,
    Creating,
    Failed,
    Pending,
    Unknown,
}

/// Creation status of one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentStatus {
    pub component: Component,
    pub state: ComponentState,
    pub message: String,
}

impl ComponentStatus {
    fn new(component: Component, state: ComponentState, message: impl Into<String>) -> Self {
        Self {
            component,
            state,
            message: message.into(),
        }
    }
    pub fn icon(&self) -> StatusIcon {
        match self.state {
            ComponentState::Created => StatusIcon::Success,
            ComponentState::Creating => StatusIcon::InProgress,
            ComponentState::Failed => StatusIcon::Danger,
            ComponentState::Pending => StatusIcon::Pending,
            ComponentState::Unknown => StatusIcon::Unknown,
        }
    }
}

/// Breakdown of the creation of each component, for the status details popover.
/// Empty when there is neither a job nor a file system to report on.
pub fn component_statuses(
    filesystem: Option<&Filesystem>,
    job: Option<&FilesystemJobStatus>,
) -> Vec<ComponentStatus> {
    use Component::*;
    use ComponentState::*;

    let fs_created = filesystem.map(|fs| {
        fs.condition(SUCCESS_CONDITION)
            .and_then(|c| c.message.clone())
            .unwrap_or_else(|| "Created successfully".to_string())
    });
    let Some(job) = job else {
        return match fs_created {
            Some(message) => vec![
                ComponentStatus::new(LocalDisk, Unknown, "Status unknown - no job information available"),
                ComponentStatus::new(FileSystem, Created, message),
                ComponentStatus::new(StorageClass, Unknown, "Status unknown - no job information available"),
            ],
            None => vec![],
        };
    };

    let phase = job.phase;
    let failure = |fallback: &str| {
        job.phase_details
            .as_ref()
            .map(|d| d.error.clone().unwrap_or_else(|| d.message.clone()))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };
    let created = job.created_resources.clone().unwrap_or_default();

    let local_disk = if !created.local_disks.is_empty() {
        ComponentStatus::new(
            LocalDisk,
            Created,
            format!(
                "Using {} LocalDisk(s): {}",
                created.local_disks.len(),
                created.local_disks.join(", ")
            ),
        )
    } else if phase == JobPhase::CreatingLocalDisks && !job.failed {
        ComponentStatus::new(LocalDisk, Creating, "Creating storage disks...")
    } else if job.failed && matches!(phase, JobPhase::CreatingLocalDisks | JobPhase::Starting) {
        ComponentStatus::new(LocalDisk, Failed, failure("Failed to create LocalDisks"))
    } else if matches!(phase, JobPhase::CreatingFilesystem | JobPhase::CreatingStorageClass)
        || job.completed
    {
        ComponentStatus::new(LocalDisk, Created, "LocalDisk resources ready (details not available)")
    } else {
        ComponentStatus::new(LocalDisk, Pending, "Waiting to create storage disks")
    };

    let file_system = if let Some(message) = fs_created {
        ComponentStatus::new(FileSystem, Created, message)
    } else if let Some(name) = &created.file_system {
        ComponentStatus::new(FileSystem, Created, format!("Created filesystem: {name}"))
    } else if phase == JobPhase::CreatingFilesystem && !job.failed {
        ComponentStatus::new(FileSystem, Creating, "Setting up filesystem...")
    } else if job.failed && phase == JobPhase::CreatingFilesystem {
        ComponentStatus::new(FileSystem, Failed, failure("Failed to create FileSystem"))
    } else if local_disk.state == Created {
        ComponentStatus::new(FileSystem, Pending, "Waiting to create filesystem")
    } else if local_disk.state == Failed {
        ComponentStatus::new(FileSystem, Pending, "Skipped due to LocalDisk creation failure")
    } else {
        ComponentStatus::new(FileSystem, Pending, "Waiting for LocalDisk creation")
    };

    let storage_class = if let Some(name) = &created.storage_class {
        ComponentStatus::new(StorageClass, Created, format!("Created StorageClass: {name}"))
    } else if phase == JobPhase::CreatingStorageClass && !job.failed {
        ComponentStatus::new(StorageClass, Creating, "Creating storage class...")
    } else if job.failed && phase == JobPhase::CreatingStorageClass {
        ComponentStatus::new(StorageClass, Failed, failure("Failed to create StorageClass"))
    } else if file_system.state == Created {
        ComponentStatus::new(StorageClass, Pending, "Waiting to create storage class")
    } else if local_disk.state == Failed || file_system.state == Failed {
        ComponentStatus::new(StorageClass, Pending, "Skipped due to previous failure")
    } else {
        ComponentStatus::new(StorageClass, Pending, "Waiting for FileSystem creation")
    };

    vec![local_disk, file_system, storage_class]
}
