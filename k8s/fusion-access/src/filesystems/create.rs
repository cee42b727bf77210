use super::{
    luns::{Lun, LunsTable},
    name::validate_name,
};
use crate::{
    client::StorageApi,
    config::ConsoleConfig,
    error::{Error, SerializeSnafu, ValidationSnafu},
    resources::{
        job::{JobOperation, JobTemplate, LunSpec},
        localdisk::sanitize_name,
    },
    session::{Alert, AlertVariant, Navigator, PageStore},
    storage_cluster::create::CREATE_ERROR_TITLE,
};
use k8s_openapi::api::batch::v1::Job;
use snafu::ResultExt;
use std::collections::BTreeMap;
use tracing::{error, info};

/// The create file system form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesystemForm {
    pub name: String,
    pub name_error: Option<String>,
}

impl FilesystemForm {
    /// Update the name, validating it as it is typed.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.name_error = match name.is_empty() {
            // an empty field is not an error yet, it only keeps the form from submitting
            true => None,
            false => validate_name(name).err(),
        };
    }
    pub fn is_valid(&self) -> bool {
        self.name_error.is_none()
    }
    /// Whether the create button must be disabled.
    pub fn is_create_disabled(&self, luns: &LunsTable) -> bool {
        !self.is_valid() || self.name.is_empty() || luns.selected().next().is_none()
    }
    /// Sync the page's call-to-action with the form.
    pub fn sync_cta(&self, store: &PageStore, luns: &LunsTable) {
        store.set_cta_disabled(self.is_create_disabled(luns));
    }
}

/// The selected LUNs split into those needing a new LocalDisk and those reusing one.
fn split_luns<'a>(luns: impl IntoIterator<Item = &'a Lun>) -> (Vec<LunSpec>, Vec<LunSpec>) {
    luns.into_iter()
        .map(Lun::spec)
        .partition(|lun| !lun.is_reused)
}

/// Name of the creation job for the file system `name`, unique per submission.
pub fn create_job_name(name: &str, millis: i64) -> String {
    sanitize_name(&format!("create-filesystem-{name}-{millis}"))
}

/// The Job creating the file system `name` out of the selected LUNs.
pub fn create_filesystem_job(
    config: &ConsoleConfig,
    name: &str,
    luns: &[&Lun],
    millis: i64,
) -> Result<Job, Error> {
    validate_name(name).map_err(|message| ValidationSnafu { message }.build())?;
    if luns.is_empty() {
        return ValidationSnafu {
            message: "At least one LUN must be selected",
        }
        .fail();
    }
    let (new, reused) = split_luns(luns.iter().copied());
    let job_name = create_job_name(name, millis);
    let new = serde_json::to_string(&new).context(SerializeSnafu { what: "new LUNs" })?;
    let reused = serde_json::to_string(&reused).context(SerializeSnafu {
        what: "reused LUNs",
    })?;

    Ok(JobTemplate {
        name: job_name.clone(),
        namespace: config.fusion_namespace.clone(),
        labels: BTreeMap::from([
            (utils::filesystem_job_label(), "true".to_string()),
            (utils::filesystem_name_label(), name.to_string()),
        ]),
        env: vec![
            ("OPERATION".into(), JobOperation::CreateFilesystem.to_string()),
            ("FILESYSTEM_NAME".into(), name.to_string()),
            ("NAMESPACE".into(), config.storage_namespace.clone()),
            ("NEW_LUNS_JSON".into(), new),
            ("REUSED_LUNS_JSON".into(), reused),
            ("JOB_NAME".into(), job_name),
            ("FUSION_NAMESPACE".into(), config.fusion_namespace.clone()),
        ],
        image: config.job_image.clone(),
        service_account: config.job_service_account.clone(),
        deadline: config.create_job_deadline,
    }
    .build())
}

/// Submit the creation job and go watch it on the file systems page.
///
/// Invalid input is already shown next to the form fields, so it is returned without a
/// page alert. Only the job submission raises one; everything else fails inside the job
/// and shows up later in its status.
#[tracing::instrument(skip_all, fields(filesystem.name = %form.name))]
pub async fn create_filesystem(
    api: &dyn StorageApi,
    store: &PageStore,
    navigator: &dyn Navigator,
    config: &ConsoleConfig,
    form: &FilesystemForm,
    luns: &LunsTable,
) -> Result<Job, Error> {
    let selected = luns.selected().collect::<Vec<_>>();
    let millis = chrono::Utc::now().timestamp_millis();
    let job = create_filesystem_job(config, &form.name, &selected, millis)?;

    store.set_cta_loading(true);
    let result = api.create_job(&job).await;
    match &result {
        Ok(job) => {
            info!(job.name = ?job.metadata.name, luns = selected.len(), "Filesystem creation job submitted");
            navigator.push(utils::FILE_SYSTEMS_HOME_URL_PATH);
            store.add_toast(
                Alert::new(AlertVariant::Info, "Filesystem creation started").with_description(
                    vec![format!(
                        "Filesystem {} is being created in the background",
                        form.name
                    )],
                ),
            );
        }
        Err(error) => {
            error!(%error, "Failed to submit the filesystem creation job");
            store.add_alert(Alert::danger(CREATE_ERROR_TITLE, error.to_string()));
        }
    }
    store.set_cta_loading(false);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::fake::FakeStorageApi,
        filesystems::luns::UnusedLocalDisk,
        resources::job::job_env,
        session::RecordingNavigator,
        storage_cluster::disks::tests::discovery,
        watch::Watched,
    };
    use kube::ResourceExt;

    fn luns() -> LunsTable {
        let unused = [UnusedLocalDisk {
            name: "sdd-c".into(),
            device: "/dev/sdd".into(),
            node: "w0".into(),
            capacity: Some("100 GiB".into()),
        }];
        LunsTable::new(&Watched::ready(vec![discovery("w0", &["A", "B"])]), &unused)
    }

    #[test]
    fn form_gates_the_create_button() {
        let mut luns = luns();
        let mut form = FilesystemForm::default();
        assert!(form.is_create_disabled(&luns));

        form.set_name("Bad Name!");
        assert_eq!(
            form.name_error.as_deref(),
            Some(format!("Must match the expression: {}", crate::filesystems::name::NAME_PATTERN).as_str())
        );
        luns.set_selected("A", true);
        assert!(form.is_create_disabled(&luns));

        form.set_name("good-name");
        assert_eq!(form.name_error, None);
        assert!(!form.is_create_disabled(&luns));

        let store = PageStore::new();
        form.sync_cta(&store, &luns);
        assert!(!store.cta().is_disabled);
        luns.set_all_selected(false);
        form.sync_cta(&store, &luns);
        assert!(store.cta().is_disabled);
    }

    #[test]
    fn job_carries_the_luns() {
        let config = ConsoleConfig::try_default().unwrap();
        let mut table = luns();
        table.set_all_selected(true);
        let selected = table.selected().collect::<Vec<_>>();
        let job = create_filesystem_job(&config, "fs1", &selected, 1700000000000).unwrap();

        assert_eq!(job.name_any(), "create-filesystem-fs1-1700000000000");
        assert_eq!(job.namespace().as_deref(), Some("ibm-fusion-access"));
        assert_eq!(job.labels()[&utils::filesystem_name_label()], "fs1");
        assert_eq!(job.labels()[&utils::filesystem_job_label()], "true");
        let spec = job.spec.as_ref().unwrap();
        assert_eq!(spec.active_deadline_seconds, Some(600));
        assert_eq!(spec.backoff_limit, Some(0));

        assert_eq!(job_env(&job, "OPERATION"), Some("create-filesystem"));
        assert_eq!(job_env(&job, "NAMESPACE"), Some("ibm-spectrum-scale"));
        let new: Vec<LunSpec> = serde_json::from_str(job_env(&job, "NEW_LUNS_JSON").unwrap()).unwrap();
        let reused: Vec<LunSpec> =
            serde_json::from_str(job_env(&job, "REUSED_LUNS_JSON").unwrap()).unwrap();
        assert_eq!(new.len(), 2);
        assert_eq!(new[0].wwn, "A");
        assert_eq!(reused.len(), 1);
        assert_eq!(reused[0].local_disk_name.as_deref(), Some("sdd-c"));
        assert_eq!(job_env(&job, "JOB_NAME"), Some("create-filesystem-fs1-1700000000000"));
    }

    #[test]
    fn invalid_input_builds_no_job() {
        let config = ConsoleConfig::try_default().unwrap();
        let table = luns();
        let lun = &table.luns[0];
        assert!(create_filesystem_job(&config, "Bad Name!", &[lun], 1).is_err());
        assert!(create_filesystem_job(&config, "fs1", &[], 1).is_err());
    }

    #[tokio::test]
    async fn submits_and_navigates() {
        let api = FakeStorageApi::new();
        let store = PageStore::new();
        let navigator = RecordingNavigator::new();
        let config = ConsoleConfig::try_default().unwrap();
        let mut form = FilesystemForm::default();
        form.set_name("fs1");
        let mut table = luns();
        table.set_selected("B", true);

        create_filesystem(&api, &store, &navigator, &config, &form, &table)
            .await
            .unwrap();
        let calls = api.calls_to("create_job ");
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("create_job create-filesystem-fs1-"));
        assert_eq!(navigator.current().as_deref(), Some("/fusion-access/file-systems"));
        assert_eq!(store.toasts()[0].variant, AlertVariant::Info);
        assert!(!store.cta().is_loading);
    }

    #[tokio::test]
    async fn invalid_input_raises_no_alert() {
        let api = FakeStorageApi::new();
        let store = PageStore::new();
        let navigator = RecordingNavigator::new();
        let config = ConsoleConfig::try_default().unwrap();
        let mut form = FilesystemForm::default();
        form.set_name("fs1");
        let table = luns();

        // nothing selected
        let result = create_filesystem(&api, &store, &navigator, &config, &form, &table).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(api.calls().is_empty());
        assert_eq!(navigator.current(), None);
        assert!(store.alerts().is_empty());
        assert!(!store.cta().is_loading);
    }

    #[tokio::test]
    async fn submission_failure_raises_alert() {
        let api = FakeStorageApi::new();
        api.fail("create_job create-filesystem-fs1-*", "jobs.batch is forbidden");
        let store = PageStore::new();
        let navigator = RecordingNavigator::new();
        let config = ConsoleConfig::try_default().unwrap();
        let mut form = FilesystemForm::default();
        form.set_name("fs1");
        let mut table = luns();
        table.set_selected("A", true);

        let result = create_filesystem(&api, &store, &navigator, &config, &form, &table).await;
        assert!(result.is_err());
        assert_eq!(navigator.current(), None);
        let alerts = store.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].variant, AlertVariant::Danger);
        assert_eq!(alerts[0].title, CREATE_ERROR_TITLE);
        assert!(!store.cta().is_loading);
    }
}
