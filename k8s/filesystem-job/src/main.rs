use clap::Parser;
use fusion_access::{
    client::{KubeStorageApi, StorageApi},
    executor::{self, parse_luns, CreateRequest, JobRef},
    resources::job::{CreatedResources, JobOperation},
};
use snafu::{OptionExt, ResultExt, Snafu};
use tracing::{info, warn};
use utils::tracing_telemetry::{FmtStyle, TracingTelemetry};

/// The job's inputs, set by the console as environment variables on the job container.
#[derive(Parser, Debug)]
#[command(name = "filesystem-job", version, about)]
struct CliArgs {
    /// The operation to run.
    #[arg(long, env = "OPERATION")]
    operation: JobOperation,

    /// Name of the file system to create.
    #[arg(long, env = "FILESYSTEM_NAME")]
    filesystem_name: Option<String>,

    /// Namespace of the file system and its LocalDisks.
    #[arg(long, env = "NAMESPACE")]
    namespace: Option<String>,

    /// JSON list of the LUNs which need a new LocalDisk.
    #[arg(long, env = "NEW_LUNS_JSON")]
    new_luns_json: Option<String>,

    /// JSON list of the LUNs reusing an existing LocalDisk.
    #[arg(long, env = "REUSED_LUNS_JSON")]
    reused_luns_json: Option<String>,

    /// Name of this job, on which the creation progress is reported.
    #[arg(long, env = "JOB_NAME")]
    job_name: Option<String>,

    /// Namespace of this job.
    #[arg(long, env = "FUSION_NAMESPACE", default_value = utils::FUSION_NAMESPACE)]
    fusion_namespace: String,

    /// The file system to clean up or delete.
    #[arg(long, env = "TARGET_NAME")]
    target_name: Option<String>,

    #[arg(long, env = "TARGET_NAMESPACE")]
    target_namespace: Option<String>,

    /// The failed creation job to remove.
    #[arg(long, env = "FAILED_JOB_NAME")]
    failed_job_name: Option<String>,

    #[arg(long, env = "FAILED_JOB_NAMESPACE")]
    failed_job_namespace: Option<String>,

    /// JSON encoded resources created by the failed job.
    #[arg(long, env = "CREATED_RESOURCES")]
    created_resources: Option<String>,

    /// Formatting style to be used while logging.
    #[arg(long, env = "LOG_STYLE", default_value = "pretty")]
    log_style: FmtStyle,
}

#[derive(Debug, Snafu)]
enum JobError {
    #[snafu(display("{} environment variable is required", name))]
    MissingInput { name: &'static str },
    #[snafu(display("{}", source))]
    Operation { source: fusion_access::Error },
}

/// The value of an input, which must be set and not empty.
fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, JobError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .context(MissingInputSnafu { name })
}

impl CliArgs {
    fn failed_job(&self) -> Option<JobRef> {
        JobRef::new(
            self.failed_job_name.as_deref(),
            self.failed_job_namespace.as_deref(),
        )
    }

    fn create_request(&self) -> Result<CreateRequest, JobError> {
        let filesystem = required(&self.filesystem_name, "FILESYSTEM_NAME")?;
        let namespace = required(&self.namespace, "NAMESPACE")?;
        let job_name = required(&self.job_name, "JOB_NAME")?;
        Ok(CreateRequest {
            filesystem: filesystem.to_string(),
            namespace: namespace.to_string(),
            job: JobRef {
                name: job_name.to_string(),
                namespace: self.fusion_namespace.clone(),
            },
            new_luns: parse_luns(self.new_luns_json.as_deref(), "NEW_LUNS_JSON")
                .context(OperationSnafu)?,
            reused_luns: parse_luns(self.reused_luns_json.as_deref(), "REUSED_LUNS_JSON")
                .context(OperationSnafu)?,
        })
    }

    /// The resources created by the failed job. They only narrow down the cleanup, so
    /// unparsable ones are ignored.
    fn created_resources(&self) -> CreatedResources {
        match self.created_resources.as_deref().filter(|r| !r.is_empty()) {
            Some(json) => serde_json::from_str(json).unwrap_or_else(|error| {
                warn!(%error, "Failed to parse created resources, continuing without them");
                CreatedResources::default()
            }),
            None => CreatedResources::default(),
        }
    }
}

async fn run(api: &dyn StorageApi, args: &CliArgs) -> Result<(), JobError> {
    match args.operation {
        JobOperation::CreateFilesystem => {
            let request = args.create_request()?;
            executor::create_filesystem(api, &request)
                .await
                .context(OperationSnafu)?;
        }
        JobOperation::CleanupFailedJob => {
            let namespace = required(&args.target_namespace, "TARGET_NAMESPACE")?;
            executor::cleanup_failed_job(
                api,
                namespace,
                args.failed_job().as_ref(),
                &args.created_resources(),
            )
            .await;
        }
        JobOperation::CleanupFilesystem => {
            let name = required(&args.target_name, "TARGET_NAME")?;
            let namespace = required(&args.target_namespace, "TARGET_NAMESPACE")?;
            executor::cleanup_filesystem(api, name, namespace, args.failed_job().as_ref())
                .await
                .context(OperationSnafu)?;
        }
        JobOperation::DeleteFilesystem => {
            let name = required(&args.target_name, "TARGET_NAME")?;
            let namespace = required(&args.target_namespace, "TARGET_NAMESPACE")?;
            executor::delete_filesystem(api, name, namespace)
                .await
                .context(OperationSnafu)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    TracingTelemetry::builder()
        .with_style(args.log_style)
        .with_colours(false)
        .init("filesystem-job");

    info!(operation = %args.operation, "Starting Fusion Access job");
    let api = KubeStorageApi::try_default().await?;
    run(&api, &args).await?;
    info!(operation = %args.operation, "Operation completed successfully");
    Ok(())
}
