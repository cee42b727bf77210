use snafu::Snafu;

/// Why waiting for a LocalDisk to become unused gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitErrorReason {
    /// The disk was still in use when the deadline passed.
    Timeout,
    /// The disk is gone, there is nothing left to wait for.
    ResourceNotFound,
    /// Any other failure while checking the disk.
    Unknown,
}

/// Errors generated by the console workflows.
/// The display of each variant is the message surfaced to the user.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{}", kube_message(source)))]
    /// k8s client error
    Kube { source: kube::Error },
    #[snafu(display("{} '{}' not found in namespace '{}'", kind, name, namespace))]
    NotFound {
        kind: String,
        name: String,
        namespace: String,
    },
    #[snafu(display("{}", message))]
    Validation { message: String },
    #[snafu(display("Failed to serialize {}: {}", what, source))]
    Serialize {
        what: String,
        source: serde_json::Error,
    },
    #[snafu(display("The requested resource is not available"))]
    ResourceNotAvailable {},
    #[snafu(display("Invalid resource field: {}", field))]
    MissingField { field: String },
    #[snafu(display("{}", message))]
    LocalDiskWait {
        reason: WaitErrorReason,
        message: String,
    },
    #[snafu(display("Unknown error type"))]
    Unknown { cause: String },
    #[snafu(display("Invalid duration '{}': {}", value, source))]
    InvalidDuration {
        value: String,
        source: humantime::DurationError,
    },
    #[snafu(display("{}", message))]
    Generic { message: String },
    #[snafu(display("failed to create {} {}: {}", kind, name, source))]
    CreateResource {
        kind: String,
        name: String,
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
    },
}

/// API rejections carry a message meant for the user, anything else is shown whole.
fn kube_message(error: &kube::Error) -> String {
    match error {
        kube::Error::Api(response) if !response.message.is_empty() => response.message.clone(),
        error => error.to_string(),
    }
}

impl From<kube::Error> for Error {
    fn from(source: kube::Error) -> Self {
        Self::Kube { source }
    }
}

impl Error {
    /// Whether the error says the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Kube {
                source: kube::Error::Api(response),
            } => response.code == 404,
            _ => false,
        }
    }
    /// The reason of a LocalDisk wait failure.
    pub fn wait_reason(&self) -> Option<WaitErrorReason> {
        match self {
            Self::LocalDiskWait { reason, .. } => Some(*reason),
            _ => None,
        }
    }
    /// The structured cause of an `Unknown` error.
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Unknown { cause } => Some(cause),
            _ => None,
        }
    }
}
