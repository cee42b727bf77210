//! Various common constants used by the console core and the filesystem job.

/// Name of the product.
pub const PRODUCT_NAME: &str = "fusion-access";

/// Domain name for the product's own labels and annotations.
pub const PRODUCT_DOMAIN_NAME: &str = "fusion.storage.openshift.io";

/// The API group of the storage scale custom resources.
pub const SCALE_API_GROUP: &str = "scale.spectrum.ibm.com";
/// The served version of the storage scale custom resources.
/// Note, the CRDs are defined inline and use literal strings so that must
/// be changed as well.
pub const SCALE_API_VERSION: &str = "v1beta1";

/// The API group of the device discovery resources.
pub const FUSION_API_GROUP: &str = PRODUCT_DOMAIN_NAME;

/// Namespace where the storage scale resources (LocalDisk, Filesystem) live.
pub const STORAGE_NAMESPACE: &str = "ibm-spectrum-scale";
/// Namespace where the operator runs its jobs.
pub const FUSION_NAMESPACE: &str = "ibm-fusion-access";

/// The fixed name of the singleton storage cluster.
pub const STORAGE_CLUSTER_NAME: &str = "ibm-spectrum-scale";
/// License edition accepted when creating the storage cluster.
pub const STORAGE_CLUSTER_LICENSE: &str = "data-management";

/// Node label marking the node as a member of the storage cluster.
pub const STORAGE_ROLE_LABEL_KEY: &str = "scale.spectrum.ibm.com/role";
/// Value of the storage role label.
pub const STORAGE_ROLE_LABEL_VALUE: &str = "storage";
/// Node role labels, in order of precedence when deriving a node's role.
pub const WORKER_NODE_ROLE_LABEL: &str = "node-role.kubernetes.io/worker";
pub const MASTER_NODE_ROLE_LABEL: &str = "node-role.kubernetes.io/master";
pub const CPLANE_NODE_ROLE_LABEL: &str = "node-role.kubernetes.io/control-plane";

/// Label required by the admission webhook before a Filesystem may be deleted.
pub const FS_ALLOW_DELETE_LABEL: &str = "scale.spectrum.ibm.com/allowDelete";
/// Provisioner of the storage classes backed by a Filesystem.
pub const SC_PROVISIONER: &str = "spectrumscale.csi.ibm.com";
/// StorageClass parameter naming the backing Filesystem.
pub const SC_BACKEND_FS_PARAMETER: &str = "volBackendFs";

/// Label marking a Job (and the LocalDisks it created) as a filesystem creation job.
pub fn filesystem_job_label() -> String {
    format!("{PRODUCT_DOMAIN_NAME}/filesystem-job")
}
/// Label carrying the target Filesystem name of a job.
pub fn filesystem_name_label() -> String {
    format!("{PRODUCT_DOMAIN_NAME}/filesystem-name")
}
/// Label marking a Job as a cleanup job.
pub fn cleanup_job_label() -> String {
    format!("{PRODUCT_DOMAIN_NAME}/cleanup-job")
}
/// Label carrying the target name of a cleanup job.
pub fn target_name_label() -> String {
    format!("{PRODUCT_DOMAIN_NAME}/target-name")
}
/// Label carrying the operation of a cleanup job.
pub fn operation_label() -> String {
    format!("{PRODUCT_DOMAIN_NAME}/operation")
}

/// Job annotation with the current creation phase.
pub fn phase_annotation() -> String {
    format!("{PRODUCT_DOMAIN_NAME}/current-phase")
}
/// Job annotation with the JSON encoded phase details.
pub fn phase_details_annotation() -> String {
    format!("{PRODUCT_DOMAIN_NAME}/phase-details")
}
/// Job annotation with the JSON encoded names of the resources created so far.
pub fn created_resources_annotation() -> String {
    format!("{PRODUCT_DOMAIN_NAME}/created-resources")
}

/// Image executing the filesystem jobs.
pub const FILESYSTEM_JOB_IMAGE: &str =
    "quay.io/aeros/openshift-fusion-access-filesystem-job:latest";
/// Container name inside the filesystem jobs.
pub const FILESYSTEM_JOB_CONTAINER: &str = "filesystem-job";
/// Service account the filesystem jobs run as.
pub const FILESYSTEM_JOB_SERVICE_ACCOUNT: &str = "fusion-access-operator-controller-manager";
/// Deadline for a filesystem creation job.
pub const CREATE_FILESYSTEM_JOB_DEADLINE: &str = "10m";
/// Deadline for a cleanup job.
pub const CLEANUP_JOB_DEADLINE: &str = "5m";

/// Maximum length of a kubernetes resource name (DNS label).
pub const MAX_RESOURCE_NAME_LENGTH: usize = 63;

/// Minimum number of storage nodes of a storage cluster.
pub const MINIMUM_AMOUNT_OF_NODES: usize = 3;
/// Minimum number of disks all storage nodes must share.
pub const MINIMUM_AMOUNT_OF_SHARED_DISKS: usize = 1;
/// Minimum amount of memory, in GiB, recommended for a storage node.
pub const MINIMUM_AMOUNT_OF_MEMORY_GIB: f64 = 20.0;

/// Placeholder shown for values which are not available.
pub const VALUE_NOT_AVAILABLE: &str = "--";

/// Prefix of the WWN reported by the device discovery.
pub const WWN_PREFIX: &str = "uuid.";

/// Overall time to wait for a LocalDisk to become unused.
pub const LOCAL_DISK_WAIT_TIMEOUT: &str = "5m";
/// First delay between LocalDisk condition checks.
pub const LOCAL_DISK_WAIT_INITIAL_DELAY: &str = "1s";
/// Cap of the delay between LocalDisk condition checks.
pub const LOCAL_DISK_WAIT_MAX_DELAY: &str = "10s";

/// Console path of the storage cluster home page.
pub const STORAGE_CLUSTER_HOME_URL_PATH: &str = "/fusion-access/storage-cluster";
/// Console path of the file systems home page.
pub const FILE_SYSTEMS_HOME_URL_PATH: &str = "/fusion-access/file-systems";
