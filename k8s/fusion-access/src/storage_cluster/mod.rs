//! The storage cluster creation page: selecting the worker nodes which will run the
//! storage daemons, checking they share disks, and creating the cluster.

pub mod create;
pub mod disks;
pub mod requirements;
pub mod selection;
pub mod table;

pub use create::create_storage_cluster;
pub use disks::{shared_disk_count, shared_disks_message};
pub use requirements::{check_minimum_requirements, validate_minimum_requirements};
pub use selection::{NodeSelection, SelectionStatus};
pub use table::NodesSelectionTable;
