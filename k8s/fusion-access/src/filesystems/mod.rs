//! The file systems pages: creation form, list, deletion and cleanup of failed creations.

pub mod cleanup;
pub mod create;
pub mod delete;
pub mod list;
pub mod luns;
pub mod name;
pub mod status;
pub mod waiter;

pub use cleanup::{cleanup, CleanupModal, CleanupTarget, CleanupTargetType};
pub use create::{create_filesystem, FilesystemForm};
pub use delete::{delete_filesystem, DeleteModal};
pub use list::{filesystem_rows, FilesystemRow, FilesystemsTable};
pub use luns::{Lun, LunsTable};
pub use name::validate_name;
pub use status::{classify, progress, FilesystemState, Status};
pub use waiter::wait_for_local_disk_unused;
