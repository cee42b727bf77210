use crate::{
    client::StorageApi,
    config::LocalDiskWait,
    error::{Error, WaitErrorReason},
    resources::localdisk::USED_CONDITION,
};
use tokio::time::Instant;
use tracing::{debug, warn};

fn wait_error(reason: WaitErrorReason, message: String) -> Error {
    Error::LocalDiskWait { reason, message }
}

/// Wait until the LocalDisk `name` is no longer used by any file system, which is when
/// its "Used" condition is "False" or absent.
///
/// The disk is checked right away, then after a delay doubling from
/// `initial_delay` up to `max_delay`. It gives up with a `Timeout` error when the next
/// check would land past `timeout`, and with `ResourceNotFound` as soon as the disk is
/// gone. Other errors are logged and the polling goes on.
#[tracing::instrument(skip_all, fields(local_disk.name = %name))]
pub async fn wait_for_local_disk_unused(
    api: &dyn StorageApi,
    name: &str,
    namespace: &str,
    wait: &LocalDiskWait,
) -> Result<(), Error> {
    let start = Instant::now();
    let mut delay = wait.initial_delay;
    loop {
        match api.get_local_disk(name, namespace).await {
            Ok(disk) if disk.is_unused() => return Ok(()),
            Ok(_) => debug!(?delay, "LocalDisk still in use"),
            Err(error) if error.is_not_found() => {
                return Err(wait_error(
                    WaitErrorReason::ResourceNotFound,
                    format!("LocalDisk \"{name}\" not found in namespace \"{namespace}\""),
                ));
            }
            Err(error) => warn!(%error, "Request failed while checking LocalDisk condition"),
        }

        if start.elapsed() + delay >= wait.timeout {
            break;
        }
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(wait.max_delay);
    }

    Err(wait_error(
        WaitErrorReason::Timeout,
        format!(
            "Timeout after {}ms waiting for LocalDisk \"{name}\" \"{USED_CONDITION}\" condition to become \"False\"",
            wait.timeout.as_millis()
        ),
    ))
}
