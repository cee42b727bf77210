use k8s_openapi::api::{core::v1::PersistentVolumeClaim, storage::v1::StorageClass};
use kube::{api::ObjectMeta, ResourceExt};
use std::collections::BTreeMap;

/// The StorageClass exposing the named file system.
pub fn filesystem_storage_class(filesystem: &str) -> StorageClass {
    StorageClass {
        metadata: ObjectMeta {
            name: Some(filesystem.to_string()),
            ..Default::default()
        },
        provisioner: utils::SC_PROVISIONER.to_string(),
        parameters: Some(BTreeMap::from([(
            utils::SC_BACKEND_FS_PARAMETER.to_string(),
            filesystem.to_string(),
        )])),
        reclaim_policy: Some("Delete".to_string()),
        allow_volume_expansion: Some(true),
        volume_binding_mode: Some("Immediate".to_string()),
        ..Default::default()
    }
}

/// Whether the StorageClass is provisioned from the named file system.
pub fn is_backed_by(storage_class: &StorageClass, filesystem: &str) -> bool {
    storage_class.provisioner == utils::SC_PROVISIONER
        && storage_class
            .parameters
            .as_ref()
            .and_then(|p| p.get(utils::SC_BACKEND_FS_PARAMETER))
            .map(String::as_str)
            == Some(filesystem)
}

/// The StorageClasses provisioned from the named file system.
pub fn filesystem_storage_classes<'a>(
    filesystem: &str,
    storage_classes: &'a [StorageClass],
) -> Vec<&'a StorageClass> {
    storage_classes
        .iter()
        .filter(|sc| is_backed_by(sc, filesystem))
        .collect()
}

/// A file system is in use when any claim references one of its StorageClasses.
pub fn is_filesystem_in_use(
    filesystem: &str,
    storage_classes: &[StorageClass],
    claims: &[PersistentVolumeClaim],
) -> bool {
    let owned = filesystem_storage_classes(filesystem, storage_classes)
        .into_iter()
        .map(|sc| sc.name_any())
        .collect::<Vec<_>>();
    claims.iter().any(|pvc| {
        pvc.spec
            .as_ref()
            .and_then(|s| s.storage_class_name.as_ref())
            .map_or(false, |name| owned.contains(name))
    })
}
