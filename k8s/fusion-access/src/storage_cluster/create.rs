use crate::{
    client::StorageApi,
    error::Error,
    resources::{node::storage_role_node_selector, Cluster, ClusterSpec},
    session::{Alert, Navigator, PageStore},
};
use tracing::{error, info};

/// Title of the alert raised when a provisioning call fails.
pub const CREATE_ERROR_TITLE: &str = "An error occurred while creating resources";

/// The storage cluster, running its daemons on the nodes carrying the storage role label.
pub fn storage_cluster() -> Cluster {
    Cluster::new(
        utils::STORAGE_CLUSTER_NAME,
        ClusterSpec::new(utils::STORAGE_CLUSTER_LICENSE, storage_role_node_selector()),
    )
}

/// Create the storage cluster and move on to the file systems page.
///
/// The cluster name is fixed, so a second submission is rejected by the server as a
/// duplicate. On failure the user stays on the page with the error alert; the button
/// stops loading either way.
#[tracing::instrument(skip_all)]
pub async fn create_storage_cluster(
    api: &dyn StorageApi,
    store: &PageStore,
    navigator: &dyn Navigator,
) -> Result<Cluster, Error> {
    store.set_cta_loading(true);
    let result = api.create_cluster(&storage_cluster()).await;
    match &result {
        Ok(_) => {
            info!(cluster.name = utils::STORAGE_CLUSTER_NAME, "Storage cluster created");
            navigator.push(utils::FILE_SYSTEMS_HOME_URL_PATH);
        }
        Err(error) => {
            error!(%error, "Failed to create the storage cluster");
            store.add_alert(Alert::danger(CREATE_ERROR_TITLE, error.to_string()));
        }
    }
    store.set_cta_loading(false);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{client::fake::FakeStorageApi, session::RecordingNavigator};
    use kube::ResourceExt;

    #[test]
    fn cluster_resource() {
        let cluster = storage_cluster();
        assert_eq!(cluster.name_any(), "ibm-spectrum-scale");
        let value = serde_json::to_value(&cluster).unwrap();
        assert_eq!(value["apiVersion"], "scale.spectrum.ibm.com/v1beta1");
        assert_eq!(
            value["spec"]["license"],
            serde_json::json!({ "accept": true, "license": "data-management" })
        );
        let selector = serde_json::json!({ "nodeSelector": { "scale.spectrum.ibm.com/role": "storage" } });
        assert_eq!(value["spec"]["daemon"], selector);
        assert_eq!(value["spec"]["pmcollector"], selector);
    }

    #[tokio::test]
    async fn creates_and_navigates() {
        let api = FakeStorageApi::new();
        let store = PageStore::new();
        let navigator = RecordingNavigator::new();
        create_storage_cluster(&api, &store, &navigator).await.unwrap();
        assert_eq!(api.calls(), vec!["create_cluster ibm-spectrum-scale"]);
        assert_eq!(navigator.current().as_deref(), Some("/fusion-access/file-systems"));
        assert!(!store.cta().is_loading);
        assert!(store.alerts().is_empty());
    }

    #[tokio::test]
    async fn failure_stays_on_page() {
        let api = FakeStorageApi::new();
        api.fail(
            "create_cluster ibm-spectrum-scale",
            "clusters \"ibm-spectrum-scale\" already exists",
        );
        let store = PageStore::new();
        let navigator = RecordingNavigator::new();
        assert!(create_storage_cluster(&api, &store, &navigator).await.is_err());
        assert_eq!(navigator.current(), None);
        assert!(!store.cta().is_loading);
        let alerts = store.alerts();
        assert_eq!(alerts[0].title, CREATE_ERROR_TITLE);
        assert_eq!(
            alerts[0].description,
            vec!["clusters \"ibm-spectrum-scale\" already exists".to_string()]
        );
    }
}
