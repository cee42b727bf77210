use super::{RawWatch, RawWatchError};
use kube::{
    runtime::{
        reflector::{self, ObjectRef, Store},
        watcher, WatchStreamExt,
    },
    Api, Resource,
};
use futures::StreamExt;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::{fmt::Debug, hash::Hash, sync::Arc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Default, PartialEq)]
struct SubscriptionState {
    loaded: bool,
    error: Option<String>,
}

impl SubscriptionState {
    /// Account for an event of the watch stream.
    fn apply<K>(&mut self, event: &watcher::Result<watcher::Event<K>>) {
        match event {
            Ok(watcher::Event::Restarted(objects)) => {
                debug!(count = objects.len(), "watch (re)listed");
                self.loaded = true;
                self.error = None;
            }
            Ok(_) => self.error = None,
            Err(error) => {
                warn!(%error, "watch failed");
                // surface the failure even if the first listing never completed
                self.loaded = true;
                self.error = Some(error.to_string());
            }
        }
    }
}

/// A continuously updated view of a remote resource collection.
///
/// The collection is mirrored into a reflector store by a background task. The
/// subscription is loaded after the first complete listing; a watch failure is kept
/// until the next successful event. Dropping the subscription stops the task.
pub struct Subscription<K>
where
    K: Resource + 'static,
    K::DynamicType: Eq + Hash,
{
    store: Store<K>,
    state: Arc<Mutex<SubscriptionState>>,
    task: JoinHandle<()>,
}

impl<K> Subscription<K>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Eq + Hash + Clone + Default,
{
    /// Start watching the resources selected by `config` through `api`.
    pub fn new(api: Api<K>, config: watcher::Config) -> Self {
        let (store, writer) = reflector::store();
        let state = Arc::new(Mutex::new(SubscriptionState::default()));
        let task_state = state.clone();

        let task = tokio::spawn(async move {
            let mut stream = Box::pin(reflector::reflector(writer, watcher(api, config).default_backoff()));
            while let Some(event) = stream.next().await {
                task_state.lock().apply(&event);
            }
        });

        Self { store, state, task }
    }

    /// The whole collection.
    pub fn list(&self) -> RawWatch<Vec<K>> {
        let state = self.state.lock();
        let data = state.loaded.then(|| {
            self.store
                .state()
                .into_iter()
                .map(|k| k.as_ref().clone())
                .collect()
        });
        (data, state.loaded, state.error.clone().map(RawWatchError::Message))
    }

    /// A single named resource of the collection.
    pub fn get(&self, name: &str, namespace: Option<&str>) -> RawWatch<K> {
        let state = self.state.lock();
        let mut reference = ObjectRef::<K>::new(name);
        if let Some(namespace) = namespace {
            reference = reference.within(namespace);
        }
        let data = self.store.get(&reference).map(|k| k.as_ref().clone());
        (data, state.loaded, state.error.clone().map(RawWatchError::Message))
    }
}

impl<K> Drop for Subscription<K>
where
    K: Resource + 'static,
    K::DynamicType: Eq + Hash,
{
    fn drop(&mut self) {
        self.task.abort();
    }
}
