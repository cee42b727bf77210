//! Uniform consumption of live cluster state.
//!
//! A watch produces a raw `(data, loaded, error)` triple on every refresh. The error half
//! may come in several shapes depending on where it was raised; [`normalize`] collapses
//! them into a single [`Error`] so that every consumer handles the same three outcomes:
//! still loading, loaded with data, loaded with an error.

mod subscription;
pub use subscription::Subscription;

use crate::error::Error;
use std::sync::Arc;

/// The error half of a raw watch result.
#[derive(Debug)]
pub enum RawWatchError {
    /// A typed error raised by the client.
    Exception(Error),
    /// A plain message, empty messages carry no error.
    Message(String),
    /// Any other structured payload.
    Structured(serde_json::Value),
}

/// The raw `(data, loaded, error)` result of a watch.
pub type RawWatch<T> = (Option<T>, bool, Option<RawWatchError>);

/// The normalized result of a watch.
/// Possible outcomes are:
/// ```text
/// { data: None,    loaded: false, error: None }
/// { data: None,    loaded: true,  error: Some }
/// { data: Some(T), loaded: true,  error: None }
/// ```
#[derive(Debug)]
pub struct Watched<T> {
    pub data: Option<T>,
    pub loaded: bool,
    pub error: Option<Arc<Error>>,
}

impl<T> Clone for Watched<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loaded: self.loaded,
            error: self.error.clone(),
        }
    }
}

impl<T> Default for Watched<T> {
    fn default() -> Self {
        Self::loading()
    }
}

impl<T> Watched<T> {
    /// Not loaded yet.
    pub fn loading() -> Self {
        Self {
            data: None,
            loaded: false,
            error: None,
        }
    }
    /// Loaded with data.
    pub fn ready(data: T) -> Self {
        Self {
            data: Some(data),
            loaded: true,
            error: None,
        }
    }
    /// Loaded with an error.
    pub fn failed(error: Error) -> Self {
        Self {
            data: None,
            loaded: true,
            error: Some(Arc::new(error)),
        }
    }
    /// Map the data, keeping the loaded and error state.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Watched<U> {
        Watched {
            data: self.data.map(f),
            loaded: self.loaded,
            error: self.error,
        }
    }
    /// The data as a reference.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}

/// Normalize a raw watch result.
pub fn normalize<T>(raw: RawWatch<T>) -> Watched<T> {
    let (data, loaded, error) = raw;

    if !loaded {
        return Watched::loading();
    }

    let error = match error {
        Some(RawWatchError::Message(message)) if message.is_empty() => None,
        error => error,
    };

    match (data, error) {
        (None, None) => Watched::failed(Error::ResourceNotAvailable {}),
        (_, Some(RawWatchError::Exception(error))) => Watched::failed(error),
        (_, Some(RawWatchError::Message(message))) => {
            Watched::failed(Error::Generic { message })
        }
        (_, Some(RawWatchError::Structured(value))) => Watched::failed(Error::Unknown {
            cause: value.to_string(),
        }),
        (Some(data), None) => Watched::ready(data),
    }
}

/// Loaded and error state of a watch, independent of its data type.
pub trait WatchState {
    fn is_loaded(&self) -> bool;
    fn load_error(&self) -> Option<&Arc<Error>>;
}

impl<T> WatchState for Watched<T> {
    fn is_loaded(&self) -> bool {
        self.loaded
    }
    fn load_error(&self) -> Option<&Arc<Error>> {
        self.error.as_ref()
    }
}

/// The joint state of several watches: loaded only when all of them are loaded, failed
/// with the first error found.
pub fn joint(states: &[&dyn WatchState]) -> (bool, Option<Arc<Error>>) {
    let loaded = states.iter().all(|s| s.is_loaded());
    let error = states.iter().find_map(|s| s.load_error().cloned());
    (loaded, error)
}
