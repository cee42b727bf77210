//! The storage provisioning core of the Fusion Access console.
//!
//! It selects the nodes of a storage cluster and creates it, provisions shared file
//! systems through background jobs, follows their progress, and deletes or cleans
//! them up. The UI layer binds to the view-models and actions exposed here; live state
//! comes from [`watch`] subscriptions and every remote call goes through
//! [`client::StorageApi`].

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod filesystems;
pub mod resources;
pub mod session;
pub mod storage_cluster;
pub mod watch;

pub use config::ConsoleConfig;
pub use error::Error;
