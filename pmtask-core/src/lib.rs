//! pmtask core library: entity kinds, the identity map, and the
//! reconciliation engine every sync stage is built on.
//!
//! - [`types`]: [`EntityKind`] and [`MapKey`]
//! - [`identity_map`]: [`IdentityMap`] with CSV export
//! - [`reconcile`]: [`reconcile()`], [`match_only`], [`Capabilities`], [`SyncResult`]
//! - [`wbs`]: outline ordering for hierarchical tasks
//! - [`remote`]: [`RemoteTask`], the unit of external-task ingestion

pub mod error;
pub mod identity_map;
pub mod reconcile;
pub mod remote;
pub mod types;
pub mod wbs;

pub use error::CoreError;
pub use identity_map::{IdentityMap, IdentityMapEntry};
pub use reconcile::{match_only, reconcile, Capabilities, Keyed, Strategy, SyncResult};
pub use remote::RemoteTask;
pub use types::{EntityKind, MapKey};
