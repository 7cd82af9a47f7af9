//! # pmtask-sync
//!
//! Account cloning and remote-task synchronization on top of the
//! reconciliation engine.
//!
//! [`clone_account`] copies one account into another stage by stage.
//! [`sync_remote_tasks`] keeps a single project in step with tasks rendered
//! from an external source. [`find_project`] and [`find_task`] resolve the
//! references users type on the command line.

pub mod error;
pub mod fixups;
pub mod lookup;
pub mod pipeline;
pub mod progress;
pub mod remote;
mod stages;

pub use error::{ApiResultExt, SyncError};
pub use lookup::{describe_project, find_project, find_task, odata_literal};
pub use pipeline::{clone_account, CloneOptions, CloneReport};
pub use progress::{LogProgress, Outcome, Progress, Stage, StageSummary};
pub use remote::{sync_remote_tasks, RemoteSyncResult};
