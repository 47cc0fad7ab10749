//! snapkeeper-core - Shared lifecycle types and logic
//!
//! This crate provides the domain model for the snapshot/backup lifecycle,
//! without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`error`]: Store and lifecycle error taxonomies
//! - [`event`]: The `SnapshotEvent` payload passed between lifecycle steps
//! - [`resource`]: Discovered resource model
//! - [`retention`]: Retention window parsing and sweep planning
//! - [`status`]: Execution status normalization
//! - [`store`]: Contracts for the stores and executors the lifecycle drives
//! - [`tags`]: Tag schema for snapkeeper-created artifacts

pub mod error;
pub mod event;
pub mod resource;
pub mod retention;
pub mod status;
pub mod store;
pub mod tags;

// Re-export commonly used types
pub use error::{LifecycleError, StoreError};
pub use event::SnapshotEvent;
pub use resource::{ResourceKind, ResourceRef, Tag};
pub use retention::{RetentionUnit, RetentionWindow};
pub use status::ExecutionStatus;
pub use store::{
    AutomationExecutor, AutomationRequest, BackupRecord, BackupStore, ParameterSource,
    RecordLifecycle, SnapshotStore, WorkflowStarter,
};
