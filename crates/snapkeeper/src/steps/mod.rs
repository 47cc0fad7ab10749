//! Stateless lifecycle steps
//!
//! Each step is a pure `event in -> event out` function driven by the
//! external workflow; nothing is held between invocations. The workflow
//! sequences them per resource: request, poll until terminal, gate cleanup
//! on in-flight backups, sweep expired records.

pub mod backup;
pub mod snapshot;
pub mod sweep;

pub use backup::{check_backup_in_progress, request_filesystem_backup};
pub use snapshot::{poll_execution, request_instance_snapshot};
pub use sweep::{DELETE_PACING, SweepReport, sweep_filesystem_backups, sweep_instance_snapshots};
