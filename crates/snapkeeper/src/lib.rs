//! snapkeeper - Tag-driven snapshot and backup lifecycle automation
//!
//! Discovers tagged compute instances and file systems, starts a backup
//! workflow over them, and runs the stateless lifecycle steps the workflow
//! sequences: request a snapshot/backup, poll until a terminal state, gate
//! cleanup on in-flight backups, and sweep expired records.
//!
//! All lifecycle state travels in the [`snapkeeper_core::SnapshotEvent`]
//! payload; every step reads one event and returns the updated event.

pub mod aws;
pub mod config;
pub mod discovery;
pub mod steps;
