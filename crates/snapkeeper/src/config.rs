//! Environment configuration
//!
//! All deployment configuration arrives through environment variables and is
//! resolved once at startup into a validated `Config`. Missing or malformed
//! values fail fast with a typed error.

use snapkeeper_core::retention::{InvalidRetentionUnit, RetentionUnit, RetentionWindow};
use thiserror::Error;

/// Discovery tag key for compute instances
pub const ENV_INSTANCE_TAG_KEY: &str = "SNAPKEEPER_INSTANCE_TAG_KEY";
/// Discovery tag value for compute instances
pub const ENV_INSTANCE_TAG_VALUE: &str = "SNAPKEEPER_INSTANCE_TAG_VALUE";
/// Discovery tag key for file systems
pub const ENV_FILESYSTEM_TAG_KEY: &str = "SNAPKEEPER_FILESYSTEM_TAG_KEY";
/// Discovery tag value for file systems
pub const ENV_FILESYSTEM_TAG_VALUE: &str = "SNAPKEEPER_FILESYSTEM_TAG_VALUE";
/// Workflow the trigger starts over discovered resources
pub const ENV_STATE_MACHINE_ARN: &str = "SNAPKEEPER_STATE_MACHINE_ARN";
/// Parameter-store key naming the snapshot automation document
pub const ENV_SNAPSHOT_DOCUMENT_PARAMETER: &str = "SNAPKEEPER_SNAPSHOT_DOCUMENT_PARAMETER";
/// Retention window unit (weeks/days/hours/minutes/seconds/milliseconds/microseconds)
pub const ENV_RETENTION_UNIT: &str = "SNAPKEEPER_RETENTION_UNIT";
/// Retention window magnitude
pub const ENV_RETENTION_VALUE: &str = "SNAPKEEPER_RETENTION_VALUE";

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is absent
    #[error("{0} is not set")]
    Missing(&'static str),

    /// The retention magnitude is not a non-negative integer
    #[error("{name} must be a non-negative integer, got '{value}'")]
    InvalidMagnitude { name: &'static str, value: String },

    /// The retention unit is not in the recognized set
    #[error(transparent)]
    InvalidRetentionUnit(#[from] InvalidRetentionUnit),
}

/// Resolved deployment configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Tag pair selecting instances for snapshots
    pub instance_tag_key: String,
    pub instance_tag_value: String,
    /// Tag pair selecting file systems for backups
    pub filesystem_tag_key: String,
    pub filesystem_tag_value: String,
    /// Workflow started over discovered resources
    pub state_machine_arn: String,
    /// Parameter-store key naming the snapshot automation document
    pub snapshot_document_parameter: String,
    /// Maximum age before snapshots/backups become deletion candidates
    pub retention: RetentionWindow,
}

impl Config {
    /// Resolve the configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let unit: RetentionUnit = require(ENV_RETENTION_UNIT)?.parse()?;
        let raw_magnitude = require(ENV_RETENTION_VALUE)?;
        let magnitude = raw_magnitude
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidMagnitude {
                name: ENV_RETENTION_VALUE,
                value: raw_magnitude,
            })?;

        Ok(Self {
            instance_tag_key: require(ENV_INSTANCE_TAG_KEY)?,
            instance_tag_value: require(ENV_INSTANCE_TAG_VALUE)?,
            filesystem_tag_key: require(ENV_FILESYSTEM_TAG_KEY)?,
            filesystem_tag_value: require(ENV_FILESYSTEM_TAG_VALUE)?,
            state_machine_arn: require(ENV_STATE_MACHINE_ARN)?,
            snapshot_document_parameter: require(ENV_SNAPSHOT_DOCUMENT_PARAMETER)?,
            retention: RetentionWindow::new(unit, magnitude),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: &[(&str, &str)] = &[
        (ENV_INSTANCE_TAG_KEY, "BackupPolicy"),
        (ENV_INSTANCE_TAG_VALUE, "nightly"),
        (ENV_FILESYSTEM_TAG_KEY, "BackupPolicy"),
        (ENV_FILESYSTEM_TAG_VALUE, "nightly"),
        (
            ENV_STATE_MACHINE_ARN,
            "arn:aws:states:us-east-2:123456789012:stateMachine:snapkeeper",
        ),
        (ENV_SNAPSHOT_DOCUMENT_PARAMETER, "/snapkeeper/snapshot-document"),
        (ENV_RETENTION_UNIT, "days"),
        (ENV_RETENTION_VALUE, "7"),
    ];

    // SAFETY: env mutation is process-global; this is the only test in the
    // binary touching these variables, and it runs its scenarios serially.
    #[test]
    fn test_from_env() {
        unsafe {
            for (name, value) in ALL_VARS {
                std::env::set_var(name, value);
            }
        }

        let config = Config::from_env().expect("full environment resolves");
        assert_eq!(config.instance_tag_key, "BackupPolicy");
        assert_eq!(config.retention.magnitude, 7);
        assert_eq!(config.retention.unit, RetentionUnit::Days);

        unsafe {
            std::env::set_var(ENV_RETENTION_UNIT, "fortnights");
        }
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRetentionUnit(_)));

        unsafe {
            std::env::set_var(ENV_RETENTION_UNIT, "days");
            std::env::set_var(ENV_RETENTION_VALUE, "soon");
        }
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMagnitude { .. }));

        unsafe {
            std::env::set_var(ENV_RETENTION_VALUE, "7");
            std::env::remove_var(ENV_STATE_MACHINE_ARN);
        }
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_STATE_MACHINE_ARN)));
    }
}
