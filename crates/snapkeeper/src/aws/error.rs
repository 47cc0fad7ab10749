//! AWS error classification
//!
//! Maps AWS SDK error codes into the store error taxonomy using the
//! `.code()` method instead of string matching on Debug output.

use aws_sdk_ec2::error::ProvideErrorMetadata;
use snapkeeper_core::StoreError;

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidInstanceID.NotFound",
    "InvalidSnapshot.NotFound",
    "FileSystemNotFound",
    "BackupNotFound",
    "ParameterNotFound",
    "AutomationExecutionNotFoundException",
    "AutomationDefinitionNotFoundException",
    "StateMachineDoesNotExist",
    "ResourceNotFoundException",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

/// Classify an AWS error code into the store taxonomy.
///
/// Returns `None` for codes that are neither "not found" nor throttling.
pub fn classify_code(code: Option<&str>, subject: &str) -> Option<StoreError> {
    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => Some(StoreError::NotFound(subject.to_string())),
        Some(c) if THROTTLING_CODES.contains(&c) => Some(StoreError::Throttled(subject.to_string())),
        _ => None,
    }
}

/// Convert an SDK operation error into the store taxonomy.
///
/// `subject` names the object the call was about (resource id, parameter
/// name) and is carried into the classified error.
pub fn store_error<E>(subject: &str, err: E) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match classify_code(err.code(), subject) {
        Some(classified) => classified,
        None => StoreError::Other(anyhow::Error::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_code(Some(code), "r-1").unwrap();
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
        }
    }

    #[test]
    fn test_throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_code(Some(code), "r-1").unwrap();
            assert!(err.is_throttled(), "Expected Throttled for code: {code}");
        }
    }

    #[test]
    fn test_unknown_codes_stay_unclassified() {
        assert!(classify_code(Some("SomeNewError"), "r-1").is_none());
        assert!(classify_code(None, "r-1").is_none());
    }

    #[test]
    fn test_classified_errors_carry_subject() {
        let err = classify_code(Some("FileSystemNotFound"), "fs-0abc").unwrap();
        assert!(err.to_string().contains("fs-0abc"));
    }
}
