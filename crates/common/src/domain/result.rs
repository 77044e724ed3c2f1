use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Command dispatch failed for {device_path}: {reason}")]
    CommandDispatchFailed { device_path: String, reason: String },

    #[error("Configuration update failed for {device_path}: {reason}")]
    ConfigUpdateFailed { device_path: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    /// Errors caused by the caller's input rather than by this service or its
    /// collaborators.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidConfiguration(_)
                | DomainError::ValidationError(_)
                | DomainError::MalformedEvent(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_classification() {
        assert!(DomainError::InvalidConfiguration("min above max".into()).is_invalid_argument());
        assert!(DomainError::MalformedEvent("bad json".into()).is_invalid_argument());
        assert!(!DomainError::CommandDispatchFailed {
            device_path: "projects/p/locations/l/registries/r/devices/d".into(),
            reason: "503".into(),
        }
        .is_invalid_argument());
        assert!(!DomainError::Internal(anyhow::anyhow!("boom")).is_invalid_argument());
    }

    #[test]
    fn test_dispatch_error_message_names_device_path() {
        let err = DomainError::ConfigUpdateFailed {
            device_path: "projects/p/locations/l/registries/r/devices/d".into(),
            reason: "timeout".into(),
        };
        assert_eq!(
            err.to_string(),
            "Configuration update failed for projects/p/locations/l/registries/r/devices/d: timeout"
        );
    }
}
