use thiserror::Error;

/// Errors raised by device communication.
///
/// Every variant is recoverable: a failed device call leaves all local state
/// intact and is reported to the caller for display. The crate has no fatal
/// error conditions.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The device could not be reached over the local network
    #[error("device unreachable: {0}")]
    Unreachable(String),

    /// The device answered with a non-success HTTP status
    #[error("device returned HTTP status {status}")]
    BadStatus {
        /// HTTP status code from the device
        status: u16,
    },

    /// The device answered with a body that could not be interpreted
    #[error("malformed device response: {0}")]
    MalformedResponse(String),
}

/// Result type for device operations
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

impl DeviceError {
    /// Check if this error indicates the device could not be reached
    ///
    /// Unreachable failures are the only ones callers may retry: the request
    /// never arrived, so repeating an idempotent read is safe.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// Check if this error indicates the device answered but refused or
    /// garbled the request
    #[must_use]
    pub const fn is_device_fault(&self) -> bool {
        matches!(self, Self::BadStatus { .. } | Self::MalformedResponse(_))
    }
}

impl From<reqwest::Error> for DeviceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::BadStatus {
                status: status.as_u16(),
            }
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

/// Errors raised by reminder input validation.
///
/// Validation runs before any mutation: a rejected create or update leaves
/// the reminder list exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The reminder title is empty after trimming
    #[error("reminder title must not be empty")]
    EmptyTitle,

    /// The reminder time is empty after trimming
    #[error("reminder time must not be empty")]
    EmptyTime,

    /// The reminder time is not a strict 24-hour `HH:MM` string
    #[error("reminder time `{value}` is not a 24-hour HH:MM time")]
    BadTimeFormat {
        /// The rejected input
        value: String,
    },
}

impl ValidationError {
    /// Name of the field that failed validation
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyTitle => "title",
            Self::EmptyTime | Self::BadTimeFormat { .. } => "time_of_day",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let unreachable = DeviceError::Unreachable("connection refused".to_string());
        assert!(unreachable.is_unreachable());
        assert!(!unreachable.is_device_fault());

        let bad_status = DeviceError::BadStatus { status: 500 };
        assert!(!bad_status.is_unreachable());
        assert!(bad_status.is_device_fault());

        let malformed = DeviceError::MalformedResponse("missing field".to_string());
        assert!(malformed.is_device_fault());
    }

    #[test]
    fn test_error_display() {
        let error = DeviceError::BadStatus { status: 404 };
        assert!(format!("{error}").contains("404"));

        let error = DeviceError::Unreachable("timed out".to_string());
        let error_string = format!("{error}");
        assert!(error_string.contains("unreachable"));
        assert!(error_string.contains("timed out"));
    }

    #[test]
    fn test_validation_field_names() {
        assert_eq!(ValidationError::EmptyTitle.field(), "title");
        assert_eq!(ValidationError::EmptyTime.field(), "time_of_day");
        assert_eq!(
            ValidationError::BadTimeFormat {
                value: "8:00".to_string()
            }
            .field(),
            "time_of_day"
        );
    }
}
