//! Error types for the monitor
//!
//! Only `ConfigError` is fatal. Fetch and delivery errors are absorbed by the
//! poll driver; `MonitorError` marks a cycle that should be followed by a
//! backoff pause.

use thiserror::Error;

/// Startup configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failure to read the transfer list from the source API
#[derive(Debug, Error)]
pub enum FetchError {
    /// No response was received (connect, DNS, timeout)
    #[error("Transport error: {message} (endpoint: {endpoint})")]
    Transport { endpoint: String, message: String },

    /// Response with a non-success status, including auth failures
    #[error("Source returned HTTP {status} (endpoint: {endpoint})")]
    Status { endpoint: String, status: u16 },

    /// Body was not JSON
    #[error("Failed to decode transfer list: {message} (endpoint: {endpoint})")]
    Decode { endpoint: String, message: String },
}

impl FetchError {
    /// Transport failures send the driver into backoff; the rest do not
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }

    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return FetchError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            };
        }
        if err.is_decode() {
            return FetchError::Decode {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            };
        }
        FetchError::Transport {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }
}

/// Failure to deliver a notification
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Notification rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Transport(err.to_string())
    }
}

/// Cycle-level failure; the driver pauses for the backoff interval
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Transfer source unavailable: {0}")]
    SourceUnavailable(#[source] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_fetch_errors_back_off() {
        let transport = FetchError::Transport {
            endpoint: "http://127.0.0.1:5600/api/v1/transfers".into(),
            message: "connection refused".into(),
        };
        let status = FetchError::Status {
            endpoint: "http://127.0.0.1:5600/api/v1/transfers".into(),
            status: 401,
        };
        let decode = FetchError::Decode {
            endpoint: "http://127.0.0.1:5600/api/v1/transfers".into(),
            message: "expected value".into(),
        };

        assert!(transport.is_transport());
        assert!(!status.is_transport());
        assert!(!decode.is_transport());
    }

    #[test]
    fn test_error_messages() {
        let err = ConfigError::MissingEnvVar("AIRDC_IP".into());
        assert_eq!(err.to_string(), "Missing environment variable: AIRDC_IP");

        let err = DeliveryError::Rejected {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "Notification rejected with HTTP 500: boom");
    }
}
