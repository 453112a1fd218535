//! Error types for gateway operations.
//!
//! This module defines the error type shared by the calendar, directory and
//! mail gateways. Every network-facing call returns a [`GatewayResult`];
//! "not found" conditions that are part of the contract (an absent marker)
//! are expressed as `Ok(None)`, never as errors.

use std::fmt;

/// The category of a gateway error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayErrorCode {
    /// Authentication failed or the token is invalid/expired.
    AuthenticationFailed,
    /// Network error - connection failed, timeout, DNS resolution, etc.
    NetworkError,
    /// Server returned an error (5xx status codes).
    ServerError,
    /// Invalid response from the server - parse error, unexpected format.
    InvalidResponse,
    /// Resource not found (404).
    NotFound,
    /// Request was invalid (400) - bad parameters, malformed request.
    BadRequest,
}

impl GatewayErrorCode {
    /// Returns true if this error is transient and the event will be
    /// retried naturally on the next scheduled pass.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError | Self::ServerError)
    }

    /// Returns a human-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
        }
    }
}

impl fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to a vendor gateway.
#[derive(Debug)]
pub struct GatewayError {
    /// The error code categorizing this error.
    code: GatewayErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The gateway that generated this error (e.g., "graph", "google").
    gateway: Option<String>,
    /// The underlying cause of this error, if any.
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl GatewayError {
    /// Creates a new gateway error with the given code and message.
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            gateway: None,
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthenticationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidResponse, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NotFound, message)
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::BadRequest, message)
    }

    /// Sets the gateway name for this error.
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = Some(gateway.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> GatewayErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the gateway name, if set.
    pub fn gateway(&self) -> Option<&str> {
        self.gateway.as_deref()
    }

    /// Returns true if this error is transient.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Maps an HTTP status code to the matching error.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        match status {
            401 | 403 => Self::authentication(message),
            404 => Self::not_found(message),
            400 => Self::bad_request(message),
            500..=599 => Self::server(message),
            _ => Self::invalid_response(format!("unexpected status {status}: {message}")),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref gateway) = self.gateway {
            write!(f, "[{}] ", gateway)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() || err.is_connect() {
            GatewayErrorCode::NetworkError
        } else if err.is_decode() {
            GatewayErrorCode::InvalidResponse
        } else {
            GatewayErrorCode::NetworkError
        };
        Self::new(code, err.to_string()).with_source(err)
    }
}

/// A specialized Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
