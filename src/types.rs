// Core types and errors

use serde::{Deserialize, Serialize};
use thiserror::Error;
use std::time::Duration;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use lazy_static::lazy_static;
use regex::Regex;

/// The result type used throughout the Nexus Link SDK
pub type NexusResult<T> = Result<T, NexusError>;

/// Convert reqwest::Error to our NexusError
impl From<reqwest::Error> for NexusError {
    fn from(err: reqwest::Error) -> Self {
        NexusError::Request {
            message: err.to_string(),
            details: None,
            location: None,
            source: Some(Arc::new(err) as Arc<dyn std::error::Error + Send + Sync>),
        }
    }
}

impl From<serde_json::Error> for NexusError {
    fn from(err: serde_json::Error) -> Self {
        NexusError::Parse {
            message: err.to_string(),
            source_text: None,
            location: None,
            source: Some(Arc::new(err) as Arc<dyn std::error::Error + Send + Sync>),
        }
    }
}

/// Bearer credentials that zero their buffer when dropped
pub struct SecureCredentials {
    token: String,
}

impl SecureCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    /// Get a reference to the underlying token
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl Deref for SecureCredentials {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl Drop for SecureCredentials {
    fn drop(&mut self) {
        // SAFETY: zero bytes are valid UTF-8
        unsafe {
            let bytes = self.token.as_bytes_mut();
            bytes.iter_mut().for_each(|b| *b = 0);
        }
    }
}

impl fmt::Debug for SecureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureCredentials([REDACTED])")
    }
}

impl fmt::Display for SecureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED CREDENTIALS]")
    }
}

impl Clone for SecureCredentials {
    fn clone(&self) -> Self {
        Self {
            token: self.token.clone(),
        }
    }
}

/// An isolated customer context: one organization running in one environment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    pub organization: String,
    pub environment: String,
}

impl Tenant {
    /// Create a tenant, rejecting empty segments and segments containing `/`
    pub fn new(organization: impl Into<String>, environment: impl Into<String>) -> NexusResult<Self> {
        let organization = validate_segment(organization.into(), "organization")?;
        let environment = validate_segment(environment.into(), "environment")?;
        Ok(Self { organization, environment })
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.environment)
    }
}

fn validate_segment(value: String, param_name: &str) -> NexusResult<String> {
    let value = crate::utils::StringValidator::not_blank(value, param_name)?;
    if value.contains('/') {
        return Err(NexusError::Validation(format!("{} cannot contain '/'", param_name)));
    }
    Ok(value)
}

#[derive(Debug, Error, Clone)]
pub enum NexusError {
    #[error("Request failed: {message}")]
    Request {
        message: String,
        details: Option<String>,
        location: Option<String>,
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to parse response: {message}")]
    Parse {
        message: String,
        source_text: Option<String>,
        location: Option<String>,
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Service returned error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        location: Option<String>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited: retry after {retry_after:?}")]
    RateLimited {
        retry_after: Option<Duration>,
    },

    #[error("Caller is not authenticated")]
    Unauthenticated,

    #[error("Caller lacks a required role; allowed roles: {allowed}")]
    Forbidden {
        allowed: String,
    },

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {entity}: {message}")]
    Storage {
        entity: String,
        message: String,
        location: Option<String>,
    },
}

impl NexusError {
    pub fn request_error<T: Into<String>>(
        message: T,
        details: Option<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
        location: Option<&str>,
    ) -> Self {
        let error = Self::Request {
            message: message.into(),
            details,
            location: location.map(String::from),
            source: source.map(|e| Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>),
        };
        error.logged()
    }

    pub fn parse_error<T: Into<String>>(
        message: T,
        source_text: Option<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
        location: Option<&str>,
    ) -> Self {
        let error = Self::Parse {
            message: message.into(),
            source_text,
            location: location.map(String::from),
            source: source.map(|e| Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>),
        };
        error.logged()
    }

    pub fn api_error<T: Into<String>>(message: T, status: u16, location: Option<&str>) -> Self {
        let error = Self::Api {
            message: message.into(),
            status,
            location: location.map(String::from),
        };
        error.logged()
    }

    pub fn storage_error<S1: Into<String>, S2: Into<String>>(
        entity: S1,
        message: S2,
        location: Option<&str>,
    ) -> Self {
        let error = Self::Storage {
            entity: entity.into(),
            message: message.into(),
            location: location.map(String::from),
        };
        error.logged()
    }

    fn logged(self) -> Self {
        if let Some(loc) = self.location() {
            log::error!("{} at {}", self, loc);
        } else {
            log::error!("{}", self);
        }
        self
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Request { location, .. } => location.as_deref(),
            Self::Parse { location, .. } => location.as_deref(),
            Self::Api { location, .. } => location.as_deref(),
            Self::Storage { location, .. } => location.as_deref(),
            _ => None,
        }
    }

    /// True for the "already exists" condition that callers may recover from
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Create a request error carrying the call site
#[macro_export]
macro_rules! request_error {
    ($message:expr) => {
        $crate::NexusError::request_error($message, None, None::<std::io::Error>, Some(concat!(file!(), ":", line!())))
    };
    ($message:expr, $details:expr) => {
        $crate::NexusError::request_error($message, Some($details), None::<std::io::Error>, Some(concat!(file!(), ":", line!())))
    };
    ($message:expr, $details:expr, $source:expr) => {
        $crate::NexusError::request_error($message, Some($details), Some($source), Some(concat!(file!(), ":", line!())))
    };
}

/// Create a storage error carrying the call site
#[macro_export]
macro_rules! storage_error {
    ($entity:expr, $message:expr) => {
        $crate::NexusError::storage_error($entity, $message, Some(concat!(file!(), ":", line!())))
    };
}

lazy_static! {
    static ref SECRET_PATTERN: Regex = Regex::new(r"[A-Za-z0-9_\-\.]{32,}")
        .expect("secret pattern is a valid regex");
}

/// Redact long token-like runs so response bodies never leak secrets into errors
pub fn sanitize_error_message(message: &str) -> String {
    SECRET_PATTERN.replace_all(message, "[REDACTED]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_redacted() {
        let creds = SecureCredentials::new("super-secret");
        assert_eq!(format!("{:?}", creds), "SecureCredentials([REDACTED])");
        assert_eq!(creds.to_string(), "[REDACTED CREDENTIALS]");
        assert_eq!(creds.authorization_header(), "Bearer super-secret");
    }

    #[test]
    fn tenant_rejects_bad_segments() {
        assert!(Tenant::new("acme", "prod").is_ok());
        assert!(matches!(Tenant::new("", "prod"), Err(NexusError::Validation(_))));
        assert!(matches!(Tenant::new("acme", "a/b"), Err(NexusError::Validation(_))));
    }

    #[test]
    fn sanitize_redacts_long_tokens() {
        let body = "token eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9abcdef rejected";
        assert_eq!(sanitize_error_message(body), "token [REDACTED] rejected");
        assert_eq!(sanitize_error_message("short words only"), "short words only");
    }
}
