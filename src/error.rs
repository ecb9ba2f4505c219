//! Error types for kusto-auth.
//!
//! This module defines domain-specific error types organized by functional area.

use crate::auth::AuthMethod;
use thiserror::Error;

/// Top-level error type encompassing all possible errors.
#[derive(Error, Debug)]
pub enum KustoAuthError {
    /// Connection string and builder errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Credential selection and token acquisition errors
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Errors raised while parsing or validating a connection string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The connection string was empty or whitespace only
    #[error("Connection string cannot be empty")]
    Empty,

    /// Connection string parsing error
    #[error("Failed to parse connection string: {0}")]
    ParseError(String),

    /// A keyword that is not part of the connection string grammar
    #[error("Unsupported key '{0}' in connection string")]
    UnsupportedKey(String),

    /// A required builder argument or field was empty
    #[error("{0} cannot be null")]
    MissingValue(&'static str),

    /// Invalid connection parameters
    #[error("Invalid connection parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },
}

/// Errors related to credential construction and token acquisition.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The identity library refused to build the credential
    #[error("Failed to create {method} credential: {message}")]
    CredentialCreation { method: AuthMethod, message: String },

    /// Token request failed
    #[error("Failed to acquire token using {method}: {message}")]
    TokenAcquisition { method: AuthMethod, message: String },

    /// Cloud metadata could not be read
    #[error("Invalid cloud metadata: {0}")]
    InvalidCloudInfo(String),

    /// The configuration record failed validation
    #[error(transparent)]
    InvalidConfiguration(#[from] ConnectionError),
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::InvalidCloudInfo(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_value_display() {
        let err = ConnectionError::MissingValue("Password");
        assert_eq!(err.to_string(), "Password cannot be null");
    }

    #[test]
    fn test_empty_display() {
        assert_eq!(
            ConnectionError::Empty.to_string(),
            "Connection string cannot be empty"
        );
    }

    #[test]
    fn test_unsupported_key_display() {
        let err = ConnectionError::UnsupportedKey("bogus".to_string());
        assert!(err.to_string().contains("'bogus'"));
    }

    #[test]
    fn test_auth_error_names_method() {
        let err = AuthError::TokenAcquisition {
            method: AuthMethod::ClientSecret,
            message: "invalid_client".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("client secret"));
        assert!(text.contains("invalid_client"));
    }

    #[test]
    fn test_top_level_transparent() {
        let err: KustoAuthError = ConnectionError::Empty.into();
        assert_eq!(err.to_string(), "Connection string cannot be empty");

        let err: KustoAuthError = AuthError::InvalidCloudInfo("bad".to_string()).into();
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: AuthError = parse.unwrap_err().into();
        assert!(matches!(err, AuthError::InvalidCloudInfo(_)));
    }
}
