//! Error types
//!
//! Provides a unified error type hierarchy for all Firebase REST operations.
//!
//! Uses thiserror for ergonomic error definitions. All errors implement
//! std::error::Error and can be converted to FirebaseError via From trait.

use thiserror::Error;

/// Top-level error type
///
/// Wraps module-specific error types (Auth, Firestore) into a unified type.
/// Supports conversion from all module-specific errors via `From`.
///
/// # Example
/// ```
/// use firebase_rest_client::{FirebaseError, AuthError};
///
/// let auth_err: FirebaseError = AuthError::InvalidEmail.into();
/// ```
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Authentication-related errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Firestore-related errors
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API key not configured
    #[error("API key not configured")]
    ApiKeyNotConfigured,

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Authentication errors
///
/// Maps Identity Toolkit REST error codes to Rust enum variants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email address is invalid
    #[error("Invalid email address")]
    InvalidEmail,

    /// Password is invalid or too weak
    #[error("Invalid password")]
    InvalidPassword,

    /// Email already in use by another account
    #[error("Email already in use")]
    EmailAlreadyInUse,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Wrong password
    #[error("Wrong password")]
    WrongPassword,

    /// User account has been disabled
    #[error("User account disabled")]
    UserDisabled,

    /// Too many failed attempts
    #[error("Too many requests, try again later")]
    TooManyRequests,

    /// Operation not allowed (e.g., provider disabled)
    #[error("Operation not allowed")]
    OperationNotAllowed,

    /// Invalid credential
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// User token has expired
    #[error("User token expired")]
    UserTokenExpired,

    /// Invalid user token
    #[error("Invalid user token")]
    InvalidUserToken,

    /// Invalid or expired refresh token
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Invalid out-of-band action code (password reset, email verification)
    #[error("Invalid action code")]
    InvalidActionCode,

    /// Action code expired
    #[error("Action code expired")]
    ExpiredActionCode,

    /// Invalid API key
    #[error("Invalid API key")]
    InvalidApiKey,

    /// No signed-in user
    #[error("No user is currently signed in")]
    NoSignedInUser,

    /// Unmapped error code from the REST API
    #[error("Auth error: {0}")]
    Api(String),
}

/// Firestore errors
///
/// Covers both local query-construction failures (raised synchronously while
/// building values, filters, and queries) and errors translated from REST
/// responses.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FirestoreError {
    /// Payload's native type does not match the declared value tag or field
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Value tag is not one of the known kinds
    #[error("Unknown value kind {0:?}. Must be one of [null, bool, int, double, time, string, bytes, ref, geo, array, map]")]
    UnknownValueKind(String),

    /// Comparison operator string is not in the operator table
    #[error("Operator string {op:?} is invalid. Valid choices are: {choices}.")]
    UnknownOperator {
        /// The rejected operator string
        op: String,
        /// Comma-separated list of valid operator strings
        choices: String,
    },

    /// Order direction is not one of the three direction literals
    #[error("Invalid direction {0:?}. Must be one of [ASCENDING, DESCENDING, DIRECTION_UNSPECIFIED]")]
    InvalidDirection(String),

    /// A null value was paired with a non-equality operator
    #[error("Only an equality filter (\"==\") can be used with null values")]
    NullRequiresEquality,

    /// A NaN value was paired with a non-equality operator
    #[error("Only an equality filter (\"==\") can be used with NaN values")]
    NanRequiresEquality,

    /// Numeric argument outside its allowed range
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Composite value or request body has the wrong shape
    #[error("Malformed composite: {0}")]
    MalformedComposite(String),

    /// Field path is empty
    #[error("Invalid field path: {0}")]
    InvalidFieldPath(String),

    /// Document not found
    #[error("Document not found")]
    NotFound,

    /// Resource already exists
    #[error("Resource already exists")]
    AlreadyExists,

    /// Permission denied by security rules
    #[error("Permission denied")]
    PermissionDenied,

    /// Request lacked valid authentication
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Quota exceeded
    #[error("Resource exhausted")]
    ResourceExhausted,

    /// Service unavailable
    #[error("Service unavailable")]
    Unavailable,

    /// Invalid argument reported by the server
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Unmapped REST error response
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Error message returned by the server
        message: String,
    },
}

impl FirebaseError {
    /// Create an internal error from a string
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Auth(AuthError::TooManyRequests)
                | Self::Firestore(FirestoreError::Unavailable)
                | Self::Firestore(FirestoreError::ResourceExhausted)
        )
    }

    /// Check if error indicates (re-)authentication is required
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::NoSignedInUser)
                | Self::Auth(AuthError::UserTokenExpired)
                | Self::Auth(AuthError::InvalidUserToken)
                | Self::Firestore(FirestoreError::Unauthenticated)
        )
    }
}

impl AuthError {
    /// Create from an Identity Toolkit REST error code
    ///
    /// The REST API reports failures as `{"error": {"message": "CODE"}}`;
    /// codes carrying a detail suffix (e.g. `WEAK_PASSWORD : ...`) match on
    /// the prefix.
    pub fn from_error_code(code: &str) -> Self {
        let code = code.split(':').next().unwrap_or(code).trim();
        match code {
            "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => Self::WrongPassword,
            "USER_DISABLED" => Self::UserDisabled,
            "USER_NOT_FOUND" => Self::UserNotFound,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "OPERATION_NOT_ALLOWED" => Self::OperationNotAllowed,
            "INVALID_EMAIL" | "MISSING_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" | "MISSING_PASSWORD" => Self::InvalidPassword,
            "INVALID_ID_TOKEN" => Self::InvalidUserToken,
            "TOKEN_EXPIRED" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => Self::UserTokenExpired,
            "INVALID_REFRESH_TOKEN" | "MISSING_REFRESH_TOKEN" | "INVALID_GRANT_TYPE" => {
                Self::InvalidRefreshToken
            }
            "INVALID_OOB_CODE" => Self::InvalidActionCode,
            "EXPIRED_OOB_CODE" => Self::ExpiredActionCode,
            "INVALID_API_KEY" | "API_KEY_INVALID" => Self::InvalidApiKey,
            "INVALID_CUSTOM_TOKEN" | "CREDENTIAL_MISMATCH" => {
                Self::InvalidCredential(code.to_string())
            }
            other => Self::Api(other.to_string()),
        }
    }
}

impl FirestoreError {
    /// Create from a Firestore REST error response
    ///
    /// Translates the HTTP status of a failed request plus the server's error
    /// message into a typed error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => Self::InvalidArgument(message),
            401 => Self::Unauthenticated,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            409 => Self::AlreadyExists,
            429 => Self::ResourceExhausted,
            500 => Self::Internal(message),
            503 => Self::Unavailable,
            _ => Self::Api { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_into_firebase_error() {
        let auth_err = AuthError::InvalidEmail;
        let firebase_err: FirebaseError = auth_err.into();

        assert!(matches!(
            firebase_err,
            FirebaseError::Auth(AuthError::InvalidEmail)
        ));
    }

    #[test]
    fn test_firestore_error_into_firebase_error() {
        let fs_err = FirestoreError::NotFound;
        let firebase_err: FirebaseError = fs_err.into();

        assert!(matches!(
            firebase_err,
            FirebaseError::Firestore(FirestoreError::NotFound)
        ));
    }

    #[test]
    fn test_is_retryable() {
        assert!(FirebaseError::Auth(AuthError::TooManyRequests).is_retryable());
        assert!(FirebaseError::Firestore(FirestoreError::Unavailable).is_retryable());
        assert!(!FirebaseError::Auth(AuthError::InvalidEmail).is_retryable());
        assert!(!FirebaseError::Firestore(FirestoreError::NotFound).is_retryable());
    }

    #[test]
    fn test_requires_auth() {
        assert!(FirebaseError::Auth(AuthError::NoSignedInUser).requires_auth());
        assert!(FirebaseError::Firestore(FirestoreError::Unauthenticated).requires_auth());
        assert!(!FirebaseError::Auth(AuthError::InvalidEmail).requires_auth());
    }

    #[test]
    fn test_auth_error_from_code() {
        assert_eq!(
            AuthError::from_error_code("EMAIL_NOT_FOUND"),
            AuthError::UserNotFound
        );
        assert_eq!(
            AuthError::from_error_code("INVALID_EMAIL"),
            AuthError::InvalidEmail
        );
        assert_eq!(
            AuthError::from_error_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthError::InvalidPassword
        );
        assert_eq!(
            AuthError::from_error_code("INVALID_REFRESH_TOKEN"),
            AuthError::InvalidRefreshToken
        );
    }

    #[test]
    fn test_auth_error_unmapped_code() {
        assert_eq!(
            AuthError::from_error_code("SOMETHING_NEW"),
            AuthError::Api("SOMETHING_NEW".to_string())
        );
    }

    #[test]
    fn test_firestore_error_from_status() {
        assert_eq!(FirestoreError::from_status(404, ""), FirestoreError::NotFound);
        assert_eq!(
            FirestoreError::from_status(403, ""),
            FirestoreError::PermissionDenied
        );
        assert_eq!(
            FirestoreError::from_status(401, ""),
            FirestoreError::Unauthenticated
        );
        assert_eq!(
            FirestoreError::from_status(418, "teapot"),
            FirestoreError::Api {
                status: 418,
                message: "teapot".to_string()
            }
        );
    }

    #[test]
    fn test_error_display() {
        let err = FirebaseError::Auth(AuthError::InvalidEmail);
        let display = format!("{}", err);
        assert!(display.contains("Auth error"));
        assert!(display.contains("Invalid email"));
    }

    #[test]
    fn test_operator_error_lists_choices() {
        let err = FirestoreError::UnknownOperator {
            op: "~".to_string(),
            choices: "!=, <, <=, ==, >, >=, array_contains, array_contains_any, in, not_in"
                .to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("\"~\""));
        assert!(display.contains("array_contains_any"));
    }
}
