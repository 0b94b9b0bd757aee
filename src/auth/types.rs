//! Authentication types
//!
//! User account data and sign-in results, plus the serde DTOs for the
//! Identity Toolkit and Secure Token REST responses.

use serde::Deserialize;
use std::sync::Arc;

/// A signed-in user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID (`localId`)
    pub uid: String,
    /// Email address, if the account has one
    pub email: Option<String>,
    /// Display name, if set
    pub display_name: Option<String>,
    /// Photo URL, if set
    pub photo_url: Option<String>,
    /// Whether the email address has been verified
    pub email_verified: bool,
    /// Whether this is an anonymous account
    pub is_anonymous: bool,
    /// Current ID token for authenticated API calls
    pub id_token: Option<String>,
    /// Refresh token for obtaining new ID tokens
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) when the ID token expires
    pub token_expiration: Option<i64>,
}

/// Result of a sign-in operation
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// The signed-in user
    pub user: Arc<User>,
    /// Provider details about the sign-in
    pub additional_user_info: Option<AdditionalUserInfo>,
}

/// Additional information about a sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalUserInfo {
    /// Sign-in provider (`password`, `anonymous`, `custom`)
    pub provider_id: String,
    /// Whether this sign-in created the account
    pub is_new_user: bool,
}

/// Fresh tokens from a refresh-token exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRefresh {
    /// New ID token
    pub id_token: String,
    /// New refresh token
    pub refresh_token: String,
    /// User ID the tokens belong to
    pub user_id: String,
    /// Unix timestamp (seconds) when the new ID token expires
    pub token_expiration: Option<i64>,
}

/// Identity Toolkit sign-in response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignInResponse {
    pub local_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: Option<String>,
}

impl SignInResponse {
    pub(crate) fn into_user(self, is_anonymous: bool) -> User {
        let token_expiration = expiration_from_now(self.expires_in.as_deref());

        User {
            uid: self.local_id,
            email: self.email,
            display_name: self.display_name,
            photo_url: None,
            email_verified: false,
            is_anonymous,
            id_token: Some(self.id_token),
            refresh_token: Some(self.refresh_token),
            token_expiration,
        }
    }
}

/// Secure Token exchange response body (snake_case, unlike Identity Toolkit)
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub expires_in: Option<String>,
}

impl RefreshResponse {
    pub(crate) fn into_token_refresh(self) -> TokenRefresh {
        let token_expiration = expiration_from_now(self.expires_in.as_deref());

        TokenRefresh {
            id_token: self.id_token,
            refresh_token: self.refresh_token,
            user_id: self.user_id,
            token_expiration,
        }
    }
}

/// Absolute expiration from an `expiresIn` seconds string, 1h fallback
fn expiration_from_now(expires_in: Option<&str>) -> Option<i64> {
    let seconds = expires_in
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(3600);
    Some(chrono::Utc::now().timestamp() + seconds)
}
