//! Firebase Authentication
//!
//! REST client for the Identity Toolkit and Secure Token APIs
//! (<https://firebase.google.com/docs/reference/rest/auth>). One `Auth`
//! instance exists per API key; it tracks the current signed-in user and
//! exposes the account management endpoints.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::auth::types::{
    AdditionalUserInfo, AuthResult, RefreshResponse, SignInResponse, TokenRefresh, User,
};
use crate::error::{AuthError, FirebaseError};

/// Identity Toolkit REST API base URL
const IDENTITY_TOOLKIT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Secure Token API URL for refresh-token exchange
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Global map of API keys to Auth instances
static AUTH_INSTANCES: Lazy<RwLock<HashMap<String, Auth>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Firebase Authentication instance
///
/// Each API key has at most one Auth instance. Use
/// [`Auth::get_auth`] to obtain or create one.
#[derive(Clone)]
pub struct Auth {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    api_key: String,
    current_user: RwLock<Option<Arc<User>>>,
    http_client: reqwest::Client,
}

impl Auth {
    /// Get or create the Auth instance for the given API key
    ///
    /// Returns the existing instance if one exists for this API key,
    /// otherwise creates a new one. Thread-safe.
    pub async fn get_auth(api_key: impl Into<String>) -> Result<Self, FirebaseError> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(FirebaseError::ApiKeyNotConfigured);
        }

        let mut instances = AUTH_INSTANCES.write().await;

        if let Some(auth) = instances.get(&api_key) {
            return Ok(auth.clone());
        }

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let auth = Auth {
            inner: Arc::new(AuthInner {
                api_key: api_key.clone(),
                current_user: RwLock::new(None),
                http_client,
            }),
        };

        instances.insert(api_key, auth.clone());

        Ok(auth)
    }

    /// The API key for this Auth instance
    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    /// The current signed-in user, if any
    pub async fn current_user(&self) -> Option<Arc<User>> {
        self.inner.current_user.read().await.clone()
    }

    /// Sign out the current user
    ///
    /// Always succeeds and clears the current user.
    pub async fn sign_out(&self) -> Result<(), FirebaseError> {
        self.set_current_user(None).await;
        Ok(())
    }

    pub(crate) async fn set_current_user(&self, user: Option<Arc<User>>) {
        let mut current = self.inner.current_user.write().await;
        *current = user;
    }

    /// POST a JSON body to an Identity Toolkit `accounts:{verb}` endpoint
    ///
    /// Non-2xx responses are translated through the server's error code.
    async fn post_accounts(
        &self,
        verb: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, FirebaseError> {
        let url = format!(
            "{}/accounts:{}?key={}",
            IDENTITY_TOOLKIT_BASE_URL, verb, self.inner.api_key
        );
        debug!("POST {}/accounts:{}", IDENTITY_TOOLKIT_BASE_URL, verb);

        let response = self.inner.http_client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let error_body: serde_json::Value = response.json().await?;
            let error_message = error_body["error"]["message"]
                .as_str()
                .unwrap_or("UNKNOWN_ERROR");
            return Err(AuthError::from_error_code(error_message).into());
        }

        Ok(response.json().await?)
    }

    /// Sign in and store the resulting user as the current user
    async fn sign_in(
        &self,
        verb: &str,
        body: serde_json::Value,
        provider_id: &str,
        is_new_user: bool,
    ) -> Result<AuthResult, FirebaseError> {
        let response = self.post_accounts(verb, body).await?;
        let user_data: SignInResponse = serde_json::from_value(response)?;
        let user = Arc::new(user_data.into_user(provider_id == "anonymous"));

        self.set_current_user(Some(Arc::clone(&user))).await;

        Ok(AuthResult {
            user,
            additional_user_info: Some(AdditionalUserInfo {
                provider_id: provider_id.to_string(),
                is_new_user,
            }),
        })
    }

    /// Sign in with email and password
    pub async fn sign_in_with_email_and_password(
        &self,
        email: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Result<AuthResult, FirebaseError> {
        let email = email.as_ref();
        let password = password.as_ref();

        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }
        if password.is_empty() {
            return Err(AuthError::InvalidPassword.into());
        }

        self.sign_in(
            "signInWithPassword",
            serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true
            }),
            "password",
            false,
        )
        .await
    }

    /// Create a new user with email and password and sign them in
    pub async fn create_user_with_email_and_password(
        &self,
        email: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Result<AuthResult, FirebaseError> {
        let email = email.as_ref();
        let password = password.as_ref();

        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }
        if password.is_empty() {
            return Err(AuthError::InvalidPassword.into());
        }

        self.sign_in(
            "signUp",
            serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true
            }),
            "password",
            true,
        )
        .await
    }

    /// Sign in anonymously
    ///
    /// Creates a temporary anonymous account that can later be linked to a
    /// permanent one.
    pub async fn sign_in_anonymously(&self) -> Result<AuthResult, FirebaseError> {
        self.sign_in(
            "signUp",
            serde_json::json!({"returnSecureToken": true}),
            "anonymous",
            true,
        )
        .await
    }

    /// Sign in with a custom token generated by your own server
    pub async fn sign_in_with_custom_token(&self, token: &str) -> Result<AuthResult, FirebaseError> {
        if token.is_empty() {
            return Err(
                AuthError::InvalidCredential("Custom token cannot be empty".to_string()).into(),
            );
        }

        self.sign_in(
            "signInWithCustomToken",
            serde_json::json!({
                "token": token,
                "returnSecureToken": true
            }),
            "custom",
            false,
        )
        .await
    }

    /// Exchange a refresh token for a fresh ID token
    ///
    /// If the tokens belong to the current user, the stored user is updated
    /// in place.
    pub async fn refresh_id_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefresh, FirebaseError> {
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidRefreshToken.into());
        }

        let url = format!("{}?key={}", SECURE_TOKEN_URL, self.inner.api_key);
        debug!("POST {}", SECURE_TOKEN_URL);

        let response = self
            .inner
            .http_client
            .post(&url)
            .json(&serde_json::json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_body: serde_json::Value = response.json().await?;
            let error_message = error_body["error"]["message"]
                .as_str()
                .unwrap_or("UNKNOWN_ERROR");
            return Err(AuthError::from_error_code(error_message).into());
        }

        let refresh_data: RefreshResponse = response.json().await?;
        let refresh = refresh_data.into_token_refresh();

        let mut current = self.inner.current_user.write().await;
        if let Some(user) = current.as_ref() {
            if user.uid == refresh.user_id {
                let mut updated = (**user).clone();
                updated.id_token = Some(refresh.id_token.clone());
                updated.refresh_token = Some(refresh.refresh_token.clone());
                updated.token_expiration = refresh.token_expiration;
                *current = Some(Arc::new(updated));
            }
        }

        Ok(refresh)
    }

    /// Look up which sign-in providers are registered for an email address
    ///
    /// `continue_uri` is the URL the IDP redirects back to.
    pub async fn fetch_providers_for_email(
        &self,
        email: impl AsRef<str>,
        continue_uri: &str,
    ) -> Result<serde_json::Value, FirebaseError> {
        let email = email.as_ref();

        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }

        self.post_accounts(
            "createAuthUri",
            serde_json::json!({
                "identifier": email,
                "continueUri": continue_uri
            }),
        )
        .await
    }

    /// Send a password reset email
    pub async fn send_password_reset_email(
        &self,
        email: impl AsRef<str>,
    ) -> Result<(), FirebaseError> {
        let email = email.as_ref();

        if email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }

        self.post_accounts(
            "sendOobCode",
            serde_json::json!({
                "requestType": "PASSWORD_RESET",
                "email": email
            }),
        )
        .await?;

        Ok(())
    }

    /// Verify a password reset code, returning the email it was issued for
    pub async fn verify_password_reset_code(
        &self,
        oob_code: &str,
    ) -> Result<String, FirebaseError> {
        let response = self
            .post_accounts("resetPassword", serde_json::json!({"oobCode": oob_code}))
            .await?;

        response["email"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AuthError::InvalidActionCode.into())
    }

    /// Apply a password reset code with the new password
    pub async fn confirm_password_reset(
        &self,
        oob_code: &str,
        new_password: &str,
    ) -> Result<(), FirebaseError> {
        if new_password.is_empty() {
            return Err(AuthError::InvalidPassword.into());
        }

        self.post_accounts(
            "resetPassword",
            serde_json::json!({
                "oobCode": oob_code,
                "newPassword": new_password
            }),
        )
        .await?;

        Ok(())
    }

    /// Change the signed-in user's email address
    ///
    /// May invalidate the passed ID token; the response carries fresh tokens.
    pub async fn change_email(
        &self,
        id_token: &str,
        new_email: impl AsRef<str>,
    ) -> Result<serde_json::Value, FirebaseError> {
        let new_email = new_email.as_ref();

        if new_email.is_empty() {
            return Err(AuthError::InvalidEmail.into());
        }

        self.post_accounts(
            "update",
            serde_json::json!({
                "idToken": id_token,
                "email": new_email,
                "returnSecureToken": true
            }),
        )
        .await
    }

    /// Change the signed-in user's password
    pub async fn change_password(
        &self,
        id_token: &str,
        new_password: impl AsRef<str>,
    ) -> Result<serde_json::Value, FirebaseError> {
        let new_password = new_password.as_ref();

        if new_password.is_empty() {
            return Err(AuthError::InvalidPassword.into());
        }

        self.post_accounts(
            "update",
            serde_json::json!({
                "idToken": id_token,
                "password": new_password,
                "returnSecureToken": true
            }),
        )
        .await
    }

    /// Update the signed-in user's display name and/or photo URL
    ///
    /// `None` leaves the corresponding attribute unchanged.
    pub async fn update_profile(
        &self,
        id_token: &str,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<serde_json::Value, FirebaseError> {
        let mut body = serde_json::json!({
            "idToken": id_token,
            "returnSecureToken": true
        });
        if let Some(display_name) = display_name {
            body["displayName"] = serde_json::json!(display_name);
        }
        if let Some(photo_url) = photo_url {
            body["photoUrl"] = serde_json::json!(photo_url);
        }

        self.post_accounts("update", body).await
    }

    /// Fetch the account data associated with an ID token
    pub async fn get_user_data(&self, id_token: &str) -> Result<serde_json::Value, FirebaseError> {
        self.post_accounts("lookup", serde_json::json!({"idToken": id_token}))
            .await
    }

    /// Send an email verification message to the signed-in user
    pub async fn send_email_verification(&self, id_token: &str) -> Result<(), FirebaseError> {
        self.post_accounts(
            "sendOobCode",
            serde_json::json!({
                "requestType": "VERIFY_EMAIL",
                "idToken": id_token
            }),
        )
        .await?;

        Ok(())
    }

    /// Apply an email verification code
    pub async fn confirm_email_verification(
        &self,
        oob_code: &str,
    ) -> Result<serde_json::Value, FirebaseError> {
        self.post_accounts("update", serde_json::json!({"oobCode": oob_code}))
            .await
    }

    /// Delete the account associated with an ID token
    ///
    /// Clears the current user if the deleted account was signed in here.
    pub async fn delete_account(&self, id_token: &str) -> Result<(), FirebaseError> {
        self.post_accounts("delete", serde_json::json!({"idToken": id_token}))
            .await?;

        let mut current = self.inner.current_user.write().await;
        if let Some(user) = current.as_ref() {
            if user.id_token.as_deref() == Some(id_token) {
                *current = None;
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth").field("api_key", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(uid: &str) -> Arc<User> {
        Arc::new(User {
            uid: uid.to_string(),
            email: Some("test@example.com".to_string()),
            display_name: None,
            photo_url: None,
            email_verified: false,
            is_anonymous: false,
            id_token: Some("id-token".to_string()),
            refresh_token: Some("refresh-token".to_string()),
            token_expiration: None,
        })
    }

    #[tokio::test]
    async fn test_get_auth_creates_instance() {
        let auth = Auth::get_auth("test_api_key_1").await.unwrap();
        assert_eq!(auth.api_key(), "test_api_key_1");
    }

    #[tokio::test]
    async fn test_get_auth_returns_same_instance() {
        let auth1 = Auth::get_auth("test_api_key_2").await.unwrap();
        let auth2 = Auth::get_auth("test_api_key_2").await.unwrap();
        assert!(Arc::ptr_eq(&auth1.inner, &auth2.inner));
    }

    #[tokio::test]
    async fn test_get_auth_empty_key_error() {
        let result = Auth::get_auth("").await;
        assert!(matches!(result, Err(FirebaseError::ApiKeyNotConfigured)));
    }

    #[tokio::test]
    async fn test_different_api_keys_different_instances() {
        let auth1 = Auth::get_auth("key_a").await.unwrap();
        let auth2 = Auth::get_auth("key_b").await.unwrap();
        assert!(!Arc::ptr_eq(&auth1.inner, &auth2.inner));
    }

    #[tokio::test]
    async fn test_current_user_initially_none() {
        let auth = Auth::get_auth("test_api_key_3").await.unwrap();
        assert!(auth.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_user() {
        let auth = Auth::get_auth("test_api_key_4").await.unwrap();

        auth.set_current_user(Some(test_user("test_uid"))).await;
        assert!(auth.current_user().await.is_some());

        auth.sign_out().await.unwrap();
        assert!(auth.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_validates_email() {
        let auth = Auth::get_auth("test_key").await.unwrap();
        let result = auth.sign_in_with_email_and_password("", "password").await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidEmail))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_validates_password() {
        let auth = Auth::get_auth("test_key").await.unwrap();
        let result = auth
            .sign_in_with_email_and_password("test@example.com", "")
            .await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidPassword))
        ));
    }

    #[tokio::test]
    async fn test_create_user_validates_inputs() {
        let auth = Auth::get_auth("test_key").await.unwrap();

        let result = auth.create_user_with_email_and_password("", "pw123456").await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidEmail))
        ));

        let result = auth
            .create_user_with_email_and_password("new@example.com", "")
            .await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidPassword))
        ));
    }

    #[tokio::test]
    async fn test_custom_token_validates_empty() {
        let auth = Auth::get_auth("test_custom_token_key").await.unwrap();
        let result = auth.sign_in_with_custom_token("").await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidCredential(_)))
        ));
    }

    #[tokio::test]
    async fn test_refresh_validates_empty_token() {
        let auth = Auth::get_auth("test_refresh_key").await.unwrap();
        let result = auth.refresh_id_token("").await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidRefreshToken))
        ));
    }

    #[tokio::test]
    async fn test_fetch_providers_validates_email() {
        let auth = Auth::get_auth("test_providers_key").await.unwrap();
        let result = auth
            .fetch_providers_for_email("", "http://localhost")
            .await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidEmail))
        ));
    }

    #[tokio::test]
    async fn test_password_reset_validates_email() {
        let auth = Auth::get_auth("test_password_reset_key").await.unwrap();
        let result = auth.send_password_reset_email("").await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidEmail))
        ));
    }

    #[tokio::test]
    async fn test_confirm_password_reset_validates_password() {
        let auth = Auth::get_auth("test_confirm_reset_key").await.unwrap();
        let result = auth.confirm_password_reset("oob-code", "").await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidPassword))
        ));
    }

    #[tokio::test]
    async fn test_change_email_validates_email() {
        let auth = Auth::get_auth("test_change_email_key").await.unwrap();
        let result = auth.change_email("id-token", "").await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidEmail))
        ));
    }

    #[tokio::test]
    async fn test_change_password_validates_password() {
        let auth = Auth::get_auth("test_change_password_key").await.unwrap();
        let result = auth.change_password("id-token", "").await;
        assert!(matches!(
            result,
            Err(FirebaseError::Auth(AuthError::InvalidPassword))
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let auth = tokio_test::block_on(Auth::get_auth("secret_key_redacted")).unwrap();
        let rendered = format!("{:?}", auth);
        assert!(!rendered.contains("secret_key_redacted"));
        assert!(rendered.contains("<redacted>"));
    }
}
