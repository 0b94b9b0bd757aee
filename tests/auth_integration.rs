//! Integration tests for Authentication
//!
//! These tests interact with the real Identity Toolkit API and require:
//! 1. A Firebase project with Email/Password and Anonymous auth enabled
//! 2. Environment variables set in .env file
//! 3. Run with: cargo test --features integration-tests -- --test-threads=1

#![cfg(feature = "integration-tests")]

use firebase_rest_client::{Auth, FirebaseError};
use std::env;

/// Load environment variables from .env file and set up logging
fn load_env() {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

async fn get_auth() -> Auth {
    load_env();
    let api_key = env::var("FIREBASE_API_KEY").expect("FIREBASE_API_KEY must be set in .env file");
    Auth::get_auth(&api_key).await.expect("Failed to get Auth instance")
}

#[tokio::test]
async fn test_sign_in_with_email_and_password() {
    let auth = get_auth().await;
    let email = env::var("TEST_USER_EMAIL").expect("TEST_USER_EMAIL must be set in .env file");
    let password =
        env::var("TEST_USER_PASSWORD").expect("TEST_USER_PASSWORD must be set in .env file");

    let result = auth
        .sign_in_with_email_and_password(&email, &password)
        .await
        .expect("Failed to sign in");

    assert_eq!(result.user.email.as_deref(), Some(email.as_str()));
    assert!(result.user.id_token.is_some());
    assert!(result.user.refresh_token.is_some());

    let current = auth.current_user().await.expect("No current user after sign-in");
    assert_eq!(current.uid, result.user.uid);

    auth.sign_out().await.unwrap();
    assert!(auth.current_user().await.is_none());
}

#[tokio::test]
async fn test_sign_in_wrong_password_fails() {
    let auth = get_auth().await;
    let email = env::var("TEST_USER_EMAIL").expect("TEST_USER_EMAIL must be set in .env file");

    let result = auth
        .sign_in_with_email_and_password(&email, "definitely-wrong-password")
        .await;
    assert!(matches!(result, Err(FirebaseError::Auth(_))));
}

#[tokio::test]
async fn test_anonymous_sign_in_and_delete() {
    let auth = get_auth().await;

    let result = auth.sign_in_anonymously().await.expect("Failed to sign in anonymously");
    assert!(result.user.is_anonymous);
    let id_token = result.user.id_token.clone().expect("No ID token");

    auth.delete_account(&id_token)
        .await
        .expect("Failed to delete anonymous account");
    assert!(auth.current_user().await.is_none());
}

#[tokio::test]
async fn test_refresh_id_token() {
    let auth = get_auth().await;
    let email = env::var("TEST_USER_EMAIL").expect("TEST_USER_EMAIL must be set in .env file");
    let password =
        env::var("TEST_USER_PASSWORD").expect("TEST_USER_PASSWORD must be set in .env file");

    let result = auth
        .sign_in_with_email_and_password(&email, &password)
        .await
        .expect("Failed to sign in");
    let refresh_token = result.user.refresh_token.clone().expect("No refresh token");

    let refresh = auth
        .refresh_id_token(&refresh_token)
        .await
        .expect("Failed to refresh ID token");
    assert_eq!(refresh.user_id, result.user.uid);
    assert!(!refresh.id_token.is_empty());

    // the stored user picked up the new tokens
    let current = auth.current_user().await.expect("No current user");
    assert_eq!(current.id_token.as_deref(), Some(refresh.id_token.as_str()));
}

#[tokio::test]
async fn test_get_user_data() {
    let auth = get_auth().await;
    let email = env::var("TEST_USER_EMAIL").expect("TEST_USER_EMAIL must be set in .env file");
    let password =
        env::var("TEST_USER_PASSWORD").expect("TEST_USER_PASSWORD must be set in .env file");

    let result = auth
        .sign_in_with_email_and_password(&email, &password)
        .await
        .expect("Failed to sign in");
    let id_token = result.user.id_token.clone().expect("No ID token");

    let data = auth.get_user_data(&id_token).await.expect("Failed to look up user");
    let users = data["users"].as_array().expect("lookup returned no users");
    assert_eq!(users[0]["localId"].as_str(), Some(result.user.uid.as_str()));
}

#[tokio::test]
async fn test_update_profile_round_trip() {
    let auth = get_auth().await;

    let result = auth.sign_in_anonymously().await.expect("Failed to sign in anonymously");
    let id_token = result.user.id_token.clone().expect("No ID token");

    let updated = auth
        .update_profile(&id_token, Some("Integration Tester"), None)
        .await
        .expect("Failed to update profile");
    assert_eq!(updated["displayName"].as_str(), Some("Integration Tester"));

    let _ = auth.delete_account(&id_token).await;
}

#[tokio::test]
async fn test_fetch_providers_for_email() {
    let auth = get_auth().await;
    let email = env::var("TEST_USER_EMAIL").expect("TEST_USER_EMAIL must be set in .env file");

    let response = auth
        .fetch_providers_for_email(&email, "http://localhost")
        .await
        .expect("Failed to fetch providers");
    assert_eq!(response["registered"].as_bool(), Some(true));
}
