//! Firebase App
//!
//! The central configuration object for the other services. An `App` holds
//! the API key and project configuration that Auth and Firestore use, and
//! hands out clients for both.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::Auth;
use crate::error::FirebaseError;
use crate::firestore::Firestore;

/// Global map of App names to App instances
static APP_INSTANCES: Lazy<RwLock<HashMap<String, App>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Name used when `AppOptions::app_name` is not set
const DEFAULT_APP_NAME: &str = "[DEFAULT]";

/// Firebase App instance
///
/// Each app name has at most one App instance. Use [`App::create`] to obtain
/// or create one.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    name: String,
    options: AppOptions,
}

/// Firebase App configuration options
#[derive(Clone, Debug)]
pub struct AppOptions {
    /// Firebase API key
    pub api_key: String,
    /// Google Cloud project ID
    pub project_id: String,
    /// Firestore database ID; `"(default)"` when `None`
    pub database_id: Option<String>,
    /// App name; `"[DEFAULT]"` when `None`
    pub app_name: Option<String>,
}

impl App {
    /// Create a new Firebase App with the given options
    ///
    /// If an app with the same name already exists, returns the existing
    /// instance.
    pub async fn create(options: AppOptions) -> Result<Self, FirebaseError> {
        if options.api_key.is_empty() {
            return Err(FirebaseError::ApiKeyNotConfigured);
        }
        if options.project_id.is_empty() {
            return Err(FirebaseError::Internal(
                "Project ID cannot be empty".to_string(),
            ));
        }

        let name = match options.app_name.clone() {
            None => DEFAULT_APP_NAME.to_string(),
            Some(n) => n,
        };

        let mut instances = APP_INSTANCES.write().await;

        if let Some(app) = instances.get(&name) {
            return Ok(app.clone());
        }

        let app = App {
            inner: Arc::new(AppInner {
                name: name.clone(),
                options,
            }),
        };

        instances.insert(name, app.clone());

        Ok(app)
    }

    /// Get the default Firebase App instance
    ///
    /// Returns the app named `"[DEFAULT]"` if it exists.
    pub async fn get_instance() -> Result<Self, FirebaseError> {
        Self::get_instance_with_name(DEFAULT_APP_NAME).await
    }

    /// Get a named Firebase App instance
    pub async fn get_instance_with_name(name: &str) -> Result<Self, FirebaseError> {
        let instances = APP_INSTANCES.read().await;
        instances.get(name).cloned().ok_or_else(|| {
            FirebaseError::Internal(format!(
                "Firebase App '{}' not found. Call App::create() first.",
                name
            ))
        })
    }

    /// The app name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The app options
    pub fn options(&self) -> &AppOptions {
        &self.inner.options
    }

    /// Get the Auth service for this app
    pub async fn auth(&self) -> Result<Auth, FirebaseError> {
        Auth::get_auth(self.inner.options.api_key.clone()).await
    }

    /// Get a Firestore client for this app's project database
    pub fn firestore(&self) -> Result<Firestore, FirebaseError> {
        let database_id = self
            .inner
            .options
            .database_id
            .clone()
            .unwrap_or_else(|| "(default)".to_string());
        Firestore::new(self.inner.options.project_id.clone(), database_id)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("name", &self.inner.name)
            .field("project_id", &self.inner.options.project_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(name: &str) -> AppOptions {
        AppOptions {
            api_key: "test_api_key".to_string(),
            project_id: "test-project".to_string(),
            database_id: None,
            app_name: Some(name.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_app() {
        let app = App::create(options("app_create")).await.unwrap();
        assert_eq!(app.name(), "app_create");
        assert_eq!(app.options().project_id, "test-project");
    }

    #[tokio::test]
    async fn test_create_returns_same_instance() {
        let app1 = App::create(options("app_same")).await.unwrap();
        let app2 = App::create(options("app_same")).await.unwrap();
        assert!(Arc::ptr_eq(&app1.inner, &app2.inner));
    }

    #[tokio::test]
    async fn test_create_validates_api_key() {
        let result = App::create(AppOptions {
            api_key: String::new(),
            project_id: "test-project".to_string(),
            database_id: None,
            app_name: None,
        })
        .await;
        assert!(matches!(result, Err(FirebaseError::ApiKeyNotConfigured)));
    }

    #[tokio::test]
    async fn test_create_validates_project_id() {
        let result = App::create(AppOptions {
            api_key: "test_api_key".to_string(),
            project_id: String::new(),
            database_id: None,
            app_name: None,
        })
        .await;
        assert!(matches!(result, Err(FirebaseError::Internal(_))));
    }

    #[tokio::test]
    async fn test_get_instance_with_name_missing() {
        let result = App::get_instance_with_name("no_such_app").await;
        assert!(matches!(result, Err(FirebaseError::Internal(_))));
    }

    #[tokio::test]
    async fn test_app_hands_out_services() {
        let app = App::create(options("app_services")).await.unwrap();

        let auth = app.auth().await.unwrap();
        assert_eq!(auth.api_key(), "test_api_key");

        let firestore = app.firestore().unwrap();
        assert_eq!(firestore.project_id(), "test-project");
        assert_eq!(firestore.database_id(), "(default)");
    }
}
