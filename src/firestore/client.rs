//! REST-based Firestore client
//!
//! Wraps the Firestore v1 REST endpoints
//! (<https://firebase.google.com/docs/firestore/reference/rest>): document
//! CRUD plus the `:runQuery` adapter executing a compiled
//! [`Query`](super::query::Query).
//!
//! Authentication is per call: each operation takes the caller's current ID
//! token and sends it as a Bearer header, so one client instance serves any
//! number of signed-in users.

use std::sync::Arc;

use tracing::debug;

use crate::error::{FirebaseError, FirestoreError};
use crate::firestore::query::Query;
use crate::firestore::value::utc_timestamp;

/// Firestore REST API base URL
const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Precondition on the current state of a document
///
/// Sent as `currentDocument.exists` or `currentDocument.updateTime` request
/// parameters on patch and delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The document must (or must not) already exist
    Exists(bool),
    /// The document's last update time must match the given RFC 3339 timestamp
    UpdateTime(String),
}

impl Precondition {
    fn to_param(&self) -> (String, String) {
        match self {
            Precondition::Exists(exists) => {
                ("currentDocument.exists".to_string(), exists.to_string())
            }
            Precondition::UpdateTime(time) => {
                ("currentDocument.updateTime".to_string(), time.clone())
            }
        }
    }
}

/// Firestore database client
///
/// Cheap to clone; all clones share one HTTP connection pool.
#[derive(Clone)]
pub struct Firestore {
    inner: Arc<FirestoreInner>,
}

struct FirestoreInner {
    project_id: String,
    database_id: String,
    http_client: reqwest::Client,
}

impl Firestore {
    /// Create a new Firestore client for a project database
    ///
    /// `database_id` is usually `"(default)"`.
    pub fn new(
        project_id: impl Into<String>,
        database_id: impl Into<String>,
    ) -> Result<Self, FirebaseError> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(FirestoreInner {
                project_id: project_id.into(),
                database_id: database_id.into(),
                http_client,
            }),
        })
    }

    /// The project ID
    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    /// The database ID
    pub fn database_id(&self) -> &str {
        &self.inner.database_id
    }

    /// A `readTime` timestamp for batchGet bodies
    ///
    /// `staleness_secs` seconds before now, UTC; must be within `[0, 269]`.
    pub fn read_time(staleness_secs: i64) -> Result<String, FirestoreError> {
        utc_timestamp(staleness_secs)
    }

    /// Root resource path: `projects/{project}/databases/{db}/documents`
    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.inner.project_id, self.inner.database_id
        )
    }

    /// Full URL for a document resource, with an optional `:verb` suffix
    ///
    /// Empty path segments are skipped, so a root-level call can pass `""`.
    fn document_url(&self, path: &str, verb: Option<&str>) -> String {
        let mut url = format!("{}/{}", FIRESTORE_BASE_URL, self.documents_root());
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            url.push('/');
            url.push_str(segment);
        }
        if let Some(verb) = verb {
            url.push(':');
            url.push_str(verb);
        }
        url
    }

    /// Fetch a single document
    ///
    /// `mask` limits the fields returned; empty means the whole document.
    pub async fn get_document(
        &self,
        id_token: &str,
        path: &str,
        mask: &[&str],
    ) -> Result<serde_json::Value, FirebaseError> {
        let url = self.document_url(path, None);
        debug!("GET {}", url);

        let response = self
            .inner
            .http_client
            .get(&url)
            .bearer_auth(id_token)
            .query(&field_path_params("mask.fieldPaths", mask))
            .send()
            .await?;

        check_response(response).await
    }

    /// Fetch multiple documents in one call
    ///
    /// POSTs `body` to `:batchGet`. The body must be a JSON object (with
    /// `documents`, optionally `mask` and a consistency selector such as
    /// `readTime`); any other JSON type is rejected before the request is
    /// sent.
    pub async fn batch_get(
        &self,
        id_token: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, FirebaseError> {
        require_object(body)?;

        let url = self.document_url("", Some("batchGet"));
        debug!("POST {}", url);

        let response = self
            .inner
            .http_client
            .post(&url)
            .bearer_auth(id_token)
            .json(body)
            .send()
            .await?;

        check_response(response).await
    }

    /// Create a document in a collection
    ///
    /// `parent` is the path of the parent document (empty for a root-level
    /// collection), `document_id` the client-assigned ID (server-assigned
    /// when `None`). `document` must be a JSON object holding the `fields`
    /// map.
    pub async fn create_document(
        &self,
        id_token: &str,
        parent: &str,
        collection_id: &str,
        document_id: Option<&str>,
        mask: &[&str],
        document: &serde_json::Value,
    ) -> Result<serde_json::Value, FirebaseError> {
        require_object(document)?;

        let path = if parent.is_empty() {
            collection_id.to_string()
        } else {
            format!("{}/{}", parent, collection_id)
        };
        let url = self.document_url(&path, None);
        debug!("POST {}", url);

        let mut params = field_path_params("mask.fieldPaths", mask);
        if let Some(document_id) = document_id {
            params.push(("documentId".to_string(), document_id.to_string()));
        }

        let response = self
            .inner
            .http_client
            .post(&url)
            .bearer_auth(id_token)
            .query(&params)
            .json(document)
            .send()
            .await?;

        check_response(response).await
    }

    /// Update fields of a document, creating it if missing
    ///
    /// `update_mask` names the fields to change (fields present in
    /// `document` but absent from the mask are left alone on the server),
    /// `mask` limits the fields echoed back.
    pub async fn patch_document(
        &self,
        id_token: &str,
        path: &str,
        update_mask: &[&str],
        mask: &[&str],
        precondition: Option<Precondition>,
        document: &serde_json::Value,
    ) -> Result<serde_json::Value, FirebaseError> {
        require_object(document)?;

        let url = self.document_url(path, None);
        debug!("PATCH {}", url);

        let mut params = field_path_params("updateMask.fieldPaths", update_mask);
        params.extend(field_path_params("mask.fieldPaths", mask));
        if let Some(precondition) = precondition {
            params.push(precondition.to_param());
        }

        let response = self
            .inner
            .http_client
            .patch(&url)
            .bearer_auth(id_token)
            .query(&params)
            .json(document)
            .send()
            .await?;

        check_response(response).await
    }

    /// Delete a document
    pub async fn delete_document(
        &self,
        id_token: &str,
        path: &str,
        precondition: Option<Precondition>,
    ) -> Result<(), FirebaseError> {
        let url = self.document_url(path, None);
        debug!("DELETE {}", url);

        let mut params = Vec::new();
        if let Some(precondition) = precondition {
            params.push(precondition.to_param());
        }

        let response = self
            .inner
            .http_client
            .delete(&url)
            .bearer_auth(id_token)
            .query(&params)
            .send()
            .await?;

        check_response(response).await?;
        Ok(())
    }

    /// Execute a structured query
    ///
    /// POSTs the compiled query to `{parent}:runQuery`; `parent` is the
    /// document to query under (empty for the database root). The response
    /// is the raw stream of result objects.
    pub async fn run_query(
        &self,
        id_token: &str,
        parent: &str,
        query: &Query,
    ) -> Result<serde_json::Value, FirebaseError> {
        self.run_query_raw(id_token, parent, &query.to_wire()).await
    }

    /// Execute a pre-serialized structured query payload
    ///
    /// `payload` must be a JSON object in `{"structuredQuery": {...}}` form.
    pub async fn run_query_raw(
        &self,
        id_token: &str,
        parent: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, FirebaseError> {
        require_object(payload)?;

        let url = self.document_url(parent, Some("runQuery"));
        debug!("POST {}", url);

        let response = self
            .inner
            .http_client
            .post(&url)
            .bearer_auth(id_token)
            .json(payload)
            .send()
            .await?;

        check_response(response).await
    }
}

impl std::fmt::Debug for Firestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firestore")
            .field("project_id", &self.inner.project_id)
            .field("database_id", &self.inner.database_id)
            .finish()
    }
}

/// Expand field paths into repeated `{prefix}={path}` request parameters
fn field_path_params(prefix: &str, field_paths: &[&str]) -> Vec<(String, String)> {
    field_paths
        .iter()
        .map(|path| (prefix.to_string(), (*path).to_string()))
        .collect()
}

/// Reject request bodies that are not JSON objects
fn require_object(body: &serde_json::Value) -> Result<(), FirestoreError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(FirestoreError::MalformedComposite(format!(
            "request body must be a JSON object, got {}",
            match body {
                serde_json::Value::Null => "null",
                serde_json::Value::Bool(_) => "boolean",
                serde_json::Value::Number(_) => "number",
                serde_json::Value::String(_) => "string",
                serde_json::Value::Array(_) => "array",
                serde_json::Value::Object(_) => "object",
            }
        )))
    }
}

/// Translate a REST response into a parsed body or a typed error
async fn check_response(response: reqwest::Response) -> Result<serde_json::Value, FirebaseError> {
    let status = response.status();
    let body: serde_json::Value = response.json().await?;

    if !status.is_success() {
        let message = body["error"]["message"]
            .as_str()
            .unwrap_or("Unknown error")
            .to_string();
        return Err(FirestoreError::from_status(status.as_u16(), message).into());
    }

    Ok(body)
}
