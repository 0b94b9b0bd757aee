//! Firebase REST client
//!
//! Rust client for the Firebase REST APIs: Identity Toolkit authentication,
//! Firestore document CRUD, and a typed builder for Firestore structured
//! queries.
//!
//! # Example (Email/Password Auth)
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use firebase_rest_client::Auth;
//!
//! let auth = Auth::get_auth("YOUR_API_KEY").await?;
//! let result = auth.sign_in_with_email_and_password("user@example.com", "password").await?;
//! println!("Signed in: {}", result.user.uid);
//! # Ok(())
//! # }
//! ```
//!
//! # Example (Structured query)
//! ```
//! use firebase_rest_client::firestore::{Query, Value};
//!
//! let query = Query::new()
//!     .select(["Name"])?
//!     .from_collection([("Customers", false)])?
//!     .where_field("Age", ">=", Value::Integer(18))?
//!     .order_by_asc("Age")?
//!     .limit(10)?;
//!
//! // POST this to {parent}:runQuery
//! let payload = query.to_wire();
//! assert!(payload["structuredQuery"]["where"].is_object());
//! # Ok::<(), firebase_rest_client::FirestoreError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod auth;
pub mod error;
pub mod firestore;

pub use app::{App, AppOptions};
pub use auth::{Auth, AuthResult, User};
pub use error::{AuthError, FirebaseError, FirestoreError};
pub use firestore::{Firestore, Query, Value};
