//! Authentication module
//!
//! Identity Toolkit REST authentication: sign-in, account management, and
//! token refresh.

pub mod auth;
pub mod types;

pub use auth::Auth;
pub use types::{AdditionalUserInfo, AuthResult, TokenRefresh, User};
