//! Firestore module
//!
//! Typed value encoding, the structured query builder, and the REST document
//! service.
//!
//! The value encoder and query builder are purely functional: they validate
//! eagerly, never touch the network, and compile to `serde_json::Value` wire
//! objects. [`Firestore`] is the I/O shell that sends those objects to the
//! REST API.

pub mod client;
pub mod query;
pub mod structured_query;
pub mod value;

pub use client::{Firestore, Precondition};
pub use query::Query;
pub use structured_query::{
    CollectionSelector, Cursor, Direction, FieldFilter, FieldFilterOperator, FieldReference,
    Filter, Order, Projection, UnaryFilter, UnaryFilterOperator,
};
pub use value::{Value, ValueKind};
