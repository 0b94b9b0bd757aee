//! Structured query builder
//!
//! An immutable, chainable builder accumulating query clauses and compiling
//! them into the `{"structuredQuery": {...}}` wire object consumed by the
//! `:runQuery` endpoint.
//!
//! Every mutating call returns a new `Query` with one clause replaced (or,
//! for ordering, appended), leaving the receiver untouched. A shared base
//! query can therefore be branched into derived queries from any number of
//! callers without coordination.

use crate::error::FirestoreError;
use crate::firestore::structured_query::{
    CollectionSelector, Cursor, Direction, FieldFilter, FieldFilterOperator, FieldReference,
    Filter, Order, Projection, UnaryFilter, UnaryFilterOperator, EQUALITY_OPERATOR,
};
use crate::firestore::value::Value;
use serde_json::json;

/// A structured Firestore query
///
/// Constructed empty, built up through a chain of clause methods, and
/// terminally serialized with [`to_wire`](Query::to_wire). Serialization is a
/// pure function of the accumulated clauses and may be called any number of
/// times.
///
/// # Example
/// ```
/// use firebase_rest_client::firestore::{Query, Value};
///
/// let query = Query::new()
///     .select(["Name"])?
///     .from_collection([("Customers", false)])?
///     .where_field("Age", ">=", Value::Integer(18))?
///     .order_by_asc("Age")?
///     .limit(10)?;
/// let wire = query.to_wire();
/// assert_eq!(wire["structuredQuery"]["limit"], 10);
/// # Ok::<(), firebase_rest_client::FirestoreError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    select: Option<Projection>,
    from: Option<CollectionSelector>,
    filter: Option<Filter>,
    order_by: Vec<Order>,
    start_at: Option<Cursor>,
    end_at: Option<Cursor>,
    offset: Option<i64>,
    limit: Option<i64>,
}

impl Query {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the projection of document fields to return
    ///
    /// Replaces any previous projection. Fails with `InvalidFieldPath` if a
    /// path is empty.
    pub fn select<I, S>(&self, field_paths: I) -> Result<Self, FirestoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = field_paths
            .into_iter()
            .map(FieldReference::new)
            .collect::<Result<Vec<_>, _>>()?;
        let mut next = self.clone();
        next.select = Some(Projection::new(fields));
        Ok(next)
    }

    /// Set the collection(s) to query from
    ///
    /// Takes `(collectionId, allDescendants)` pairs; `allDescendants` false
    /// selects only immediate children of the query parent, true selects all
    /// descendant collections. Replaces any previous selector; at least one
    /// pair is required.
    pub fn from_collection<I, S>(&self, collections: I) -> Result<Self, FirestoreError>
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        let pairs = collections
            .into_iter()
            .map(|(id, all_descendants)| (id.into(), all_descendants))
            .collect();
        let mut next = self.clone();
        next.from = Some(CollectionSelector::new(pairs)?);
        Ok(next)
    }

    /// Set the filter clause
    ///
    /// `op` is an operator symbol from the fixed table (`<`, `<=`, `>`, `>=`,
    /// `==`, `!=`, `array_contains`, `in`, `array_contains_any`, `not_in`).
    ///
    /// Null and NaN values cannot be compared: they are only accepted with
    /// the equality operator and compile to unary `IS_NULL`/`IS_NAN` filters
    /// instead of field filters.
    ///
    /// Replaces any previously set filter; only one filter clause is
    /// representable per query.
    pub fn where_field(
        &self,
        field: &str,
        op: &str,
        value: Value,
    ) -> Result<Self, FirestoreError> {
        let field = FieldReference::new(field)?;

        let filter = if value == Value::Null {
            if op != EQUALITY_OPERATOR {
                return Err(FirestoreError::NullRequiresEquality);
            }
            Filter::Unary(UnaryFilter::new(field, UnaryFilterOperator::IsNull))
        } else if value.is_nan() {
            if op != EQUALITY_OPERATOR {
                return Err(FirestoreError::NanRequiresEquality);
            }
            Filter::Unary(UnaryFilter::new(field, UnaryFilterOperator::IsNan))
        } else {
            let operator = FieldFilterOperator::from_symbol(op)?;
            Filter::Field(FieldFilter::new(field, operator, value))
        };

        let mut next = self.clone();
        next.filter = Some(filter);
        Ok(next)
    }

    /// Set the filter clause from a dynamic tagged payload
    ///
    /// Same as [`where_field`](Query::where_field) with the value constructed
    /// through [`Value::from_tagged`].
    pub fn where_tagged(
        &self,
        field: &str,
        op: &str,
        tag: &str,
        payload: &serde_json::Value,
    ) -> Result<Self, FirestoreError> {
        self.where_field(field, op, Value::from_tagged(tag, payload)?)
    }

    /// Append an ordering directive
    ///
    /// `direction` must be one of `ASCENDING`, `DESCENDING`, or
    /// `DIRECTION_UNSPECIFIED`. Unlike the other clause methods this one
    /// appends: chained calls compose left-to-right into the orderBy
    /// sequence.
    pub fn order_by(&self, field: &str, direction: &str) -> Result<Self, FirestoreError> {
        let direction: Direction = direction.parse()?;
        let order = Order::new(FieldReference::new(field)?, direction);
        let mut next = self.clone();
        next.order_by.push(order);
        Ok(next)
    }

    /// Append an ascending ordering directive
    pub fn order_by_asc(&self, field: &str) -> Result<Self, FirestoreError> {
        self.order_by(field, Direction::Ascending.as_str())
    }

    /// Set the start cursor
    ///
    /// `before` true positions the boundary just before `value` relative to
    /// the sort order. Replaces any previous start cursor.
    pub fn start_at(&self, value: Value, before: bool) -> Self {
        let mut next = self.clone();
        next.start_at = Some(Cursor::new(value, before));
        next
    }

    /// Set the end cursor; replaces any previous end cursor
    pub fn end_at(&self, value: Value, before: bool) -> Self {
        let mut next = self.clone();
        next.end_at = Some(Cursor::new(value, before));
        next
    }

    /// Set the number of results to skip
    ///
    /// Applies before limit, but after all other constraints. Must be
    /// non-negative.
    pub fn offset(&self, offset: i64) -> Result<Self, FirestoreError> {
        if offset < 0 {
            return Err(FirestoreError::OutOfRange(format!(
                "offset must be non-negative, got {}",
                offset
            )));
        }
        let mut next = self.clone();
        next.offset = Some(offset);
        Ok(next)
    }

    /// Set the maximum number of results to return
    ///
    /// Applies after all other constraints. Must be non-negative.
    pub fn limit(&self, limit: i64) -> Result<Self, FirestoreError> {
        if limit < 0 {
            return Err(FirestoreError::OutOfRange(format!(
                "limit must be non-negative, got {}",
                limit
            )));
        }
        let mut next = self.clone();
        next.limit = Some(limit);
        Ok(next)
    }

    /// Compile the query into its wire object
    ///
    /// Produces `{"structuredQuery": {...}}` with only the clauses that were
    /// set; unset clauses are absent, not null. Nested arrays (orderBy, the
    /// collection list) preserve insertion order.
    pub fn to_wire(&self) -> serde_json::Value {
        let mut body = serde_json::Map::new();

        if let Some(select) = &self.select {
            body.insert("select".to_string(), select.to_wire());
        }
        if let Some(from) = &self.from {
            body.insert("from".to_string(), from.to_wire());
        }
        if let Some(filter) = &self.filter {
            body.insert("where".to_string(), filter.to_wire());
        }
        if !self.order_by.is_empty() {
            body.insert(
                "orderBy".to_string(),
                json!(self.order_by.iter().map(Order::to_wire).collect::<Vec<_>>()),
            );
        }
        if let Some(start_at) = &self.start_at {
            body.insert("startAt".to_string(), start_at.to_wire());
        }
        if let Some(end_at) = &self.end_at {
            body.insert("endAt".to_string(), end_at.to_wire());
        }
        if let Some(offset) = self.offset {
            body.insert("offset".to_string(), json!(offset));
        }
        if let Some(limit) = self.limit {
            body.insert("limit".to_string(), json!(limit));
        }

        json!({"structuredQuery": body})
    }
}
