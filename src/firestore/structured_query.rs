//! Structured query primitives
//!
//! The building blocks a [`Query`](super::query::Query) accumulates:
//! field references, projections, collection selectors, ordering directives,
//! cursors, and filters
//! (<https://firebase.google.com/docs/firestore/reference/rest/v1/StructuredQuery>).
//!
//! Each primitive owns its data and exposes a pure `to_wire()` producing its
//! JSON-ready shape; equality is structural.

use crate::error::FirestoreError;
use crate::firestore::value::Value;
use serde_json::json;

/// Reference to a document field by path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReference {
    field_path: String,
}

impl FieldReference {
    /// Create a field reference; the path must be non-empty
    pub fn new(field_path: impl Into<String>) -> Result<Self, FirestoreError> {
        let field_path = field_path.into();
        if field_path.is_empty() {
            return Err(FirestoreError::InvalidFieldPath(
                "field path must not be empty".to_string(),
            ));
        }
        Ok(Self { field_path })
    }

    /// The referenced field path
    pub fn field_path(&self) -> &str {
        &self.field_path
    }

    /// Wire shape: `{"fieldPath": path}`
    pub fn to_wire(&self) -> serde_json::Value {
        json!({"fieldPath": self.field_path})
    }
}

/// Projection of document fields to return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<FieldReference>,
}

impl Projection {
    /// Create a projection over the given fields, in order
    pub fn new(fields: Vec<FieldReference>) -> Self {
        Self { fields }
    }

    /// Wire shape: `{"fields": [{"fieldPath": ...}, ...]}`
    pub fn to_wire(&self) -> serde_json::Value {
        json!({"fields": self.fields.iter().map(FieldReference::to_wire).collect::<Vec<_>>()})
    }
}

/// Selection of the collection(s) to query from
///
/// Holds one or more `(collectionId, allDescendants)` pairs. Insertion order
/// is preserved in the wire output; the first-listed collection's descendant
/// scope governs traversal order in the remote engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSelector {
    collections: Vec<(String, bool)>,
}

impl CollectionSelector {
    /// Create a selector; at least one pair is required
    pub fn new(collections: Vec<(String, bool)>) -> Result<Self, FirestoreError> {
        if collections.is_empty() {
            return Err(FirestoreError::MalformedComposite(
                "collection selector requires at least one (collectionId, allDescendants) pair"
                    .to_string(),
            ));
        }
        Ok(Self { collections })
    }

    /// Wire shape: `[{"collectionId": id, "allDescendants": flag}, ...]`
    pub fn to_wire(&self) -> serde_json::Value {
        json!(self
            .collections
            .iter()
            .map(|(id, all_descendants)| {
                json!({"collectionId": id, "allDescendants": all_descendants})
            })
            .collect::<Vec<_>>())
    }
}

/// Sort direction for query ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order
    Ascending,
    /// Descending order
    Descending,
    /// Direction left unspecified
    Unspecified,
}

impl Direction {
    /// Wire literal for this direction
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
            Direction::Unspecified => "DIRECTION_UNSPECIFIED",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = FirestoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASCENDING" => Ok(Direction::Ascending),
            "DESCENDING" => Ok(Direction::Descending),
            "DIRECTION_UNSPECIFIED" => Ok(Direction::Unspecified),
            other => Err(FirestoreError::InvalidDirection(other.to_string())),
        }
    }
}

/// A single ordering directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    field: FieldReference,
    direction: Direction,
}

impl Order {
    /// Order on `field` in `direction`
    pub fn new(field: FieldReference, direction: Direction) -> Self {
        Self { field, direction }
    }

    /// Wire shape: `{"field": {"fieldPath": ...}, "direction": "..."}`
    pub fn to_wire(&self) -> serde_json::Value {
        json!({"field": self.field.to_wire(), "direction": self.direction.as_str()})
    }
}

/// A positional boundary for paginated query results
///
/// `before` controls inclusivity: `true` positions the boundary just before
/// the given value relative to the sort order.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    value: Value,
    before: bool,
}

impl Cursor {
    /// Cursor at `value`, positioned before or after it per `before`
    pub fn new(value: Value, before: bool) -> Self {
        Self { value, before }
    }

    /// Wire shape: `{"values": [ValueObj], "before": bool}`
    pub fn to_wire(&self) -> serde_json::Value {
        json!({"values": [self.value.to_wire()], "before": self.before})
    }
}

/// Binary comparison operators for field filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFilterOperator {
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `array_contains`
    ArrayContains,
    /// `in`
    In,
    /// `array_contains_any`
    ArrayContainsAny,
    /// `not_in`
    NotIn,
}

/// The operator symbol accepted for equality comparisons
pub const EQUALITY_OPERATOR: &str = "==";

/// Fixed table mapping operator symbols to operators
const COMPARISON_OPERATORS: [(&str, FieldFilterOperator); 10] = [
    ("<", FieldFilterOperator::LessThan),
    ("<=", FieldFilterOperator::LessThanOrEqual),
    (">", FieldFilterOperator::GreaterThan),
    (">=", FieldFilterOperator::GreaterThanOrEqual),
    (EQUALITY_OPERATOR, FieldFilterOperator::Equal),
    ("!=", FieldFilterOperator::NotEqual),
    ("array_contains", FieldFilterOperator::ArrayContains),
    ("in", FieldFilterOperator::In),
    ("array_contains_any", FieldFilterOperator::ArrayContainsAny),
    ("not_in", FieldFilterOperator::NotIn),
];

impl FieldFilterOperator {
    /// Resolve an operator symbol (`"<"`, `"=="`, `"array_contains"`, ...)
    ///
    /// Unknown symbols fail with an error enumerating all valid choices.
    pub fn from_symbol(op: &str) -> Result<Self, FirestoreError> {
        COMPARISON_OPERATORS
            .iter()
            .find(|(symbol, _)| *symbol == op)
            .map(|(_, operator)| *operator)
            .ok_or_else(|| {
                let mut choices: Vec<&str> =
                    COMPARISON_OPERATORS.iter().map(|(symbol, _)| *symbol).collect();
                choices.sort_unstable();
                FirestoreError::UnknownOperator {
                    op: op.to_string(),
                    choices: choices.join(", "),
                }
            })
    }

    /// Wire name for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldFilterOperator::LessThan => "LESS_THAN",
            FieldFilterOperator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            FieldFilterOperator::GreaterThan => "GREATER_THAN",
            FieldFilterOperator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            FieldFilterOperator::Equal => "EQUAL",
            FieldFilterOperator::NotEqual => "NOT_EQUAL",
            FieldFilterOperator::ArrayContains => "ARRAY_CONTAINS",
            FieldFilterOperator::In => "IN",
            FieldFilterOperator::ArrayContainsAny => "ARRAY_CONTAINS_ANY",
            FieldFilterOperator::NotIn => "NOT_IN",
        }
    }
}

/// Operators for unary filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryFilterOperator {
    /// Field is null
    IsNull,
    /// Field is NaN
    IsNan,
}

impl UnaryFilterOperator {
    /// Wire name for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryFilterOperator::IsNull => "IS_NULL",
            UnaryFilterOperator::IsNan => "IS_NAN",
        }
    }
}

/// Binary predicate comparing one document field against a literal value
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    field: FieldReference,
    op: FieldFilterOperator,
    value: Value,
}

impl FieldFilter {
    /// Filter matching documents where `field op value`
    pub fn new(field: FieldReference, op: FieldFilterOperator, value: Value) -> Self {
        Self { field, op, value }
    }

    /// Wire shape: `{"field": ..., "op": ..., "value": ...}`
    pub fn to_wire(&self) -> serde_json::Value {
        json!({
            "field": self.field.to_wire(),
            "op": self.op.as_str(),
            "value": self.value.to_wire(),
        })
    }
}

/// Predicate testing a field for null-ness or NaN-ness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryFilter {
    field: FieldReference,
    op: UnaryFilterOperator,
}

impl UnaryFilter {
    /// Unary test of `field`
    pub fn new(field: FieldReference, op: UnaryFilterOperator) -> Self {
        Self { field, op }
    }

    /// Wire shape: `{"field": ..., "op": ...}`
    pub fn to_wire(&self) -> serde_json::Value {
        json!({"field": self.field.to_wire(), "op": self.op.as_str()})
    }
}

/// A query filter clause
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field comparison filter
    Field(FieldFilter),
    /// Unary null/NaN test
    Unary(UnaryFilter),
}

impl Filter {
    /// Wire shape: `{"fieldFilter": {...}}` or `{"unaryFilter": {...}}`
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            Filter::Field(f) => json!({"fieldFilter": f.to_wire()}),
            Filter::Unary(f) => json!({"unaryFilter": f.to_wire()}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_reference_wire() {
        let field = FieldReference::new("Name").unwrap();
        assert_eq!(field.to_wire(), json!({"fieldPath": "Name"}));
    }

    #[test]
    fn test_field_reference_rejects_empty_path() {
        assert!(matches!(
            FieldReference::new("").unwrap_err(),
            FirestoreError::InvalidFieldPath(_)
        ));
    }

    #[test]
    fn test_projection_preserves_field_order() {
        let projection = Projection::new(vec![
            FieldReference::new("Name").unwrap(),
            FieldReference::new("Age").unwrap(),
        ]);
        assert_eq!(
            projection.to_wire(),
            json!({"fields": [{"fieldPath": "Name"}, {"fieldPath": "Age"}]})
        );
    }

    #[test]
    fn test_collection_selector_preserves_insertion_order() {
        let selector = CollectionSelector::new(vec![
            ("Customers".to_string(), false),
            ("Archive".to_string(), true),
        ])
        .unwrap();
        assert_eq!(
            selector.to_wire(),
            json!([
                {"collectionId": "Customers", "allDescendants": false},
                {"collectionId": "Archive", "allDescendants": true},
            ])
        );
    }

    #[test]
    fn test_collection_selector_rejects_empty() {
        assert!(matches!(
            CollectionSelector::new(vec![]).unwrap_err(),
            FirestoreError::MalformedComposite(_)
        ));
    }

    #[test]
    fn test_direction_literals() {
        assert_eq!("ASCENDING".parse::<Direction>().unwrap(), Direction::Ascending);
        assert_eq!("DESCENDING".parse::<Direction>().unwrap(), Direction::Descending);
        assert_eq!(
            "DIRECTION_UNSPECIFIED".parse::<Direction>().unwrap(),
            Direction::Unspecified
        );
        assert!(matches!(
            "UP".parse::<Direction>().unwrap_err(),
            FirestoreError::InvalidDirection(s) if s == "UP"
        ));
    }

    #[test]
    fn test_order_wire() {
        let order = Order::new(FieldReference::new("Age").unwrap(), Direction::Descending);
        assert_eq!(
            order.to_wire(),
            json!({"field": {"fieldPath": "Age"}, "direction": "DESCENDING"})
        );
    }

    #[test]
    fn test_cursor_wire() {
        let cursor = Cursor::new(Value::Integer(23), true);
        assert_eq!(
            cursor.to_wire(),
            json!({"values": [{"integerValue": 23}], "before": true})
        );
    }

    #[test]
    fn test_operator_table_complete_and_distinct() {
        let symbols = [
            "<", "<=", ">", ">=", "==", "!=", "array_contains", "in",
            "array_contains_any", "not_in",
        ];
        let mut wire_names = HashSet::new();
        for symbol in symbols {
            let op = FieldFilterOperator::from_symbol(symbol).unwrap();
            assert!(wire_names.insert(op.as_str()), "{} maps to duplicate", symbol);
        }
        assert_eq!(wire_names.len(), 10);
    }

    #[test]
    fn test_unknown_operator_lists_all_choices() {
        let err = FieldFilterOperator::from_symbol("=").unwrap_err();
        let FirestoreError::UnknownOperator { op, choices } = &err else {
            panic!("expected UnknownOperator, got {:?}", err);
        };
        assert_eq!(op, "=");
        for symbol in ["<", "<=", ">", ">=", "==", "!=", "array_contains", "in",
            "array_contains_any", "not_in"]
        {
            assert!(choices.contains(symbol), "choices should list {}", symbol);
        }
    }

    #[test]
    fn test_field_filter_wire() {
        let filter = Filter::Field(FieldFilter::new(
            FieldReference::new("Age").unwrap(),
            FieldFilterOperator::GreaterThanOrEqual,
            Value::Integer(18),
        ));
        assert_eq!(
            filter.to_wire(),
            json!({"fieldFilter": {
                "field": {"fieldPath": "Age"},
                "op": "GREATER_THAN_OR_EQUAL",
                "value": {"integerValue": 18},
            }})
        );
    }

    #[test]
    fn test_unary_filter_wire() {
        let filter = Filter::Unary(UnaryFilter::new(
            FieldReference::new("Score").unwrap(),
            UnaryFilterOperator::IsNan,
        ));
        assert_eq!(
            filter.to_wire(),
            json!({"unaryFilter": {"field": {"fieldPath": "Score"}, "op": "IS_NAN"}})
        );
    }

    #[test]
    fn test_primitive_structural_equality() {
        assert_eq!(
            FieldReference::new("a").unwrap(),
            FieldReference::new("a").unwrap()
        );
        assert_ne!(
            Cursor::new(Value::Integer(1), true),
            Cursor::new(Value::Integer(1), false)
        );
    }
}
