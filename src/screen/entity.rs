use sqlx::postgres::PgRow;
use sqlx::FromRow;
use std::fmt;

use super::filter::FilterTemplate;
use crate::error::ValidationError;
use crate::query_log::{Field, FieldValue};
use crate::session::Session;

/// A row type one screen manages.
///
/// The associated constants describe where rows live in the hosted schema
/// and how the screen labels its operations in the query log.
pub trait Entity: Clone + Send + Sync + Unpin + for<'r> FromRow<'r, PgRow> + 'static {
    type Key: Clone + PartialEq + fmt::Display + fmt::Debug + Into<FieldValue> + Send + Sync + 'static;
    type Form: EntityForm + Default + Clone + fmt::Debug + Send + Sync + 'static;

    /// Screen identifier used by saved filters
    const SCREEN: &'static str;
    const TABLE: &'static str;
    const KEY_COLUMN: &'static str;
    /// Singular label, as in "Add Product"
    const LABEL: &'static str;
    /// Plural label, as in "Fetch Products"
    const PLURAL: &'static str;
    /// Statement behind the fetch-all read; filters wrap it
    const SELECT_SQL: &'static str;
    /// Shape of rows returned from a write, selected from the `written` CTE
    const WRITE_PROJECTION: &'static str = "SELECT * FROM written";
    /// Whether the screen offers free-text SQL filters
    const SQL_FILTER: bool = false;

    fn key(&self) -> Self::Key;

    fn to_form(&self) -> Self::Form;

    /// Case-insensitive match used by the search box; `needle` is lowercase
    fn matches(&self, needle: &str) -> bool;

    fn filters() -> &'static [FilterTemplate];

    /// Add columns the acting principal owns to an insert
    fn stamp(_fields: &mut Vec<Field>, _session: &Session) {}
}

/// Raw form input for one entity
pub trait EntityForm {
    /// Validate and coerce into the columns to write
    fn to_fields(&self) -> Result<Vec<Field>, ValidationError>;
}

/// Lowercase containment check across several columns
pub fn any_contains<'a>(needle: &str, haystacks: impl IntoIterator<Item = &'a str>) -> bool {
    haystacks
        .into_iter()
        .any(|h| h.to_lowercase().contains(needle))
}
