use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

/// A single value captured for a logged operation.
///
/// Values are kept typed so the executed statement can bind them as
/// parameters while the log renders them as literals for display.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Bool(bool),
    Uuid(Uuid),
    Date(NaiveDate),
    /// A PostgreSQL enum label, bound as text and cast to `type_name`
    Enum {
        type_name: &'static str,
        value: &'static str,
    },
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Bool(true) => write!(f, "TRUE"),
            FieldValue::Bool(false) => write!(f, "FALSE"),
            FieldValue::Uuid(u) => write!(f, "'{}'", u),
            FieldValue::Date(d) => write!(f, "'{}'", d),
            FieldValue::Enum { value, .. } => write!(f, "'{}'", value),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// A named column together with the value written to it
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub column: &'static str,
    pub value: FieldValue,
}

impl Field {
    pub fn new(column: &'static str, value: impl Into<FieldValue>) -> Self {
        Field {
            column,
            value: value.into(),
        }
    }
}

/// Comparison used by a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lte,
    /// Case-insensitive substring match
    Contains,
}

impl Comparison {
    pub fn operator(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lte => "<=",
            Comparison::Contains => "ILIKE",
        }
    }
}

/// A bound filter condition: `column <op> value`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: &'static str,
    pub comparison: Comparison,
    pub value: FieldValue,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.comparison, &self.value) {
            (Comparison::Contains, FieldValue::Text(s)) => write!(
                f,
                "{} ILIKE '%{}%'",
                self.column,
                s.replace('\'', "''")
            ),
            (comparison, value) => write!(f, "{} {} {}", self.column, comparison.operator(), value),
        }
    }
}

/// Structured description of an operation a screen is about to issue.
///
/// Records are never executed; `render` produces display text on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationRecord {
    Note(String),
    Select {
        statement: &'static str,
    },
    Insert {
        table: &'static str,
        fields: Vec<Field>,
    },
    Update {
        table: &'static str,
        fields: Vec<Field>,
        key: Field,
    },
    Delete {
        table: &'static str,
        key: Field,
    },
    Filter {
        statement: &'static str,
        template: &'static str,
        conditions: Vec<Condition>,
    },
    RawSql(String),
}

impl OperationRecord {
    /// Render the record as human-readable, SQL-like text
    pub fn render(&self) -> String {
        match self {
            OperationRecord::Note(text) | OperationRecord::RawSql(text) => text.clone(),
            OperationRecord::Select { statement } => statement.to_string(),
            OperationRecord::Insert { table, fields } => {
                let columns: Vec<&str> = fields.iter().map(|f| f.column).collect();
                let values: Vec<String> = fields.iter().map(|f| f.value.to_string()).collect();
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    columns.join(", "),
                    values.join(", ")
                )
            }
            OperationRecord::Update { table, fields, key } => {
                let assignments: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{} = {}", f.column, f.value))
                    .collect();
                format!(
                    "UPDATE {} SET {} WHERE {} = {}",
                    table,
                    assignments.join(", "),
                    key.column,
                    key.value
                )
            }
            OperationRecord::Delete { table, key } => {
                format!("DELETE FROM {} WHERE {} = {}", table, key.column, key.value)
            }
            OperationRecord::Filter {
                statement,
                conditions,
                ..
            } => {
                if conditions.is_empty() {
                    return statement.to_string();
                }
                let predicates: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
                format!(
                    "SELECT * FROM ({}) AS filtered WHERE {}",
                    statement,
                    predicates.join(" AND ")
                )
            }
        }
    }

    /// Whether the rendered text is a statement worth pretty-printing
    pub fn is_statement(&self) -> bool {
        !matches!(self, OperationRecord::Note(_))
    }
}

impl From<&str> for OperationRecord {
    fn from(text: &str) -> Self {
        OperationRecord::Note(text.to_string())
    }
}

impl From<String> for OperationRecord {
    fn from(text: String) -> Self {
        OperationRecord::Note(text)
    }
}

impl fmt::Display for OperationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
