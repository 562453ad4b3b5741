use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::query_log::{Comparison, Condition, FieldValue};
use crate::session::Role;

/// Client-side guard for free-text filters: trimmed, lowercased text must start with `select`
pub fn passes_select_guard(text: &str) -> bool {
    text.trim().to_lowercase().starts_with("select")
}

/// Type a template argument is coerced to before binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    Integer,
    Decimal,
    Date,
    Uuid,
    Enum {
        type_name: &'static str,
        labels: &'static [&'static str],
    },
}

/// One `column <op> $n` predicate of a template
#[derive(Debug, Clone, Copy)]
pub struct ConditionSpec {
    pub column: &'static str,
    pub comparison: Comparison,
    pub param: ParamKind,
    /// Argument name shown in validation messages
    pub label: &'static str,
}

/// A named, parameterised filter; conditions are joined with AND
#[derive(Debug, Clone, Copy)]
pub struct FilterTemplate {
    pub name: &'static str,
    pub label: &'static str,
    pub conditions: &'static [ConditionSpec],
    pub min_role: Role,
}

impl FilterTemplate {
    /// Coerce one argument per condition, in order
    pub fn bind(&self, args: &[String]) -> Result<Vec<Condition>, ValidationError> {
        if args.len() != self.conditions.len() {
            return Err(ValidationError::Rule(format!(
                "{} expects {} argument(s), got {}",
                self.label,
                self.conditions.len(),
                args.len()
            )));
        }

        self.conditions
            .iter()
            .zip(args)
            .map(|(spec, arg)| {
                Ok(Condition {
                    column: spec.column,
                    comparison: spec.comparison,
                    value: coerce(spec, arg)?,
                })
            })
            .collect()
    }
}

fn coerce(spec: &ConditionSpec, arg: &str) -> Result<FieldValue, ValidationError> {
    let raw = arg.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing(spec.label));
    }

    let malformed = |expected| ValidationError::Malformed {
        field: spec.label,
        expected,
    };

    match spec.param {
        ParamKind::Text => Ok(FieldValue::Text(raw.to_string())),
        ParamKind::Integer => raw
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| malformed("a whole number")),
        ParamKind::Decimal => Decimal::from_str(raw)
            .map(FieldValue::Decimal)
            .map_err(|_| malformed("a number")),
        ParamKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(FieldValue::Date)
            .map_err(|_| malformed("a date (YYYY-MM-DD)")),
        ParamKind::Uuid => Uuid::parse_str(raw)
            .map(FieldValue::Uuid)
            .map_err(|_| malformed("a valid identifier")),
        ParamKind::Enum { type_name, labels } => {
            let wanted = raw.to_lowercase();
            labels
                .iter()
                .copied()
                .find(|label| *label == wanted)
                .map(|label| FieldValue::Enum {
                    type_name,
                    value: label,
                })
                .ok_or_else(|| {
                    ValidationError::Rule(format!(
                        "{} must be one of: {}",
                        spec.label,
                        labels.join(", ")
                    ))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOW_STOCK: FilterTemplate = FilterTemplate {
        name: "low_stock",
        label: "Low stock",
        conditions: &[
            ConditionSpec {
                column: "stock",
                comparison: Comparison::Lte,
                param: ParamKind::Integer,
                label: "Threshold",
            },
            ConditionSpec {
                column: "status",
                comparison: Comparison::Eq,
                param: ParamKind::Enum {
                    type_name: "product_status",
                    labels: &["active", "discontinued"],
                },
                label: "Status",
            },
        ],
        min_role: Role::Staff,
    };

    #[test]
    fn guard_accepts_select_in_any_case() {
        assert!(passes_select_guard("  SeLeCt * from products"));
        assert!(passes_select_guard("select"));
        assert!(!passes_select_guard("DROP TABLE customers"));
        assert!(!passes_select_guard("with x as (select 1) select * from x"));
        assert!(!passes_select_guard(""));
    }

    #[test]
    fn binds_arguments_in_order() {
        let conditions = LOW_STOCK
            .bind(&["10".to_string(), "Active".to_string()])
            .unwrap();
        assert_eq!(conditions[0].value, FieldValue::Integer(10));
        assert_eq!(
            conditions[1].value,
            FieldValue::Enum {
                type_name: "product_status",
                value: "active"
            }
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(LOW_STOCK.bind(&["10".to_string()]).is_err());
        assert!(LOW_STOCK
            .bind(&["ten".to_string(), "active".to_string()])
            .is_err());
        assert!(LOW_STOCK
            .bind(&["10".to_string(), "archived".to_string()])
            .is_err());
        assert_eq!(
            LOW_STOCK.bind(&[" ".to_string(), "active".to_string()]),
            Err(ValidationError::Missing("Threshold"))
        );
    }
}
