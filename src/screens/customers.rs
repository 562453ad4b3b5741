use uuid::Uuid;

use crate::models::{Customer, CustomerForm, CustomerStatus, CustomerType};
use crate::query_log::Comparison;
use crate::screen::{any_contains, ConditionSpec, Entity, FilterTemplate, ParamKind};
use crate::session::Role;

static TEMPLATES: &[FilterTemplate] = &[
    FilterTemplate {
        name: "by_type",
        label: "Customer type",
        conditions: &[ConditionSpec {
            column: "type",
            comparison: Comparison::Eq,
            param: ParamKind::Enum {
                type_name: CustomerType::TYPE_NAME,
                labels: CustomerType::LABELS,
            },
            label: "Type",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "by_status",
        label: "Status",
        conditions: &[ConditionSpec {
            column: "status",
            comparison: Comparison::Eq,
            param: ParamKind::Enum {
                type_name: CustomerStatus::TYPE_NAME,
                labels: CustomerStatus::LABELS,
            },
            label: "Status",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "name_contains",
        label: "Name contains",
        conditions: &[ConditionSpec {
            column: "customer_name",
            comparison: Comparison::Contains,
            param: ParamKind::Text,
            label: "Text",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "min_spent",
        label: "Spent at least",
        conditions: &[ConditionSpec {
            column: "total_spent",
            comparison: Comparison::Gte,
            param: ParamKind::Decimal,
            label: "Amount",
        }],
        min_role: Role::Manager,
    },
    FilterTemplate {
        name: "inactive_since",
        label: "No order since",
        conditions: &[ConditionSpec {
            column: "last_order",
            comparison: Comparison::Lte,
            param: ParamKind::Date,
            label: "Date",
        }],
        min_role: Role::Staff,
    },
];

impl Entity for Customer {
    type Key = Uuid;
    type Form = CustomerForm;

    const SCREEN: &'static str = "customers";
    const TABLE: &'static str = "customers";
    const KEY_COLUMN: &'static str = "customer_id";
    const LABEL: &'static str = "Customer";
    const PLURAL: &'static str = "Customers";
    const SELECT_SQL: &'static str = "SELECT * FROM customers ORDER BY customer_name";
    const SQL_FILTER: bool = true;

    fn key(&self) -> Uuid {
        self.customer_id
    }

    fn to_form(&self) -> CustomerForm {
        CustomerForm::from(self)
    }

    fn matches(&self, needle: &str) -> bool {
        any_contains(
            needle,
            [
                self.customer_name.as_str(),
                self.contact.as_str(),
                self.customer_type.as_str(),
            ],
        )
    }

    fn filters() -> &'static [FilterTemplate] {
        TEMPLATES
    }
}
