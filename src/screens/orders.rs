use uuid::Uuid;

use crate::models::{Order, OrderForm, OrderStatus};
use crate::query_log::{Comparison, Field};
use crate::screen::{any_contains, ConditionSpec, Entity, FilterTemplate, ParamKind};
use crate::session::{Role, Session};

static TEMPLATES: &[FilterTemplate] = &[
    FilterTemplate {
        name: "by_status",
        label: "Status",
        conditions: &[ConditionSpec {
            column: "status",
            comparison: Comparison::Eq,
            param: ParamKind::Enum {
                type_name: OrderStatus::TYPE_NAME,
                labels: OrderStatus::LABELS,
            },
            label: "Status",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "by_customer",
        label: "Customer",
        conditions: &[ConditionSpec {
            column: "customer_id",
            comparison: Comparison::Eq,
            param: ParamKind::Uuid,
            label: "Customer",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "customer_contains",
        label: "Customer name contains",
        conditions: &[ConditionSpec {
            column: "customer_name",
            comparison: Comparison::Contains,
            param: ParamKind::Text,
            label: "Text",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "min_total",
        label: "Total at least",
        conditions: &[ConditionSpec {
            column: "total_amount",
            comparison: Comparison::Gte,
            param: ParamKind::Decimal,
            label: "Amount",
        }],
        min_role: Role::Manager,
    },
    FilterTemplate {
        name: "placed_since",
        label: "Placed since",
        conditions: &[ConditionSpec {
            column: "order_date",
            comparison: Comparison::Gte,
            param: ParamKind::Date,
            label: "Date",
        }],
        min_role: Role::Staff,
    },
];

impl Entity for Order {
    type Key = Uuid;
    type Form = OrderForm;

    const SCREEN: &'static str = "orders";
    const TABLE: &'static str = "orders";
    const KEY_COLUMN: &'static str = "order_id";
    const LABEL: &'static str = "Order";
    const PLURAL: &'static str = "Orders";
    const SELECT_SQL: &'static str = "SELECT orders.*, customers.customer_name FROM orders \
         LEFT JOIN customers ON customers.customer_id = orders.customer_id \
         ORDER BY orders.order_date DESC";
    const WRITE_PROJECTION: &'static str = "SELECT written.*, customers.customer_name FROM written \
         LEFT JOIN customers ON customers.customer_id = written.customer_id";
    const SQL_FILTER: bool = true;

    fn key(&self) -> Uuid {
        self.order_id
    }

    fn to_form(&self) -> OrderForm {
        OrderForm::from(self)
    }

    fn matches(&self, needle: &str) -> bool {
        let id = self.order_id.to_string();
        any_contains(
            needle,
            [
                id.as_str(),
                self.customer_name.as_deref().unwrap_or(""),
                self.status.as_str(),
            ],
        )
    }

    fn filters() -> &'static [FilterTemplate] {
        TEMPLATES
    }

    fn stamp(fields: &mut Vec<Field>, session: &Session) {
        fields.push(Field::new("admin_id", session.admin_id));
    }
}
