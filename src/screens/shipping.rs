use uuid::Uuid;

use crate::models::{Shipment, ShipmentForm, ShippingStatus};
use crate::query_log::Comparison;
use crate::screen::{any_contains, ConditionSpec, Entity, FilterTemplate, ParamKind};
use crate::session::Role;

static TEMPLATES: &[FilterTemplate] = &[
    FilterTemplate {
        name: "by_status",
        label: "Status",
        conditions: &[ConditionSpec {
            column: "status",
            comparison: Comparison::Eq,
            param: ParamKind::Enum {
                type_name: ShippingStatus::TYPE_NAME,
                labels: ShippingStatus::LABELS,
            },
            label: "Status",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "by_courier",
        label: "Courier",
        conditions: &[ConditionSpec {
            column: "courier_service",
            comparison: Comparison::Contains,
            param: ParamKind::Text,
            label: "Courier",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "due_by",
        label: "Due by",
        conditions: &[ConditionSpec {
            column: "estimated_delivery_date",
            comparison: Comparison::Lte,
            param: ParamKind::Date,
            label: "Date",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "by_order",
        label: "Order",
        conditions: &[ConditionSpec {
            column: "order_id",
            comparison: Comparison::Eq,
            param: ParamKind::Uuid,
            label: "Order",
        }],
        min_role: Role::Staff,
    },
];

impl Entity for Shipment {
    type Key = Uuid;
    type Form = ShipmentForm;

    const SCREEN: &'static str = "shipping";
    const TABLE: &'static str = "shipping";
    const KEY_COLUMN: &'static str = "shipping_id";
    const LABEL: &'static str = "Shipment";
    const PLURAL: &'static str = "Shipments";
    const SELECT_SQL: &'static str = "SELECT * FROM shipping ORDER BY created_at DESC";

    fn key(&self) -> Uuid {
        self.shipping_id
    }

    fn to_form(&self) -> ShipmentForm {
        ShipmentForm::from(self)
    }

    fn matches(&self, needle: &str) -> bool {
        any_contains(
            needle,
            [
                self.shipping_address.as_str(),
                self.courier_service.as_str(),
                self.tracking_number.as_deref().unwrap_or(""),
            ],
        )
    }

    fn filters() -> &'static [FilterTemplate] {
        TEMPLATES
    }
}
