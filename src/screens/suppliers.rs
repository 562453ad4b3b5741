use uuid::Uuid;

use crate::models::{Supplier, SupplierForm, SupplierStatus};
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
                type_name: SupplierStatus::TYPE_NAME,
                labels: SupplierStatus::LABELS,
            },
            label: "Status",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "name_contains",
        label: "Name contains",
        conditions: &[ConditionSpec {
            column: "supplier_name",
            comparison: Comparison::Contains,
            param: ParamKind::Text,
            label: "Text",
        }],
        min_role: Role::Staff,
    },
];

impl Entity for Supplier {
    type Key = Uuid;
    type Form = SupplierForm;

    const SCREEN: &'static str = "suppliers";
    const TABLE: &'static str = "suppliers";
    const KEY_COLUMN: &'static str = "supplier_id";
    const LABEL: &'static str = "Supplier";
    const PLURAL: &'static str = "Suppliers";
    const SELECT_SQL: &'static str = "SELECT * FROM suppliers ORDER BY supplier_name";

    fn key(&self) -> Uuid {
        self.supplier_id
    }

    fn to_form(&self) -> SupplierForm {
        SupplierForm::from(self)
    }

    fn matches(&self, needle: &str) -> bool {
        any_contains(
            needle,
            [
                self.supplier_name.as_str(),
                self.contact.as_str(),
                self.address.as_str(),
            ],
        )
    }

    fn filters() -> &'static [FilterTemplate] {
        TEMPLATES
    }
}
