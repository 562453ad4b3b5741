use crate::models::{Product, ProductForm, ProductStatus};
use crate::query_log::Comparison;
use crate::screen::{any_contains, ConditionSpec, Entity, FilterTemplate, ParamKind};
use crate::session::Role;

const STATUS: ParamKind = ParamKind::Enum {
    type_name: ProductStatus::TYPE_NAME,
    labels: ProductStatus::LABELS,
};

static TEMPLATES: &[FilterTemplate] = &[
    FilterTemplate {
        name: "low_stock",
        label: "Low stock",
        conditions: &[ConditionSpec {
            column: "stock",
            comparison: Comparison::Lte,
            param: ParamKind::Integer,
            label: "Threshold",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "by_category",
        label: "Category",
        conditions: &[ConditionSpec {
            column: "category",
            comparison: Comparison::Eq,
            param: ParamKind::Text,
            label: "Category",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "by_status",
        label: "Status",
        conditions: &[ConditionSpec {
            column: "status",
            comparison: Comparison::Eq,
            param: STATUS,
            label: "Status",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "name_contains",
        label: "Name contains",
        conditions: &[ConditionSpec {
            column: "product_name",
            comparison: Comparison::Contains,
            param: ParamKind::Text,
            label: "Text",
        }],
        min_role: Role::Staff,
    },
    FilterTemplate {
        name: "price_range",
        label: "Price range",
        conditions: &[
            ConditionSpec {
                column: "price",
                comparison: Comparison::Gte,
                param: ParamKind::Decimal,
                label: "Minimum price",
            },
            ConditionSpec {
                column: "price",
                comparison: Comparison::Lte,
                param: ParamKind::Decimal,
                label: "Maximum price",
            },
        ],
        min_role: Role::Manager,
    },
    // Used by the order desk to list what can be sold
    FilterTemplate {
        name: "available",
        label: "Available",
        conditions: &[
            ConditionSpec {
                column: "status",
                comparison: Comparison::Eq,
                param: STATUS,
                label: "Status",
            },
            ConditionSpec {
                column: "stock",
                comparison: Comparison::Gt,
                param: ParamKind::Integer,
                label: "Minimum stock",
            },
        ],
        min_role: Role::Staff,
    },
];

impl Entity for Product {
    type Key = String;
    type Form = ProductForm;

    const SCREEN: &'static str = "inventory";
    const TABLE: &'static str = "products";
    const KEY_COLUMN: &'static str = "sku";
    const LABEL: &'static str = "Product";
    const PLURAL: &'static str = "Products";
    const SELECT_SQL: &'static str = "SELECT * FROM products ORDER BY product_name";
    const SQL_FILTER: bool = true;

    fn key(&self) -> String {
        self.sku.clone()
    }

    fn to_form(&self) -> ProductForm {
        ProductForm::from(self)
    }

    fn matches(&self, needle: &str) -> bool {
        any_contains(
            needle,
            [
                self.product_name.as_str(),
                self.sku.as_str(),
                self.category.as_str(),
            ],
        )
    }

    fn filters() -> &'static [FilterTemplate] {
        TEMPLATES
    }
}
