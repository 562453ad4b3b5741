use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::query_log::Field;
use crate::screen::entity::EntityForm;
use crate::screen::form;

pg_enum! {
    pub enum ProductStatus as "product_status" {
        #[default]
        Active => "active",
        Discontinued => "discontinued",
        OutOfStock => "out_of_stock",
        LowStock => "low_stock",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub sku: String,
    pub product_name: String,
    pub category: String,
    pub price: Decimal,
    pub stock: i32,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    pub sku: String,
    pub product_name: String,
    pub category: String,
    pub price: String,
    pub stock: String,
    pub status: ProductStatus,
}

impl EntityForm for ProductForm {
    fn to_fields(&self) -> Result<Vec<Field>, ValidationError> {
        Ok(vec![
            Field::new("sku", form::required("SKU", &self.sku)?),
            Field::new("product_name", form::required("Product name", &self.product_name)?),
            Field::new("category", form::required("Category", &self.category)?),
            Field::new("price", form::decimal("Price", &self.price)?),
            Field::new("stock", form::integer("Stock", &self.stock)?),
            Field::new("status", self.status),
        ])
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        ProductForm {
            sku: product.sku.clone(),
            product_name: product.product_name.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
            status: product.status,
        }
    }
}
