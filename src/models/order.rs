use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::query_log::Field;
use crate::screen::entity::EntityForm;
use crate::screen::form;

pg_enum! {
    pub enum OrderStatus as "order_status" {
        #[default]
        Pending => "pending",
        Processing => "processing",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    /// Joined from `customers` for display; absent when the row is read bare
    #[sqlx(default)]
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderForm {
    pub customer_id: String,
    pub status: OrderStatus,
    pub total_amount: String,
}

impl EntityForm for OrderForm {
    fn to_fields(&self) -> Result<Vec<Field>, ValidationError> {
        Ok(vec![
            Field::new("customer_id", form::optional_uuid("Customer", &self.customer_id)?),
            Field::new("status", self.status),
            Field::new("total_amount", form::decimal("Total amount", &self.total_amount)?),
        ])
    }
}

impl From<&Order> for OrderForm {
    fn from(order: &Order) -> Self {
        OrderForm {
            customer_id: order
                .customer_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            status: order.status,
            total_amount: order.total_amount.to_string(),
        }
    }
}

/// Storefront order header, linked to the `orders` row it created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOrder {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_address: String,
    pub shipping_required: bool,
    pub created_at: DateTime<Utc>,
}
