use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::query_log::Field;
use crate::screen::entity::EntityForm;
use crate::screen::form;

pg_enum! {
    pub enum CustomerType as "customer_type" {
        #[default]
        Retail => "retail",
        Wholesale => "wholesale",
        Corporate => "corporate",
    }
}

pg_enum! {
    pub enum CustomerStatus as "customer_status" {
        #[default]
        Active => "active",
        Inactive => "inactive",
        Blocked => "blocked",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub contact: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub customer_type: CustomerType,
    pub status: CustomerStatus,
    pub total_spent: Option<Decimal>,
    pub last_order: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerForm {
    pub customer_name: String,
    pub contact: String,
    pub customer_type: CustomerType,
    pub status: CustomerStatus,
    pub total_spent: String,
    pub last_order: String,
}

impl EntityForm for CustomerForm {
    fn to_fields(&self) -> Result<Vec<Field>, ValidationError> {
        Ok(vec![
            Field::new("customer_name", form::required("Name", &self.customer_name)?),
            Field::new("contact", form::required("Contact", &self.contact)?),
            Field::new("type", self.customer_type),
            Field::new("status", self.status),
            Field::new(
                "total_spent",
                form::optional_decimal("Total spent", &self.total_spent)?,
            ),
            Field::new("last_order", form::optional_date("Last order", &self.last_order)?),
        ])
    }
}

impl From<&Customer> for CustomerForm {
    fn from(customer: &Customer) -> Self {
        CustomerForm {
            customer_name: customer.customer_name.clone(),
            contact: customer.contact.clone(),
            customer_type: customer.customer_type,
            status: customer.status,
            total_spent: customer
                .total_spent
                .map(|d| d.to_string())
                .unwrap_or_default(),
            last_order: customer
                .last_order
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}
