use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::query_log::Field;
use crate::screen::entity::EntityForm;
use crate::screen::form;

pg_enum! {
    pub enum SupplierStatus as "supplier_status" {
        #[default]
        Active => "active",
        Inactive => "inactive",
        PendingReview => "pending_review",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub contact: String,
    pub address: String,
    pub status: SupplierStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierForm {
    pub supplier_name: String,
    pub contact: String,
    pub address: String,
    pub status: SupplierStatus,
}

impl EntityForm for SupplierForm {
    fn to_fields(&self) -> Result<Vec<Field>, ValidationError> {
        Ok(vec![
            Field::new("supplier_name", form::required("Supplier name", &self.supplier_name)?),
            Field::new("contact", form::required("Contact", &self.contact)?),
            Field::new("address", form::required("Address", &self.address)?),
            Field::new("status", self.status),
        ])
    }
}

impl From<&Supplier> for SupplierForm {
    fn from(supplier: &Supplier) -> Self {
        SupplierForm {
            supplier_name: supplier.supplier_name.clone(),
            contact: supplier.contact.clone(),
            address: supplier.address.clone(),
            status: supplier.status,
        }
    }
}
