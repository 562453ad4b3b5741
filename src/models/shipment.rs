use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::query_log::Field;
use crate::screen::entity::EntityForm;
use crate::screen::form;

pg_enum! {
    pub enum ShippingStatus as "shipping_status" {
        #[default]
        Processing => "processing",
        Shipped => "shipped",
        Delivered => "delivered",
        Delayed => "delayed",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub shipping_id: Uuid,
    pub order_id: Option<Uuid>,
    pub shipping_address: String,
    pub courier_service: String,
    pub tracking_number: Option<String>,
    pub estimated_delivery_date: Option<NaiveDate>,
    pub status: ShippingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentForm {
    pub order_id: String,
    pub shipping_address: String,
    pub courier_service: String,
    pub tracking_number: String,
    pub estimated_delivery_date: String,
    pub status: ShippingStatus,
}

impl EntityForm for ShipmentForm {
    fn to_fields(&self) -> Result<Vec<Field>, ValidationError> {
        Ok(vec![
            Field::new("order_id", form::optional_uuid("Order", &self.order_id)?),
            Field::new(
                "shipping_address",
                form::required("Shipping address", &self.shipping_address)?,
            ),
            Field::new(
                "courier_service",
                form::required("Courier service", &self.courier_service)?,
            ),
            Field::new("tracking_number", form::optional(&self.tracking_number)),
            Field::new(
                "estimated_delivery_date",
                form::optional_date("Estimated delivery", &self.estimated_delivery_date)?,
            ),
            Field::new("status", self.status),
        ])
    }
}

impl From<&Shipment> for ShipmentForm {
    fn from(shipment: &Shipment) -> Self {
        ShipmentForm {
            order_id: shipment
                .order_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            shipping_address: shipment.shipping_address.clone(),
            courier_service: shipment.courier_service.clone(),
            tracking_number: shipment.tracking_number.clone().unwrap_or_default(),
            estimated_delivery_date: shipment
                .estimated_delivery_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            status: shipment.status,
        }
    }
}
