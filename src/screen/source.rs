use std::future::Future;
use uuid::Uuid;

use super::entity::Entity;
use crate::error::ServiceError;
use crate::models::{AccountSettings, CustomerOrder, Order};
use crate::query_log::{Condition, Field};

/// The hosted data collaborator as seen by one screen
pub trait TableSource<E: Entity>: Send + Sync {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<E>, ServiceError>> + Send;

    /// Insert one row, returning the row(s) as stored
    fn insert(&self, fields: &[Field]) -> impl Future<Output = Result<Vec<E>, ServiceError>> + Send;

    fn update(
        &self,
        key: &E::Key,
        fields: &[Field],
    ) -> impl Future<Output = Result<E, ServiceError>> + Send;

    fn delete(&self, key: &E::Key) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Fetch-all narrowed by bound conditions joined with AND
    fn fetch_filtered(
        &self,
        conditions: &[Condition],
    ) -> impl Future<Output = Result<Vec<E>, ServiceError>> + Send;

    /// Run free-text SQL without the ability to write
    fn query_readonly(&self, sql: &str) -> impl Future<Output = Result<Vec<E>, ServiceError>> + Send;
}

/// Writes to the acting principal's own account row
pub trait AccountSource: Send + Sync {
    fn update_account(
        &self,
        admin_id: Uuid,
        account: &AccountSettings,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

/// Storefront order placement
pub trait OrderPlacement: Send + Sync {
    /// Insert the order, then the customer-order row pointing at it, atomically
    fn place_order(
        &self,
        order: &[Field],
        customer_order: &[Field],
    ) -> impl Future<Output = Result<(Order, CustomerOrder), ServiceError>> + Send;
}
