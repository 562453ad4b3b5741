//! In-memory data collaborator and fixtures for screen tests.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

use super::entity::Entity;
use super::source::{OrderPlacement, TableSource};
use crate::error::ServiceError;
use crate::models::{CustomerOrder, Order, OrderStatus, Product, ProductStatus};
use crate::query_log::{Condition, Field, FieldValue, QueryLogStore};
use crate::session::{Role, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    FetchAll,
    Insert,
    Update,
    Delete,
    FetchFiltered,
    QueryReadonly,
    PlaceOrder,
}

/// One call received by the source
#[derive(Debug, Clone)]
pub struct Call {
    pub op: Op,
    /// Length of the observed query log when the call arrived
    pub log_len: usize,
    pub detail: String,
}

/// Holds one call open until released
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    released: Notify,
}

impl Gate {
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

type Builder<E> = fn(Option<&E>, &[Field]) -> E;

pub struct MemorySource<E: Entity> {
    rows: Mutex<Vec<E>>,
    filtered: Mutex<Option<Vec<E>>>,
    build: Option<Builder<E>>,
    log: Option<QueryLogStore>,
    calls: Mutex<Vec<Call>>,
    fail_next: Mutex<Option<String>>,
    gate: Mutex<Option<Arc<Gate>>>,
}

impl<E: Entity> MemorySource<E> {
    pub fn new(rows: Vec<E>) -> Self {
        MemorySource {
            rows: Mutex::new(rows),
            filtered: Mutex::new(None),
            build: None,
            log: None,
            calls: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            gate: Mutex::new(None),
        }
    }

    pub fn with_builder(mut self, build: Builder<E>) -> Self {
        self.build = Some(build);
        self
    }

    /// Record the length of `log` with every call
    pub fn observe(mut self, log: &QueryLogStore) -> Self {
        self.log = Some(log.clone());
        self
    }

    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    /// Rows returned by the next filtered or read-only query
    pub fn respond_filtered(&self, rows: Vec<E>) {
        *self.filtered.lock().unwrap() = Some(rows);
    }

    /// Hold the next call open until the returned gate is released
    pub fn hold_next(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls().iter().filter(|c| c.op == op).count()
    }

    async fn enter(&self, op: Op, detail: String) -> Result<(), ServiceError> {
        let log_len = self.log.as_ref().map(|l| l.len()).unwrap_or(0);
        self.calls.lock().unwrap().push(Call {
            op,
            log_len,
            detail,
        });
        let failure = self.fail_next.lock().unwrap().take();

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.released.notified().await;
        }

        match failure {
            Some(message) => Err(ServiceError::Rejected(message)),
            None => Ok(()),
        }
    }

    fn filtered_or_all(&self) -> Vec<E> {
        let primed = self.filtered.lock().unwrap().take();
        primed.unwrap_or_else(|| self.rows.lock().unwrap().clone())
    }
}

impl<E: Entity> TableSource<E> for MemorySource<E> {
    async fn fetch_all(&self) -> Result<Vec<E>, ServiceError> {
        self.enter(Op::FetchAll, String::new()).await?;
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn insert(&self, fields: &[Field]) -> Result<Vec<E>, ServiceError> {
        self.enter(Op::Insert, describe(fields)).await?;
        let build = self
            .build
            .ok_or_else(|| ServiceError::Rejected("insert not supported".to_string()))?;
        let row = build(None, fields);
        self.rows.lock().unwrap().insert(0, row.clone());
        Ok(vec![row])
    }

    async fn update(&self, key: &E::Key, fields: &[Field]) -> Result<E, ServiceError> {
        self.enter(Op::Update, format!("{} {}", key, describe(fields)))
            .await?;
        let build = self
            .build
            .ok_or_else(|| ServiceError::Rejected("update not supported".to_string()))?;
        let mut rows = self.rows.lock().unwrap();
        let slot = rows
            .iter_mut()
            .find(|r| r.key() == *key)
            .ok_or_else(|| ServiceError::NotFound(key.to_string()))?;
        let updated = build(Some(&*slot), fields);
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, key: &E::Key) -> Result<(), ServiceError> {
        self.enter(Op::Delete, key.to_string()).await?;
        self.rows.lock().unwrap().retain(|r| r.key() != *key);
        Ok(())
    }

    async fn fetch_filtered(&self, conditions: &[Condition]) -> Result<Vec<E>, ServiceError> {
        let detail: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
        self.enter(Op::FetchFiltered, detail.join(" AND ")).await?;
        Ok(self.filtered_or_all())
    }

    async fn query_readonly(&self, sql: &str) -> Result<Vec<E>, ServiceError> {
        self.enter(Op::QueryReadonly, sql.to_string()).await?;
        Ok(self.filtered_or_all())
    }
}

impl OrderPlacement for MemorySource<Product> {
    async fn place_order(
        &self,
        order: &[Field],
        customer_order: &[Field],
    ) -> Result<(Order, CustomerOrder), ServiceError> {
        self.enter(
            Op::PlaceOrder,
            format!("{} | {}", describe(order), describe(customer_order)),
        )
        .await?;

        let now = Utc::now();
        let placed = Order {
            order_id: Uuid::new_v4(),
            customer_id: None,
            admin_id: uuid_field(order, "admin_id"),
            order_date: now,
            status: OrderStatus::Pending,
            total_amount: match value(order, "total_amount") {
                Some(FieldValue::Decimal(d)) => *d,
                _ => Decimal::ZERO,
            },
            customer_name: None,
            created_at: now,
            updated_at: now,
        };
        let header = CustomerOrder {
            id: Uuid::new_v4(),
            order_id: Some(placed.order_id),
            customer_name: text_field(customer_order, "customer_name"),
            customer_email: text_field(customer_order, "customer_email"),
            customer_address: text_field(customer_order, "customer_address"),
            shipping_required: matches!(
                value(customer_order, "shipping_required"),
                Some(FieldValue::Bool(true))
            ),
            created_at: now,
        };
        Ok((placed, header))
    }
}

fn describe(fields: &[Field]) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|f| format!("{}={}", f.column, f.value))
        .collect();
    parts.join(", ")
}

pub fn value<'a>(fields: &'a [Field], column: &str) -> Option<&'a FieldValue> {
    fields.iter().find(|f| f.column == column).map(|f| &f.value)
}

fn text_field(fields: &[Field], column: &str) -> String {
    match value(fields, column) {
        Some(FieldValue::Text(s)) => s.clone(),
        _ => String::new(),
    }
}

fn uuid_field(fields: &[Field], column: &str) -> Option<Uuid> {
    match value(fields, column) {
        Some(FieldValue::Uuid(u)) => Some(*u),
        _ => None,
    }
}

pub fn session(role: Role) -> Session {
    Session {
        admin_id: Uuid::new_v4(),
        name: "Avery Quinn".to_string(),
        email: "avery@example.com".to_string(),
        role,
    }
}

pub fn product(sku: &str, name: &str, stock: i32) -> Product {
    let now = Utc::now();
    Product {
        sku: sku.to_string(),
        product_name: name.to_string(),
        category: "Electronics".to_string(),
        price: Decimal::new(1999, 2),
        stock,
        status: ProductStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

/// Apply written columns to a product, starting from `base` when updating
pub fn build_product(base: Option<&Product>, fields: &[Field]) -> Product {
    let mut row = base.cloned().unwrap_or_else(|| product("", "", 0));
    for field in fields {
        match (field.column, &field.value) {
            ("sku", FieldValue::Text(s)) => row.sku = s.clone(),
            ("product_name", FieldValue::Text(s)) => row.product_name = s.clone(),
            ("category", FieldValue::Text(s)) => row.category = s.clone(),
            ("price", FieldValue::Decimal(d)) => row.price = *d,
            ("stock", FieldValue::Integer(n)) => row.stock = *n as i32,
            ("status", FieldValue::Enum { value, .. }) => {
                row.status = value.parse().unwrap_or_default()
            }
            _ => {}
        }
    }
    row.updated_at = Utc::now();
    row
}

pub fn catalogue() -> Vec<Product> {
    vec![
        product("WH-001", "Wireless Headphones", 45),
        product("AP-101", "Organic Cotton T-Shirt", 78),
        product("HG-202", "Stainless Water Bottle", 12),
    ]
}
