use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::error::{FailureKind, ScreenError, ValidationError};
use crate::models::{CustomerOrder, Order, OrderStatus, Product};
use crate::query_log::{Field, OperationRecord, QueryLogStore};
use crate::screen::{form, Entity, OrderPlacement, TableSource};
use crate::session::Session;
use crate::toast::{Toast, Toaster};

/// Storefront order form as submitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_address: String,
    pub product_sku: String,
    pub quantity: u32,
    pub shipping_required: bool,
}

/// Order placement page: pick an in-stock product and submit customer details
pub struct OrderDesk<S> {
    source: S,
    session: Session,
    log: QueryLogStore,
    toaster: Arc<dyn Toaster>,
    products: Mutex<Vec<Product>>,
}

impl<S: TableSource<Product> + OrderPlacement> OrderDesk<S> {
    pub fn new(source: S, session: Session, log: QueryLogStore, toaster: Arc<dyn Toaster>) -> Self {
        OrderDesk {
            source,
            session,
            log,
            toaster,
            products: Mutex::new(Vec::new()),
        }
    }

    fn products_guard(&self) -> MutexGuard<'_, Vec<Product>> {
        self.products.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn products(&self) -> Vec<Product> {
        self.products_guard().clone()
    }

    pub fn log(&self) -> &QueryLogStore {
        &self.log
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch active products with stock on hand
    pub async fn load_products(&self) -> Result<(), ScreenError> {
        let available = Product::filters()
            .iter()
            .find(|t| t.name == "available")
            .ok_or_else(|| ScreenError::FilterRejected("No availability filter for products".to_string()))?;
        let conditions = available.bind(&["active".to_string(), "0".to_string()])?;

        let entry = self.log.append(
            OperationRecord::Filter {
                statement: Product::SELECT_SQL,
                template: available.name,
                conditions: conditions.clone(),
            },
            "Fetch Products",
            None,
        );
        let start = Instant::now();
        let result = self.source.fetch_filtered(&conditions).await;
        entry.finish(start.elapsed());

        match result {
            Ok(products) => {
                *self.products_guard() = products;
                Ok(())
            }
            Err(e) => {
                let err = ScreenError::service(FailureKind::LoadFailed, e);
                log::error!("Error loading products: {}", err);
                self.toaster.show(Toast::error(err.user_message()));
                Err(err)
            }
        }
    }

    fn check(&self, request: &OrderRequest) -> Result<(Vec<Field>, Vec<Field>), ValidationError> {
        let customer_name = form::min_length("Name", &request.customer_name, 2)?;
        let customer_email = form::email("Email", &request.customer_email)?;
        let customer_address = form::min_length("Address", &request.customer_address, 5)?;
        if request.quantity < 1 {
            return Err(ValidationError::Rule("Quantity must be at least 1".to_string()));
        }

        let product = self
            .products_guard()
            .iter()
            .find(|p| p.sku == request.product_sku.trim())
            .cloned()
            .ok_or_else(|| ValidationError::Rule("Product not found".to_string()))?;

        let on_hand = u32::try_from(product.stock).unwrap_or(0);
        if request.quantity > on_hand {
            return Err(ValidationError::Rule(format!("Only {} in stock", on_hand)));
        }
        let total_amount = product.price * Decimal::from(request.quantity);

        let order = vec![
            Field::new("total_amount", total_amount),
            Field::new("status", OrderStatus::Pending),
            Field::new("admin_id", self.session.admin_id),
        ];
        let customer_order = vec![
            Field::new("customer_name", customer_name),
            Field::new("customer_email", customer_email),
            Field::new("customer_address", customer_address),
            Field::new("shipping_required", request.shipping_required),
        ];
        Ok((order, customer_order))
    }

    pub async fn place_order(&self, request: &OrderRequest) -> Result<(Order, CustomerOrder), ScreenError> {
        let (order, customer_order) = match self.check(request) {
            Ok(fields) => fields,
            Err(e) => {
                self.toaster.show(Toast::error(e.to_string()));
                return Err(e.into());
            }
        };

        let entries = [
            self.log.append(
                OperationRecord::Insert {
                    table: "orders",
                    fields: order.clone(),
                },
                "Place Order",
                None,
            ),
            self.log.append(
                OperationRecord::Insert {
                    table: "customer_orders",
                    fields: customer_order.clone(),
                },
                "Place Order",
                None,
            ),
        ];
        let start = Instant::now();
        let result = self.source.place_order(&order, &customer_order).await;
        let elapsed = start.elapsed();
        for entry in &entries {
            entry.finish(elapsed);
        }

        match result {
            Ok(placed) => {
                self.toaster.show(Toast::success(
                    "Order placed successfully",
                    "You will receive an email confirmation shortly.",
                ));
                Ok(placed)
            }
            Err(e) => {
                log::error!("Error placing order: {}", e);
                self.toaster
                    .show(Toast::error("Failed to place order. Please try again."));
                Err(ScreenError::service(FailureKind::OrderFailed, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_log::FieldValue;
    use crate::screen::testing::{build_product, catalogue, session, value, MemorySource, Op};
    use crate::session::Role;
    use crate::toast::ToastLog;

    fn desk() -> (OrderDesk<MemorySource<Product>>, Arc<ToastLog>, Session) {
        let log = QueryLogStore::new();
        let source = MemorySource::new(catalogue())
            .with_builder(build_product)
            .observe(&log);
        let toasts = Arc::new(ToastLog::new());
        let acting = session(Role::Staff);
        (OrderDesk::new(source, acting.clone(), log, toasts.clone()), toasts, acting)
    }

    fn request(sku: &str, quantity: u32) -> OrderRequest {
        OrderRequest {
            customer_name: "Jordan Lee".into(),
            customer_email: "jordan@example.com".into(),
            customer_address: "42 Quay Road".into(),
            product_sku: sku.into(),
            quantity,
            shipping_required: true,
        }
    }

    #[tokio::test]
    async fn products_load_through_the_availability_filter() {
        let (desk, _, _) = desk();
        desk.load_products().await.unwrap();

        assert_eq!(desk.products().len(), 3);
        let entry = &desk.log().all()[0];
        assert_eq!(entry.source, "Fetch Products");
        assert!(entry.description().ends_with("WHERE status = 'active' AND stock > 0"));
        assert_eq!(desk.source().calls()[0].op, Op::FetchFiltered);
    }

    #[tokio::test]
    async fn order_total_is_price_times_quantity() {
        let (desk, toasts, acting) = desk();
        desk.load_products().await.unwrap();

        let (order, header) = desk.place_order(&request("AP-101", 3)).await.unwrap();

        // catalogue prices are 19.99
        assert_eq!(order.total_amount, Decimal::new(5997, 2));
        assert_eq!(order.admin_id, Some(acting.admin_id));
        assert_eq!(header.order_id, Some(order.order_id));
        assert_eq!(header.customer_email, "jordan@example.com");
        assert!(header.shipping_required);

        let sources: Vec<String> = desk.log().all().iter().take(2).map(|e| e.source.clone()).collect();
        assert_eq!(sources, vec!["Place Order", "Place Order"]);
        let call = desk.source().calls().pop().unwrap();
        assert_eq!(call.op, Op::PlaceOrder);
        assert_eq!(call.log_len, 3);

        let toast = toasts.last().unwrap();
        assert_eq!(toast.title, "Order placed successfully");
    }

    #[tokio::test]
    async fn orders_beyond_stock_are_refused() {
        let (desk, toasts, _) = desk();
        desk.load_products().await.unwrap();

        let err = desk.place_order(&request("HG-202", 50)).await.unwrap_err();
        assert!(matches!(
            err,
            ScreenError::Validation(ValidationError::Rule(ref msg)) if msg == "Only 12 in stock"
        ));
        assert_eq!(desk.source().count(Op::PlaceOrder), 0);
        assert_eq!(desk.log().len(), 1);
        assert_eq!(toasts.last().unwrap().description.as_deref(), Some("Only 12 in stock"));

        desk.place_order(&request("HG-202", 12)).await.unwrap();
        match &desk.log().all()[1].record {
            OperationRecord::Insert { table, fields } => {
                assert_eq!(*table, "orders");
                assert_eq!(
                    value(fields, "total_amount"),
                    Some(&FieldValue::Decimal(Decimal::new(1999, 2) * Decimal::from(12)))
                );
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_requests_are_not_sent() {
        let (desk, toasts, _) = desk();
        desk.load_products().await.unwrap();

        let mut short_name = request("AP-101", 1);
        short_name.customer_name = "J".into();
        let mut bad_email = request("AP-101", 1);
        bad_email.customer_email = "jordan".into();
        let mut short_address = request("AP-101", 1);
        short_address.customer_address = "Here".into();

        for bad in [
            short_name,
            bad_email,
            short_address,
            request("AP-101", 0),
            request("ZZ-999", 1),
        ] {
            let err = desk.place_order(&bad).await.unwrap_err();
            assert!(matches!(err, ScreenError::Validation(_)));
        }
        assert_eq!(desk.source().count(Op::PlaceOrder), 0);
        assert_eq!(desk.log().len(), 1);
        assert!(toasts.last().unwrap().is_destructive());
    }

    #[tokio::test]
    async fn failed_placement_shows_fixed_message() {
        let (desk, toasts, _) = desk();
        desk.load_products().await.unwrap();
        desk.source().fail_next("insert or update on table violates foreign key");

        let err = desk.place_order(&request("AP-101", 1)).await.unwrap_err();
        assert_eq!(err.kind(FailureKind::AddFailed), FailureKind::OrderFailed);

        let toast = toasts.last().unwrap();
        assert_eq!(toast.title, "Error");
        assert_eq!(toast.description.as_deref(), Some("Failed to place order. Please try again."));
    }
}
