//! The application's pages. The five table screens share one generic
//! controller and differ only in their `Entity` impls.

pub mod customers;
pub mod inventory;
pub mod notifications;
pub mod order_desk;
pub mod orders;
pub mod settings;
pub mod shipping;
pub mod suppliers;

use crate::models::{Customer, Order, Product, Shipment, Supplier};
use crate::screen::ScreenController;

pub use notifications::NotificationCenter;
pub use order_desk::{OrderDesk, OrderRequest};
pub use settings::SettingsScreen;

pub type InventoryScreen<S> = ScreenController<Product, S>;
pub type CustomersScreen<S> = ScreenController<Customer, S>;
pub type OrdersScreen<S> = ScreenController<Order, S>;
pub type ShippingScreen<S> = ScreenController<Shipment, S>;
pub type SuppliersScreen<S> = ScreenController<Supplier, S>;
