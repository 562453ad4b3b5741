use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::models::{Notification, NotificationKind, Product};

pub const LOW_STOCK_TITLE: &str = "Low inventory alert";

/// In-memory notification list, newest first
#[derive(Default)]
pub struct NotificationCenter {
    items: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, notification: Notification) {
        self.items().insert(0, notification);
    }

    pub fn all(&self) -> Vec<Notification> {
        self.items().clone()
    }

    pub fn unread(&self) -> Vec<Notification> {
        self.items().iter().filter(|n| !n.read).cloned().collect()
    }

    pub fn unread_count(&self) -> usize {
        self.items().iter().filter(|n| !n.read).count()
    }

    pub fn mark_read(&self, id: Uuid) -> bool {
        match self.items().iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&self) {
        for notification in self.items().iter_mut() {
            notification.read = true;
        }
    }

    /// Raise a warning for each product at or below `threshold`.
    ///
    /// A product that already has an unread alert is skipped. Returns the
    /// number of alerts raised.
    pub fn push_low_stock_alerts(&self, products: &[Product], threshold: i32) -> usize {
        let mut items = self.items();
        let mut raised = 0;

        for product in products.iter().filter(|p| p.stock <= threshold) {
            let message = format!("Product '{}' is running low on stock.", product.product_name);
            let pending = items
                .iter()
                .any(|n| !n.read && n.title == LOW_STOCK_TITLE && n.message == message);
            if pending {
                continue;
            }

            log::info!("{} for {} (stock {})", LOW_STOCK_TITLE, product.sku, product.stock);
            items.insert(0, Notification::new(NotificationKind::Warning, LOW_STOCK_TITLE, message));
            raised += 1;
        }

        raised
    }
}
