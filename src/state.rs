use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::db::postgres::PgSource;
use crate::db::sqlite;
use crate::error::{FailureKind, ScreenError, ServiceError};
use crate::models::{
    CreateSavedFilter, Customer, Order, Product, SavedFilter, Shipment, Supplier, UpdateSavedFilter,
};
use crate::query_log::QueryLogStore;
use crate::screen::{form, Entity, FilterTemplate, ScreenController};
use crate::screens::{
    CustomersScreen, InventoryScreen, NotificationCenter, OrderDesk, OrdersScreen, SettingsScreen,
    ShippingScreen, SuppliersScreen,
};
use crate::session::Session;
use crate::toast::Toaster;

/// Shared application state. Screens are built per mount, each with a fresh query log.
pub struct AppState {
    source: PgSource,
    /// Local SQLite database for settings and saved filters
    metadata_db: Arc<Mutex<Connection>>,
    session: Session,
    toaster: Arc<dyn Toaster>,
    notifications: NotificationCenter,
}

impl AppState {
    pub fn new(source: PgSource, metadata_db: Connection, session: Session, toaster: Arc<dyn Toaster>) -> Self {
        Self {
            source,
            metadata_db: Arc::new(Mutex::new(metadata_db)),
            session,
            toaster,
            notifications: NotificationCenter::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    fn metadata(&self) -> MutexGuard<'_, Connection> {
        self.metadata_db
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Screens ====================

    /// Mount a table screen for `E`
    pub fn mount<E: Entity>(&self) -> ScreenController<E, PgSource> {
        ScreenController::new(
            self.source.clone(),
            self.session.clone(),
            QueryLogStore::new(),
            self.toaster.clone(),
        )
    }

    pub fn inventory(&self) -> InventoryScreen<PgSource> {
        self.mount()
    }

    pub fn customers(&self) -> CustomersScreen<PgSource> {
        self.mount()
    }

    pub fn orders(&self) -> OrdersScreen<PgSource> {
        self.mount()
    }

    pub fn shipping(&self) -> ShippingScreen<PgSource> {
        self.mount()
    }

    pub fn suppliers(&self) -> SuppliersScreen<PgSource> {
        self.mount()
    }

    pub fn settings(&self) -> SettingsScreen<PgSource> {
        SettingsScreen::new(
            self.source.clone(),
            self.session.clone(),
            self.metadata_db.clone(),
            QueryLogStore::new(),
            self.toaster.clone(),
        )
    }

    pub fn order_desk(&self) -> OrderDesk<PgSource> {
        OrderDesk::new(
            self.source.clone(),
            self.session.clone(),
            QueryLogStore::new(),
            self.toaster.clone(),
        )
    }

    // ==================== Saved Filters ====================

    /// Save a preset for one of `E`'s templates; the arguments must bind
    pub fn create_saved_filter<E: Entity>(
        &self,
        name: &str,
        template: &str,
        args: Vec<String>,
    ) -> Result<SavedFilter, ScreenError> {
        let name = form::required("Name", name)?;
        let spec = checked_template(E::LABEL, E::filters(), template, &args)?;

        let create = CreateSavedFilter {
            screen: E::SCREEN.to_string(),
            name,
            template: spec.name.to_string(),
            args,
        };
        let id = uuid::Uuid::new_v4().to_string();
        let db = self.metadata();

        sqlite::create_saved_filter(&db, &id, &create).map_err(|e| {
            log::error!("Failed to create saved filter: {}", e);
            ScreenError::service(FailureKind::SaveFailed, e.into())
        })
    }

    pub fn saved_filters<E: Entity>(&self) -> Result<Vec<SavedFilter>, ServiceError> {
        let db = self.metadata();
        Ok(sqlite::load_saved_filters(&db, E::SCREEN)?)
    }

    pub fn get_saved_filter(&self, filter_id: &str) -> Result<Option<SavedFilter>, ServiceError> {
        let db = self.metadata();
        Ok(sqlite::get_saved_filter(&db, filter_id)?)
    }

    /// Apply a partial update; the merged preset must still bind against its screen's templates
    pub fn update_saved_filter(&self, update: &UpdateSavedFilter) -> Result<Option<SavedFilter>, ScreenError> {
        let db = self.metadata();
        let stored = sqlite::get_saved_filter(&db, &update.id)
            .map_err(|e| ScreenError::service(FailureKind::SaveFailed, e.into()))?;
        let Some(stored) = stored else {
            return Ok(None);
        };

        let (label, filters) = screen_filters(&stored.screen).ok_or_else(|| {
            ScreenError::FilterRejected(format!("Unknown screen: {}", stored.screen))
        })?;
        let name = update
            .name
            .as_deref()
            .map(|name| form::required("Name", name))
            .transpose()?;
        let template = update.template.as_deref().unwrap_or(&stored.template);
        let args = update.args.as_ref().unwrap_or(&stored.args);
        let spec = checked_template(label, filters, template, args)?;

        let checked = UpdateSavedFilter {
            id: update.id.clone(),
            name,
            template: update.template.as_ref().map(|_| spec.name.to_string()),
            args: update.args.clone(),
        };
        sqlite::update_saved_filter(&db, &checked).map_err(|e| {
            log::error!("Failed to update saved filter: {}", e);
            ScreenError::service(FailureKind::SaveFailed, e.into())
        })
    }

    pub fn delete_saved_filter(&self, filter_id: &str) -> Result<bool, ServiceError> {
        let db = self.metadata();
        Ok(sqlite::delete_saved_filter(&db, filter_id)?)
    }
}

/// Label and templates for a stored screen key
fn screen_filters(screen: &str) -> Option<(&'static str, &'static [FilterTemplate])> {
    [
        (Product::SCREEN, Product::LABEL, Product::filters()),
        (Customer::SCREEN, Customer::LABEL, Customer::filters()),
        (Order::SCREEN, Order::LABEL, Order::filters()),
        (Shipment::SCREEN, Shipment::LABEL, Shipment::filters()),
        (Supplier::SCREEN, Supplier::LABEL, Supplier::filters()),
    ]
    .into_iter()
    .find(|(key, _, _)| *key == screen)
    .map(|(_, label, filters)| (label, filters))
}

fn checked_template(
    label: &str,
    filters: &'static [FilterTemplate],
    template: &str,
    args: &[String],
) -> Result<&'static FilterTemplate, ScreenError> {
    let spec = filters.iter().find(|t| t.name == template).ok_or_else(|| {
        ScreenError::FilterRejected(format!("Unknown {} filter: {}", label.to_lowercase(), template))
    })?;
    spec.bind(args)?;
    Ok(spec)
}
