pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query_log;
pub mod screen;
pub mod screens;
pub mod session;
pub mod state;
pub mod toast;

use std::sync::Arc;

use config::AppConfig;
use db::postgres::{self, PgSource};
use error::AppError;
use query_log::{QueryLogStore, QueryLogViewer};
use state::AppState;
use toast::LogToaster;

/// Products at or below this stock level raise a notification after the inventory loads
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Headless run: resolve the session, mount every screen once and print their query logs
pub async fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let metadata_db = db::sqlite::init_database(&config.data_dir)?;

    let pool = postgres::create_pool(&config.database).await?;
    let latency = postgres::test_connection(&pool).await?;
    log::info!("Connected to hosted database in {}ms", latency);

    let session = postgres::load_session(&pool, &config.admin_email).await?;
    log::info!("Acting as {} <{}> ({})", session.name, session.email, session.role);

    let state = AppState::new(
        PgSource::new(pool, config.statement_timeout_secs),
        metadata_db,
        session,
        Arc::new(LogToaster),
    );

    let inventory = state.inventory();
    let customers = state.customers();
    let orders = state.orders();
    let shipping = state.shipping();
    let suppliers = state.suppliers();
    let desk = state.order_desk();

    let results = futures::join!(
        inventory.load(),
        customers.load(),
        orders.load(),
        shipping.load(),
        suppliers.load(),
        desk.load_products(),
    );
    let failed = [
        results.0.is_err(),
        results.1.is_err(),
        results.2.is_err(),
        results.3.is_err(),
        results.4.is_err(),
        results.5.is_err(),
    ]
    .iter()
    .filter(|failed| **failed)
    .count();
    if failed > 0 {
        log::warn!("{} screen(s) failed to load", failed);
    }

    let alerts = state
        .notifications()
        .push_low_stock_alerts(&inventory.rows(), LOW_STOCK_THRESHOLD);
    log::info!(
        "{} low stock alert(s), {} unread notification(s)",
        alerts,
        state.notifications().unread_count()
    );

    let settings = state.settings().load();
    log::debug!("Theme {:?}, density {:?}", settings.appearance.theme, settings.appearance.density);

    let logs: [&QueryLogStore; 6] = [
        inventory.log(),
        customers.log(),
        orders.log(),
        shipping.log(),
        suppliers.log(),
        desk.log(),
    ];
    for store in logs {
        let mut viewer = QueryLogViewer::new(store);
        viewer.toggle();
        println!("{}", viewer.render());
    }

    Ok(())
}
