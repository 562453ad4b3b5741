use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::{ConnectionConfig, DatabaseTarget};
use crate::error::ServiceError;
use crate::models::{AccountSettings, CustomerOrder, Order};
use crate::query_log::{Comparison, Condition, Field, FieldValue};
use crate::screen::{AccountSource, Entity, OrderPlacement, TableSource};
use crate::session::Session;

/// Build a connection string with proper URL encoding and SSL mode
pub fn build_connection_string(config: &ConnectionConfig) -> String {
    // URL encode username and password to handle special characters safely
    let username = urlencoding::encode(&config.username);
    let password = urlencoding::encode(&config.password);

    format!(
        "postgres://{}:{}@{}:{}/{}?sslmode={}",
        username, password, config.host, config.port, config.database, config.ssl_mode
    )
}

/// Create the PostgreSQL connection pool for the hosted schema
pub async fn create_pool(target: &DatabaseTarget) -> Result<PgPool, sqlx::Error> {
    let connection_string = match target {
        DatabaseTarget::Url(url) => url.clone(),
        DatabaseTarget::Parts(config) => build_connection_string(config),
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&connection_string)
        .await?;

    Ok(pool)
}

/// Round-trip a trivial query and return the latency in milliseconds
pub async fn test_connection(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let start = Instant::now();
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX))
}

/// Resolve the acting principal from the `admins` table
pub async fn load_session(pool: &PgPool, email: &str) -> Result<Session, ServiceError> {
    let row = sqlx::query("SELECT admin_id, name, email, role FROM admins WHERE lower(email) = lower($1)")
        .bind(email.trim())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Admin {}", email)))?;

    let role: String = row.try_get("role")?;
    Ok(Session {
        admin_id: row.try_get("admin_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: role.parse().map_err(ServiceError::Rejected)?,
    })
}

// ==================== Statement Building ====================

/// Bind a value as a parameter; enum labels are bound as text and cast
fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Null => {
            builder.push("NULL");
        }
        FieldValue::Text(s) => {
            builder.push_bind(s.clone());
        }
        FieldValue::Integer(n) => {
            builder.push_bind(*n);
        }
        FieldValue::Decimal(d) => {
            builder.push_bind(*d);
        }
        FieldValue::Bool(b) => {
            builder.push_bind(*b);
        }
        FieldValue::Uuid(u) => {
            builder.push_bind(*u);
        }
        FieldValue::Date(d) => {
            builder.push_bind(*d);
        }
        FieldValue::Enum { type_name, value } => {
            builder.push_bind(value.to_string());
            builder.push("::");
            builder.push(*type_name);
        }
    }
}

fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_condition(builder: &mut QueryBuilder<'_, Postgres>, condition: &Condition) {
    builder.push(condition.column);
    match (condition.comparison, &condition.value) {
        (Comparison::Contains, FieldValue::Text(s)) => {
            builder.push(" ILIKE ");
            builder.push_bind(format!("%{}%", escape_like(s)));
        }
        (comparison, value) => {
            builder.push(" ");
            builder.push(comparison.operator());
            builder.push(" ");
            push_value(builder, value);
        }
    }
}

fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, table: &str, fields: &[Field]) {
    let columns: Vec<&str> = fields.iter().map(|f| f.column).collect();
    builder.push("INSERT INTO ");
    builder.push(table);
    builder.push(" (");
    builder.push(columns.join(", "));
    builder.push(") VALUES (");
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(builder, &field.value);
    }
    builder.push(")");
}

// ==================== Hosted Tables ====================

/// The hosted database as every screen's data collaborator
#[derive(Clone)]
pub struct PgSource {
    pool: PgPool,
    statement_timeout_secs: u64,
}

impl PgSource {
    pub fn new(pool: PgPool, statement_timeout_secs: u64) -> Self {
        PgSource {
            pool,
            statement_timeout_secs,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl<E: Entity> TableSource<E> for PgSource {
    async fn fetch_all(&self) -> Result<Vec<E>, ServiceError> {
        let rows = sqlx::query_as::<_, E>(E::SELECT_SQL)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert(&self, fields: &[Field]) -> Result<Vec<E>, ServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("WITH written AS (");
        push_insert(&mut builder, E::TABLE, fields);
        builder.push(" RETURNING *) ");
        builder.push(E::WRITE_PROJECTION);

        let rows = builder.build_query_as::<E>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn update(&self, key: &E::Key, fields: &[Field]) -> Result<E, ServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("WITH written AS (UPDATE ");
        builder.push(E::TABLE);
        builder.push(" SET ");
        for field in fields {
            builder.push(field.column);
            builder.push(" = ");
            push_value(&mut builder, &field.value);
            builder.push(", ");
        }
        builder.push("updated_at = now() WHERE ");
        builder.push(E::KEY_COLUMN);
        builder.push(" = ");
        push_value(&mut builder, &key.clone().into());
        builder.push(" RETURNING *) ");
        builder.push(E::WRITE_PROJECTION);

        builder
            .build_query_as::<E>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} {}", E::LABEL, key)))
    }

    async fn delete(&self, key: &E::Key) -> Result<(), ServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM ");
        builder.push(E::TABLE);
        builder.push(" WHERE ");
        builder.push(E::KEY_COLUMN);
        builder.push(" = ");
        push_value(&mut builder, &key.clone().into());

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!("{} {}", E::LABEL, key)));
        }
        Ok(())
    }

    async fn fetch_filtered(&self, conditions: &[Condition]) -> Result<Vec<E>, ServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM (");
        builder.push(E::SELECT_SQL);
        builder.push(") AS filtered");
        for (i, condition) in conditions.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            push_condition(&mut builder, condition);
        }

        let rows = builder.build_query_as::<E>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn query_readonly(&self, sql: &str) -> Result<Vec<E>, ServiceError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        let timeout = format!(
            "SET LOCAL statement_timeout = {}",
            self.statement_timeout_secs.saturating_mul(1000)
        );
        sqlx::query(&timeout).execute(&mut *tx).await?;

        let result = sqlx::query_as::<_, E>(sql).fetch_all(&mut *tx).await;
        if let Err(e) = tx.rollback().await {
            log::warn!("Rollback after read-only filter failed: {}", e);
        }

        Ok(result?)
    }
}

impl AccountSource for PgSource {
    async fn update_account(&self, admin_id: Uuid, account: &AccountSettings) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "UPDATE admins SET name = $1, email = $2, updated_at = now() WHERE admin_id = $3",
        )
        .bind(&account.name)
        .bind(&account.email)
        .bind(admin_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!("Admin {}", admin_id)));
        }
        Ok(())
    }
}

impl OrderPlacement for PgSource {
    async fn place_order(
        &self,
        order: &[Field],
        customer_order: &[Field],
    ) -> Result<(Order, CustomerOrder), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let mut builder = QueryBuilder::<Postgres>::new("WITH written AS (");
        push_insert(&mut builder, Order::TABLE, order);
        builder.push(" RETURNING *) ");
        builder.push(Order::WRITE_PROJECTION);
        let placed = builder.build_query_as::<Order>().fetch_one(&mut *tx).await?;

        let mut fields = customer_order.to_vec();
        fields.push(Field::new("order_id", placed.order_id));
        let mut builder = QueryBuilder::<Postgres>::new("");
        push_insert(&mut builder, "customer_orders", &fields);
        builder.push(" RETURNING *");
        let header = builder
            .build_query_as::<CustomerOrder>()
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        log::info!("Placed order {} for {}", placed.order_id, header.customer_email);
        Ok((placed, header))
    }
}
