use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use std::path::Path;
use uuid::Uuid;

use crate::models::{CreateSavedFilter, SavedFilter, UpdateSavedFilter, UserSettings};

/// Open (or create) the local metadata database under `data_dir`
pub fn init_database(data_dir: &Path) -> SqliteResult<Connection> {
    if let Err(e) = std::fs::create_dir_all(data_dir) {
        log::warn!("Could not create data directory {}: {}", data_dir.display(), e);
    }
    let db_path = data_dir.join("stockroom.db");

    let conn = Connection::open(&db_path)?;
    create_tables(&conn)?;

    Ok(conn)
}

/// Metadata database that lives only as long as the connection
pub fn open_in_memory() -> SqliteResult<Connection> {
    let conn = Connection::open_in_memory()?;
    create_tables(&conn)?;
    Ok(conn)
}

fn create_tables(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        r#"
        -- Per-principal settings, stored as one JSON document
        CREATE TABLE IF NOT EXISTS user_settings (
            user_id TEXT PRIMARY KEY,
            settings_json TEXT NOT NULL,
            updated_at TEXT DEFAULT CURRENT_TIMESTAMP
        );

        -- Named filter presets
        CREATE TABLE IF NOT EXISTS saved_filters (
            id TEXT PRIMARY KEY,
            screen TEXT NOT NULL,
            name TEXT NOT NULL,
            template TEXT NOT NULL,
            args_json TEXT NOT NULL DEFAULT '[]',
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_saved_filters_screen ON saved_filters(screen);
        "#,
    )
}

// ==================== User Settings ====================

/// Load a principal's settings, returns defaults if none are stored
pub fn load_user_settings(conn: &Connection, user_id: &Uuid) -> SqliteResult<UserSettings> {
    let json: Option<String> = conn
        .query_row(
            "SELECT settings_json FROM user_settings WHERE user_id = ?1",
            [user_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match json {
        Some(json) => match serde_json::from_str(&json) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                log::warn!("Discarding unreadable settings for {}: {}", user_id, e);
                Ok(UserSettings::default())
            }
        },
        None => Ok(UserSettings::default()),
    }
}

pub fn save_user_settings(conn: &Connection, user_id: &Uuid, settings: &UserSettings) -> SqliteResult<()> {
    let json = serde_json::to_string(settings)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        r#"
        INSERT INTO user_settings (user_id, settings_json, updated_at)
        VALUES (?1, ?2, CURRENT_TIMESTAMP)
        ON CONFLICT(user_id) DO UPDATE SET
            settings_json = excluded.settings_json,
            updated_at = CURRENT_TIMESTAMP
        "#,
        (user_id.to_string(), &json),
    )?;
    Ok(())
}

// ==================== Saved Filters ====================

fn args_to_json(args: &[String]) -> SqliteResult<String> {
    serde_json::to_string(args).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn row_to_saved_filter(row: &rusqlite::Row<'_>) -> SqliteResult<SavedFilter> {
    let args_json: String = row.get(4)?;
    let args = serde_json::from_str(&args_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(SavedFilter {
        id: row.get(0)?,
        screen: row.get(1)?,
        name: row.get(2)?,
        template: row.get(3)?,
        args,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Create a new saved filter
pub fn create_saved_filter(conn: &Connection, id: &str, filter: &CreateSavedFilter) -> SqliteResult<SavedFilter> {
    let now = chrono::Utc::now().to_rfc3339();

    conn.execute(
        r#"
        INSERT INTO saved_filters (id, screen, name, template, args_json, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        (
            id,
            &filter.screen,
            &filter.name,
            &filter.template,
            args_to_json(&filter.args)?,
            &now,
            &now,
        ),
    )?;

    Ok(SavedFilter {
        id: id.to_string(),
        screen: filter.screen.clone(),
        name: filter.name.clone(),
        template: filter.template.clone(),
        args: filter.args.clone(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Load every saved filter for one screen, by name
pub fn load_saved_filters(conn: &Connection, screen: &str) -> SqliteResult<Vec<SavedFilter>> {
    let mut stmt = conn.prepare(
        "SELECT id, screen, name, template, args_json, created_at, updated_at \
         FROM saved_filters WHERE screen = ?1 ORDER BY name",
    )?;

    let filters = stmt.query_map([screen], row_to_saved_filter)?;
    filters.collect()
}

pub fn get_saved_filter(conn: &Connection, filter_id: &str) -> SqliteResult<Option<SavedFilter>> {
    conn.query_row(
        "SELECT id, screen, name, template, args_json, created_at, updated_at \
         FROM saved_filters WHERE id = ?1",
        [filter_id],
        row_to_saved_filter,
    )
    .optional()
}

/// Update the provided fields of a saved filter
pub fn update_saved_filter(conn: &Connection, update: &UpdateSavedFilter) -> SqliteResult<Option<SavedFilter>> {
    let now = chrono::Utc::now().to_rfc3339();

    let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now)];
    let mut sql_parts = vec!["updated_at = ?1".to_string()];

    if let Some(ref name) = update.name {
        params.push(Box::new(name.clone()));
        sql_parts.push(format!("name = ?{}", params.len()));
    }
    if let Some(ref template) = update.template {
        params.push(Box::new(template.clone()));
        sql_parts.push(format!("template = ?{}", params.len()));
    }
    if let Some(ref args) = update.args {
        params.push(Box::new(args_to_json(args)?));
        sql_parts.push(format!("args_json = ?{}", params.len()));
    }

    params.push(Box::new(update.id.clone()));
    let sql = format!(
        "UPDATE saved_filters SET {} WHERE id = ?{}",
        sql_parts.join(", "),
        params.len()
    );

    let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    conn.execute(&sql, params_refs.as_slice())?;

    get_saved_filter(conn, &update.id)
}

pub fn delete_saved_filter(conn: &Connection, filter_id: &str) -> SqliteResult<bool> {
    let rows_affected = conn.execute("DELETE FROM saved_filters WHERE id = ?1", [filter_id])?;
    Ok(rows_affected > 0)
}
