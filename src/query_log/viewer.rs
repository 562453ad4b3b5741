use chrono::Local;
use sqlformat::{FormatOptions, QueryParams};
use std::sync::Arc;
use thiserror::Error;

use super::store::{QueryLogEntry, QueryLogStore};
use crate::toast::{Toast, Toaster};

pub const EMPTY_MESSAGE: &str = "No SQL queries recorded yet";

#[derive(Debug, Error)]
#[error("Clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// System clipboard access
pub trait Clipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// What the viewer displays: a log snapshot, or a single literal statement
pub enum ViewerSource {
    Entries(Vec<Arc<QueryLogEntry>>),
    Literal(String),
}

impl From<Vec<Arc<QueryLogEntry>>> for ViewerSource {
    fn from(entries: Vec<Arc<QueryLogEntry>>) -> Self {
        ViewerSource::Entries(entries)
    }
}

impl From<&QueryLogStore> for ViewerSource {
    fn from(store: &QueryLogStore) -> Self {
        ViewerSource::Entries(store.all())
    }
}

impl From<&str> for ViewerSource {
    fn from(statement: &str) -> Self {
        ViewerSource::Literal(statement.to_string())
    }
}

impl From<String> for ViewerSource {
    fn from(statement: String) -> Self {
        ViewerSource::Literal(statement)
    }
}

/// One displayed entry of an expanded viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerRow {
    /// Index to pass to [`QueryLogViewer::copy`]
    pub copy_index: usize,
    pub time: String,
    pub source: String,
    pub duration: Option<String>,
    pub description: String,
}

/// Collapsible panel over a screen's query log
pub struct QueryLogViewer {
    entries: Vec<Arc<QueryLogEntry>>,
    expanded: bool,
}

impl QueryLogViewer {
    pub fn new(source: impl Into<ViewerSource>) -> Self {
        let entries = match source.into() {
            ViewerSource::Entries(entries) => entries,
            ViewerSource::Literal(statement) if statement.is_empty() => Vec::new(),
            ViewerSource::Literal(statement) => {
                vec![Arc::new(QueryLogEntry::detached(statement, ""))]
            }
        };
        Self {
            entries,
            expanded: false,
        }
    }

    /// Replace the displayed entries, keeping the expansion state
    pub fn refresh(&mut self, source: impl Into<ViewerSource>) {
        let expanded = self.expanded;
        *self = Self::new(source);
        self.expanded = expanded;
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn header(&self) -> String {
        if self.entries.is_empty() {
            "SQL Queries".to_string()
        } else {
            format!("SQL Queries ({})", self.entries.len())
        }
    }

    pub fn rows(&self) -> Vec<ViewerRow> {
        if !self.expanded {
            return Vec::new();
        }
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| ViewerRow {
                copy_index: index,
                time: entry
                    .timestamp
                    .with_timezone(&Local)
                    .format("%H:%M:%S")
                    .to_string(),
                source: entry.source.clone(),
                // zero durations are not shown
                duration: entry
                    .duration_millis()
                    .filter(|ms| *ms > 0)
                    .map(|ms| format!("{}ms", ms)),
                description: entry.description(),
            })
            .collect()
    }

    /// Render the panel as plain text
    pub fn render(&self) -> String {
        let mut out = self.header();
        if !self.expanded {
            return out;
        }
        if self.entries.is_empty() {
            out.push('\n');
            out.push_str(EMPTY_MESSAGE);
            return out;
        }

        for (row, entry) in self.rows().iter().zip(&self.entries) {
            out.push_str("\n\n");
            out.push_str(&row.time);
            if !row.source.is_empty() {
                out.push_str(" • ");
                out.push_str(&row.source);
            }
            if let Some(duration) = &row.duration {
                out.push_str("  ");
                out.push_str(duration);
            }
            out.push('\n');
            if entry.record.is_statement() {
                out.push_str(&sqlformat::format(
                    &row.description,
                    &QueryParams::None,
                    &FormatOptions::default(),
                ));
            } else {
                out.push_str(&row.description);
            }
        }
        out
    }

    /// Copy one entry's description to the clipboard
    pub fn copy(&self, index: usize, clipboard: &dyn Clipboard, toaster: &dyn Toaster) -> bool {
        let Some(entry) = self.entries.get(index) else {
            return false;
        };

        match clipboard.write_text(&entry.description()) {
            Ok(()) => {
                toaster.show(
                    Toast::success("Copied to clipboard", "Query copied to clipboard")
                        .with_duration(2000),
                );
                true
            }
            Err(e) => {
                log::warn!("Failed to copy query: {}", e);
                let mut toast = Toast::error(e.to_string());
                toast.title = "Copy failed".to_string();
                toaster.show(toast);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toast::ToastLog;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryClipboard {
        text: Mutex<Option<String>>,
        broken: bool,
    }

    impl Clipboard for MemoryClipboard {
        fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
            if self.broken {
                return Err(ClipboardError("permission denied".to_string()));
            }
            *self.text.lock().unwrap() = Some(text.to_string());
            Ok(())
        }
    }

    fn populated_store() -> QueryLogStore {
        let store = QueryLogStore::new();
        store.append("SELECT * FROM products", "Fetch Products", Some(31));
        store.append("DELETE FROM products WHERE sku = 'WH-001'", "Delete Product", None);
        store.append("SELECT * FROM customers", "Fetch Customers", None);
        store
    }

    #[test]
    fn empty_viewer_shows_empty_state() {
        let mut viewer = QueryLogViewer::new(&QueryLogStore::new());
        assert_eq!(viewer.header(), "SQL Queries");

        viewer.toggle();
        assert!(viewer.rows().is_empty());
        assert_eq!(viewer.render(), format!("SQL Queries\n{}", EMPTY_MESSAGE));
    }

    #[test]
    fn collapsed_viewer_only_shows_count() {
        let viewer = QueryLogViewer::new(&populated_store());
        assert!(!viewer.is_expanded());
        assert_eq!(viewer.render(), "SQL Queries (3)");
        assert!(viewer.rows().is_empty());
    }

    #[test]
    fn expanded_viewer_lists_every_entry() {
        let mut viewer = QueryLogViewer::new(&populated_store());
        viewer.toggle();

        let rows = viewer.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].source, "Fetch Customers");
        assert_eq!(rows[2].duration.as_deref(), Some("31ms"));
        assert!(rows.iter().enumerate().all(|(i, r)| r.copy_index == i));
        assert!(!viewer.render().contains(EMPTY_MESSAGE));
    }

    #[test]
    fn copy_places_only_that_description_on_clipboard() {
        let mut viewer = QueryLogViewer::new(&populated_store());
        viewer.toggle();
        let clipboard = MemoryClipboard::default();
        let toasts = ToastLog::new();

        assert!(viewer.copy(1, &clipboard, &toasts));
        assert_eq!(
            clipboard.text.lock().unwrap().as_deref(),
            Some("DELETE FROM products WHERE sku = 'WH-001'")
        );

        let toast = toasts.last().expect("toast shown");
        assert_eq!(toast.title, "Copied to clipboard");
        assert_eq!(toast.duration_ms, Some(2000));
        assert!(!viewer.copy(9, &clipboard, &toasts));
    }

    #[test]
    fn clipboard_failure_is_reported() {
        let viewer = QueryLogViewer::new(&populated_store());
        let clipboard = MemoryClipboard {
            broken: true,
            ..Default::default()
        };
        let toasts = ToastLog::new();

        assert!(!viewer.copy(0, &clipboard, &toasts));
        let toast = toasts.last().expect("toast shown");
        assert_eq!(toast.title, "Copy failed");
        assert!(toast.is_destructive());
    }

    #[test]
    fn literal_statement_becomes_single_entry() {
        let mut viewer = QueryLogViewer::new("SELECT * FROM orders");
        assert_eq!(viewer.len(), 1);
        viewer.toggle();
        assert_eq!(viewer.rows()[0].description, "SELECT * FROM orders");
    }

    #[test]
    fn empty_literal_shows_empty_state() {
        let mut viewer = QueryLogViewer::new("");
        assert!(viewer.is_empty());
        assert_eq!(viewer.header(), "SQL Queries");
        viewer.toggle();
        assert_eq!(viewer.render(), format!("SQL Queries\n{}", EMPTY_MESSAGE));
    }

    #[test]
    fn zero_duration_is_hidden() {
        let store = QueryLogStore::new();
        store.append("SELECT 1", "Test", Some(0));
        let mut viewer = QueryLogViewer::new(&store);
        viewer.toggle();
        assert_eq!(viewer.rows()[0].duration, None);
        assert!(!viewer.render().contains("0ms"));
    }

    #[test]
    fn refresh_keeps_expansion() {
        let store = QueryLogStore::new();
        let mut viewer = QueryLogViewer::new(&store);
        viewer.toggle();

        store.append("SELECT 1", "Test", None);
        viewer.refresh(&store);
        assert!(viewer.is_expanded());
        assert_eq!(viewer.rows().len(), 1);
    }
}
