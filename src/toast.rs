use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
}

/// A transient user-facing notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub variant: ToastVariant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Toast {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Toast {
            title: title.into(),
            description: Some(description.into()),
            variant: ToastVariant::Default,
            duration_ms: None,
        }
    }

    /// A destructive toast with the generic `Error` title
    pub fn error(description: impl Into<String>) -> Self {
        Toast {
            title: "Error".to_string(),
            description: Some(description.into()),
            variant: ToastVariant::Destructive,
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == ToastVariant::Destructive
    }
}

/// Anything that can present toasts to the user
pub trait Toaster: Send + Sync {
    fn show(&self, toast: Toast);
}

/// Writes toasts to the log; used by the headless binary
pub struct LogToaster;

impl Toaster for LogToaster {
    fn show(&self, toast: Toast) {
        let description = toast.description.as_deref().unwrap_or("");
        match toast.variant {
            ToastVariant::Default => log::info!("{}: {}", toast.title, description),
            ToastVariant::Destructive => log::warn!("{}: {}", toast.title, description),
        }
    }
}

/// Keeps every toast shown, in order
#[derive(Default)]
pub struct ToastLog {
    toasts: Mutex<Vec<Toast>>,
}

impl ToastLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Toaster for ToastLog {
    fn show(&self, toast: Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }
}
