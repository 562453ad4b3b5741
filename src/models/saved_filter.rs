use serde::{Deserialize, Serialize};

/// A named filter preset for one screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFilter {
    pub id: String,
    pub screen: String,
    pub name: String,
    pub template: String,
    pub args: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSavedFilter {
    pub screen: String,
    pub name: String,
    pub template: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSavedFilter {
    pub id: String,
    pub name: Option<String>,
    pub template: Option<String>,
    pub args: Option<Vec<String>>,
}
