use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub infected: bool,
    pub output: String,
}

impl ScanResult {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn infected(label: impl Into<String>) -> Self {
        Self {
            infected: true,
            output: label.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseVersion {
    pub database_date: String,
    pub last_update_date: String,
    pub database_state: String,
    pub database_record_count: String,
}

impl DatabaseVersion {
    pub fn is_empty(&self) -> bool {
        self.database_date.is_empty()
            && self.last_update_date.is_empty()
            && self.database_state.is_empty()
            && self.database_record_count.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineVersionInfo {
    pub program_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseVersion>,
}
