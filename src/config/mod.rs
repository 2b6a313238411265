use crate::engine::{DatabaseFailurePolicy, KAV4FS_BINARY};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cap on transport request bodies.
pub const DEFAULT_MAX_MESSAGE_SIZE: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub engine: EngineSettings,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Kaspersky,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub kind: EngineKind,
    pub binary_path: PathBuf,
    /// Upper bound for each engine invocation, e.g. "90s" or "5m".
    pub timeout: String,
    pub database_failure: DatabaseFailurePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub listen_addr: String,
    pub api_key: Option<String>,
    pub max_message_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            kind: EngineKind::Kaspersky,
            binary_path: PathBuf::from(KAV4FS_BINARY),
            timeout: "5m".to_string(),
            database_failure: DatabaseFailurePolicy::Surface,
        }
    }
}

impl EngineSettings {
    pub fn timeout(&self) -> Result<Duration, anyhow::Error> {
        let timeout = humantime::parse_duration(&self.timeout)
            .with_context(|| format!("无效的超时时间: {}", self.timeout))?;
        if timeout.is_zero() {
            return Err(anyhow::anyhow!("超时时间必须大于0"));
        }
        Ok(timeout)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:50051".to_string(),
            api_key: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            log_dir: Some(PathBuf::from("/var/log/multiav")),
        }
    }
}

impl ServiceConfig {
    /// Reads the file when it exists, otherwise falls back to defaults.
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&content)?)
        } else {
            log::debug!("配置文件不存在, 使用默认配置: {:?}", path);
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), anyhow::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or(PathBuf::from("/etc"))
            .join("multiav")
            .join("config.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        let mut config = ServiceConfig::default();
        config.engine.timeout = "90s".to_string();
        config.engine.database_failure = DatabaseFailurePolicy::Degrade;
        config.api.api_key = Some("secret".to_string());
        config.save(&path).unwrap();

        let loaded = ServiceConfig::load(&path).unwrap();
        assert_eq!(loaded.engine.kind, EngineKind::Kaspersky);
        assert_eq!(loaded.engine.timeout().unwrap(), Duration::from_secs(90));
        assert_eq!(loaded.engine.database_failure, DatabaseFailurePolicy::Degrade);
        assert_eq!(loaded.api.api_key.as_deref(), Some("secret"));
        assert_eq!(loaded.api.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.yaml");

        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.engine.binary_path, PathBuf::from(KAV4FS_BINARY));
        assert_eq!(config.engine.timeout().unwrap(), Duration::from_secs(300));
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "engine:\n  binary_path: /usr/local/bin/kav4fs-control\n  database_failure: degrade\n";
        let config: ServiceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.engine.binary_path,
            PathBuf::from("/usr/local/bin/kav4fs-control")
        );
        assert_eq!(config.engine.database_failure, DatabaseFailurePolicy::Degrade);
        assert_eq!(config.engine.timeout, "5m");
        assert_eq!(config.api.listen_addr, "0.0.0.0:50051");
        assert_eq!(config.logging.level, "INFO");
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let mut settings = EngineSettings::default();
        settings.timeout = "soon".to_string();
        assert!(settings.timeout().is_err());

        settings.timeout = "0s".to_string();
        assert!(settings.timeout().is_err());
    }

    #[test]
    fn test_unknown_engine_rejected() {
        let yaml = "engine:\n  kind: mcafee\n";
        assert!(serde_yaml::from_str::<ServiceConfig>(yaml).is_err());
    }
}
