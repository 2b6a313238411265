use crate::engine::dialect::{
    CliDialect, FIELD_DATABASE_DATE, FIELD_DATABASE_RECORDS, FIELD_DATABASE_STATE,
    FIELD_DETECTION, FIELD_LAST_UPDATE_DATE, FIELD_VERSION, KAV4FS_BINARY, KAV4FS_V8,
};
use crate::engine::{DatabaseVersion, Engine, EngineError, ExecutionError, ScanResult};
use crate::invoker::ProcessInvoker;
use crate::parser::OutputGrammar;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// What `GetDatabaseVersion` does when the engine invocation itself fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseFailurePolicy {
    /// Return the execution error.
    #[default]
    Surface,
    /// Return an all-empty record and log a warning.
    Degrade,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    binary_path: PathBuf,
    dialect: CliDialect,
    database_failure: DatabaseFailurePolicy,
}

impl EngineConfig {
    pub fn new(binary_path: impl Into<PathBuf>, dialect: CliDialect) -> Self {
        Self {
            binary_path: binary_path.into(),
            dialect,
            database_failure: DatabaseFailurePolicy::default(),
        }
    }

    pub fn kaspersky() -> Self {
        Self::new(KAV4FS_BINARY, KAV4FS_V8)
    }

    pub fn with_database_failure(mut self, policy: DatabaseFailurePolicy) -> Self {
        self.database_failure = policy;
        self
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn dialect(&self) -> &CliDialect {
        &self.dialect
    }

    pub fn database_failure(&self) -> DatabaseFailurePolicy {
        self.database_failure
    }
}

/// Adapter for an engine driven through its control utility.
///
/// The engine keeps scan statistics outside this process. `scan_file` holds
/// `engine_state` for writing across the whole scan, reset and lookup
/// sequence; version queries take it for reading.
pub struct CliEngine {
    config: EngineConfig,
    invoker: Arc<dyn ProcessInvoker>,
    engine_state: RwLock<()>,
}

impl CliEngine {
    pub fn new(config: EngineConfig, invoker: Arc<dyn ProcessInvoker>) -> Self {
        Self {
            config,
            invoker,
            engine_state: RwLock::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn invoke(&self, args: &[String]) -> Result<String, ExecutionError> {
        self.invoker.run(&self.config.binary_path, args).await
    }
}

#[async_trait]
impl Engine for CliEngine {
    fn name(&self) -> &str {
        self.config.dialect.engine
    }

    async fn get_version(&self) -> Result<String, EngineError> {
        let _state = self.engine_state.read().await;
        let invocation = &self.config.dialect.program_version;

        let out = self.invoke(&invocation.args()).await?;
        let version = invocation.grammar.parse(&out).take(FIELD_VERSION);
        if version.is_empty() {
            log::warn!("{}: 输出中未找到版本信息", self.name());
        }
        Ok(version)
    }

    async fn get_database_version(&self) -> Result<DatabaseVersion, EngineError> {
        let invocation = match &self.config.dialect.database_version {
            Some(invocation) => invocation,
            None => return Err(EngineError::unsupported(self.name(), "GetDatabaseVersion")),
        };

        let _state = self.engine_state.read().await;
        let out = match self.invoke(&invocation.args()).await {
            Ok(out) => out,
            Err(e) => match self.config.database_failure {
                DatabaseFailurePolicy::Surface => return Err(e.into()),
                DatabaseFailurePolicy::Degrade => {
                    log::warn!("{}: 病毒库版本查询失败, 返回空记录: {}", self.name(), e);
                    return Ok(DatabaseVersion::default());
                }
            },
        };

        let mut parsed = invocation.grammar.parse(&out);
        Ok(DatabaseVersion {
            database_date: parsed.take(FIELD_DATABASE_DATE),
            last_update_date: parsed.take(FIELD_LAST_UPDATE_DATE),
            database_state: parsed.take(FIELD_DATABASE_STATE),
            database_record_count: parsed.take(FIELD_DATABASE_RECORDS),
        })
    }

    async fn scan_file(&self, path: &Path) -> Result<ScanResult, EngineError> {
        let dialect = &self.config.dialect;
        let _state = self.engine_state.write().await;

        let out = self
            .invoke(&dialect.scan_args(&path.to_string_lossy()))
            .await?;

        if !OutputGrammar::matches_line(&out, dialect.threat_marker) {
            log::debug!("{}: {:?} 未发现威胁", self.name(), path);
            return Ok(ScanResult::clean());
        }

        // Statistics accumulate across invocations until cleared.
        let reset_error = match dialect.reset_args() {
            Some(args) => self.invoke(&args).await.err(),
            None => None,
        };
        if let Some(e) = &reset_error {
            log::warn!("{}: 清除扫描统计失败: {}", self.name(), e);
        }

        let (label, lookup_error) = match self.invoke(&dialect.detection.args()).await {
            Ok(out) => {
                let label = dialect.detection.grammar.parse(&out).take(FIELD_DETECTION);
                if label.is_empty() {
                    log::warn!("{}: 无法从输出中解析病毒名称", self.name());
                }
                (label, None)
            }
            Err(e) => {
                log::warn!("{}: 查询病毒名称失败: {}", self.name(), e);
                (String::new(), Some(e))
            }
        };

        log::info!("{}: {:?} 发现威胁: {}", self.name(), path, label);
        let result = ScanResult {
            infected: true,
            output: label,
        };

        match reset_error.or(lookup_error) {
            None => Ok(result),
            Some(source) => Err(EngineError::PartialFailure { result, source }),
        }
    }
}
