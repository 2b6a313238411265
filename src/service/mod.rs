use crate::engine::{Engine, EngineError, EngineVersionInfo};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFileRequest {
    pub file_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub infected: bool,
    pub output: String,
}

/// Dispatch boundary between the transport and the one engine this process serves.
///
/// Adapter errors are returned untouched, including `PartialFailure`, which
/// still carries the detection.
#[derive(Clone)]
pub struct ScannerService {
    engine: Arc<dyn Engine>,
}

impl ScannerService {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub async fn get_version(&self, _request: VersionRequest) -> Result<VersionResponse, EngineError> {
        log::debug!("{}: GetVersion", self.engine_name());
        let version = self.engine.get_version().await.map_err(|e| {
            log::error!("{}: 获取版本失败: {}", self.engine_name(), e);
            e
        })?;
        Ok(VersionResponse { version })
    }

    pub async fn scan_file(&self, request: ScanFileRequest) -> Result<ScanResponse, EngineError> {
        log::info!("{}: 扫描文件 {}", self.engine_name(), request.file_path);
        let result = self
            .engine
            .scan_file(Path::new(&request.file_path))
            .await
            .map_err(|e| {
                log::error!("{}: 扫描 {} 失败: {}", self.engine_name(), request.file_path, e);
                e
            })?;
        Ok(ScanResponse {
            infected: result.infected,
            output: result.output,
        })
    }

    pub async fn get_database_version(&self) -> Result<EngineVersionInfo, EngineError> {
        log::debug!("{}: GetDatabaseVersion", self.engine_name());
        self.engine.version_info().await
    }
}
