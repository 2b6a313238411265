pub mod cli;
pub mod dialect;
mod error;
pub mod native;
mod types;

pub use cli::{CliEngine, DatabaseFailurePolicy, EngineConfig};
pub use dialect::{CliDialect, Invocation, KAV4FS_BINARY, KAV4FS_V8};
pub use error::{EngineError, ExecutionError, ExecutionErrorKind};
pub use native::{NativeEngine, PlatformScanApi, PlatformVerdict};
pub use types::{DatabaseVersion, EngineVersionInfo, ScanResult};

use async_trait::async_trait;
use std::path::Path;

/// One integrated antivirus engine.
///
/// A running service binds exactly one engine; engines are never multiplexed
/// inside one process.
#[async_trait]
pub trait Engine: Send + Sync {
    fn name(&self) -> &str;

    async fn get_version(&self) -> Result<String, EngineError>;

    async fn get_database_version(&self) -> Result<DatabaseVersion, EngineError> {
        Err(EngineError::unsupported(self.name(), "GetDatabaseVersion"))
    }

    async fn scan_file(&self, path: &Path) -> Result<ScanResult, EngineError>;

    async fn version_info(&self) -> Result<EngineVersionInfo, EngineError> {
        let program_version = self.get_version().await?;
        let database = match self.get_database_version().await {
            Ok(database) => Some(database),
            Err(EngineError::Unsupported { .. }) => None,
            Err(e) => return Err(e),
        };
        Ok(EngineVersionInfo {
            program_version,
            database,
        })
    }
}
