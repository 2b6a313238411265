use crate::engine::{Engine, EngineError, ScanResult};
use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformVerdict {
    pub infected: bool,
    pub threat_name: String,
}

/// A scanning API provided by the host platform instead of a CLI.
#[async_trait]
pub trait PlatformScanApi: Send + Sync {
    async fn product_version(&self) -> Result<String, EngineError>;

    async fn scan(&self, path: &Path) -> Result<PlatformVerdict, EngineError>;
}

/// Adapter over a [`PlatformScanApi`]. Verdicts map straight through and
/// errors from the platform are returned as they are.
pub struct NativeEngine<A> {
    name: String,
    api: A,
}

impl<A: PlatformScanApi> NativeEngine<A> {
    pub fn new(name: impl Into<String>, api: A) -> Self {
        Self {
            name: name.into(),
            api,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

#[async_trait]
impl<A: PlatformScanApi> Engine for NativeEngine<A> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_version(&self) -> Result<String, EngineError> {
        self.api.product_version().await
    }

    async fn scan_file(&self, path: &Path) -> Result<ScanResult, EngineError> {
        let verdict = self.api.scan(path).await?;
        Ok(ScanResult {
            infected: verdict.infected,
            output: verdict.threat_name,
        })
    }
}
