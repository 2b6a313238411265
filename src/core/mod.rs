use crate::config::{EngineKind, EngineSettings, ServiceConfig};
use crate::engine::{CliEngine, Engine, EngineConfig, KAV4FS_V8};
use crate::invoker::SystemInvoker;
use crate::service::ScannerService;
use anyhow::Result;
use std::sync::Arc;

/// One engine adapter process: the configured engine and the service in front of it.
pub struct EngineHost {
    config: ServiceConfig,
    service: ScannerService,
}

impl EngineHost {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let engine = Self::build_engine(&config.engine)?;
        log::info!(
            "引擎已加载: {} ({:?})",
            engine.name(),
            config.engine.binary_path
        );

        Ok(Self {
            service: ScannerService::new(engine),
            config,
        })
    }

    pub fn build_engine(settings: &EngineSettings) -> Result<Arc<dyn Engine>> {
        let timeout = settings.timeout()?;
        let invoker = Arc::new(SystemInvoker::with_timeout(timeout));

        let engine: Arc<dyn Engine> = match settings.kind {
            EngineKind::Kaspersky => {
                let config = EngineConfig::new(&settings.binary_path, KAV4FS_V8)
                    .with_database_failure(settings.database_failure);
                Arc::new(CliEngine::new(config, invoker))
            }
        };

        Ok(engine)
    }

    pub fn service(&self) -> &ScannerService {
        &self.service
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Serves the transport until ctrl-c.
    #[cfg(feature = "api")]
    pub async fn serve(&self, listen_addr: Option<&str>) -> Result<()> {
        use crate::api::ApiServer;
        use anyhow::Context;

        let addr = listen_addr.unwrap_or(&self.config.api.listen_addr);
        let addr: std::net::SocketAddr = addr
            .parse()
            .with_context(|| format!("无效的监听地址: {}", addr))?;

        let server = ApiServer::new(
            addr,
            self.config.api.api_key.clone(),
            self.config.api.max_message_size,
        );

        log::info!("启动 {} 扫描服务", self.service.engine_name());

        tokio::select! {
            result = server.start(self.service.clone()) => result?,
            _ = tokio::signal::ctrl_c() => {
                log::info!("收到终止信号，正在关闭...");
            }
        }

        Ok(())
    }
}
