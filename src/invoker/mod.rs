use crate::engine::ExecutionError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs one external program and hands back its stdout.
///
/// Implementations hold no per-call state; concurrency control over the
/// engine behind the binary belongs to the adapter.
#[async_trait]
pub trait ProcessInvoker: Send + Sync {
    async fn run(&self, binary: &Path, args: &[String]) -> Result<String, ExecutionError>;
}

#[derive(Debug, Clone)]
pub struct SystemInvoker {
    timeout: Duration,
}

impl SystemInvoker {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SystemInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessInvoker for SystemInvoker {
    async fn run(&self, binary: &Path, args: &[String]) -> Result<String, ExecutionError> {
        let start = Instant::now();
        log::debug!("执行外部程序: {:?} {:?}", binary, args);

        // kill_on_drop reaps the child when the timeout drops the wait future
        let child = Command::new(binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::launch(binary, e.to_string()))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| ExecutionError::launch(binary, e.to_string()))?,
            Err(_) => {
                log::warn!("外部程序执行超时: {:?} ({:?})", binary, self.timeout);
                return Err(ExecutionError::timeout(binary, self.timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        log::debug!(
            "外部程序结束: {:?}, 状态: {}, 耗时: {:.3}秒",
            binary,
            output.status,
            start.elapsed().as_secs_f64()
        );

        if !output.status.success() {
            let mut combined = stdout;
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(ExecutionError::non_zero_exit(
                binary,
                output.status.code(),
                combined,
            ));
        }

        Ok(stdout)
    }
}
