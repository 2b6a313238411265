use crate::engine::types::ScanResult;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionErrorKind {
    #[error("无法启动: {0}")]
    Launch(String),
    #[error("非零退出, 状态码 {0:?}")]
    NonZeroExit(Option<i32>),
    #[error("执行超时 ({0:?})")]
    Timeout(Duration),
}

/// Failure of a single external engine invocation.
///
/// `output` holds whatever the process wrote before failing (stdout, then stderr).
#[derive(Debug, Clone, Error)]
#[error("执行 {binary:?} 失败: {kind}")]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub binary: PathBuf,
    pub output: String,
}

impl ExecutionError {
    pub fn launch(binary: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            kind: ExecutionErrorKind::Launch(reason.into()),
            binary: binary.into(),
            output: String::new(),
        }
    }

    pub fn non_zero_exit(binary: impl Into<PathBuf>, status: Option<i32>, output: String) -> Self {
        Self {
            kind: ExecutionErrorKind::NonZeroExit(status),
            binary: binary.into(),
            output,
        }
    }

    pub fn timeout(binary: impl Into<PathBuf>, after: Duration) -> Self {
        Self {
            kind: ExecutionErrorKind::Timeout(after),
            binary: binary.into(),
            output: String::new(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ExecutionErrorKind::Timeout(_))
    }

    pub fn exit_status(&self) -> Option<i32> {
        match self.kind {
            ExecutionErrorKind::NonZeroExit(status) => status,
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// A threat was confirmed but a follow-up call failed. The detection is kept.
    #[error("已检测到威胁, 但后续调用失败: {source}")]
    PartialFailure {
        result: ScanResult,
        #[source]
        source: ExecutionError,
    },

    #[error("引擎 {engine} 不支持操作 {operation}")]
    Unsupported {
        engine: String,
        operation: &'static str,
    },

    #[error(transparent)]
    Platform(anyhow::Error),
}

impl EngineError {
    pub fn unsupported(engine: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            engine: engine.into(),
            operation,
        }
    }

    pub fn platform<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Platform(anyhow::Error::new(err))
    }

    /// The detection that survived a failed follow-up call, if any.
    pub fn partial_result(&self) -> Option<&ScanResult> {
        match self {
            Self::PartialFailure { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn execution(&self) -> Option<&ExecutionError> {
        match self {
            Self::Execution(err) => Some(err),
            Self::PartialFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}
