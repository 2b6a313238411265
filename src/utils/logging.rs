use anyhow::Context;
use chrono::Local;
use fern::Dispatch;
use log::LevelFilter;
use std::path::Path;

pub struct Logger;

impl Logger {
    /// Installs the global logger. Console output goes to stderr so that
    /// command results on stdout stay clean.
    pub fn init(log_dir: Option<&Path>, level: LevelFilter) -> Result<(), anyhow::Error> {
        let mut dispatcher = Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{}][{}][{}] {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(level)
            .chain(std::io::stderr());

        if let Some(log_dir) = log_dir {
            std::fs::create_dir_all(log_dir)
                .with_context(|| format!("无法创建日志目录: {:?}", log_dir))?;
            let log_file = log_dir.join(format!("multiav_{}.log", Local::now().format("%Y%m%d")));
            dispatcher = dispatcher.chain(
                fern::log_file(&log_file).context(format!("无法创建日志文件: {:?}", log_file))?,
            );
        }

        dispatcher.apply()?;

        log::debug!("日志系统已初始化, 级别: {}", level);
        Ok(())
    }

    pub fn get_level_filter(level: &str) -> LevelFilter {
        match level.to_uppercase().as_str() {
            "DEBUG" => LevelFilter::Debug,
            "INFO" => LevelFilter::Info,
            "WARN" => LevelFilter::Warn,
            "ERROR" => LevelFilter::Error,
            "TRACE" => LevelFilter::Trace,
            "OFF" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }
}
