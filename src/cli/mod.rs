use crate::config::ServiceConfig;
use crate::core::EngineHost;
use crate::engine::EngineError;
use crate::service::{ScanFileRequest, VersionRequest};
use crate::utils::{format_duration, Logger};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "multiav")]
#[command(author = "Security Team")]
#[command(version)]
#[command(about = "第三方杀毒引擎统一扫描服务", long_about = None)]
pub struct Command {
    #[command(subcommand)]
    pub subcommand: SubCommands,
    #[arg(short, long, global = true, help = "指定配置文件路径")]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "显示详细输出")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum SubCommands {
    #[command(name = "serve", about = "启动扫描服务")]
    Serve(ServeArgs),
    #[command(name = "scan", about = "使用引擎扫描单个文件")]
    Scan(ScanArgs),
    #[command(name = "version", about = "查看引擎版本")]
    Version(VersionArgs),
    #[command(name = "init-config", about = "生成默认配置文件")]
    InitConfig(InitConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, short = 'l', help = "监听地址, 覆盖配置文件")]
    pub listen: Option<String>,
}

#[derive(Args)]
pub struct ScanArgs {
    #[arg(help = "待扫描文件路径")]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct VersionArgs {
    #[arg(long, short = 'd', help = "同时显示病毒库信息")]
    pub database: bool,
}

#[derive(Args)]
pub struct InitConfigArgs {
    #[arg(long, short = 'o', help = "输出路径")]
    pub output: Option<PathBuf>,
}

impl Command {
    pub fn build() -> Self {
        Command::parse()
    }

    pub async fn execute(matches: &Command) -> Result<()> {
        let config_path = matches
            .config
            .clone()
            .unwrap_or_else(ServiceConfig::default_path);

        if let SubCommands::InitConfig(args) = &matches.subcommand {
            return Self::handle_init_config(args, &config_path);
        }

        let config = ServiceConfig::load(&config_path)
            .with_context(|| format!("无法加载配置文件: {:?}", config_path))?;

        let level = if matches.verbose {
            LevelFilter::Debug
        } else {
            Logger::get_level_filter(&config.logging.level)
        };
        if let Err(e) = Logger::init(config.logging.log_dir.as_deref(), level) {
            Logger::init(None, level)?;
            log::warn!("文件日志不可用, 仅输出到控制台: {:#}", e);
        }

        let host = EngineHost::new(config)?;

        match &matches.subcommand {
            SubCommands::Serve(args) => Self::handle_serve(args, &host).await,
            SubCommands::Scan(args) => Self::handle_scan(args, &host).await,
            SubCommands::Version(args) => Self::handle_version(args, &host).await,
            SubCommands::InitConfig(_) => Ok(()),
        }
    }

    #[cfg(feature = "api")]
    async fn handle_serve(args: &ServeArgs, host: &EngineHost) -> Result<()> {
        host.serve(args.listen.as_deref()).await
    }

    #[cfg(not(feature = "api"))]
    async fn handle_serve(_args: &ServeArgs, _host: &EngineHost) -> Result<()> {
        Err(anyhow::anyhow!("当前构建未启用 api 功能, 无法启动扫描服务"))
    }

    async fn handle_scan(args: &ScanArgs, host: &EngineHost) -> Result<()> {
        let start_time = Instant::now();
        let request = ScanFileRequest {
            file_path: args.file.to_string_lossy().into_owned(),
        };

        let response = match host.service().scan_file(request).await {
            Ok(response) => response,
            Err(EngineError::PartialFailure { result, source }) => {
                eprintln!("警告: {}", source);
                crate::service::ScanResponse {
                    infected: result.infected,
                    output: result.output,
                }
            }
            Err(e) => return Err(e.into()),
        };

        println!("文件: {:?}", args.file);
        if response.infected {
            println!("结果: 发现威胁");
            println!("病毒名称: {}", response.output);
        } else {
            println!("结果: 未发现威胁");
        }
        println!("扫描耗时: {}", format_duration(start_time.elapsed()));

        Ok(())
    }

    async fn handle_version(args: &VersionArgs, host: &EngineHost) -> Result<()> {
        let service = host.service();

        if !args.database {
            let response = service.get_version(VersionRequest::default()).await?;
            println!("{}: {}", service.engine_name(), response.version);
            return Ok(());
        }

        let info = service.get_database_version().await?;
        println!("引擎: {}", service.engine_name());
        println!("程序版本: {}", info.program_version);
        match info.database {
            Some(db) => {
                println!("病毒库日期: {}", db.database_date);
                println!("最后更新: {}", db.last_update_date);
                println!("病毒库状态: {}", db.database_state);
                println!("记录数: {}", db.database_record_count);
            }
            None => println!("该引擎不提供病毒库信息"),
        }

        Ok(())
    }

    fn handle_init_config(args: &InitConfigArgs, config_path: &Path) -> Result<()> {
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| config_path.to_path_buf());
        ServiceConfig::default()
            .save(&output)
            .with_context(|| format!("无法写入配置文件: {:?}", output))?;
        println!("配置文件已生成: {:?}", output);
        Ok(())
    }
}
