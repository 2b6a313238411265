use anyhow::Result;
use multiav::cli::Command;
use std::process;

#[tokio::main]
async fn main() -> Result<()> {
    let command = Command::build();

    match Command::execute(&command).await {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("执行错误: {:#}", e);
            eprintln!("错误: {:#}", e);
            process::exit(1);
        }
    }
}
