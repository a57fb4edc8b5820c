//! # rex
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 输出目标解析与配置加载
//! - 标准输入读取与扇出写入
//! - 信号处理与退出码映射

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::{error, info};

use cli::Cli;
use commands::{run_check, run_pipeline};

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let code = match run(&cli).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {e:#}");
            error::exit_code(&e)
        }
    };

    // Exit right away: a stdin read abandoned by an interrupt would otherwise
    // keep the runtime from shutting down.
    std::process::exit(i32::from(code));
}

async fn run(cli: &Cli) -> Result<()> {
    init_observability(cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "rex starting");

    if cli.check {
        run_check(cli)
    } else {
        run_pipeline(cli).await
    }
}

/// Initialize logging and metrics based on CLI options
fn init_observability(cli: &Cli) -> Result<()> {
    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: (cli.metrics_port != 0).then_some(cli.metrics_port),
        default_log_level: ObservabilityConfig::level_for(cli.verbose, cli.quiet).to_string(),
    })
}
