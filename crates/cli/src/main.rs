//! # mtee
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与命令行覆盖
//! - 日志与指标初始化（仅 stderr；stdout 承载数据）
//! - 运行 tee 并在结束后立即退出

mod cli;
mod commands;

use std::future::Future;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Runtime;
use tracing::info;

use cli::Cli;
use config_loader::TeeSettings;
use commands::{log_level, resolve_settings, run_tee};

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    block_then_detach(runtime, run(cli, settings))
}

async fn run(cli: Cli, settings: TeeSettings) -> Result<()> {
    observability::init_with_config(observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: settings.metrics_port,
        default_log_level: log_level(&cli, &settings),
    })?;

    info!(version = env!("CARGO_PKG_VERSION"), "mtee starting");

    run_tee(&cli, &settings).await
}

/// Drive `future` to completion, then drop the runtime without joining
/// blocking threads
///
/// A stdin read parked on a blocking thread cannot be cancelled.
fn block_then_detach<F: Future>(runtime: Runtime, future: F) -> F::Output {
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    output
}
