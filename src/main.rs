// 由计划任务启动，release 构建下不弹出控制台窗口
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use masterbackup_lib::config::{config_dir, AppConfig};
use masterbackup_lib::logging::{init_logging, LogConfig};
use masterbackup_lib::{ReportWriter, SyncEngine};
use std::process::ExitCode;
use tracing::{error, warn};

fn run() -> anyhow::Result<()> {
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            // 配置无效时仍按默认配置记录日志
            init_logging(&LogConfig::default(), &config_dir());
            error!("{}", e);
            return Err(e.into());
        }
    };
    init_logging(&config.log, &config_dir());

    let engine = SyncEngine::new(config.sync_config()?);
    let report = engine.run();

    if !report.errors.is_empty() {
        warn!("本次运行有 {} 个错误，详见上方日志", report.errors.len());
    }

    let writer = ReportWriter::new(config.backup_root()?);
    if let Err(e) = writer.write(&report) {
        error!("{}", e);
        return Err(e.into());
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
