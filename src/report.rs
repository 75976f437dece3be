//! 运行报告 `BackupInfo.txt`

use crate::core::layout::REPORT_FILE;
use crate::core::SyncReport;
use crate::error::{BackupError, BackupResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// 报告写入器，每次运行覆盖备份根目录下的报告文件
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(backup_root: &Path) -> Self {
        Self {
            path: backup_root.join(REPORT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 渲染报告内容
    pub fn render(report: &SyncReport) -> String {
        format!(
            "Directories Copied: {}\nDatabases Removed: {}\nElapsed Time: {}s\n",
            report.directories_copied,
            report.data_files_removed,
            report.elapsed.as_secs_f64()
        )
    }

    pub fn write(&self, report: &SyncReport) -> BackupResult<PathBuf> {
        fs::write(&self.path, Self::render(report)).map_err(|e| BackupError::Report {
            path: self.path.clone(),
            source: e,
        })?;
        info!("已写入报告: {:?}", self.path);
        Ok(self.path.clone())
    }
}
