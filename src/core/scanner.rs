use crate::core::layout::{DATA_EXT, DESIGNATOR_EXT};
use crate::error::BackupResult;
use crate::storage::{self, FileInfo};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 主目录下的一个程序目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDir {
    pub name: String,
    pub path: PathBuf,
}

/// 文件扫描器配置
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 标识文件扩展名（不含点，忽略大小写）
    pub designator_extension: String,
    /// 数据库文件扩展名
    pub data_extension: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            designator_extension: DESIGNATOR_EXT.to_string(),
            data_extension: DATA_EXT.to_string(),
        }
    }
}

/// 文件扫描器
///
/// 只做单层列举，结果按文件名排序，保证多次运行顺序一致。
#[derive(Debug, Clone, Default)]
pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// 列出主根目录下的程序目录，跳过普通文件
    pub fn program_dirs(&self, master_root: &Path) -> BackupResult<Vec<ProgramDir>> {
        let entries = storage::list_dir(master_root)?;
        let total = entries.len();

        let programs: Vec<ProgramDir> = entries
            .into_iter()
            .filter(|e| {
                if !e.is_dir {
                    debug!("跳过非目录条目: {:?}", e.path);
                }
                e.is_dir
            })
            .map(|e| ProgramDir {
                name: e.file_name().map(str::to_string).unwrap_or_default(),
                path: e.path,
            })
            .collect();

        info!(
            "扫描完成: {} 个条目, {} 个程序目录",
            total,
            programs.len()
        );
        Ok(programs)
    }

    /// 列出 MASTER 目录中的标识文件
    pub fn designators(&self, master_dir: &Path) -> BackupResult<Vec<FileInfo>> {
        self.files_with_extension(master_dir, &self.config.designator_extension)
    }

    /// 列出 Data 目录中的数据库文件
    pub fn data_files(&self, data_dir: &Path) -> BackupResult<Vec<FileInfo>> {
        self.files_with_extension(data_dir, &self.config.data_extension)
    }

    fn files_with_extension(&self, dir: &Path, ext: &str) -> BackupResult<Vec<FileInfo>> {
        Ok(storage::list_dir(dir)?
            .into_iter()
            .filter(|f| !f.is_dir && f.has_extension(ext))
            .collect())
    }
}
