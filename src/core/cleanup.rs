//! 清理
//!
//! - 备份端：复制后删除程序目录下的辅助目录，节省服务器空间
//! - 主目录端：删除过期数据库文件及其同名文件夹

use crate::core::layout::{AUXILIARY_SUBPATHS, DATA_EXT, DATA_PREFIX};
use crate::error::{BackupError, BackupResult};
use crate::storage;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 单个辅助路径的清理结果
#[derive(Debug)]
pub struct PruneResult {
    pub path: PathBuf,
    /// `Ok(true)` 已删除，`Ok(false)` 原本不存在
    pub outcome: BackupResult<bool>,
}

/// 数据库文件删除结果
#[derive(Debug)]
pub struct DataRemoval {
    pub file: PathBuf,
    pub sibling: Option<PathBuf>,
    pub sibling_removed: bool,
    /// 同名文件夹删除失败的原因，数据库文件本身已删除
    pub sibling_error: Option<BackupError>,
}

/// 清理执行器
#[derive(Debug, Clone, Default)]
pub struct CleanupExecutor;

impl CleanupExecutor {
    pub fn new() -> Self {
        Self
    }

    /// 删除备份端程序目录下的 `MASTER/Data`、`WO`、`ARCHIVE`、`TEST`
    ///
    /// 各路径互不影响，不存在的路径视为成功。
    pub fn prune_backup_auxiliaries(&self, program_backup: &Path) -> Vec<PruneResult> {
        AUXILIARY_SUBPATHS
            .iter()
            .map(|parts| {
                let path = parts
                    .iter()
                    .fold(program_backup.to_path_buf(), |acc, part| acc.join(part));
                let outcome = storage::remove_all(&path);
                match &outcome {
                    Ok(true) => info!("已清理备份辅助目录: {:?}", path),
                    Ok(false) => debug!("辅助目录不存在: {:?}", path),
                    Err(e) => warn!("{}", e),
                }
                PruneResult { path, outcome }
            })
            .collect()
    }

    /// 删除过期数据库文件及其同名文件夹
    ///
    /// 文件删除失败返回错误；同名文件夹删除失败放在 `sibling_error` 中返回。
    pub fn remove_aged_data_file(&self, data_file: &Path) -> BackupResult<DataRemoval> {
        storage::remove_all(data_file)?;
        info!("已删除过期数据库: {:?}", data_file);

        let sibling = sibling_folder(data_file);
        let (sibling_removed, sibling_error) = match &sibling {
            Some(folder) => match storage::remove_all(folder) {
                Ok(removed) => (removed, None),
                Err(e) => {
                    warn!("{}", e);
                    (false, Some(e))
                }
            },
            None => (false, None),
        };

        Ok(DataRemoval {
            file: data_file.to_path_buf(),
            sibling,
            sibling_removed,
            sibling_error,
        })
    }
}

/// 数据库文件对应的文件夹：去掉文件名的 `Insp_` 前缀和 `.bak` 扩展名，目录不变
///
/// 推导结果为空或与文件本身相同时返回 `None`。
pub fn sibling_folder(data_file: &Path) -> Option<PathBuf> {
    let name = data_file.file_name()?.to_str()?;
    let stem = name.strip_prefix(DATA_PREFIX).unwrap_or(name);
    let stem = strip_extension(stem, DATA_EXT);

    if stem.is_empty() || stem == name {
        return None;
    }
    Some(data_file.with_file_name(stem))
}

fn strip_extension<'a>(name: &'a str, ext: &str) -> &'a str {
    match name.rsplit_once('.') {
        Some((stem, e)) if e.eq_ignore_ascii_case(ext) => stem,
        _ => name,
    }
}

/// 汇总清理失败的路径
pub fn prune_failures(results: Vec<PruneResult>) -> Vec<BackupError> {
    results
        .into_iter()
        .filter_map(|r| r.outcome.err())
        .collect()
}
