//! 本地文件系统操作
//!
//! 同步实现，所有 IO 错误都带上出错路径转换为 [`BackupError`]。

use super::{FileInfo, FileMeta};
use crate::error::{BackupError, BackupResult};
use filetime::FileTime;
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

/// 从元数据中取修改时间（Unix 秒，早于 1970 的时间为负数）
pub fn modified_time(metadata: &Metadata) -> i64 {
    FileTime::from_last_modification_time(metadata).unix_seconds()
}

/// 获取文件元数据，不存在时返回 `None`
pub fn stat(path: &Path) -> BackupResult<Option<FileMeta>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(FileMeta {
            modified_time: modified_time(&metadata),
            is_dir: metadata.is_dir(),
        })),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BackupError::Metadata {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// 单层列举结果
#[derive(Debug, Default)]
pub struct Listing {
    pub entries: Vec<FileInfo>,
    /// 无法读取的条目（悬空链接、元数据读取失败等）
    pub unreadable: Vec<BackupError>,
}

/// 列出目录下一层的条目，按文件名排序，无法读取的条目单独返回
///
/// 目录本身无法读取时返回错误。
pub fn read_dir_entries(dir: &Path) -> BackupResult<Listing> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    let mut listing = Listing::default();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                return Err(BackupError::ListDir {
                    path: dir.to_path_buf(),
                    source: e.into(),
                });
            }
            Err(e) => {
                listing.unreadable.push(entry_error(dir, e));
                continue;
            }
        };

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                listing.unreadable.push(entry_error(dir, e));
                continue;
            }
        };

        listing.entries.push(FileInfo {
            modified_time: modified_time(&metadata),
            is_dir: metadata.is_dir(),
            path: entry.into_path(),
        });
    }

    Ok(listing)
}

/// 列出目录下一层的条目，无法读取的条目只记录警告并跳过
pub fn list_dir(dir: &Path) -> BackupResult<Vec<FileInfo>> {
    let listing = read_dir_entries(dir)?;
    for e in &listing.unreadable {
        warn!("跳过无法读取的条目: {}", e);
    }
    Ok(listing.entries)
}

fn entry_error(dir: &Path, e: walkdir::Error) -> BackupError {
    let path = e
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.to_path_buf());
    BackupError::Metadata {
        path,
        source: e.into(),
    }
}

/// 递归删除文件或目录
///
/// 返回 `Ok(true)` 表示已删除，`Ok(false)` 表示目标本来就不存在。
pub fn remove_all(path: &Path) -> BackupResult<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(BackupError::Remove {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BackupError::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
