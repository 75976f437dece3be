//! 目录复制
//!
//! 只复制源目录第一层的普通文件（不递归子目录），目标已有且不旧于源的文件跳过，
//! 复制后保留源文件的修改时间。

use crate::error::{BackupError, BackupResult};
use crate::storage::{self, FileInfo};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// 一次目录复制的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOutcome {
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CopyOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// 浅复制目录，目标不存在时自动创建
///
/// 源目录无法读取或目标目录无法创建时返回错误；单个文件失败（包括无法读取的条目）
/// 计入 `failed`。
pub fn copy_directory(source: &Path, dest: &Path) -> BackupResult<CopyOutcome> {
    let listing = storage::read_dir_entries(source)?;

    fs::create_dir_all(dest).map_err(|e| BackupError::CreateDir {
        path: dest.to_path_buf(),
        source: e,
    })?;

    let mut outcome = CopyOutcome::default();
    for e in &listing.unreadable {
        warn!("无法读取，未复制: {}", e);
        outcome.failed += 1;
    }

    for entry in listing.entries.iter().filter(|e| !e.is_dir) {
        let Some(name) = entry.path.file_name() else {
            continue;
        };
        let target = dest.join(name);

        match copy_if_newer(entry, &target) {
            Ok(true) => outcome.copied += 1,
            Ok(false) => outcome.skipped += 1,
            Err(e) => {
                warn!("{}", e);
                outcome.failed += 1;
            }
        }
    }

    info!(
        "复制 {:?} -> {:?}: 复制 {} 个, 跳过 {} 个, 失败 {} 个",
        source, dest, outcome.copied, outcome.skipped, outcome.failed
    );
    Ok(outcome)
}

/// 目标不存在或比源旧时复制，返回是否实际复制
fn copy_if_newer(source: &FileInfo, target: &Path) -> BackupResult<bool> {
    let copy_err = |e: io::Error| BackupError::Copy {
        from: source.path.clone(),
        to: target.to_path_buf(),
        source: e,
    };

    if let Some(existing) = storage::stat(target)? {
        if existing.is_dir {
            return Err(copy_err(io::Error::other("目标是目录")));
        }
        if existing.modified_time >= source.modified_time {
            debug!("目标不旧于源，跳过: {:?}", target);
            return Ok(false);
        }
        clear_readonly(target).map_err(copy_err)?;
    }

    fs::copy(&source.path, target).map_err(copy_err)?;

    let metadata = fs::metadata(&source.path).map_err(copy_err)?;
    filetime::set_file_times(
        target,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
    .map_err(copy_err)?;

    debug!("已复制: {:?}", target);
    Ok(true)
}

/// 去掉目标文件的只读属性以便覆盖
fn clear_readonly(path: &Path) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    if !permissions.readonly() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        permissions.set_readonly(false);
    }

    fs::set_permissions(path, permissions)
}
