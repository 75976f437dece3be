pub mod local;

use std::path::PathBuf;

pub use local::{list_dir, read_dir_entries, remove_all, stat, Listing};

/// 文件信息
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    /// 修改时间（Unix 秒）
    pub modified_time: i64,
    pub is_dir: bool,
}

impl FileInfo {
    /// 文件名（不含目录）
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// 扩展名是否匹配（忽略大小写）
    pub fn has_extension(&self, ext: &str) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(false)
    }
}

/// 文件元数据（用于快速检查）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub modified_time: i64,
    pub is_dir: bool,
}
