//! 主目录与备份目录之间的路径映射
//!
//! 纯字符串变换，不访问文件系统。根目录前缀按路径分段匹配，
//! `/Users/foo` 不会匹配到 `/Users/foobar`。

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// 路径映射器
#[derive(Debug, Clone)]
pub struct PathMapper {
    master_root: String,
    backup_root: String,
}

impl PathMapper {
    pub fn new(master_root: impl AsRef<Path>, backup_root: impl AsRef<Path>) -> Self {
        Self {
            master_root: normalize_root(&master_root.as_ref().to_string_lossy()),
            backup_root: normalize_root(&backup_root.as_ref().to_string_lossy()),
        }
    }

    pub fn master_root(&self) -> &Path {
        Path::new(&self.master_root)
    }

    pub fn backup_root(&self) -> &Path {
        Path::new(&self.backup_root)
    }

    /// 主目录路径 -> 备份目录路径
    ///
    /// 不在主目录下的路径只做分隔符规范化，调用方需保证传入主目录下的路径。
    pub fn map_to_backup(&self, path: &Path) -> PathBuf {
        remap(path, &self.master_root, &self.backup_root)
    }

    /// 备份目录路径 -> 主目录路径
    pub fn map_to_master(&self, path: &Path) -> PathBuf {
        remap(path, &self.backup_root, &self.master_root)
    }
}

/// 统一路径分隔符为当前平台的分隔符
pub fn normalize_separators(path: &str) -> String {
    path.chars()
        .map(|c| if is_separator(c) { MAIN_SEPARATOR } else { c })
        .collect()
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// 规范化根目录：统一分隔符并去掉末尾分隔符（文件系统根 `/` 保留）
fn normalize_root(root: &str) -> String {
    let normalized = normalize_separators(root);
    let trimmed = normalized.trim_end_matches(MAIN_SEPARATOR);
    if trimmed.is_empty() && !normalized.is_empty() {
        MAIN_SEPARATOR.to_string()
    } else {
        trimmed.to_string()
    }
}

fn remap(path: &Path, from_root: &str, to_root: &str) -> PathBuf {
    let Some(raw) = path.to_str() else {
        // 非 UTF-8 路径按组件匹配
        return match path.strip_prefix(from_root) {
            Ok(rest) => Path::new(to_root).join(rest),
            Err(_) => path.to_path_buf(),
        };
    };

    let normalized = normalize_separators(raw);
    match strip_root(&normalized, from_root) {
        Some(rest) => PathBuf::from(join_root(to_root, rest)),
        None => PathBuf::from(normalized),
    }
}

/// 去掉根目录前缀，返回剩余的相对部分；不在根目录下时返回 `None`
fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    if root.is_empty() || path.len() < root.len() || !path.is_char_boundary(root.len()) {
        return None;
    }

    let (head, tail) = path.split_at(root.len());
    if !prefix_eq(head, root) {
        return None;
    }

    if tail.is_empty() || root.ends_with(MAIN_SEPARATOR) {
        return Some(tail.trim_start_matches(MAIN_SEPARATOR));
    }

    tail.strip_prefix(MAIN_SEPARATOR)
        .map(|rest| rest.trim_start_matches(MAIN_SEPARATOR))
}

fn prefix_eq(a: &str, b: &str) -> bool {
    if cfg!(windows) {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

fn join_root(root: &str, rest: &str) -> String {
    if rest.is_empty() {
        root.to_string()
    } else if root.ends_with(MAIN_SEPARATOR) {
        format!("{}{}", root, rest)
    } else {
        format!("{}{}{}", root, MAIN_SEPARATOR, rest)
    }
}
