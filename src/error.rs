//! 错误类型

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 备份操作的结果类型
pub type BackupResult<T> = Result<T, BackupError>;

/// 备份过程中可能出现的错误
///
/// 单个程序目录的错误由引擎记录后跳过，不会中断整次运行。
#[derive(Debug, Error)]
pub enum BackupError {
    /// 无法列出目录
    #[error("无法读取目录 {path:?}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 无法读取文件元数据
    #[error("无法读取元数据 {path:?}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 无法创建目录
    #[error("无法创建目录 {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 单个文件复制失败
    #[error("复制失败 {from:?} -> {to:?}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 目录复制中有文件失败
    #[error("目录复制未完成 {from:?} -> {to:?}: {failed} 个文件失败")]
    PartialCopy {
        from: PathBuf,
        to: PathBuf,
        failed: usize,
    },

    /// 删除失败
    #[error("删除失败 {path:?}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 报告写入失败
    #[error("写入报告失败 {path:?}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}
