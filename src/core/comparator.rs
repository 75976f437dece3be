/// 默认宽限时间（秒）：主目录标识文件比备份新 2 小时以上才重新复制
pub const DEFAULT_GRACE_SECONDS: i64 = 7200;

/// 默认数据库保留时间（秒）：60 天
pub const DEFAULT_RETENTION_SECONDS: i64 = 60 * 24 * 60 * 60;

/// 针对单个标识文件的同步动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// 备份中不存在，首次复制（不清理）
    InitialCopy,
    /// 备份已过期，复制后清理备份端辅助目录
    Refresh,
    /// 备份仍然有效
    Skip,
}

impl SyncAction {
    pub fn needs_copy(&self) -> bool {
        !matches!(self, SyncAction::Skip)
    }

    pub fn needs_prune(&self) -> bool {
        matches!(self, SyncAction::Refresh)
    }
}

/// 过期判定策略
///
/// 所有时间均由调用方传入（Unix 秒），内部不读取时钟。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    /// 宽限时间（秒）
    pub grace_seconds: i64,
    /// 数据库保留时间（秒）
    pub retention_seconds: i64,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            grace_seconds: DEFAULT_GRACE_SECONDS,
            retention_seconds: DEFAULT_RETENTION_SECONDS,
        }
    }
}

impl StalenessPolicy {
    pub fn new(grace_seconds: i64, retention_seconds: i64) -> Self {
        Self {
            grace_seconds,
            retention_seconds,
        }
    }

    /// 主目录标识文件是否比备份新出宽限时间以上
    pub fn is_stale_copy(&self, master_time: i64, backup_time: i64) -> bool {
        master_time.saturating_sub(backup_time) > self.grace_seconds
    }

    /// 数据库文件是否超过保留时间
    pub fn is_aged(&self, file_time: i64, now: i64) -> bool {
        now.saturating_sub(file_time) > self.retention_seconds
    }

    /// 根据标识文件和备份副本的修改时间决定同步动作
    pub fn decide(&self, master_time: i64, backup_time: Option<i64>) -> SyncAction {
        match backup_time {
            None => SyncAction::InitialCopy,
            Some(backup_time) if self.is_stale_copy(master_time, backup_time) => {
                tracing::debug!(
                    "备份已过期 (master={}, backup={}, diff={}s)",
                    master_time,
                    backup_time,
                    master_time.saturating_sub(backup_time)
                );
                SyncAction::Refresh
            }
            Some(_) => SyncAction::Skip,
        }
    }
}
