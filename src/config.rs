//! 应用配置模块
//!
//! 配置来源（后者覆盖前者）：
//! 1. 配置目录下的 `config.json`（路径可由 `MASTERBACKUP_CONFIG` 指定）
//! 2. 环境变量 `MASTERBACKUP_MASTER_ROOT` / `MASTERBACKUP_BACKUP_ROOT` 等

use crate::core::comparator::{StalenessPolicy, DEFAULT_GRACE_SECONDS, DEFAULT_RETENTION_SECONDS};
use crate::core::SyncConfig;
use crate::error::{BackupError, BackupResult};
use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG: &str = "MASTERBACKUP_CONFIG";
pub const ENV_MASTER_ROOT: &str = "MASTERBACKUP_MASTER_ROOT";
pub const ENV_BACKUP_ROOT: &str = "MASTERBACKUP_BACKUP_ROOT";
pub const ENV_GRACE_SECONDS: &str = "MASTERBACKUP_GRACE_SECONDS";
pub const ENV_RETENTION_SECONDS: &str = "MASTERBACKUP_RETENTION_SECONDS";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// 主目录根
    #[serde(default)]
    pub master_root: Option<PathBuf>,
    /// 备份目录根
    #[serde(default)]
    pub backup_root: Option<PathBuf>,
    /// 标识文件宽限时间（秒）
    #[serde(default = "default_grace_seconds")]
    pub grace_seconds: i64,
    /// 数据库保留时间（秒）
    #[serde(default = "default_retention_seconds")]
    pub retention_seconds: i64,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_grace_seconds() -> i64 {
    DEFAULT_GRACE_SECONDS
}

fn default_retention_seconds() -> i64 {
    DEFAULT_RETENTION_SECONDS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            master_root: None,
            backup_root: None,
            grace_seconds: default_grace_seconds(),
            retention_seconds: default_retention_seconds(),
            log: LogConfig::default(),
        }
    }
}

/// 默认配置目录
pub fn config_dir() -> PathBuf {
    crate::dirs::config_dir()
        .map(|p| p.join("masterbackup"))
        .unwrap_or_else(|| PathBuf::from(".masterbackup"))
}

impl AppConfig {
    /// 从配置文件和环境变量加载并校验
    pub fn load() -> BackupResult<Self> {
        let config_file = std::env::var_os(ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir().join("config.json"));

        let mut config = Self::from_file(&config_file)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 读取配置文件，文件不存在时使用默认值
    pub fn from_file(config_file: &Path) -> BackupResult<Self> {
        if !config_file.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_file)
            .map_err(|e| BackupError::Config(format!("无法读取 {:?}: {}", config_file, e)))?;
        serde_json::from_str(&content)
            .map_err(|e| BackupError::Config(format!("无法解析 {:?}: {}", config_file, e)))
    }

    /// 用环境变量覆盖配置
    pub fn apply_env<F>(&mut self, lookup: F) -> BackupResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(root) = lookup(ENV_MASTER_ROOT) {
            self.master_root = Some(PathBuf::from(root));
        }
        if let Some(root) = lookup(ENV_BACKUP_ROOT) {
            self.backup_root = Some(PathBuf::from(root));
        }
        if let Some(value) = lookup(ENV_GRACE_SECONDS) {
            self.grace_seconds = parse_seconds(ENV_GRACE_SECONDS, &value)?;
        }
        if let Some(value) = lookup(ENV_RETENTION_SECONDS) {
            self.retention_seconds = parse_seconds(ENV_RETENTION_SECONDS, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> BackupResult<()> {
        let master = self.master_root()?;
        let backup = self.backup_root()?;

        if master == backup {
            return Err(BackupError::Config("主目录和备份目录不能相同".to_string()));
        }
        if self.grace_seconds < 0 || self.retention_seconds < 0 {
            return Err(BackupError::Config("时间窗口不能为负数".to_string()));
        }
        Ok(())
    }

    pub fn master_root(&self) -> BackupResult<&Path> {
        non_empty_root(self.master_root.as_deref(), "masterRoot", ENV_MASTER_ROOT)
    }

    pub fn backup_root(&self) -> BackupResult<&Path> {
        non_empty_root(self.backup_root.as_deref(), "backupRoot", ENV_BACKUP_ROOT)
    }

    /// 转换为同步引擎配置
    pub fn sync_config(&self) -> BackupResult<SyncConfig> {
        Ok(
            SyncConfig::new(self.master_root()?, self.backup_root()?).with_policy(
                StalenessPolicy::new(self.grace_seconds, self.retention_seconds),
            ),
        )
    }
}

fn non_empty_root<'a>(root: Option<&'a Path>, key: &str, env: &str) -> BackupResult<&'a Path> {
    root.filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| BackupError::Config(format!("缺少 {}（或环境变量 {}）", key, env)))
}

fn parse_seconds(key: &str, value: &str) -> BackupResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| BackupError::Config(format!("{} 不是有效的秒数: {}", key, value)))
}
