use crate::core::cleanup::{prune_failures, CleanupExecutor};
use crate::core::comparator::{StalenessPolicy, SyncAction};
use crate::core::layout::{DATA_DIR, MASTER_DIR};
use crate::core::mapper::PathMapper;
use crate::core::scanner::{FileScanner, ProgramDir, ScanConfig};
use crate::core::transfer::{self, CopyOutcome};
use crate::error::{BackupError, BackupResult};
use crate::storage::{self, FileInfo};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 同步配置
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// 主目录根（权威来源）
    pub master_root: PathBuf,
    /// 备份目录根
    pub backup_root: PathBuf,
    /// 过期判定策略
    pub policy: StalenessPolicy,
    /// 扫描配置
    pub scan_config: ScanConfig,
}

impl SyncConfig {
    pub fn new(master_root: impl Into<PathBuf>, backup_root: impl Into<PathBuf>) -> Self {
        Self {
            master_root: master_root.into(),
            backup_root: backup_root.into(),
            policy: StalenessPolicy::default(),
            scan_config: ScanConfig::default(),
        }
    }

    pub fn with_policy(mut self, policy: StalenessPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// 同步报告
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// 本次运行的基准时间（Unix 秒）
    pub start_time: i64,
    pub directories_copied: u32,
    pub data_files_removed: u32,
    pub programs_scanned: u32,
    pub programs_skipped: u32,
    pub programs_failed: u32,
    pub elapsed: Duration,
    pub errors: Vec<String>,
}

/// 同步引擎
///
/// 单线程顺序遍历主目录下的程序目录，单个程序目录出错只记录并继续。
pub struct SyncEngine {
    config: SyncConfig,
    mapper: PathMapper,
    scanner: FileScanner,
    cleanup: CleanupExecutor,
}

impl SyncEngine {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            mapper: PathMapper::new(&config.master_root, &config.backup_root),
            scanner: FileScanner::with_config(config.scan_config.clone()),
            cleanup: CleanupExecutor::new(),
            config,
        }
    }

    /// 以当前时间运行一次同步
    pub fn run(&self) -> SyncReport {
        self.run_at(chrono::Utc::now().timestamp())
    }

    /// 以给定的基准时间运行一次同步，过期判定都使用这个时间
    pub fn run_at(&self, now: i64) -> SyncReport {
        let started = Instant::now();
        let mut report = SyncReport {
            start_time: now,
            ..Default::default()
        };

        info!(
            "开始备份: {:?} -> {:?}",
            self.config.master_root, self.config.backup_root
        );

        match self.scanner.program_dirs(&self.config.master_root) {
            Ok(programs) => {
                for program in &programs {
                    report.programs_scanned += 1;
                    if let Err(e) = self.process_program(program, now, &mut report) {
                        warn!("处理程序目录 {} 失败: {}", program.name, e);
                        report.programs_failed += 1;
                        report.errors.push(format!("{}: {}", program.name, e));
                    }
                }
            }
            Err(e) => {
                error!("扫描主目录失败: {}", e);
                report.errors.push(e.to_string());
            }
        }

        report.elapsed = started.elapsed();
        info!(
            "备份完成: 复制 {} 个目录, 删除 {} 个数据库, 失败 {} 个程序, 耗时 {:.3}s",
            report.directories_copied,
            report.data_files_removed,
            report.programs_failed,
            report.elapsed.as_secs_f64()
        );
        report
    }

    fn process_program(
        &self,
        program: &ProgramDir,
        now: i64,
        report: &mut SyncReport,
    ) -> BackupResult<()> {
        let master_dir = program.path.join(MASTER_DIR);
        if !is_directory(&master_dir)? {
            debug!("没有 MASTER 目录，跳过: {}", program.name);
            report.programs_skipped += 1;
            return Ok(());
        }

        let designators = self.scanner.designators(&master_dir)?;
        if designators.is_empty() {
            debug!("MASTER 中没有标识文件，跳过: {}", program.name);
            report.programs_skipped += 1;
            return Ok(());
        }
        if designators.len() > 1 {
            warn!(
                "{} 的 MASTER 中有 {} 个标识文件，按文件名顺序逐个处理",
                program.name,
                designators.len()
            );
        }

        // 每个标识文件各自判定，第一个错误作为本程序的失败原因返回，其余直接记入报告
        let mut first_error = None;
        for designator in &designators {
            if let Err(e) = self.sync_designator(program, &master_dir, designator, report) {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    warn!("处理 {} 的标识文件失败: {}", program.name, e);
                    report.errors.push(format!("{}: {}", program.name, e));
                }
            }
        }

        // 数据库清理与复制结果无关
        self.purge_aged_data(&master_dir.join(DATA_DIR), now, report);

        first_error.map_or(Ok(()), Err)
    }

    fn sync_designator(
        &self,
        program: &ProgramDir,
        master_dir: &Path,
        designator: &FileInfo,
        report: &mut SyncReport,
    ) -> BackupResult<SyncAction> {
        let counterpart = self.mapper.map_to_backup(&designator.path);
        let backup_time = storage::stat(&counterpart)?.map(|m| m.modified_time);
        let action = self
            .config
            .policy
            .decide(designator.modified_time, backup_time);

        match action {
            SyncAction::InitialCopy => info!("备份中不存在，首次复制: {}", program.name),
            SyncAction::Refresh => info!("备份已过期，重新复制: {}", program.name),
            SyncAction::Skip => {
                debug!("备份已是最新: {}", program.name);
                return Ok(action);
            }
        }

        let dest = self.mapper.map_to_backup(master_dir);
        self.copy_master(master_dir, &dest)?;
        report.directories_copied += 1;

        if action.needs_prune() {
            let program_backup = self.mapper.map_to_backup(&program.path);
            let results = self.cleanup.prune_backup_auxiliaries(&program_backup);
            report
                .errors
                .extend(prune_failures(results).iter().map(ToString::to_string));
        }

        Ok(action)
    }

    fn copy_master(&self, master_dir: &Path, dest: &Path) -> BackupResult<CopyOutcome> {
        let outcome = transfer::copy_directory(master_dir, dest)?;
        if !outcome.is_complete() {
            return Err(BackupError::PartialCopy {
                from: master_dir.to_path_buf(),
                to: dest.to_path_buf(),
                failed: outcome.failed,
            });
        }
        Ok(outcome)
    }

    fn purge_aged_data(&self, data_dir: &Path, now: i64, report: &mut SyncReport) {
        let files = match is_directory(data_dir) {
            Ok(true) => self.scanner.data_files(data_dir),
            Ok(false) => return,
            Err(e) => Err(e),
        };

        let files = match files {
            Ok(f) => f,
            Err(e) => {
                warn!("扫描数据库目录失败: {}", e);
                report.errors.push(e.to_string());
                return;
            }
        };

        let aged = files
            .iter()
            .filter(|f| self.config.policy.is_aged(f.modified_time, now));
        for file in aged {
            match self.cleanup.remove_aged_data_file(&file.path) {
                Ok(removal) => {
                    report.data_files_removed += 1;
                    if let Some(e) = removal.sibling_error {
                        report.errors.push(e.to_string());
                    }
                }
                Err(e) => {
                    warn!("删除过期数据库失败: {}", e);
                    report.errors.push(e.to_string());
                }
            }
        }
    }
}

fn is_directory(path: &Path) -> BackupResult<bool> {
    Ok(storage::stat(path)?.map(|m| m.is_dir).unwrap_or(false))
}
