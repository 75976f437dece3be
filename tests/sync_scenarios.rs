use filetime::FileTime;
use masterbackup_lib::core::layout::REPORT_FILE;
use masterbackup_lib::storage;
use masterbackup_lib::{ReportWriter, SyncConfig, SyncEngine};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const NOW: i64 = 1_700_000_000;
const T: i64 = NOW - 3600;
const HOUR: i64 = 3600;
const DAY: i64 = 24 * HOUR;

struct Fixture {
    _tmp: TempDir,
    master: PathBuf,
    backup: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let master = tmp.path().join("master");
        let backup = tmp.path().join("backup");
        fs::create_dir_all(&master).unwrap();
        fs::create_dir_all(&backup).unwrap();
        Self {
            _tmp: tmp,
            master,
            backup,
        }
    }

    fn engine(&self) -> SyncEngine {
        SyncEngine::new(SyncConfig::new(&self.master, &self.backup))
    }

    fn m(&self, rel: &str) -> PathBuf {
        join(&self.master, rel)
    }

    fn b(&self, rel: &str) -> PathBuf {
        join(&self.backup, rel)
    }
}

fn join(root: &Path, rel: &str) -> PathBuf {
    rel.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
}

fn touch(path: &Path, content: &str, mtime: i64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    filetime::set_file_mtime(path, FileTime::from_unix_time(mtime, 0)).unwrap();
}

fn mkdir(path: &Path) {
    fs::create_dir_all(path).unwrap();
}

fn mtime(path: &Path) -> i64 {
    storage::stat(path).unwrap().unwrap().modified_time
}

// ── 首次备份 ─────────────────────────────────────────────

#[test]
fn new_program_is_copied_without_pruning() {
    let fx = Fixture::new();
    touch(&fx.m("ProgA/MASTER/foo.dmi"), "program", T);
    touch(&fx.m("ProgA/MASTER/notes.txt"), "notes", T - HOUR);
    touch(&fx.m("ProgA/MASTER/Data/Insp_1.bak"), "db", NOW - DAY);
    mkdir(&fx.b("ProgA/WO"));

    let report = fx.engine().run_at(NOW);

    assert_eq!(report.directories_copied, 1);
    assert_eq!(report.data_files_removed, 0);
    assert!(report.errors.is_empty());
    assert_eq!(
        fs::read_to_string(fx.b("ProgA/MASTER/foo.dmi")).unwrap(),
        "program"
    );
    assert_eq!(mtime(&fx.b("ProgA/MASTER/foo.dmi")), T);
    assert!(fx.b("ProgA/MASTER/notes.txt").exists());
    // 浅复制：Data 不会被复制
    assert!(!fx.b("ProgA/MASTER/Data").exists());
    // 首次复制不清理
    assert!(fx.b("ProgA/WO").exists());
}

// ── 备份过期 ─────────────────────────────────────────────

#[test]
fn stale_backup_is_refreshed_and_pruned() {
    let fx = Fixture::new();
    touch(&fx.m("ProgB/MASTER/bar.dmi"), "v2", T);
    touch(&fx.b("ProgB/MASTER/bar.dmi"), "v1", T - 3 * HOUR);
    touch(&fx.b("ProgB/MASTER/Data/Insp_9.bak"), "db", T - 3 * HOUR);
    for aux in ["WO", "ARCHIVE", "TEST"] {
        touch(&fx.b(&format!("ProgB/{}/file.txt", aux)), "x", T);
    }

    let report = fx.engine().run_at(NOW);

    assert_eq!(report.directories_copied, 1);
    assert_eq!(fs::read_to_string(fx.b("ProgB/MASTER/bar.dmi")).unwrap(), "v2");
    assert_eq!(mtime(&fx.b("ProgB/MASTER/bar.dmi")), T);
    assert!(!fx.b("ProgB/MASTER/Data").exists());
    assert!(!fx.b("ProgB/WO").exists());
    assert!(!fx.b("ProgB/ARCHIVE").exists());
    assert!(!fx.b("ProgB/TEST").exists());
}

#[test]
fn recent_backup_is_left_alone() {
    let fx = Fixture::new();
    touch(&fx.m("ProgC/MASTER/baz.dmi"), "v2", T);
    touch(&fx.b("ProgC/MASTER/baz.dmi"), "v1", T - 30 * 60);
    mkdir(&fx.b("ProgC/WO"));

    let report = fx.engine().run_at(NOW);

    assert_eq!(report.directories_copied, 0);
    assert_eq!(fs::read_to_string(fx.b("ProgC/MASTER/baz.dmi")).unwrap(), "v1");
    assert!(fx.b("ProgC/WO").exists());
}

#[test]
fn custom_grace_window_is_honoured() {
    let fx = Fixture::new();
    touch(&fx.m("ProgC/MASTER/baz.dmi"), "v2", T);
    touch(&fx.b("ProgC/MASTER/baz.dmi"), "v1", T - 3 * HOUR);

    let config = SyncConfig::new(&fx.master, &fx.backup).with_policy(
        masterbackup_lib::StalenessPolicy::new(12 * HOUR, 60 * DAY),
    );
    let report = SyncEngine::new(config).run_at(NOW);

    assert_eq!(report.directories_copied, 0);
}

// ── 过期数据库 ───────────────────────────────────────────

#[test]
fn aged_data_files_are_removed_with_sibling_folder() {
    let fx = Fixture::new();
    touch(&fx.m("ProgD/MASTER/prog.dmi"), "p", T);
    touch(&fx.m("ProgD/MASTER/Data/Insp_old.bak"), "db", NOW - 61 * DAY);
    touch(&fx.m("ProgD/MASTER/Data/old/image.png"), "img", NOW - 61 * DAY);
    touch(&fx.m("ProgD/MASTER/Data/Insp_new.bak"), "db", NOW - DAY);
    mkdir(&fx.m("ProgD/MASTER/Data/new"));
    touch(&fx.m("ProgD/MASTER/Data/ancient.log"), "log", NOW - 400 * DAY);

    let report = fx.engine().run_at(NOW);

    assert_eq!(report.data_files_removed, 1);
    assert!(!fx.m("ProgD/MASTER/Data/Insp_old.bak").exists());
    assert!(!fx.m("ProgD/MASTER/Data/old").exists());
    assert!(fx.m("ProgD/MASTER/Data/Insp_new.bak").exists());
    assert!(fx.m("ProgD/MASTER/Data/new").exists());
    assert!(fx.m("ProgD/MASTER/Data/ancient.log").exists());
}

#[test]
fn data_is_not_purged_without_designator() {
    let fx = Fixture::new();
    touch(&fx.m("ProgX/MASTER/readme.txt"), "r", T);
    touch(&fx.m("ProgX/MASTER/Data/Insp_old.bak"), "db", NOW - 90 * DAY);

    let report = fx.engine().run_at(NOW);

    assert_eq!(report.data_files_removed, 0);
    assert_eq!(report.programs_skipped, 1);
    assert!(fx.m("ProgX/MASTER/Data/Insp_old.bak").exists());
}

// ── 跳过的条目 ───────────────────────────────────────────

#[test]
fn top_level_files_are_skipped_silently() {
    let fx = Fixture::new();
    touch(&fx.m("stray.dmi"), "junk", T);
    touch(&fx.m("notes.txt"), "junk", T);

    let report = fx.engine().run_at(NOW);

    assert_eq!(report.directories_copied, 0);
    assert_eq!(report.data_files_removed, 0);
    assert_eq!(report.programs_scanned, 0);
    assert!(report.errors.is_empty());
}

#[test]
fn program_without_master_folder_is_skipped() {
    let fx = Fixture::new();
    touch(&fx.m("Tools/setup.exe"), "bin", T);

    let report = fx.engine().run_at(NOW);

    assert_eq!(report.programs_scanned, 1);
    assert_eq!(report.programs_skipped, 1);
    assert_eq!(report.directories_copied, 0);
    assert!(!fx.b("Tools").exists());
}

// ── 重复运行 ─────────────────────────────────────────────

#[test]
fn second_run_without_changes_copies_nothing() {
    let fx = Fixture::new();
    touch(&fx.m("ProgA/MASTER/foo.dmi"), "program", T);
    touch(&fx.m("ProgA/MASTER/other.txt"), "other", T);

    let engine = fx.engine();
    assert_eq!(engine.run_at(NOW).directories_copied, 1);

    let second = engine.run_at(NOW + HOUR);
    assert_eq!(second.directories_copied, 0);
    assert_eq!(mtime(&fx.b("ProgA/MASTER/foo.dmi")), T);
}

#[test]
fn multiple_designators_are_processed_in_name_order() {
    let fx = Fixture::new();
    touch(&fx.m("ProgM/MASTER/b.dmi"), "b", T);
    touch(&fx.m("ProgM/MASTER/a.dmi"), "a", T);

    let report = fx.engine().run_at(NOW);

    // a.dmi 触发首次复制，b.dmi 随之复制，轮到 b.dmi 时备份已是最新
    assert_eq!(report.directories_copied, 1);
    assert!(fx.b("ProgM/MASTER/a.dmi").exists());
    assert!(fx.b("ProgM/MASTER/b.dmi").exists());
}

// ── 错误隔离 ─────────────────────────────────────────────

#[test]
fn failing_program_does_not_abort_run() {
    let fx = Fixture::new();
    touch(&fx.m("ProgE/MASTER/e.dmi"), "e", T);
    touch(&fx.m("ProgE/MASTER/Data/Insp_x.bak"), "db", NOW - 70 * DAY);
    // 备份端同名路径是文件而不是目录，无法复制
    touch(&fx.b("ProgE"), "not a directory", T);
    touch(&fx.m("ProgF/MASTER/f.dmi"), "f", T);

    let report = fx.engine().run_at(NOW);

    assert_eq!(report.programs_failed, 1);
    assert_eq!(report.directories_copied, 1);
    assert_eq!(report.data_files_removed, 1);
    assert!(!report.errors.is_empty());
    assert!(fx.b("ProgF/MASTER/f.dmi").exists());
}

#[test]
fn partial_copy_is_not_counted_and_skips_pruning() {
    let fx = Fixture::new();
    touch(&fx.m("ProgP/MASTER/p.dmi"), "v2", T);
    touch(&fx.m("ProgP/MASTER/tool.cfg"), "cfg", T);
    touch(&fx.b("ProgP/MASTER/p.dmi"), "v1", T - 3 * HOUR);
    // 备份端同名路径是目录，这个文件复制失败
    mkdir(&fx.b("ProgP/MASTER/tool.cfg"));
    mkdir(&fx.b("ProgP/WO"));

    let report = fx.engine().run_at(NOW);

    assert_eq!(report.directories_copied, 0);
    assert_eq!(report.programs_failed, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("ProgP: "));
    // 复制未完成时不清理
    assert!(fx.b("ProgP/WO").exists());
}

#[test]
fn every_designator_is_evaluated_after_a_failure() {
    let fx = Fixture::new();
    touch(&fx.m("ProgM/MASTER/a.dmi"), "a", T);
    touch(&fx.m("ProgM/MASTER/b.dmi"), "b", T);
    for name in ["a.dmi", "b.dmi"] {
        let dir = fx.b(&format!("ProgM/MASTER/{}", name));
        mkdir(&dir);
        filetime::set_file_mtime(&dir, FileTime::from_unix_time(T - 3 * HOUR, 0)).unwrap();
    }

    let report = fx.engine().run_at(NOW);

    // 两个标识文件都判定为过期，各自的复制都失败
    assert_eq!(report.programs_failed, 1);
    assert_eq!(report.directories_copied, 0);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().all(|e| e.starts_with("ProgM: ")));
}

#[cfg(unix)]
#[test]
fn unreadable_master_entry_fails_the_copy() {
    let fx = Fixture::new();
    touch(&fx.m("ProgL/MASTER/p.dmi"), "p", T);
    std::os::unix::fs::symlink(fx.m("ProgL/MASTER/gone.cfg"), fx.m("ProgL/MASTER/tool.cfg"))
        .unwrap();

    let report = fx.engine().run_at(NOW);

    assert_eq!(report.directories_copied, 0);
    assert_eq!(report.programs_failed, 1);
    assert!(!report.errors.is_empty());
    assert!(fx.b("ProgL/MASTER/p.dmi").exists());
}

/// 权限位对当前用户生效时返回 true（root 下总是可写）
#[cfg(unix)]
fn write_is_denied(dir: &Path) -> bool {
    fs::write(dir.join(".writable"), b"").is_err()
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(unix)]
#[test]
fn failed_data_removal_is_reported_not_counted() {
    let fx = Fixture::new();
    touch(&fx.m("ProgD/MASTER/prog.dmi"), "p", T);
    touch(&fx.m("ProgD/MASTER/Data/Insp_old.bak"), "db", NOW - 61 * DAY);
    let data = fx.m("ProgD/MASTER/Data");
    set_mode(&data, 0o555);
    if !write_is_denied(&data) {
        set_mode(&data, 0o755);
        return;
    }

    let report = fx.engine().run_at(NOW);
    set_mode(&data, 0o755);

    assert_eq!(report.data_files_removed, 0);
    assert_eq!(report.directories_copied, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(fx.m("ProgD/MASTER/Data/Insp_old.bak").exists());
}

#[cfg(unix)]
#[test]
fn failed_sibling_removal_is_reported() {
    let fx = Fixture::new();
    touch(&fx.m("ProgD/MASTER/prog.dmi"), "p", T);
    touch(&fx.m("ProgD/MASTER/Data/Insp_old.bak"), "db", NOW - 61 * DAY);
    touch(&fx.m("ProgD/MASTER/Data/old/image.png"), "img", NOW - 61 * DAY);
    let folder = fx.m("ProgD/MASTER/Data/old");
    set_mode(&folder, 0o555);
    if !write_is_denied(&folder) {
        set_mode(&folder, 0o755);
        return;
    }

    let report = fx.engine().run_at(NOW);
    set_mode(&folder, 0o755);

    // 数据库文件已删除，计数照常，文件夹删除失败进入报告
    assert_eq!(report.data_files_removed, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(!fx.m("ProgD/MASTER/Data/Insp_old.bak").exists());
    assert!(folder.join("image.png").exists());
}

// ── 报告 ─────────────────────────────────────────────────

#[test]
fn report_is_written_to_backup_root() {
    let fx = Fixture::new();
    touch(&fx.m("ProgA/MASTER/foo.dmi"), "program", T);
    touch(&fx.m("ProgA/MASTER/Data/Insp_old.bak"), "db", NOW - 61 * DAY);

    let report = fx.engine().run_at(NOW);
    let path = ReportWriter::new(&fx.backup).write(&report).unwrap();

    assert_eq!(path, fx.backup.join(REPORT_FILE));
    let content = fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Directories Copied: 1");
    assert_eq!(lines[1], "Databases Removed: 1");
    assert!(lines[2].starts_with("Elapsed Time: "));
    assert!(lines[2].ends_with('s'));
}
