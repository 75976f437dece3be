//! 程序目录的固定布局
//!
//! ```text
//! <root>/<program>/MASTER/*.dmi          标识文件
//! <root>/<program>/MASTER/Data/*.bak     数据库文件
//! <root>/<program>/{WO,ARCHIVE,TEST}     备份端清理的辅助目录
//! ```

/// 程序主目录名
pub const MASTER_DIR: &str = "MASTER";

/// 数据库目录名（位于 MASTER 下）
pub const DATA_DIR: &str = "Data";

/// 标识文件扩展名
pub const DESIGNATOR_EXT: &str = "dmi";

/// 数据库文件扩展名
pub const DATA_EXT: &str = "bak";

/// 数据库文件名前缀，推导同名文件夹时去掉
pub const DATA_PREFIX: &str = "Insp_";

/// 复制后在备份端删除的辅助子路径（相对程序目录）
pub const AUXILIARY_SUBPATHS: [&[&str]; 4] = [
    &[MASTER_DIR, DATA_DIR],
    &["WO"],
    &["ARCHIVE"],
    &["TEST"],
];

/// 报告文件名（位于备份根目录）
pub const REPORT_FILE: &str = "BackupInfo.txt";
