pub mod cleanup;
pub mod comparator;
pub mod engine;
pub mod layout;
pub mod mapper;
pub mod scanner;
pub mod transfer;

pub use cleanup::{sibling_folder, CleanupExecutor, DataRemoval, PruneResult};
pub use comparator::{StalenessPolicy, SyncAction, DEFAULT_GRACE_SECONDS, DEFAULT_RETENTION_SECONDS};
pub use engine::{SyncConfig, SyncEngine, SyncReport};
pub use mapper::{normalize_separators, PathMapper};
pub use scanner::{FileScanner, ProgramDir, ScanConfig};
pub use transfer::{copy_directory, CopyOutcome};
