pub mod config;
pub mod indexer;
pub mod models;
pub mod operations;
pub mod scanner;
pub mod search;
pub mod storage;
pub mod tui;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use indexer::{BuildReport, FileIndexer, ReconcileReport};
pub use models::{FileIndex, FolderIndex, IndexSnapshot, IndexState};
pub use search::SearchMode;
pub use storage::IndexStore;
