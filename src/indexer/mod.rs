pub mod batch_builder;
pub mod existence;
pub mod reconciler;

pub use batch_builder::{BatchIndexBuilder, BatchOutcome};
pub use existence::{ExistenceVerifier, VerifyOutcome};
pub use reconciler::{ReconcileReport, Reconciler};

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use anyhow::Result;

use crate::config::Config;
use crate::models::{FolderIndex, IndexState, ScanResult, TaskFailure};
use crate::scanner::{PathClassifier, ScanCoordinator, TreeScanner};
use crate::storage::IndexStore;
use crate::utils::time_format::{per_second, scan_timestamp};
use crate::utils::{NoopProgress, ProgressSink};

/// 完整扫描报告
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// 根目录不存在，什么都没有做
    pub root_missing: bool,

    /// 索引的文件数
    pub total_files: usize,

    /// 不同文件名的数量
    pub unique_names: usize,

    /// 索引的文件夹数
    pub total_folders: usize,

    /// 成功进入的目录数
    pub scanned_dirs: usize,

    /// 失败的任务
    pub failures: Vec<TaskFailure>,

    /// 是否已写入索引文件
    pub persisted: bool,

    /// 耗时
    pub elapsed: Duration,
}

/// 文件索引器 - 完整扫描与增量重建的入口
pub struct FileIndexer {
    coordinator: ScanCoordinator,
    builder: BatchIndexBuilder,
    reconciler: Reconciler,
    store: IndexStore,
}

impl FileIndexer {
    /// 创建不报告进度的索引器
    pub fn new(config: &Config, store: IndexStore) -> Self {
        Self::with_progress(config, store, Arc::new(NoopProgress))
    }

    /// 创建索引器，所有阶段的进度都发送到 `progress`
    pub fn with_progress(config: &Config, store: IndexStore, progress: Arc<dyn ProgressSink>) -> Self {
        let classifier = Arc::new(PathClassifier::from_config(&config.ignore));
        let scanner = TreeScanner::new(classifier, config.scan.follow_symlinks);

        let coordinator = ScanCoordinator::new(scanner, &config.scan).with_progress(progress.clone());
        let builder = BatchIndexBuilder::from_config(&config.scan).with_progress(progress.clone());
        let verifier = ExistenceVerifier::from_config(&config.scan).with_progress(progress.clone());
        let reconciler = Reconciler::new(coordinator.clone(), verifier).with_progress(progress);

        Self {
            coordinator,
            builder,
            reconciler,
            store,
        }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// 从索引文件加载状态
    pub async fn load(&self) -> Result<Option<IndexState>> {
        Ok(self.store.load().await?.map(IndexState::from))
    }

    /// 完整扫描 `root`，替换 `state` 并写入索引文件
    ///
    /// `root` 不存在时 `state` 被清空，索引文件保持不变。
    /// 保存失败只记录日志，内存中的索引仍然可用。
    pub async fn build_index(&self, root: &Path, state: &mut IndexState) -> BuildReport {
        let start = Instant::now();
        let mut report = BuildReport::default();

        if !root.exists() {
            tracing::warn!("路径不存在: {}", root.display());
            *state = IndexState::default();
            report.root_missing = true;
            return report;
        }

        tracing::info!("开始索引: {}", root.display());
        let scan = self.coordinator.coordinate(root).await;
        report.failures.extend(scan.failures);
        let ScanResult {
            files,
            folders,
            entered_dirs,
        } = scan.result;

        let mut folder_index = FolderIndex::new();
        for folder in folders {
            folder_index.insert(folder.name, folder.path);
        }

        let batch = self.builder.build(files).await;
        report.failures.extend(batch.failures);

        *state = IndexState {
            total_files: batch.total_files,
            total_folders: folder_index.total_paths(),
            files: batch.index,
            folders: folder_index,
            scanned_directories: entered_dirs,
            scan_timestamp: Some(scan_timestamp()),
        };

        report.total_files = state.total_files;
        report.unique_names = state.files.len();
        report.total_folders = state.total_folders;
        report.scanned_dirs = state.scanned_directories.len();

        match self.store.save(&state.to_snapshot()).await {
            Ok(()) => report.persisted = true,
            Err(err) => tracing::warn!("保存索引失败，内存中的索引仍可使用: {:#}", err),
        }

        report.elapsed = start.elapsed();
        tracing::info!(
            "索引构建完成，用时 {:.2}s。共 {} 个文件，{} 个不同文件名",
            report.elapsed.as_secs_f64(),
            report.total_files,
            report.unique_names
        );
        tracing::info!("速度: {:.0} 文件/秒", per_second(report.total_files, report.elapsed));

        report
    }

    /// 增量重建：在 `state` 上原地清理失效路径并追加新文件，然后写入索引文件
    ///
    /// 只写入文件索引和文件总数。任何错误都只记录日志，不返回错误。
    pub async fn reconcile(&self, root: &Path, state: &mut IndexState) -> ReconcileReport {
        let start = Instant::now();
        tracing::info!("开始增量重建: {}", root.display());

        let mut report = self.reconciler.reconcile(root, &mut state.files).await;
        state.total_files = report.total_files;

        match self.store.save(&state.to_incremental_snapshot()).await {
            Ok(()) => report.persisted = true,
            Err(err) => tracing::warn!("保存索引失败，内存中的索引仍可使用: {:#}", err),
        }

        tracing::info!(
            "增量重建完成，用时 {:.2}s。移除 {} 个，新增 {} 个，共 {} 个文件",
            start.elapsed().as_secs_f64(),
            report.removed,
            report.added,
            report.total_files
        );

        report
    }
}
