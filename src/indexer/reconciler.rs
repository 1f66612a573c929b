use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use anyhow::Result;

use crate::indexer::ExistenceVerifier;
use crate::models::{FileIndex, TaskFailure};
use crate::scanner::ScanCoordinator;
use crate::utils::{NoopProgress, ProgressPhase, ProgressSink, ProgressUpdate};

/// 发现阶段每处理这么多条目报告一次进度
const DISCOVER_PROGRESS_STEP: usize = 1000;

/// 增量重建报告
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// 清理阶段移除的路径数
    pub removed: usize,

    /// 发现阶段新增的路径数
    pub added: usize,

    /// 重建后的文件总数
    pub total_files: usize,

    /// 过程中失败的任务
    pub failures: Vec<TaskFailure>,

    /// 某个阶段出错提前结束时的错误描述
    pub aborted: Option<String>,

    /// 结果是否已写入索引文件
    pub persisted: bool,
}

/// 增量重建器 - 先清理已失效的路径，再追加新出现的文件
///
/// 两个阶段依次执行，不回退；出错时已合并的结果保留在内存中。
#[derive(Clone)]
pub struct Reconciler {
    coordinator: ScanCoordinator,
    verifier: ExistenceVerifier,
    progress: Arc<dyn ProgressSink>,
}

impl Reconciler {
    pub fn new(coordinator: ScanCoordinator, verifier: ExistenceVerifier) -> Self {
        Self {
            coordinator,
            verifier,
            progress: Arc::new(NoopProgress),
        }
    }

    /// 设置进度接收端（只用于发现阶段，其余阶段由各组件自行报告）
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// 对 `index` 执行清理和发现两个阶段
    pub async fn reconcile(&self, root: &Path, index: &mut FileIndex) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        if let Err(err) = self.run_phases(root, index, &mut report).await {
            tracing::error!("增量重建出错: {:#}", err);
            report.aborted = Some(format!("{err:#}"));
        }

        report.total_files = index.total_paths();
        report
    }

    async fn run_phases(
        &self,
        root: &Path,
        index: &mut FileIndex,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        let removed = self.prune(index, report).await?;
        report.removed = removed;

        let added = self.discover(root, index, report).await?;
        report.added = added;
        Ok(())
    }

    /// 清理阶段：只保留仍然存在的路径，路径列表为空的文件名整体移除
    pub async fn prune(&self, index: &mut FileIndex, report: &mut ReconcileReport) -> Result<usize> {
        let paths = index.all_paths();
        let checked = paths.len();
        tracing::info!("校验 {} 条已索引路径...", checked);

        let outcome = self.verifier.verify(paths).await;
        if !outcome.unverified.is_empty() {
            tracing::warn!("{} 条路径无法校验，暂时保留", outcome.unverified.len());
        }
        report.failures.extend(outcome.failures.iter().cloned());

        let removed = index.retain_paths(&outcome.retained());
        tracing::info!("移除 {} 条失效路径", removed);
        Ok(removed)
    }

    /// 发现阶段：扫描 `root`，把索引中还没有的路径追加进去
    pub async fn discover(
        &self,
        root: &Path,
        index: &mut FileIndex,
        report: &mut ReconcileReport,
    ) -> Result<usize> {
        if !root.is_dir() {
            anyhow::bail!("路径不存在或不是目录: {}", root.display());
        }

        let scan = self.coordinator.coordinate(root).await;
        report.failures.extend(scan.failures);

        let mut known: HashSet<String> = index.path_set().into_iter().map(str::to_string).collect();
        let files = scan.result.files;
        let total = files.len();
        let mut added = 0;

        for (i, entry) in files.into_iter().enumerate() {
            if known.insert(entry.path.clone()) {
                index.insert(entry.name, entry.path);
                added += 1;
            }

            let processed = i + 1;
            if processed % DISCOVER_PROGRESS_STEP == 0 || processed == total {
                self.progress
                    .report(ProgressUpdate::new(ProgressPhase::Discovering, processed, total));
            }
        }

        tracing::info!("新增 {} 个文件", added);
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::scanner::{PathClassifier, TreeScanner};
    use std::fs;
    use tempfile::tempdir;

    fn reconciler() -> Reconciler {
        let config = ScanConfig::default();
        let scanner = TreeScanner::new(Arc::new(PathClassifier::default()), false);
        Reconciler::new(
            ScanCoordinator::new(scanner, &config),
            ExistenceVerifier::from_config(&config),
        )
    }

    fn path_of(root: &Path, rel: &str) -> String {
        root.join(rel).to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn test_prune_then_discover() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("docs")).unwrap();
        fs::write(root.join("docs/keep.txt"), "").unwrap();
        fs::write(root.join("docs/new.txt"), "").unwrap();

        let mut index = FileIndex::new();
        index.insert("keep.txt", path_of(root, "docs/keep.txt"));
        index.insert("gone.txt", path_of(root, "docs/gone.txt"));

        let report = reconciler().reconcile(root, &mut index).await;

        assert_eq!(report.removed, 1);
        assert_eq!(report.added, 1);
        assert_eq!(report.total_files, 2);
        assert!(report.aborted.is_none());
        assert!(index.get("gone.txt").is_none());
        assert_eq!(index.get("keep.txt").unwrap(), [path_of(root, "docs/keep.txt")]);
        assert_eq!(index.get("new.txt").unwrap(), [path_of(root, "docs/new.txt")]);
    }

    #[tokio::test]
    async fn test_prune_keeps_paths_of_failed_batches() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();

        let config = ScanConfig::default();
        let scanner = TreeScanner::new(Arc::new(PathClassifier::default()), false);
        let verifier = ExistenceVerifier::from_config(&config)
            .with_check(|_batch: &[String]| -> Result<HashSet<String>> { anyhow::bail!("磁盘无响应") });
        let reconciler = Reconciler::new(ScanCoordinator::new(scanner, &config), verifier);

        // 磁盘上不存在，但校验失败时不能当作已删除
        let mut index = FileIndex::new();
        index.insert("ghost.txt", path_of(root, "ghost.txt"));

        let mut report = ReconcileReport::default();
        let removed = reconciler.prune(&mut index, &mut report).await.unwrap();

        assert_eq!(removed, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(index.get("ghost.txt").unwrap(), [path_of(root, "ghost.txt")]);
    }

    #[tokio::test]
    async fn test_missing_root_keeps_pruned_state() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("real.txt"), "").unwrap();

        let mut index = FileIndex::new();
        index.insert("real.txt", path_of(root, "real.txt"));
        index.insert("ghost.txt", path_of(root, "ghost.txt"));

        let report = reconciler()
            .reconcile(&root.join("missing"), &mut index)
            .await;

        // 清理阶段的结果保留，发现阶段报错
        assert_eq!(report.removed, 1);
        assert_eq!(report.added, 0);
        assert!(report.aborted.is_some());
        assert_eq!(index.total_paths(), 1);
    }
}
