use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ScanConfig;
use crate::models::{FoundEntry, ScanReport, ScanResult};
use crate::scanner::worker_pool::{TaskOutcome, WorkerPool};
use crate::scanner::tree_scanner::utf8_name_and_path;
use crate::scanner::TreeScanner;
use crate::utils::{NoopProgress, ProgressPhase, ProgressSink, ProgressUpdate};

/// 一个并行扫描目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// 根目录：扫描除已分配给其他任务的子目录外的全部内容
    Root {
        path: PathBuf,
        delegated: HashSet<PathBuf>,
    },

    /// 根目录下的一个子目录：记录该目录本身并扫描其全部内容
    Subtree(PathBuf),
}

impl ScanTarget {
    pub fn path(&self) -> &Path {
        match self {
            ScanTarget::Root { path, .. } => path,
            ScanTarget::Subtree(path) => path,
        }
    }
}

/// 在工作线程上扫描一个目标
type TargetScan = Arc<dyn Fn(&TreeScanner, ScanTarget) -> anyhow::Result<ScanResult> + Send + Sync>;

/// 扫描协调器 - 把顶层子目录分配到有界工作池中并行扫描
#[derive(Clone)]
pub struct ScanCoordinator {
    scanner: TreeScanner,

    target_scan: TargetScan,

    /// 工作池大小上限
    workers: usize,

    /// 顶层目标数上限（包含根目录），0 表示不限制
    max_targets: usize,

    progress: Arc<dyn ProgressSink>,
}

impl ScanCoordinator {
    /// 创建新的扫描协调器
    pub fn new(scanner: TreeScanner, config: &ScanConfig) -> Self {
        Self {
            scanner,
            target_scan: Arc::new(|scanner: &TreeScanner, target: ScanTarget| -> anyhow::Result<ScanResult> {
                Ok(Self::scan_target(scanner, target))
            }),
            workers: config.scan_workers,
            max_targets: config.max_scan_targets,
            progress: Arc::new(NoopProgress),
        }
    }

    /// 设置进度接收端
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// 替换单个目标的扫描逻辑
    #[cfg(test)]
    pub(crate) fn with_target_scan<F>(mut self, target_scan: F) -> Self
    where
        F: Fn(&TreeScanner, ScanTarget) -> anyhow::Result<ScanResult> + Send + Sync + 'static,
    {
        self.target_scan = Arc::new(target_scan);
        self
    }

    /// 规划扫描目标：根目录加上按名称排序后的顶层子目录
    ///
    /// 超出上限的子目录不单独分配任务，由根目录任务顺序扫描。
    pub fn plan_targets(&self, root: &Path) -> Vec<ScanTarget> {
        let mut subdirs = Vec::new();

        match std::fs::read_dir(root) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                    if !is_dir {
                        continue;
                    }

                    let path = entry.path();
                    let Some((name, _)) = utf8_name_and_path(&path) else {
                        tracing::debug!("跳过非 UTF-8 目录: {}", path.display());
                        continue;
                    };
                    if self.scanner.classifier().accepts_dir(&name, &path) {
                        subdirs.push(path);
                    }
                }
            }
            Err(err) => {
                tracing::debug!("无法列出根目录 {}: {}", root.display(), err);
            }
        }

        subdirs.sort();

        if self.max_targets > 0 && subdirs.len() + 1 > self.max_targets {
            let own_tasks = self.max_targets.saturating_sub(1);
            tracing::info!(
                "顶层目录共 {} 个，超过并行上限，其中 {} 个由根目录任务顺序扫描",
                subdirs.len(),
                subdirs.len() - own_tasks
            );
            subdirs.truncate(own_tasks);
        }

        let mut targets = vec![ScanTarget::Root {
            path: root.to_path_buf(),
            delegated: subdirs.iter().cloned().collect(),
        }];
        targets.extend(subdirs.into_iter().map(ScanTarget::Subtree));
        targets
    }

    /// 并行扫描 `root`，返回所有完成任务的合并结果
    pub async fn coordinate(&self, root: &Path) -> ScanReport {
        let mut report = ScanReport::default();

        let root = match std::path::absolute(root) {
            Ok(root) => root,
            Err(err) => {
                tracing::warn!("无法解析路径 {}: {}", root.display(), err);
                return report;
            }
        };

        if !root.is_dir() {
            tracing::warn!("路径不存在或不是目录: {}", root.display());
            return report;
        }

        let targets = self.plan_targets(&root);
        report.targets = targets.len();
        tracing::info!("并行扫描 {} 个目录...", targets.len());

        let mut pool = WorkerPool::new(self.workers.min(targets.len()));
        for target in targets {
            let scanner = self.scanner.clone();
            let target_scan = self.target_scan.clone();
            let label = target.path().to_string_lossy().to_string();
            pool.spawn(label, move || target_scan(&scanner, target));
        }

        // 只有这里修改汇总结果
        let mut completed = 0;
        while let Some(outcome) = pool.next().await {
            completed += 1;
            match outcome {
                TaskOutcome::Completed { value, .. } => report.result.merge(value),
                TaskOutcome::Failed(failure) => {
                    tracing::warn!("扫描 {} 时出错: {}", failure.label, failure.error);
                    report.failures.push(failure);
                }
            }

            self.progress.report(ProgressUpdate::new(
                ProgressPhase::Scanning,
                completed,
                report.targets,
            ));
            tracing::debug!(
                "已扫描 {}/{} 个目录，发现 {} 个文件",
                completed,
                report.targets,
                report.result.files.len()
            );
        }

        tracing::info!(
            "共发现 {} 个文件，{} 个文件夹，扫描了 {} 个目录",
            report.result.files.len(),
            report.result.folders.len(),
            report.result.entered_dirs.len()
        );

        report
    }

    /// 在工作线程上执行一个扫描目标
    fn scan_target(scanner: &TreeScanner, target: ScanTarget) -> ScanResult {
        match target {
            ScanTarget::Root { path, delegated } => scanner.scan_pruned(&path, &delegated),
            ScanTarget::Subtree(path) => {
                let mut result = ScanResult::default();
                match utf8_name_and_path(&path) {
                    Some((name, full)) => result.folders.push(FoundEntry::new(name, full)),
                    None => {
                        tracing::debug!("跳过非 UTF-8 目录: {}", path.display());
                        return result;
                    }
                }
                result.merge(scanner.scan(&path));
                result
            }
        }
    }
}
