use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::config::ScanConfig;
use crate::indexer::batch_builder::split_batches;
use crate::models::TaskFailure;
use crate::scanner::{TaskOutcome, WorkerPool};
use crate::utils::{NoopProgress, ProgressPhase, ProgressSink, ProgressUpdate};

/// 存在性检查的结果
#[derive(Debug, Clone, Default)]
pub struct VerifyOutcome {
    /// 确认仍然存在的路径
    pub existing: HashSet<String>,

    /// 所在批次检查失败、无法确认状态的路径
    pub unverified: HashSet<String>,

    /// 失败的批次
    pub failures: Vec<TaskFailure>,
}

impl VerifyOutcome {
    /// 应该保留在索引中的路径：存在的加上无法确认的
    pub fn retained(&self) -> HashSet<String> {
        self.existing.union(&self.unverified).cloned().collect()
    }
}

/// 在工作线程上检查一批路径
type BatchCheck = Arc<dyn Fn(&[String]) -> anyhow::Result<HashSet<String>> + Send + Sync>;

/// 存在性校验器 - 并行检查索引中的路径是否仍在磁盘上
///
/// 删除、重命名、无权限访问都表现为"不存在"，不作区分。
#[derive(Clone)]
pub struct ExistenceVerifier {
    /// 并发批次数
    workers: usize,

    /// 每批最少路径数
    min_batch: usize,

    /// 期望的批次数
    target_batches: usize,

    check: BatchCheck,

    progress: Arc<dyn ProgressSink>,
}

impl ExistenceVerifier {
    pub fn new(workers: usize, min_batch: usize, target_batches: usize) -> Self {
        Self {
            workers: workers.max(1),
            min_batch: min_batch.max(1),
            target_batches: target_batches.max(1),
            check: Arc::new(|paths: &[String]| -> anyhow::Result<HashSet<String>> {
                Ok(Self::check_batch(paths))
            }),
            progress: Arc::new(NoopProgress),
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(
            config.verify_workers,
            config.verify_min_batch,
            config.verify_target_batches,
        )
    }

    /// 设置进度接收端
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// 替换单批路径的检查逻辑
    #[cfg(test)]
    pub(crate) fn with_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&[String]) -> anyhow::Result<HashSet<String>> + Send + Sync + 'static,
    {
        self.check = Arc::new(check);
        self
    }

    /// 每批路径数：max(min_batch, total / target_batches)
    pub fn batch_size_for(&self, total: usize) -> usize {
        self.min_batch.max(total / self.target_batches)
    }

    /// 检查一批路径，返回仍然存在的那些
    pub fn check_batch(paths: &[String]) -> HashSet<String> {
        paths
            .iter()
            .filter(|path| Path::new(path.as_str()).try_exists().unwrap_or(false))
            .cloned()
            .collect()
    }

    /// 并行检查所有路径
    pub async fn verify(&self, paths: Vec<String>) -> VerifyOutcome {
        let mut outcome = VerifyOutcome::default();
        if paths.is_empty() {
            return outcome;
        }

        let batch_size = self.batch_size_for(paths.len());
        let batches: Vec<Arc<Vec<String>>> = split_batches(paths, batch_size)
            .into_iter()
            .map(Arc::new)
            .collect();
        let total = batches.len();

        let mut pending: HashMap<String, Arc<Vec<String>>> = HashMap::with_capacity(total);
        let mut pool = WorkerPool::new(self.workers.min(total));
        for (i, batch) in batches.into_iter().enumerate() {
            let label = format!("校验批次 {}", i + 1);
            pending.insert(label.clone(), batch.clone());
            let check = self.check.clone();
            pool.spawn(label, move || check(batch.as_slice()));
        }

        let mut checked = 0;
        while let Some(result) = pool.next().await {
            checked += 1;
            match result {
                TaskOutcome::Completed { label, value } => {
                    pending.remove(&label);
                    outcome.existing.extend(value);
                }
                TaskOutcome::Failed(failure) => {
                    tracing::warn!("{}失败: {}", failure.label, failure.error);
                    if let Some(batch) = pending.remove(&failure.label) {
                        outcome.unverified.extend(batch.iter().cloned());
                    }
                    outcome.failures.push(failure);
                }
            }

            self.progress.report(ProgressUpdate::new(ProgressPhase::Verifying, checked, total));
        }

        outcome
    }
}
