use std::sync::Arc;

use crate::config::ScanConfig;
use crate::models::{FileIndex, FoundEntry, TaskFailure};
use crate::scanner::{TaskOutcome, WorkerPool};
use crate::utils::{NoopProgress, ProgressPhase, ProgressSink, ProgressUpdate};

/// 分批构建的结果
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// 合并后的文件索引
    pub index: FileIndex,

    /// 合并时追加的路径总数
    pub total_files: usize,

    /// 批次数量
    pub batches: usize,

    /// 失败的批次
    pub failures: Vec<TaskFailure>,
}

/// 分批索引构建器 - 把文件列表切成固定大小的批次，并行构建局部索引后顺序合并
#[derive(Clone)]
pub struct BatchIndexBuilder {
    /// 每批文件数
    batch_size: usize,

    /// 并发批次数
    workers: usize,

    progress: Arc<dyn ProgressSink>,
}

impl BatchIndexBuilder {
    pub fn new(batch_size: usize, workers: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            workers: workers.max(1),
            progress: Arc::new(NoopProgress),
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.batch_size, config.batch_workers)
    }

    /// 设置进度接收端
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// 构建单个批次的局部索引（只包含本批次内的文件）
    pub fn build_partial(batch: Vec<FoundEntry>) -> FileIndex {
        let mut partial = FileIndex::new();
        for entry in batch {
            partial.insert(entry.name, entry.path);
        }
        partial
    }

    /// 把局部索引追加到全局索引，返回追加的路径数
    pub fn merge_partial(index: &mut FileIndex, partial: FileIndex) -> usize {
        let mut appended = 0;
        for (name, paths) in partial {
            appended += index.extend_paths(name, paths);
        }
        appended
    }

    /// 并行构建全部批次，并按完成顺序合并到一个新的索引
    pub async fn build(&self, files: Vec<FoundEntry>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        if files.is_empty() {
            tracing::info!("没有需要索引的文件");
            return outcome;
        }

        let batches = split_batches(files, self.batch_size);
        outcome.batches = batches.len();

        let mut pool = WorkerPool::new(self.workers.min(batches.len()));
        for (i, batch) in batches.into_iter().enumerate() {
            pool.spawn(format!("批次 {}", i + 1), move || Ok(Self::build_partial(batch)));
        }

        let mut processed = 0;
        while let Some(result) = pool.next().await {
            processed += 1;
            match result {
                TaskOutcome::Completed { value, .. } => {
                    outcome.total_files += Self::merge_partial(&mut outcome.index, value);
                }
                TaskOutcome::Failed(failure) => {
                    tracing::warn!("处理{}时出错: {}", failure.label, failure.error);
                    outcome.failures.push(failure);
                }
            }

            self.progress.report(ProgressUpdate::new(
                ProgressPhase::Batching,
                processed,
                outcome.batches,
            ));
        }

        outcome
    }
}

/// 把列表切成最多 `size` 个元素一组的批次
pub fn split_batches<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut iter = items.into_iter();

    loop {
        let batch: Vec<T> = iter.by_ref().take(size).collect();
        if batch.is_empty() {
            break;
        }
        batches.push(batch);
    }

    batches
}
