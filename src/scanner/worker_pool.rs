use std::sync::Arc;
use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::models::TaskFailure;

/// 单个任务的结果
#[derive(Debug)]
pub enum TaskOutcome<T> {
    /// 任务成功完成
    Completed { label: String, value: T },

    /// 任务返回错误或发生 panic
    Failed(TaskFailure),
}

/// 有界工作池
///
/// 阻塞型任务在 `spawn_blocking` 线程上执行，同时运行的数量受信号量限制。
/// 调用方通过 `next` 按完成顺序逐个取回结果，合并只在调用方这一侧进行，
/// 任务之间不共享可变状态。
pub struct WorkerPool<T> {
    /// 并发槽位
    semaphore: Arc<Semaphore>,

    /// 正在运行的任务
    tasks: JoinSet<(String, std::result::Result<T, String>)>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// 创建最多同时运行 `workers` 个任务的工作池
    pub fn new(workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            tasks: JoinSet::new(),
        }
    }

    /// 提交一个任务；任务一旦提交就不会被取消
    pub fn spawn<F>(&mut self, label: impl Into<String>, job: F)
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let label = label.into();
        let semaphore = self.semaphore.clone();

        self.tasks.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(permit) => {
                    let joined = tokio::task::spawn_blocking(job).await;
                    drop(permit);
                    match joined {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(err)) => Err(format!("{err:#}")),
                        Err(join_err) => Err(describe_join_error(join_err)),
                    }
                }
                Err(_) => Err("工作池已关闭".to_string()),
            };
            (label, outcome)
        });
    }

    /// 等待下一个完成的任务；没有剩余任务时返回 None
    pub async fn next(&mut self) -> Option<TaskOutcome<T>> {
        let joined = self.tasks.join_next().await?;

        Some(match joined {
            Ok((label, Ok(value))) => TaskOutcome::Completed { label, value },
            Ok((label, Err(error))) => TaskOutcome::Failed(TaskFailure { label, error }),
            Err(join_err) => TaskOutcome::Failed(TaskFailure {
                label: "<未知任务>".to_string(),
                error: describe_join_error(join_err),
            }),
        })
    }

    /// 尚未取回结果的任务数
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// 把 JoinError 转成可读的描述
fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        let panic = err.into_panic();
        if let Some(message) = panic.downcast_ref::<&str>() {
            format!("任务 panic: {message}")
        } else if let Some(message) = panic.downcast_ref::<String>() {
            format!("任务 panic: {message}")
        } else {
            "任务 panic".to_string()
        }
    } else {
        format!("任务被取消: {err}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_collects_all_results() {
        let mut pool = WorkerPool::new(3);
        for i in 0..10usize {
            pool.spawn(format!("job-{i}"), move || Ok(i * 2));
        }
        assert_eq!(pool.len(), 10);

        let mut values = Vec::new();
        while let Some(outcome) = pool.next().await {
            match outcome {
                TaskOutcome::Completed { value, .. } => values.push(value),
                TaskOutcome::Failed(failure) => panic!("意外失败: {failure:?}"),
            }
        }
        values.sort();

        assert_eq!(values, (0..10).map(|i| i * 2).collect::<Vec<_>>());
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_siblings() {
        let mut pool = WorkerPool::new(2);
        pool.spawn("ok-1", || Ok(1));
        pool.spawn("bad", || Err(anyhow::anyhow!("磁盘错误")));
        pool.spawn("boom", || -> Result<i32> { panic!("爆炸") });
        pool.spawn("ok-2", || Ok(2));

        let mut completed = 0;
        let mut failures = Vec::new();
        while let Some(outcome) = pool.next().await {
            match outcome {
                TaskOutcome::Completed { .. } => completed += 1,
                TaskOutcome::Failed(failure) => failures.push(failure),
            }
        }
        failures.sort_by(|a, b| a.label.cmp(&b.label));

        assert_eq!(completed, 2);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].label, "bad");
        assert!(failures[0].error.contains("磁盘错误"));
        assert_eq!(failures[1].label, "boom");
        assert!(failures[1].error.contains("爆炸"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut pool = WorkerPool::new(2);
        for i in 0..8 {
            let running = running.clone();
            let peak = peak.clone();
            pool.spawn(format!("job-{i}"), move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(20));
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            });
        }

        while pool.next().await.is_some() {}

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }
}
