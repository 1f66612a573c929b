use std::sync::Mutex;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

/// 进度所属的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressPhase {
    /// 并行扫描顶层目录
    Scanning,

    /// 分批构建文件索引
    Batching,

    /// 检查已索引路径是否仍然存在
    Verifying,

    /// 重建时发现新文件
    Discovering,
}

impl ProgressPhase {
    /// 阶段显示名称
    pub fn label(&self) -> &'static str {
        match self {
            ProgressPhase::Scanning => "扫描目录",
            ProgressPhase::Batching => "处理批次",
            ProgressPhase::Verifying => "校验路径",
            ProgressPhase::Discovering => "发现新文件",
        }
    }
}

/// 一次进度更新
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub phase: ProgressPhase,
    pub current: usize,
    pub total: usize,
}

impl ProgressUpdate {
    pub fn new(phase: ProgressPhase, current: usize, total: usize) -> Self {
        Self { phase, current, total }
    }

    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.current >= self.total
    }
}

/// 进度接收端
///
/// 核心逻辑只通过这个接口报告进度，不直接写终端。
pub trait ProgressSink: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        self(update)
    }
}

/// 丢弃所有进度
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

/// 把进度转发到通道（供 TUI 使用）
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelProgress {
    pub fn new(sender: mpsc::UnboundedSender<ProgressUpdate>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, update: ProgressUpdate) {
        // 接收端关闭后丢弃进度即可
        let _ = self.sender.send(update);
    }
}

/// 终端进度条，每个阶段一根
pub struct TerminalProgress {
    current: Mutex<Option<(ProgressPhase, ProgressBar)>>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// 创建进度条
    fn create_progress_bar(phase: ProgressPhase, total: usize) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.green} [{elapsed_precise}] |{bar:40.cyan/blue}| {pos}/{len} ({percent}%)")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉-"),
        );
        pb.set_prefix(phase.label());
        pb
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn report(&self, update: ProgressUpdate) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        let same_phase = matches!(current.as_ref(), Some((phase, _)) if *phase == update.phase);
        if !same_phase {
            if let Some((_, bar)) = current.take() {
                bar.finish();
            }
            *current = Some((update.phase, Self::create_progress_bar(update.phase, update.total)));
        }

        if let Some((_, bar)) = current.as_ref() {
            bar.set_length(update.total as u64);
            bar.set_position(update.current as u64);
            if update.is_finished() {
                bar.finish();
            }
        }
    }
}

/// 渲染文本进度条，例如 `扫描目录 |█████-----| 50.0% (1/2)`
///
/// `total` 为 0 时返回空字符串。
pub fn render_bar(update: &ProgressUpdate, width: usize) -> String {
    if update.total == 0 {
        return String::new();
    }

    let current = update.current.min(update.total);
    let percent = 100.0 * current as f64 / update.total as f64;
    let filled = width * current / update.total;
    let bar = format!("{}{}", "█".repeat(filled), "-".repeat(width - filled));

    format!(
        "{} |{}| {:.1}% ({}/{})",
        update.phase.label(),
        bar,
        percent,
        update.current,
        update.total
    )
}
