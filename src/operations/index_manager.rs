use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use anyhow::Result;

use crate::config::Config;
use crate::indexer::{BuildReport, FileIndexer, ReconcileReport};
use crate::models::IndexState;
use crate::search::{self, SearchMode};
use crate::storage::IndexStore;
use crate::utils::time_format::format_time;
use crate::utils::TerminalProgress;

/// 索引管理器 - 命令行各子命令的实现
pub struct IndexManager {
    indexer: FileIndexer,
}

impl IndexManager {
    /// 创建使用终端进度条的管理器
    pub fn new(config: &Config, store: IndexStore) -> Self {
        Self {
            indexer: FileIndexer::with_progress(config, store, Arc::new(TerminalProgress::new())),
        }
    }

    /// 加载已有索引，没有时返回空状态
    async fn load_state(&self) -> Result<IndexState> {
        Ok(self.indexer.load().await?.unwrap_or_default())
    }

    /// 完整建立索引
    pub async fn index(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            println!("路径不存在: {}", path.display());
            return Ok(());
        }

        println!("正在为 {} 建立索引...", path.display());
        let mut state = IndexState::default();
        let report = self.indexer.build_index(path, &mut state).await;
        print!("{}", format_build_report(&report, self.indexer.store().path()));
        Ok(())
    }

    /// 增量重建索引
    pub async fn reindex(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            println!("路径不存在: {}", path.display());
            return Ok(());
        }

        // 没有索引文件时从空索引开始，所有文件都会作为新文件加入
        let mut state = match self.indexer.load().await? {
            Some(state) => state,
            None => {
                println!("未找到索引文件，将从空索引开始重建");
                IndexState::default()
            }
        };

        println!("正在增量重建: {}", path.display());
        let report = self.indexer.reconcile(path, &mut state).await;
        print!("{}", format_reconcile_report(&report));
        Ok(())
    }

    /// 搜索文件或文件夹
    pub async fn search(&self, input: &str) -> Result<()> {
        let state = self.load_state().await?;
        if state.is_empty() {
            println!("索引为空，请先使用 index 命令建立索引");
            return Ok(());
        }

        let (mode, query) = search::parse_query(input);
        let results = search::search(&state, mode, query);
        print!("{}", format_results(&results, query));
        Ok(())
    }

    /// 按扩展名搜索
    pub async fn search_extension(&self, extension: &str) -> Result<()> {
        let state = self.load_state().await?;
        if state.is_empty() {
            println!("索引为空，请先使用 index 命令建立索引");
            return Ok(());
        }

        let results = search::search(&state, SearchMode::Extension, extension);
        print!("{}", format_results(&results, extension));
        Ok(())
    }

    /// 显示索引信息
    pub async fn info(&self) -> Result<()> {
        let store = self.indexer.store();
        println!("索引文件: {}", store.path().display());

        let Some(state) = self.indexer.load().await? else {
            println!("索引文件不存在");
            return Ok(());
        };

        println!("文件大小: {} 字节", store.file_size());
        if let Some(modified) = store.modified() {
            println!("最后修改: {}", format_time(modified));
        }
        println!("文件数: {} ({} 个不同文件名)", state.total_files, state.files.len());
        println!("文件夹数: {} ({} 个不同文件夹名)", state.total_folders, state.folders.len());
        if let Some(timestamp) = &state.scan_timestamp {
            println!("扫描时间: {}", timestamp);
        }
        if !state.scanned_directories.is_empty() {
            println!("扫描目录数: {}", state.scanned_directories.len());
        }
        Ok(())
    }

    /// 删除索引文件
    pub async fn delete(&self, force: bool) -> Result<()> {
        let store = self.indexer.store();
        if !store.exists() {
            println!("没有可删除的索引文件");
            return Ok(());
        }

        if !force && !confirm(&format!("确认删除索引文件 {}？(y/n): ", store.path().display()))? {
            println!("已取消删除");
            return Ok(());
        }

        if store.delete().await? {
            println!("索引文件已删除");
        }
        Ok(())
    }
}

/// 从标准输入读取确认
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// 格式化搜索结果：序号、文件名、完整路径
pub fn format_results(results: &[String], query: &str) -> String {
    if results.is_empty() {
        return format!("没有找到与 '{}' 匹配的结果\n", query);
    }

    let mut output = format!("找到 {} 个匹配:\n", results.len());
    output.push_str(&"-".repeat(40));
    output.push('\n');

    for (i, path) in results.iter().enumerate() {
        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.clone());
        let _ = writeln!(output, "{:2}. {}", i + 1, name);
        let _ = writeln!(output, "    {}", path.replace('\\', "/"));
    }

    output.push_str(&"-".repeat(40));
    output.push('\n');
    output
}

/// 格式化完整扫描报告
pub fn format_build_report(report: &BuildReport, index_file: &Path) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "索引完成！共 {} 个文件（{} 个不同文件名），{} 个文件夹，扫描了 {} 个目录，用时 {:.2}s",
        report.total_files,
        report.unique_names,
        report.total_folders,
        report.scanned_dirs,
        report.elapsed.as_secs_f64()
    );
    if !report.failures.is_empty() {
        let _ = writeln!(output, "{} 个任务失败，结果可能不完整", report.failures.len());
    }
    if report.persisted {
        let _ = writeln!(output, "索引已保存到 {}", index_file.display());
    } else {
        let _ = writeln!(output, "警告: 索引未能保存，仅在本次运行中有效");
    }
    output
}

/// 格式化增量重建报告
pub fn format_reconcile_report(report: &ReconcileReport) -> String {
    let mut output = String::new();
    if let Some(error) = &report.aborted {
        let _ = writeln!(output, "增量重建中途出错: {}", error);
    }
    let _ = writeln!(
        output,
        "增量重建完成！移除 {} 个，新增 {} 个，共 {} 个文件",
        report.removed, report.added, report.total_files
    );
    if !report.persisted {
        let _ = writeln!(output, "警告: 索引未能保存，仅在本次运行中有效");
    }
    output
}
