use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

use crate::config::defaults::DefaultConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 忽略配置
    pub ignore: IgnoreConfig,

    /// 扫描配置
    pub scan: ScanConfig,

    /// 索引文件存储配置
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// 隐藏条目的名称前缀
    pub hidden_prefix: String,

    /// 以这些后缀结尾的文件名不会被索引
    pub file_suffixes: Vec<String>,

    /// 跳过的目录名（不记录也不进入）
    pub directories: HashSet<String>,

    /// 路径中包含这些片段（忽略大小写）的目录会被跳过
    pub path_markers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 目录扫描的并发线程数
    pub scan_workers: usize,

    /// 单独分配扫描任务的顶层目标数上限（包含根目录），0 表示不限制
    pub max_scan_targets: usize,

    /// 是否跟随符号链接
    pub follow_symlinks: bool,

    /// 构建索引时每批处理的文件数
    pub batch_size: usize,

    /// 批处理的并发线程数
    pub batch_workers: usize,

    /// 存在性检查的并发线程数
    pub verify_workers: usize,

    /// 存在性检查每批的最小路径数
    pub verify_min_batch: usize,

    /// 存在性检查期望划分的批次数
    pub verify_target_batches: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 自定义索引文件路径
    pub index_file: Option<PathBuf>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            hidden_prefix: ".".to_string(),
            file_suffixes: DefaultConfig::default_file_suffixes(),
            directories: DefaultConfig::default_ignore_dirs(),
            path_markers: DefaultConfig::default_path_markers(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_workers: 6,
            max_scan_targets: 8,
            follow_symlinks: false,
            batch_size: 1000,
            batch_workers: num_cpus::get().clamp(1, 4),
            verify_workers: 6,
            verify_min_batch: 100,
            verify_target_batches: 8,
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("配置文件格式错误: {}", path.display()))?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        // 确保目录存在
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// 获取默认配置文件路径
    pub fn default_config_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("无法找到配置目录"))?;
        path.push("file-index-cli");
        path.push("config.toml");
        Ok(path)
    }

    /// 加载配置，如果文件不存在则创建默认配置
    pub fn load_or_create_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let config = Self::default();
            config.save_to_file(&config_path)?;
            Ok(config)
        }
    }

    /// 索引文件路径：优先使用配置中的路径
    pub fn index_file_path(&self) -> Result<PathBuf> {
        match &self.storage.index_file {
            Some(path) => Ok(path.clone()),
            None => DefaultConfig::default_index_file(),
        }
    }
}
