use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use tokio::fs;

use crate::models::IndexSnapshot;

/// 索引文件存储 - 负责索引快照的读写
#[derive(Debug, Clone)]
pub struct IndexStore {
    /// 索引文件路径
    index_file: PathBuf,
}

impl IndexStore {
    pub fn new(index_file: impl Into<PathBuf>) -> Self {
        Self {
            index_file: index_file.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.index_file
    }

    pub fn exists(&self) -> bool {
        self.index_file.exists()
    }

    /// 加载索引快照
    ///
    /// 文件不存在时返回 None；内容损坏时删除该文件并返回 None。
    pub async fn load(&self) -> Result<Option<IndexSnapshot>> {
        if !self.index_file.exists() {
            tracing::info!("未找到索引文件: {}", self.index_file.display());
            return Ok(None);
        }

        let bytes = fs::read(&self.index_file)
            .await
            .with_context(|| format!("无法读取索引文件: {}", self.index_file.display()))?;

        match serde_json::from_slice::<IndexSnapshot>(&bytes) {
            Ok(snapshot) => {
                tracing::info!(
                    "已加载索引 {}: {} 个文件名, {} 个文件夹名",
                    self.index_file.display(),
                    snapshot.file_index.len(),
                    snapshot.folder_index.as_ref().map(|f| f.len()).unwrap_or(0)
                );
                Ok(Some(snapshot))
            }
            Err(err) => {
                tracing::warn!("索引文件格式错误，将删除后重新开始: {}", err);
                if let Err(remove_err) = fs::remove_file(&self.index_file).await {
                    tracing::warn!("无法删除损坏的索引文件: {}", remove_err);
                }
                Ok(None)
            }
        }
    }

    /// 保存索引快照（先写临时文件再重命名）
    pub async fn save(&self, snapshot: &IndexSnapshot) -> Result<()> {
        if let Some(parent) = self.index_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("无法创建目录: {}", parent.display()))?;
            }
        }

        let content = serde_json::to_vec_pretty(snapshot)?;
        let temp_file = self.temp_path();

        fs::write(&temp_file, content)
            .await
            .with_context(|| format!("无法写入索引文件: {}", temp_file.display()))?;
        fs::rename(&temp_file, &self.index_file)
            .await
            .with_context(|| format!("无法替换索引文件: {}", self.index_file.display()))?;

        tracing::debug!("索引已保存到 {}", self.index_file.display());
        Ok(())
    }

    /// 删除索引文件，返回文件是否存在过
    pub async fn delete(&self) -> Result<bool> {
        if !self.index_file.exists() {
            return Ok(false);
        }

        fs::remove_file(&self.index_file)
            .await
            .with_context(|| format!("无法删除索引文件: {}", self.index_file.display()))?;
        Ok(true)
    }

    /// 索引文件大小
    pub fn file_size(&self) -> u64 {
        std::fs::metadata(&self.index_file)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// 索引文件最后修改时间
    pub fn modified(&self) -> Option<std::time::SystemTime> {
        std::fs::metadata(&self.index_file).and_then(|m| m.modified()).ok()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .index_file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "file_index.json".into());
        name.push(".tmp");
        self.index_file.with_file_name(name)
    }
}
