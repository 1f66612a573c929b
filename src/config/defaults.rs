use std::collections::HashSet;
use std::path::PathBuf;
use anyhow::Result;

pub struct DefaultConfig;

impl DefaultConfig {
    /// 默认跳过的目录名
    pub fn default_ignore_dirs() -> HashSet<String> {
        let mut dirs = HashSet::new();

        // 常见的依赖目录
        dirs.insert("node_modules".to_string());
        dirs.insert("__pycache__".to_string());

        // Windows 系统目录
        dirs.insert("$RECYCLE.BIN".to_string());
        dirs.insert("System Volume Information".to_string());

        dirs
    }

    /// 默认排除的文件名后缀
    pub fn default_file_suffixes() -> Vec<String> {
        vec![".".to_string(), "android".to_string()]
    }

    /// 默认排除的路径片段（应用数据目录）
    pub fn default_path_markers() -> Vec<String> {
        vec!["appdata".to_string()]
    }

    /// 默认索引文件位置
    pub fn default_index_file() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("无法找到数据目录"))?;
        path.push("file-index-cli");
        path.push("file_index.json");
        Ok(path)
    }
}
