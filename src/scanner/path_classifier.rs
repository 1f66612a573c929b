use std::collections::HashSet;
use std::path::Path;

use crate::config::IgnoreConfig;

/// 路径分类器 - 判断文件或目录是否应该被索引
///
/// 纯函数：结果只取决于名称、路径和构造时给定的规则。
#[derive(Debug, Clone)]
pub struct PathClassifier {
    /// 隐藏条目前缀
    hidden_prefix: String,

    /// 排除的文件名后缀
    excluded_suffixes: Vec<String>,

    /// 跳过的目录名
    skip_dirs: HashSet<String>,

    /// 排除的路径片段（已转小写）
    path_markers: Vec<String>,
}

impl PathClassifier {
    /// 使用自定义规则创建分类器
    pub fn new(
        hidden_prefix: impl Into<String>,
        excluded_suffixes: Vec<String>,
        skip_dirs: HashSet<String>,
        path_markers: Vec<String>,
    ) -> Self {
        Self {
            hidden_prefix: hidden_prefix.into(),
            excluded_suffixes,
            skip_dirs,
            path_markers: path_markers
                .into_iter()
                .map(|marker| marker.to_lowercase())
                .filter(|marker| !marker.is_empty())
                .collect(),
        }
    }

    /// 根据忽略配置创建分类器
    pub fn from_config(config: &IgnoreConfig) -> Self {
        Self::new(
            config.hidden_prefix.clone(),
            config.file_suffixes.clone(),
            config.directories.clone(),
            config.path_markers.clone(),
        )
    }

    /// 名称是否是隐藏条目
    pub fn is_hidden(&self, name: &str) -> bool {
        !self.hidden_prefix.is_empty() && name.starts_with(&self.hidden_prefix)
    }

    /// 文件是否应该被索引
    pub fn accepts_file(&self, name: &str) -> bool {
        if self.is_hidden(name) {
            return false;
        }

        !self
            .excluded_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && name.ends_with(suffix.as_str()))
    }

    /// 目录是否应该被记录并进入
    pub fn accepts_dir(&self, name: &str, path: &Path) -> bool {
        if self.is_hidden(name) || self.skip_dirs.contains(name) {
            return false;
        }

        !self.is_private_path(path)
    }

    /// 路径中是否含有平台私有目录片段
    fn is_private_path(&self, path: &Path) -> bool {
        if self.path_markers.is_empty() {
            return false;
        }

        let lowered = path.to_string_lossy().to_lowercase();
        self.path_markers.iter().any(|marker| lowered.contains(marker.as_str()))
    }
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::from_config(&IgnoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier_with_skip(skip: &[&str]) -> PathClassifier {
        PathClassifier::new(
            ".",
            vec![".".to_string(), "android".to_string()],
            skip.iter().map(|s| s.to_string()).collect(),
            vec!["AppData".to_string()],
        )
    }

    #[test]
    fn test_accepts_file() {
        let classifier = classifier_with_skip(&[]);

        // 应该被索引的文件
        assert!(classifier.accepts_file("main.rs"));
        assert!(classifier.accepts_file("README"));
        assert!(classifier.accepts_file("android.txt"));

        // 应该排除的文件
        assert!(!classifier.accepts_file(".bashrc"));
        assert!(!classifier.accepts_file("weird."));
        assert!(!classifier.accepts_file("com.example.android"));
    }

    #[test]
    fn test_accepts_dir() {
        let classifier = classifier_with_skip(&["node_modules"]);

        assert!(classifier.accepts_dir("src", Path::new("/home/me/src")));
        assert!(!classifier.accepts_dir(".git", Path::new("/home/me/.git")));
        assert!(!classifier.accepts_dir("node_modules", Path::new("/home/me/node_modules")));
        assert!(!classifier.accepts_dir("Local", Path::new("C:/Users/me/APPDATA/Local")));
        assert!(!classifier.accepts_dir("cache", Path::new("/home/me/appdata/cache")));
    }

    #[test]
    fn test_empty_rules_accept_everything() {
        let classifier = PathClassifier::new("", Vec::new(), HashSet::new(), Vec::new());

        assert!(classifier.accepts_file(".hidden"));
        assert!(classifier.accepts_file("name."));
        assert!(classifier.accepts_dir(".git", Path::new("/r/.git")));
    }

    #[test]
    fn test_default_uses_config_defaults() {
        let classifier = PathClassifier::default();

        assert!(!classifier.accepts_dir("node_modules", Path::new("/r/node_modules")));
        assert!(!classifier.accepts_file(".env"));
    }
}
