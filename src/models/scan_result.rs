use serde::{Deserialize, Serialize};

/// 扫描时发现的一个条目（文件或文件夹）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoundEntry {
    /// 条目名称（不含路径）
    pub name: String,

    /// 完整的绝对路径
    pub path: String,
}

impl FoundEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// 单次目录树扫描的结果
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// 发现的文件
    pub files: Vec<FoundEntry>,

    /// 发现的文件夹
    pub folders: Vec<FoundEntry>,

    /// 成功进入并列出内容的目录
    pub entered_dirs: Vec<String>,
}

impl ScanResult {
    /// 把另一份结果追加到当前结果
    pub fn merge(&mut self, other: ScanResult) {
        self.files.extend(other.files);
        self.folders.extend(other.folders);
        self.entered_dirs.extend(other.entered_dirs);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty() && self.entered_dirs.is_empty()
    }
}

/// 工作任务失败信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// 任务标识（扫描目标路径或批次编号）
    pub label: String,

    /// 错误描述
    pub error: String,
}

/// 并行扫描的汇总报告
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// 所有完成任务合并后的结果
    pub result: ScanResult,

    /// 失败的任务
    pub failures: Vec<TaskFailure>,

    /// 扫描目标数量
    pub targets: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_appends_everything() {
        let mut left = ScanResult {
            files: vec![FoundEntry::new("a.txt", "/r/a.txt")],
            folders: vec![],
            entered_dirs: vec!["/r".to_string()],
        };
        let right = ScanResult {
            files: vec![FoundEntry::new("a.txt", "/r/docs/a.txt")],
            folders: vec![FoundEntry::new("docs", "/r/docs")],
            entered_dirs: vec!["/r/docs".to_string()],
        };

        left.merge(right);

        assert_eq!(left.files.len(), 2);
        assert_eq!(left.folders, vec![FoundEntry::new("docs", "/r/docs")]);
        assert_eq!(left.entered_dirs, vec!["/r".to_string(), "/r/docs".to_string()]);
        assert!(!left.is_empty());
        assert!(ScanResult::default().is_empty());
    }
}
