use serde::{Deserialize, Serialize};

use crate::models::{FileIndex, FolderIndex};

/// 索引文件的持久化格式
///
/// 完整扫描写入全部字段；增量重建只写 `file_index` 和 `total_files`，
/// 因此其余字段在读取时都可能缺失。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    #[serde(default)]
    pub file_index: FileIndex,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_index: Option<FolderIndex>,

    #[serde(default)]
    pub total_files: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_folders: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanned_directories: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_timestamp: Option<String>,
}

/// 内存中的索引状态
///
/// 一个状态对象就是一次索引会话，扫描与重建通过 `&mut` 修改它。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexState {
    pub files: FileIndex,
    pub folders: FolderIndex,
    pub total_files: usize,
    pub total_folders: usize,
    pub scanned_directories: Vec<String>,
    pub scan_timestamp: Option<String>,
}

impl IndexState {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty()
    }

    /// 完整扫描的快照
    pub fn to_snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            file_index: self.files.clone(),
            folder_index: Some(self.folders.clone()),
            total_files: self.total_files,
            total_folders: Some(self.total_folders),
            scanned_directories: Some(self.scanned_directories.clone()),
            scan_timestamp: self.scan_timestamp.clone(),
        }
    }

    /// 增量重建的快照，只包含文件索引与文件总数
    pub fn to_incremental_snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            file_index: self.files.clone(),
            total_files: self.total_files,
            ..IndexSnapshot::default()
        }
    }
}

impl From<IndexSnapshot> for IndexState {
    fn from(snapshot: IndexSnapshot) -> Self {
        let folders = snapshot.folder_index.unwrap_or_default();
        Self {
            total_folders: snapshot.total_folders.unwrap_or_else(|| folders.total_paths()),
            files: snapshot.file_index,
            folders,
            total_files: snapshot.total_files,
            scanned_directories: snapshot.scanned_directories.unwrap_or_default(),
            scan_timestamp: snapshot.scan_timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> IndexState {
        let mut state = IndexState::default();
        state.files.insert("a.txt", "/r/a.txt");
        state.folders.insert("docs", "/r/docs");
        state.total_files = 1;
        state.total_folders = 1;
        state.scanned_directories = vec!["/r".to_string()];
        state.scan_timestamp = Some("2024-01-01 00:00:00".to_string());
        state
    }

    #[test]
    fn test_full_snapshot_has_all_keys() {
        let json = serde_json::to_value(sample_state().to_snapshot()).unwrap();
        let object = json.as_object().unwrap();

        for key in [
            "file_index",
            "folder_index",
            "total_files",
            "total_folders",
            "scanned_directories",
            "scan_timestamp",
        ] {
            assert!(object.contains_key(key), "缺少字段 {key}");
        }
    }

    #[test]
    fn test_incremental_snapshot_writes_two_keys() {
        let json = serde_json::to_value(sample_state().to_incremental_snapshot()).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();

        assert_eq!(keys, vec!["file_index".to_string(), "total_files".to_string()]);
    }

    #[test]
    fn test_reader_tolerates_missing_keys() {
        let snapshot: IndexSnapshot = serde_json::from_str(
            r#"{"file_index": {"a.txt": ["/r/a.txt"]}, "total_files": 1}"#,
        )
        .unwrap();
        let state = IndexState::from(snapshot);

        assert_eq!(state.total_files, 1);
        assert!(state.folders.is_empty());
        assert_eq!(state.total_folders, 0);
        assert!(state.scan_timestamp.is_none());
    }

    #[test]
    fn test_state_survives_full_snapshot() {
        let state = sample_state();
        assert_eq!(IndexState::from(state.to_snapshot()), state);
    }
}
