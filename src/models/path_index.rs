use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 名称到完整路径列表的映射
///
/// 同名文件（或文件夹）可能出现在目录树的多个位置，因此每个名称对应一个
/// 路径列表。列表按发现/合并的顺序追加，不去重。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathIndex {
    entries: HashMap<String, Vec<String>>,
}

/// 文件名索引
pub type FileIndex = PathIndex;

/// 文件夹名索引
pub type FolderIndex = PathIndex;

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 向名称对应的列表追加一个路径
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.entries.entry(name.into()).or_default().push(path.into());
    }

    /// 追加一组路径，返回追加的数量
    pub fn extend_paths(&mut self, name: String, paths: Vec<String>) -> usize {
        let added = paths.len();
        self.entries.entry(name).or_default().extend(paths);
        added
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// 不同名称的数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 所有名称下的路径总数
    pub fn total_paths(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }

    /// 收集所有路径
    pub fn all_paths(&self) -> Vec<String> {
        self.entries.values().flatten().cloned().collect()
    }

    /// 所有路径组成的集合
    pub fn path_set(&self) -> HashSet<&str> {
        self.entries
            .values()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// 只保留 `keep` 中的路径；路径列表为空的名称整体移除。返回移除的路径数
    pub fn retain_paths(&mut self, keep: &HashSet<String>) -> usize {
        let before = self.total_paths();
        self.entries.retain(|_, paths| {
            paths.retain(|path| keep.contains(path));
            !paths.is_empty()
        });
        before - self.total_paths()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 以集合形式比较两个索引（忽略路径顺序）
    pub fn same_entries(&self, other: &PathIndex) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }

        self.entries.iter().all(|(name, paths)| {
            other.entries.get(name).is_some_and(|other_paths| {
                let mut left = paths.clone();
                let mut right = other_paths.clone();
                left.sort();
                right.sort();
                left == right
            })
        })
    }
}

impl IntoIterator for PathIndex {
    type Item = (String, Vec<String>);
    type IntoIter = std::collections::hash_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, String)> for PathIndex {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut index = PathIndex::new();
        for (name, path) in iter {
            index.insert(name, path);
        }
        index
    }
}
