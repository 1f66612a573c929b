use std::collections::HashSet;
use rayon::prelude::*;

use crate::models::IndexState;

/// 搜索方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// 文件名或文件路径包含关键字
    Combined,

    /// 路径包含关键字的文件夹及其下所有文件夹
    FoldersOnly,

    /// 文件夹名和文件名包含关键字
    Names,

    /// 按扩展名查找文件
    Extension,
}

impl SearchMode {
    pub fn label(&self) -> &'static str {
        match self {
            SearchMode::Combined => "综合",
            SearchMode::FoldersOnly => "文件夹",
            SearchMode::Names => "名称",
            SearchMode::Extension => "扩展名",
        }
    }

    /// 下一个搜索方式（TUI 中用 Tab 切换）
    pub fn next(&self) -> Self {
        match self {
            SearchMode::Combined => SearchMode::FoldersOnly,
            SearchMode::FoldersOnly => SearchMode::Names,
            SearchMode::Names => SearchMode::Extension,
            SearchMode::Extension => SearchMode::Combined,
        }
    }
}

/// 解析查询前缀：`-f ` 只搜文件夹，`-s ` 搜名称，其余为综合搜索
pub fn parse_query(input: &str) -> (SearchMode, &str) {
    if let Some(rest) = input.strip_prefix("-f ") {
        (SearchMode::FoldersOnly, rest)
    } else if let Some(rest) = input.strip_prefix("-s ") {
        (SearchMode::Names, rest)
    } else {
        (SearchMode::Combined, input)
    }
}

/// 按指定方式搜索，结果按路径排序
pub fn search(state: &IndexState, mode: SearchMode, query: &str) -> Vec<String> {
    if state.is_empty() {
        tracing::info!("索引为空，请先建立索引");
        return Vec::new();
    }

    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let mut results = match mode {
        SearchMode::Combined => search_combined(state, query),
        SearchMode::FoldersOnly => search_folders(state, query),
        SearchMode::Names => search_names(state, query),
        SearchMode::Extension => search_extension(state, query),
    };
    results.sort();
    results
}

/// 文件名或路径中包含关键字（忽略大小写）
fn search_combined(state: &IndexState, query: &str) -> Vec<String> {
    let query = query.to_lowercase();

    state
        .files
        .iter()
        .par_bridge()
        .flat_map_iter(|(name, paths)| {
            let name_matches = name.to_lowercase().contains(&query);
            paths
                .iter()
                .filter(|path| name_matches || path.to_lowercase().contains(&query))
                .cloned()
                .collect::<Vec<_>>()
        })
        .collect()
}

/// 路径包含关键字的文件夹下的所有子文件夹
fn search_folders(state: &IndexState, query: &str) -> Vec<String> {
    let query = query.to_lowercase();
    let all_folders: Vec<(String, &String)> = state
        .folders
        .iter()
        .flat_map(|(_, paths)| paths.iter())
        .map(|path| (path.to_lowercase(), path))
        .collect();

    let parents: Vec<&String> = all_folders
        .iter()
        .filter(|(lowered, _)| lowered.contains(&query))
        .map(|(lowered, _)| lowered)
        .collect();

    let matches: HashSet<&String> = all_folders
        .par_iter()
        .filter(|(lowered, _)| {
            parents.iter().any(|parent| {
                lowered.len() > parent.len()
                    && lowered.starts_with(parent.as_str())
                    && matches!(lowered.as_bytes()[parent.len()], b'/' | b'\\')
            })
        })
        .map(|(_, path)| *path)
        .collect();

    matches.into_iter().cloned().collect()
}

/// 文件夹名和文件名包含关键字
fn search_names(state: &IndexState, query: &str) -> Vec<String> {
    let query = query.to_lowercase();

    state
        .folders
        .iter()
        .chain(state.files.iter())
        .par_bridge()
        .filter(|(name, _)| name.to_lowercase().contains(&query))
        .flat_map_iter(|(_, paths)| paths.iter().cloned())
        .collect()
}

/// 文件名以指定扩展名结尾（自动补全前导点）
fn search_extension(state: &IndexState, extension: &str) -> Vec<String> {
    let mut suffix = extension.to_lowercase();
    if !suffix.starts_with('.') {
        suffix.insert(0, '.');
    }

    state
        .files
        .iter()
        .par_bridge()
        .filter(|(name, _)| name.to_lowercase().ends_with(&suffix))
        .flat_map_iter(|(_, paths)| paths.iter().cloned())
        .collect()
}
