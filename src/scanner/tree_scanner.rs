use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

use crate::models::{FoundEntry, ScanResult};
use crate::scanner::PathClassifier;

/// 目录树扫描器 - 递归遍历目录，收集文件和文件夹
///
/// 深度不受限制：walkdir 用堆上的目录栈代替函数递归，
/// 实际可扫描的深度只受内存和文件系统路径长度限制。
#[derive(Debug, Clone)]
pub struct TreeScanner {
    /// 只读的分类规则，各任务共享
    classifier: Arc<PathClassifier>,

    /// 是否跟随符号链接
    follow_symlinks: bool,
}

impl TreeScanner {
    /// 创建新的目录树扫描器
    pub fn new(classifier: Arc<PathClassifier>, follow_symlinks: bool) -> Self {
        Self {
            classifier,
            follow_symlinks,
        }
    }

    pub fn classifier(&self) -> &PathClassifier {
        &self.classifier
    }

    /// 扫描 `root` 下的所有条目（不包括 `root` 本身）
    ///
    /// `root` 不存在时返回空结果；无法列出的目录会被跳过，不会中断扫描。
    pub fn scan(&self, root: &Path) -> ScanResult {
        self.scan_pruned(root, &HashSet::new())
    }

    /// 扫描 `root`，但不进入 `delegated` 中的目录（这些目录由其他任务负责）
    pub fn scan_pruned(&self, root: &Path, delegated: &HashSet<PathBuf>) -> ScanResult {
        let mut result = ScanResult::default();

        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        if !root.is_dir() {
            tracing::debug!("路径不存在或不是目录: {}", root.display());
            return result;
        }

        let mut visited_dirs: Vec<PathBuf> = Vec::new();
        let mut failed_dirs: HashSet<PathBuf> = HashSet::new();

        let walker = WalkDir::new(&root)
            .follow_links(self.follow_symlinks)
            .into_iter()
            .filter_entry(|entry| self.should_descend(entry, delegated));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.depth() == 0 {
                        visited_dirs.push(entry.into_path());
                        continue;
                    }

                    let Some((name, path)) = utf8_name_and_path(entry.path()) else {
                        tracing::debug!("跳过非 UTF-8 路径: {}", entry.path().display());
                        continue;
                    };

                    if entry.file_type().is_dir() {
                        result.folders.push(FoundEntry::new(name, path));
                        visited_dirs.push(entry.into_path());
                    } else if Self::is_file(&entry) && self.classifier.accepts_file(&name) {
                        result.files.push(FoundEntry::new(name, path));
                    }
                }
                Err(err) => {
                    // 权限不足等错误：该子树不再贡献结果，继续扫描其余部分
                    if let Some(path) = err.path() {
                        failed_dirs.insert(path.to_path_buf());
                    }
                    tracing::debug!("无法访问: {}", err);
                }
            }
        }

        result.entered_dirs = visited_dirs
            .into_iter()
            .filter(|dir| !failed_dirs.contains(dir))
            .filter_map(|dir| dir.to_str().map(str::to_string))
            .collect();

        result
    }

    /// 过滤条件：文件总是通过（由后续逻辑判断），目录需要通过分类器
    fn should_descend(&self, entry: &DirEntry, delegated: &HashSet<PathBuf>) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }

        // 非 UTF-8 目录下的路径都无法原样记录，整个子树跳过
        let Some((name, _)) = utf8_name_and_path(entry.path()) else {
            tracing::debug!("跳过非 UTF-8 目录: {}", entry.path().display());
            return false;
        };
        if !self.classifier.accepts_dir(&name, entry.path()) {
            tracing::debug!("跳过目录: {}", entry.path().display());
            return false;
        }

        !delegated.contains(entry.path())
    }

    /// 普通文件，或指向文件的符号链接
    fn is_file(entry: &DirEntry) -> bool {
        let file_type = entry.file_type();
        file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
    }
}

/// 名称和完整路径都是合法 UTF-8 时才返回
///
/// 有损转换得到的路径在磁盘上并不存在，不能写入索引。
pub(crate) fn utf8_name_and_path(path: &Path) -> Option<(String, String)> {
    let name = path.file_name()?.to_str()?;
    let full = path.to_str()?;
    Some((name.to_string(), full.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn scanner() -> TreeScanner {
        let classifier = PathClassifier::new(
            ".",
            vec![".".to_string(), "android".to_string()],
            ["skipme".to_string()].into_iter().collect(),
            vec!["appdata".to_string()],
        );
        TreeScanner::new(Arc::new(classifier), false)
    }

    fn names(entries: &[FoundEntry]) -> Vec<String> {
        let mut names: Vec<_> = entries.iter().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_missing_root_returns_empty() {
        let temp_dir = tempdir().unwrap();
        let result = scanner().scan(&temp_dir.path().join("does-not-exist"));
        assert!(result.is_empty());
    }

    #[test]
    fn test_scan_nested_tree() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();

        // 创建测试目录结构
        fs::create_dir_all(root.join("docs/deep/deeper")).unwrap();
        fs::write(root.join("top.txt"), "top").unwrap();
        fs::write(root.join("docs/a.txt"), "a").unwrap();
        fs::write(root.join("docs/deep/deeper/z.md"), "z").unwrap();

        let result = scanner().scan(root);

        assert_eq!(names(&result.files), vec!["a.txt", "top.txt", "z.md"]);
        assert_eq!(names(&result.folders), vec!["deep", "deeper", "docs"]);
        assert_eq!(result.entered_dirs.len(), 4);
        assert!(result
            .files
            .iter()
            .any(|f| f.path == root.join("docs/deep/deeper/z.md").to_string_lossy()));
        assert!(result.files.iter().all(|f| Path::new(&f.path).is_absolute()));
    }

    #[test]
    fn test_excluded_entries_are_skipped() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::create_dir_all(root.join("skipme")).unwrap();
        fs::create_dir_all(root.join("AppData/Local")).unwrap();
        fs::write(root.join(".hidden/b.txt"), "b").unwrap();
        fs::write(root.join("skipme/c.txt"), "c").unwrap();
        fs::write(root.join("AppData/Local/d.txt"), "d").unwrap();
        fs::write(root.join(".dotfile"), "").unwrap();
        fs::write(root.join("trailing."), "").unwrap();
        fs::write(root.join("kept.txt"), "").unwrap();

        let result = scanner().scan(root);

        assert_eq!(names(&result.files), vec!["kept.txt"]);
        assert!(result.folders.is_empty());
        assert_eq!(result.entered_dirs.len(), 1);
    }

    #[test]
    fn test_scan_pruned_skips_delegated_dirs() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("mine")).unwrap();
        fs::create_dir_all(root.join("theirs")).unwrap();
        fs::write(root.join("mine/1.txt"), "").unwrap();
        fs::write(root.join("theirs/2.txt"), "").unwrap();

        let delegated: HashSet<PathBuf> = [root.join("theirs")].into_iter().collect();
        let result = scanner().scan_pruned(root, &delegated);

        assert_eq!(names(&result.files), vec!["1.txt"]);
        assert_eq!(names(&result.folders), vec!["mine"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        let bad_dir = root.join(OsStr::from_bytes(b"d\xe9j\xe0"));

        fs::create_dir_all(&bad_dir).unwrap();
        fs::write(bad_dir.join("inside.txt"), "").unwrap();
        fs::write(root.join(OsStr::from_bytes(b"caf\xe9.txt")), "").unwrap();
        fs::write(root.join("ok.txt"), "").unwrap();

        let result = scanner().scan(root);

        assert_eq!(names(&result.files), vec!["ok.txt"]);
        assert!(result.folders.is_empty());
        assert!(result.files.iter().all(|f| Path::new(&f.path).exists()));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        let locked = root.join("locked");

        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("secret.txt"), "").unwrap();
        fs::write(root.join("open.txt"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root 用户不受权限限制，此时无法模拟拒绝访问
        let denied = fs::read_dir(&locked).is_err();
        let result = scanner().scan(root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(names(&result.files).contains(&"open.txt".to_string()));
        if denied {
            assert!(!names(&result.files).contains(&"secret.txt".to_string()));
            assert!(!result
                .entered_dirs
                .contains(&locked.to_string_lossy().to_string()));
            // 目录本身仍被记录为文件夹
            assert_eq!(names(&result.folders), vec!["locked"]);
        }
    }
}
