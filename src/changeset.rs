/// how a work-tree file differs from the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Untracked,
    Modified,
    Deleted,
}

/// represents a single unstaged file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String, // relative to the repository root
    pub status: ChangeStatus,
}

/// unstaged changes, ordered by path; always re-queried, never cached
#[derive(Debug, Default)]
pub struct FileChangeSet {
    pub files: Vec<FileChange>,
}

impl FileChangeSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// keep only the files whose path is in `paths`
    pub fn retain_paths(&mut self, paths: &[String]) {
        self.files.retain(|f| paths.contains(&f.path));
    }
}
