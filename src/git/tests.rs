use super::*;
use crate::constants::MAX_FILE_DIFF_CHARS;
use crate::test_support::{FakeRunner, ScriptedSelector};
use std::fs;
use tempfile::TempDir;

const FILES: [&str; 5] = [
    "README.md",
    "main.py",
    "test/__init__.py",
    "test/test_main.py",
    "docs/guide.md",
];

/// helper to initialise a test repository with five untracked files
fn setup_test_repo() -> (TempDir, WorkingTree) {
    let temp_dir = TempDir::new().unwrap();
    let repo = Repository::init(temp_dir.path()).unwrap();

    // configure git user for commits
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    for file in FILES {
        create_file(temp_dir.path(), file, &format!("contents of {file}\n"));
    }

    let tree = locate_root(temp_dir.path()).unwrap();
    (temp_dir, tree)
}

/// helper to create a file (and its directories) with content
fn create_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// helper to stage specific paths through the tree's own index
fn add_paths(tree: &WorkingTree, paths: &[&str]) {
    let mut index = tree.repo.index().unwrap();
    for path in paths {
        index.add_path(Path::new(path)).unwrap();
    }
    index.write().unwrap();
}

/// helper to commit whatever is staged
fn commit_index(tree: &WorkingTree, message: &str) {
    let repo = &tree.repo;
    let mut index = repo.index().unwrap();
    let tree_id = index.write_tree().unwrap();
    let git_tree = repo.find_tree(tree_id).unwrap();
    let signature = repo.signature().unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &git_tree,
        &parents,
    )
    .unwrap();
}

/// helper to stage and commit everything
fn commit_all(tree: &WorkingTree, message: &str) {
    stage(tree, &FakeRunner::new(), StageMode::All).unwrap();
    commit_index(tree, message);
}

#[test]
fn test_locate_root_from_subdirectory() {
    let (temp_dir, tree) = setup_test_repo();
    let expected = temp_dir.path().canonicalize().unwrap();
    assert_eq!(tree.root(), expected);

    let nested = locate_root(&temp_dir.path().join("test")).unwrap();
    assert_eq!(nested.root(), expected);
}

#[test]
fn test_locate_root_outside_repository() {
    let temp_dir = TempDir::new().unwrap();
    let result = locate_root(temp_dir.path());
    assert!(matches!(result, Err(Error::NotARepository(_))));
}

#[test]
fn test_branch_on_unborn_repository() {
    let (_temp_dir, tree) = setup_test_repo();
    // whatever init.defaultBranch says, an unborn branch still has a name
    assert!(tree.branch().is_some_and(|b| !b.is_empty()));
}

#[test]
fn test_list_changes_tracks_index() {
    let (temp_dir, tree) = setup_test_repo();

    let changes = list_changes(&tree).unwrap();
    assert_eq!(changes.len(), 5);
    assert!(
        changes
            .files
            .iter()
            .all(|f| f.status == ChangeStatus::Untracked)
    );
    assert_eq!(changes.files[0].path, "README.md", "sorted by path");

    add_paths(&tree, &["README.md"]);
    assert_eq!(list_changes(&tree).unwrap().len(), 4);

    create_file(temp_dir.path(), "README.md", "something else entirely\n");
    let changes = list_changes(&tree).unwrap();
    assert_eq!(changes.len(), 5);
    let readme = changes.files.iter().find(|f| f.path == "README.md").unwrap();
    assert_eq!(readme.status, ChangeStatus::Modified);
}

#[test]
fn test_list_changes_skips_ignored_files() {
    let (temp_dir, tree) = setup_test_repo();
    create_file(temp_dir.path(), ".gitignore", "*.log\n");
    create_file(temp_dir.path(), "debug.log", "noise\n");

    let paths = list_changes(&tree).unwrap().paths();
    assert!(paths.contains(&".gitignore".to_string()));
    assert!(!paths.contains(&"debug.log".to_string()));
}

#[test]
fn test_list_changes_reports_deletions() {
    let (temp_dir, tree) = setup_test_repo();
    commit_all(&tree, "initial commit");

    fs::remove_file(temp_dir.path().join("README.md")).unwrap();

    let changes = list_changes(&tree).unwrap();
    assert_eq!(
        changes.files,
        vec![FileChange {
            path: "README.md".into(),
            status: ChangeStatus::Deleted
        }]
    );
}

#[test]
fn test_stage_all_is_idempotent() {
    let (_temp_dir, tree) = setup_test_repo();
    let runner = FakeRunner::new();

    assert!(!list_changes(&tree).unwrap().is_empty());

    stage(&tree, &runner, StageMode::All).unwrap();
    assert!(list_changes(&tree).unwrap().is_empty());
    let summary = summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap();

    stage(&tree, &runner, StageMode::All).unwrap();
    assert!(list_changes(&tree).unwrap().is_empty());
    assert_eq!(summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap(), summary);

    assert_eq!(runner.count("git status --short"), 2);
}

#[test]
fn test_stage_all_when_preview_fails() {
    let (_temp_dir, tree) = setup_test_repo();

    stage(&tree, &FakeRunner::failing(), StageMode::All).unwrap();

    assert!(list_changes(&tree).unwrap().is_empty());
}

#[test]
fn test_stage_all_with_deleted_file() {
    let (temp_dir, tree) = setup_test_repo();
    commit_all(&tree, "initial commit");
    fs::remove_file(temp_dir.path().join("README.md")).unwrap();

    stage(&tree, &FakeRunner::new(), StageMode::All).unwrap();

    assert!(list_changes(&tree).unwrap().is_empty());
    let summary = summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap();
    assert!(summary.contains("### README.md (deleted)"), "{summary}");
}

#[test]
fn test_stage_pick_stages_only_selection() {
    let (_temp_dir, tree) = setup_test_repo();
    let all = list_changes(&tree).unwrap();
    let first = all.files[0].path.clone();
    let mut selector = ScriptedSelector::choosing([first.clone()]);

    stage(&tree, &FakeRunner::new(), StageMode::Pick(&mut selector)).unwrap();

    assert_eq!(selector.offered(), &[all.paths()]);
    let remaining = list_changes(&tree).unwrap();
    assert_eq!(remaining.len(), all.len() - 1);
    assert!(!remaining.paths().contains(&first));
}

#[test]
fn test_stage_pick_cancelled_stages_nothing() {
    let (_temp_dir, tree) = setup_test_repo();
    let mut selector = ScriptedSelector::cancelling();

    let result = stage(&tree, &FakeRunner::new(), StageMode::Pick(&mut selector));

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(list_changes(&tree).unwrap().len(), 5);
    assert_eq!(summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap(), "");
}

#[test]
fn test_stage_pick_with_nothing_to_pick() {
    let (_temp_dir, tree) = setup_test_repo();
    commit_all(&tree, "initial commit");
    let mut selector = ScriptedSelector::cancelling();

    stage(&tree, &FakeRunner::new(), StageMode::Pick(&mut selector)).unwrap();

    assert!(selector.offered().is_empty(), "selector shouldn't be shown");
}

#[test]
fn test_summarize_staged_without_commits() {
    let (_temp_dir, tree) = setup_test_repo();
    let staged = ["README.md", "main.py", "test/__init__.py"];
    add_paths(&tree, &staged);

    let summary = summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap();

    for path in staged {
        assert!(summary.contains(&format!("### {path} (added)")), "{summary}");
    }
    assert!(summary.contains("+contents of main.py"));
    assert!(!summary.contains("docs/guide.md"));
}

#[test]
fn test_summarize_nothing_staged() {
    let (_temp_dir, tree) = setup_test_repo();
    assert_eq!(summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap(), "");

    commit_all(&tree, "initial commit");
    assert_eq!(summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap(), "");
}

#[test]
fn test_summarize_staged_after_commit() {
    let (temp_dir, tree) = setup_test_repo();
    add_paths(&tree, &["README.md"]);
    commit_index(&tree, "initial commit");

    create_file(temp_dir.path(), "README.md", "rewritten readme\n");
    stage(&tree, &FakeRunner::new(), StageMode::All).unwrap();

    let summary = summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap();
    assert!(summary.contains("### README.md (modified)"));
    assert!(summary.contains("-contents of README.md"));
    assert!(summary.contains("+rewritten readme"));
    for file in &FILES[1..] {
        assert!(summary.contains(&format!("### {file} (added)")), "{file}");
    }
}

#[test]
fn test_large_diffs_are_replaced() {
    let (temp_dir, tree) = setup_test_repo();
    add_paths(&tree, &["README.md"]);
    commit_index(&tree, "initial commit");
    stage(&tree, &FakeRunner::new(), StageMode::All).unwrap();

    let summary = summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap();
    assert!(!summary.contains(TOO_LARGE_MARKER));

    let alphabet = "abcdefghijklmnopqrstuvwxyz";
    create_file(temp_dir.path(), "large_file.txt", &alphabet.repeat(20_000));
    add_paths(&tree, &["large_file.txt"]);

    let summary = summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap();
    assert!(summary.contains(&format!("[large_file.txt] {TOO_LARGE_MARKER}")));
    assert!(!summary.contains(&alphabet.repeat(10)), "no partial content");
    // small files alongside it are still shown literally
    assert!(summary.contains("+contents of main.py"));
}

#[test]
fn test_size_limit_is_configurable() {
    let (_temp_dir, tree) = setup_test_repo();
    add_paths(&tree, &["README.md"]);

    let tight = summarize_staged(&tree, 10).unwrap();
    assert!(tight.contains(&format!("### README.md (added)\n[README.md] {TOO_LARGE_MARKER}")));
    assert!(!tight.contains("+contents of README.md"));

    let roomy = summarize_staged(&tree, 10_000).unwrap();
    assert!(roomy.contains("+contents of README.md"));
}

#[test]
fn test_rename_shown_as_single_section() {
    let (temp_dir, tree) = setup_test_repo();
    commit_all(&tree, "initial commit");

    fs::rename(
        temp_dir.path().join("docs/guide.md"),
        temp_dir.path().join("docs/manual.md"),
    )
    .unwrap();
    stage(&tree, &FakeRunner::new(), StageMode::All).unwrap();

    let summary = summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap();
    assert!(
        summary.contains("### docs/manual.md (renamed from docs/guide.md)"),
        "{summary}"
    );
    assert_eq!(summary.matches("### ").count(), 1);
}

#[test]
fn test_summarize_range() {
    let (_temp_dir, tree) = setup_test_repo();
    add_paths(&tree, &["README.md"]);
    commit_index(&tree, "Initial commit");
    add_paths(&tree, &["main.py"]);
    commit_index(&tree, "Second commit\n\nwith a body");

    let (log, diffs) = summarize_range(&tree, "HEAD~1", MAX_FILE_DIFF_CHARS).unwrap();

    assert!(diffs.contains("### main.py (added)"));
    assert!(!diffs.contains("README.md"));
    assert!(log.contains("    Second commit"));
    assert!(log.contains("    with a body"));
    assert!(log.contains("(Test User)"));
    assert!(!log.contains("Initial commit"));
}

#[test]
fn test_summarize_range_with_deleted_file() {
    let (temp_dir, tree) = setup_test_repo();
    commit_all(&tree, "initial commit");
    fs::remove_file(temp_dir.path().join("README.md")).unwrap();
    commit_all(&tree, "remove readme");

    let (log, diffs) = summarize_range(&tree, "HEAD~1", MAX_FILE_DIFF_CHARS).unwrap();

    assert!(diffs.contains("### README.md (deleted)"), "{diffs}");
    assert!(log.contains("remove readme"));
}

/// helper to create a repository at `relative` with one commit and record it as a gitlink
fn add_submodule(root: &Path, tree: &WorkingTree, relative: &str) -> Repository {
    let sub_path = root.join(relative);
    let sub = Repository::init(&sub_path).unwrap();
    create_file(&sub_path, "lib.rs", "pub fn lib() {}\n");
    let head = commit_nested(&sub, "nested initial commit");

    let mut index = tree.repo.index().unwrap();
    let time = git2::IndexTime::new(0, 0);
    index
        .add(&git2::IndexEntry {
            ctime: time,
            mtime: time,
            dev: 0,
            ino: 0,
            mode: 0o160000,
            uid: 0,
            gid: 0,
            file_size: 0,
            id: head,
            flags: 0,
            flags_extended: 0,
            path: relative.as_bytes().to_vec(),
        })
        .unwrap();
    index.write().unwrap();
    sub
}

/// helper to commit every file in a nested repository
fn commit_nested(repo: &Repository, message: &str) -> git2::Oid {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let git_tree = repo.find_tree(tree_id).unwrap();
    let signature = git2::Signature::now("Test User", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &git_tree,
        &parents,
    )
    .unwrap()
}

#[test]
fn test_dirty_submodule_is_not_listed() {
    let (temp_dir, tree) = setup_test_repo();
    commit_all(&tree, "initial commit");
    let sub = add_submodule(temp_dir.path(), &tree, "vendor/sub");
    commit_index(&tree, "add submodule");

    create_file(&temp_dir.path().join("vendor/sub"), "more.rs", "\n");
    commit_nested(&sub, "nested second commit");

    assert!(list_changes(&tree).unwrap().is_empty());
}

#[test]
fn test_deleted_submodule_is_staged_and_summarized() {
    let (temp_dir, tree) = setup_test_repo();
    commit_all(&tree, "initial commit");
    add_submodule(temp_dir.path(), &tree, "vendor/sub");
    commit_index(&tree, "add submodule");
    assert!(list_changes(&tree).unwrap().is_empty());

    fs::remove_dir_all(temp_dir.path().join("vendor/sub")).unwrap();

    let changes = list_changes(&tree).unwrap();
    assert_eq!(
        changes.files,
        vec![FileChange {
            path: "vendor/sub".into(),
            status: ChangeStatus::Deleted
        }]
    );

    stage(&tree, &FakeRunner::new(), StageMode::All).unwrap();

    assert!(list_changes(&tree).unwrap().is_empty());
    let summary = summarize_staged(&tree, MAX_FILE_DIFF_CHARS).unwrap();
    assert!(summary.contains("### vendor/sub (deleted)"), "{summary}");

    commit_index(&tree, "remove submodule");
    let (log, diffs) = summarize_range(&tree, "HEAD~1", MAX_FILE_DIFF_CHARS).unwrap();
    assert!(diffs.contains("### vendor/sub (deleted)"), "{diffs}");
    assert!(log.contains("remove submodule"));
}

#[test]
fn test_summarize_range_with_unknown_base() {
    let (_temp_dir, tree) = setup_test_repo();
    commit_all(&tree, "initial commit");

    let result = summarize_range(&tree, "no-such-branch", MAX_FILE_DIFF_CHARS);
    assert!(matches!(result, Err(Error::Git(_))));
}

#[test]
fn test_remote_url() {
    let (_temp_dir, tree) = setup_test_repo();
    assert_eq!(remote_url(&tree), None);

    let mut config = tree.repo.config().unwrap();
    config
        .set_str("remote.upstream.url", "https://gitlab.com/group/project.git")
        .unwrap();
    assert_eq!(
        remote_url(&tree).as_deref(),
        Some("https://gitlab.com/group/project")
    );

    config
        .set_str("remote.origin.url", "git@github.com:owner/project.git")
        .unwrap();
    assert_eq!(
        remote_url(&tree).as_deref(),
        Some("https://github.com/owner/project")
    );
}

#[test]
fn test_remote_url_unparseable() {
    let (_temp_dir, tree) = setup_test_repo();
    let mut config = tree.repo.config().unwrap();
    config
        .set_str("remote.origin.url", ":::not-parseable")
        .unwrap();

    assert_eq!(remote_url(&tree), None);
}
