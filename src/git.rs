use crate::changeset::{ChangeStatus, FileChange, FileChangeSet};
use crate::constants::{RENAME_THRESHOLD, TOO_LARGE_MARKER};
use crate::error::{Error, Result};
use crate::remote;
use crate::run::{RunOptions, Runner};
use crate::ui::FileSelector;
use crate::warning;
use git2::{
    Delta, Diff, DiffFindOptions, ErrorCode, Oid, Repository, Sort, Status, StatusOptions, Tree,
};
use std::path::{Path, PathBuf};

/// an opened, non-bare repository
pub struct WorkingTree {
    repo: Repository,
    root: PathBuf,
    branch: Option<String>,
}

impl WorkingTree {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `None` on a detached HEAD
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }
}

/// find the repository containing `start`, searching upward
pub fn locate_root(start: &Path) -> Result<WorkingTree> {
    let not_a_repo = || Error::NotARepository(start.to_path_buf());

    let repo = Repository::discover(start).map_err(|_| not_a_repo())?;
    let workdir = repo.workdir().ok_or_else(not_a_repo)?;
    let root = workdir
        .canonicalize()
        .unwrap_or_else(|_| workdir.components().collect());
    let branch = current_branch(&repo);

    Ok(WorkingTree { repo, root, branch })
}

fn current_branch(repo: &Repository) -> Option<String> {
    match repo.head() {
        Ok(head) if head.is_branch() => head.shorthand().map(str::to_string),
        Ok(_) => None,
        // unborn branch: HEAD still names it
        Err(_) => repo.find_reference("HEAD").ok().and_then(|head| {
            head.symbolic_target()
                .map(|target| target.trim_start_matches("refs/heads/").to_string())
        }),
    }
}

/// untracked, modified and deleted work-tree files (relative to the index)
///
/// ignored files are skipped and deleted submodules are reported as deleted;
/// always read fresh since staging changes the answer
pub fn list_changes(tree: &WorkingTree) -> Result<FileChangeSet> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .exclude_submodules(false);

    let statuses = tree.repo.statuses(Some(&mut opts))?;

    let mut files: Vec<FileChange> = statuses
        .iter()
        .filter_map(|entry| {
            let status = classify(entry.status())?;
            let path = entry.path()?;
            // nested repositories show up as directories and can't be staged by path
            if path.ends_with('/') {
                return None;
            }
            // only a removed submodule can be staged (as a removal); dirty ones are skipped
            if status != ChangeStatus::Deleted && tree.root.join(path).is_dir() {
                return None;
            }
            Some(FileChange {
                path: path.to_string(),
                status,
            })
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);

    Ok(FileChangeSet { files })
}

fn classify(status: Status) -> Option<ChangeStatus> {
    if status.contains(Status::WT_NEW) {
        Some(ChangeStatus::Untracked)
    } else if status.contains(Status::WT_DELETED) {
        Some(ChangeStatus::Deleted)
    } else if status.intersects(Status::WT_MODIFIED | Status::WT_TYPECHANGE | Status::WT_RENAMED)
    {
        Some(ChangeStatus::Modified)
    } else {
        None
    }
}

/// which files `stage` adds to the index
pub enum StageMode<'a> {
    /// every changed or untracked file
    All,
    /// only what the selector picks from the current changes
    Pick(&'a mut dyn FileSelector),
}

/// stage work-tree changes into the index
pub fn stage(tree: &WorkingTree, runner: &dyn Runner, mode: StageMode<'_>) -> Result<()> {
    let mut changes = list_changes(tree)?;

    match mode {
        StageMode::All => {
            // preview only; staging goes ahead regardless
            if let Err(e) = runner.run("git status --short", None, RunOptions::shown()) {
                warning!("could not preview changes ({}), staging everything", e);
            }
        }
        StageMode::Pick(selector) => {
            if changes.is_empty() {
                return Ok(());
            }
            let chosen = selector.select(&changes.paths())?;
            changes.retain_paths(&chosen);
        }
    }

    stage_files(tree, &changes)
}

fn stage_files(tree: &WorkingTree, changes: &FileChangeSet) -> Result<()> {
    if changes.is_empty() {
        return Ok(());
    }

    let mut index = tree.repo.index()?;

    // collect all errors before writing index
    let mut errors = Vec::new();
    for file in &changes.files {
        let path = Path::new(&file.path);
        let result = match file.status {
            ChangeStatus::Deleted => index.remove_path(path),
            ChangeStatus::Untracked | ChangeStatus::Modified => index.add_path(path),
        };
        if let Err(e) = result {
            errors.push(format!("failed to stage {}: {}", file.path, e.message()));
        }
    }

    if !errors.is_empty() {
        // rollback by reloading from disk
        if let Err(e) = index.read(true) {
            warning!("failed to reload index during rollback: {}", e);
        }
        for error in &errors {
            crate::error!("{}", error);
        }
        return Err(Error::Git(git2::Error::from_str(&format!(
            "failed to stage {} file(s)",
            errors.len()
        ))));
    }

    index.write()?;
    Ok(())
}

/// the staged diff (index against HEAD, or the empty tree before the first commit)
///
/// empty string means nothing is staged
pub fn summarize_staged(tree: &WorkingTree, limit: usize) -> Result<String> {
    let repo = &tree.repo;
    let head = head_tree(repo)?;

    let mut diff = repo.diff_tree_to_index(head.as_ref(), None, None)?;
    detect_renames(&mut diff)?;

    Ok(render_summary(&diff, limit))
}

/// commits on HEAD that aren't on `base_ref`, plus the diff since they forked
pub fn summarize_range(tree: &WorkingTree, base_ref: &str, limit: usize) -> Result<(String, String)> {
    let repo = &tree.repo;

    let base = repo.revparse_single(base_ref)?.peel_to_commit()?;
    let head = repo.head()?.peel_to_commit()?;
    let fork_point = repo.merge_base(base.id(), head.id()).unwrap_or(base.id());

    let log = commit_log(repo, head.id(), base.id())?;

    let old_tree = repo.find_commit(fork_point)?.tree()?;
    let new_tree = head.tree()?;
    let mut diff = repo.diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;
    detect_renames(&mut diff)?;

    Ok((log, render_summary(&diff, limit)))
}

/// browsable url for `origin` (or the first remote), if it parses
pub fn remote_url(tree: &WorkingTree) -> Option<String> {
    let repo = &tree.repo;
    let remote = repo.find_remote("origin").ok().or_else(|| {
        let names = repo.remotes().ok()?;
        let first = names.iter().flatten().next()?.to_string();
        repo.find_remote(&first).ok()
    })?;
    remote::web_url(remote.url()?)
}

fn head_tree(repo: &Repository) -> Result<Option<Tree<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_tree()?)),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn detect_renames(diff: &mut Diff<'_>) -> Result<()> {
    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    find_opts.rename_threshold(RENAME_THRESHOLD);
    find_opts.copy_threshold(RENAME_THRESHOLD);
    diff.find_similar(Some(&mut find_opts))?;
    Ok(())
}

fn commit_log(repo: &Repository, head: Oid, base: Oid) -> Result<String> {
    use std::fmt::Write;

    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    walk.push(head)?;
    walk.hide(base)?;

    let mut log = String::new();
    for oid in walk {
        let commit = repo.find_commit(oid?)?;
        let short_id = commit.as_object().short_id()?;
        let author = commit.author();
        let _ = writeln!(
            log,
            "commit {} ({})",
            short_id.as_str().unwrap_or_default(),
            author.name().unwrap_or("unknown")
        );
        for line in commit.message().unwrap_or_default().trim_end().lines() {
            let _ = writeln!(log, "    {line}");
        }
        log.push('\n');
    }

    Ok(log.trim_end().to_string())
}

/// one section per file: a header line, then the patch or a placeholder
fn render_summary(diff: &Diff<'_>, limit: usize) -> String {
    let mut sections = Vec::new();

    for idx in 0..diff.deltas().len() {
        let Some(delta) = diff.get_delta(idx) else {
            continue;
        };
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        let kind = delta_kind(delta.status());
        let header = match (delta.status(), delta.old_file().path()) {
            (Delta::Renamed | Delta::Copied, Some(old)) => {
                format!("### {path} ({kind} from {})", old.display())
            }
            _ => format!("### {path} ({kind})"),
        };

        // submodule and binary deltas may have no printable patch
        let patch_text = match git2::Patch::from_diff(diff, idx) {
            Ok(Some(mut patch)) => patch
                .to_buf()
                .ok()
                .map(|buf| String::from_utf8_lossy(&buf).trim_end().to_string()),
            _ => None,
        };
        let body = match patch_text {
            Some(text) if text.chars().count() > limit => format!("[{path}] {TOO_LARGE_MARKER}"),
            Some(text) if !text.is_empty() => text,
            _ if delta.status() == Delta::Deleted => format!("{path} was removed"),
            _ => format!("{path}: no textual diff"),
        };

        sections.push(format!("{header}\n{body}"));
    }

    sections.join("\n\n")
}

fn delta_kind(status: Delta) -> &'static str {
    match status {
        Delta::Added | Delta::Untracked => "added",
        Delta::Deleted => "deleted",
        Delta::Modified => "modified",
        Delta::Renamed => "renamed",
        Delta::Copied => "copied",
        Delta::Typechange => "typechange",
        _ => "changed",
    }
}

#[cfg(test)]
mod tests;
