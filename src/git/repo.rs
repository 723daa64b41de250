use crate::error::{Result, TallyError};
use crate::model::{CommitRecord, FileChange, PeriodWindow};
use chrono::DateTime;
use gix::object::tree::diff::ChangeDetached;
use gix::{discover, ObjectId, Repository};
use similar::{ChangeTag, TextDiff};
use std::collections::{BinaryHeap, HashSet};
use std::path::{Path, PathBuf};

/// The repository log provider: wraps a `gix` repository and exposes a lazy,
/// committer-time-ordered commit walk plus per-commit diff statistics.
pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or(std::env::current_dir()?);

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a walk from `HEAD` yielding commits whose committer time falls
    /// inside `window`, newest first. Out-of-window commits are traversed
    /// through (their parents still expand) but never yielded.
    pub fn log_since(&self, window: &PeriodWindow) -> Result<CommitWalk<'_>> {
        let mut head = self.repo.head()?;
        let head_commit = head.peel_to_commit_in_place()?;
        let head_secs = head_commit.time()?.seconds;

        let mut frontier = BinaryHeap::new();
        frontier.push((head_secs, head_commit.id));
        let mut seen = HashSet::new();
        seen.insert(head_commit.id);

        Ok(CommitWalk {
            repo: &self.repo,
            window: *window,
            frontier,
            seen,
        })
    }

    /// Per-path addition/deletion counts for one commit, diffed against its
    /// first parent (or the empty tree for a root commit). Binary blobs count
    /// as zero lines either way.
    pub fn commit_stats(&self, id: &str) -> Result<Vec<FileChange>> {
        let oid = ObjectId::from_hex(id.as_bytes())
            .map_err(|e| TallyError::Parse(format!("invalid commit id '{id}': {e}")))?;
        let commit = self.repo.find_commit(oid)?;
        let commit_tree = commit.tree()?;

        let parent_tree = match commit.parent_ids().next() {
            Some(pid) => Some(self.repo.find_commit(pid.detach())?.tree()?),
            None => None,
        };

        let changes: Vec<ChangeDetached> =
            self.repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)?;

        let mut files = Vec::new();
        for change in changes {
            self.record_change(change, &mut files)?;
        }
        Ok(files)
    }

    fn record_change(&self, change: ChangeDetached, files: &mut Vec<FileChange>) -> Result<()> {
        match change {
            ChangeDetached::Addition { id, location, .. } => {
                let obj = self.repo.find_object(id)?;
                let added = if is_binary(&obj) { 0 } else { line_count(&obj) };
                files.push(FileChange {
                    path: location.to_string(),
                    added,
                    deleted: 0,
                });
            }
            ChangeDetached::Deletion { id, location, .. } => {
                let obj = self.repo.find_object(id)?;
                let deleted = if is_binary(&obj) { 0 } else { line_count(&obj) };
                files.push(FileChange {
                    path: location.to_string(),
                    added: 0,
                    deleted,
                });
            }
            ChangeDetached::Modification {
                previous_id,
                id,
                location,
                ..
            } => {
                let old_obj = self.repo.find_object(previous_id)?;
                let new_obj = self.repo.find_object(id)?;
                let (added, deleted) = if is_binary(&old_obj) || is_binary(&new_obj) {
                    (0, 0)
                } else {
                    line_diff(&old_obj, &new_obj)
                };
                files.push(FileChange {
                    path: location.to_string(),
                    added,
                    deleted,
                });
            }
            ChangeDetached::Rewrite {
                source_id,
                id,
                source_location,
                location,
                copy,
                ..
            } => {
                let old_obj = self.repo.find_object(source_id)?;
                let new_obj = self.repo.find_object(id)?;
                let (added, deleted) = if is_binary(&old_obj) || is_binary(&new_obj) {
                    (0, 0)
                } else {
                    line_diff(&old_obj, &new_obj)
                };

                files.push(FileChange {
                    path: source_location.to_string(),
                    added: 0,
                    deleted: if copy { 0 } else { deleted },
                });
                files.push(FileChange {
                    path: location.to_string(),
                    added,
                    deleted: 0,
                });
            }
        }
        Ok(())
    }
}

/// Lazy pull over the commit graph: a max-heap keyed on committer time gives
/// newest-first ordering without materializing the history.
pub struct CommitWalk<'repo> {
    repo: &'repo Repository,
    window: PeriodWindow,
    frontier: BinaryHeap<(i64, ObjectId)>,
    seen: HashSet<ObjectId>,
}

impl CommitWalk<'_> {
    fn advance(&mut self, secs: i64, id: ObjectId) -> Result<Option<CommitRecord>> {
        let commit = self.repo.find_commit(id)?;

        let mut parent_count = 0;
        for pid in commit.parent_ids() {
            parent_count += 1;
            let pid: ObjectId = pid.into();
            if self.seen.insert(pid) {
                let parent = self.repo.find_commit(pid)?;
                self.frontier.push((parent.time()?.seconds, pid));
            }
        }

        let timestamp = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| TallyError::Parse(format!("invalid timestamp: {secs}")))?;
        if !self.window.contains(&timestamp) {
            return Ok(None);
        }

        let author = commit.author()?;
        Ok(Some(CommitRecord {
            id: id.to_string(),
            author_name: author.name.to_string(),
            author_email: author.email.to_string(),
            parent_count,
            timestamp,
        }))
    }
}

impl Iterator for CommitWalk<'_> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((secs, id)) = self.frontier.pop() {
            match self.advance(secs, id) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

fn is_binary(object: &gix::Object<'_>) -> bool {
    object.data.as_slice().iter().take(8192).any(|&b| b == 0)
}

fn line_count(object: &gix::Object<'_>) -> u32 {
    std::str::from_utf8(object.data.as_slice())
        .map(|t| t.lines().count() as u32)
        .unwrap_or(0)
}

fn line_diff(old_object: &gix::Object<'_>, new_object: &gix::Object<'_>) -> (u32, u32) {
    let old_text = std::str::from_utf8(old_object.data.as_slice()).unwrap_or("");
    let new_text = std::str::from_utf8(new_object.data.as_slice()).unwrap_or("");

    let diff = TextDiff::from_lines(old_text, new_text);
    let mut added = 0u32;
    let mut deleted = 0u32;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => deleted += 1,
            ChangeTag::Equal => {}
        }
    }
    (added, deleted)
}
