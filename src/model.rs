use chrono::{DateTime, Utc};
use serde::Serialize;

pub const SCHEMA_VERSION: u32 = 1;

/// Display name for commits whose author has neither email nor name.
pub const UNKNOWN_AUTHOR: &str = "(unknown)";

/// One commit as seen by the log provider: identity, parent count, and
/// the hex id needed to fetch its diff stats later.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub id: String,
    pub author_name: String,
    pub author_email: String,
    pub parent_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Addition/deletion counts for a single path within one commit.
#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: String,
    pub added: u32,
    pub deleted: u32,
}

/// Running per-author totals, keyed by identity (see [`identity_key`]).
/// Name and email hold the last-seen spelling for the identity.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorAggregate {
    pub author_name: String,
    pub author_email: String,
    pub commits: u32,
    pub added: u64,
    pub deleted: u64,
}

impl AuthorAggregate {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            author_name: name.to_string(),
            author_email: email.to_string(),
            commits: 0,
            added: 0,
            deleted: 0,
        }
    }

    pub fn net(&self) -> i64 {
        self.added as i64 - self.deleted as i64
    }
}

/// Process-wide sums over all counted commits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Totals {
    pub commits: u32,
    pub added: u64,
    pub deleted: u64,
}

impl Totals {
    pub fn net(&self) -> i64 {
        self.added as i64 - self.deleted as i64
    }
}

/// Canonical key merging commits from the same author: lower-cased trimmed
/// email, falling back to the name, falling back to a fixed sentinel.
pub fn identity_key(name: &str, email: &str) -> String {
    let email = email.trim().to_lowercase();
    if !email.is_empty() {
        return email;
    }
    let name = name.trim().to_lowercase();
    if !name.is_empty() {
        return name;
    }
    UNKNOWN_AUTHOR.to_string()
}

/// Resolved reporting window, normalized to UTC for traversal checks.
#[derive(Debug, Clone, Copy)]
pub struct PeriodWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl PeriodWindow {
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        timestamp >= &self.since && timestamp <= &self.until
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub author_name: String,
    pub author_email: String,
    pub commits: u32,
    pub added: u64,
    pub deleted: u64,
    pub net: i64,
}

impl From<&AuthorAggregate> for ReportRow {
    fn from(agg: &AuthorAggregate) -> Self {
        Self {
            author_name: agg.author_name.clone(),
            author_email: agg.author_email.clone(),
            commits: agg.commits,
            added: agg.added,
            deleted: agg.deleted,
            net: agg.net(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsRow {
    pub commits: u32,
    pub added: u64,
    pub deleted: u64,
    pub net: i64,
}

impl From<&Totals> for TotalsRow {
    fn from(totals: &Totals) -> Self {
        Self {
            commits: totals.commits,
            added: totals.added,
            deleted: totals.deleted,
            net: totals.net(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub since: String,
    pub until: String,
    pub author_filter: Option<String>,
    pub include_merges: bool,
    pub rows: Vec<ReportRow>,
    pub totals: TotalsRow,
}
