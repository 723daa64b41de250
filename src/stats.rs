use crate::error::Result;
use crate::model::{identity_key, AuthorAggregate, CommitRecord, FileChange, Totals};
use std::collections::HashMap;

/// Which commits take part in the aggregation.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub author: Option<String>,
    pub include_merges: bool,
}

impl FilterConfig {
    fn matches(&self, record: &CommitRecord) -> bool {
        if let Some(needle) = &self.author {
            let needle = needle.to_lowercase();
            if !record.author_name.to_lowercase().contains(&needle)
                && !record.author_email.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if !self.include_merges && record.parent_count > 1 {
            return false;
        }
        true
    }
}

/// Final aggregation state: per-identity aggregates, process-wide totals,
/// and the count of commits skipped because their stats failed.
#[derive(Debug, Default)]
pub struct Tally {
    by_author: HashMap<String, AuthorAggregate>,
    pub totals: Totals,
    pub skipped: u32,
}

impl Tally {
    fn record(&mut self, record: &CommitRecord, added: u64, deleted: u64) {
        let key = identity_key(&record.author_name, &record.author_email);
        let agg = self
            .by_author
            .entry(key)
            .or_insert_with(|| AuthorAggregate::new(&record.author_name, &record.author_email));
        // last-seen spelling wins
        agg.author_name = record.author_name.clone();
        agg.author_email = record.author_email.clone();
        agg.commits += 1;
        agg.added += added;
        agg.deleted += deleted;

        self.totals.commits += 1;
        self.totals.added += added;
        self.totals.deleted += deleted;
    }

    pub fn aggregates(&self) -> impl Iterator<Item = &AuthorAggregate> {
        self.by_author.values()
    }

    pub fn into_aggregates(self) -> Vec<AuthorAggregate> {
        self.by_author.into_values().collect()
    }
}

/// Single streaming pass over the commit sequence. A traversal error aborts
/// the run; a failure computing one commit's stats only skips that commit,
/// with a warning.
pub fn aggregate<I, F>(commits: I, mut stats: F, filter: &FilterConfig) -> Result<Tally>
where
    I: IntoIterator<Item = Result<CommitRecord>>,
    F: FnMut(&CommitRecord) -> Result<Vec<FileChange>>,
{
    let mut tally = Tally::default();

    for record in commits {
        let record = record?;
        if !filter.matches(&record) {
            continue;
        }

        let files = match stats(&record) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("skipping commit {}: {e}", record.id);
                tally.skipped += 1;
                continue;
            }
        };

        let (added, deleted) = files.iter().fold((0u64, 0u64), |(a, d), f| {
            (a + u64::from(f.added), d + u64::from(f.deleted))
        });
        tally.record(&record, added, deleted);
    }

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn record(name: &str, email: &str, parents: usize) -> CommitRecord {
        CommitRecord {
            id: format!("{:040x}", 0xabc),
            author_name: name.to_string(),
            author_email: email.to_string(),
            parent_count: parents,
            timestamp: Utc::now(),
        }
    }

    fn change(added: u32, deleted: u32) -> FileChange {
        FileChange {
            path: "src/lib.rs".to_string(),
            added,
            deleted,
        }
    }

    fn fixed_stats(added: u32, deleted: u32) -> impl FnMut(&CommitRecord) -> Result<Vec<FileChange>> {
        move |_| Ok(vec![change(added, deleted)])
    }

    #[test]
    fn sums_across_paths_within_one_commit() {
        let commits = vec![Ok(record("bob", "bob@x.com", 1))];
        let tally = aggregate(
            commits,
            |_| Ok(vec![change(10, 2), change(3, 1)]),
            &FilterConfig::default(),
        )
        .unwrap();
        let aggs = tally.into_aggregates();
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].added, 13);
        assert_eq!(aggs[0].deleted, 3);
        assert_eq!(aggs[0].commits, 1);
    }

    #[test]
    fn identities_merge_on_trimmed_lowercased_email() {
        let commits = vec![
            Ok(record("Bob", "A@X.com ", 1)),
            Ok(record("bobby", "a@x.com", 1)),
        ];
        let tally = aggregate(commits, fixed_stats(1, 0), &FilterConfig::default()).unwrap();
        let aggs = tally.into_aggregates();
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].commits, 2);
        // last-seen spelling wins
        assert_eq!(aggs[0].author_name, "bobby");
    }

    #[test]
    fn author_filter_matches_name_or_email_case_insensitively() {
        let commits = vec![
            Ok(record("Bob Smith", "bob@x.com", 1)),
            Ok(record("Carol", "carol@y.com", 1)),
        ];
        let filter = FilterConfig {
            author: Some("SMITH".to_string()),
            include_merges: false,
        };
        let tally = aggregate(commits, fixed_stats(1, 0), &filter).unwrap();
        assert_eq!(tally.totals.commits, 1);
        assert_eq!(tally.into_aggregates()[0].author_email, "bob@x.com");
    }

    #[test]
    fn merge_commits_are_excluded_unless_opted_in() {
        let commits = || {
            vec![
                Ok(record("bob", "bob@x.com", 1)),
                Ok(record("bob", "bob@x.com", 2)),
            ]
        };
        let excluded =
            aggregate(commits(), fixed_stats(5, 0), &FilterConfig::default()).unwrap();
        assert_eq!(excluded.totals.commits, 1);
        assert_eq!(excluded.totals.added, 5);

        let included = aggregate(
            commits(),
            fixed_stats(5, 0),
            &FilterConfig { author: None, include_merges: true },
        )
        .unwrap();
        assert_eq!(included.totals.commits, 2);
        assert_eq!(included.totals.added, 10);
    }

    #[test]
    fn failed_stats_skip_the_commit_but_not_the_run() {
        let commits = vec![
            Ok(record("bob", "bob@x.com", 1)),
            Ok(record("carol", "carol@y.com", 1)),
        ];
        let tally = aggregate(
            commits,
            |r| {
                if r.author_name == "carol" {
                    Err(TallyError::Parse("truncated object".into()))
                } else {
                    Ok(vec![change(4, 1)])
                }
            },
            &FilterConfig::default(),
        )
        .unwrap();
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.totals.commits, 1);
        assert_eq!(tally.totals.added, 4);
    }

    #[test]
    fn traversal_error_aborts_the_run() {
        let commits = vec![
            Ok(record("bob", "bob@x.com", 1)),
            Err(TallyError::Parse("corrupt pack".into())),
        ];
        assert!(aggregate(commits, fixed_stats(1, 0), &FilterConfig::default()).is_err());
    }

    #[test]
    fn totals_match_the_sum_over_aggregates() {
        let commits = vec![
            Ok(record("bob", "bob@x.com", 1)),
            Ok(record("bob", "bob@x.com", 1)),
            Ok(record("carol", "carol@y.com", 1)),
        ];
        let mut calls = 0;
        let tally = aggregate(
            commits,
            |_| {
                calls += 1;
                Ok(vec![change(calls * 2, calls)])
            },
            &FilterConfig::default(),
        )
        .unwrap();

        let commits_sum: u32 = tally.aggregates().map(|a| a.commits).sum();
        let net_sum: i64 = tally.aggregates().map(|a| a.net()).sum();
        assert_eq!(commits_sum, tally.totals.commits);
        assert_eq!(net_sum, tally.totals.net());
    }

    #[test]
    fn end_to_end_example() {
        let commits = vec![
            Ok(record("bob", "bob@x.com", 1)),
            Ok(record("bob", "bob@x.com", 1)),
            Ok(record("carol", "carol@y.com", 1)),
        ];
        let mut deltas = vec![(10u32, 2u32), (1, 1), (5, 0)].into_iter();
        let tally = aggregate(
            commits,
            |_| {
                let (a, d) = deltas.next().unwrap();
                Ok(vec![change(a, d)])
            },
            &FilterConfig::default(),
        )
        .unwrap();

        assert_eq!(tally.totals.commits, 3);
        assert_eq!(tally.totals.added, 16);
        assert_eq!(tally.totals.deleted, 3);
        assert_eq!(tally.totals.net(), 13);

        let ranked = crate::report::rank(tally.into_aggregates());
        assert_eq!(ranked[0].author_email, "bob@x.com");
        assert_eq!((ranked[0].commits, ranked[0].added, ranked[0].deleted), (2, 11, 3));
        assert_eq!(ranked[0].net(), 8);
        assert_eq!(ranked[1].author_email, "carol@y.com");
        assert_eq!((ranked[1].commits, ranked[1].added, ranked[1].deleted), (1, 5, 0));
        assert_eq!(ranked[1].net(), 5);
    }
}
