use crate::model::{AuthorAggregate, Totals, UNKNOWN_AUTHOR};
use chrono::{DateTime, SecondsFormat, TimeZone};
use console::style;
use std::fmt::Display;
use std::path::Path;

const AUTHOR_WIDTH: usize = 28;
const DIVIDER_WIDTH: usize = 28 + 2 + 6 + 2 + 8 + 2 + 8 + 2 + 8;

/// Deterministic total order: net descending, commits descending, then
/// lower-cased email ascending. Email is the dedup key (or the sentinel), so
/// no two distinct identities survive the whole chain as equal.
pub fn rank(mut rows: Vec<AuthorAggregate>) -> Vec<AuthorAggregate> {
    rows.sort_by(|a, b| {
        b.net()
            .cmp(&a.net())
            .then_with(|| b.commits.cmp(&a.commits))
            .then_with(|| {
                a.author_email
                    .to_lowercase()
                    .cmp(&b.author_email.to_lowercase())
            })
    });
    rows
}

/// Column value for the author: name, falling back to email, falling back to
/// the sentinel; truncated character-wise to fit the column.
pub fn display_name(agg: &AuthorAggregate) -> String {
    let name = if !agg.author_name.is_empty() {
        agg.author_name.as_str()
    } else if !agg.author_email.is_empty() {
        agg.author_email.as_str()
    } else {
        UNKNOWN_AUTHOR
    };

    if name.chars().count() > AUTHOR_WIDTH {
        let head: String = name.chars().take(AUTHOR_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

pub fn print_header<Tz: TimeZone>(
    repo_path: &Path,
    since: &DateTime<Tz>,
    until: &DateTime<Tz>,
    author_filter: Option<&str>,
    include_merges: bool,
) where
    Tz::Offset: Display,
{
    println!("Repo: {}", repo_path.display());
    println!(
        "Period: {} .. {}",
        since.to_rfc3339_opts(SecondsFormat::Secs, false),
        until.to_rfc3339_opts(SecondsFormat::Secs, false)
    );
    if let Some(needle) = author_filter {
        println!("Author filter: {needle:?}");
    }
    if include_merges {
        println!("Merges: included");
    } else {
        println!("Merges: excluded");
    }
    println!();
}

pub fn print_table(rows: &[AuthorAggregate], totals: &Totals) {
    println!(
        "{:<28}  {:<6}  {:<8}  {:<8}  {:<8}",
        style("Author").bold(),
        style("Commits").bold(),
        style("Added").bold(),
        style("Deleted").bold(),
        style("Net").bold()
    );
    println!("{}", "-".repeat(DIVIDER_WIDTH));
    for agg in rows {
        println!(
            "{:<28}  {:>6}  {:>8}  {:>8}  {:>8}",
            display_name(agg),
            agg.commits,
            agg.added,
            agg.deleted,
            agg.net()
        );
    }
    println!("{}", "-".repeat(DIVIDER_WIDTH));
    println!(
        "{:<28}  {:>6}  {:>8}  {:>8}  {:>8}",
        "TOTAL",
        totals.commits,
        totals.added,
        totals.deleted,
        totals.net()
    );
}
