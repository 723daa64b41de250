use crate::cli::Cli;
use crate::export;
use crate::git::GitRepo;
use crate::model::PeriodWindow;
use crate::period;
use crate::report;
use crate::stats::{self, FilterConfig};
use anyhow::Context;
use chrono::{Local, SecondsFormat, Utc};
use indicatif::{ProgressBar, ProgressStyle};

pub fn exec(cli: Cli) -> anyhow::Result<()> {
    let (since, until) = period::resolve(cli.since.as_deref(), cli.until.as_deref(), &Local)
        .context("Failed to resolve date range")?;

    let repo = GitRepo::open(Some(&cli.repo)).context("Failed to open git repository")?;

    let window = PeriodWindow {
        since: since.with_timezone(&Utc),
        until: until.with_timezone(&Utc),
    };
    let filter = FilterConfig {
        author: cli.author.clone(),
        include_merges: cli.include_merges,
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Tallying commits...");

    let walk = repo
        .log_since(&window)
        .context("Failed to start history traversal")?;
    let tally = stats::aggregate(
        walk.inspect(|_| pb.inc(1)),
        |record| repo.commit_stats(&record.id),
        &filter,
    )
    .context("History traversal failed")?;
    pb.finish_and_clear();

    if tally.skipped > 0 {
        log::warn!("{} commit(s) skipped: statistics unavailable", tally.skipped);
    }

    let totals = tally.totals;
    let ranked = report::rank(tally.into_aggregates());

    if cli.json {
        let output = export::json_report(
            repo.path(),
            since.to_rfc3339_opts(SecondsFormat::Secs, false),
            until.to_rfc3339_opts(SecondsFormat::Secs, false),
            cli.author.clone(),
            cli.include_merges,
            &ranked,
            &totals,
        );
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        report::print_header(
            repo.path(),
            &since,
            &until,
            cli.author.as_deref(),
            cli.include_merges,
        );
        report::print_table(&ranked, &totals);
    }

    if let Some(csv_path) = &cli.csv {
        export::write_csv(csv_path, &ranked, &totals)
            .with_context(|| format!("Failed to write CSV to {}", csv_path.display()))?;
        if !cli.json {
            println!("\nCSV written: {}", csv_path.display());
        }
    }

    Ok(())
}
