use crate::error::Result;
use crate::model::{
    AuthorAggregate, ReportOutput, ReportRow, Totals, TotalsRow, SCHEMA_VERSION,
};
use chrono::Utc;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write ranked rows plus a trailing TOTAL row. Raw, untruncated values; no
/// atomic-write guarantee, a failed write may leave a partial file.
pub fn write_csv(path: &Path, rows: &[AuthorAggregate], totals: &Totals) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    writeln!(out, "author_name,author_email,commits,added,deleted,net")?;
    for agg in rows {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            csv_field(&agg.author_name),
            csv_field(&agg.author_email),
            agg.commits,
            agg.added,
            agg.deleted,
            agg.net()
        )?;
    }
    writeln!(
        out,
        "TOTAL,,{},{},{},{}",
        totals.commits,
        totals.added,
        totals.deleted,
        totals.net()
    )?;
    out.flush()?;
    Ok(())
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[allow(clippy::too_many_arguments)]
pub fn json_report(
    repo_path: &Path,
    since: String,
    until: String,
    author_filter: Option<String>,
    include_merges: bool,
    rows: &[AuthorAggregate],
    totals: &Totals,
) -> ReportOutput {
    ReportOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path: repo_path.to_string_lossy().to_string(),
        since,
        until,
        author_filter,
        include_merges,
        rows: rows.iter().map(ReportRow::from).collect(),
        totals: TotalsRow::from(totals),
    }
}
