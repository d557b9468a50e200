//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables are built
//! from the directory's visible columns, structured formats use serde,
//! plain emits one key per line. Status lines go to stderr.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use idcon_core::{BatchReport, BatchStatus, Column, Level, Notification, Pagination, Tabular};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled on stderr.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render one directory page. Tables show `columns` in order; the
/// structured formats serialize the full rows.
pub fn render_page<T>(
    format: &OutputFormat,
    columns: &[&'static Column],
    rows: &[T],
) -> Result<String, CliError>
where
    T: Tabular + Serialize,
{
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(columns.iter().map(|c| c.title));
            for row in rows {
                builder.push_record(columns.iter().map(|c| row.cell(c.id)));
            }
            Ok(builder.build().with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(rows.iter().map(plain_id).collect::<Vec<_>>().join("\n")),
        other => render_structured(other, rows),
    }
}

/// Render a single entity. Tables list every column vertically.
pub fn render_single<T>(format: &OutputFormat, entity: &T) -> Result<String, CliError>
where
    T: Tabular + Serialize,
{
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            for column in T::columns() {
                builder.push_record([column.title.to_owned(), entity.cell(column.id)]);
            }
            Ok(builder.build().with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(plain_id(entity)),
        other => render_structured(other, entity),
    }
}

/// Render arbitrary serializable data; tables fall back to pretty JSON.
pub fn render_value<T: Serialize + ?Sized>(
    format: &OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table | OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        other => render_structured(other, data),
    }
}

fn render_structured<T: Serialize + ?Sized>(
    format: &OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        _ => serde_json::to_string_pretty(data)?,
    })
}

fn plain_id<T: Tabular>(entity: &T) -> String {
    entity.key().unwrap_or_else(|| entity.name()).to_owned()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Status lines (stderr) ────────────────────────────────────────────

/// `Showing 21-25 of 25 (page 3 of 3)` under a table.
pub fn page_footer(pagination: &Pagination) -> String {
    format!(
        "Showing {} (page {} of {})",
        pagination.range_label(),
        pagination.page + 1,
        pagination.page_count().max(1)
    )
}

pub fn print_status(line: &str, quiet: bool) {
    if !quiet {
        eprintln!("{line}");
    }
}

/// Print queued session notifications. Errors print even when quiet.
pub fn print_notifications(notifications: &[Notification], color: bool, quiet: bool) {
    for note in notifications {
        if quiet && note.level != Level::Error {
            continue;
        }
        let tag = note.level.to_string();
        if color {
            let tag = match note.level {
                Level::Success => tag.green().to_string(),
                Level::Info => tag.blue().to_string(),
                Level::Warning => tag.yellow().to_string(),
                Level::Error => tag.red().bold().to_string(),
            };
            eprintln!("{tag}: {}", note.message);
        } else {
            eprintln!("{tag}: {}", note.message);
        }
    }
}

/// Per-key lines of a batch, then its summary.
pub fn render_batch(report: &BatchReport, color: bool) -> String {
    let mut lines: Vec<String> = report
        .results
        .iter()
        .map(|(key, status)| {
            let mark = match status {
                BatchStatus::Success if color => "ok".green().to_string(),
                BatchStatus::Success => "ok".into(),
                BatchStatus::Failure(_) if color => "failed".red().to_string(),
                BatchStatus::Failure(_) => "failed".into(),
            };
            match status {
                BatchStatus::Failure(reason) => format!("{key}: {mark} ({reason})"),
                BatchStatus::Success => format!("{key}: {mark}"),
            }
        })
        .collect();
    lines.push(report.summary());
    lines.join("\n")
}

// ── Progress ─────────────────────────────────────────────────────────

/// Spinner on stderr while a remote call runs; hidden when stderr is
/// not a terminal or output is quiet.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idcon_core::{ActionType, User};

    use super::*;

    fn users() -> Vec<User> {
        ["rossini", "verdi"]
            .iter()
            .map(|name| User {
                key: Some(format!("{name}-key")),
                username: (*name).into(),
                realm: "/".into(),
                ..User::default()
            })
            .collect()
    }

    #[test]
    fn table_uses_only_requested_columns() {
        let columns: Vec<_> = ["username", "realm"]
            .iter()
            .filter_map(|id| User::column(id))
            .collect();
        let table = render_page(&OutputFormat::Table, &columns, &users()).unwrap();
        assert!(table.contains("Username"));
        assert!(table.contains("verdi"));
        assert!(!table.contains("Key"));
    }

    #[test]
    fn plain_prints_keys() {
        let out = render_page(&OutputFormat::Plain, &[], &users()).unwrap();
        assert_eq!(out, "rossini-key\nverdi-key");
    }

    #[test]
    fn compact_json_is_one_line() {
        let out = render_page(&OutputFormat::JsonCompact, &[], &users()).unwrap();
        assert!(!out.contains('\n'));
        assert!(out.starts_with('['));
    }

    #[test]
    fn footer_counts_pages_from_one() {
        let mut pagination = Pagination::new(10);
        pagination.total = 25;
        pagination.page = 2;
        assert_eq!(page_footer(&pagination), "Showing 21-25 of 25 (page 3 of 3)");
    }

    #[test]
    fn batch_lists_failures_with_reason() {
        let mut report = BatchReport::new(ActionType::Delete);
        report.record("a", BatchStatus::Success);
        report.record("b", BatchStatus::Failure("gone".into()));
        let out = render_batch(&report, false);
        assert!(out.contains("a: ok"));
        assert!(out.contains("b: failed (gone)"));
        assert!(out.ends_with("Delete: 1 succeeded, 1 failed"));
    }
}
