//! Plain-text table of stored sessions.

use chrono::{Local, TimeZone};

use confab_vault::VaultEntry;

const HEADERS: [&str; 4] = ["Year", "Datetime", "Length", "Summary"];

/// Render entries in the given order, one row per stored session.
pub fn render(entries: &[VaultEntry]) -> String {
    let rows: Vec<[String; 4]> = entries.iter().map(row).collect();

    // Column widths cover the header and the widest cell; the summary
    // column is last and stays unpadded.
    let mut widths = [0usize; 3];
    for (idx, width) in widths.iter_mut().enumerate() {
        *width = HEADERS[idx].len();
        for cells in &rows {
            *width = (*width).max(cells[idx].len());
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<w0$}  {:<w1$}  {:<w2$}  {}\n",
        HEADERS[0],
        HEADERS[1],
        HEADERS[2],
        HEADERS[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
    ));
    for cells in &rows {
        out.push_str(&format!(
            "{:<w0$}  {:<w1$}  {:<w2$}  {}\n",
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        ));
    }
    out
}

/// One-line label for the load picker.
pub fn entry_label(entry: &VaultEntry) -> String {
    let datetime = Local
        .timestamp_opt(entry.timestamp, 0)
        .single()
        .map(|when| when.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "invalid timestamp".to_string());
    format!(
        "{} ({} turns) {}",
        datetime,
        entry.record.history.len(),
        entry.record.summary
    )
}

fn row(entry: &VaultEntry) -> [String; 4] {
    let (year, datetime) = match Local.timestamp_opt(entry.timestamp, 0).single() {
        Some(when) => (
            when.format("%Y").to_string(),
            when.format("%m-%d %H:%M:%S").to_string(),
        ),
        None => ("????".to_string(), "invalid timestamp".to_string()),
    };
    [
        year,
        datetime,
        entry.record.history.len().to_string(),
        entry.record.summary.clone(),
    ]
}
