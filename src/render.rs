//! Plain-text table rendering shared by the headless path and the TUI panes.

use crate::table::{cell_text, Table};
use crate::util::truncate_string;

const MAX_CELL_WIDTH: usize = 28;

/// How many rows the raw-data and strategy previews show.
pub const PREVIEW_ROWS: usize = 10;

/// Render the whole table with aligned columns.
pub fn render_table(table: &Table) -> String {
    render_rows(table, table.len())
}

/// Render at most `rows` rows, noting how many were elided.
pub fn render_preview(table: &Table, rows: usize) -> String {
    render_rows(table, rows.min(table.len()))
}

fn render_rows(table: &Table, limit: usize) -> String {
    let header: Vec<String> = table
        .columns()
        .iter()
        .map(|column| truncate_string(column, MAX_CELL_WIDTH))
        .collect();
    let body: Vec<Vec<String>> = table
        .rows()
        .iter()
        .take(limit)
        .map(|row| {
            row.iter()
                .map(|cell| truncate_string(&cell_text(cell), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for row in &body {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header, &widths);
    let total: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 2;
    out.push_str(&"-".repeat(total));
    out.push('\n');
    for row in &body {
        push_row(&mut out, row, &widths);
    }
    if limit < table.len() {
        out.push_str(&format!("({} more rows)\n", table.len() - limit));
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    for (index, cell) in cells.iter().enumerate() {
        if index > 0 {
            out.push_str("  ");
        }
        out.push_str(cell);
        let width = widths.get(index).copied().unwrap_or(0);
        let padding = width.saturating_sub(cell.chars().count());
        // no trailing padding on the last column
        if index + 1 < cells.len() {
            out.push_str(&" ".repeat(padding));
        }
    }
    out.push('\n');
}
