//! Threshold-optimization plot construction.
//!
//! Contract for the chart collaborator: given the threshold sweep table the
//! scoring service returns and the operator's safeguard fraction, produce the
//! series and axis bounds a front end draws. The x series comes from the
//! first column whose name contains `thresh`; the y series from the first
//! containing `expected` or `value`; when neither is present the first two
//! numeric columns are used. Points are ordered by threshold and the bounds
//! always include the safeguard rule line. Drawing itself stays with the
//! caller.

use crate::table::Table;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("threshold sweep is empty")]
    EmptySweep,
    #[error("threshold sweep has no numeric threshold/value columns")]
    NoSeries,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimPlot {
    pub x_label: String,
    pub y_label: String,
    /// Sweep points ordered by threshold.
    pub points: Vec<(f64, f64)>,
    /// X position of the safeguard rule line.
    pub safeguard: f64,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

pub fn optim_thresh_plot(sweep: &Table, safeguard: f64) -> Result<OptimPlot, PlotError> {
    if sweep.is_empty() {
        return Err(PlotError::EmptySweep);
    }
    let (x_index, y_index) = pick_series(sweep).ok_or(PlotError::NoSeries)?;
    let mut points = Vec::with_capacity(sweep.len());
    for row in sweep.rows() {
        let x = numeric(row.get(x_index));
        let y = numeric(row.get(y_index));
        if let (Some(x), Some(y)) = (x, y) {
            points.push((x, y));
        }
    }
    if points.is_empty() {
        return Err(PlotError::NoSeries);
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut x_bounds = [safeguard, safeguard];
    let mut y_bounds = [f64::INFINITY, f64::NEG_INFINITY];
    for (x, y) in &points {
        x_bounds[0] = x_bounds[0].min(*x);
        x_bounds[1] = x_bounds[1].max(*x);
        y_bounds[0] = y_bounds[0].min(*y);
        y_bounds[1] = y_bounds[1].max(*y);
    }

    Ok(OptimPlot {
        x_label: sweep.columns()[x_index].clone(),
        y_label: sweep.columns()[y_index].clone(),
        points,
        safeguard,
        x_bounds,
        y_bounds,
    })
}

fn pick_series(sweep: &Table) -> Option<(usize, usize)> {
    let lowered: Vec<String> = sweep
        .columns()
        .iter()
        .map(|name| name.to_ascii_lowercase())
        .collect();
    let x = lowered.iter().position(|name| name.contains("thresh"));
    let y = lowered
        .iter()
        .position(|name| name.contains("expected") || name.contains("value"));
    match (x, y) {
        (Some(x), Some(y)) if x != y => Some((x, y)),
        _ => fallback_numeric(sweep),
    }
}

fn fallback_numeric(sweep: &Table) -> Option<(usize, usize)> {
    let mut found = Vec::new();
    for index in 0..sweep.columns().len() {
        let numeric_column = sweep
            .rows()
            .iter()
            .any(|row| numeric(row.get(index)).is_some());
        if numeric_column {
            found.push(index);
            if found.len() == 2 {
                return Some((found[0], found[1]));
            }
        }
    }
    None
}

fn numeric(cell: Option<&Value>) -> Option<f64> {
    match cell? {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sweep() -> Table {
        let payload = json!({
            "thresh": {"0": 0.0, "1": 0.25, "2": 0.5, "3": 0.75, "4": 1.0},
            "expected_value": {"0": 180_000.0, "1": 230_000.0, "2": 244_000.0, "3": 210_000.0, "4": 120_000.0},
        })
        .to_string();
        Table::from_payload_str(&payload).expect("sweep table")
    }

    #[test]
    fn series_follows_the_sweep() {
        let plot = optim_thresh_plot(&sweep(), 0.9).expect("plot");
        assert_eq!(plot.points.len(), 5);
        assert_eq!(plot.x_label, "thresh");
        assert_eq!(plot.y_label, "expected_value");
        assert_eq!(plot.safeguard, 0.9);
        assert_eq!(plot.x_bounds, [0.0, 1.0]);
        assert_eq!(plot.y_bounds, [120_000.0, 244_000.0]);
        // ordered by threshold
        assert!(plot
            .points
            .windows(2)
            .all(|pair| pair[0].0 <= pair[1].0));
    }

    #[test]
    fn bounds_always_include_the_safeguard_line() {
        let plot = optim_thresh_plot(&sweep(), 1.5).expect("plot");
        assert_eq!(plot.x_bounds, [0.0, 1.5]);
    }

    #[test]
    fn empty_sweep_is_an_error() {
        let table = Table::from_payload_str("[]").expect("empty table");
        assert!(matches!(
            optim_thresh_plot(&table, 0.9),
            Err(PlotError::EmptySweep)
        ));
    }

    #[test]
    fn non_numeric_sweep_is_an_error() {
        let payload = json!([{"note": "a"}, {"note": "b"}]).to_string();
        let table = Table::from_payload_str(&payload).expect("table");
        assert!(matches!(
            optim_thresh_plot(&table, 0.9),
            Err(PlotError::NoSeries)
        ));
    }

    #[test]
    fn falls_back_to_the_first_two_numeric_columns() {
        let payload = json!([
            {"cutoff": 0.1, "sales": 100.0, "label": "lo"},
            {"cutoff": 0.9, "sales": 50.0, "label": "hi"},
        ])
        .to_string();
        let table = Table::from_payload_str(&payload).expect("table");
        let plot = optim_thresh_plot(&table, 0.5).expect("plot");
        assert_eq!(plot.x_label, "cutoff");
        assert_eq!(plot.y_label, "sales");
        assert_eq!(plot.points.len(), 2);
    }
}
