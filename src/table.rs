//! Ordered, schema-free tables shared by the dataset loader and the scoring
//! results.
//!
//! Columns are whatever the source provides and cells are plain JSON scalars;
//! the remote scoring service is the schema authority. Requests carry tables
//! as row-oriented records, while service payloads may arrive either as
//! records or as the column-oriented map a dataframe serializer produces, so
//! decoding accepts both.

use serde_json::{Map, Value};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a table (expected an array of records or a column map)")]
    NotTabular,
    #[error("record {0} is not a JSON object")]
    RecordNotObject(usize),
    #[error("column `{0}` is not a JSON object")]
    ColumnNotObject(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parse CSV bytes: header row names the columns, cell types are inferred
    /// (integer, then float, then string; empty cells become null).
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Table, TableError> {
        let mut reader = csv::Reader::from_reader(reader);
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(parse_csv_cell).collect());
        }
        Ok(Table { columns, rows })
    }

    /// Serialize as row-oriented records (one JSON object per row) for the
    /// scoring request body. Row order is preserved; within a record the
    /// column set is preserved.
    pub fn to_records_json(&self) -> Result<String, TableError> {
        let records: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let mut object = Map::new();
                for (column, cell) in self.columns.iter().zip(row) {
                    object.insert(column.clone(), cell.clone());
                }
                Value::Object(object)
            })
            .collect();
        Ok(serde_json::to_string(&records)?)
    }

    /// Decode a table payload from a JSON string.
    pub fn from_payload_str(raw: &str) -> Result<Table, TableError> {
        Self::from_payload_value(serde_json::from_str(raw)?)
    }

    /// Decode a table from an already-parsed JSON value.
    ///
    /// Accepts row-oriented records (`[{col: val}, ...]`) and column-oriented
    /// maps (`{col: {row_key: val}, ...}`). Column-map row keys are ordered
    /// numerically when every key parses as an integer, so dataframe-style
    /// payloads keep their row order.
    pub fn from_payload_value(value: Value) -> Result<Table, TableError> {
        match value {
            Value::Array(records) => Self::from_records(&records),
            Value::Object(map) => Self::from_column_map(&map),
            _ => Err(TableError::NotTabular),
        }
    }

    fn from_records(records: &[Value]) -> Result<Table, TableError> {
        let mut objects = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            objects.push(
                record
                    .as_object()
                    .ok_or(TableError::RecordNotObject(index))?,
            );
        }
        let mut columns: Vec<String> = Vec::new();
        for object in &objects {
            for key in object.keys() {
                if !columns.iter().any(|column| column == key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = objects
            .iter()
            .map(|object| {
                columns
                    .iter()
                    .map(|column| object.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Ok(Table { columns, rows })
    }

    fn from_column_map(map: &Map<String, Value>) -> Result<Table, TableError> {
        let mut row_keys: Vec<String> = Vec::new();
        for (column, cells) in map {
            let cells = cells
                .as_object()
                .ok_or_else(|| TableError::ColumnNotObject(column.clone()))?;
            for key in cells.keys() {
                if !row_keys.iter().any(|row_key| row_key == key) {
                    row_keys.push(key.clone());
                }
            }
        }
        if row_keys.iter().all(|key| key.parse::<i64>().is_ok()) {
            row_keys.sort_by_key(|key| key.parse::<i64>().unwrap_or(i64::MAX));
        } else {
            row_keys.sort();
        }
        let columns: Vec<String> = map.keys().cloned().collect();
        let rows = row_keys
            .iter()
            .map(|row_key| {
                columns
                    .iter()
                    .map(|column| {
                        map.get(column)
                            .and_then(|cells| cells.get(row_key))
                            .cloned()
                            .unwrap_or(Value::Null)
                    })
                    .collect()
            })
            .collect();
        Ok(Table { columns, rows })
    }

    /// CSV export with a header row; data row count equals `len()`.
    pub fn to_csv_string(&self) -> Result<String, TableError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(cell_text))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| TableError::Io(err.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Display form of a cell: null renders empty, strings verbatim, everything
/// else via its JSON form.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn parse_csv_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LEADS_CSV: &str = "\
user_email,member_rating,optin_days
ann@example.com,5,142
bob@example.com,3,9
carol@example.com,4,
";

    #[test]
    fn parses_csv_with_inferred_types() {
        let table = Table::from_csv_reader(LEADS_CSV.as_bytes()).expect("parse csv");
        assert_eq!(
            table.columns(),
            ["user_email", "member_rating", "optin_days"]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0][0], json!("ann@example.com"));
        assert_eq!(table.rows()[0][1], json!(5));
        assert_eq!(table.rows()[2][2], Value::Null);
    }

    #[test]
    fn records_json_round_trips_rows_and_columns() {
        let table = Table::from_csv_reader(LEADS_CSV.as_bytes()).expect("parse csv");
        let body = table.to_records_json().expect("serialize");
        let round_tripped = Table::from_payload_str(&body).expect("decode");
        assert_eq!(round_tripped.len(), table.len());
        let mut expected: Vec<&String> = table.columns().iter().collect();
        expected.sort();
        let mut actual: Vec<&String> = round_tripped.columns().iter().collect();
        actual.sort();
        assert_eq!(actual, expected);
        // row order is preserved
        let email = round_tripped
            .columns()
            .iter()
            .position(|column| column == "user_email")
            .expect("email column");
        assert_eq!(round_tripped.rows()[1][email], json!("bob@example.com"));
    }

    #[test]
    fn decodes_column_oriented_payload_in_numeric_row_order() {
        let payload = json!({
            "thresh": {"0": 0.0, "2": 0.5, "10": 1.0, "1": 0.25},
            "expected_value": {"0": 100, "1": 90, "2": 75, "10": 10},
        })
        .to_string();
        let table = Table::from_payload_str(&payload).expect("decode");
        assert_eq!(table.columns(), ["expected_value", "thresh"]);
        let thresh: Vec<f64> = table
            .rows()
            .iter()
            .map(|row| row[1].as_f64().expect("thresh"))
            .collect();
        assert_eq!(thresh, [0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn rejects_non_tabular_payloads() {
        assert!(matches!(
            Table::from_payload_str("42"),
            Err(TableError::NotTabular)
        ));
        assert!(matches!(
            Table::from_payload_str("[1, 2]"),
            Err(TableError::RecordNotObject(0))
        ));
        assert!(matches!(
            Table::from_payload_str(r#"{"col": 3}"#),
            Err(TableError::ColumnNotObject(_))
        ));
        assert!(Table::from_payload_str("{not json").is_err());
    }

    #[test]
    fn csv_export_row_count_matches_table() {
        let table = Table::from_csv_reader(LEADS_CSV.as_bytes()).expect("parse csv");
        let exported = table.to_csv_string().expect("export");
        assert_eq!(exported.lines().count(), 1 + table.len());
        assert!(exported.starts_with("user_email,member_rating,optin_days"));
        // null cells export as empty fields
        assert!(exported.lines().nth(3).expect("last row").ends_with(','));
    }
}
