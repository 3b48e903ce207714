use crate::protocol::MetricRecord;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Canonical columns, in the order they appear when present.
const CANONICAL_COLUMNS: [&str; 5] = ["name", "value", "group", "cid", "direction"];

/// Column carrying the measurement-window end timestamp.
const END_TS_COLUMN: &str = "end_ts";

/// Normalized tabular view of one measurement reply.
///
/// Rectangular per record: every row has one cell per column, with JSON
/// null filling the fields a record did not carry. Row order is the input
/// record order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl MetricTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

/// Measurement report handed back to the caller, one per measurement reply.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementReport {
    pub ok_flag: bool,
    pub data: MetricTable,
}

/// Project ordered metric records onto a rectangular table.
///
/// Pure and deterministic: each record's scalar fields become named columns,
/// nested objects flatten into dot-separated columns, canonical columns
/// (`name`, `value`, `group`, `cid`, `direction`) come first in that order,
/// and the remaining columns follow in sorted order.
pub fn project(records: &[MetricRecord]) -> MetricTable {
    let flats: Vec<BTreeMap<String, Value>> = records.iter().map(flatten_record).collect();

    let mut columns: Vec<String> = Vec::new();
    for canonical in CANONICAL_COLUMNS {
        if flats.iter().any(|flat| flat.contains_key(canonical)) {
            columns.push(canonical.to_owned());
        }
    }
    let rest: BTreeSet<&String> = flats
        .iter()
        .flat_map(|flat| flat.keys())
        .filter(|key| !CANONICAL_COLUMNS.contains(&key.as_str()))
        .collect();
    columns.extend(rest.into_iter().cloned());

    let rows = flats
        .iter()
        .map(|flat| {
            columns
                .iter()
                .map(|column| flat.get(column).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    MetricTable { columns, rows }
}

/// Build a report from the metric records of a measurement reply.
///
/// `ok_flag` is unconditionally true for a well-formed payload; the
/// `measurement_ok` marker, when the server sends one, stays visible in the
/// table but is not interpreted.
pub fn build(records: &[MetricRecord]) -> MeasurementReport {
    MeasurementReport {
        ok_flag: true,
        data: project(records),
    }
}

/// Extract the measurement-window end timestamp, if the table carries one.
///
/// A literal `end_ts` column wins (first row); otherwise the name/value row
/// form the wire uses (first row whose `name` is `"end_ts"`). Returns `None`
/// when the table has neither, or when the value does not parse as an
/// integer.
pub fn sync_timestamp(table: &MetricTable) -> Option<i64> {
    if let Some(idx) = table.column_index(END_TS_COLUMN) {
        let value = table.rows().first()?.get(idx)?;
        return parse_timestamp(value);
    }

    let name_idx = table.column_index("name")?;
    let value_idx = table.column_index("value")?;
    let row = table
        .rows()
        .iter()
        .find(|row| row.get(name_idx).and_then(Value::as_str) == Some(END_TS_COLUMN))?;
    parse_timestamp(row.get(value_idx)?)
}

fn parse_timestamp(value: &Value) -> Option<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        warn!(value = %value, "end_ts value is not an integer, ignoring");
    }
    parsed
}

fn flatten_record(record: &MetricRecord) -> BTreeMap<String, Value> {
    let mut flat = BTreeMap::new();
    flat.insert("name".to_owned(), Value::String(record.name.clone()));
    flatten_into(&mut flat, "value", &record.value);
    if let Some(group) = &record.group {
        flat.insert("group".to_owned(), Value::String(group.clone()));
    }
    if let Some(cid) = &record.cid {
        flat.insert("cid".to_owned(), Value::String(cid.clone()));
    }
    if let Some(direction) = &record.direction {
        flat.insert("direction".to_owned(), Value::String(direction.clone()));
    }
    for (key, value) in &record.extra {
        flatten_into(&mut flat, key, value);
    }
    flat
}

fn flatten_into(flat: &mut BTreeMap<String, Value>, key: &str, value: &Value) {
    match value {
        Value::Object(fields) if !fields.is_empty() => {
            for (nested_key, nested_value) in fields {
                flatten_into(flat, &format!("{}.{}", key, nested_key), nested_value);
            }
        }
        other => {
            flat.insert(key.to_owned(), other.clone());
        }
    }
}
