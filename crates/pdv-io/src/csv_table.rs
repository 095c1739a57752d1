//! One metric table per CSV file.
//!
//! The header row holds an empty first cell followed by entity identifiers;
//! every following row holds a sample identifier followed by its cells.
//! Booleans are written as `True`/`False`, missing cells as empty strings.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use pdv_core::{MetricTable, PdvError, PdvResult, ValueKind, Values};

pub fn write_table(table: &MetricTable, path: &Path) -> PdvResult<()> {
    let mut writer = csv::Writer::from_path(path).map_err(io::Error::from)?;

    let mut header = Vec::with_capacity(table.n_entities() + 1);
    header.push(String::new());
    header.extend(table.entities().iter().cloned());
    writer.write_record(&header).map_err(io::Error::from)?;

    let width = table.n_entities();
    for (row, sample) in table.samples().iter().enumerate() {
        let mut record = Vec::with_capacity(width + 1);
        record.push(sample.clone());
        for col in 0..width {
            record.push(cell_text(table.cells(), row * width + col));
        }
        writer.write_record(&record).map_err(io::Error::from)?;
    }
    writer.flush()?;
    Ok(())
}

fn cell_text(values: &Values, index: usize) -> String {
    match values {
        Values::Float(v) => match v.get(index).copied().flatten() {
            Some(x) if !x.is_nan() => x.to_string(),
            _ => String::new(),
        },
        Values::Bool(v) => match v.get(index).copied().flatten() {
            Some(true) => "True".to_string(),
            Some(false) => "False".to_string(),
            None => String::new(),
        },
    }
}

pub fn read_table(path: &Path) -> PdvResult<MetricTable> {
    let file = File::open(path)?;
    parse_table(file, &path.display().to_string())
}

/// Parses a table, inferring its kind: boolean when every present cell is a
/// boolean literal, float otherwise. `source` names the input in errors.
pub fn parse_table<R: Read>(reader: R, source: &str) -> PdvResult<MetricTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = reader.records();

    let header = records
        .next()
        .ok_or_else(|| PdvError::Parse(format!("{source}: empty metric file")))?
        .map_err(|err| PdvError::Parse(format!("{source}: {err}")))?;
    let entities: Vec<String> = header.iter().skip(1).map(str::to_string).collect();

    let mut samples = Vec::new();
    let mut raw: Vec<String> = Vec::new();
    for (idx, record) in records.enumerate() {
        let record = record.map_err(|err| PdvError::Parse(format!("{source}: {err}")))?;
        let line = idx + 2;
        let mut fields = record.iter();
        let sample = fields.next().unwrap_or_default().to_string();
        let cells: Vec<&str> = fields.collect();
        if cells.len() != entities.len() {
            return Err(PdvError::Parse(format!(
                "{source}: row {line} has {} cells but the header names {} entities",
                cells.len(),
                entities.len()
            )));
        }
        samples.push(sample);
        raw.extend(cells.into_iter().map(|c| c.trim().to_string()));
    }

    let present = || raw.iter().filter(|c| !is_missing(c));
    let kind = if present().next().is_some() && present().all(|c| parse_bool(c).is_some()) {
        ValueKind::Bool
    } else {
        ValueKind::Float
    };

    let width = entities.len().max(1);
    let locate = |idx: usize| {
        let column = entities.get(idx % width).map(String::as_str).unwrap_or("");
        format!("{source}: row {} column '{column}'", idx / width + 2)
    };
    let cells = match kind {
        ValueKind::Bool => Values::Bool(
            raw.iter()
                .map(|c| if is_missing(c) { None } else { parse_bool(c) })
                .collect(),
        ),
        ValueKind::Float => {
            let mut out = Vec::with_capacity(raw.len());
            for (idx, cell) in raw.iter().enumerate() {
                if is_missing(cell) {
                    out.push(None);
                    continue;
                }
                let value: f64 = cell.parse().map_err(|_| {
                    PdvError::Parse(format!("{}: '{cell}' is neither a number nor a boolean", locate(idx)))
                })?;
                out.push(Some(value));
            }
            Values::Float(out)
        }
    };

    MetricTable::new(samples, entities, cells)
        .map_err(|err| PdvError::Parse(format!("{source}: {err}")))
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("nan")
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "True" | "true" => Some(true),
        "False" | "false" => Some(false),
        _ => None,
    }
}
