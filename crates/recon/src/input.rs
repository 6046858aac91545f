//! Delimited-text loading for survey points and scope polygons.

use crate::config::{ColumnLayout, DatasetConfig};
use crate::error::ReconError;
use crate::model::RawRecord;

fn reader<'a>(
    dataset: &str,
    text: &'a str,
    config: &DatasetConfig,
) -> Result<csv::Reader<&'a [u8]>, ReconError> {
    if !config.delimiter.is_ascii() {
        return Err(ReconError::ConfigValidation(format!(
            "dataset '{dataset}': delimiter must be a single ASCII character, got '{}'",
            config.delimiter
        )));
    }
    Ok(csv::ReaderBuilder::new()
        .delimiter(config.delimiter as u8)
        .has_headers(config.has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes()))
}

/// Parse a number, accepting a decimal comma.
fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.replace(',', ".").parse::<f64>().ok()
}

fn field<'r>(record: &'r csv::StringRecord, i: usize) -> &'r str {
    record.get(i).unwrap_or("")
}

fn coordinate(
    dataset: &str,
    row: usize,
    name: &str,
    raw: &str,
) -> Result<f64, ReconError> {
    parse_number(raw).ok_or_else(|| ReconError::Parse {
        dataset: dataset.into(),
        row,
        message: format!("{name} is not a number: '{raw}'"),
    })
}

/// Load point rows in the configured column layout. An empty or
/// non-numeric `h` becomes absent.
///
/// With [`ColumnLayout::Xyh`] every row must carry three columns and ids
/// are generated as `{prefix}_{n}`, counting data rows from 1.
pub fn load_points(
    dataset: &str,
    text: &str,
    config: &DatasetConfig,
) -> Result<Vec<RawRecord>, ReconError> {
    let mut reader = reader(dataset, text, config)?;
    let prefix = config.id_prefix.as_deref().unwrap_or(dataset);
    let mut out = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        let row = record.position().map(|p| p.line() as usize).unwrap_or(i + 1);

        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        if record.len() < 3 {
            let expected = match config.columns {
                ColumnLayout::IdXyh => "id, x, y",
                ColumnLayout::Xyh => "x, y, h",
            };
            return Err(ReconError::Parse {
                dataset: dataset.into(),
                row,
                message: format!("expected at least 3 columns ({expected}), got {}", record.len()),
            });
        }

        let (id, xi, yi, hi) = match config.columns {
            ColumnLayout::IdXyh => (field(&record, 0).to_string(), 1, 2, 3),
            ColumnLayout::Xyh => (format!("{prefix}_{}", out.len() + 1), 0, 1, 2),
        };
        let mut x = coordinate(dataset, row, "x", field(&record, xi))?;
        let mut y = coordinate(dataset, row, "y", field(&record, yi))?;
        if config.swap_xy {
            std::mem::swap(&mut x, &mut y);
        }
        let h = parse_number(field(&record, hi));

        out.push(RawRecord { id, x, y, h });
    }

    Ok(out)
}

/// Load polygon vertices from `x, y` or `id, x, y` rows.
pub fn load_polygon(
    dataset: &str,
    text: &str,
    config: &DatasetConfig,
) -> Result<Vec<(f64, f64)>, ReconError> {
    let mut reader = reader(dataset, text, config)?;
    let mut out = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        let row = record.position().map(|p| p.line() as usize).unwrap_or(i + 1);

        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let (xi, yi) = match record.len() {
            0 | 1 => {
                return Err(ReconError::Parse {
                    dataset: dataset.into(),
                    row,
                    message: "expected 2 or 3 columns".into(),
                })
            }
            2 => (0, 1),
            _ => (1, 2),
        };
        let mut x = coordinate(dataset, row, "x", field(&record, xi))?;
        let mut y = coordinate(dataset, row, "y", field(&record, yi))?;
        if config.swap_xy {
            std::mem::swap(&mut x, &mut y);
        }
        out.push((x, y));
    }

    Ok(out)
}

/// Vertices as records, for zone resolution of the scope polygon.
pub fn polygon_records(vertices: &[(f64, f64)]) -> Vec<RawRecord> {
    vertices
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| RawRecord {
            id: format!("v{}", i + 1),
            x,
            y,
            h: None,
        })
        .collect()
}
