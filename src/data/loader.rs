use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::model::{Cognacy, DataMatrix};
use crate::error::{Error, Result};

/// Rows whose name starts with this marker are annotations, not items.
const COMMENT_MARKER: char = '#';

/// Items observed on fewer than this share of features get a warning.
const LOW_COVERAGE: f64 = 0.5;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a cognacy table from a file. The delimiter is chosen by extension:
///
/// * `.tsv` / `.tab` – tab-separated
/// * anything else   – comma-separated
pub fn load_file(path: &Path) -> Result<DataMatrix> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let delimiter = match ext.as_str() {
        "tsv" | "tab" => b'\t',
        _ => b',',
    };

    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let matrix = read_table(file, delimiter, path)?;

    log::info!(
        "Loaded {} items x {} features from {} ({:.1}% missing)",
        matrix.len(),
        matrix.features().len(),
        path.display(),
        matrix.missing_ratio() * 100.0
    );
    for (i, item) in matrix.items().iter().enumerate() {
        let observed = matrix.observed(i);
        if (observed as f64) < matrix.features().len() as f64 * LOW_COVERAGE {
            log::warn!(
                "'{item}' has data for only {observed} of {} features",
                matrix.features().len()
            );
        }
    }
    Ok(matrix)
}

// ---------------------------------------------------------------------------
// Table reader
// ---------------------------------------------------------------------------

/// Spreadsheet layout: a header row, then one row per item.
///
/// ```text
/// Concept  , HAND , cognacy , ASH , cognacy , ...
/// #POS     , n    ,         , n   ,         , ...
/// Duhumbi  , hut  , 1       , ... , 1       , ...
/// Rupa     , ʔik  , 2       , ... , NA      , ...
/// ```
///
/// Column 0 names the item. After it, columns come in (form, cognacy) pairs;
/// the form column's header names the feature and only the cognacy column is
/// kept. Rows starting with `#` and blank rows are skipped wherever they
/// appear, including above the header.
pub fn read_table<R: Read>(reader: R, delimiter: u8, source: &Path) -> Result<DataMatrix> {
    let csv_err = |e: csv::Error| Error::Csv {
        path: source.to_path_buf(),
        source: e,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut header: Option<Vec<String>> = None;
    let mut items = Vec::new();
    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(csv_err)?;
        let line = record.position().map_or(row_no as u64 + 1, |p| p.line());

        if is_blank(&record) {
            log::debug!("Line {line}: skipping empty row");
            continue;
        }
        let name = record.get(0).unwrap_or("");
        if name.starts_with(COMMENT_MARKER) {
            log::debug!("Line {line}: skipping comment row '{name}'");
            continue;
        }
        if header.is_none() {
            log::debug!("Line {line}: header row");
            header = Some(feature_names(&record));
            continue;
        }
        if name.is_empty() {
            log::warn!("Line {line}: row has data but no item name, skipped");
            continue;
        }

        let features: &[String] = header.as_deref().unwrap_or(&[]);
        let row: Vec<Cognacy> = features
            .iter()
            .enumerate()
            .map(|(k, feature)| {
                let cell = record.get(2 + 2 * k).unwrap_or("");
                let value = parse_cognacy(cell);
                if value.is_none() && !cell.is_empty() {
                    log::trace!("Line {line}, '{feature}': '{cell}' read as missing");
                }
                value
            })
            .collect();

        items.push(name.to_string());
        rows.push(row);
    }

    let Some(features) = header else {
        return Err(Error::MissingHeader {
            path: source.to_path_buf(),
        });
    };
    if items.is_empty() {
        return Err(Error::EmptyDataset {
            path: source.to_path_buf(),
        });
    }

    DataMatrix::new(items, features, rows)
}

/// Feature k: form in column 1 + 2k, cognacy in column 2 + 2k.
fn feature_names(header: &StringRecord) -> Vec<String> {
    let columns = header.len().saturating_sub(1);
    if columns % 2 == 1 {
        log::debug!(
            "Ignoring unpaired trailing column '{}'",
            header.get(header.len() - 1).unwrap_or("")
        );
    }
    (0..columns / 2)
        .map(|k| header.get(1 + 2 * k).unwrap_or("").to_string())
        .collect()
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

/// Interpret a cognacy cell. Integers and integral decimals (`"2.0"`) are
/// class labels; anything else (`""`, `"NA"`, `"n.a."`, `"?"`) is missing.
pub fn parse_cognacy(s: &str) -> Cognacy {
    let s = s.trim();
    if let Ok(i) = s.parse::<u32>() {
        return Some(i);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
            Some(f as u32)
        }
        _ => None,
    }
}
