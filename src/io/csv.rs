//! CSV reading and exporting.

use indexmap::{IndexMap, IndexSet};
use ndarray::Array2;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::types::{MultiEmbeddingRecord, SimilarityPlotPoint};
use crate::{Error, ErrorContext, Result};

/// Rows taken from a dataset when the caller does not ask for a specific count.
pub const DEFAULT_PROCESSED_ROWS: usize = 20;

fn open(path: &Path) -> Result<File> {
    if !path.is_file() {
        return Err(Error::not_found_with_context(
            format!("CSV file not found: {}", path.display()),
            ErrorContext::new()
                .with_field_path(path.display().to_string())
                .with_source("csv"),
        ));
    }
    Ok(File::open(path)?)
}

fn create(path: &Path) -> Result<::csv::Writer<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if path.exists() {
        debug!(path = %path.display(), "overwriting existing CSV");
    }
    Ok(::csv::Writer::from_path(path)?)
}

/// Header fields of a CSV file.
pub fn read_csv_fields(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut reader = ::csv::Reader::from_reader(open(path)?);
    let headers = reader.headers()?;
    if headers.is_empty() {
        return Err(Error::invalid_argument(format!(
            "CSV file has no header row: {}",
            path.display()
        )));
    }
    Ok(headers.iter().map(str::to_string).collect())
}

/// How many of `available` records to keep.
///
/// With no explicit request the first [`DEFAULT_PROCESSED_ROWS`] are used (or all of them, if
/// there are fewer). An explicit request larger than the dataset is an error.
pub fn rows_to_process(available: usize, requested: Option<usize>) -> Result<usize> {
    match requested {
        Some(n) if n > available => Err(Error::invalid_argument_with_context(
            format!(
                "Requested {} rows, but the CSV file contains only {} rows",
                n, available
            ),
            ErrorContext::new()
                .with_field_path("max_rows")
                .with_source("csv"),
        )),
        Some(n) => Ok(n),
        None => {
            if available < DEFAULT_PROCESSED_ROWS {
                info!(
                    rows = available,
                    "dataset has fewer rows than the default, using all of them"
                );
            }
            Ok(available.min(DEFAULT_PROCESSED_ROWS))
        }
    }
}

/// Read the named `fields` of every row into records.
///
/// Blank values are left out of a record's attributes and rows with no non-blank field are
/// skipped. A field missing from the header is a lookup error. The row count is limited by
/// [`rows_to_process`].
pub fn extract_records_from_csv(
    path: impl AsRef<Path>,
    fields: &[String],
    max_rows: Option<usize>,
) -> Result<Vec<MultiEmbeddingRecord>> {
    let path = path.as_ref();
    let mut reader = ::csv::Reader::from_reader(open(path)?);
    let headers = reader.headers()?.clone();

    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        let index = headers.iter().position(|h| h == field).ok_or_else(|| {
            Error::not_found_with_context(
                format!("Field '{}' not found in CSV header", field),
                ErrorContext::new()
                    .with_field_path(field.clone())
                    .with_details(format!("available: {}", headers.iter().collect::<Vec<_>>().join(", ")))
                    .with_source("csv"),
            )
        })?;
        columns.push((field.clone(), index));
    }

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let row_record = result?;
        let mut attributes = IndexMap::new();
        for (field, index) in &columns {
            match row_record.get(*index) {
                Some(value) if !value.trim().is_empty() => {
                    attributes.insert(field.clone(), value.to_string());
                }
                _ => {}
            }
        }
        if attributes.is_empty() {
            warn!(row, "row has no values for the requested fields, skipping");
            continue;
        }
        records.push(MultiEmbeddingRecord::new(row.to_string(), attributes));
    }

    let keep = rows_to_process(records.len(), max_rows)?;
    records.truncate(keep);
    info!(path = %path.display(), records = records.len(), "extracted dataset records");
    Ok(records)
}

/// Write a similarity table: an empty corner cell followed by every key seen across the points,
/// in first-seen order, then one row per point.
///
/// A point with no score for a column gets an empty cell, so the triangular tables produced by
/// all-vs-all comparisons export with one column per compared document.
pub fn export_similarity_csv(points: &[SimilarityPlotPoint], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if points.is_empty() {
        return Err(Error::invalid_argument_with_context(
            "No similarity results to export",
            ErrorContext::new().with_source("csv"),
        ));
    }

    let mut columns: IndexSet<&str> = IndexSet::new();
    for point in points {
        columns.extend(point.similarities.keys().map(String::as_str));
    }

    let mut writer = create(path)?;
    let mut header = vec![String::new()];
    header.extend(columns.iter().map(|c| c.to_string()));
    writer.write_record(&header)?;

    for point in points {
        let mut row = Vec::with_capacity(columns.len() + 1);
        row.push(point.label.clone());
        row.extend(
            columns
                .iter()
                .map(|c| point.get(c).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }
    writer.flush()?;
    info!(
        path = %path.display(),
        rows = points.len(),
        columns = columns.len(),
        "exported similarity table"
    );
    Ok(())
}

/// Header for a reduced matrix with `columns` columns: `label,x,y,Dim3,...`.
pub fn reduced_header(columns: usize) -> Vec<String> {
    let mut header = vec!["label".to_string()];
    for c in 0..columns {
        header.push(match c {
            0 => "x".to_string(),
            1 => "y".to_string(),
            _ => format!("Dim{}", c + 1),
        });
    }
    header
}

/// Write reduced coordinates, one labelled row per matrix row.
pub fn export_reduced_csv<S: AsRef<str>>(
    matrix: &Array2<f64>,
    labels: &[S],
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    if labels.len() != matrix.nrows() {
        return Err(Error::invalid_argument_with_context(
            format!(
                "Got {} labels for {} reduced rows",
                labels.len(),
                matrix.nrows()
            ),
            ErrorContext::new().with_source("csv"),
        ));
    }

    let mut writer = create(path)?;
    writer.write_record(reduced_header(matrix.ncols()))?;
    for (label, row) in labels.iter().zip(matrix.rows()) {
        let mut record = vec![label.as_ref().to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = matrix.nrows(), "exported reduced coordinates");
    Ok(())
}

/// Read back a file written by [`export_reduced_csv`].
pub fn read_reduced_csv(path: impl AsRef<Path>) -> Result<(Vec<String>, Array2<f64>)> {
    let path = path.as_ref();
    let mut reader = ::csv::Reader::from_reader(open(path)?);
    let columns = reader.headers()?.len().saturating_sub(1);

    let mut labels = Vec::new();
    let mut values = Vec::new();
    for result in reader.records() {
        let record = result?;
        labels.push(record.get(0).unwrap_or_default().to_string());
        for cell in record.iter().skip(1) {
            let value: f64 = cell.trim().parse().map_err(|_| {
                Error::invalid_argument_with_context(
                    format!("Non-numeric coordinate '{}'", cell),
                    ErrorContext::new()
                        .with_field_path(format!("row {}", labels.len()))
                        .with_source("csv"),
                )
            })?;
            values.push(value);
        }
    }
    let matrix = Array2::from_shape_vec((labels.len(), columns), values)
        .map_err(|e| Error::invalid_argument(format!("Ragged reduced CSV: {}", e)))?;
    Ok((labels, matrix))
}

/// Write per-file phrase similarity tables into one CSV, one block per file separated by three
/// blank rows.
pub fn export_phrases_csv(
    results: &IndexMap<String, Vec<SimilarityPlotPoint>>,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create(path)?;
    writer.write_record(["File Name", "Phrase 1", "Phrase 2", "Similarity"])?;

    for (file, points) in results {
        writer.write_record([format!("File: {}", file).as_str(), "", "", ""])?;
        for point in points {
            for (other, similarity) in &point.similarities {
                writer.write_record([
                    "",
                    point.label.as_str(),
                    other.as_str(),
                    similarity.to_string().as_str(),
                ])?;
            }
        }
        for _ in 0..3 {
            writer.write_record(["", "", "", ""])?;
        }
    }
    writer.flush()?;
    info!(path = %path.display(), files = results.len(), "exported phrase similarities");
    Ok(())
}
