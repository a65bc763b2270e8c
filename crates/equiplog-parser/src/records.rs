use csv::{ReaderBuilder, StringRecord, Trim};

use crate::classifier::classify_row;
use crate::columns::{normalize_header, ColumnMapping, SemanticField};
use crate::errors::ParserError;
use crate::model::EquipmentRecord;

#[derive(Debug, Clone)]
pub struct ParsedDataset {
    /// Normalized (trimmed, lower-cased) header cells.
    pub headers: Vec<String>,
    pub mapping: ColumnMapping,
    /// Records in file order.
    pub records: Vec<EquipmentRecord>,
    /// Data rows dropped for having fewer cells than the header.
    pub dropped_rows: usize,
}

impl ParsedDataset {
    pub fn critical_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.status.is_critical())
            .count()
    }
}

/// Parse comma-delimited equipment readings.
///
/// The first non-blank line is the header. Blank rows are skipped and rows
/// with fewer cells than the header are dropped; extra cells are ignored.
/// Quoting is not recognised, every comma separates a cell.
pub fn parse_equipment_csv(content: &str) -> Result<ParsedDataset, ParserError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut mapping = ColumnMapping::default();
    let mut records = Vec::new();
    let mut dropped_rows = 0;

    for (index, result) in reader.records().enumerate() {
        let row = result.map_err(|source| ParserError::Csv {
            line: source
                .position()
                .map(|pos| pos.line())
                .unwrap_or(index as u64 + 1),
            source,
        })?;

        if is_blank(&row) {
            continue;
        }

        let Some(header) = headers.as_ref() else {
            let header: Vec<String> = row.iter().map(normalize_header).collect();
            mapping = ColumnMapping::analyze(&header);
            headers = Some(header);
            continue;
        };

        if row.len() < header.len() {
            dropped_rows += 1;
            continue;
        }

        records.push(build_record(&row, &mapping));
    }

    let headers = headers.ok_or(ParserError::MissingHeader)?;

    if records.is_empty() {
        return Err(ParserError::NoQualifyingRows {
            expected: headers.len(),
            dropped: dropped_rows,
        });
    }

    Ok(ParsedDataset {
        headers,
        mapping,
        records,
        dropped_rows,
    })
}

fn is_blank(row: &StringRecord) -> bool {
    row.len() == 0 || (row.len() == 1 && row.get(0).is_some_and(str::is_empty))
}

fn build_record(row: &StringRecord, mapping: &ColumnMapping) -> EquipmentRecord {
    let cell = |field: SemanticField| -> String {
        mapping
            .resolve(field)
            .and_then(|index| row.get(index))
            .unwrap_or_default()
            .to_string()
    };

    let pressure = cell(SemanticField::Pressure);
    let temp = cell(SemanticField::Temp);
    let status_cell = mapping
        .matched(SemanticField::Status)
        .and_then(|index| row.get(index));
    let status = classify_row(status_cell, row.get(5), &pressure, &temp);

    EquipmentRecord {
        name: cell(SemanticField::Name),
        equipment_type: cell(SemanticField::Type),
        flow: cell(SemanticField::Flow),
        pressure,
        temp,
        status,
    }
}
