use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::prelude::*;
use clap::ValueEnum;
use serde::Serialize;

use crate::error::{CoocError, Phase, Result};
use crate::pipeline::CooccurrenceAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// `item<TAB>related<TAB>evidence[<TAB>origin]*`, one line per pair
    Txt,
    Tsv,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// One surviving pair with its labels resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CooccurrenceRecord {
    pub item: String,
    pub related: String,
    pub score: f64,
    /// Number of rows in which the pair occurred.
    pub evidence: u64,
    pub origins: Vec<String>,
}

/// Row shape for csv/tsv, where origins share a single cell.
#[derive(Serialize)]
struct FlatRecord {
    item: String,
    related: String,
    score: f64,
    evidence: u64,
    origins: String,
}

/// Resolves every kept pair into labels. Items come in id order, related
/// items in rank order.
pub fn collect_records(analysis: &CooccurrenceAnalysis) -> Result<Vec<CooccurrenceRecord>> {
    let mut records = Vec::with_capacity(analysis.related.len());
    for (item, entries) in analysis.related.rows() {
        if entries.is_empty() {
            continue;
        }
        let item_label = analysis.columns.resolve(item)?;
        for entry in entries {
            let evidence = analysis.provenance.get(item, entry.column);
            let origins = evidence
                .map(|e| e.origins.as_slice())
                .unwrap_or(&[])
                .iter()
                .map(|&r| analysis.rows.resolve(r).map(str::to_string))
                .collect::<Result<Vec<String>>>()?;
            records.push(CooccurrenceRecord {
                item: item_label.to_string(),
                related: analysis.columns.resolve(entry.column)?.to_string(),
                score: entry.score,
                evidence: evidence.map(|e| e.count).unwrap_or(0),
                origins,
            });
        }
    }
    Ok(records)
}

/// Prefixes cells that spreadsheet software would run as formulas.
pub fn csv_safe_cell(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{cell}"),
        _ => cell.to_string(),
    }
}

fn write_txt<W: Write>(records: &[CooccurrenceRecord], out: &mut W) -> std::io::Result<()> {
    for r in records {
        write!(out, "{}\t{}\t{}", r.item, r.related, r.evidence)?;
        for origin in &r.origins {
            write!(out, "\t{origin}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_delimited<W: Write>(
    records: &[CooccurrenceRecord],
    delimiter: u8,
    out: W,
) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out);
    for r in records {
        writer.serialize(FlatRecord {
            item: csv_safe_cell(&r.item),
            related: csv_safe_cell(&r.related),
            score: r.score,
            evidence: r.evidence,
            origins: csv_safe_cell(&r.origins.join("|")),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `records` to `out` in the requested format.
pub fn write_records<W: Write>(
    records: &[CooccurrenceRecord],
    format: ExportFormat,
    out: W,
    path: &Path,
) -> Result<()> {
    let mut out = BufWriter::new(out);
    let result = match format {
        ExportFormat::Txt => write_txt(records, &mut out),
        ExportFormat::Tsv => write_delimited(records, b'\t', &mut out).map_err(std::io::Error::other),
        ExportFormat::Csv => write_delimited(records, b',', &mut out).map_err(std::io::Error::other),
        ExportFormat::Json => serde_json::to_writer_pretty(&mut out, records)
            .map_err(std::io::Error::other)
            .and_then(|_| writeln!(out)),
    };
    result
        .and_then(|_| out.flush())
        .map_err(CoocError::io(Phase::Export, path))
}

/// Writes `records` to `<dir>/<stem>_<timestamp>_cooccurrence.<ext>` and
/// returns the path.
pub fn save_records(
    records: &[CooccurrenceRecord],
    format: ExportFormat,
    dir: &Path,
    stem: &str,
) -> Result<PathBuf> {
    let local: DateTime<Local> = Local::now();
    let name = format!(
        "{}_{}_cooccurrence.{}",
        stem,
        local.format("%Y%m%d_%H%M%S"),
        format.extension()
    );
    let path = dir.join(name);
    let file = File::create(&path).map_err(CoocError::io(Phase::Export, &path))?;
    write_records(records, format, file, &path)?;
    Ok(path)
}
