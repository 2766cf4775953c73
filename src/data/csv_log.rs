//! CSV log reader.
//!
//! The stand firmware writes one header line followed by comma separated
//! integer rows, usually with a trailing comma (so a last, empty column).
//! Rows whose field count differs from the header are skipped whole and
//! recorded in [`TelemetryLog::skipped_rows`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::LogOptions;
use crate::data::channels::{Cell, SkippedRow, TelemetryLog};
use crate::error::{Result, SiriusError};

fn split_fields<'a>(line: &'a str, drop_last_column: bool) -> Vec<&'a str> {
    let mut cols: Vec<&str> = line.split(',').collect();
    if drop_last_column {
        cols.pop();
    }
    cols
}

fn parse_header(line: &str, opts: &LogOptions) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for raw in split_fields(line, opts.drop_last_column) {
        let name = raw.trim().to_string();
        // Keep every column addressable even if the header repeats a name.
        let name = if names.contains(&name) {
            let mut n = names.len();
            let mut renamed = format!("{}_{}", name, n);
            while names.contains(&renamed) {
                n += 1;
                renamed = format!("{}_{}", name, n);
            }
            log::warn!("duplicate column {:?} renamed to {:?}", name, renamed);
            renamed
        } else {
            name
        };
        names.push(name);
    }
    names
}

/// Read a log from any buffered source.
pub fn read_log<R: BufRead>(reader: R, opts: &LogOptions) -> Result<TelemetryLog> {
    let mut lines = reader.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((_, line)) => {
                let line = line?;
                let line = line.trim_end_matches(['\r', '\n']);
                if !line.trim().is_empty() {
                    break parse_header(line, opts);
                }
            }
            None => return Err(SiriusError::MissingHeader),
        }
    };

    let mut log = TelemetryLog::new(header, opts.time_unit);
    let expected = log.header.len();
    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); expected];

    for (idx, line) in lines {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_fields(line, opts.drop_last_column);
        if fields.len() != expected {
            let skipped = SkippedRow {
                line: idx + 1,
                expected_fields: expected,
                found_fields: fields.len(),
            };
            log::warn!(
                "skipping line {}: expected {} fields, found {}",
                skipped.line,
                skipped.expected_fields,
                skipped.found_fields
            );
            log.skipped_rows.push(skipped);
            continue;
        }
        for (col, field) in columns.iter_mut().zip(fields) {
            col.push(Cell::parse(field));
        }
    }

    for (name, cells) in log.header.clone().into_iter().zip(columns) {
        if let Some(ch) = log.channels.get_mut(&name) {
            ch.cells = cells;
        }
    }

    if log.is_empty() {
        return Err(SiriusError::EmptyLog);
    }
    log::debug!(
        "read {} rows x {} columns ({} skipped)",
        log.len(),
        expected,
        log.skipped_rows.len()
    );
    Ok(log)
}

/// Open and read a log file.
pub fn read_log_path<P: AsRef<Path>>(path: P, opts: &LogOptions) -> Result<TelemetryLog> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let log = read_log(BufReader::new(file), opts)?;
    log::info!("loaded {:?}: {} rows", path, log.len());
    Ok(log)
}
