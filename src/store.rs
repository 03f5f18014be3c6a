//! Append-only, `;` separated sample log.
//!
//! Rows are never rewritten: the header is written once when the file is new
//! and every sample afterwards is a single appended line.

use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::SamplerError;
use crate::models::sample::HEADER;
use crate::models::Sample;
use crate::utils::file::{first_line, simple_tail};

pub const DELIMITER: char = ';';

/// Header and latest row, column-aligned for the console.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub header: String,
    pub latest: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header_line() -> String {
        HEADER.join(&DELIMITER.to_string())
    }

    /// Creates the file with its header row unless it already has content.
    /// Also proves the file is writable. Returns whether the header was
    /// written.
    pub fn ensure_header(&self) -> Result<bool, SamplerError> {
        let not_writable = |source| SamplerError::LogNotWritable {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(not_writable)?;

        if file.metadata().map_err(not_writable)?.len() > 0 {
            debug!("Resuming existing log {}", self.path.display());
            return Ok(false);
        }

        file.write_all(format!("{}\n", Self::header_line()).as_bytes())
            .map_err(not_writable)?;
        info!("Created log {}", self.path.display());
        Ok(true)
    }

    /// Appends one row with a single write.
    pub fn append(&self, sample: &Sample) -> io::Result<()> {
        let mut line = sample.fields().join(&DELIMITER.to_string());
        line.push('\n');

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(line.as_bytes())
    }

    /// Header and most recent row as aligned text. Read-only.
    pub fn summary(&self) -> io::Result<Summary> {
        let header = first_line(&self.path)?.unwrap_or_else(Self::header_line);
        let latest = simple_tail(&self.path, 1)?
            .into_iter()
            .next()
            .filter(|line| *line != header);

        let header_fields: Vec<&str> = header.split(DELIMITER).collect();
        let latest_fields: Option<Vec<&str>> =
            latest.as_ref().map(|line| line.split(DELIMITER).collect());

        let mut widths: Vec<usize> = header_fields.iter().map(|f| f.chars().count()).collect();
        if let Some(fields) = &latest_fields {
            for (idx, field) in fields.iter().enumerate() {
                let len = field.chars().count();
                match widths.get_mut(idx) {
                    Some(width) => *width = (*width).max(len),
                    None => widths.push(len),
                }
            }
        }

        Ok(Summary {
            header: align(&header_fields, &widths),
            latest: latest_fields.map(|fields| align(&fields, &widths)),
        })
    }

    /// Every well-formed data row. Rows that do not parse are skipped.
    pub fn rows(&self) -> io::Result<Vec<Sample>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut samples = Vec::new();
        for line in reader.lines().skip(1) {
            let line = line?;
            let fields: Vec<&str> = line.split(DELIMITER).collect();
            if let Some(sample) = Sample::from_fields(&fields) {
                samples.push(sample);
            }
        }
        Ok(samples)
    }
}

fn align(fields: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let width = widths.get(idx).copied().unwrap_or(0);
            format!("{:<width$}", field, width = width)
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}
