// Line splitting and field tokenization for delimited text

use crate::error::LoadError;
use crate::LoadOptions;
use anyhow::{Context, Result};
use log::{debug, error, warn};
use std::io::{self, Read};

/// Delimiters recognised in the header line
pub const DELIMITERS: [u8; 3] = [b',', b'\t', b';'];

/// Tokenized contents of a delimited text source
#[derive(Debug, Clone, PartialEq)]
pub struct CsvData {
    pub headers: Vec<String>,
    /// Data rows. The first one doubles as the type-hint row.
    pub rows: Vec<Vec<String>>,
}

/// Header line plus the optional type-hint row, without the remaining data
#[derive(Debug, Clone, PartialEq)]
pub struct CsvHeader {
    pub headers: Vec<String>,
    pub type_hints: Option<Vec<String>>,
}

/// Splits single lines into cleaned fields
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    delimiter: u8,
    quoting: bool,
}

impl Tokenizer {
    pub fn new(delimiter: u8, quoting: bool) -> Self {
        Self { delimiter, quoting }
    }

    /// Pick the delimiter for a source, honouring an explicit choice in `options`.
    pub fn for_header(header_line: &str, options: &LoadOptions) -> Self {
        let delimiter = match options.delimiter {
            Some(c) if c.is_ascii() => c as u8,
            Some(c) => {
                warn!("Delimiter {:?} is not ASCII, detecting from header instead", c);
                detect_delimiter(header_line)
            }
            None => detect_delimiter(header_line),
        };
        Self::new(delimiter, options.quoting)
    }

    pub fn split(&self, line: &str) -> Vec<String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(self.quoting)
            .delimiter(self.delimiter)
            .from_reader(line.as_bytes());

        let mut record = csv::StringRecord::new();
        match reader.read_record(&mut record) {
            Ok(true) => record.iter().map(clean_field).collect(),
            Ok(false) => vec![String::new()],
            Err(e) => {
                debug!("Falling back to a plain split for line {:?}: {}", line, e);
                line.split(self.delimiter as char).map(clean_field).collect()
            }
        }
    }
}

/// Split text on `\r` / `\n`, dropping empty lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split(['\r', '\n']).filter(|l| !l.is_empty()).collect()
}

/// Whichever of `,`, `\t`, `;` occurs earliest in the header line; `,` when none does.
pub fn detect_delimiter(header_line: &str) -> u8 {
    header_line
        .bytes()
        .find(|b| DELIMITERS.contains(b))
        .unwrap_or(b',')
}

/// Remove carriage returns and surrounding whitespace
pub fn clean_field(raw: &str) -> String {
    raw.replace('\r', "").trim().to_string()
}

/// Tokenize a full source after checking its structure.
pub fn read_csv(text: &str, options: &LoadOptions) -> Result<CsvData, LoadError> {
    let source_name = options.source_name();
    let lines = split_lines(text);

    let checked = check_structure(&source_name, &lines, options)?;
    let mut rows = Vec::with_capacity(lines.len() - 1);
    rows.push(checked.first_row);
    for line in &lines[2..] {
        rows.push(checked.tokenizer.split(line));
    }

    Ok(CsvData {
        headers: checked.headers,
        rows,
    })
}

/// Tokenize only the header and, when present, the type-hint row.
pub fn read_header(text: &str, options: &LoadOptions) -> Result<CsvHeader, LoadError> {
    let lines = split_lines(text);
    let header_line = lines.first().ok_or_else(|| {
        let err = LoadError::NoLines {
            source_name: options.source_name(),
        };
        error!("{}", err);
        err
    })?;

    let tokenizer = Tokenizer::for_header(header_line, options);
    Ok(CsvHeader {
        headers: tokenizer.split(header_line),
        type_hints: lines.get(1).map(|l| tokenizer.split(l)),
    })
}

/// Header and first data row of a source that passed the structural checks
struct Checked {
    tokenizer: Tokenizer,
    headers: Vec<String>,
    first_row: Vec<String>,
}

fn check_structure(
    source_name: &str,
    lines: &[&str],
    options: &LoadOptions,
) -> Result<Checked, LoadError> {
    let result = match lines {
        [] => Err(LoadError::NoLines {
            source_name: source_name.to_string(),
        }),
        [_] => Err(LoadError::HeaderWithoutValues {
            source_name: source_name.to_string(),
        }),
        [header, first, ..] => {
            let tokenizer = Tokenizer::for_header(header, options);
            let headers = tokenizer.split(header);
            let first_row = tokenizer.split(first);
            if headers.len() != first_row.len() {
                Err(LoadError::ColumnCountMismatch {
                    source_name: source_name.to_string(),
                    headers: headers.len(),
                    values: first_row.len(),
                })
            } else {
                Ok(Checked {
                    tokenizer,
                    headers,
                    first_row,
                })
            }
        }
    };

    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}

/// Read a whole source from stdin
pub fn read_csv_from_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read data from stdin")?;
    Ok(buffer)
}
