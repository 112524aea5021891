//! Newline-delimited JSON input
//!
//! Reads serialized row operations, one JSON object per line.

use crate::error::{Error, Result};
use crate::types::RowOperation;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Iterator over the row operations in an NDJSON source
///
/// Blank lines are skipped. Parse errors carry the 1-based line number.
pub struct OperationReader<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> OperationReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Line number of the last line read
    pub fn line(&self) -> usize {
        self.line
    }
}

impl OperationReader<BufReader<File>> {
    /// Open an NDJSON file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for OperationReader<R> {
    type Item = Result<RowOperation>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(e) => return Some(Err(Error::Io(e))),
            }

            let trimmed = self.buf.trim();
            if trimmed.is_empty() {
                continue;
            }

            return Some(
                serde_json::from_str(trimmed)
                    .map_err(|e| Error::invalid_input(self.line, e.to_string())),
            );
        }
    }
}
