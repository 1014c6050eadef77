//! Row output.
//!
//! One line per resolver per name: `name,ns1;ns2,ipv4;...,ipv6;...`.
//! Fields are written as-is, without quoting.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::resolution::ResolutionResult;

/// Format one row, including the trailing newline.
pub fn format_row(row: &ResolutionResult) -> String {
    format!(
        "{},{},{},{}\n",
        row.name,
        row.nameservers,
        row.ipv4.join(";"),
        row.ipv6.join(";")
    )
}

/// Writes rows to a sink, flushing after every row so partial output survives a crash.
pub struct RowWriter<W: Write> {
    out: W,
    rows: u64,
}

impl<W: Write> RowWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, rows: 0 }
    }

    pub fn write_row(&mut self, row: &ResolutionResult) -> io::Result<()> {
        self.out.write_all(format_row(row).as_bytes())?;
        self.out.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl RowWriter<Box<dyn Write>> {
    /// Write to a freshly truncated file at `path`, or to stdout when there is none.
    pub fn create(path: Option<&Path>) -> io::Result<Self> {
        let out: Box<dyn Write> = match path {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(io::stdout()),
        };
        Ok(Self::new(out))
    }
}
