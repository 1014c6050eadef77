//! Where the names to resolve come from.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::warn;

/// A single name from the command line, or a file of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameSource {
    Host(String),
    File(PathBuf),
}

impl NameSource {
    /// Pick the name source from the command-line arguments.
    ///
    /// A file wins over a single host name; the host name is then dropped
    /// with a warning. Returns `None` when neither is given.
    pub fn select(host: Option<String>, in_path: Option<PathBuf>) -> Option<Self> {
        match (host, in_path) {
            (Some(_), Some(path)) => {
                warn!("ignoring `host` specified in command-line!");
                Some(Self::File(path))
            }
            (None, Some(path)) => Some(Self::File(path)),
            (Some(host), None) => Some(Self::Host(host)),
            (None, None) => None,
        }
    }

    /// Iterate over the names, lazily for files.
    pub fn names(&self) -> io::Result<Box<dyn Iterator<Item = io::Result<String>>>> {
        match self {
            Self::Host(host) => Ok(Box::new(std::iter::once(Ok(host.clone())))),
            Self::File(path) => Ok(Box::new(read_names(path.clone())?)),
        }
    }
}

/// Read names, one per line, with surrounding whitespace stripped.
///
/// Blank lines come through as empty names.
pub fn read_names(path: impl AsRef<Path>) -> io::Result<impl Iterator<Item = io::Result<String>>> {
    let reader = BufReader::new(File::open(path)?);

    Ok(reader
        .lines()
        .map(|line| line.map(|l| l.trim().to_string())))
}
