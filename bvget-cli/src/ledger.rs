use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, ErrorKind, Write};
use std::path::PathBuf;

/// Append-only record of completed video ids.
///
/// Loaded once per run; lookups are set membership, so duplicate lines in
/// the file are harmless. Appends are flushed to disk before returning, so
/// everything recorded survives a crash of the process.
pub struct Ledger {
    path: PathBuf,
    seen: HashSet<String>,
}

impl Ledger {
    /// Load all previously recorded ids. A missing file is an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let mut seen = HashSet::new();
        match File::open(&path) {
            Ok(file) => {
                for line in BufReader::new(file).lines() {
                    let line = line?;
                    let id = line.trim();
                    if !id.is_empty() {
                        seen.insert(id.to_owned());
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        Ok(Self { path, seen })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Durably record a completed id. Recording an id that is already
    /// present is a no-op.
    pub fn append(&mut self, id: &str) -> io::Result<()> {
        if self.seen.contains(id) {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{id}")?;
        file.sync_data()?;
        self.seen.insert(id.to_owned());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ledger_contains_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::load(dir.path().join("downloaded.txt")).unwrap();
        assert!(ledger.is_empty());
        assert!(!ledger.contains("BV1xx411c7mD"));
    }

    #[test]
    fn test_append_then_contains() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("downloaded.txt");

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.append("BV1xx411c7mD").unwrap();
        assert!(ledger.contains("BV1xx411c7mD"));
        assert!(!ledger.contains("BV1GJ411x7h7"));

        // survives a reload
        let reloaded = Ledger::load(&path).unwrap();
        assert!(reloaded.contains("BV1xx411c7mD"));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_duplicate_append_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("downloaded.txt");

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.append("BV1xx411c7mD").unwrap();
        ledger.append("BV1xx411c7mD").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_duplicate_lines_in_file_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("downloaded.txt");
        std::fs::write(&path, "BV1xx411c7mD\nBV1xx411c7mD\n\nBV1GJ411x7h7\n").unwrap();

        let ledger = Ledger::load(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("BV1xx411c7mD"));
        assert!(ledger.contains("BV1GJ411x7h7"));
    }
}
