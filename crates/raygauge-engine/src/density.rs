//! Material density tables.
//!
//! Text format, one entry per line: `<material_id> <grams_per_mm3>
//! <name>`. Blank lines and `#` comments are ignored.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a density table.
#[derive(Error, Debug)]
pub enum DensityError {
    /// A line did not parse as `<id> <density> <name>`.
    #[error("density table line {line}: {reason}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// The table file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One material entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityEntry {
    /// Density in grams per cubic millimeter.
    pub density: f64,
    /// Material name.
    pub name: String,
}

/// Map from material id to density.
#[derive(Debug, Clone, Default)]
pub struct DensityTable {
    entries: HashMap<u32, DensityEntry>,
}

impl DensityTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table from a reader.
    pub fn from_reader(reader: impl Read) -> Result<Self, DensityError> {
        let mut table = Self::new();
        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let mut fields = text.split_whitespace();
            let id = fields
                .next()
                .and_then(|f| f.parse::<u32>().ok())
                .ok_or_else(|| DensityError::Malformed {
                    line: idx + 1,
                    reason: "expected numeric material id".into(),
                })?;
            let density = fields
                .next()
                .and_then(|f| f.parse::<f64>().ok())
                .filter(|d| *d >= 0.0)
                .ok_or_else(|| DensityError::Malformed {
                    line: idx + 1,
                    reason: "expected non-negative density".into(),
                })?;
            let name = fields.collect::<Vec<_>>().join(" ");
            table.insert(id, density, name);
        }
        Ok(table)
    }

    /// Load a table from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DensityError> {
        Self::from_reader(File::open(path)?)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, material_id: u32, density: f64, name: impl Into<String>) {
        self.entries.insert(
            material_id,
            DensityEntry {
                density,
                name: name.into(),
            },
        );
    }

    /// Density for a material, or `None` if the table has no entry.
    pub fn lookup(&self, material_id: u32) -> Option<f64> {
        self.entries.get(&material_id).map(|e| e.density)
    }

    /// Material name, if known.
    pub fn name(&self, material_id: u32) -> Option<&str> {
        self.entries.get(&material_id).map(|e| e.name.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let text = "\
# id  g/mm3     name
1     0.007850  steel
2     0.002700  aluminum

7     0.000001  foam
";
        let table = DensityTable::from_reader(text.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup(1), Some(0.007850));
        assert_eq!(table.name(2), Some("aluminum"));
        assert_eq!(table.lookup(99), None);
    }

    #[test]
    fn test_malformed_line_reports_number() {
        let text = "1 0.005 steel\nnot-a-number 1.0 x\n";
        match DensityTable::from_reader(text.as_bytes()) {
            Err(DensityError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_density_rejected() {
        let text = "1 -2.0 antimatter\n";
        assert!(matches!(
            DensityTable::from_reader(text.as_bytes()),
            Err(DensityError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn test_insert_overrides() {
        let mut table = DensityTable::new();
        table.insert(5, 0.001, "one");
        table.insert(5, 0.002, "two");
        assert_eq!(table.lookup(5), Some(0.002));
        assert_eq!(table.name(5), Some("two"));
    }
}
