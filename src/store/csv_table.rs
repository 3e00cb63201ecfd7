//! Whole-file CSV table with header lookup and cell-level edits.

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { headers: headers.into_iter().map(Into::into).collect(), rows: vec![] }
    }

    /// Reads the whole file. Quoted fields may hold commas, doubled quotes and line breaks.
    /// Blank lines are skipped and rows may be shorter or longer than the header.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|f| f.trim().is_empty()) { continue; }
            rows.push(record.iter().map(str::to_string).collect());
        }
        tracing::debug!(path = %path.display(), rows = rows.len(), "csv table read");
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] { &self.headers }
    pub fn rows(&self) -> &[Vec<String>] { &self.rows }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn column(&self, name: &str) -> Result<usize> {
        self.try_column(name)
            .ok_or_else(|| StorefrontError::MalformedCatalog(format!("missing column '{}'", name)))
    }

    pub fn try_column(&self, name: &str) -> Option<usize> { self.headers.iter().position(|h| h == name) }

    /// First row whose key column (column 0) equals `key` exactly.
    pub fn find_row(&self, key: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.first().map(String::as_str) == Some(key))
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows.get(row).and_then(|r| r.get(column)).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, row: usize, column: usize, value: impl Into<String>) {
        let cells = &mut self.rows[row];
        if cells.len() <= column { cells.resize(column + 1, String::new()); }
        cells[column] = value.into();
    }

    pub fn push(&mut self, row: Vec<String>) { self.rows.push(row); }

    /// Rewrites the file. The current content is copied to `<file>.backup` first, the new
    /// content goes to `<file>.temp` and is renamed over the original. On failure the backup
    /// is copied back.
    pub fn write(&self, path: &Path) -> Result<()> {
        let backup = sibling(path, "backup");
        if path.exists() {
            fs::copy(path, &backup)?;
        }

        let temp = sibling(path, "temp");
        let outcome = self.write_to(&temp).and_then(|_| fs::rename(&temp, path).map_err(StorefrontError::from));
        if let Err(e) = outcome {
            tracing::error!(path = %path.display(), error = %e, "csv write failed");
            let _ = fs::remove_file(&temp);
            if backup.exists() {
                match fs::copy(&backup, path) {
                    Ok(_) => tracing::warn!(path = %path.display(), "restored csv from backup"),
                    Err(restore) => tracing::error!(path = %path.display(), error = %restore, "backup restore failed"),
                }
            }
            return Err(e);
        }
        tracing::debug!(path = %path.display(), rows = self.rows.len(), "csv table written");
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// `product_list.csv` -> `product_list.csv.<suffix>`
pub(crate) fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ProductID,Category,Name,Price,Description,Quantity,ImageURL\n\
101,Tools,Hammer,12.50,\"Steel head, \"\"claw\"\" back\",10,\n\
\n\
102,Garden,Hose,20,\"Fifty feet\nof hose\",3,http://img/hose.png\n";

    fn sample() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("product_list.csv");
        fs::write(&path, SAMPLE).unwrap();
        (dir, path)
    }

    #[test]
    fn test_reads_quoted_fields() {
        let (_dir, path) = sample();
        let table = CsvTable::read(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("Quantity").unwrap(), 5);
        assert_eq!(table.cell(0, 4), "Steel head, \"claw\" back");
        assert_eq!(table.cell(1, 4), "Fifty feet\nof hose");
        assert_eq!(table.find_row("102"), Some(1));
        assert_eq!(table.find_row("10"), None);
    }

    #[test]
    fn test_find_row_matches_key_exactly() {
        let mut table = CsvTable::new(["ProductID", "Name"]);
        table.push(vec![" 7".into(), "Padded".into()]);
        table.push(vec!["7".into(), "Plain".into()]);
        assert_eq!(table.find_row("7"), Some(1));
        assert_eq!(table.find_row(" 7"), Some(0));
        assert_eq!(table.find_row("07"), None);
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let table = CsvTable::new(["id", "code"]);
        assert!(matches!(table.column("discount"), Err(StorefrontError::MalformedCatalog(_))));
    }

    #[test]
    fn test_cell_edit_keeps_other_cells() {
        let (_dir, path) = sample();
        let mut table = CsvTable::read(&path).unwrap();
        table.set(0, 5, "7");
        table.write(&path).unwrap();

        let reread = CsvTable::read(&path).unwrap();
        assert_eq!(reread.cell(0, 5), "7");
        assert_eq!(reread.cell(0, 4), "Steel head, \"claw\" back");
        assert_eq!(reread.rows()[1], table.rows()[1]);
        assert_eq!(fs::read_to_string(sibling(&path, "backup")).unwrap(), SAMPLE);
        assert!(!sibling(&path, "temp").exists());
    }

    #[test]
    fn test_set_pads_short_rows() {
        let mut table = CsvTable::new(["a", "b", "c"]);
        table.push(vec!["1".into()]);
        table.set(0, 2, "x");
        assert_eq!(table.rows()[0], vec!["1", "", "x"]);
    }

    #[test]
    fn test_failed_write_keeps_previous_content() {
        let (_dir, path) = sample();
        fs::create_dir(sibling(&path, "temp")).unwrap();
        let mut table = CsvTable::read(&path).unwrap();
        table.set(0, 5, "0");
        assert!(table.write(&path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
    }
}
