use super::{SheetStore, StoreError};
use crate::models::table::Cell;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A local CSV file standing in for the remote worksheet.
pub struct CsvSheet {
    path: PathBuf,
}

impl CsvSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SheetStore for CsvSheet {
    fn describe(&self) -> String {
        format!("archivo CSV {}", self.path.display())
    }

    fn get_all_values(&self) -> Result<Vec<Vec<Cell>>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "csv sheet does not exist yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::Read(format!("{}: {}", self.path.display(), e))),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut values = Vec::new();
        for result in reader.records() {
            let record = result?;
            values.push(record.iter().map(Cell::from).collect());
        }
        Ok(values)
    }

    fn clear(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        File::create(&self.path)
            .map_err(|e| StoreError::Clear(format!("{}: {}", self.path.display(), e)))?;
        Ok(())
    }

    fn update(&self, values: &[Vec<Cell>]) -> Result<(), StoreError> {
        let file = File::create(&self.path)
            .map_err(|e| StoreError::Write(format!("{}: {}", self.path.display(), e)))?;
        write_values(file, values)
            .map_err(|e| StoreError::Write(format!("{}: {}", self.path.display(), e)))
    }
}

/// Writes `values` as CSV rows; rows may differ in length.
pub fn write_values<W: io::Write>(writer: W, values: &[Vec<Cell>]) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    for row in values {
        writer.write_record(row.iter().map(|c| c.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let sheet = CsvSheet::new(dir.path().join("nothing.csv"));
        assert!(sheet.get_all_values().unwrap().is_empty());
    }

    #[test]
    fn test_update_then_read() {
        let dir = tempdir().unwrap();
        let sheet = CsvSheet::new(dir.path().join("registros.csv"));
        let values = vec![
            vec![Cell::from("Tipo"), Cell::from("ODS"), Cell::from("Monto")],
            vec![
                Cell::from("Aprobación"),
                Cell::from("Fin de la Pobreza, Hambre Cero"),
                Cell::Number(Decimal::new(1050, 2)),
            ],
        ];

        sheet.clear().unwrap();
        sheet.update(&values).unwrap();

        let read = sheet.get_all_values().unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[1][1], Cell::from("Fin de la Pobreza, Hambre Cero"));
        assert_eq!(read[1][2], Cell::from("10.50"));
    }

    #[test]
    fn test_clear_creates_parent_and_empties_file() {
        let dir = tempdir().unwrap();
        let sheet = CsvSheet::new(dir.path().join("nested").join("registros.csv"));
        sheet.clear().unwrap();
        assert!(sheet.path().exists());
        assert!(sheet.get_all_values().unwrap().is_empty());
    }
}
