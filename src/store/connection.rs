use super::csv_sheet::CsvSheet;
use super::google::{GoogleSheet, ServiceAccountKey};
use super::{SheetStore, StoreError};
use crate::config::StoreConfig;
use tracing::info;

/// Opens the configured sheet: the local CSV file if one is set, otherwise the
/// first worksheet of the Google spreadsheet.
pub fn establish_connection(config: &StoreConfig) -> Result<Box<dyn SheetStore>, StoreError> {
    if let Some(ref path) = config.csv {
        info!(path = %path.display(), "using csv sheet");
        return Ok(Box::new(CsvSheet::new(path)));
    }

    let key = ServiceAccountKey::from_file(&config.credentials)?;
    let spreadsheet_id = config.spreadsheet_id().map_err(|reason| StoreError::Open {
        key: config.spreadsheet.clone(),
        reason,
    })?;
    let sheet = GoogleSheet::open_by_key(key, &spreadsheet_id)?;
    Ok(Box::new(sheet))
}

#[cfg(test)]
pub use self::memory::{MemorySheet, establish_test_connection};
