pub mod connection;
pub mod csv_sheet;
pub mod google;
pub mod repository;

use crate::models::table::Cell;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no se encontró el archivo de credenciales en '{}'", .0.display())]
    MissingCredentials(PathBuf),

    #[error("archivo de credenciales inválido '{}': {reason}", .path.display())]
    InvalidCredentials { path: PathBuf, reason: String },

    #[error("falló la autenticación: {0}")]
    Auth(String),

    #[error("no se pudo abrir la hoja de cálculo '{key}': {reason}")]
    Open { key: String, reason: String },

    #[error("no se pudo leer la hoja: {0}")]
    Read(String),

    #[error("no se pudo borrar la hoja: {0}")]
    Clear(String),

    #[error("no se pudo escribir la hoja: {0}")]
    Write(String),

    /// The sheet was already cleared when the write failed, so it may be empty or half written.
    #[error("la hoja se borró pero falló la escritura del nuevo contenido: {0}")]
    WriteAfterClear(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// A single worksheet holding the whole dataset.
///
/// Implementations only know how to read every value, erase everything, and
/// write a block of values from the top-left corner.
pub trait SheetStore {
    /// Human readable location, used in logs and the config page.
    fn describe(&self) -> String;

    fn get_all_values(&self) -> Result<Vec<Vec<Cell>>, StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    /// Writes `values` starting at the first cell. The sheet is expected to be cleared.
    fn update(&self, values: &[Vec<Cell>]) -> Result<(), StoreError>;
}
