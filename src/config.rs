use clap::Args;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

/// The spreadsheet the registry has always lived in.
pub const DEFAULT_SPREADSHEET_ID: &str = "1huJO_UeOc8bnD7LU8gf4BnJpFnu4uqxtiru6fRvuRWs";

static SPREADSHEET_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").expect("Invalid spreadsheet URL pattern")
});
static SPREADSHEET_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid spreadsheet key pattern"));

#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Archivo de clave de la cuenta de servicio
    #[arg(long, env = "REGISTRO_CREDENTIALS", default_value = "credentials.json", global = true)]
    pub credentials: PathBuf,

    /// Clave o URL completa de la hoja de cálculo
    #[arg(long, env = "REGISTRO_SPREADSHEET", default_value = DEFAULT_SPREADSHEET_ID, global = true)]
    pub spreadsheet: String,

    /// Guardar los registros en un archivo CSV local en lugar de Google Sheets
    #[arg(long, env = "REGISTRO_CSV", global = true)]
    pub csv: Option<PathBuf>,

    /// Carpeta del archivo de rescate si la escritura falla después de borrar la hoja
    #[arg(long, env = "REGISTRO_RESCUE_DIR", default_value = ".", global = true)]
    pub rescue_dir: PathBuf,
}

impl StoreConfig {
    pub fn spreadsheet_id(&self) -> Result<String, String> {
        resolve_spreadsheet_id(&self.spreadsheet)
    }

    /// Lines shown on the configuration page.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let mut lines = Vec::new();
        match self.csv {
            Some(ref path) => {
                lines.push(("Almacenamiento", "csv".to_string()));
                lines.push(("Archivo CSV", path.display().to_string()));
            }
            None => {
                lines.push(("Almacenamiento", "google sheets".to_string()));
                let key = self
                    .spreadsheet_id()
                    .unwrap_or_else(|e| format!("(inválida: {})", e));
                lines.push(("Hoja de cálculo", key));
                lines.push(("Credenciales", self.credentials.display().to_string()));
            }
        }
        lines.push(("Carpeta de rescate", self.rescue_dir.display().to_string()));
        lines
    }
}

/// Accepts a bare spreadsheet key or any URL containing `/spreadsheets/d/<key>`.
pub fn resolve_spreadsheet_id(input: &str) -> Result<String, String> {
    let input = input.trim();
    if let Some(captures) = SPREADSHEET_URL.captures(input) {
        return Ok(captures[1].to_string());
    }
    if SPREADSHEET_KEY.is_match(input) {
        return Ok(input.to_string());
    }
    Err(format!("'{}' no es una clave ni una URL de hoja de cálculo", input))
}
