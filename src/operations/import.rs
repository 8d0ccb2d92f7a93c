use super::register::{FormInput, create_record, save_records};
use crate::models::record::{
    COL_ALIAS, COL_CODIGO, COL_DESCRIPCION, COL_FECHA, COL_FECHA_ULTIMO, COL_MONTO, COL_ODS,
    COL_PAIS, COL_RESPONSABLE, COL_SECTOR, COL_SUBSECTOR, COL_TIPO, COLUMNS, Record, RecordKind,
};
use crate::models::taxonomy::{Ods, fold};
use crate::store::SheetStore;
use chrono::NaiveDate;
use std::fs::File;
use std::path::Path;
use tracing::warn;

/// Registers every row of a CSV file laid out like the sheet (header row required).
/// All rows are validated before the store is touched.
pub fn import_records(
    store: &dyn SheetStore,
    path: &str,
    today: NaiveDate,
    rescue_dir: &Path,
) -> Result<usize, String> {
    let records = read_csv(path, today)?;
    if records.is_empty() {
        return Ok(0);
    }
    save_records(store, &records, rescue_dir)
}

fn read_csv(path: &str, today: NaiveDate) -> Result<Vec<Record>, String> {
    let file = File::open(path).map_err(|e| format!("No se pudo abrir el archivo '{}': {}", path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| format!("Error de CSV en el encabezado: {}", e))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let tipo_idx = column(COL_TIPO).ok_or_else(|| format!("Falta la columna '{}'", COL_TIPO))?;
    for name in headers.iter().filter(|h| !COLUMNS.contains(h)) {
        warn!(column = name, path, "ignoring unknown column");
    }

    let mut records = Vec::new();
    // line 1 is the header
    for (index, result) in reader.records().enumerate() {
        let line = index + 2;
        let row = result.map_err(|e| format!("Error de CSV en la línea {}: {}", line, e))?;
        let field = |name: &str| {
            column(name)
                .and_then(|i| row.get(i))
                .unwrap_or("")
                .to_string()
        };

        let tipo = row.get(tipo_idx).unwrap_or("");
        let kind = RecordKind::from_label(tipo)
            .ok_or_else(|| format!("Línea {}: Tipo inválido '{}'. Use Aprobación o Desembolso.", line, tipo))?;

        let input = FormInput {
            pais: field(COL_PAIS),
            sector: field(COL_SECTOR),
            subsector: field(COL_SUBSECTOR),
            alias: field(COL_ALIAS),
            codigo_operacion: field(COL_CODIGO),
            responsable: field(COL_RESPONSABLE),
            ods: split_ods(&field(COL_ODS)),
            monto: field(COL_MONTO),
            fecha: field(COL_FECHA),
            fecha_ultimo_desembolso: field(COL_FECHA_ULTIMO),
            descripcion: field(COL_DESCRIPCION),
        };

        let record = create_record(kind, &input, today).map_err(|e| format!("Línea {}: {}", line, e))?;
        records.push(record);
    }

    Ok(records)
}

/// Splits a stored ODS cell back into labels.
///
/// Some labels contain ", " themselves, so the cell is matched greedily against
/// the known labels (ignoring case and accents) instead of being split on commas.
fn split_ods(cell: &str) -> Vec<String> {
    let mut rest = cell.trim();
    let mut labels = Vec::new();
    while !rest.is_empty() {
        let end = match_ods_label(rest)
            // unknown text up to the next separator; create_record reports it
            .unwrap_or_else(|| rest.find(", ").unwrap_or(rest.len()));
        let (taken, tail) = rest.split_at(end);
        labels.push(taken.to_string());
        rest = tail.trim_start().trim_start_matches(',').trim_start();
    }
    labels
}

/// Byte length of the longest known label at the start of `rest`, if any.
/// The label must be followed by the end of the cell or a comma.
fn match_ods_label(rest: &str) -> Option<usize> {
    Ods::ALL
        .iter()
        .filter_map(|ods| {
            let label = ods.label();
            let chars = label.chars().count();
            let end = match rest.char_indices().nth(chars) {
                Some((i, _)) => i,
                None if rest.chars().count() == chars => rest.len(),
                None => return None,
            };
            let (head, tail) = rest.split_at(end);
            let at_boundary = tail.trim_start().is_empty() || tail.trim_start().starts_with(',');
            (at_boundary && fold(head) == fold(label)).then_some(end)
        })
        .max()
}
