use crate::models::table::Cell;
use crate::models::taxonomy::{Country, Ods, Sector, Subsector};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

pub const COL_TIPO: &str = "Tipo";
pub const COL_PAIS: &str = "País";
pub const COL_SECTOR: &str = "Sector";
pub const COL_SUBSECTOR: &str = "Subsector";
pub const COL_ALIAS: &str = "Alias";
pub const COL_CODIGO: &str = "Código de Operación";
pub const COL_RESPONSABLE: &str = "Responsable";
pub const COL_ODS: &str = "ODS";
pub const COL_MONTO: &str = "Monto";
pub const COL_FECHA: &str = "Fecha";
pub const COL_FECHA_ULTIMO: &str = "FechaUltimoDesembolso";
pub const COL_DESCRIPCION: &str = "Descripción";

/// Sheet header, in the order a new sheet is laid out.
pub const COLUMNS: [&str; 12] = [
    COL_TIPO,
    COL_PAIS,
    COL_SECTOR,
    COL_SUBSECTOR,
    COL_ALIAS,
    COL_CODIGO,
    COL_RESPONSABLE,
    COL_ODS,
    COL_MONTO,
    COL_FECHA,
    COL_FECHA_ULTIMO,
    COL_DESCRIPCION,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Aprobacion,
    Desembolso,
}

impl RecordKind {
    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Aprobacion => "Aprobación",
            RecordKind::Desembolso => "Desembolso",
        }
    }

    pub fn from_label(label: &str) -> Option<RecordKind> {
        match crate::models::taxonomy::fold(label).as_str() {
            "aprobacion" => Some(RecordKind::Aprobacion),
            "desembolso" => Some(RecordKind::Desembolso),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    pub pais: Country,
    pub sector: Sector,
    pub subsector: Subsector,
    pub alias: String,
    pub codigo_operacion: String,
    pub responsable: String,
    pub ods: Vec<Ods>,
    pub monto: Decimal,
    pub fecha: NaiveDate,
    pub fecha_ultimo_desembolso: Option<NaiveDate>,
    pub descripcion: String,
}

impl Record {
    /// The sheet row for this record, keyed by column name.
    pub fn to_columns(&self) -> Vec<(&'static str, Cell)> {
        vec![
            (COL_TIPO, Cell::from(self.kind.label())),
            (COL_PAIS, Cell::from(self.pais.label())),
            (COL_SECTOR, Cell::from(self.sector.label())),
            (COL_SUBSECTOR, Cell::from(self.subsector.label())),
            (COL_ALIAS, Cell::from(self.alias.as_str())),
            (COL_CODIGO, Cell::from(self.codigo_operacion.as_str())),
            (COL_RESPONSABLE, Cell::from(self.responsable.as_str())),
            (COL_ODS, Cell::from(Ods::join(&self.ods))),
            (COL_MONTO, Cell::Number(self.monto)),
            (COL_FECHA, Cell::from(self.fecha.format("%Y-%m-%d").to_string())),
            (
                COL_FECHA_ULTIMO,
                Cell::from(
                    self.fecha_ultimo_desembolso
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                ),
            ),
            (COL_DESCRIPCION, Cell::from(self.descripcion.as_str())),
        ]
    }
}
