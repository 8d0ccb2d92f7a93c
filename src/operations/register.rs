use crate::models::record::{Record, RecordKind};
use crate::models::taxonomy::{Country, Ods, Sector, Subsector};
use crate::store::repository;
use crate::store::{SheetStore, StoreError};
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Google Sheets refuses cells longer than this.
const MAX_CELL_CHARS: usize = 50_000;

/// Form fields as typed on the command line. Anything left out is asked for interactively.
#[derive(Debug, Clone, Default, Args)]
pub struct RecordArgs {
    #[arg(long)]
    pub pais: Option<String>,
    #[arg(long)]
    pub sector: Option<String>,
    #[arg(long)]
    pub subsector: Option<String>,
    #[arg(long)]
    pub alias: Option<String>,
    #[arg(long = "codigo")]
    pub codigo_operacion: Option<String>,
    #[arg(long)]
    pub responsable: Option<String>,
    /// Nombre o número de ODS (1-17); se puede repetir
    #[arg(long)]
    pub ods: Vec<String>,
    #[arg(long)]
    pub monto: Option<String>,
    /// AAAA-MM-DD, por defecto hoy
    #[arg(long)]
    pub fecha: Option<String>,
    /// AAAA-MM-DD, opcional
    #[arg(long = "fecha-ultimo-desembolso")]
    pub fecha_ultimo_desembolso: Option<String>,
    #[arg(long)]
    pub descripcion: Option<String>,
}

impl RecordArgs {
    fn is_complete(&self) -> bool {
        self.pais.is_some()
            && self.sector.is_some()
            && self.subsector.is_some()
            && self.alias.is_some()
            && self.codigo_operacion.is_some()
            && self.responsable.is_some()
            && self.monto.is_some()
            && self.descripcion.is_some()
    }
}

/// Raw text of every form field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormInput {
    pub pais: String,
    pub sector: String,
    pub subsector: String,
    pub alias: String,
    pub codigo_operacion: String,
    pub responsable: String,
    pub ods: Vec<String>,
    pub monto: String,
    pub fecha: String,
    pub fecha_ultimo_desembolso: String,
    pub descripcion: String,
}

impl From<RecordArgs> for FormInput {
    fn from(args: RecordArgs) -> Self {
        Self {
            pais: args.pais.unwrap_or_default(),
            sector: args.sector.unwrap_or_default(),
            subsector: args.subsector.unwrap_or_default(),
            alias: args.alias.unwrap_or_default(),
            codigo_operacion: args.codigo_operacion.unwrap_or_default(),
            responsable: args.responsable.unwrap_or_default(),
            ods: args.ods,
            monto: args.monto.unwrap_or_default(),
            fecha: args.fecha.unwrap_or_default(),
            fecha_ultimo_desembolso: args.fecha_ultimo_desembolso.unwrap_or_default(),
            descripcion: args.descripcion.unwrap_or_default(),
        }
    }
}

pub fn create_record(kind: RecordKind, input: &FormInput, today: NaiveDate) -> Result<Record, String> {
    let pais = Country::from_str(&input.pais)?;
    let sector = Sector::from_str(&input.sector)?;
    let subsector = Subsector::from_str(&input.subsector)?;
    if subsector.sector() != sector {
        let options: Vec<&str> = sector.subsectors().iter().map(|s| s.label()).collect();
        return Err(format!(
            "El subsector '{}' no pertenece al sector '{}'. Opciones: {}",
            subsector,
            sector,
            options.join(" | ")
        ));
    }

    let mut ods = Vec::new();
    for raw in input.ods.iter().filter(|s| !s.trim().is_empty()) {
        let goal = Ods::from_str(raw)?;
        if !ods.contains(&goal) {
            ods.push(goal);
        }
    }

    let monto = if input.monto.trim().is_empty() {
        Decimal::ZERO
    } else {
        Decimal::from_str(input.monto.trim()).map_err(|_| {
            format!(
                "Formato de monto inválido '{}'. Ingrese un número decimal válido.",
                input.monto.trim()
            )
        })?
    };
    if monto < Decimal::ZERO {
        return Err("El monto no puede ser negativo".to_string());
    }
    let mut monto = monto.round_dp(2);
    monto.rescale(2);

    let fecha = if input.fecha.trim().is_empty() {
        today
    } else {
        parse_date(&input.fecha)?
    };
    let fecha_ultimo_desembolso = if input.fecha_ultimo_desembolso.trim().is_empty() {
        None
    } else {
        Some(parse_date(&input.fecha_ultimo_desembolso)?)
    };

    for (name, value) in [
        ("Alias", &input.alias),
        ("Código de Operación", &input.codigo_operacion),
        ("Responsable", &input.responsable),
        ("Descripción", &input.descripcion),
    ] {
        if value.chars().count() > MAX_CELL_CHARS {
            return Err(format!("{} es demasiado largo", name));
        }
    }

    Ok(Record {
        kind,
        pais,
        sector,
        subsector,
        alias: input.alias.trim().to_string(),
        codigo_operacion: input.codigo_operacion.trim().to_string(),
        responsable: input.responsable.trim().to_string(),
        ods,
        monto,
        fecha,
        fecha_ultimo_desembolso,
        descripcion: input.descripcion.trim().to_string(),
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Fecha inválida '{}'. Use el formato AAAA-MM-DD.", raw.trim()))
}

/// Appends `records` to the sheet with one full read and one full overwrite.
/// Nothing is written when the read fails.
pub fn save_records(
    store: &dyn SheetStore,
    records: &[Record],
    rescue_dir: &Path,
) -> Result<usize, String> {
    let loaded = repository::load_data(store);
    if let Some(e) = loaded.error {
        return Err(format!("No se pudieron cargar los registros existentes, no se guardó nada: {}", e));
    }

    let mut table = loaded.table;
    for record in records {
        table.append_row(record.to_columns());
    }

    match repository::save_data(store, &table) {
        Ok(()) => {
            info!(added = records.len(), total = table.len(), "records saved");
            Ok(records.len())
        }
        Err(StoreError::WriteAfterClear(reason)) => {
            match repository::write_rescue_file(rescue_dir, &table) {
                Ok(path) => Err(format!(
                    "La hoja se borró pero la escritura falló ({}). Las {} filas se guardaron en {}",
                    reason,
                    table.len(),
                    path.display()
                )),
                Err(e) => Err(format!(
                    "La hoja se borró pero la escritura falló ({}). Tampoco se pudo escribir el archivo de rescate: {}",
                    reason, e
                )),
            }
        }
        Err(e) => Err(format!("Error al guardar los registros: {}", e)),
    }
}

pub fn register_record(
    store: &dyn SheetStore,
    kind: RecordKind,
    input: &FormInput,
    today: NaiveDate,
    rescue_dir: &Path,
) -> Result<Record, String> {
    let record = create_record(kind, input, today)?;
    save_records(store, std::slice::from_ref(&record), rescue_dir)?;
    Ok(record)
}

/// Asks for every field `args` leaves out, the way the form page presents them.
pub fn prompt_form<R: BufRead, W: Write>(
    kind: RecordKind,
    args: RecordArgs,
    today: NaiveDate,
    input: &mut R,
    out: &mut W,
) -> Result<FormInput, String> {
    if args.is_complete() {
        return Ok(args.into());
    }

    let mut prompt = Prompt { input, out };
    let heading = match kind {
        RecordKind::Aprobacion => "Registrar Nueva Aprobación",
        RecordKind::Desembolso => "Registrar Nuevo Desembolso",
    };
    prompt.say(heading)?;

    let pais = match args.pais {
        Some(p) => p,
        None => prompt.choose("País", Country::ALL, Country::label)?,
    };
    let sector = match args.sector {
        Some(s) => s,
        None => prompt.choose("Sector", Sector::ALL, Sector::label)?,
    };
    let subsector = match args.subsector {
        Some(s) => s,
        None => {
            let options = Sector::from_str(&sector)
                .map(Sector::subsectors)
                .unwrap_or(Subsector::ALL);
            prompt.choose("Subsector", options, Subsector::label)?
        }
    };
    let alias = prompt.text_or("Alias", args.alias)?;
    let codigo_operacion = prompt.text_or("Código de Operación", args.codigo_operacion)?;
    let responsable = prompt.text_or("Responsable", args.responsable)?;
    let ods = if args.ods.is_empty() {
        prompt.choose_many("ODS Relacionados", Ods::ALL, Ods::label)?
    } else {
        args.ods
    };
    let monto = match args.monto {
        Some(m) => m,
        None => prompt.ask_default("Monto", "0.00")?,
    };
    let fecha_label = match kind {
        RecordKind::Aprobacion => "Fecha de Aprobación",
        RecordKind::Desembolso => "Fecha de Desembolso",
    };
    let fecha = match args.fecha {
        Some(f) => f,
        None => prompt.ask_default(fecha_label, &today.format("%Y-%m-%d").to_string())?,
    };
    let fecha_ultimo_desembolso = match args.fecha_ultimo_desembolso {
        Some(f) => f,
        None => prompt.ask("Fecha Último Desembolso (opcional, AAAA-MM-DD)")?,
    };
    let descripcion = prompt.text_or("Descripción", args.descripcion)?;

    Ok(FormInput {
        pais,
        sector,
        subsector,
        alias,
        codigo_operacion,
        responsable,
        ods,
        monto,
        fecha,
        fecha_ultimo_desembolso,
        descripcion,
    })
}

struct Prompt<'a, R, W> {
    input: &'a mut R,
    out: &'a mut W,
}

impl<R: BufRead, W: Write> Prompt<'_, R, W> {
    fn say(&mut self, line: &str) -> Result<(), String> {
        writeln!(self.out, "{}", line).map_err(|e| format!("No se pudo escribir en la salida: {}", e))
    }

    fn ask(&mut self, label: &str) -> Result<String, String> {
        write!(self.out, "{}: ", label).map_err(|e| format!("No se pudo escribir en la salida: {}", e))?;
        self.out
            .flush()
            .map_err(|e| format!("No se pudo escribir en la salida: {}", e))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|_| "No se pudo leer la entrada".to_string())?;
        if read == 0 {
            return Err(format!("La entrada terminó antes de indicar '{}'", label));
        }
        Ok(line.trim().to_string())
    }

    fn ask_default(&mut self, label: &str, default: &str) -> Result<String, String> {
        let answer = self.ask(&format!("{} [{}]", label, default))?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    fn text_or(&mut self, label: &str, preset: Option<String>) -> Result<String, String> {
        match preset {
            Some(value) => Ok(value),
            None => self.ask(label),
        }
    }

    /// Numbered single choice; an empty answer takes the first option.
    fn choose<T: Copy>(
        &mut self,
        label: &str,
        options: &[T],
        name: fn(T) -> &'static str,
    ) -> Result<String, String> {
        self.list_options(options, name)?;
        loop {
            let answer = self.ask(&format!("{} [1]", label))?;
            if answer.is_empty() {
                return Ok(name(options[0]).to_string());
            }
            match pick(&answer, options, name) {
                Some(choice) => return Ok(choice),
                None => self.say(&format!("Elija un número entre 1 y {}", options.len()))?,
            }
        }
    }

    /// Space separated numbers; an empty answer selects nothing.
    fn choose_many<T: Copy>(
        &mut self,
        label: &str,
        options: &[T],
        name: fn(T) -> &'static str,
    ) -> Result<Vec<String>, String> {
        self.list_options(options, name)?;
        loop {
            let answer = self.ask(&format!("{} (números separados por espacios)", label))?;
            let picked: Option<Vec<String>> = answer
                .split_whitespace()
                .map(|part| pick(part, options, name))
                .collect();
            match picked {
                Some(choices) => return Ok(choices),
                None => self.say(&format!("Use números entre 1 y {}", options.len()))?,
            }
        }
    }

    fn list_options<T: Copy>(&mut self, options: &[T], name: fn(T) -> &'static str) -> Result<(), String> {
        for (i, &option) in options.iter().enumerate() {
            self.say(&format!("  {:>2}) {}", i + 1, name(option)))?;
        }
        Ok(())
    }
}

fn pick<T: Copy>(answer: &str, options: &[T], name: fn(T) -> &'static str) -> Option<String> {
    let number: usize = answer.trim().parse().ok()?;
    let option = options.get(number.checked_sub(1)?)?;
    Some(name(*option).to_string())
}
