mod config;
mod models;
mod operations;
mod store;

use clap::{Parser, Subcommand};
use config::StoreConfig;
use models::record::RecordKind;
use operations::register::{RecordArgs, prompt_form, register_record};
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use store::SheetStore;
use store::connection::establish_connection;
use store::repository;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "registro", version, about = "Registro de aprobaciones y desembolsos")]
struct Cli {
    #[command(flatten)]
    store: StoreConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Registrar una aprobación
    #[command(visible_alias = "aprobacion", alias = "aprobación")]
    Approve(RecordArgs),
    /// Registrar un desembolso
    #[command(visible_alias = "desembolso")]
    Disburse(RecordArgs),
    /// Ver los registros existentes
    #[command(visible_alias = "registros")]
    List {
        /// Imprimir una tabla simple en lugar de abrir el navegador
        #[arg(long)]
        plain: bool,
    },
    /// Monto total por Tipo y por País
    #[command(visible_alias = "estadisticas", alias = "estadísticas")]
    Stats {
        #[arg(long)]
        plain: bool,
    },
    /// Mostrar la configuración vigente
    #[command(visible_alias = "configuracion", alias = "configuración")]
    Config,
    /// Conectarse a la hoja y leerla una vez
    #[command(visible_alias = "verificar")]
    Check,
    /// Registrar cada fila de un archivo CSV
    #[command(visible_alias = "importar")]
    Import { file: String },
}

pub enum UserCommands {
    Approve,
    Disburse,
    List,
    Stats,
    Config,
    Check,
    Import,
    Exit,
    Unknown,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(?cli, "parsed arguments");

    let result = match cli.command {
        Some(command) => run_command(&cli.store, command),
        None => run_menu(&cli.store),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("❌ ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_command(config: &StoreConfig, command: Command) -> Result<(), String> {
    match command {
        Command::Approve(args) => {
            let store = connect(config)?;
            register(store.as_ref(), config, RecordKind::Aprobacion, args)
        }
        Command::Disburse(args) => {
            let store = connect(config)?;
            register(store.as_ref(), config, RecordKind::Desembolso, args)
        }
        Command::List { plain } => {
            let store = connect(config)?;
            list(store.as_ref(), plain)
        }
        Command::Stats { plain } => {
            let store = connect(config)?;
            operations::stats::run_stats(store.as_ref(), plain || !io::stdout().is_terminal())
        }
        Command::Config => {
            show_config(config);
            Ok(())
        }
        Command::Check => {
            let message = operations::check::check_connection(config)?;
            println!("✅ {}", message);
            Ok(())
        }
        Command::Import { file } => {
            let store = connect(config)?;
            import(store.as_ref(), config, &file)
        }
    }
}

fn run_menu(config: &StoreConfig) -> Result<(), String> {
    println!("Registro de Aprobaciones y Desembolsos");
    let mut store: Option<Box<dyn SheetStore>> = None;

    loop {
        println!("Ingrese un comando (aprobacion, desembolso, registros, estadisticas, configuracion, verificar, importar, salir):");

        let input = match read_user_input() {
            Ok(Some(cmd)) => cmd,
            Ok(None) => break,
            Err(e) => {
                println!("Error al leer la entrada: {}", e);
                continue;
            }
        };
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        let command = check_for_command(parts[0]);
        if matches!(command, UserCommands::Exit) {
            println!("Saliendo de la aplicación.");
            break;
        }
        if let Err(e) = run_menu_command(config, &mut store, command, &parts[1..]) {
            println!("❌ ERROR: {}", e);
            println!("Intente nuevamente.");
        }
    }

    Ok(())
}

fn run_menu_command(
    config: &StoreConfig,
    store: &mut Option<Box<dyn SheetStore>>,
    command: UserCommands,
    rest: &[&str],
) -> Result<(), String> {
    match command {
        UserCommands::Approve => {
            register(connected(store, config)?, config, RecordKind::Aprobacion, RecordArgs::default())
        }
        UserCommands::Disburse => {
            register(connected(store, config)?, config, RecordKind::Desembolso, RecordArgs::default())
        }
        UserCommands::List => list(connected(store, config)?, false),
        UserCommands::Stats => {
            operations::stats::run_stats(connected(store, config)?, !io::stdout().is_terminal())
        }
        UserCommands::Config => {
            show_config(config);
            Ok(())
        }
        UserCommands::Check => {
            let message = operations::check::check_connection(config)?;
            println!("✅ {}", message);
            Ok(())
        }
        UserCommands::Import => {
            let path = match rest.first() {
                Some(path) => path.to_string(),
                None => {
                    println!("Ingrese la ruta del archivo CSV a importar:");
                    read_user_input()?.unwrap_or_default()
                }
            };
            import(connected(store, config)?, config, &path)
        }
        UserCommands::Exit => Ok(()),
        UserCommands::Unknown => {
            println!("Comando no reconocido.");
            Ok(())
        }
    }
}

fn connect(config: &StoreConfig) -> Result<Box<dyn SheetStore>, String> {
    establish_connection(config).map_err(|e| format!("No se pudo conectar: {}", e))
}

/// Opens the store on first use and keeps it for the rest of the session.
fn connected<'a>(
    store: &'a mut Option<Box<dyn SheetStore>>,
    config: &StoreConfig,
) -> Result<&'a dyn SheetStore, String> {
    if store.is_none() {
        *store = Some(connect(config)?);
    }
    store
        .as_deref()
        .ok_or_else(|| "No hay conexión con la hoja".to_string())
}

fn register(
    store: &dyn SheetStore,
    config: &StoreConfig,
    kind: RecordKind,
    args: RecordArgs,
) -> Result<(), String> {
    let today = chrono::Local::now().date_naive();
    let form = {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut stdout = io::stdout();
        prompt_form(kind, args, today, &mut input, &mut stdout)?
    };

    let record = register_record(store, kind, &form, today, &config.rescue_dir)?;
    match record.kind {
        RecordKind::Aprobacion => println!("🎉 ¡Aprobación registrada con éxito!"),
        RecordKind::Desembolso => println!("💰 ¡Desembolso registrado con éxito!"),
    }
    Ok(())
}

fn list(store: &dyn SheetStore, plain: bool) -> Result<(), String> {
    if plain || !io::stdout().is_terminal() {
        let loaded = repository::load_data(store);
        operations::browse::print_records(&loaded, &mut io::stdout())
    } else {
        operations::browse::run_browse(store)
    }
}

fn import(store: &dyn SheetStore, config: &StoreConfig, path: &str) -> Result<(), String> {
    let today = chrono::Local::now().date_naive();
    let count = operations::import::import_records(store, path, today, &config.rescue_dir)?;
    println!("Se importaron {} registros con éxito.", count);
    Ok(())
}

fn show_config(config: &StoreConfig) {
    println!("Configuración");
    for (name, value) in config.summary() {
        println!("  {:12} {}", format!("{}:", name), value);
    }
}

/// Returns `None` once stdin is closed.
fn read_user_input() -> Result<Option<String>, String> {
    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .map_err(|_| "No se pudo leer la entrada".to_string())?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn check_for_command(input: &str) -> UserCommands {
    match input {
        "approve" | "aprobacion" | "aprobación" => UserCommands::Approve,
        "disburse" | "desembolso" => UserCommands::Disburse,
        "list" | "registros" => UserCommands::List,
        "stats" | "estadisticas" | "estadísticas" => UserCommands::Stats,
        "config" | "configuracion" | "configuración" => UserCommands::Config,
        "check" | "verificar" => UserCommands::Check,
        "import" | "importar" => UserCommands::Import,
        "exit" | "quit" | "salir" => UserCommands::Exit,
        _ => UserCommands::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_approve_flags() {
        let cli = Cli::try_parse_from([
            "registro",
            "aprobacion",
            "--pais",
            "Brasil",
            "--ods",
            "1",
            "--ods",
            "2",
            "--csv",
            "registros.csv",
        ])
        .unwrap();

        let Some(Command::Approve(args)) = cli.command else {
            panic!("expected approve");
        };
        assert_eq!(args.pais.as_deref(), Some("Brasil"));
        assert_eq!(args.ods, vec!["1", "2"]);
        assert_eq!(cli.store.csv, Some(std::path::PathBuf::from("registros.csv")));
    }

    #[test]
    fn test_parse_list_plain() {
        let cli = Cli::try_parse_from(["registro", "registros", "--plain"]).unwrap();
        assert!(matches!(cli.command, Some(Command::List { plain: true })));
    }

    #[test]
    fn test_parse_spanish_subcommands() {
        let cli = Cli::try_parse_from(["registro", "importar", "lote.csv"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Import { ref file }) if file == "lote.csv"));
        let cli = Cli::try_parse_from(["registro", "verificar"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Check)));
    }

    #[test]
    fn test_no_subcommand_opens_menu() {
        let cli = Cli::try_parse_from(["registro"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_check_for_command() {
        assert!(matches!(check_for_command("desembolso"), UserCommands::Disburse));
        assert!(matches!(check_for_command("estadísticas"), UserCommands::Stats));
        assert!(matches!(check_for_command("salir"), UserCommands::Exit));
        assert!(matches!(check_for_command("verificar"), UserCommands::Check));
        assert!(matches!(check_for_command("importar"), UserCommands::Import));
        assert!(matches!(check_for_command("remove"), UserCommands::Unknown));
    }
}
