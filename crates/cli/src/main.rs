// myAdmin CLI - directory user administration
// Every action subcommand is fired through the command router by catalog id.

mod exit_codes;
mod handlers;
mod logging;
mod render;
mod shell;
mod util;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use myadmin_config::Settings;
use myadmin_core::{
    CommandCatalog, CommandId, CommandRequest, DispatchError, RecordKey, RecordPatch,
};
use myadmin_io::ExportWriter;
use myadmin_recon::{ImportConfig, ReconError};

use exit_codes::{
    dispatch_exit_code, EXIT_ERROR, EXIT_NO_SESSION, EXIT_PARTIAL_IMPORT, EXIT_SUCCESS, EXIT_USAGE,
};
use handlers::{build_router, AppContext, AppError, Outcome, Router};

#[derive(Parser)]
#[command(name = "myadmin")]
#[command(about = "Directory user administration: bulk CSV import, transfer, and single-user changes")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Directory database (SQLite file). Overrides "store.database" in settings.
    #[arg(long, short = 'd', global = true, env = "MYADMIN_DATABASE")]
    database: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show menus and toolbar with command ids
    Menu {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all users
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Insert or update users from a CSV file (command 11)
    #[command(after_help = "\
Required columns: firstname, lastname, kurs, status_id_fk
Optional columns: phone, abteilung, street, city, city_code, postalcode

Username is the first letter of the first name plus the last name, lowercased.
Existing users (same username) are updated; new ones are inserted.

Examples:
  myadmin -d directory.db import kurs-2026.csv
  myadmin import kurs-2026.csv --profile course.import.toml --json")]
    Import {
        /// CSV file to import
        file: PathBuf,

        /// TOML import profile (column mapping, email domain)
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Output the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export all users to CSV and copy the file to the transfer location (command 12)
    #[command(alias = "transfer")]
    Export,

    /// Change fields of one user (command 21)
    Edit {
        /// User id or username
        key: String,

        #[command(flatten)]
        fields: EditFields,
    },

    /// Delete one user permanently (command 22)
    Delete {
        /// User id or username
        key: String,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Mark one user inactive (command 23)
    Deactivate {
        /// User id or username
        key: String,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Show application name and version (command 41)
    About,

    /// Show the feature overview (command 42)
    HelpText,

    /// Fire any command by its catalog id
    Run {
        /// Command id (see `myadmin menu`)
        id: u16,

        /// File argument (login, import)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Selected user (edit, delete, deactivate)
        #[arg(long)]
        key: Option<String>,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Interactive shell
    Shell,
}

#[derive(Args, Default)]
struct EditFields {
    #[arg(long)]
    firstname: Option<String>,
    #[arg(long)]
    lastname: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    street: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    city_code: Option<String>,
    #[arg(long)]
    postalcode: Option<String>,
    /// 1 = active, 2 = inactive
    #[arg(long)]
    status: Option<i64>,
    /// Organizational unit (course) id
    #[arg(long)]
    ou: Option<i64>,
}

impl From<EditFields> for RecordPatch {
    fn from(f: EditFields) -> Self {
        RecordPatch {
            firstname: f.firstname,
            lastname: f.lastname,
            email: f.email,
            phone: f.phone,
            department: f.department,
            street: f.street,
            city: f.city,
            city_code: f.city_code,
            postalcode: f.postalcode,
            status: f.status,
            org_unit: f.ou,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings_path = cli.settings.clone().unwrap_or_else(Settings::config_path);
    let (settings, warnings) = Settings::load_from(&settings_path);
    logging::init(&settings.log_level, cli.verbose);
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    tracing::debug!("settings loaded from {}", settings_path.display());

    let Some(command) = cli.command else {
        // No subcommand = show help
        eprintln!("Usage: myadmin [--database PATH] <command> [options]");
        eprintln!("       myadmin --help for more information");
        return Ok(());
    };

    let database = cli
        .database
        .clone()
        .or_else(|| settings.database.as_ref().map(PathBuf::from));

    let catalog = CommandCatalog::standard().map_err(|e| CliError::internal(e.to_string()))?;
    let profile = match &command {
        Commands::Import { profile: Some(p), .. } => Some(p.clone()),
        _ => settings.import_profile.as_ref().map(PathBuf::from),
    };
    let ctx = app_context(&settings, database.clone(), profile.as_deref())?;
    let mut router = build_router(&catalog, ctx).map_err(|e| CliError::internal(e.to_string()))?;
    let hints = Hints { settings_path };

    match command {
        Commands::Menu { json } => cmd_menu(&catalog, router.has_session(), json),
        Commands::About => fire(&mut router, CommandId::ABOUT, CommandRequest::new(), &hints).map(print),
        Commands::HelpText => fire(&mut router, CommandId::HELP, CommandRequest::new(), &hints).map(print),
        Commands::Shell => {
            if database.is_some() {
                fire(&mut router, CommandId::LOGIN, CommandRequest::new(), &hints).map(print)?;
            }
            let stdin = io::stdin();
            shell::run(&mut router, &catalog, stdin.lock(), io::stdout())
                .map_err(|e| CliError::io(e.to_string()))
        }
        other => {
            // Log in around the command when a database is configured
            if database.is_some() {
                fire(&mut router, CommandId::LOGIN, CommandRequest::new(), &hints)?;
            }
            let result = run_command(&mut router, other, &hints);
            if router.has_session() {
                if let Err(e) = router.dispatch(CommandId::LOGOUT, &CommandRequest::new()) {
                    tracing::warn!("logout failed: {e}");
                }
            }
            result
        }
    }
}

fn run_command(router: &mut Router, command: Commands, hints: &Hints) -> Result<(), CliError> {
    match command {
        Commands::List { json } => cmd_list(router, json, hints),
        Commands::Import { file, json, .. } => cmd_import(router, file, json, hints),
        Commands::Export => fire(router, CommandId::EXPORT, CommandRequest::new(), hints).map(print),
        Commands::Edit { key, fields } => {
            let request = CommandRequest::new()
                .with_selection(parse_key(&key)?)
                .with_patch(fields.into());
            fire(router, CommandId::EDIT, request, hints).map(print)
        }
        Commands::Delete { key, yes } => {
            let request = CommandRequest::new().with_selection(parse_key(&key)?);
            fire_confirmed(router, CommandId::DELETE, request, yes, hints)
        }
        Commands::Deactivate { key, yes } => {
            let request = CommandRequest::new().with_selection(parse_key(&key)?);
            fire_confirmed(router, CommandId::DEACTIVATE, request, yes, hints)
        }
        Commands::Run { id, file, key, yes } => {
            let mut request = CommandRequest::new();
            if let Some(file) = file {
                request = request.with_path(file);
            }
            if let Some(key) = key {
                request = request.with_selection(parse_key(&key)?);
            }
            fire_confirmed(router, CommandId(id), request, yes, hints)
        }
        Commands::Menu { .. } | Commands::About | Commands::HelpText | Commands::Shell => {
            Err(CliError::internal("command handled before login"))
        }
    }
}

// ============================================================================
// Context
// ============================================================================

fn app_context(
    settings: &Settings,
    database: Option<PathBuf>,
    profile: Option<&Path>,
) -> Result<AppContext, CliError> {
    let import = match profile {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::args(format!("cannot read import profile {}: {e}", path.display())))?;
            ImportConfig::from_toml(&text).map_err(|e| CliError::args(format!("{}: {e}", path.display())))?
        }
        None => ImportConfig::default()
            .with_email_domain(settings.email_domain.clone())
            .with_org_unit_validation(settings.validate_org_units),
    };
    import.validate().map_err(|e| {
        CliError::args(e.to_string()).with_hint("check \"import.emailDomain\" in settings")
    })?;

    let (local, destination) = settings.export_paths();
    Ok(AppContext {
        default_database: database,
        import,
        export: ExportWriter::new(local, destination),
    })
}

// ============================================================================
// Dispatch
// ============================================================================

/// Paths the error hints point at.
struct Hints {
    settings_path: PathBuf,
}

fn fire(
    router: &mut Router,
    id: CommandId,
    request: CommandRequest,
    hints: &Hints,
) -> Result<Outcome, CliError> {
    router
        .dispatch(id, &request)
        .map_err(|e| CliError::dispatch(e, hints))
}

fn fire_confirmed(
    router: &mut Router,
    id: CommandId,
    request: CommandRequest,
    yes: bool,
    hints: &Hints,
) -> Result<(), CliError> {
    if shell::needs_confirmation(id) && !yes {
        if let Some(key) = request.selection.as_ref() {
            if !confirm(&format!("{} {key}?", shell::action_name(id)))? {
                println!("cancelled");
                return Ok(());
            }
        }
    }
    let outcome = fire(router, id, request, hints)?;
    report(outcome, false)
}

fn confirm(question: &str) -> Result<bool, CliError> {
    eprint!("{question} [y/N] ");
    io::stderr().flush().map_err(|e| CliError::io(e.to_string()))?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| CliError::io(e.to_string()))?;
    Ok(shell::is_yes(&answer))
}

fn parse_key(input: &str) -> Result<RecordKey, CliError> {
    RecordKey::parse(input).ok_or_else(|| CliError::args("user key must not be empty"))
}

fn print(outcome: Outcome) {
    let stdout = io::stdout();
    let _ = render::write_outcome(&mut stdout.lock(), &outcome);
}

/// Print an outcome; a partially failed import exits non-zero.
fn report(outcome: Outcome, json: bool) -> Result<(), CliError> {
    let failed = match &outcome {
        Outcome::Imported(result) if !result.is_clean() => Some(result.failed()),
        _ => None,
    };
    match (&outcome, json) {
        (Outcome::Imported(result), true) => {
            let text = serde_json::to_string_pretty(&render::import_json(result))
                .map_err(|e| CliError::io(e.to_string()))?;
            println!("{text}");
        }
        _ => print(outcome),
    }
    if let Some(failed) = failed {
        return Err(CliError {
            code: EXIT_PARTIAL_IMPORT,
            message: format!("{failed} row(s) failed"),
            hint: None,
        });
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_menu(catalog: &CommandCatalog, session_active: bool, json: bool) -> Result<(), CliError> {
    if json {
        let text = serde_json::to_string_pretty(&render::menu_json(catalog, session_active))
            .map_err(|e| CliError::io(e.to_string()))?;
        println!("{text}");
    } else {
        print!("{}", render::menu_text(catalog, session_active));
    }
    Ok(())
}

fn cmd_list(router: &mut Router, json: bool, hints: &Hints) -> Result<(), CliError> {
    let session = router
        .session()
        .ok_or_else(|| CliError::no_session("list needs an active session", hints))?;
    if json {
        let text = serde_json::to_string_pretty(&render::view_json(session.view()))
            .map_err(|e| CliError::io(e.to_string()))?;
        println!("{text}");
    } else {
        print!("{}", render::view_text(session.view()));
    }
    Ok(())
}

fn cmd_import(router: &mut Router, file: PathBuf, json: bool, hints: &Hints) -> Result<(), CliError> {
    let outcome = fire(router, CommandId::IMPORT, CommandRequest::new().with_path(file), hints)?;
    report(outcome, json)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    fn no_session(msg: impl Into<String>, hints: &Hints) -> Self {
        Self { code: EXIT_NO_SESSION, message: msg.into(), hint: Some(login_hint(hints)) }
    }

    /// Create error from a router failure with the proper exit code.
    fn dispatch(err: DispatchError<AppError>, hints: &Hints) -> Self {
        let code = dispatch_exit_code(&err);
        let hint = match &err {
            DispatchError::NoActiveSession(_) => Some(login_hint(hints)),
            DispatchError::UnknownCommand(_) => Some("run `myadmin menu` to list command ids".to_string()),
            DispatchError::Handler(AppError::Import(ReconError::MissingColumn { .. })) => Some(
                "required columns are firstname, lastname, kurs, status_id_fk".to_string(),
            ),
            DispatchError::Handler(AppError::Export(myadmin_io::ExportError::Transfer { local, .. })) => {
                Some(format!("the export is still available at {}", local.display()))
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn login_hint(hints: &Hints) -> String {
    format!(
        "pass --database PATH or set \"store.database\" in {}",
        hints.settings_path.display()
    )
}
