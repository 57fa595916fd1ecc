//! Interactive shell: one command per line until exit or end of input.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use myadmin_core::{CommandCatalog, CommandId, CommandRequest, RecordKey, RecordPatch};

use crate::handlers::{Outcome, Router};
use crate::render::{menu_text, view_text, write_outcome};

const PROMPT: &str = "myadmin> ";

const SHELL_HELP: &str = "\
commands:
  login [PATH]            open a database (default: store.database)
  logout
  import FILE             import users from CSV
  export                  transfer all users (alias: transfer)
  list                    show users
  edit KEY FIELD=VALUE..  change fields (firstname, lastname, email, phone,
                          department, street, city, city_code, postalcode,
                          status, ou); quote values with spaces
  delete KEY              delete a user (asks for confirmation)
  deactivate KEY          mark a user inactive (asks for confirmation)
  menu | status | about | help | exit
  ID [ARG]                fire a command by catalog id
KEY is a numeric id or a username.";

#[derive(Debug, PartialEq)]
enum Line {
    Blank,
    Dispatch(CommandId, CommandRequest),
    List,
    Menu,
    Status,
    ShellHelp,
}

/// Run the shell until `exit` (id 19) or end of input. The session is closed
/// either way.
pub fn run<R: BufRead, W: Write>(
    router: &mut Router,
    catalog: &CommandCatalog,
    mut input: R,
    mut out: W,
) -> io::Result<()> {
    let mut buf = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        buf.clear();
        if input.read_line(&mut buf)? == 0 {
            writeln!(out)?;
            break;
        }

        let line = match parse_line(&buf) {
            Ok(line) => line,
            Err(msg) => {
                writeln!(out, "error: {msg}")?;
                continue;
            }
        };

        match line {
            Line::Blank => {}
            Line::ShellHelp => writeln!(out, "{SHELL_HELP}")?,
            Line::Menu => write!(out, "{}", menu_text(catalog, router.has_session()))?,
            Line::Status => match router.session() {
                Some(session) => writeln!(
                    out,
                    "logged in to {} since {} ({} user(s) cached)",
                    session.target(),
                    session
                        .opened_at()
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M:%S"),
                    session.view().len()
                )?,
                None => writeln!(out, "not logged in")?,
            },
            Line::List => match router.session() {
                Some(session) => write!(out, "{}", view_text(session.view()))?,
                None => writeln!(out, "error: log in first")?,
            },
            Line::Dispatch(id, request) => {
                if needs_confirmation(id) {
                    let Some(key) = request.selection.as_ref() else {
                        writeln!(out, "error: no record selected")?;
                        continue;
                    };
                    write!(out, "{} {key}? [y/N] ", action_name(id))?;
                    out.flush()?;
                    buf.clear();
                    input.read_line(&mut buf)?;
                    if !is_yes(&buf) {
                        writeln!(out, "cancelled")?;
                        continue;
                    }
                }

                match router.dispatch(id, &request) {
                    Ok(Outcome::Exit) => {
                        writeln!(out, "{}", Outcome::Exit)?;
                        return Ok(());
                    }
                    Ok(outcome) => write_outcome(&mut out, &outcome)?,
                    Err(e) => writeln!(out, "error: {e}")?,
                }
            }
        }
    }

    if let Err(e) = router.close_session() {
        tracing::warn!("closing session at end of input failed: {e}");
    }
    Ok(())
}

pub(crate) fn needs_confirmation(id: CommandId) -> bool {
    id == CommandId::DELETE || id == CommandId::DEACTIVATE
}

pub(crate) fn action_name(id: CommandId) -> &'static str {
    match id {
        CommandId::DELETE => "delete",
        CommandId::DEACTIVATE => "deactivate",
        _ => "run",
    }
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "j" | "ja")
}

fn parse_line(raw: &str) -> Result<Line, String> {
    let tokens = tokenize(raw)?;
    let Some((verb, args)) = tokens.split_first() else {
        return Ok(Line::Blank);
    };
    let arg = |name: &str| -> Result<&String, String> {
        args.first().ok_or_else(|| format!("{verb} needs {name}"))
    };

    let line = match verb.to_ascii_lowercase().as_str() {
        "login" => {
            let mut request = CommandRequest::new();
            if let Some(path) = args.first() {
                request = request.with_path(path);
            }
            Line::Dispatch(CommandId::LOGIN, request)
        }
        "logout" => Line::Dispatch(CommandId::LOGOUT, CommandRequest::new()),
        "import" => Line::Dispatch(CommandId::IMPORT, CommandRequest::new().with_path(arg("a file")?)),
        "export" | "transfer" => Line::Dispatch(CommandId::EXPORT, CommandRequest::new()),
        "edit" => {
            let key = parse_key(arg("a record key")?)?;
            let mut patch = RecordPatch::default();
            for assignment in &args[1..] {
                let (field, value) = assignment
                    .split_once('=')
                    .ok_or_else(|| format!("expected FIELD=VALUE, got '{assignment}'"))?;
                set_patch_field(&mut patch, field, value)?;
            }
            Line::Dispatch(CommandId::EDIT, CommandRequest::new().with_selection(key).with_patch(patch))
        }
        "delete" => Line::Dispatch(
            CommandId::DELETE,
            CommandRequest::new().with_selection(parse_key(arg("a record key")?)?),
        ),
        "deactivate" => Line::Dispatch(
            CommandId::DEACTIVATE,
            CommandRequest::new().with_selection(parse_key(arg("a record key")?)?),
        ),
        "about" => Line::Dispatch(CommandId::ABOUT, CommandRequest::new()),
        "help" => Line::Dispatch(CommandId::HELP, CommandRequest::new()),
        "exit" | "quit" => Line::Dispatch(CommandId::EXIT, CommandRequest::new()),
        "list" => Line::List,
        "menu" => Line::Menu,
        "status" => Line::Status,
        "?" | "commands" => Line::ShellHelp,
        other => {
            let id: u16 = other
                .parse()
                .map_err(|_| format!("unknown command '{other}'; type ? for a list"))?;
            let id = CommandId(id);
            let mut request = CommandRequest::new();
            if let Some(value) = args.first() {
                request = match id {
                    CommandId::LOGIN | CommandId::IMPORT => request.with_path(PathBuf::from(value)),
                    _ => request.with_selection(parse_key(value)?),
                };
            }
            Line::Dispatch(id, request)
        }
    };
    Ok(line)
}

fn parse_key(input: &str) -> Result<RecordKey, String> {
    RecordKey::parse(input).ok_or_else(|| "record key must not be empty".to_string())
}

/// Set one edit field by its shell/CLI name.
pub(crate) fn set_patch_field(patch: &mut RecordPatch, field: &str, value: &str) -> Result<(), String> {
    let code = |v: &str| {
        v.trim()
            .parse::<i64>()
            .map_err(|_| format!("{field} must be a number, got '{v}'"))
    };
    let text = Some(value.to_string());
    match field.trim().to_ascii_lowercase().as_str() {
        "firstname" => patch.firstname = text,
        "lastname" => patch.lastname = text,
        "email" => patch.email = text,
        "phone" => patch.phone = text,
        "department" | "abteilung" => patch.department = text,
        "street" => patch.street = text,
        "city" => patch.city = text,
        "city_code" => patch.city_code = text,
        "postalcode" => patch.postalcode = text,
        "status" | "status_id_fk" => patch.status = Some(code(value)?),
        "ou" | "kurs" | "ou_id_fk" => patch.org_unit = Some(code(value)?),
        other => return Err(format!("unknown field '{other}'")),
    }
    Ok(())
}

/// Split on whitespace; double quotes group words, including around `=`.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;

    for ch in line.trim().chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if in_quotes {
        return Err("unterminated quote".into());
    }
    if started {
        tokens.push(current);
    }
    Ok(tokens)
}
