//! Text and JSON rendering shared by one-shot commands and the shell.

use std::io::{self, Write};

use serde_json::{json, Map, Value};

use myadmin_core::{CommandCatalog, RecordView, SqlValue, ToolbarItem};
use myadmin_recon::ReconciliationOutcome;

use crate::handlers::Outcome;
use crate::util::{format_table, pad_right};

const LABEL_WIDTH: usize = 22;

/// Menus in declaration order, then the toolbar. Commands that need a
/// session are marked while logged out.
pub fn menu_text(catalog: &CommandCatalog, session_active: bool) -> String {
    let mut out = String::new();
    for group in catalog.groups() {
        out.push_str(&format!(
            "{} (Alt+{})\n",
            group.display_title(),
            group.accelerator().to_ascii_uppercase()
        ));
        for command in catalog.entries_for_group(group.id) {
            if command.is_separator() {
                out.push_str("  ----\n");
                continue;
            }
            let accel = command
                .accelerator()
                .map(|c| c.to_ascii_uppercase().to_string())
                .unwrap_or_default();
            let state = if catalog.is_enabled(command.id, session_active) {
                ""
            } else {
                "  (log in first)"
            };
            let line = format!(
                "  {:>2}  {} {accel}{state}",
                command.id,
                pad_right(&command.display_label(), LABEL_WIDTH)
            );
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    let toolbar: Vec<String> = catalog
        .toolbar_commands()
        .into_iter()
        .map(|item| match item {
            Some(command) => format!("[{}]", command.display_label()),
            None => "|".to_string(),
        })
        .collect();
    out.push_str(&format!("Toolbar: {}\n", toolbar.join(" ")));
    out
}

pub fn menu_json(catalog: &CommandCatalog, session_active: bool) -> Value {
    let groups: Vec<Value> = catalog
        .groups()
        .iter()
        .map(|group| {
            let entries: Vec<Value> = catalog
                .entries_for_group(group.id)
                .into_iter()
                .map(|command| {
                    if command.is_separator() {
                        json!({ "kind": "separator" })
                    } else {
                        json!({
                            "id": command.id,
                            "label": command.display_label(),
                            "accelerator": command.accelerator().map(String::from),
                            "kind": command.kind,
                            "session_required": command.session_required,
                            "enabled": catalog.is_enabled(command.id, session_active),
                        })
                    }
                })
                .collect();
            json!({
                "id": group.id,
                "title": group.display_title(),
                "accelerator": group.accelerator().to_string(),
                "entries": entries,
            })
        })
        .collect();

    let toolbar: &[ToolbarItem] = catalog.toolbar();
    json!({ "groups": groups, "toolbar": toolbar })
}

/// One JSON object per record, keys in column order.
pub fn view_json(view: &RecordView) -> Value {
    let records: Vec<Value> = view
        .rows
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            for (name, value) in view.columns.iter().zip(row) {
                let v = match value {
                    SqlValue::Null => Value::Null,
                    SqlValue::Integer(n) => json!(n),
                    SqlValue::Real(x) => json!(x),
                    SqlValue::Text(s) => json!(s),
                };
                obj.insert(name.clone(), v);
            }
            Value::Object(obj)
        })
        .collect();
    Value::Array(records)
}

pub fn view_text(view: &RecordView) -> String {
    if view.columns.is_empty() {
        return "no records\n".to_string();
    }
    format_table(view)
}

pub fn import_json(outcome: &ReconciliationOutcome) -> Value {
    json!({
        "inserted": outcome.inserted,
        "updated": outcome.updated,
        "failed": outcome.failed(),
        "failures": outcome.failures,
    })
}

/// Human-readable result of a dispatched command.
pub fn write_outcome<W: Write>(out: &mut W, outcome: &Outcome) -> io::Result<()> {
    writeln!(out, "{outcome}")?;
    if let Outcome::Imported(result) = outcome {
        for failure in &result.failures {
            writeln!(out, "  {failure}")?;
        }
    }
    Ok(())
}
