//! Command catalog: the single source of truth for menus and the toolbar.
//!
//! Identifiers are allocated in blocks of ten per menu group: every id in
//! `[10, 19]` lives in group 1, `[20, 29]` in group 2, and so on. The group is
//! always derived with [`group_of`]; it is never stored independently of the id
//! except to be checked against it. Id `0` is reserved for separators and never
//! carries a label or a handler.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CommandId(pub u16);

impl CommandId {
    pub const SEPARATOR: Self = Self(0);
    pub const IMPORT: Self = Self(11);
    pub const EXPORT: Self = Self(12);
    pub const LOGIN: Self = Self(13);
    pub const LOGOUT: Self = Self(14);
    pub const EXIT: Self = Self(19);
    pub const EDIT: Self = Self(21);
    pub const DELETE: Self = Self(22);
    pub const DEACTIVATE: Self = Self(23);
    pub const ABOUT: Self = Self(41);
    pub const HELP: Self = Self(42);

    pub fn is_separator(self) -> bool {
        self == Self::SEPARATOR
    }

    pub fn group(self) -> u16 {
        group_of(self)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Menu group implied by an identifier (integer division by ten).
pub fn group_of(id: CommandId) -> u16 {
    id.0 / 10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Action,
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub id: CommandId,
    pub label: &'static str,
    pub group: u16,
    pub kind: CommandKind,
    pub session_required: bool,
}

impl Command {
    pub fn is_separator(&self) -> bool {
        self.kind == CommandKind::Separator
    }

    /// Label without the `&` accelerator marker.
    pub fn display_label(&self) -> String {
        strip_accel(self.label)
    }

    pub fn accelerator(&self) -> Option<char> {
        if self.is_separator() {
            None
        } else {
            Some(resolve_accel(self.label))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuGroup {
    pub id: u16,
    pub title: &'static str,
}

impl MenuGroup {
    pub fn display_title(&self) -> String {
        strip_accel(self.title)
    }

    pub fn accelerator(&self) -> char {
        resolve_accel(self.title)
    }
}

/// One declaration in a catalog table.
#[derive(Debug, Clone, Copy)]
pub enum CatalogEntry {
    Action { id: u16, label: &'static str, group: u16, session_required: bool },
    Separator { group: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum ToolbarItem {
    Command(CommandId),
    Separator,
}

pub const STANDARD_GROUPS: &[MenuGroup] = &[
    MenuGroup { id: 1, title: "&File" },
    MenuGroup { id: 2, title: "&Active Directory" },
    MenuGroup { id: 4, title: "&Help" },
];

pub const STANDARD_ENTRIES: &[CatalogEntry] = &[
    CatalogEntry::Action { id: 11, label: "&Import from CSV", group: 1, session_required: true },
    CatalogEntry::Action { id: 12, label: "&Transfer to AD", group: 1, session_required: true },
    CatalogEntry::Action { id: 13, label: "Log &in", group: 1, session_required: false },
    CatalogEntry::Action { id: 14, label: "Log &out", group: 1, session_required: false },
    CatalogEntry::Separator { group: 1 },
    CatalogEntry::Action { id: 19, label: "E&xit", group: 1, session_required: false },
    CatalogEntry::Action { id: 21, label: "&Edit user", group: 2, session_required: true },
    CatalogEntry::Action { id: 22, label: "&Delete AD user", group: 2, session_required: true },
    CatalogEntry::Action { id: 23, label: "De&activate AD user", group: 2, session_required: true },
    CatalogEntry::Action { id: 41, label: "&About", group: 4, session_required: false },
    CatalogEntry::Action { id: 42, label: "&Help", group: 4, session_required: false },
];

pub const STANDARD_TOOLBAR: &[ToolbarItem] = &[
    ToolbarItem::Command(CommandId::LOGIN),
    ToolbarItem::Command(CommandId::IMPORT),
    ToolbarItem::Command(CommandId::EXPORT),
    ToolbarItem::Separator,
    ToolbarItem::Command(CommandId::EDIT),
    ToolbarItem::Command(CommandId::DELETE),
    ToolbarItem::Command(CommandId::DEACTIVATE),
    ToolbarItem::Separator,
    ToolbarItem::Command(CommandId::HELP),
];

/// Immutable catalog built once at startup.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    groups: Vec<MenuGroup>,
    entries: Vec<Command>,
    toolbar: Vec<ToolbarItem>,
}

impl CommandCatalog {
    /// Build a catalog from a closed table. Any inconsistency is fatal.
    pub fn new(
        groups: &[MenuGroup],
        entries: &[CatalogEntry],
        toolbar: &[ToolbarItem],
    ) -> Result<Self, CatalogError> {
        let group_ids: HashSet<u16> = groups.iter().map(|g| g.id).collect();
        let mut seen: HashSet<CommandId> = HashSet::new();
        let mut commands = Vec::with_capacity(entries.len());

        for entry in entries {
            let command = match *entry {
                CatalogEntry::Action { id, label, group, session_required } => {
                    let id = CommandId(id);
                    if id.is_separator() {
                        return Err(CatalogError::ReservedSeparator);
                    }
                    let derived = group_of(id);
                    if derived != group {
                        return Err(CatalogError::GroupMismatch { id, declared: group, derived });
                    }
                    if !seen.insert(id) {
                        return Err(CatalogError::DuplicateId(id));
                    }
                    Command { id, label, group, kind: CommandKind::Action, session_required }
                }
                CatalogEntry::Separator { group } => Command {
                    id: CommandId::SEPARATOR,
                    label: "",
                    group,
                    kind: CommandKind::Separator,
                    session_required: false,
                },
            };
            if !group_ids.contains(&command.group) {
                return Err(CatalogError::UnknownGroup(command.group));
            }
            commands.push(command);
        }

        for item in toolbar {
            if let ToolbarItem::Command(id) = item {
                if id.is_separator() {
                    return Err(CatalogError::ReservedSeparator);
                }
                if !seen.contains(id) {
                    return Err(CatalogError::UnknownId(*id));
                }
            }
        }

        Ok(Self {
            groups: groups.to_vec(),
            entries: commands,
            toolbar: toolbar.to_vec(),
        })
    }

    /// The application's built-in menus and toolbar.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(STANDARD_GROUPS, STANDARD_ENTRIES, STANDARD_TOOLBAR)
    }

    pub fn groups(&self) -> &[MenuGroup] {
        &self.groups
    }

    /// Entries of one menu group in declaration order, separators included.
    pub fn entries_for_group(&self, group: u16) -> Vec<&Command> {
        self.entries.iter().filter(|c| c.group == group).collect()
    }

    /// All actions (separators excluded) in declaration order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter().filter(|c| !c.is_separator())
    }

    pub fn get(&self, id: CommandId) -> Option<&Command> {
        if id.is_separator() {
            return None;
        }
        self.entries.iter().find(|c| c.id == id)
    }

    pub fn toolbar(&self) -> &[ToolbarItem] {
        &self.toolbar
    }

    /// Toolbar items resolved against the catalog; `None` marks a separator.
    pub fn toolbar_commands(&self) -> Vec<Option<&Command>> {
        self.toolbar
            .iter()
            .map(|item| match item {
                ToolbarItem::Command(id) => self.get(*id),
                ToolbarItem::Separator => None,
            })
            .collect()
    }

    /// Whether a command can be fired in the current session state.
    pub fn is_enabled(&self, id: CommandId, session_active: bool) -> bool {
        match self.get(id) {
            Some(cmd) => session_active || !cmd.session_required,
            None => false,
        }
    }
}

/// Remove `&` accelerator markers; `&&` stands for a literal ampersand.
pub fn strip_accel(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut chars = label.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            if chars.peek() == Some(&'&') {
                out.push('&');
                chars.next();
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Accelerator character of a label: the char after `&`, else the first letter.
pub fn resolve_accel(label: &str) -> char {
    let mut chars = label.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            match chars.peek() {
                Some('&') => {
                    chars.next();
                }
                Some(next) => return next.to_ascii_lowercase(),
                None => break,
            }
        }
    }
    label
        .chars()
        .find(|c| c.is_alphanumeric())
        .unwrap_or(' ')
        .to_ascii_lowercase()
}
