//! Identity fields computed from a person's names.

/// First letter of the first name followed by the last name, lowercased.
///
/// Callers pass trimmed names; an empty first name yields just the last name.
pub fn derive_username(firstname: &str, lastname: &str) -> String {
    let initial: String = firstname.chars().take(1).collect();
    format!("{initial}{lastname}").to_lowercase()
}

/// `first.last@domain` with both name parts lowercased. The domain keeps its case.
pub fn derive_email(firstname: &str, lastname: &str, domain: &str) -> String {
    format!(
        "{}.{}@{}",
        firstname.to_lowercase(),
        lastname.to_lowercase(),
        domain.trim()
    )
}
