//! Canonicalization of free-text fields.
//!
//! `clean` produces display values, `normalize_key` produces comparison keys.
//! Neither can fail: absent input gives a defined (absent) output.

use std::fmt;

/// Trims surrounding whitespace. Absent or blank input is absent, never `""`.
pub fn clean(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `clean`, then collapse whitespace runs to a single space and lower-case.
/// Only for building keys; never store the result as a display value.
pub fn normalize_key(value: Option<&str>) -> Option<String> {
    let cleaned = clean(value)?;
    Some(
        cleaned
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    )
}

/// Employer part of a group key.
///
/// Observations without a usable employer name get `Unnamed` with their own
/// input position, so they never merge with each other or with a real
/// employer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EmployerComponent {
    Named(String),
    Unnamed(usize),
}

impl fmt::Display for EmployerComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployerComponent::Named(name) => f.write_str(name),
            EmployerComponent::Unnamed(position) => write!(f, "<unknown company #{position}>"),
        }
    }
}

pub fn employer_group_component(employer_name: Option<&str>, position: usize) -> EmployerComponent {
    match normalize_key(employer_name) {
        Some(key) => EmployerComponent::Named(key),
        None => EmployerComponent::Unnamed(position),
    }
}
