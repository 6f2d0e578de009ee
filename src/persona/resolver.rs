//! Free-text persona detection.
//!
//! Everything here is pure: no session state is read or written. The
//! orchestrator combines [`resolve`] with [`is_switch_request`] to decide
//! whether a mention actually changes the active persona.

use super::catalog::PersonaCatalog;

const MAX_NAME_CHARS: usize = 50;

/// Phrases that explicitly ask for another character, matched on word boundaries.
const SWITCH_PHRASES: [&str; 10] = [
    "talk to",
    "talk with",
    "speak to",
    "speak with",
    "chat with",
    "switch to",
    "change to",
    "connect me to",
    "connect me with",
    "put me through to",
];

const GREETINGS: [&str; 6] = ["hi", "hello", "hey", "hiya", "greetings", "howdy"];

/// A greeting followed by at most this many words still counts as "bare".
const MAX_GREETING_TAIL_WORDS: usize = 2;

/// Outcome of scanning text against the alias table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection<'a> {
    None,
    Unique(&'a str),
    Ambiguous(Vec<&'a str>),
}

/// Lower-case, drop punctuation, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every persona whose alias set matches `text`, by case-insensitive containment.
pub fn detect<'a>(catalog: &'a PersonaCatalog, text: &str) -> Detection<'a> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Detection::None;
    }

    let matched: Vec<&str> = catalog
        .alias_table()
        .filter(|(_, aliases)| aliases.iter().any(|alias| normalized.contains(alias.as_str())))
        .map(|(id, _)| id)
        .collect();

    match matched.as_slice() {
        [] => Detection::None,
        [only] => Detection::Unique(only),
        _ => Detection::Ambiguous(matched),
    }
}

/// The single persona mentioned in `text`, or `None` when zero or several match.
pub fn resolve<'a>(catalog: &'a PersonaCatalog, text: &str) -> Option<&'a str> {
    match detect(catalog, text) {
        Detection::Unique(id) => Some(id),
        Detection::Ambiguous(ids) => {
            tracing::warn!(
                candidates = ?ids,
                "ambiguous persona mention; keeping current persona"
            );
            None
        }
        Detection::None => None,
    }
}

/// Conservative check for an explicit request to change characters.
pub fn is_switch_request(text: &str) -> bool {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return false;
    }

    let padded = format!(" {normalized} ");
    if SWITCH_PHRASES
        .iter()
        .any(|phrase| padded.contains(&format!(" {phrase} ")))
    {
        return true;
    }

    let mut words = normalized.split(' ');
    let starts_with_greeting = words
        .next()
        .is_some_and(|first| GREETINGS.contains(&first));
    starts_with_greeting && words.count() <= MAX_GREETING_TAIL_WORDS
}

/// The message as a student name, if it is letters and spaces only and at most 50 chars.
pub fn capture_name(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_CHARS {
        return None;
    }
    if !trimmed.chars().all(|c| c.is_alphabetic() || c == ' ') {
        return None;
    }
    Some(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}
