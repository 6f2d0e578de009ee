use crate::error::ValidationError;
use scraper::Html;

/// Truncate for log lines, appending `...` when anything was cut.
#[must_use]
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let truncated = &s[..idx];
            format!("{}...", truncated.trim_end())
        }
        None => s.to_string(),
    }
}

/// Hard cap at `max_chars` characters, no marker.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Strip every tag from `input`, keeping only text content.
///
/// Entities are decoded and the contents of `<script>`/`<style>` are dropped
/// entirely. Plain text without markup characters is returned trimmed.
#[must_use]
pub fn strip_markup(input: &str) -> String {
    if !input.contains(['<', '&']) {
        return input.trim().to_string();
    }

    let fragment = Html::parse_fragment(input);
    let mut out = String::with_capacity(input.len());
    for node in fragment.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let raw_text_parent = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name().to_owned()))
            .is_some_and(|name| matches!(name.as_str(), "script" | "style"));
        if !raw_text_parent {
            out.push_str(text);
        }
    }
    out.trim().to_string()
}

/// Markup-free, length-capped text suitable for storing or forwarding.
#[must_use]
pub fn sanitize_content(input: &str, max_chars: usize) -> String {
    let stripped = strip_markup(input);
    truncate_chars(&stripped, max_chars).trim_end().to_string()
}

/// Strip markup from caller input and enforce a length bound.
///
/// Too-long input is rejected rather than silently cut.
pub fn sanitize_input(
    field: &'static str,
    raw: &str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let text = strip_markup(raw);
    if text.chars().count() > max_chars {
        return Err(ValidationError::TooLong {
            field,
            max: max_chars,
        });
    }
    if text.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(text)
}
