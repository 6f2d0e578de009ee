use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Secret-bearing prefixes that can show up when an upstream echoes a request.
const PREFIX_PATTERNS: [&str; 3] = ["sk-", "sk_", "xi-"];

/// Markers after which the next token is a credential.
const MARKER_PATTERNS: [&str; 8] = [
    "Bearer ",
    "bearer ",
    "xi-api-key: ",
    "\"xi-api-key\":\"",
    "api_key=",
    "token=",
    "\"api_key\":\"",
    "\"token\":\"",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '+' | '/' | '=')
}

fn redact_after(scrubbed: &mut String, marker: &str) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let value_start = start + marker.len();
        let value_len: usize = scrubbed[value_start..]
            .chars()
            .take_while(|c| is_secret_char(*c))
            .map(char::len_utf8)
            .sum();

        if value_len == 0 {
            search_from = value_start;
            continue;
        }

        scrubbed.replace_range(start..value_start + value_len, REDACTED);
        search_from = start + REDACTED.len();
    }
}

/// Redact API keys and bearer tokens from upstream error text.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrubbing = PREFIX_PATTERNS
        .iter()
        .chain(MARKER_PATTERNS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrubbing {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in MARKER_PATTERNS.iter().chain(PREFIX_PATTERNS.iter()) {
        redact_after(&mut scrubbed, marker);
    }
    Cow::Owned(scrubbed)
}

/// Scrub secrets and cap the length of an upstream error body.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);
    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }
    format!(
        "{}...",
        super::text::truncate_chars(&scrubbed, MAX_API_ERROR_CHARS)
    )
}
