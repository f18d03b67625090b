use std::borrow::Cow;

const REDACTED: &str = "REDACTED";

const TOKEN_FIELDS: [&str; 3] = ["access_token", "refresh_token", "password"];

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let nee = needle.as_bytes();
    if nee.is_empty() {
        return Some(0);
    }
    if nee.len() > hay.len() {
        return None;
    }

    (0..=hay.len() - nee.len()).find(|&i| {
        hay[i..i + nee.len()]
            .iter()
            .zip(nee)
            .all(|(a, b)| a.to_ascii_lowercase() == b.to_ascii_lowercase())
    })
}

fn redact_header_value(text: String, header: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    loop {
        let Some(idx) = find_ascii_case_insensitive(rest, header) else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..idx + header.len()]);
        rest = &rest[idx + header.len()..];

        if let Some(stripped) = rest.strip_prefix(' ') {
            out.push(' ');
            rest = stripped;
        }

        let consumed = rest
            .find(|c: char| c == '\n' || c == '\r' || c == '"' || c == ',')
            .unwrap_or(rest.len());
        out.push_str(REDACTED);
        rest = &rest[consumed..];
    }
    out
}

/// Replaces the string value of `"field": "..."` pairs.
fn redact_json_field(text: String, field: &str) -> String {
    let key = format!("\"{field}\"");
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(idx) = rest.find(&key) {
        out.push_str(&rest[..idx + key.len()]);
        rest = &rest[idx + key.len()..];

        let after_colon = rest.trim_start();
        let Some(after_colon) = after_colon.strip_prefix(':') else {
            continue;
        };
        let value = after_colon.trim_start();
        let Some(value) = value.strip_prefix('"') else {
            continue;
        };
        let Some(end) = value.find('"') else {
            continue;
        };
        out.push_str(&rest[..rest.len() - value.len()]);
        out.push_str(REDACTED);
        rest = &value[end..];
    }
    out.push_str(rest);
    out
}

/// Strips bearer credentials and token-bearing JSON fields before text is
/// logged or handed back to the webview.
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let mut value = input.to_string();

    value = redact_header_value(value, "Refresh_Authorization: Bearer");
    value = redact_header_value(value, "Authorization: Bearer");
    for field in TOKEN_FIELDS {
        value = redact_json_field(value, field);
    }

    if value == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(value)
    }
}
