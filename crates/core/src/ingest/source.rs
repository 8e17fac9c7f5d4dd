use anyhow::{bail, Context};
use serde_json::Value;
use std::path::Path;

/// Strips a JavaScript assignment wrapper (`const reports = [ ... ];`) down to the
/// JSON array it carries. Plain JSON is returned unchanged.
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Some(trimmed);
    }

    let body = skip_line_comments(trimmed);
    if body.starts_with('[') || body.starts_with('{') {
        return Some(body);
    }

    // Best-effort extraction: first '[' after the assignment to last ']'.
    let after_assign = body.find('=').map_or(0, |i| i + 1);
    let start = after_assign + body[after_assign..].find('[')?;
    let end = body.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&body[start..=end])
}

fn skip_line_comments(text: &str) -> &str {
    let mut rest = text;
    while rest.starts_with("//") {
        rest = match rest.find('\n') {
            Some(i) => rest[i + 1..].trim_start(),
            None => "",
        };
    }
    rest
}

/// Parses report input text into raw, not yet validated, records.
///
/// Accepts a JSON array, an object with a `reports` array, or a JS file
/// assigning such an array to a variable.
pub fn extract_records(text: &str) -> anyhow::Result<Vec<Value>> {
    let json_str = extract_json(text).context("report input contains no JSON array")?;
    let parsed = serde_json::from_str::<Value>(json_str)
        .context("report input is not valid JSON")?;

    match parsed {
        Value::Array(records) => Ok(records),
        Value::Object(mut obj) => match obj.remove("reports") {
            Some(Value::Array(records)) => Ok(records),
            _ => bail!("report input object has no `reports` array"),
        },
        other => bail!("report input must be an array of records (got {other})"),
    }
}

pub fn load_records(path: impl AsRef<Path>) -> anyhow::Result<Vec<Value>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report file {}", path.display()))?;
    let records = extract_records(&text)
        .with_context(|| format!("failed to parse report file {}", path.display()))?;

    tracing::debug!(path = %path.display(), records = records.len(), "loaded report file");
    Ok(records)
}
