//! Item key naming shared by every metric kind.
//!
//! Keys must stay byte-for-byte stable: servers already holding history for a
//! key would otherwise see a brand new item.

use regex::Regex;
use std::sync::OnceLock;

/// Characters the server does not accept in item keys.
const DISALLOWED_KEY_CHARS: &str = r"[^a-zA-Z0-9\-_\.]";

/// Prefix of every health check item.
pub const HEALTH_STATUS_PREFIX: &str = "HealthStatus";

static DISALLOWED: OnceLock<Option<Regex>> = OnceLock::new();

fn disallowed() -> Option<&'static Regex> {
    DISALLOWED
        .get_or_init(|| Regex::new(DISALLOWED_KEY_CHARS).ok())
        .as_ref()
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Strips every character outside `[a-zA-Z0-9-_.]`; nothing is substituted.
pub fn sanitize(name: &str) -> String {
    match disallowed() {
        Some(regex) => regex.replace_all(name, "").into_owned(),
        None => name.chars().filter(|c| is_key_char(*c)).collect(),
    }
}

/// `name.sub`
pub fn subfolder_name(name: &str, sub: &str) -> String {
    format!("{name}.{sub}")
}

/// `name.sub-per-`, the percentage share of a sub-item.
pub fn subfolder_name_as_percent(name: &str, sub: &str) -> String {
    format!("{name}.{sub}-per-")
}

/// Joins the enclosing contexts, minus the outermost one, with the context
/// itself using `-`. The outermost context alone has an empty name.
pub fn format_context_name(stack: &[String], context: &str) -> String {
    if stack.is_empty() {
        return String::new();
    }
    let joined = stack[1..]
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(context))
        .collect::<Vec<_>>()
        .join("-");
    sanitize(&joined)
}

/// `context-name`, sanitized. Metrics of the outermost context therefore
/// start with `-`.
pub fn format_metric_name(context: &str, name: &str) -> String {
    sanitize(&format!("{context}-{name}"))
}

pub fn health_status_name(check: &str) -> String {
    subfolder_name(HEALTH_STATUS_PREFIX, check)
}

pub fn health_message_name(check: &str) -> String {
    subfolder_name(HEALTH_STATUS_PREFIX, &subfolder_name(check, "Message"))
}
