// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret-bearing field redaction and message truncation (spec §4.2).

use regex::RegexSet;
use serde_json::Value;
use std::sync::LazyLock;

const REDACTED: &str = "[REDACTED]";

/// Longest a logged message string may be before truncation.
pub const MAX_MESSAGE_LEN: usize = 500;

// Allow expect here as the patterns are compile-time verified to be valid
#[allow(clippy::expect_used)]
static SENSITIVE_KEY: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(["(?i)api_key", "(?i)secret", "(?i)password", "(?i)token"])
        .expect("static redaction patterns are valid")
});

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEY.is_match(key)
}

/// Walk a JSON value, replacing the value of any object key matching the
/// sensitive-key patterns with `"[REDACTED]"`. Recurses into nested objects
/// and arrays; leaves non-object/array values untouched.
pub fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *v = Value::String(REDACTED.to_string());
                } else {
                    redact_value(v);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_value(item);
            }
        }
        _ => {}
    }
}

/// Return a redacted clone of `value`, leaving the original untouched.
pub fn redacted(value: &Value) -> Value {
    let mut clone = value.clone();
    redact_value(&mut clone);
    clone
}

/// Truncate a message to [`MAX_MESSAGE_LEN`] chars, respecting UTF-8
/// boundaries, appending an ellipsis when truncated.
pub fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MAX_MESSAGE_LEN {
        return message.to_string();
    }
    let mut truncated: String = message.chars().take(MAX_MESSAGE_LEN).collect();
    truncated.push('…');
    truncated
}
