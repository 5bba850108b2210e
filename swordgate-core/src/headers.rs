use std::collections::HashMap;

/// Returns the value for `name` from `headers`, matching the key
/// case-insensitively, or `default` when no key matches.
///
/// Header maps handed over by transport layers are not guaranteed to use
/// a canonical casing, so a case-insensitive view is provided here rather
/// than assumed. The value is returned unmodified.
pub fn header_or(headers: &HashMap<String, String>, name: &str, default: &str) -> String {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map_or_else(|| default.to_string(), |(_, value)| value.clone())
}
