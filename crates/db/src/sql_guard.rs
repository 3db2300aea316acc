//! Narrow allow-list guard for oracle-generated SQL.
//!
//! This is a safety valve against a generated query escaping its read-only
//! scope, not a SQL parser. It accepts some false positives and negatives by
//! design of its checks: leading SELECT, no mutating keyword, no statement
//! separator, and at least one allowed table referenced.

/// Tables the text-to-SQL translator may read.
pub const ALLOWED_TABLES: &[&str] = &["orders", "complaints", "policies"];

const DISALLOWED_KEYWORDS: &[&str] =
    &["INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "PRAGMA", "ATTACH", "DETACH", "REPLACE"];

/// Returns true only when `sql` is a single read-only SELECT over at least
/// one allowed table.
pub fn is_safe_select(sql: &str, allowed_tables: &[&str]) -> bool {
    let normalized = sql.trim().trim_matches(';').trim();
    if normalized.is_empty() {
        return false;
    }

    let upper = normalized.to_ascii_uppercase();
    if !upper.starts_with("SELECT") {
        return false;
    }
    if normalized.contains(';') {
        return false;
    }
    if DISALLOWED_KEYWORDS.iter().any(|keyword| contains_word(&upper, keyword)) {
        return false;
    }

    allowed_tables.iter().any(|table| contains_word(&upper, &table.to_ascii_uppercase()))
}

/// Word-boundary containment: `needle` must not be embedded in a longer
/// identifier (so `UPDATED_AT` does not trip the `UPDATE` check).
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut search_from = 0;
    while let Some(offset) = haystack[search_from..].find(needle) {
        let start = search_from + offset;
        let end = start + needle.len();

        let boundary_before = start == 0 || !is_identifier_char(haystack.as_bytes()[start - 1]);
        let boundary_after =
            end == haystack.len() || !is_identifier_char(haystack.as_bytes()[end]);
        if boundary_before && boundary_after {
            return true;
        }

        search_from = start + 1;
    }
    false
}

fn is_identifier_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
