//! Neutral-placeholder statement rewriting.
//!
//! Statements are written once with `?` placeholders. SQLite accepts that
//! syntax natively; PostgreSQL requires `$1`, `$2`, ... indexed left-to-right
//! to match the positional parameter list.

use std::borrow::Cow;

/// Rewrite every `?` placeholder to `$1..$n` in left-to-right order.
///
/// `?` inside single-quoted string literals is left untouched. A doubled
/// quote (`''`) toggles the literal state twice, which is harmless.
pub fn rewrite_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0u32;
    let mut in_literal = false;

    for c in sql.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            _ => out.push(c),
        }
    }

    out
}

/// True when the statement is an INSERT.
pub fn is_insert(sql: &str) -> bool {
    let t = sql.trim_start().as_bytes();
    t.len() >= 6 && t[..6].eq_ignore_ascii_case(b"insert")
}

/// Append ` RETURNING id` to an INSERT so the identifier can be read back
/// on engines that do not report it inline. Statements that already carry a
/// RETURNING clause are left untouched.
pub fn append_returning(sql: &str) -> Cow<'_, str> {
    if is_insert(sql) && !sql.to_ascii_uppercase().contains("RETURNING") {
        let trimmed = sql.trim_end().trim_end_matches(';');
        Cow::Owned(format!("{trimmed} RETURNING id"))
    } else {
        Cow::Borrowed(sql)
    }
}
