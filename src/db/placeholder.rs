//! Placeholder normalization.
//!
//! Legacy query text uses sprintf-style conversions (`%s`, `%d`, `%F`, with
//! optional argument number, flags, width and precision) where the driver
//! expects anonymous `?` markers. [`normalize_placeholders`] rewrites each
//! conversion to `?`. A doubled `%%` is a literal percent: it is copied
//! through untouched and never starts a conversion. Text inside single-quoted
//! SQL string literals is also copied through, so functions such as
//! `strftime('%s', 'now')` keep their format strings.
//! A quoted `'%s'` is therefore text, not a placeholder: write `name = %s`,
//! not `name = '%s'`.

use regex::Regex;
use std::sync::OnceLock;

/// Conversion specification following a single `%`, anchored at the start.
const CONVERSION_PATTERN: &str = r"^(?:[1-9][0-9]*\$)?[-+0-9]*(?: |0|'.)?[-+0-9]*(?:\.[0-9]+)?[sdF]";

fn conversion_regex() -> Option<&'static Regex> {
    static CONVERSION: OnceLock<Option<Regex>> = OnceLock::new();
    CONVERSION.get_or_init(|| Regex::new(CONVERSION_PATTERN).ok()).as_ref()
}

/// The driver's positional marker.
pub const DRIVER_PLACEHOLDER: char = '?';

/// Rewrite sprintf-style conversions in `sql` to driver placeholders.
pub fn normalize_placeholders(sql: &str) -> String {
    if !sql.contains('%') {
        return sql.to_string();
    }
    let Some(conversion) = conversion_regex() else {
        return sql.to_string();
    };

    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    let mut in_literal = false;

    while let Some(c) = rest.chars().next() {
        let after = &rest[c.len_utf8()..];

        if in_literal {
            if c == '\'' {
                in_literal = false;
            }
            out.push(c);
            rest = after;
            continue;
        }

        match c {
            '\'' => {
                in_literal = true;
                out.push(c);
                rest = after;
            }
            '%' if after.starts_with('%') => {
                out.push_str("%%");
                rest = &after[1..];
            }
            '%' => match conversion.find(after) {
                Some(m) => {
                    out.push(DRIVER_PLACEHOLDER);
                    rest = &after[m.end()..];
                }
                None => {
                    out.push('%');
                    rest = after;
                }
            },
            _ => {
                out.push(c);
                rest = after;
            }
        }
    }

    out
}
