//! Splitting schema text into individual statements.
//!
//! Statements are separated by `;`, except where the semicolon sits inside a
//! quoted literal or identifier (`'...'`, `"..."`, `` `...` ``) or inside a
//! `-- line` or `/* block */` comment. Each piece is trimmed and empty pieces
//! are dropped. Compound bodies such as `CREATE TRIGGER ... BEGIN ...; END`
//! are not recognised and still split at their inner semicolons.

/// Split `schema` into trimmed, non-empty statements.
pub fn split_statements(schema: &str) -> Vec<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Normal,
        Quoted(char),
        LineComment,
        BlockComment,
    }

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = State::Normal;
    let mut chars = schema.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                ';' => {
                    push_statement(&mut statements, &current);
                    current.clear();
                    continue;
                }
                '\'' | '"' | '`' => state = State::Quoted(c),
                '-' if chars.peek() == Some(&'-') => state = State::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    current.push(c);
                    if let Some(star) = chars.next() {
                        current.push(star);
                    }
                    state = State::BlockComment;
                    continue;
                }
                _ => {}
            },
            State::Quoted(quote) if c == quote => state = State::Normal,
            State::Quoted(_) => {}
            State::LineComment if c == '\n' => state = State::Normal,
            State::LineComment => {}
            State::BlockComment if c == '*' && chars.peek() == Some(&'/') => {
                current.push(c);
                if let Some(slash) = chars.next() {
                    current.push(slash);
                }
                state = State::Normal;
                continue;
            }
            State::BlockComment => {}
        }
        current.push(c);
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && !is_only_comments(trimmed) {
        statements.push(trimmed.to_string());
    }
}

/// Whether `sql` consists solely of comments and whitespace.
fn is_only_comments(sql: &str) -> bool {
    let mut rest = sql.trim_start();
    loop {
        if rest.is_empty() {
            return true;
        }
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail).trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail).trim_start();
        } else {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        let parts = split_statements(
            "CREATE TABLE a (id INTEGER);\n\n  INSERT INTO a VALUES (1) ;;\nINSERT INTO a VALUES (2)",
        );
        assert_eq!(parts, vec![
            "CREATE TABLE a (id INTEGER)",
            "INSERT INTO a VALUES (1)",
            "INSERT INTO a VALUES (2)",
        ]);
    }

    #[test]
    fn test_semicolons_in_literals_do_not_split() {
        let parts = split_statements(
            "INSERT INTO notes (body) VALUES ('a; b');INSERT INTO \"odd;name\" VALUES ('it''s; fine')",
        );
        assert_eq!(parts, vec![
            "INSERT INTO notes (body) VALUES ('a; b')",
            "INSERT INTO \"odd;name\" VALUES ('it''s; fine')",
        ]);
    }

    #[test]
    fn test_semicolons_in_comments_do_not_split() {
        let parts = split_statements(
            "-- setup; part one\nCREATE TABLE a (id INTEGER); /* trailing; note */\nCREATE TABLE b (id INTEGER);",
        );
        assert_eq!(parts, vec![
            "-- setup; part one\nCREATE TABLE a (id INTEGER)",
            "/* trailing; note */\nCREATE TABLE b (id INTEGER)",
        ]);
    }

    #[test]
    fn test_comment_only_pieces_dropped() {
        assert!(split_statements("-- nothing here\n;  /* nor here */ ;").is_empty());
        assert!(split_statements("   ").is_empty());
    }
}
