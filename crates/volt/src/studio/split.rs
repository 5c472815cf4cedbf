//! SQL script splitting

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
}

/// Split a script into statements on `;`
///
/// Semicolons inside quoted strings or identifiers do not split. Comments
/// (`-- ...` and `/* ... */`) are dropped. Statements are trimmed and empty
/// ones are discarded; the terminating `;` is not kept.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = State::Normal;
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                ';' => push_statement(&mut statements, &mut current),
                '\'' => {
                    state = State::SingleQuoted;
                    current.push(c);
                }
                '"' => {
                    state = State::DoubleQuoted;
                    current.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                    current.push(' ');
                }
                _ => current.push(c),
            },
            State::SingleQuoted => {
                current.push(c);
                if c == '\'' {
                    state = State::Normal;
                }
            }
            State::DoubleQuoted => {
                current.push(c);
                if c == '"' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Normal;
                    current.push('\n');
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Normal;
                }
            }
        }
    }

    push_statement(&mut statements, &mut current);
    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_split() {
        let statements = split_statements("SELECT 1; SELECT 2;\nSELECT 3");
        assert_eq!(statements, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
    }

    #[test]
    fn test_semicolon_in_string() {
        let statements =
            split_statements("INSERT INTO t VALUES ('a;b', 'it''s; fine'); SELECT * FROM t;");
        assert_eq!(
            statements,
            vec![
                "INSERT INTO t VALUES ('a;b', 'it''s; fine')",
                "SELECT * FROM t"
            ]
        );
    }

    #[test]
    fn test_quoted_identifier() {
        let statements = split_statements(r#"SELECT "a;b" FROM t"#);
        assert_eq!(statements, vec![r#"SELECT "a;b" FROM t"#]);
    }

    #[test]
    fn test_comments_dropped() {
        let script = "-- setup; ignored\nSELECT 1; /* block; comment */ SELECT 2;";
        assert_eq!(split_statements(script), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_dash_inside_string_is_not_comment() {
        let statements = split_statements("SELECT '--not a comment' FROM t");
        assert_eq!(statements, vec!["SELECT '--not a comment' FROM t"]);
    }

    #[test]
    fn test_empty_statements_discarded() {
        assert!(split_statements(" ;; \n -- only a comment\n").is_empty());
        assert!(split_statements("").is_empty());
    }
}
