//! Translation of the store-agnostic `?` placeholder.
//!
//! Statements built by the ORM and by callers use a bare `?` for every
//! positional argument. Before execution each `?` in statement code is
//! rewritten to SQLite's numbered marker `?1`, `?2`, ... so the binding order
//! is explicit and the count can be checked up front. Quoted strings, quoted
//! identifiers and comments are copied through untouched.

use crate::error::DbError;

/// A statement rewritten for the driver, plus its placeholder count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated {
    /// Statement text with native markers.
    pub sql: String,
    /// Number of placeholders found.
    pub placeholders: usize,
}

#[derive(Clone, Copy)]
enum Scan {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Rewrites every `?` token in `sql` into a numbered marker.
///
/// Question marks inside `'...'`, `"..."`, `` `...` ``, `-- ...` and
/// `/* ... */` are left alone. Doubled quote characters inside a literal
/// close and reopen the literal, which leaves the scanner in the right state.
///
/// # Errors
///
/// Returns `DbError::NumberedPlaceholder` when the statement already holds a
/// numbered marker such as `?1`; mixing the two styles would bind arguments
/// in an order the caller did not write.
pub fn translate(sql: &str) -> Result<Translated, DbError> {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut state = Scan::Code;
    let mut placeholders = 0;
    let mut chars = sql.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        out.push(ch);
        match state {
            Scan::Quoted(open) => {
                if ch == open {
                    state = Scan::Code;
                }
            }
            Scan::LineComment => {
                if ch == '\n' {
                    state = Scan::Code;
                }
            }
            Scan::BlockComment => {
                if ch == '*' && chars.next_if(|&(_, c)| c == '/').is_some() {
                    out.push('/');
                    state = Scan::Code;
                }
            }
            Scan::Code => match ch {
                '\'' | '"' | '`' => state = Scan::Quoted(ch),
                '-' if chars.next_if(|&(_, c)| c == '-').is_some() => {
                    out.push('-');
                    state = Scan::LineComment;
                }
                '/' if chars.next_if(|&(_, c)| c == '*').is_some() => {
                    out.push('*');
                    state = Scan::BlockComment;
                }
                '?' => {
                    if chars.peek().is_some_and(|&(_, c)| c.is_ascii_digit()) {
                        return Err(DbError::NumberedPlaceholder { offset });
                    }
                    placeholders += 1;
                    out.push_str(&placeholders.to_string());
                }
                _ => {}
            },
        }
    }

    Ok(Translated {
        sql: out,
        placeholders,
    })
}
