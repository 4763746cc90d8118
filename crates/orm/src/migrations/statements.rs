//! Statement boundaries inside a migration file
//!
//! Migrations are sent to the server as a single script. The boundaries
//! found here are only used to point at the failing statement in an error
//! and to describe files offline. The scanner knows about PostgreSQL
//! quoting: string literals, quoted identifiers, dollar-quoted bodies and
//! both comment styles, so a `;` inside any of them does not end a statement.

use std::ops::Range;

/// Byte ranges of the statements in `sql`, each including its terminating
/// `;` when there is one. Segments holding only whitespace or comments are
/// left out.
pub fn statement_spans(sql: &str) -> Vec<Range<usize>> {
    let bytes = sql.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut has_code = false;
    let mut i = 0;

    while i < bytes.len() {
        let next = match bytes[i] {
            b'\'' => skip_quoted(bytes, i, b'\''),
            b'"' => skip_quoted(bytes, i, b'"'),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = skip_line_comment(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i);
                continue;
            }
            b'$' => match dollar_tag(bytes, i) {
                Some(tag_end) => skip_dollar_quoted(sql, i, tag_end),
                None => i + 1,
            },
            b';' => {
                if has_code {
                    spans.push(trim_span(sql, start..i + 1));
                }
                start = i + 1;
                has_code = false;
                i += 1;
                continue;
            }
            _ => i + 1,
        };

        if !bytes[i].is_ascii_whitespace() {
            has_code = true;
        }
        i = next;
    }

    if has_code {
        spans.push(trim_span(sql, start..bytes.len()));
    }
    spans
}

/// The statement holding the 1-based character `position` reported by the
/// server, as `(1-based statement index, statement text)`
pub fn locate_statement(sql: &str, position: usize) -> Option<(usize, String)> {
    let offset = sql.char_indices().nth(position.checked_sub(1)?).map(|(byte, _)| byte)?;

    statement_spans(sql)
        .into_iter()
        .enumerate()
        .find(|(_, span)| offset < span.end)
        .map(|(index, span)| (index + 1, sql[span].to_string()))
}

/// Tables created by `CREATE TABLE` statements in `sql`, lowercased and
/// without schema qualification
pub fn created_tables(sql: &str) -> Vec<String> {
    statement_spans(sql)
        .into_iter()
        .filter_map(|span| created_table(&sql[span]))
        .collect()
}

fn created_table(statement: &str) -> Option<String> {
    let code: String = statement
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join(" ");
    let mut words = code.split_whitespace();

    if !words.next()?.eq_ignore_ascii_case("create") {
        return None;
    }
    let mut word = words.next()?;
    for modifier in ["temp", "temporary", "unlogged"] {
        if word.eq_ignore_ascii_case(modifier) {
            word = words.next()?;
        }
    }
    if !word.eq_ignore_ascii_case("table") {
        return None;
    }

    let mut name = words.next()?;
    if name.eq_ignore_ascii_case("if") {
        words.next()?; // NOT
        words.next()?; // EXISTS
        name = words.next()?;
    }

    let name = name.split('(').next()?;
    let name = name.rsplit('.').next()?.trim_matches('"');
    (!name.is_empty()).then(|| name.to_lowercase())
}

fn trim_span(sql: &str, span: Range<usize>) -> Range<usize> {
    let text = &sql[span.clone()];
    let start = span.start + (text.len() - text.trim_start().len());
    let end = span.end - (text.len() - text.trim_end().len());
    start..end
}

/// Index just past a literal opened at `start` with `quote`; doubled
/// quotes are escapes
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |offset| start + offset + 1)
}

/// Block comments nest in PostgreSQL
fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0;
    let mut i = start;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

/// If a dollar-quote tag (`$$` or `$name$`) opens at `start`, the index of
/// its closing `$`
fn dollar_tag(bytes: &[u8], start: usize) -> Option<usize> {
    // `$` inside an identifier such as `a$b` is not a quote
    if start > 0 && is_ident_byte(bytes[start - 1]) {
        return None;
    }

    let mut i = start + 1;
    match bytes.get(i) {
        Some(b'$') => return Some(i),
        Some(&b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return None,
    }
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    (bytes.get(i) == Some(&b'$')).then_some(i)
}

fn skip_dollar_quoted(sql: &str, start: usize, tag_end: usize) -> usize {
    let tag = &sql[start..=tag_end];
    sql[tag_end + 1..]
        .find(tag)
        .map_or(sql.len(), |offset| tag_end + 1 + offset + tag.len())
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
