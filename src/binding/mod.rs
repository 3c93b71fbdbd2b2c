//! Named-to-positional parameter binding.
//!
//! Queries arrive with `:key` placeholders; each backend wants its own
//! positional syntax. Postgres placeholders are numbered and reusable, so a
//! key referenced twice maps to one `$N` slot and one argument. MySQL
//! placeholders are positional-by-occurrence, so the same key contributes
//! one `?` and one argument per occurrence. Keys that never appear in the
//! text are ignored; extra parameters are harmless by policy.
//!
//! The scan is a lightweight state machine: placeholders inside quoted
//! strings, line or block comments, and dollar-quoted blocks are left
//! untouched, and `::type` casts are never mistaken for parameters.

use std::borrow::Cow;
use std::collections::HashMap;

mod scanner;

use scanner::{
    State, is_block_comment_end, is_block_comment_start, is_line_comment_start, matches_tag,
    scan_identifier, try_start_dollar_quote,
};

use crate::types::{DatabaseType, NamedParams, RowValues};

/// Rewrite `:key` tokens into the positional syntax `dialect` expects and
/// collect the ordered argument list.
///
/// Returns a borrowed `Cow` when nothing needed rewriting (including the
/// empty-parameter case, which returns the input unchanged).
#[must_use]
pub fn bind_named_params<'a>(
    sql: &'a str,
    params: &NamedParams,
    dialect: DatabaseType,
) -> (Cow<'a, str>, Vec<RowValues>) {
    if params.is_empty() {
        return (Cow::Borrowed(sql), Vec::new());
    }

    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    // bytes of `sql` already flushed into `out`
    let mut copied = 0usize;
    let mut args: Vec<RowValues> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => state = State::BlockComment(1),
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                b':' => {
                    let part_of_cast = (idx > 0 && bytes[idx - 1] == b':')
                        || bytes.get(idx + 1) == Some(&b':');
                    if !part_of_cast
                        && let Some((end, name)) = scan_identifier(bytes, idx + 1)
                        && let Some(value) = params.get(name)
                    {
                        let buf = out.get_or_insert_with(String::new);
                        buf.push_str(&sql[copied..idx]);
                        match dialect {
                            DatabaseType::Postgres => {
                                let slot = match slots.get(name) {
                                    Some(slot) => *slot,
                                    None => {
                                        let next = slots.len() + 1;
                                        slots.insert(name, next);
                                        args.push(value.clone());
                                        next
                                    }
                                };
                                buf.push('$');
                                buf.push_str(&slot.to_string());
                            }
                            DatabaseType::Mysql => {
                                buf.push('?');
                                args.push(value.clone());
                            }
                        }
                        copied = end;
                        idx = end;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len;
                }
            }
        }

        idx += 1;
    }

    let rewritten = match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    };
    (rewritten, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, RowValues)]) -> NamedParams {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn postgres_reuses_one_slot_per_key() {
        let p = params(&[("id", RowValues::Int(7))]);
        let (sql, args) = bind_named_params(
            "SELECT * FROM t WHERE a = :id OR b = :id",
            &p,
            DatabaseType::Postgres,
        );
        assert_eq!(sql, "SELECT * FROM t WHERE a = $1 OR b = $1");
        assert_eq!(args, vec![RowValues::Int(7)]);
    }

    #[test]
    fn mysql_duplicates_value_per_occurrence() {
        let p = params(&[("id", RowValues::Int(7))]);
        let (sql, args) = bind_named_params(
            "SELECT * FROM t WHERE a = :id OR b = :id",
            &p,
            DatabaseType::Mysql,
        );
        assert_eq!(sql, "SELECT * FROM t WHERE a = ? OR b = ?");
        assert_eq!(args, vec![RowValues::Int(7), RowValues::Int(7)]);
    }

    #[test]
    fn postgres_numbers_by_first_appearance() {
        let p = params(&[
            ("status", RowValues::Text("active".into())),
            ("id", RowValues::Int(1)),
        ]);
        let (sql, args) = bind_named_params(
            "SELECT * FROM users WHERE id = :id AND status = :status",
            &p,
            DatabaseType::Postgres,
        );
        assert_eq!(sql, "SELECT * FROM users WHERE id = $1 AND status = $2");
        assert_eq!(
            args,
            vec![RowValues::Int(1), RowValues::Text("active".into())]
        );
    }

    #[test]
    fn keys_absent_from_the_text_are_ignored() {
        let p = params(&[
            ("id", RowValues::Int(1)),
            ("unused", RowValues::Text("x".into())),
        ]);
        let (sql, args) =
            bind_named_params("SELECT * FROM t WHERE id = :id", &p, DatabaseType::Postgres);
        assert_eq!(sql, "SELECT * FROM t WHERE id = $1");
        assert_eq!(args, vec![RowValues::Int(1)]);
    }

    #[test]
    fn unknown_placeholder_is_left_verbatim() {
        let p = params(&[("id", RowValues::Int(1))]);
        let (sql, args) = bind_named_params(
            "SELECT * FROM t WHERE id = :id AND other = :other",
            &p,
            DatabaseType::Mysql,
        );
        assert_eq!(sql, "SELECT * FROM t WHERE id = ? AND other = :other");
        assert_eq!(args, vec![RowValues::Int(1)]);
    }

    #[test]
    fn empty_params_return_input_unchanged() {
        let (sql, args) = bind_named_params(
            "SELECT * FROM t WHERE id = :id",
            &NamedParams::new(),
            DatabaseType::Postgres,
        );
        assert!(matches!(sql, Cow::Borrowed(_)));
        assert_eq!(sql, "SELECT * FROM t WHERE id = :id");
        assert!(args.is_empty());
    }

    #[test]
    fn placeholders_inside_literals_and_comments_are_untouched() {
        let p = params(&[("id", RowValues::Int(1))]);
        let (sql, args) = bind_named_params(
            "SELECT ':id', \":id\" -- :id\nFROM t /* :id */ WHERE id = :id",
            &p,
            DatabaseType::Postgres,
        );
        assert_eq!(
            sql,
            "SELECT ':id', \":id\" -- :id\nFROM t /* :id */ WHERE id = $1"
        );
        assert_eq!(args, vec![RowValues::Int(1)]);
    }

    #[test]
    fn double_colon_casts_are_not_parameters() {
        let p = params(&[("text", RowValues::Text("x".into()))]);
        let (sql, args) = bind_named_params(
            "SELECT id::text FROM t WHERE name = :text",
            &p,
            DatabaseType::Postgres,
        );
        assert_eq!(sql, "SELECT id::text FROM t WHERE name = $1");
        assert_eq!(args, vec![RowValues::Text("x".into())]);
    }

    #[test]
    fn dollar_quoted_blocks_are_skipped() {
        let p = params(&[("id", RowValues::Int(1))]);
        let (sql, args) = bind_named_params(
            "$fn$ :id $fn$ WHERE id = :id",
            &p,
            DatabaseType::Postgres,
        );
        assert_eq!(sql, "$fn$ :id $fn$ WHERE id = $1");
        assert_eq!(args, vec![RowValues::Int(1)]);
    }

    #[test]
    fn word_boundary_respected() {
        let p = params(&[("id", RowValues::Int(1))]);
        // `:ids` is a different token than `:id`
        let (sql, args) = bind_named_params(
            "SELECT * FROM t WHERE a = :ids AND b = :id",
            &p,
            DatabaseType::Postgres,
        );
        assert_eq!(sql, "SELECT * FROM t WHERE a = :ids AND b = $1");
        assert_eq!(args, vec![RowValues::Int(1)]);
    }
}
