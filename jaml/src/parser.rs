//! Line classification and the constructor-call grammar.
//!
//! Both are hand-rolled over char cursors: the structural line grammar
//! is small and fixed, and argument splitting needs the quote- and
//! nesting-awareness a generic tokenizer would not buy us.

use crate::error::{JamlError, JamlErrorKind};

/// One input line: raw text plus its 1-based position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'input> {
    pub raw: &'input str,
    pub number: u32,
}

/// A structural line, decomposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StructuralMatch<'input> {
    /// Count of leading whitespace *characters*; tabs and spaces both
    /// count 1.
    pub indent: usize,
    pub key: &'input str,
    /// Comment-stripped and trimmed; a quoted value keeps its quotes
    /// (coercion strips them).
    pub value: &'input str,
}

#[derive(Debug)]
pub(crate) enum Classified<'input> {
    Ignorable,
    Structural(StructuralMatch<'input>),
}

/// Classify one line as ignorable (blank or comment-only) or structural
/// (`<indent><key><sep:[:-]><value>`).
///
/// The separator is the last `:` or `-` inside the maximal
/// non-whitespace run following the indent, matching what a greedy
/// `(\S*)([:-])` match would pick, so `my-key: v` keys as `my-key`.
pub(crate) fn classify<'input>(line: &Line<'input>) -> Result<Classified<'input>, JamlError> {
    let raw = line.raw;

    let mut indent = 0usize;
    let mut rest_start = 0usize;
    for c in raw.chars() {
        if !c.is_whitespace() {
            break;
        }
        indent += 1;
        rest_start += c.len_utf8();
    }
    let rest = &raw[rest_start..];

    if rest.is_empty() || rest.starts_with('#') {
        return Ok(Classified::Ignorable);
    }

    let run_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let run = &rest[..run_len];
    let Some(sep) = run.rfind([':', '-']) else {
        return Err(JamlError::new(
            JamlErrorKind::Syntax {
                line_text: raw.to_string(),
            },
            line.number,
        ));
    };

    let key = &run[..sep];
    let value = strip_comment(&rest[sep + 1..]).trim();
    Ok(Classified::Structural(StructuralMatch { indent, key, value }))
}

/// Truncate at the first `#` that is not inside a double-quoted region.
fn strip_comment(text: &str) -> &str {
    let mut in_quotes = false;
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &text[..i],
            _ => {}
        }
    }
    text
}

/// A parsed constructor-call value: `Name<Generics>(args)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CtorCall<'text> {
    pub class_path: Option<&'text str>,
    pub generic_args: Vec<&'text str>,
    /// `None` when no parenthesized list is present. Both `None` and an
    /// empty list default-construct.
    pub args: Option<Vec<&'text str>>,
}

/// Parse constructor-call text: `[className]["<"generics">"]["("args")"]`.
///
/// The input is already trimmed and dequoted by coercion. `None` means
/// the text does not match the grammar.
pub(crate) fn parse_ctor_call(text: &str) -> Option<CtorCall<'_>> {
    let name_end = text.find(['<', '(']).unwrap_or(text.len());
    let name = text[..name_end].trim();
    if !name.is_empty() && !is_ident_path(name) {
        return None;
    }
    let class_path = (!name.is_empty()).then_some(name);

    let mut rest = &text[name_end..];

    let mut generic_args = Vec::new();
    if rest.starts_with('<') {
        let close = matching(rest, '<', '>')?;
        generic_args = split_args(&rest[1..close])?;
        rest = rest[close + 1..].trim_start();
    }

    let mut args = None;
    if rest.starts_with('(') {
        let close = matching(rest, '(', ')')?;
        args = Some(split_args(&rest[1..close])?);
        rest = rest[close + 1..].trim_start();
    }

    if !rest.is_empty() {
        return None;
    }
    Some(CtorCall {
        class_path,
        generic_args,
        args,
    })
}

/// `.`-separated identifier segments, alphanumeric/`_` only.
fn is_ident_path(name: &str) -> bool {
    name.split('.').all(|segment| {
        !segment.is_empty() && segment.chars().all(|c| c.is_alphanumeric() || c == '_')
    })
}

/// Byte index of the close matching the opening delimiter at index 0,
/// skipping double-quoted regions.
fn matching(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quotes = false;
    for (i, c) in text.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if in_quotes {
            continue;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Split a delimited list on top-level commas, honoring nested `()`/`<>`
/// and double quotes. Blank input yields no arguments.
fn split_args(text: &str) -> Option<Vec<&str>> {
    if text.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut args = Vec::new();
    let mut paren = 0i32;
    let mut angle = 0i32;
    let mut in_quotes = false;
    let mut start = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            '(' => paren += 1,
            ')' => paren -= 1,
            '<' => angle += 1,
            '>' => angle -= 1,
            ',' if paren == 0 && angle == 0 => {
                args.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if paren != 0 || angle != 0 || in_quotes {
        return None;
    }
    args.push(text[start..].trim());
    Some(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structural<'input>(raw: &'input str) -> StructuralMatch<'input> {
        let line = Line { raw, number: 1 };
        match classify(&line).unwrap() {
            Classified::Structural(m) => m,
            Classified::Ignorable => panic!("expected a structural line: {raw:?}"),
        }
    }

    fn ignorable(raw: &str) -> bool {
        let line = Line { raw, number: 1 };
        matches!(classify(&line).unwrap(), Classified::Ignorable)
    }

    #[test]
    fn blank_and_comment_lines_are_ignorable() {
        assert!(ignorable(""));
        assert!(ignorable("   "));
        assert!(ignorable("\t"));
        assert!(ignorable("# a comment"));
        assert!(ignorable("    # indented comment"));
    }

    #[test]
    fn key_value_line() {
        let m = structural("name: Bob");
        assert_eq!(m, StructuralMatch { indent: 0, key: "name", value: "Bob" });
    }

    #[test]
    fn indent_counts_characters_not_columns() {
        assert_eq!(structural("    x: 1").indent, 4);
        assert_eq!(structural("\tx: 1").indent, 1);
        assert_eq!(structural("\t  x: 1").indent, 3);
    }

    #[test]
    fn sequence_marker_has_empty_key() {
        let m = structural("- 1");
        assert_eq!(m.key, "");
        assert_eq!(m.value, "1");

        let bare = structural("-");
        assert_eq!(bare.key, "");
        assert_eq!(bare.value, "");
    }

    #[test]
    fn separator_is_last_in_leading_run() {
        let m = structural("my-key: v");
        assert_eq!(m.key, "my-key");
        assert_eq!(m.value, "v");
    }

    #[test]
    fn unquoted_value_truncates_at_comment() {
        let m = structural("name: Bob # the builder");
        assert_eq!(m.value, "Bob");
    }

    #[test]
    fn quoted_value_preserves_comment_and_separator_chars() {
        let m = structural("name: \"a # b: c\"");
        assert_eq!(m.value, "\"a # b: c\"");
    }

    #[test]
    fn missing_separator_is_a_syntax_error() {
        let line = Line { raw: "name Bob", number: 7 };
        let err = classify(&line).unwrap_err();
        assert_eq!(err.line, Some(7));
        assert!(matches!(err.kind, JamlErrorKind::Syntax { .. }));
    }

    #[test]
    fn ctor_call_name_only() {
        let call = parse_ctor_call("Point").unwrap();
        assert_eq!(call.class_path, Some("Point"));
        assert!(call.generic_args.is_empty());
        assert_eq!(call.args, None);
    }

    #[test]
    fn ctor_call_with_args() {
        let call = parse_ctor_call("Point(1, 2)").unwrap();
        assert_eq!(call.class_path, Some("Point"));
        assert_eq!(call.args, Some(vec!["1", "2"]));
    }

    #[test]
    fn ctor_call_generics_without_name() {
        let call = parse_ctor_call("<int>").unwrap();
        assert_eq!(call.class_path, None);
        assert_eq!(call.generic_args, vec!["int"]);
    }

    #[test]
    fn ctor_call_generics_and_args() {
        let call = parse_ctor_call("List<int>()").unwrap();
        assert_eq!(call.class_path, Some("List"));
        assert_eq!(call.generic_args, vec!["int"]);
        assert_eq!(call.args, Some(vec![]));
    }

    #[test]
    fn ctor_call_nested_args_split_at_top_level_only() {
        let call = parse_ctor_call("Segment(Point(1,2), Point(3,4))").unwrap();
        assert_eq!(call.args, Some(vec!["Point(1,2)", "Point(3,4)"]));
    }

    #[test]
    fn ctor_call_quoted_arg_keeps_commas() {
        let call = parse_ctor_call("Tag(\"a,b\", 2)").unwrap();
        assert_eq!(call.args, Some(vec!["\"a,b\"", "2"]));
    }

    #[test]
    fn ctor_call_qualified_path() {
        let call = parse_ctor_call("geo.Point(1,2)").unwrap();
        assert_eq!(call.class_path, Some("geo.Point"));
    }

    #[test]
    fn malformed_ctor_calls_are_rejected() {
        assert!(parse_ctor_call("Point(1,2").is_none());
        assert!(parse_ctor_call("Point(1))").is_none());
        assert!(parse_ctor_call("two words(1)").is_none());
        assert!(parse_ctor_call("Point(1,2) extra").is_none());
        assert!(parse_ctor_call("List<int(1)").is_none());
    }
}
