// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Text helpers shared by the manifest generators.

use crate::error::Result;
use crate::item::Props;
use serde_json::Value;

/// Joins non-empty `lines` with `glue` + newline, indenting each line by
/// `n` levels unless it already starts with whitespace.
pub fn indent<I>(n: usize, glue: &str, lines: I) -> String
where
    I: IntoIterator<Item = String>,
{
    indent_lines(n, glue, lines, false)
}

/// Like [`indent`], but a two-line block (an empty list's opening and
/// closing brackets) collapses onto one line.
pub fn indent_collapse<I>(n: usize, glue: &str, lines: I) -> String
where
    I: IntoIterator<Item = String>,
{
    indent_lines(n, glue, lines, true)
}

fn indent_lines<I>(n: usize, glue: &str, lines: I, collapse: bool) -> String
where
    I: IntoIterator<Item = String>,
{
    let lines: Vec<String> = lines.into_iter().filter(|l| !l.is_empty()).collect();
    let spaces = "  ".repeat(n);

    if collapse && lines.len() == 2 {
        return format!("{}{}", spaces, lines.concat());
    }

    lines
        .into_iter()
        .map(|line| {
            if line.starts_with(char::is_whitespace) {
                line
            } else {
                format!("{}{}", spaces, line)
            }
        })
        .collect::<Vec<_>>()
        .join(&format!("{}\n", glue))
}

/// Renders a string as a JSON literal.
pub fn quote(value: &str) -> String {
    Value::from(value).to_string()
}

/// Renders a reference to a generated entry: `f[i]` or `d[i]`.
pub fn entry_ref(is_file: bool, index: usize) -> String {
    format!("{}[{}]", if is_file { 'f' } else { 'd' }, index)
}

/// Renders props as `"key": value` lines, values pretty-printed.
pub fn pretty_props(props: &Props) -> Result<Vec<String>> {
    props
        .iter()
        .map(|(key, value)| {
            let json = serde_json::to_string_pretty(value)?;
            let mut lines = json.lines();
            let first = lines.next().unwrap_or_default();
            let mut out = format!("{}: {}", quote(key), first);
            for line in lines {
                out.push_str("\n    ");
                out.push_str(line);
            }
            Ok(out)
        })
        .collect()
}

/// Renders props as compact `"key": value` lines.
pub fn compact_props(props: &Props) -> Vec<String> {
    props
        .iter()
        .map(|(key, value)| format!("{}: {}", quote(key), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s(x: &str) -> String {
        x.to_string()
    }

    #[test]
    fn test_indent_skips_empty_and_prefixed_lines() {
        let out = indent(1, ",", vec![s("a"), s(""), s("  b"), s("c")]);
        assert_eq!(out, "  a,\n  b,\n  c");
    }

    #[test]
    fn test_indent_collapse_two_lines() {
        assert_eq!(indent_collapse(0, "", vec![s("const f = ["), s(""), s("]")]), "const f = []");
        assert_eq!(
            indent_collapse(0, "", vec![s("["), s("  x"), s("]")]),
            "[\n  x\n]"
        );
    }

    #[test]
    fn test_pretty_props_multiline() {
        let mut props = Props::new();
        props.insert("views".into(), json!(["colorpicker"]));
        props.insert("title".into(), json!("Hi"));
        let lines = pretty_props(&props).unwrap();
        assert_eq!(lines[0], "\"views\": [\n      \"colorpicker\"\n    ]");
        assert_eq!(lines[1], "\"title\": \"Hi\"");
    }

    #[test]
    fn test_pretty_props_keep_insertion_order() {
        let mut props = Props::new();
        for key in ["id", "ext", "canonical", "options"] {
            props.insert(key.into(), json!(key));
        }
        let keys: Vec<String> = pretty_props(&props)
            .unwrap()
            .into_iter()
            .map(|line| line.split(':').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(keys, ["\"id\"", "\"ext\"", "\"canonical\"", "\"options\""]);
    }

    #[test]
    fn test_compact_props() {
        let mut props = Props::new();
        props.insert("options".into(), json!({ "dynamic": true }));
        assert_eq!(compact_props(&props), vec!["\"options\": {\"dynamic\":true}"]);
    }

    #[test]
    fn test_entry_ref() {
        assert_eq!(entry_ref(true, 3), "f[3]");
        assert_eq!(entry_ref(false, 0), "d[0]");
    }
}
