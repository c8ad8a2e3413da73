//! Text serialization for labels
//!
//! # Format
//!
//! ```text
//! Object = IsisCube
//!   Group = Mapping
//!     ProjectionName     = Sinusoidal
//!     MinimumLatitude    = -10.0 <degrees>
//!     FilterName         = (RED, BLU, "NA")
//!   End_Group
//! End_Object
//! End
//! ```
//!
//! Lists may span several lines. `/* ... */` comments and blank lines are
//! ignored. Text containing blanks, commas or parentheses is quoted on output.

use super::{Group, GroupKind, Keyword, Label, Value};
use crate::error::{Error, Result};
use std::io::{Read, Write};
use std::path::Path;

/// Maximum input size in bytes.
const MAX_INPUT_SIZE: usize = 64_000_000;

/// Maximum group nesting depth.
const MAX_DEPTH: usize = 64;

const INDENT: &str = "  ";

impl Label {
    /// Parse a label from text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] with the offending line number for
    /// unbalanced blocks, missing `=` or unterminated lists.
    pub fn read_from_str(text: &str) -> Result<Self> {
        if text.len() > MAX_INPUT_SIZE {
            return Err(Error::Parse {
                line: 0,
                message: format!("input exceeds {MAX_INPUT_SIZE} bytes"),
            });
        }
        let mut stack: Vec<Group> = vec![Group::new("Root")];
        let mut lines = text.lines().enumerate();

        while let Some((idx, raw)) = lines.next() {
            let line_no = idx + 1;
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("End") {
                break;
            }

            let (key, rest) = match line.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (line, None),
            };

            if key.eq_ignore_ascii_case("End_Group") || key.eq_ignore_ascii_case("End_Object") {
                if stack.len() < 2 {
                    return Err(parse_err(line_no, format!("unexpected {key}")));
                }
                let finished = stack.pop().ok_or_else(|| parse_err(line_no, "empty stack"))?;
                if let Some(parent) = stack.last_mut() {
                    parent.add_group(finished);
                }
                continue;
            }

            let Some(rest) = rest else {
                return Err(parse_err(line_no, format!("expected '=' after [{key}]")));
            };

            if key.eq_ignore_ascii_case("Group") || key.eq_ignore_ascii_case("Object") {
                if stack.len() > MAX_DEPTH {
                    return Err(parse_err(line_no, "groups nested too deeply"));
                }
                let name = unquote(rest).to_string();
                let group = if key.eq_ignore_ascii_case("Object") {
                    Group::object(name)
                } else {
                    Group::new(name)
                };
                stack.push(group);
                continue;
            }

            let mut value_text = rest.to_string();
            while paren_depth(&value_text) > 0 {
                match lines.next() {
                    Some((_, more)) => {
                        value_text.push(' ');
                        value_text.push_str(strip_comment(more).trim());
                    }
                    None => {
                        return Err(parse_err(
                            line_no,
                            format!("unterminated list for keyword [{key}]"),
                        ));
                    }
                }
            }

            let (values, unit) = parse_values(&value_text);
            let mut keyword = Keyword::with_values(key, values);
            if let Some(unit) = unit {
                keyword = keyword.with_unit(unit);
            }
            if let Some(current) = stack.last_mut() {
                current.keywords.push(keyword);
            }
        }

        if stack.len() != 1 {
            return Err(parse_err(
                text.lines().count(),
                format!("unterminated block [{}]", stack.last().map(Group::name).unwrap_or("")),
            ));
        }
        let root = stack.pop().unwrap_or_default();
        Ok(Label { root })
    }

    /// Read a label from a reader.
    pub fn read_from_reader(reader: &mut impl Read) -> Result<Self> {
        let mut text = String::new();
        reader
            .take(MAX_INPUT_SIZE as u64 + 1)
            .read_to_string(&mut text)?;
        Self::read_from_str(&text)
    }

    /// Read a label from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = std::fs::File::open(path)?;
        Self::read_from_reader(&mut file)
    }

    /// Render the label as text.
    pub fn write_to_string(&self) -> String {
        let mut out = String::new();
        for kw in &self.root.keywords {
            write_keyword(&mut out, kw, 0);
        }
        for g in &self.root.groups {
            write_group(&mut out, g, 0);
        }
        out.push_str("End\n");
        out
    }

    /// Write the label to a writer.
    pub fn write_to_writer(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(self.write_to_string().as_bytes())?;
        Ok(())
    }

    /// Write the label to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        self.write_to_writer(&mut file)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.write_to_string())
    }
}

// ============================================================================
// Parsing helpers
// ============================================================================

fn parse_err(line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        line,
        message: message.into(),
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("/*") {
        Some(pos) if !inside_quotes(line, pos) => &line[..pos],
        _ => line,
    }
}

fn inside_quotes(text: &str, pos: usize) -> bool {
    text[..pos].chars().filter(|&c| c == '"').count() % 2 == 1
}

fn paren_depth(text: &str) -> i32 {
    let mut depth = 0;
    let mut quoted = false;
    for c in text.chars() {
        match c {
            '"' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth -= 1,
            _ => {}
        }
    }
    depth
}

fn unquote(text: &str) -> &str {
    let t = text.trim();
    if t.len() >= 2 && t.starts_with('"') && t.ends_with('"') {
        &t[1..t.len() - 1]
    } else {
        t
    }
}

/// Split a trailing `<unit>` off a value.
fn split_unit(text: &str) -> (&str, Option<String>) {
    let t = text.trim();
    if t.ends_with('>') && !t.starts_with('"') {
        if let Some(open) = t.rfind('<') {
            let unit = t[open + 1..t.len() - 1].trim().to_string();
            return (t[..open].trim(), Some(unit));
        }
    }
    (t, None)
}

fn parse_scalar(text: &str) -> Value {
    let t = text.trim();
    if t.starts_with('"') {
        return Value::Text(unquote(t).to_string());
    }
    if let Ok(i) = t.parse::<i64>() {
        return Value::Integer(i);
    }
    let numeric_start = t
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    if numeric_start {
        if let Ok(d) = t.parse::<f64>() {
            return Value::Double(d);
        }
    }
    Value::Text(t.to_string())
}

fn split_list(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                parts.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[start..]);
    parts
}

fn parse_values(text: &str) -> (Vec<Value>, Option<String>) {
    let t = text.trim();
    if let Some(body) = t.strip_prefix('(') {
        let (list, unit) = match body.rfind(')') {
            Some(close) => {
                let (_, trailing) = split_unit(&body[close + 1..]);
                (&body[..close], trailing)
            }
            None => (body, None),
        };
        let mut unit = unit;
        let mut values = Vec::new();
        if !list.trim().is_empty() {
            for item in split_list(list) {
                let (v, u) = split_unit(item);
                if unit.is_none() {
                    unit = u;
                }
                values.push(parse_scalar(v));
            }
        }
        return (values, unit);
    }
    let (v, unit) = split_unit(t);
    (vec![parse_scalar(v)], unit)
}

// ============================================================================
// Writing helpers
// ============================================================================

fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | '(' | ')' | '=' | '<' | '>'))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Text(s) if needs_quotes(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

fn write_keyword(out: &mut String, kw: &Keyword, depth: usize) {
    out.push_str(&INDENT.repeat(depth));
    out.push_str(kw.name());
    out.push_str(" = ");
    if kw.len() == 1 {
        out.push_str(&format_value(&kw.values()[0]));
    } else {
        let items: Vec<String> = kw.values().iter().map(format_value).collect();
        out.push('(');
        out.push_str(&items.join(", "));
        out.push(')');
    }
    if let Some(unit) = kw.unit() {
        out.push_str(" <");
        out.push_str(unit);
        out.push('>');
    }
    out.push('\n');
}

fn write_group(out: &mut String, group: &Group, depth: usize) {
    let (open, close) = match group.kind() {
        GroupKind::Group => ("Group", "End_Group"),
        GroupKind::Object => ("Object", "End_Object"),
    };
    let pad = INDENT.repeat(depth);
    out.push_str(&format!("{pad}{open} = {}\n", group.name()));
    for kw in group.keywords() {
        write_keyword(out, kw, depth + 1);
    }
    for g in group.groups() {
        write_group(out, g, depth + 1);
    }
    out.push_str(&format!("{pad}{close}\n"));
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Object = IsisCube
  Group = Mapping
    ProjectionName = Sinusoidal
    CenterLongitude = 10.5 <degrees>
    /* comment line */
    Radii = (3396190.0,
             3376200.0) <meters>
  End_Group
  Group = BandBin
    FilterName = (RED, \"NA\", \"two words\")
    Count = 3
  End_Group
End_Object
End
";

    // ========================================================================
    // Parsing
    // ========================================================================

    #[test]
    fn test_parse_sample() {
        let label = Label::read_from_str(SAMPLE).unwrap();
        let cube = label.root().group("IsisCube").unwrap();
        assert_eq!(cube.kind(), GroupKind::Object);
        let mapping = label.group("Mapping").unwrap();
        assert_eq!(mapping.text("ProjectionName").unwrap(), "Sinusoidal");
        let clon = mapping.keyword("CenterLongitude").unwrap();
        assert_eq!(clon.as_f64().unwrap(), 10.5);
        assert_eq!(clon.unit(), Some("degrees"));
        let radii = mapping.keyword("Radii").unwrap();
        assert_eq!(radii.len(), 2);
        assert_eq!(radii.f64_at(1).unwrap(), 3376200.0);
        assert_eq!(radii.unit(), Some("meters"));

        let bandbin = label.group("BandBin").unwrap();
        let filters = bandbin.keyword("FilterName").unwrap();
        assert_eq!(filters.text_at(0), "RED");
        assert_eq!(filters.text_at(1), "NA");
        assert_eq!(filters.text_at(2), "two words");
        assert_eq!(bandbin.i64("Count").unwrap(), 3);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Label::read_from_str("Group = A\nX = 1\n"),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            Label::read_from_str("End_Group\n"),
            Err(Error::Parse { line: 1, .. })
        ));
        assert!(matches!(
            Label::read_from_str("Group = A\nJunk\nEnd_Group\n"),
            Err(Error::Parse { line: 2, .. })
        ));
        assert!(Label::read_from_str("X = (1, 2\n").is_err());
    }

    // ========================================================================
    // Writing
    // ========================================================================

    #[test]
    fn test_write_then_read_preserves_tree() {
        let label = Label::read_from_str(SAMPLE).unwrap();
        let text = label.write_to_string();
        assert!(text.contains("CenterLongitude = 10.5 <degrees>"));
        assert!(text.contains("\"two words\""));
        let again = Label::read_from_str(&text).unwrap();
        assert_eq!(label, again);
    }
}
