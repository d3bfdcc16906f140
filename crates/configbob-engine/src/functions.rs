//! Template function library
//!
//! Every function here is registered as a global under the name it is
//! documented with. The single-argument ones are also available as filters.

use base64::Engine as _;
use minijinja::value::ValueKind;
use minijinja::{Error, ErrorKind, Value};
use serde::Serialize;
use std::env::VarError;
use std::path::Path;

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

fn to_json_value(value: &Value) -> Result<serde_json::Value, Error> {
    serde_json::to_value(value).map_err(|e| invalid(e.to_string()))
}

/// Byte range substring
///
/// Usage: {{ substr(name, "0:8") }}, either bound may be omitted: "2:", ":4"
pub fn substr(value: String, range: String) -> Result<String, Error> {
    let Some((start, end)) = range.split_once(':') else {
        return Err(invalid(format!("can not parse {:?}", range)));
    };
    if end.contains(':') {
        return Err(invalid(format!("can not parse {:?}", range)));
    }

    let parse_bound = |bound: &str, default: usize, which: &str| -> Result<usize, Error> {
        if bound.is_empty() {
            return Ok(default);
        }
        let n: i64 = bound
            .parse()
            .map_err(|_| invalid(format!("could not parse range {} in {:?}", which, range)))?;
        usize::try_from(n).map_err(|_| invalid("range value must be non negative"))
    };

    let start = parse_bound(start, 0, "start")?;
    let end = parse_bound(end, value.len(), "end")?;

    if end > value.len() {
        return Err(invalid(format!(
            "end out of range {:?} length is {}",
            range,
            value.len()
        )));
    }
    if start > end {
        return Err(invalid(format!("start after end in {:?}", range)));
    }

    value
        .get(start..end)
        .map(String::from)
        .ok_or_else(|| invalid(format!("range {:?} splits a multi-byte character", range)))
}

/// Read an environment variable, failing when unset, empty or not Unicode
///
/// Usage: {{ env("HOME") }}
pub fn env_var(name: String) -> Result<String, Error> {
    match std::env::var(&name) {
        Ok(value) if !value.is_empty() => Ok(value),
        Ok(_) | Err(VarError::NotPresent) => Err(invalid(format!("env variable {:?} was empty", name))),
        Err(VarError::NotUnicode(_)) => Err(invalid(format!(
            "env variable {:?} is not valid unicode",
            name
        ))),
    }
}

/// Prefix every line of `text`
///
/// Usage: {{ indent(cert, "    ") }}
pub fn indent(text: String, prefix: String) -> String {
    text.split('\n')
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize a value as YAML without surrounding newlines
///
/// Usage: {{ yaml(config) }} or {{ config | yaml }}
pub fn yaml(value: Value) -> Result<String, Error> {
    let json_value = to_json_value(&value)?;
    let yaml = serde_yaml::to_string(&json_value).map_err(|e| invalid(e.to_string()))?;

    Ok(yaml.trim_start_matches("---\n").trim_matches('\n').to_string())
}

/// Serialize a value as compact JSON
///
/// Usage: {{ json(config) }} or {{ config | json }}
pub fn json(value: Value) -> Result<String, Error> {
    let json_value = to_json_value(&value)?;
    serde_json::to_string(&json_value).map_err(|e| invalid(e.to_string()))
}

/// Serialize a value as indented JSON
///
/// Every line after the first starts with `prefix`, each nesting level adds `indent`.
///
/// Usage: {{ jsonindent(config, "", "  ") }}
pub fn jsonindent(value: Value, prefix: String, indent: String) -> Result<String, Error> {
    let json_value = to_json_value(&value)?;

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    json_value
        .serialize(&mut serializer)
        .map_err(|e| invalid(e.to_string()))?;

    let pretty = String::from_utf8(buf).map_err(|e| invalid(e.to_string()))?;
    if prefix.is_empty() {
        Ok(pretty)
    } else {
        Ok(pretty.replace('\n', &format!("\n{}", prefix)))
    }
}

/// Escape text for use inside a JavaScript string literal
///
/// Usage: var name = "{{ jsescape(name) }}";
pub fn jsescape(value: String) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '<' => escaped.push_str("\\u003C"),
            '>' => escaped.push_str("\\u003E"),
            '&' => escaped.push_str("\\u0026"),
            '=' => escaped.push_str("\\u003D"),
            c if (c as u32) < 0x20 => escaped.push_str(&format!("\\u{:04X}", c as u32)),
            c if !c.is_ascii() && !is_printable(c) => escaped.push_str(&format!("\\u{:04X}", c as u32)),
            c => escaped.push(c),
        }
    }

    escaped
}

/// Whether a non-ASCII character is printable
///
/// Control, format, private use and separator characters are not. Unassigned
/// code points are not detected.
fn is_printable(c: char) -> bool {
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c as u32,
        0x00AD
            | 0x0600..=0x0605
            | 0x061C
            | 0x06DD
            | 0x070F
            | 0x0890..=0x0891
            | 0x08E2
            | 0x180E
            | 0x200B..=0x200F
            | 0x202A..=0x202E
            | 0x2060..=0x2064
            | 0x2066..=0x206F
            | 0xE000..=0xF8FF
            | 0xFEFF
            | 0xFFF9..=0xFFFB
            | 0xFFFE..=0xFFFF
            | 0x110BD
            | 0x110CD
            | 0x13430..=0x1343F
            | 0x1BCA0..=0x1BCA3
            | 0x1D173..=0x1D17A
            | 0xE0001
            | 0xE0020..=0xE007F
            | 0xF0000..=0x10FFFF
    )
}

/// Replace all occurrences of `old` with `new` in `subject`
///
/// Usage: {{ replace("-", "_", name) }}
pub fn replace(old: String, new: String, subject: Value) -> Result<String, Error> {
    let subject = subject
        .as_str()
        .ok_or_else(|| invalid(format!("replace expects a string subject, not {}", subject.kind())))?;
    Ok(subject.replace(&old, &new))
}

/// Elements of a sequence value
///
/// Strings and maps are iterable in templates but are not sequences here.
fn sequence_items(value: &Value, function: &str) -> Result<Vec<Value>, Error> {
    match value.kind() {
        ValueKind::Seq | ValueKind::Iterable => Ok(value.try_iter()?.collect()),
        other => Err(invalid(format!(
            "{} only supports sequences, not {}",
            function, other
        ))),
    }
}

/// Stringify and join the elements of a sequence
///
/// Usage: {{ join(hosts, ",") }}
pub fn join(sequence: Value, separator: String) -> Result<String, Error> {
    let items = sequence_items(&sequence, "join")?;
    Ok(items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&separator))
}

/// True iff the stringified form of an element equals `value`
///
/// Usage: {% if contains(features, "tls") %}
pub fn contains(sequence: Value, value: String) -> Result<bool, Error> {
    let items = sequence_items(&sequence, "contains")?;
    Ok(items.iter().any(|item| item.to_string() == value))
}

/// Standard base64 encoding
///
/// Usage: {{ base64encode(password) }}
pub fn base64encode(value: String) -> String {
    base64::engine::general_purpose::STANDARD.encode(value.as_bytes())
}

/// Absolute, lexically cleaned path
///
/// Usage: {{ absPath("certs/ca.pem") }}
pub fn abs_path(path: String) -> Result<String, Error> {
    configbob_core::paths::absolute(Path::new(&path))
        .map(|p| p.to_string_lossy().into_owned())
        .map_err(|e| invalid(format!("could not make {:?} absolute: {}", path, e)))
}

/// Register the library on an environment
pub fn register(env: &mut minijinja::Environment<'static>) {
    env.add_function("substr", substr);
    env.add_function("env", env_var);
    env.add_function("indent", indent);
    env.add_function("yaml", yaml);
    env.add_function("json", json);
    env.add_function("jsonindent", jsonindent);
    env.add_function("jsescape", jsescape);
    env.add_function("replace", replace);
    env.add_function("join", join);
    env.add_function("contains", contains);
    env.add_function("base64encode", base64encode);
    env.add_function("absPath", abs_path);

    env.add_filter("yaml", yaml);
    env.add_filter("json", json);
    env.add_filter("jsescape", jsescape);
    env.add_filter("base64encode", base64encode);
    env.add_filter("absPath", abs_path);
}
