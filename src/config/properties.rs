//! Property file parser
//!
//! Reads the line oriented `key=value` format used by Java property files:
//! `#` and `!` comments, `=`, `:` or whitespace between key and value,
//! backslash line continuation and backslash escapes including `\uXXXX`.

use std::borrow::Cow;
use std::collections::BTreeMap;

use thiserror::Error;

/// Error raised for malformed property file content
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct PropertiesError {
    pub line: usize,
    pub message: String,
}

fn is_blank_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Decode property file bytes
///
/// UTF-8 is tried first; anything else is read as ISO-8859-1.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// Parse property file text into a map; later duplicates win
pub fn parse_properties(input: &str) -> Result<BTreeMap<String, String>, PropertiesError> {
    let normalized = input.replace("\r\n", "\n");
    let mut lines = normalized.split(['\n', '\r']).enumerate();
    let mut properties = BTreeMap::new();

    while let Some((index, natural)) = lines.next() {
        let line = natural.trim_start_matches(is_blank_char);
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = line.to_string();
        while continues(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank_char)),
                None => break,
            }
        }

        let (key, value) = split_key_value(&logical);
        let line_number = index + 1;
        let key = unescape(key).map_err(|message| PropertiesError { line: line_number, message })?;
        let value = unescape(value).map_err(|message| PropertiesError { line: line_number, message })?;
        properties.insert(key, value);
    }

    Ok(properties)
}

/// An odd number of trailing backslashes continues the line
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if is_blank_char(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let rest = line[key_end..].trim_start_matches(is_blank_char);
    let rest = rest.strip_prefix(|c: char| c == '=' || c == ':').unwrap_or(rest);
    (&line[..key_end], rest.trim_start_matches(is_blank_char))
}

fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let unit = read_code_unit(&mut chars)?;
                if (0xD800..0xDC00).contains(&unit) {
                    // high surrogate, the low half must follow as another escape
                    let low = match (chars.next(), chars.next()) {
                        (Some('\\'), Some('u')) => read_code_unit(&mut chars)?,
                        _ => return Err(format!("unpaired surrogate \\u{:04X}", unit)),
                    };
                    let decoded = char::decode_utf16([unit, low])
                        .next()
                        .and_then(|r| r.ok())
                        .ok_or_else(|| format!("invalid surrogate pair \\u{:04X}\\u{:04X}", unit, low))?;
                    out.push(decoded);
                } else {
                    let decoded = char::from_u32(u32::from(unit))
                        .ok_or_else(|| format!("unpaired surrogate \\u{:04X}", unit))?;
                    out.push(decoded);
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn read_code_unit(chars: &mut std::str::Chars<'_>) -> Result<u16, String> {
    let hex: String = chars.take(4).collect();
    if hex.chars().count() != 4 {
        return Err(format!("malformed \\uxxxx encoding \"\\u{}\"", hex));
    }
    u16::from_str_radix(&hex, 16).map_err(|_| format!("malformed \\uxxxx encoding \"\\u{}\"", hex))
}
