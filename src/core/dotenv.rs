//! Conversion between JSON objects and `.env` text.
//!
//! The store holds dotenv-formatted secrets as flat JSON objects; local
//! files hold them as `.env` text. Output is deterministic: keys sorted,
//! every value double-quoted and escaped.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{DotenvError, Result};

/// Render a JSON object as `.env` text.
///
/// String values pass through verbatim; any other value is rendered as its
/// JSON text.
///
/// # Errors
///
/// Returns `DotenvError::InvalidJson` if `json` does not parse and
/// `DotenvError::NotAnObject` if it is not a JSON object.
pub fn json_to_dotenv(json: &[u8]) -> Result<Vec<u8>> {
    let value: Value = serde_json::from_slice(json).map_err(|_| DotenvError::InvalidJson)?;
    let Value::Object(object) = value else {
        return Err(DotenvError::NotAnObject.into());
    };

    let mut pairs = BTreeMap::new();
    for (key, value) in object {
        let rendered = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        pairs.insert(key, rendered);
    }

    let mut output = String::new();
    for (key, value) in &pairs {
        output.push_str(key);
        output.push_str("=\"");
        output.push_str(&escape_value(value));
        output.push_str("\"\n");
    }

    Ok(output.into_bytes())
}

/// Parse `.env` text into a flat JSON object of strings.
///
/// Later assignments to the same key win.
///
/// # Errors
///
/// Returns `DotenvError::Parse` naming the 1-based line for a missing `=`,
/// an invalid key, or an unterminated quote.
pub fn dotenv_to_json(dotenv: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(dotenv).map_err(|_| DotenvError::InvalidUtf8)?;
    let pairs = parse(text)?;
    Ok(serde_json::to_vec(&pairs)?)
}

fn parse(text: &str) -> Result<BTreeMap<String, String>> {
    let mut pairs = BTreeMap::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line
            .strip_prefix("export ")
            .map(str::trim_start)
            .unwrap_or(line);

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| parse_error(line_no, "missing '='"))?;

        let key = key.trim();
        if !is_valid_key(key) {
            // The text is file content and may be a secret, so it stays out of the error.
            return Err(parse_error(line_no, "invalid key").into());
        }

        let value = parse_value(value.trim(), line_no)?;
        pairs.insert(key.to_string(), value);
    }

    Ok(pairs)
}

fn parse_value(raw: &str, line_no: usize) -> std::result::Result<String, DotenvError> {
    if let Some(rest) = raw.strip_prefix('\'') {
        let end = rest
            .find('\'')
            .ok_or_else(|| parse_error(line_no, "unterminated single quote"))?;
        check_trailing(&rest[end + 1..], line_no)?;
        return Ok(rest[..end].to_string());
    }

    if let Some(rest) = raw.strip_prefix('"') {
        return parse_double_quoted(rest, line_no);
    }

    Ok(raw.to_string())
}

fn parse_double_quoted(rest: &str, line_no: usize) -> std::result::Result<String, DotenvError> {
    let mut out = String::with_capacity(rest.len());
    let mut chars = rest.char_indices();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' => {
                check_trailing(&rest[i + 1..], line_no)?;
                return Ok(out);
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, 't')) => out.push('\t'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, '"')) => out.push('"'),
                Some((_, other)) => {
                    out.push('\\');
                    out.push(other);
                }
                None => break,
            },
            _ => out.push(ch),
        }
    }

    Err(parse_error(line_no, "unterminated double quote"))
}

// Only whitespace or a comment may follow a closing quote.
fn check_trailing(rest: &str, line_no: usize) -> std::result::Result<(), DotenvError> {
    let rest = rest.trim_start();
    if rest.is_empty() || rest.starts_with('#') {
        Ok(())
    } else {
        Err(parse_error(line_no, "unexpected characters after closing quote"))
    }
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(ch),
        }
    }

    escaped
}

fn parse_error(line: usize, reason: &str) -> DotenvError {
    DotenvError::Parse {
        line,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use proptest::prelude::*;

    fn to_env(json: &str) -> String {
        String::from_utf8(json_to_dotenv(json.as_bytes()).unwrap()).unwrap()
    }

    fn to_map(env: &str) -> BTreeMap<String, String> {
        serde_json::from_slice(&dotenv_to_json(env.as_bytes()).unwrap()).unwrap()
    }

    fn parse_err(env: &str) -> DotenvError {
        match dotenv_to_json(env.as_bytes()).unwrap_err() {
            Error::Dotenv(e) => e,
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_json_to_dotenv_sorts_and_quotes() {
        let env = to_env(r#"{"B":"x","A":"1"}"#);
        assert_eq!(env, "A=\"1\"\nB=\"x\"\n");
    }

    #[test]
    fn test_json_to_dotenv_renders_non_strings_as_json() {
        let env = to_env(r#"{"N":42,"T":true,"O":{"k":[1,null]},"Z":null}"#);
        assert_eq!(
            env,
            "N=\"42\"\nO=\"{\\\"k\\\":[1,null]}\"\nT=\"true\"\nZ=\"null\"\n"
        );
    }

    #[test]
    fn test_json_to_dotenv_escapes_special_chars() {
        let env = to_env(r#"{"K":"a\\b\"c\nd\re\tf"}"#);
        assert_eq!(env, "K=\"a\\\\b\\\"c\\nd\\re\\tf\"\n");
    }

    #[test]
    fn test_json_to_dotenv_rejects_non_objects() {
        let err = json_to_dotenv(b"[1,2]").unwrap_err();
        assert_eq!(err.to_string(), "expected JSON object");
        assert!(json_to_dotenv(b"not json").is_err());
    }

    #[test]
    fn test_dotenv_to_json_basic() {
        let map = to_map("A=1\nB=\"x\"\n");
        assert_eq!(map.get("A").map(String::as_str), Some("1"));
        assert_eq!(map.get("B").map(String::as_str), Some("x"));
        assert_eq!(
            dotenv_to_json(b"A=1\nB=\"x\"\n").unwrap(),
            br#"{"A":"1","B":"x"}"#.to_vec()
        );
    }

    #[test]
    fn test_dotenv_skips_comments_blanks_and_export() {
        let map = to_map("# comment\n\n  export TOKEN = abc  \n_PRIVATE=1\n");
        assert_eq!(map.len(), 2);
        assert_eq!(map["TOKEN"], "abc");
        assert_eq!(map["_PRIVATE"], "1");
    }

    #[test]
    fn test_single_quotes_are_literal() {
        let map = to_map(r#"RAW='a\nb "c"'"#);
        assert_eq!(map["RAW"], r#"a\nb "c""#);
    }

    #[test]
    fn test_double_quote_escapes() {
        let map = to_map(r#"V="l1\nl2\t\"q\"\\ \x""#);
        assert_eq!(map["V"], "l1\nl2\t\"q\"\\ \\x");
    }

    #[test]
    fn test_empty_values() {
        let map = to_map("A=\nB=\"\"\nC=''\n");
        assert_eq!(map["A"], "");
        assert_eq!(map["B"], "");
        assert_eq!(map["C"], "");
    }

    #[test]
    fn test_missing_equals_names_line() {
        assert_eq!(
            parse_err("A=1\n\nJUSTAKEY\n"),
            DotenvError::Parse {
                line: 3,
                reason: "missing '='".to_string()
            }
        );
    }

    #[test]
    fn test_unterminated_quotes() {
        assert!(matches!(
            parse_err("A=\"open\n"),
            DotenvError::Parse { line: 1, .. }
        ));
        assert!(matches!(
            parse_err("A=1\nB='open\n"),
            DotenvError::Parse { line: 2, .. }
        ));
        assert!(matches!(
            parse_err("A=\"trailing backslash\\"),
            DotenvError::Parse { line: 1, .. }
        ));
    }

    #[test]
    fn test_invalid_keys() {
        assert!(matches!(parse_err("1ABC=x"), DotenvError::Parse { .. }));
        assert!(matches!(parse_err("A-B=x"), DotenvError::Parse { .. }));
        assert!(matches!(parse_err("=x"), DotenvError::Parse { .. }));
    }

    #[test]
    fn test_invalid_key_error_omits_line_content() {
        let err = parse_err("CERT=-----BEGIN KEY-----\nMIIB/superSECRETkeyMaterial+AB==\n");
        assert_eq!(
            err,
            DotenvError::Parse {
                line: 2,
                reason: "invalid key".to_string()
            }
        );
        assert!(!err.to_string().contains("superSECRET"));
    }

    #[test]
    fn test_trailing_content_after_quote() {
        assert_eq!(to_map("A=\"x\"  # note\n")["A"], "x");
        assert!(matches!(parse_err("A=\"x\"y"), DotenvError::Parse { .. }));
    }

    proptest! {
        #[test]
        fn prop_round_trip(map in prop::collection::btree_map("[A-Za-z_][A-Za-z0-9_]{0,12}", any::<String>(), 0..8)) {
            let json = serde_json::to_vec(&map).unwrap();
            let env = json_to_dotenv(&json).unwrap();
            let back = dotenv_to_json(&env).unwrap();
            prop_assert_eq!(back, json);
        }
    }
}
