//! Decoding of multi-valued text fields.
//!
//! Storage hands execution fields over as array literals (`{Internet,"Physical Event"}`)
//! or as plain comma-delimited text (`Internet, Radio`). Both decode to a sorted set.
//! Elements may be double-quoted; inside quotes `\"` and `\\` are escapes and commas
//! are literal. Unquoted elements are trimmed and empty elements are dropped.

use std::collections::BTreeSet;

use crate::error::ReportError;

/// Decode an encoded multi-valued field into a set of values.
///
/// `field` is only used to label the error.
pub fn decode_multi_value(field: &str, raw: &str) -> Result<BTreeSet<String>, ReportError> {
    let malformed = || ReportError::MalformedField {
        field: field.to_string(),
        value: raw.to_string(),
    };

    let trimmed = raw.trim();
    let body = match (trimmed.starts_with('{'), trimmed.ends_with('}')) {
        (true, true) if trimmed.len() >= 2 => &trimmed[1..trimmed.len() - 1],
        (false, false) => trimmed,
        _ => return Err(malformed()),
    };

    let mut values = BTreeSet::new();
    let mut chars = body.chars().peekable();

    loop {
        // Skip leading whitespace of the element
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut element = String::new();
        let quoted = chars.peek() == Some(&'"');

        if quoted {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => element.push(escaped),
                        None => return Err(malformed()),
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    _ => element.push(c),
                }
            }
            if !closed {
                return Err(malformed());
            }
            // Only whitespace may follow a closing quote before the delimiter
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                if !c.is_whitespace() {
                    return Err(malformed());
                }
                chars.next();
            }
            values.insert(element);
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                if c == '"' || c == '{' || c == '}' {
                    return Err(malformed());
                }
                element.push(c);
                chars.next();
            }
            let element = element.trim();
            if !element.is_empty() && element != "NULL" {
                values.insert(element.to_string());
            }
        }

        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return Err(malformed()),
        }
    }

    Ok(values)
}

/// Decode, degrading a malformed value to the empty set.
pub fn decode_or_empty(field: &str, raw: &str) -> BTreeSet<String> {
    match decode_multi_value(field, raw) {
        Ok(values) => values,
        Err(e) => {
            log::debug!("{e}; treating as empty");
            BTreeSet::new()
        }
    }
}
