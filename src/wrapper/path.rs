//! Property path syntax.
//!
//! A path is a sequence of segments separated by `.`; each segment is a
//! property name followed by zero or more keys in brackets:
//! `spouse.friends[0].addresses['home']`. Keys are list indices or map
//! keys; single or double quotes around a key are stripped. A `.` inside
//! brackets does not separate segments.

pub(crate) const NESTED_SEPARATOR: char = '.';
pub(crate) const KEY_PREFIX: char = '[';
pub(crate) const KEY_SUFFIX: char = ']';

#[cfg(feature = "smallvec")]
pub(crate) type PathKeys = smallvec::SmallVec<[String; 2]>;
#[cfg(not(feature = "smallvec"))]
pub(crate) type PathKeys = Vec<String>;

/// One parsed path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PropertyToken {
    /// Property name without keys.
    pub(crate) actual_name: String,
    /// Segment with quotes removed from keys, e.g. `map[key]`.
    pub(crate) canonical_name: String,
    pub(crate) keys: PathKeys,
}

/// Byte offset of the first segment separator outside brackets.
pub(crate) fn first_nested_separator(path: &str) -> Option<usize> {
    let mut in_key = false;
    let mut quote: Option<char> = None;
    for (i, c) in path.char_indices() {
        match c {
            '\'' | '"' if in_key => match quote {
                Some(q) if q == c => quote = None,
                None => quote = Some(c),
                _ => {}
            },
            KEY_PREFIX if quote.is_none() => in_key = true,
            KEY_SUFFIX if quote.is_none() => in_key = false,
            NESTED_SEPARATOR if !in_key => return Some(i),
            _ => {}
        }
    }
    None
}

/// Splits `path` at its first separator into head segment and remainder.
pub(crate) fn split_first(path: &str) -> (&str, Option<&str>) {
    match first_nested_separator(path) {
        Some(i) => (&path[..i], Some(&path[i + 1..])),
        None => (path, None),
    }
}

/// Parses a single segment into name and keys.
pub(crate) fn parse_token(segment: &str) -> Result<PropertyToken, String> {
    let (name, mut rest) = match segment.find(KEY_PREFIX) {
        Some(i) => (&segment[..i], &segment[i..]),
        None => (segment, ""),
    };
    if name.is_empty() {
        return Err(format!("property path segment '{}' has no property name", segment));
    }
    if let Some(bad) = name.chars().find(|c| *c == KEY_SUFFIX || *c == '\'' || *c == '"') {
        return Err(format!("unexpected '{}' in property name '{}'", bad, name));
    }

    let mut keys = PathKeys::new();
    let mut canonical = name.to_string();
    while !rest.is_empty() {
        if !rest.starts_with(KEY_PREFIX) {
            return Err(format!("unexpected text '{}' after key in '{}'", rest, segment));
        }
        let (key, consumed) = parse_key(&rest[1..])
            .ok_or_else(|| format!("unclosed key bracket in property path segment '{}'", segment))?;
        canonical.push(KEY_PREFIX);
        canonical.push_str(&key);
        canonical.push(KEY_SUFFIX);
        keys.push(key);
        rest = &rest[1 + consumed..];
    }

    Ok(PropertyToken {
        actual_name: name.to_string(),
        canonical_name: canonical,
        keys,
    })
}

// Parses the inside of one key, returning the key and the bytes consumed
// including the closing bracket.
fn parse_key(input: &str) -> Option<(String, usize)> {
    let first = input.chars().next()?;
    if first == '\'' || first == '"' {
        let body = &input[1..];
        let close = body.find(first)?;
        let after = &body[close + 1..];
        if !after.starts_with(KEY_SUFFIX) {
            return None;
        }
        Some((body[..close].to_string(), 1 + close + 1 + 1))
    } else {
        let close = input.find(KEY_SUFFIX)?;
        Some((input[..close].to_string(), close + 1))
    }
}

/// Removes all keys, leaving the plain property chain: `a[0].b['x']` becomes `a.b`.
pub(crate) fn strip_keys(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut in_key = false;
    let mut quote: Option<char> = None;
    for c in path.chars() {
        if in_key {
            match c {
                '\'' | '"' => match quote {
                    Some(q) if q == c => quote = None,
                    None => quote = Some(c),
                    _ => {}
                },
                KEY_SUFFIX if quote.is_none() => in_key = false,
                _ => {}
            }
        } else if c == KEY_PREFIX {
            in_key = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Normalizes quoting in every segment of `path`; unparsable segments are
/// kept verbatim.
pub fn canonical_property_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut remaining = Some(path);
    while let Some(current) = remaining {
        let (head, rest) = split_first(current);
        match parse_token(head) {
            Ok(token) => out.push_str(&token.canonical_name),
            Err(_) => out.push_str(head),
        }
        if rest.is_some() {
            out.push(NESTED_SEPARATOR);
        }
        remaining = rest;
    }
    out
}
