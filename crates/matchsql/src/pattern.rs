//! Regular expression text for the regex-based match strategy.
//!
//! A list target is matched by joining its elements with [`SENTINEL`] and
//! wrapping the joined string in the sentinel on both sides:
//!
//! ```text
//! ["ab", "abc"]  ->  "\0ab\0abc\0"
//! ```
//!
//! Start and end anchors are then written as the sentinel itself instead of
//! `^`/`$`, so every element boundary is a valid anchor point and
//! `\0(ab)\0` matches the element `ab` but never the prefix of `abc`. All
//! candidates go into a single alternation, which keeps the whole test a single
//! `REGEXP_CONTAINS` call however many elements there are on either side.
//!
//! An empty list encodes to `"\0\0"`, the same text as `[""]`, so a candidate
//! that matches the empty element needs a non-empty guard on the target (see
//! [`matches_empty_element`]).
//!
//! Raw `existsRegexp` patterns are rejected when they name the sentinel through
//! an escape (`\x00`, `\x{0}`, `\0`). Wildcards such as `.` and negated
//! classes such as `[^z]` still match the sentinel, so a raw pattern using them
//! can span an element boundary.

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::function::{FunctionName, MatchKind};
use crate::types::ConstValue;
use regex_lite::Regex;

/// Element-boundary sentinel. Joins list elements and anchors matches to them.
pub const SENTINEL: char = '\0';

/// The sentinel as a SQL string literal.
pub const SENTINEL_LITERAL: &str = r#""\x00""#;

/// Inline flag making the whole regex case-insensitive.
pub const CASE_INSENSITIVE_FLAG: &str = "(?i)";

/// How candidates are turned into a regex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOptions {
    pub case_insensitive: bool,
    pub anchor_start: bool,
    pub anchor_end: bool,
    /// Match candidates as literal text instead of as regex fragments
    pub escape_literally: bool,
}

impl MatchOptions {
    /// Options a function uses when it is compiled to a regex.
    pub fn for_function(function: FunctionName) -> Self {
        let case_insensitive = function.is_case_insensitive();
        match function.kind() {
            MatchKind::Equals => Self {
                case_insensitive,
                anchor_start: true,
                anchor_end: true,
                escape_literally: true,
            },
            MatchKind::Starts => Self {
                case_insensitive,
                anchor_start: true,
                anchor_end: false,
                escape_literally: true,
            },
            MatchKind::Ends => Self {
                case_insensitive,
                anchor_start: false,
                anchor_end: true,
                escape_literally: true,
            },
            MatchKind::Contains => Self {
                case_insensitive,
                anchor_start: false,
                anchor_end: false,
                escape_literally: true,
            },
            MatchKind::Regexp => Self {
                case_insensitive,
                anchor_start: true,
                anchor_end: true,
                escape_literally: false,
            },
        }
    }
}

/// Wraps a single user pattern so it must match the whole value: `^(pattern)$`.
pub fn anchored_pattern(pattern: &str, case_insensitive: bool) -> String {
    let flag = if case_insensitive { CASE_INSENSITIVE_FLAG } else { "" };
    format!("{}^({})$", flag, pattern)
}

/// Extracts candidate strings from a constant: a string or a list of strings.
pub fn candidates(value: ConstValue) -> Result<Vec<String>> {
    match value {
        ConstValue::String(s) => Ok(vec![s]),
        ConstValue::List(items) if items.is_empty() => {
            Err(Error::InvalidConstValue(ConstValue::List(items).to_string()))
        }
        ConstValue::List(items) => items
            .into_iter()
            .map(|item| match item {
                ConstValue::String(s) => Ok(s),
                other => Err(Error::InvalidConstValue(other.to_string())),
            })
            .collect(),
        other => Err(Error::InvalidConstValue(other.to_string())),
    }
}

/// Builds the sentinel-anchored alternation regex for a set of candidates.
pub fn build_regex(candidates: &[String], opts: MatchOptions) -> Result<String> {
    if candidates.is_empty() {
        return Err(Error::InvalidConstValue("[]".to_string()));
    }

    if let Some(value) = candidates
        .iter()
        .find(|c| c.contains(SENTINEL) || (!opts.escape_literally && escapes_sentinel(c)))
    {
        return Err(Error::SentinelInValue(value.clone()));
    }

    let mut regex = String::new();
    if opts.case_insensitive {
        regex.push_str(CASE_INSENSITIVE_FLAG);
    }
    if opts.anchor_start {
        regex.push(SENTINEL);
    }
    regex.push('(');
    regex.push_str(&join_alternation(candidates, opts.escape_literally));
    regex.push(')');
    if opts.anchor_end {
        regex.push(SENTINEL);
    }

    tracing::debug!("Built regex from {} candidates: {:?}", candidates.len(), regex);

    Ok(regex)
}

/// Returns true if some candidate matches an empty element.
///
/// Raw patterns that `regex-lite` cannot parse are assumed to match it.
pub fn matches_empty_element(candidates: &[String], opts: MatchOptions) -> bool {
    candidates.iter().any(|candidate| {
        if opts.escape_literally {
            candidate.is_empty()
        } else {
            Regex::new(&anchored_pattern(candidate, false)).map_or(true, |re| re.is_match(""))
        }
    })
}

/// Whether a raw pattern spells the sentinel as `\xNN`, `\x{N}` or an octal escape.
fn escapes_sentinel(pattern: &str) -> bool {
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            continue;
        }
        match chars.next() {
            Some('x') => {
                let digits: String = if chars.next_if_eq(&'{').is_some() {
                    chars.by_ref().take_while(|&c| c != '}').collect()
                } else {
                    chars.by_ref().take(2).collect()
                };
                if u32::from_str_radix(&digits, 16).is_ok_and(|value| value == 0) {
                    return true;
                }
            }
            Some('0') => {
                let mut value = 0;
                for _ in 0..2 {
                    match chars.next_if(|c| ('0'..='7').contains(c)).and_then(|d| d.to_digit(8)) {
                        Some(digit) => value = value * 8 + digit,
                        None => break,
                    }
                }
                if value == 0 {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Joins candidates with `|`, escaping literals or grouping raw patterns.
fn join_alternation(candidates: &[String], escape_literally: bool) -> String {
    candidates
        .iter()
        .map(|candidate| {
            if escape_literally {
                regex_lite::escape(candidate)
            } else {
                format!("({})", candidate)
            }
        })
        .join("|")
}

/// Sentinel encoding of a list, as the generated SQL builds it at query time.
pub fn encode_elements<S: AsRef<str>>(elements: &[S]) -> String {
    let joined = elements
        .iter()
        .map(|element| AsRef::<str>::as_ref(element))
        .join(&SENTINEL.to_string());
    format!("{}{}{}", SENTINEL, joined, SENTINEL)
}
