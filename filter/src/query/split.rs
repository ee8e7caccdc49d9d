//! Top-level splitting of filter expressions.
//!
//! All positions are byte offsets into the input, so the returned ranges
//! can be used to slice the original `&str` directly.

use std::ops::Range;

use crate::{Error, Result};

const OR: char = ',';
const AND: char = ';';

/// Find the blocks of `s` separated by any of `separators` at parenthesis
/// depth zero.
///
/// If `limit` is given, at most that many parts (from the left) are returned.
pub(crate) fn find_parts(
    s: &str,
    limit: Option<usize>,
    separators: &[char],
) -> Result<Vec<Range<usize>>> {
    if s.is_empty() {
        return Ok(Vec::new());
    }

    if separators.is_empty() {
        return Err(Error::Config("no separators given".to_string()));
    }

    if let Some(first) = s.chars().next().filter(|c| separators.contains(c)) {
        return Err(Error::LeadingSeparator(first));
    }
    if let Some(last) = s.chars().next_back().filter(|c| separators.contains(c)) {
        return Err(Error::TrailingSeparator(last));
    }

    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;

    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Err(Error::ParenthesesMismatch(s.to_string()));
                }
                depth -= 1;
            }
            c if depth == 0 && separators.contains(&c) => {
                if start == i {
                    return Err(Error::EmptyExpression(i));
                }
                parts.push(start..i);
                start = i + c.len_utf8();
                if limit.is_some_and(|n| parts.len() == n) {
                    return Ok(parts);
                }
            }
            _ => {}
        }
    }

    // Part after the last separator
    if start < s.len() {
        parts.push(start..s.len());
    }

    Ok(parts)
}

/// Find all OR blocks (`,`-separated) of `s`.
pub(crate) fn find_ors(s: &str, limit: Option<usize>) -> Result<Vec<Range<usize>>> {
    find_parts(s, limit, &[OR])
}

/// Find all AND blocks (`;`-separated) of `s`.
pub(crate) fn find_ands(s: &str, limit: Option<usize>) -> Result<Vec<Range<usize>>> {
    find_parts(s, limit, &[AND])
}

/// Find the outermost grouping parentheses in `s`.
///
/// Every entry is `(open, close)`: the byte offsets of the opening and the
/// matching closing parenthesis. Parentheses that follow an operator
/// character (`=` or `!`) belong to the operator's value list, as in
/// `=in=(1,2)`, and are skipped.
pub(crate) fn find_outer_parentheses(s: &str, limit: Option<usize>) -> Result<Vec<(usize, usize)>> {
    if s.matches('(').count() != s.matches(')').count() {
        return Err(Error::ParenthesesMismatch(s.to_string()));
    }

    let mut spans = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut nested = 0usize;
    let mut in_operator = false;

    for (i, c) in s.char_indices() {
        match c {
            '=' | '!' => in_operator = true,
            OR | AND if nested == 0 => in_operator = false,
            '(' if in_operator => nested += 1,
            '(' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            ')' if nested > 0 => nested -= 1,
            ')' => {
                if depth == 0 {
                    return Err(Error::ParenthesesMismatch(s.to_string()));
                }
                depth -= 1;
                if depth > 0 {
                    continue;
                }

                spans.push((start, i));
                in_operator = false;
                if limit.is_some_and(|n| spans.len() == n) {
                    return Ok(spans);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}
