//! Recursive walk shared by inline and parameterized compilation.

use super::operator::Combinator;
use super::split::{find_ands, find_ors, find_outer_parentheses};
use crate::{Error, Result};

/// Walks OR-groups, then AND-units, recursing into grouping parentheses.
pub(crate) struct Walker<'p> {
    pub and: &'p Combinator,
    pub or: &'p Combinator,
    pub max_depth: usize,
}

impl Walker<'_> {
    /// Compile `s` (already escape-encoded), handing every atomic operation
    /// to `leaf` in left-to-right, depth-first order.
    pub fn walk<F>(&self, s: &str, depth: usize, leaf: &mut F) -> Result<String>
    where
        F: FnMut(&str) -> Result<String>,
    {
        if depth > self.max_depth {
            return Err(Error::TooDeep(self.max_depth));
        }

        let mut ors = Vec::new();
        for group in find_ors(s, None)? {
            let group = &s[group];

            let mut ands = Vec::new();
            for unit in find_ands(group, None)? {
                let unit = &group[unit];

                let spans = find_outer_parentheses(unit, None)?;
                if spans.is_empty() {
                    ands.push(leaf(unit)?);
                    continue;
                }

                ensure_only_groups(unit, &spans)?;
                for (open, close) in spans {
                    ands.push(self.walk(&unit[open + 1..close], depth + 1, leaf)?);
                }
            }

            ors.push((self.and)(&ands));
        }

        Ok((self.or)(&ors))
    }
}

/// A unit with grouping parentheses may hold nothing else but whitespace.
fn ensure_only_groups(unit: &str, spans: &[(usize, usize)]) -> Result<()> {
    let mut cursor = 0;
    for &(open, close) in spans {
        if !unit[cursor..open].trim().is_empty() {
            return Err(Error::StrayText(super::escape::decode(unit)));
        }
        cursor = close + 1;
    }

    if !unit[cursor..].trim().is_empty() {
        return Err(Error::StrayText(super::escape::decode(unit)));
    }

    Ok(())
}
