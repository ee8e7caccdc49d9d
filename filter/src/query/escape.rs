//! Backslash escapes for characters that carry meaning in the grammar.
//!
//! Escaped characters are swapped for private-use code points before the
//! expression is split, so they can never act as separators, grouping
//! parentheses or operator characters. Keys and values are decoded back to
//! the bare character once an operation has been isolated.
//!
//! `\\` is a literal backslash, so `a==x\\,b==2` is two operations.

use crate::{Error, Result};

static SPECIAL: [(char, char); 6] = [
    ('(', '\u{E000}'),
    (')', '\u{E001}'),
    (',', '\u{E002}'),
    (';', '\u{E003}'),
    ('=', '\u{E004}'),
    ('\\', '\u{E005}'),
];

fn is_placeholder(c: char) -> bool {
    SPECIAL.iter().any(|&(_, placeholder)| placeholder == c)
}

/// Replace every `\` + special character with its placeholder.
///
/// Input already holding a placeholder code point is rejected, since it
/// would decode to a character the user never escaped.
pub(crate) fn encode(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if is_placeholder(c) {
            return Err(Error::ReservedCharacter(i));
        }
        if c == '\\' {
            if let Some(&(_, placeholder)) = chars
                .peek()
                .and_then(|(_, next)| SPECIAL.iter().find(|(special, _)| special == next))
            {
                out.push(placeholder);
                chars.next();
                continue;
            }
        }
        out.push(c);
    }

    Ok(out)
}

/// Turn placeholders back into the literal characters they stand for.
pub(crate) fn decode(s: &str) -> String {
    s.chars()
        .map(|c| {
            SPECIAL
                .iter()
                .find(|(_, placeholder)| *placeholder == c)
                .map_or(c, |(special, _)| *special)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_hides_specials() {
        let encoded = encode(r"a==x\,y\;z").unwrap();
        assert!(!encoded.contains(','));
        assert!(!encoded.contains(';'));
        assert_eq!(decode(&encoded), "a==x,y;z");
    }

    #[test]
    fn test_encode_keeps_other_backslashes() {
        assert_eq!(encode(r"a==c:\tmp").unwrap(), r"a==c:\tmp");
    }

    #[test]
    fn test_escaped_backslash() {
        let encoded = encode(r"a==x\\,b==2").unwrap();
        assert_eq!(encoded.matches(',').count(), 1);
        assert_eq!(decode(&encoded), r"a==x\,b==2");
    }

    #[test]
    fn test_trailing_backslash() {
        assert_eq!(encode("a==b\\").unwrap(), "a==b\\");
    }

    #[test]
    fn test_raw_placeholder_rejected() {
        assert!(matches!(
            encode("a==x\u{E002}y"),
            Err(Error::ReservedCharacter(4))
        ));
        assert!(matches!(
            encode("\u{E005}"),
            Err(Error::ReservedCharacter(0))
        ));
    }

    #[test]
    fn test_decode_plain_text() {
        assert_eq!(decode("a==1"), "a==1");
    }
}
