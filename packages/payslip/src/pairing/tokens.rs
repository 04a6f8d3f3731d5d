//! Word-level tokenizer shared by the pairing strategies.
//!
//! A word is a run of word characters optionally joined by `.`, `,` or `/`
//! (`1.185,54`, `Janeiro/2023`, `7033`). Matching codes against whole
//! words keeps `033` from matching inside `7.033,00`.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::value::{is_amount_token, parse_amount};

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+(?:[.,/]\w+)*").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// A code from the vocabulary.
    Code,
    /// An amount and its parsed value.
    Amount(f64),
    Other,
}

/// A word of the input and its byte span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'t> {
    pub text: &'t str,
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
}

impl Token<'_> {
    #[must_use]
    pub const fn amount(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Amount(value) => Some(value),
            TokenKind::Code | TokenKind::Other => None,
        }
    }

    #[must_use]
    pub const fn is_code(&self) -> bool {
        matches!(self.kind, TokenKind::Code)
    }
}

/// Splits `text` into classified words.
///
/// Amount-shaped words directly followed by `%` are percentages and come
/// out as [`TokenKind::Other`].
#[must_use]
pub fn tokenize<'t>(text: &'t str, vocabulary: &BTreeSet<String>) -> Vec<Token<'t>> {
    WORD_RE
        .find_iter(text)
        .map(|m| {
            let word = m.as_str();
            let kind = if vocabulary.contains(word) {
                TokenKind::Code
            } else if is_amount_token(word) && !text[m.end()..].trim_start().starts_with('%') {
                parse_amount(word).map_or(TokenKind::Other, TokenKind::Amount)
            } else {
                TokenKind::Other
            };
            Token {
                text: word,
                start: m.start(),
                end: m.end(),
                kind,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| (*c).to_owned()).collect()
    }

    #[test]
    fn classifies_codes_amounts_and_noise() {
        let tokens = tokenize("7033-VENCIMENTO BASE 30 1.185,54", &vocab(&["7033"]));
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Code,
                TokenKind::Other,
                TokenKind::Other,
                TokenKind::Other,
                TokenKind::Amount(1185.54),
            ]
        );
        assert_eq!(tokens[4].start, 24);
    }

    #[test]
    fn code_does_not_match_inside_amount() {
        let tokens = tokenize("7.033,00", &vocab(&["033", "7"]));
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].amount(), Some(7033.0));
    }

    #[test]
    fn percentages_are_not_amounts() {
        let tokens = tokenize("3,00% 12,50 %", &vocab(&[]));
        assert!(tokens.iter().all(|t| t.amount().is_none()));
    }
}
