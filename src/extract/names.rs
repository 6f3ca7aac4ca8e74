//! Lookback name scanning.
//!
//! Declaration names sit in loosely formatted prose (`extern NSInteger
//! kMaxCount;` inside a paragraph). The engine walks a section's byte range
//! with a two-token lookback window, previous word plus the token in hand,
//! and fires when a recognized type word directly precedes an
//! identifier-shaped word.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::scanner::{Scanner, Token, TokenKind};
use crate::sections::{SectionId, SectionTree};

/// A declaration name pulled out of one section. `buffer[start..end]`
/// reproduces `text` byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameRecord {
    pub section: SectionId,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// The pair rules one document kind uses to recognize declaration names.
/// Deliberately heuristic; multi-word types resolve through their last word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRules {
    /// Words that can directly precede a declared name.
    pub type_tokens: Vec<String>,
    /// Words that are never names themselves. Type tokens are implied.
    pub reserved: Vec<String>,
    /// Punctuation that does not disturb the lookback window, so
    /// `NSString *NSSomeName` still pairs type with name.
    pub transparent: Vec<char>,
    /// When set, a name only counts if this punctuation follows it.
    pub require_following: Option<char>,
}

impl NameRules {
    pub fn new(type_tokens: &[&str], reserved: &[&str]) -> Self {
        Self {
            type_tokens: type_tokens.iter().map(|s| s.to_string()).collect(),
            reserved: reserved.iter().map(|s| s.to_string()).collect(),
            transparent: vec!['*'],
            require_following: None,
        }
    }

    fn is_type(&self, word: &str) -> bool {
        self.type_tokens.iter().any(|t| t == word)
    }

    fn is_reserved(&self, word: &str) -> bool {
        self.reserved.iter().any(|t| t == word) || self.is_type(word)
    }

    fn is_name(&self, tok: &Token) -> bool {
        tok.is_word() && tok.bytes[0].is_ascii_alphabetic() && !self.is_reserved(&tok.text())
    }

    fn is_transparent(&self, b: u8) -> bool {
        self.transparent.contains(&(b as char))
    }
}

/// Scan one section's byte range of the original buffer. Finding nothing is
/// normal; some sections document no globals.
pub fn scan_names(
    buf: &[u8],
    section: SectionId,
    range: Range<usize>,
    rules: &NameRules,
    max_token: usize,
) -> Vec<NameRecord> {
    let mut scanner = Scanner::over(buf, range, max_token);
    let mut records = Vec::new();
    let mut prev: Option<Token> = None;

    loop {
        let tok = match scanner.next_non_markup_token() {
            Ok(t) => t,
            Err(ScanError::EndOfInput) => break,
            Err(ScanError::TokenTooLong { .. }) => {
                prev = None;
                continue;
            }
        };
        if tok.kind == TokenKind::Punct {
            if !rules.is_transparent(tok.bytes[0]) {
                prev = None;
            }
            continue;
        }

        let fires = prev.is_some_and(|p| {
            rules.is_type(&p.text()) && rules.is_name(&tok) && following_ok(&scanner, rules)
        });
        if fires {
            records.push(NameRecord {
                section,
                text: tok.text().into_owned(),
                start: tok.start,
                end: tok.end,
            });
            prev = None;
        } else {
            prev = Some(tok);
        }
    }
    records
}

fn following_ok(scanner: &Scanner, rules: &NameRules) -> bool {
    let Some(want) = rules.require_following else {
        return true;
    };
    let mut probe = *scanner;
    matches!(
        probe.next_non_markup_token(),
        Ok(t) if t.kind == TokenKind::Punct && t.bytes[0] == want as u8
    )
}

/// Run `rules` over every leaf section: each minor, each childless major, or
/// the bare root when the tree has nothing else.
pub fn scan_leaf_sections(
    tree: &SectionTree,
    buf: &[u8],
    rules: &NameRules,
    max_token: usize,
) -> Vec<NameRecord> {
    let root_kids: Vec<SectionId> = tree.children(SectionTree::ROOT).collect();
    if root_kids.is_empty() {
        return scan_names(buf, SectionTree::ROOT, tree.root().range(), rules, max_token);
    }

    let mut records = Vec::new();
    for id in root_kids {
        let kids: Vec<SectionId> = tree.children(id).collect();
        if kids.is_empty() {
            records.extend(scan_names(buf, id, tree.get(id).range(), rules, max_token));
        } else {
            for kid in kids {
                records.extend(scan_names(buf, kid, tree.get(kid).range(), rules, max_token));
            }
        }
    }
    records
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::globals;
    use crate::scanner::MAX_TOKEN_LEN;

    fn scan(input: &str, rules: &NameRules) -> Vec<NameRecord> {
        scan_names(
            input.as_bytes(),
            SectionId(0),
            0..input.len(),
            rules,
            MAX_TOKEN_LEN,
        )
    }

    #[test]
    fn type_then_identifier_fires() {
        let input = "extern NSInteger kMaxCount;";
        let records = scan(input, &globals::rules());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "kMaxCount");
        assert_eq!(
            &input.as_bytes()[records[0].start..records[0].end],
            b"kMaxCount"
        );
    }

    #[test]
    fn pointer_star_is_transparent() {
        let records = scan(
            "APPKIT_EXTERN NSString *NSWindowDidMoveNotification;",
            &globals::rules(),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "NSWindowDidMoveNotification");
    }

    #[test]
    fn const_pointer_resolves_through_last_type_word() {
        let records = scan("NSString *const NSSomeKey;", &globals::rules());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "NSSomeKey");
    }

    #[test]
    fn prose_yields_nothing() {
        let records = scan(
            "This part of the page merely discusses behavior in general terms.",
            &globals::rules(),
        );
        assert!(records.is_empty());
    }

    #[test]
    fn reserved_words_are_not_names() {
        assert!(scan("extern const;", &globals::rules()).is_empty());
        assert!(scan("NSInteger enum", &globals::rules()).is_empty());
    }

    #[test]
    fn digit_leading_word_is_not_a_name() {
        assert!(scan("NSInteger 42;", &globals::rules()).is_empty());
    }

    #[test]
    fn window_clears_after_firing() {
        let records = scan("NSInteger kFirst kSecond;", &globals::rules());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "kFirst");
    }

    #[test]
    fn punctuation_breaks_the_pair() {
        assert!(scan("NSInteger. kMaxCount;", &globals::rules()).is_empty());
    }

    #[test]
    fn markup_between_tokens_is_invisible() {
        let input = "<b>NSString</b> *<i>NSSomeName</i>;";
        let records = scan(input, &globals::rules());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "NSSomeName");
        assert_eq!(
            &input.as_bytes()[records[0].start..records[0].end],
            b"NSSomeName"
        );
    }

    #[test]
    fn required_following_punct() {
        let mut rules = NameRules::new(&["void", "CGFloat"], &["extern"]);
        rules.require_following = Some('(');
        let records = scan("void NSBeep(void); CGFloat width, height", &rules);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "NSBeep");
    }

    #[test]
    fn enum_introduces_its_name() {
        let records = scan("enum NSWindowOrderingMode { };", &globals::rules());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "NSWindowOrderingMode");
    }
}
