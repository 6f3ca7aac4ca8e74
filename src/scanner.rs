//! Byte-level tokenizer for raw documentation HTML.
//!
//! Tokens are maximal alphanumeric runs or single punctuation bytes;
//! whitespace separates tokens and is never emitted. Markup (`<...>` tags and
//! `&...;` entities) is consumed and discarded by [`Scanner::next_non_markup_token`],
//! so callers that only care about text never see it.

use std::borrow::Cow;
use std::ops::Range;

use crate::error::ScanError;

/// Longest word token the scanner will emit, and the lookahead bound when
/// skipping markup. Oversized runs surface as [`ScanError::TokenTooLong`].
pub const MAX_TOKEN_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Punct,
}

/// One token plus its `[start, end)` offsets into the scanned buffer.
/// Offsets are absolute even when the scanner covers a sub-range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub bytes: &'a [u8],
    pub start: usize,
    pub end: usize,
    pub kind: TokenKind,
}

impl<'a> Token<'a> {
    pub fn text(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.bytes)
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    /// True for a one-byte punctuation token equal to `b`.
    pub fn is_punct(&self, b: u8) -> bool {
        self.kind == TokenKind::Punct && self.bytes[0] == b
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    buf: &'a [u8],
    pos: usize,
    limit: usize,
    max_token: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(buf: &'a [u8], max_token: usize) -> Self {
        Self {
            buf,
            pos: 0,
            limit: buf.len(),
            max_token,
        }
    }

    /// Scanner restricted to `range` of `buf`, emitting absolute offsets.
    /// Extractors use this to re-walk one section of the original buffer.
    pub fn over(buf: &'a [u8], range: Range<usize>, max_token: usize) -> Self {
        let limit = range.end.min(buf.len());
        Self {
            buf,
            pos: range.start.min(limit),
            limit,
            max_token,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the cursor. Positions past the end of the scanned range clamp to it.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.limit);
    }

    fn peek(&self) -> Option<u8> {
        (self.pos < self.limit).then(|| self.buf[self.pos])
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.limit && self.buf[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Next raw token: a maximal alphanumeric run or one punctuation byte.
    /// Markup is not special here; `<` comes back as punctuation.
    ///
    /// On `TokenTooLong` the whole oversized run has been consumed, so a
    /// caller that keeps scanning sees each run fail at most once.
    pub fn next_token(&mut self) -> Result<Token<'a>, ScanError> {
        self.skip_whitespace();
        let start = self.pos;
        let first = self.peek().ok_or(ScanError::EndOfInput)?;

        if !first.is_ascii_alphanumeric() {
            self.pos = start + 1;
            return Ok(Token {
                bytes: &self.buf[start..start + 1],
                start,
                end: start + 1,
                kind: TokenKind::Punct,
            });
        }

        let mut end = start;
        while end < self.limit && self.buf[end].is_ascii_alphanumeric() {
            end += 1;
        }
        self.pos = end;
        if end - start > self.max_token {
            return Err(ScanError::TokenTooLong {
                at: start,
                limit: self.max_token,
            });
        }
        Ok(Token {
            bytes: &self.buf[start..end],
            start,
            end,
            kind: TokenKind::Word,
        })
    }

    /// Like [`next_token`](Self::next_token), but consumes and discards
    /// `<...>` tags and `&...;` entities first. An opener with no closing
    /// delimiter within the token bound degrades to plain punctuation.
    pub fn next_non_markup_token(&mut self) -> Result<Token<'a>, ScanError> {
        loop {
            self.skip_whitespace();
            let skipped = match self.peek() {
                None => return Err(ScanError::EndOfInput),
                Some(b'<') => self.skip_delimited(b'>'),
                Some(b'&') => self.skip_delimited(b';'),
                Some(_) => false,
            };
            if !skipped {
                return self.next_token();
            }
        }
    }

    /// Consume from the opener at the cursor through `close`, bounded by the
    /// token limit. False means unterminated within the bound; the cursor is
    /// left on the opener.
    fn skip_delimited(&mut self, close: u8) -> bool {
        let stop = (self.pos + self.max_token).min(self.limit).max(self.pos + 1);
        match self.buf[self.pos + 1..stop].iter().position(|&b| b == close) {
            Some(i) => {
                self.pos = self.pos + 1 + i + 1;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(input: &[u8]) -> Vec<(String, TokenKind)> {
        let mut scanner = Scanner::new(input, MAX_TOKEN_LEN);
        let mut out = Vec::new();
        loop {
            match scanner.next_token() {
                Ok(t) => out.push((t.text().into_owned(), t.kind)),
                Err(ScanError::EndOfInput) => break,
                Err(e) => panic!("unexpected {e}"),
            }
        }
        out
    }

    #[test]
    fn words_and_punctuation() {
        let toks = all_tokens(b"extern NSInteger kMaxCount;");
        let words: Vec<&str> = toks.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(words, vec!["extern", "NSInteger", "kMaxCount", ";"]);
        assert_eq!(toks[3].1, TokenKind::Punct);
    }

    #[test]
    fn underscore_is_punctuation() {
        let toks = all_tokens(b"FOUNDATION_EXPORT");
        let words: Vec<&str> = toks.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(words, vec!["FOUNDATION", "_", "EXPORT"]);
    }

    #[test]
    fn whitespace_never_emitted() {
        let toks = all_tokens(b"  a \t b \n c  ");
        assert_eq!(toks.len(), 3);
    }

    #[test]
    fn offsets_are_exact() {
        let input = b" foo.bar";
        let mut scanner = Scanner::new(input, MAX_TOKEN_LEN);
        let t = scanner.next_token().unwrap();
        assert_eq!((t.start, t.end), (1, 4));
        assert_eq!(&input[t.start..t.end], b"foo");
        let dot = scanner.next_token().unwrap();
        assert_eq!((dot.start, dot.end), (4, 5));
    }

    #[test]
    fn markup_skipped() {
        let input = b"<p>alpha &amp; <b>beta</b></p>";
        let mut scanner = Scanner::new(input, MAX_TOKEN_LEN);
        let mut words = Vec::new();
        while let Ok(t) = scanner.next_non_markup_token() {
            words.push(t.text().into_owned());
        }
        assert_eq!(words, vec!["alpha", "beta"]);
    }

    #[test]
    fn unterminated_markup_degrades_to_punct() {
        let mut scanner = Scanner::new(b"a < b", MAX_TOKEN_LEN);
        scanner.next_non_markup_token().unwrap();
        let t = scanner.next_non_markup_token().unwrap();
        assert!(t.is_punct(b'<'));
        let t = scanner.next_non_markup_token().unwrap();
        assert_eq!(t.text(), "b");
    }

    #[test]
    fn oversized_run_consumed_once() {
        let mut input = vec![b'x'; 300];
        input.extend_from_slice(b" ok");
        let mut scanner = Scanner::new(&input, MAX_TOKEN_LEN);
        assert!(matches!(
            scanner.next_token(),
            Err(ScanError::TokenTooLong { at: 0, .. })
        ));
        let t = scanner.next_token().unwrap();
        assert_eq!(t.text(), "ok");
    }

    #[test]
    fn sub_range_offsets_absolute() {
        let input = b"zzz foo bar";
        let mut scanner = Scanner::over(input, 4..input.len(), MAX_TOKEN_LEN);
        let t = scanner.next_token().unwrap();
        assert_eq!((t.start, t.end), (4, 7));
        assert_eq!(t.text(), "foo");
    }

    #[test]
    fn sub_range_stops_at_limit() {
        let input = b"foo bar baz";
        let mut scanner = Scanner::over(input, 0..7, MAX_TOKEN_LEN);
        scanner.next_token().unwrap();
        scanner.next_token().unwrap();
        assert_eq!(scanner.next_token(), Err(ScanError::EndOfInput));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn tokens_maximal_and_disjoint(input in proptest::collection::vec(any::<u8>(), 0..512)) {
                let mut scanner = Scanner::new(&input, MAX_TOKEN_LEN);
                let mut prev_end = 0usize;
                loop {
                    let t = match scanner.next_token() {
                        Ok(t) => t,
                        Err(ScanError::EndOfInput) => break,
                        Err(ScanError::TokenTooLong { .. }) => continue,
                    };
                    prop_assert!(t.start >= prev_end);
                    prop_assert!(t.end > t.start);
                    if t.kind == TokenKind::Word {
                        prop_assert!(t.bytes.iter().all(|b| b.is_ascii_alphanumeric()));
                        if t.start > 0 {
                            prop_assert!(!input[t.start - 1].is_ascii_alphanumeric());
                        }
                        if t.end < input.len() {
                            prop_assert!(!input[t.end].is_ascii_alphanumeric());
                        }
                    }
                    prev_end = t.end;
                }
            }

            #[test]
            fn non_markup_scan_terminates(input in proptest::collection::vec(any::<u8>(), 0..512)) {
                let mut scanner = Scanner::new(&input, MAX_TOKEN_LEN);
                let mut steps = 0usize;
                loop {
                    match scanner.next_non_markup_token() {
                        Err(ScanError::EndOfInput) => break,
                        _ => steps += 1,
                    }
                    prop_assert!(steps <= input.len() + 1);
                }
            }
        }
    }
}
