//! Parser for framework documentation HTML.
//!
//! Doc files carry an implicit three-level hierarchy: a root topic, major
//! subtopics, and minor sections for individual documented items. This crate
//! recovers that hierarchy as byte-exact sections of the original file, then
//! runs kind-specific extraction over them.
//!
//! Pipeline: raw bytes → marker normalization → section tree → post-pass.
//! [`parse`] produces the tree; a [`DocKind`]'s post-processor applies the
//! results; [`process_doc`] composes the two.

pub mod dialect;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod scanner;
pub mod sections;

use serde::{Deserialize, Serialize};

pub use dialect::{normalize, normalize_report, MarkerRule, MarkerSet};
pub use error::{ParseError, Result, ScanError};
pub use extract::{DocKind, NameRecord, NameRules, SectionPostProcessor};
pub use scanner::{Scanner, Token, TokenKind, MAX_TOKEN_LEN};
pub use sections::{Anomaly, FileSection, Level, ParsedDoc, SectionId, SectionTree};

/// Smallest input that can hold a root heading open/close pair, `<h1></h1>`.
pub const MIN_DOC_LEN: usize = 9;

/// Per-kind parse knobs: the heading vocabulary and the token-length bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    pub markers: MarkerSet,
    pub max_token_len: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            markers: MarkerSet::default(),
            max_token_len: MAX_TOKEN_LEN,
        }
    }
}

/// Parse one file into its section tree.
///
/// Dialect markers are normalized in a working copy; the tree is built from
/// that copy, and every offset in the result is valid against `buf` itself,
/// which stays untouched for later slicing.
pub fn parse(buf: &[u8], opts: &ParseOptions) -> Result<ParsedDoc> {
    if buf.len() < MIN_DOC_LEN {
        return Err(ParseError::InputTooShort { len: buf.len() });
    }
    let (norm, mut anomalies) = dialect::normalize_report(buf, &opts.markers);
    let mut doc = sections::build_tree(&norm, opts)?;
    anomalies.append(&mut doc.anomalies);
    doc.anomalies = anomalies;
    Ok(doc)
}

/// [`parse`] followed by the kind's post-processing pass: produce the tree,
/// then apply the results.
pub fn process_doc(buf: &[u8], kind: DocKind) -> Result<(ParsedDoc, Vec<NameRecord>)> {
    let opts = kind.options();
    let mut doc = parse(buf, &opts)?;
    let names = kind.post_processor().apply(&mut doc, buf, &opts);
    Ok((doc, names))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_dialect_parses_as_minor() {
        let input = br#"<h1>Consts</h1><div class="mach4">doit</div>"#;
        let doc = parse(input, &ParseOptions::default()).unwrap();
        let minor = doc.tree.get(doc.tree.find("doit").unwrap());
        assert_eq!(minor.level, Level::Minor);
        assert!(doc.anomalies.is_empty());
    }

    #[test]
    fn too_short_input_rejected() {
        let err = parse(b"<h1></h1", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::InputTooShort { len: 8 }));
    }

    #[test]
    fn offsets_index_the_original_buffer() {
        let html = std::fs::read("tests/fixtures/globals_tiger.html").unwrap();
        let doc = parse(&html, &DocKind::Globals.options()).unwrap();
        for (_, s) in doc.tree.sections() {
            assert_eq!(html[s.start], b'<');
            assert!(s.end <= html.len());
        }
    }

    #[test]
    fn collision_surfaces_through_parse() {
        let input = br#"<h1>T</h1><h2 class="mach4">doit</h2>"#;
        let doc = parse(input, &ParseOptions::default()).unwrap();
        assert_eq!(
            doc.anomalies,
            vec![Anomaly::DepthCollision {
                at: 10,
                kept: Level::Minor,
                dropped: Level::Major,
            }]
        );
        let s = doc.tree.get(doc.tree.find("doit").unwrap());
        assert_eq!(s.level, Level::Minor);
    }

    #[test]
    fn span_headed_page_parses_for_globals_kind() {
        let html = std::fs::read("tests/fixtures/globals_tiger.html").unwrap();
        let doc = parse(&html, &DocKind::Globals.options()).unwrap();
        assert_eq!(doc.tree.root().name, "Application Kit Constants");

        let err = parse(&html, &DocKind::Behaviors.options()).unwrap_err();
        assert!(matches!(err, ParseError::NoRootSection { .. }));
    }

    #[test]
    fn panther_fixture_h4_minors() {
        let html = std::fs::read("tests/fixtures/behaviors_panther.html").unwrap();
        let doc = parse(&html, &DocKind::Behaviors.options()).unwrap();
        doc.tree.validate().unwrap();
        let minor = doc.tree.get(doc.tree.find("initWithFrame:").unwrap());
        assert_eq!(minor.level, Level::Minor);
    }
}
