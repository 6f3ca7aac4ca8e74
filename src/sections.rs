use std::ops::Range;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dialect::{close_tag_len, find_byte, MarkerMatch};
use crate::error::{ParseError, ScanError};
use crate::scanner::Scanner;
use crate::ParseOptions;

/// Structural depth of a section. Ordering follows nesting: the root is the
/// shallowest, minors the deepest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Root,
    Major,
    Minor,
}

/// Index of a section in its [`SectionTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SectionId(pub usize);

/// One node of the three-level hierarchy recovered from a doc file.
///
/// `name` holds the heading text exactly as it appears in the buffer: nested
/// tags are dropped but their text kept, character entities stay undecoded,
/// and surrounding whitespace survives. Decoding for display happens
/// elsewhere.
#[derive(Debug, Clone, Serialize)]
pub struct FileSection {
    pub level: Level,
    pub name: String,
    /// Byte offset of this section's own heading in the original buffer.
    pub start: usize,
    /// One past the last byte, i.e. the offset of the next sibling-or-higher
    /// heading, or the buffer length.
    pub end: usize,
    pub parent: Option<SectionId>,
    pub children: Vec<SectionId>,
}

impl FileSection {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Arena of [`FileSection`] nodes. Node 0 is always the root.
#[derive(Debug, Clone, Serialize)]
pub struct SectionTree {
    nodes: Vec<FileSection>,
}

impl SectionTree {
    pub const ROOT: SectionId = SectionId(0);

    pub fn root(&self) -> &FileSection {
        &self.nodes[Self::ROOT.0]
    }

    pub fn get(&self, id: SectionId) -> &FileSection {
        &self.nodes[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: SectionId) -> &mut FileSection {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All sections in insertion order, which is document order.
    pub fn sections(&self) -> impl Iterator<Item = (SectionId, &FileSection)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, s)| (SectionId(i), s))
    }

    pub fn children(&self, id: SectionId) -> impl Iterator<Item = SectionId> + '_ {
        self.get(id).children.iter().copied()
    }

    /// First section whose name matches exactly.
    pub fn find(&self, name: &str) -> Option<SectionId> {
        self.sections()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| id)
    }

    /// Check the structural invariants: one root, parents strictly shallower
    /// than and containing their children, siblings disjoint and in order.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no root".to_string());
        }
        if self.root().level != Level::Root || self.root().parent.is_some() {
            return Err("node 0 is not a root section".to_string());
        }
        for (id, s) in self.sections() {
            if s.start > s.end {
                return Err(format!("{id:?} has an inverted range"));
            }
            if id != Self::ROOT && s.level == Level::Root {
                return Err(format!("{id:?} is a second root"));
            }
            match s.parent {
                Some(p) => {
                    let parent = self.get(p);
                    if parent.level >= s.level {
                        return Err(format!("{id:?} is not deeper than its parent"));
                    }
                    if s.start < parent.start || s.end > parent.end {
                        return Err(format!("{id:?} escapes its parent's range"));
                    }
                }
                None if id != Self::ROOT => {
                    return Err(format!("{id:?} has no parent"));
                }
                None => {}
            }
            for (a, b) in s.children.iter().tuple_windows() {
                if self.get(*a).end > self.get(*b).start {
                    return Err(format!("children of {id:?} overlap or are out of order"));
                }
            }
        }
        Ok(())
    }
}

/// A recoverable deviation observed while parsing. Each one degrades a single
/// heading or marker; the file as a whole still parses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Anomaly {
    /// A major or minor heading arrived before any root heading.
    OrphanHeading { at: usize, level: Level },
    /// A second root heading, demoted to a major section.
    ExtraRootHeading { at: usize },
    /// A heading open with no matching close before the next heading or EOF.
    UnclosedHeading { at: usize, level: Level },
    /// A heading name longer than the token bound, cut at `kept` bytes.
    TruncatedHeadingName { at: usize, kept: usize },
    /// Markers of two depths at one offset. The deeper one was kept.
    DepthCollision { at: usize, kept: Level, dropped: Level },
}

/// The product of parsing one file: the section tree plus everything that had
/// to be tolerated along the way.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedDoc {
    pub tree: SectionTree,
    pub anomalies: Vec<Anomaly>,
}

/// Build the section tree from the token stream of `buf`.
///
/// Offsets in the result index into `buf`. Callers normally pass the
/// normalized buffer and slice the original with the same offsets, which the
/// equal-length rewrite keeps interchangeable. Dialect markers are recognized
/// here too, so un-normalized input parses as well.
pub fn build_tree(buf: &[u8], opts: &ParseOptions) -> Result<ParsedDoc, ParseError> {
    let mut nodes: Vec<FileSection> = Vec::new();
    let mut stack: Vec<SectionId> = Vec::new();
    let mut anomalies: Vec<Anomaly> = Vec::new();
    let mut scanner = Scanner::new(buf, opts.max_token_len);

    loop {
        let tok = match scanner.next_token() {
            Ok(t) => t,
            Err(ScanError::EndOfInput) => break,
            // An oversized prose run carries no structure.
            Err(ScanError::TokenTooLong { at, .. }) => {
                debug!("skipping oversized text run at byte {at}");
                continue;
            }
        };
        if !tok.is_punct(b'<') {
            continue;
        }
        let at = tok.start;
        let Some(m) = opts.markers.match_open(&buf[at..]) else {
            continue;
        };
        if let Some(dropped) = m.dropped {
            debug!("markers for {:?} and {:?} collide at byte {at}", m.level, dropped);
            anomalies.push(Anomaly::DepthCollision {
                at,
                kept: m.level,
                dropped,
            });
        }

        let name = match read_heading_name(buf, at + m.open_len, &m, opts) {
            HeadingText::Closed {
                name,
                truncated,
                resume,
            } => {
                scanner.seek(resume);
                if truncated {
                    warn!("heading name at byte {at} truncated to {} bytes", opts.max_token_len);
                    anomalies.push(Anomaly::TruncatedHeadingName {
                        at,
                        kept: opts.max_token_len,
                    });
                }
                name
            }
            HeadingText::Unclosed { resume } => {
                warn!("unclosed {:?} heading at byte {at}", m.level);
                anomalies.push(Anomaly::UnclosedHeading { at, level: m.level });
                scanner.seek(resume);
                continue;
            }
        };

        let mut level = m.level;
        if level == Level::Root && !nodes.is_empty() {
            warn!("extra root heading {name:?} at byte {at}, demoting to major");
            anomalies.push(Anomaly::ExtraRootHeading { at });
            level = Level::Major;
        }
        if level != Level::Root && nodes.is_empty() {
            warn!("{:?} heading {name:?} at byte {at} precedes the root, skipping", level);
            anomalies.push(Anomaly::OrphanHeading { at, level });
            continue;
        }

        while let Some(&top) = stack.last() {
            if nodes[top.0].level >= level {
                nodes[top.0].end = at;
                stack.pop();
            } else {
                break;
            }
        }
        let parent = stack.last().copied();
        let id = SectionId(nodes.len());
        nodes.push(FileSection {
            level,
            name,
            start: at,
            // Trimmed back when a sibling-or-higher heading arrives; EOF
            // leaves it at the buffer length.
            end: buf.len(),
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            nodes[p.0].children.push(id);
        }
        stack.push(id);
    }

    if nodes.is_empty() {
        return Err(ParseError::NoRootSection { scanned: buf.len() });
    }
    Ok(ParsedDoc {
        tree: SectionTree { nodes },
        anomalies,
    })
}

enum HeadingText {
    Closed {
        name: String,
        truncated: bool,
        /// Offset just past the close tag.
        resume: usize,
    },
    Unclosed {
        /// Offset of the next heading marker, or the buffer length.
        resume: usize,
    },
}

/// Accumulate heading text from `from` up to the close tag for `m.tag`.
/// Nested non-heading tags are transparent: their bytes drop out of the name,
/// their text stays. Another heading marker before the close means the
/// heading never closed.
fn read_heading_name(buf: &[u8], from: usize, m: &MarkerMatch, opts: &ParseOptions) -> HeadingText {
    let cap = opts.max_token_len;
    let mut name: Vec<u8> = Vec::new();
    let mut truncated = false;
    let mut pos = from;

    loop {
        let Some(lt) = find_byte(buf, b'<', pos) else {
            return HeadingText::Unclosed { resume: buf.len() };
        };
        push_capped(&mut name, &buf[pos..lt], cap, &mut truncated);

        if let Some(len) = close_tag_len(&buf[lt..], &m.tag) {
            return HeadingText::Closed {
                name: String::from_utf8_lossy(&name).into_owned(),
                truncated,
                resume: lt + len,
            };
        }
        if opts.markers.match_open(&buf[lt..]).is_some() {
            return HeadingText::Unclosed { resume: lt };
        }
        let stop = (lt + cap).min(buf.len());
        match find_byte(&buf[..stop], b'>', lt + 1) {
            Some(gt) => pos = gt + 1,
            None => {
                // Not a tag within the bound. A literal `<` in the name.
                push_capped(&mut name, b"<", cap, &mut truncated);
                pos = lt + 1;
            }
        }
    }
}

fn push_capped(name: &mut Vec<u8>, bytes: &[u8], cap: usize, truncated: &mut bool) {
    let room = cap.saturating_sub(name.len());
    if bytes.len() > room {
        *truncated = true;
    }
    name.extend_from_slice(&bytes[..room.min(bytes.len())]);
}

// ── Tests ──
