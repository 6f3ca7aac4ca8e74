//! Markup dialect handling.
//!
//! Different documentation generations mark the same structural boundary with
//! different tags: plain `<h1>/<h2>/<h3>`, then `<h2>/<h4>`, then
//! `<div class="mach4">` item markers with a bare `<span>` standing in for the
//! page title on some page kinds. [`normalize`] rewrites the alternates into
//! the canonical heading tags without moving a single byte, so every offset
//! computed downstream stays valid in the original buffer.

use std::sync::LazyLock;

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sections::{Anomaly, Level};

static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\A<([a-z][a-z0-9]*)(\s[^<>]*)?>").unwrap());
static CLASS_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)class\s*=\s*"([^"]*)""#).unwrap());

/// One way a heading can be marked up: by tag name, by class attribute, or
/// both. `level` is the structural depth the marker denotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerRule {
    pub tag: Option<String>,
    pub class: Option<String>,
    pub level: Level,
}

impl MarkerRule {
    pub fn tag(name: &str, level: Level) -> Self {
        Self {
            tag: Some(name.to_string()),
            class: None,
            level,
        }
    }

    pub fn class(value: &str, level: Level) -> Self {
        Self {
            tag: None,
            class: Some(value.to_string()),
            level,
        }
    }

    fn matches(&self, tag: &[u8], attrs: &[u8]) -> bool {
        if self.tag.is_none() && self.class.is_none() {
            return false;
        }
        if let Some(t) = &self.tag {
            if !tag.eq_ignore_ascii_case(t.as_bytes()) {
                return false;
            }
        }
        if let Some(c) = &self.class {
            match CLASS_ATTR_RE.captures(attrs) {
                Some(caps) => {
                    if !caps[1].eq_ignore_ascii_case(c.as_bytes()) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

/// The heading vocabulary one document kind understands: the canonical tags
/// plus the dialect markers that map onto them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSet {
    pub rules: Vec<MarkerRule>,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            rules: vec![
                MarkerRule::tag("h1", Level::Root),
                MarkerRule::tag("h2", Level::Major),
                MarkerRule::tag("h3", Level::Minor),
                MarkerRule::tag("h4", Level::Minor),
                MarkerRule::class("mach4", Level::Minor),
            ],
        }
    }
}

/// A marker recognized at some offset. `tag` is the tag actually present in
/// the input (lowercased), which is what the matching close tag uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    pub level: Level,
    /// Shallowest other level whose rule also matched here. Deepest wins.
    pub dropped: Option<Level>,
    pub tag: String,
    pub open_len: usize,
}

impl MarkerSet {
    /// Adds the rule for pages that use a bare `<span>` where the page title
    /// heading should be (functions and types-and-constants pages).
    pub fn with_span_headings(mut self) -> Self {
        self.rules.push(MarkerRule::tag("span", Level::Root));
        self
    }

    pub fn canonical_tag(level: Level) -> &'static str {
        match level {
            Level::Root => "h1",
            Level::Major => "h2",
            Level::Minor => "h3",
        }
    }

    /// Match a heading marker opening exactly at the start of `slice`.
    /// Rules of different levels matching the same tag resolve deepest-wins,
    /// with the dropped level reported for the caller to record.
    pub fn match_open(&self, slice: &[u8]) -> Option<MarkerMatch> {
        let caps = OPEN_TAG_RE.captures(slice)?;
        let whole = caps.get(0)?;
        let tag = caps.get(1)?.as_bytes();
        let attrs = caps.get(2).map(|m| m.as_bytes()).unwrap_or(b"");

        let mut levels: Vec<Level> = self
            .rules
            .iter()
            .filter(|r| r.matches(tag, attrs))
            .map(|r| r.level)
            .collect();
        levels.sort();
        levels.dedup();
        let level = *levels.last()?;
        Some(MarkerMatch {
            level,
            dropped: (levels.len() > 1).then(|| levels[0]),
            tag: String::from_utf8_lossy(tag).to_ascii_lowercase(),
            open_len: whole.end(),
        })
    }
}

/// Rewrite dialect markers into canonical heading tags, preserving buffer
/// length and the offset of every byte outside the rewritten tags.
pub fn normalize(buf: &[u8], markers: &MarkerSet) -> Vec<u8> {
    normalize_report(buf, markers).0
}

/// [`normalize`] plus the anomalies observed while matching markers.
pub fn normalize_report(buf: &[u8], markers: &MarkerSet) -> (Vec<u8>, Vec<Anomaly>) {
    let mut out = buf.to_vec();
    let mut anomalies = Vec::new();
    let mut pos = 0;

    while let Some(lt) = find_byte(buf, b'<', pos) {
        let Some(m) = markers.match_open(&buf[lt..]) else {
            pos = lt + 1;
            continue;
        };
        if let Some(dropped) = m.dropped {
            anomalies.push(Anomaly::DepthCollision {
                at: lt,
                kept: m.level,
                dropped,
            });
        }

        let canonical = MarkerSet::canonical_tag(m.level);
        if m.tag == canonical {
            pos = lt + m.open_len;
            continue;
        }
        if m.open_len < canonical.len() + 2 {
            debug!("marker at {lt} spans {} bytes, too short to rewrite", m.open_len);
            pos = lt + m.open_len;
            continue;
        }

        rewrite_tag(&mut out[lt..lt + m.open_len], canonical, false);
        match matching_close(buf, lt + m.open_len, &m.tag) {
            Some((close_at, close_len)) if close_len >= canonical.len() + 3 => {
                rewrite_tag(&mut out[close_at..close_at + close_len], canonical, true);
            }
            Some((close_at, _)) => {
                debug!("close tag at {close_at} too short to rewrite");
            }
            None => {
                debug!("marker at {lt} has no matching </{}>", m.tag);
            }
        }
        pos = lt + m.open_len;
    }

    (out, anomalies)
}

/// Overwrite `span` with `<tag>` or `</tag>`, space-padded before the `>` so
/// the span's length is unchanged.
fn rewrite_tag(span: &mut [u8], tag: &str, closing: bool) {
    span.fill(b' ');
    span[0] = b'<';
    let name_at = if closing {
        span[1] = b'/';
        2
    } else {
        1
    };
    span[name_at..name_at + tag.len()].copy_from_slice(tag.as_bytes());
    span[span.len() - 1] = b'>';
}

/// Find the close tag pairing with an open `<tag ...>` whose body starts at
/// `from`, counting same-name nesting so wrappers inside wrappers pair
/// correctly. Returns the close tag's offset and byte length.
fn matching_close(buf: &[u8], from: usize, tag: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut pos = from;
    while let Some(lt) = find_byte(buf, b'<', pos) {
        if let Some(len) = close_tag_len(&buf[lt..], tag) {
            if depth == 0 {
                return Some((lt, len));
            }
            depth -= 1;
            pos = lt + len;
        } else if let Some(len) = open_tag_len(&buf[lt..], tag) {
            depth += 1;
            pos = lt + len;
        } else {
            pos = lt + 1;
        }
    }
    None
}

/// Byte length of a `</tag>` starting at the head of `slice`, tolerating
/// whitespace padding on either side of the name. None if `slice` starts with
/// anything else.
pub(crate) fn close_tag_len(slice: &[u8], tag: &str) -> Option<usize> {
    let rest = slice.strip_prefix(b"</")?;
    let mut i = 0;
    while i < rest.len() && rest[i].is_ascii_whitespace() {
        i += 1;
    }
    let t = tag.as_bytes();
    if rest.len() < i + t.len() || !rest[i..i + t.len()].eq_ignore_ascii_case(t) {
        return None;
    }
    let mut j = i + t.len();
    while j < rest.len() && rest[j].is_ascii_whitespace() {
        j += 1;
    }
    (j < rest.len() && rest[j] == b'>').then_some(2 + j + 1)
}

fn open_tag_len(slice: &[u8], tag: &str) -> Option<usize> {
    let rest = slice.strip_prefix(b"<")?;
    let t = tag.as_bytes();
    if rest.len() <= t.len() || !rest[..t.len()].eq_ignore_ascii_case(t) {
        return None;
    }
    let next = rest[t.len()];
    if !next.is_ascii_whitespace() && next != b'>' {
        return None;
    }
    let gt = find_byte(rest, b'>', t.len())?;
    Some(1 + gt + 1)
}

pub(crate) fn find_byte(buf: &[u8], byte: u8, from: usize) -> Option<usize> {
    buf.get(from..)?
        .iter()
        .position(|&b| b == byte)
        .map(|i| from + i)
}

// ── Tests ──
