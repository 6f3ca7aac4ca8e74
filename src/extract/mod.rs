pub mod behaviors;
pub mod functions;
pub mod globals;
pub mod names;

use serde::{Deserialize, Serialize};

use crate::sections::ParsedDoc;
use crate::ParseOptions;

pub use names::{scan_names, NameRecord, NameRules};

/// The closed set of documentation page kinds. Each kind picks its own
/// marker vocabulary and its own post-processing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocKind {
    /// Class and protocol pages.
    Behaviors,
    /// Constants, enums, and typedef pages.
    Globals,
    /// Free-function pages.
    Functions,
}

impl DocKind {
    pub fn options(self) -> ParseOptions {
        let mut opts = ParseOptions::default();
        if matches!(self, DocKind::Globals | DocKind::Functions) {
            opts.markers = opts.markers.with_span_headings();
        }
        opts
    }

    pub fn post_processor(self) -> &'static dyn SectionPostProcessor {
        match self {
            DocKind::Behaviors => &BehaviorDocs,
            DocKind::Globals => &GlobalsDocs,
            DocKind::Functions => &FunctionsDocs,
        }
    }
}

/// Kind-specific pass over a freshly parsed document. Runs after the tree is
/// built and may reshape it, extract name records from the original buffer,
/// or both.
pub trait SectionPostProcessor {
    fn apply(&self, doc: &mut ParsedDoc, buf: &[u8], opts: &ParseOptions) -> Vec<NameRecord>;
}

pub struct BehaviorDocs;

impl SectionPostProcessor for BehaviorDocs {
    fn apply(&self, doc: &mut ParsedDoc, _buf: &[u8], _opts: &ParseOptions) -> Vec<NameRecord> {
        behaviors::promote_minors(&mut doc.tree);
        Vec::new()
    }
}

pub struct GlobalsDocs;

impl SectionPostProcessor for GlobalsDocs {
    fn apply(&self, doc: &mut ParsedDoc, buf: &[u8], opts: &ParseOptions) -> Vec<NameRecord> {
        globals::extract(doc, buf, opts)
    }
}

pub struct FunctionsDocs;

impl SectionPostProcessor for FunctionsDocs {
    fn apply(&self, doc: &mut ParsedDoc, buf: &[u8], opts: &ParseOptions) -> Vec<NameRecord> {
        functions::extract(doc, buf, opts)
    }
}
