//! Name extraction for free-function pages. A function's name must be
//! followed by its argument list, which keeps parameter names from matching.

use crate::extract::names::{scan_leaf_sections, NameRecord, NameRules};
use crate::sections::ParsedDoc;
use crate::ParseOptions;

const TYPE_TOKENS: &[&str] = &[
    "void",
    "NSInteger",
    "NSUInteger",
    "NSRect",
    "NSPoint",
    "NSSize",
    "NSRange",
    "NSString",
    "CGFloat",
    "BOOL",
    "id",
    "int",
    "unsigned",
    "long",
    "short",
    "float",
    "double",
    "char",
    "const",
];

const RESERVED: &[&str] = &["extern", "static", "typedef", "signed", "volatile", "inline"];

pub fn rules() -> NameRules {
    let mut rules = NameRules::new(TYPE_TOKENS, RESERVED);
    rules.require_following = Some('(');
    rules
}

pub fn extract(doc: &ParsedDoc, buf: &[u8], opts: &ParseOptions) -> Vec<NameRecord> {
    scan_leaf_sections(&doc.tree, buf, &rules(), opts.max_token_len)
}
