//! Name extraction for constants, notifications, enums, and typedef pages.

use crate::extract::names::{scan_leaf_sections, NameRecord, NameRules};
use crate::sections::ParsedDoc;
use crate::ParseOptions;

const TYPE_TOKENS: &[&str] = &[
    "NSString",
    "NSInteger",
    "NSUInteger",
    "NSTimeInterval",
    "NSNotificationName",
    "CFStringRef",
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
    "enum",
    "struct",
    "union",
];

const RESERVED: &[&str] = &[
    "extern", "static", "typedef", "signed", "volatile", "register", "inline",
];

pub fn rules() -> NameRules {
    NameRules::new(TYPE_TOKENS, RESERVED)
}

pub fn extract(doc: &ParsedDoc, buf: &[u8], opts: &ParseOptions) -> Vec<NameRecord> {
    scan_leaf_sections(&doc.tree, buf, &rules(), opts.max_token_len)
}
