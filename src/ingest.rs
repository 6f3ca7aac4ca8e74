//! Sequential driver over a corpus of already-loaded doc files. File
//! discovery, I/O, and encoding detection belong to the caller.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ParseError;
use crate::extract::{DocKind, NameRecord};
use crate::process_doc;
use crate::sections::ParsedDoc;

/// One documentation file, loaded into memory by the caller.
#[derive(Debug, Clone)]
pub struct DocSource {
    pub path: String,
    pub kind: DocKind,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct ParsedEntry {
    pub path: String,
    pub kind: DocKind,
    pub doc: ParsedDoc,
    pub names: Vec<NameRecord>,
}

#[derive(Debug)]
pub struct FailedEntry {
    pub path: String,
    pub error: ParseError,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub files: usize,
    pub parsed: usize,
    pub failed: usize,
    pub sections: usize,
    pub names: usize,
    pub anomalies: usize,
}

#[derive(Debug)]
pub struct IngestReport {
    pub entries: Vec<ParsedEntry>,
    pub failures: Vec<FailedEntry>,
    pub stats: Stats,
}

impl IngestReport {
    /// JSON summary of every anomaly in the run, keyed by file path, for
    /// storage alongside the parsed records. None when the run was clean.
    pub fn anomaly_extras(&self) -> Option<String> {
        let noisy: Vec<_> = self
            .entries
            .iter()
            .filter(|e| !e.doc.anomalies.is_empty())
            .map(|e| serde_json::json!({ "path": e.path, "anomalies": e.doc.anomalies }))
            .collect();
        if noisy.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&noisy).unwrap_or_default())
        }
    }
}

/// Parse every file in order, one at a time. A file that fails is reported
/// and skipped; the run always continues to the end.
pub fn ingest_all(files: &[DocSource]) -> IngestReport {
    let mut entries = Vec::new();
    let mut failures = Vec::new();
    let mut stats = Stats {
        files: files.len(),
        ..Stats::default()
    };

    for src in files {
        match process_doc(&src.bytes, src.kind) {
            Ok((doc, names)) => {
                debug!(
                    "{}: {} sections, {} names, {} anomalies",
                    src.path,
                    doc.tree.len(),
                    names.len(),
                    doc.anomalies.len()
                );
                stats.parsed += 1;
                stats.sections += doc.tree.len();
                stats.names += names.len();
                stats.anomalies += doc.anomalies.len();
                entries.push(ParsedEntry {
                    path: src.path.clone(),
                    kind: src.kind,
                    doc,
                    names,
                });
            }
            Err(e) => {
                warn!("skipping {}: {}", src.path, e);
                stats.failed += 1;
                failures.push(FailedEntry {
                    path: src.path.clone(),
                    error: e,
                });
            }
        }
    }

    info!(
        "ingested {} files: {} parsed, {} failed",
        stats.files, stats.parsed, stats.failed
    );
    IngestReport {
        entries,
        failures,
        stats,
    }
}

// ── Tests ──
