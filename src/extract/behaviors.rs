//! Post-pass for class and protocol pages.

use tracing::debug;

use crate::sections::{Level, SectionId, SectionTree};

/// Re-home every minor section as a major directly under the root.
///
/// One doc generation marks each method's section a level deeper than the
/// grouping the rest of the pipeline expects, so after parsing, the minors
/// are the sections that should stand as majors. A former parent keeps the
/// range up to its first promoted child, which preserves sibling
/// disjointness; root children end up re-sorted into document order.
pub fn promote_minors(tree: &mut SectionTree) {
    let root_kids: Vec<SectionId> = tree.children(SectionTree::ROOT).collect();
    let mut promoted: Vec<SectionId> = Vec::new();

    for id in root_kids {
        if tree.get(id).level == Level::Minor {
            // Already a root child, only its level needs lifting.
            tree.get_mut(id).level = Level::Major;
            continue;
        }
        let minors = tree.get(id).children.clone();
        if minors.is_empty() {
            continue;
        }
        let first_start = tree.get(minors[0]).start;
        let parent = tree.get_mut(id);
        parent.children.clear();
        parent.end = first_start;
        for m in minors {
            let node = tree.get_mut(m);
            node.level = Level::Major;
            node.parent = Some(SectionTree::ROOT);
            promoted.push(m);
        }
    }

    if promoted.is_empty() {
        return;
    }
    debug!("promoted {} minor sections to majors", promoted.len());
    let mut kids = std::mem::take(&mut tree.get_mut(SectionTree::ROOT).children);
    kids.extend(promoted);
    kids.sort_by_key(|id| tree.get(*id).start);
    tree.get_mut(SectionTree::ROOT).children = kids;
}
