//! The attribution unit. A [`Segment`] covers a contiguous run of the document
//! (or a historically removed run) and names the version which last touched it.

use std::fmt::{Display, Formatter};

use rle::{HasLength, MergableSpan, SplitableSpanHelpers};
use smartstring::alias::String as SmartString;
use str_indices::chars;

/// What a segment says about its span: unchanged since the owning version,
/// introduced by it, or removed by it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SegKind {
    Same,
    Insert,
    Delete,
}

impl Display for SegKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SegKind::Same => "SAME",
            SegKind::Insert => "INSERT",
            SegKind::Delete => "DELETE",
        })
    }
}

/// One span in the attribution ledger.
///
/// Lengths are counted in chars, not bytes. For [`SegKind::Delete`] the length
/// counts the removed run - which takes no space in the current text - and the
/// removed text itself is retained verbatim in `deleted`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Segment {
    pub kind: SegKind,

    /// Ordinal of the owning version in the tracker's history.
    pub version: usize,

    /// Span length in chars.
    pub len: usize,

    /// The removed text. Present iff `kind == Delete`, and always `len` chars
    /// long.
    pub deleted: Option<SmartString>,
}

impl Segment {
    pub fn same(version: usize, len: usize) -> Self {
        Segment { kind: SegKind::Same, version, len, deleted: None }
    }

    pub fn insert(version: usize, len: usize) -> Self {
        Segment { kind: SegKind::Insert, version, len, deleted: None }
    }

    pub fn delete(version: usize, removed: &str) -> Self {
        Segment {
            kind: SegKind::Delete,
            version,
            len: chars::count(removed),
            deleted: Some(removed.into()),
        }
    }

    pub fn deleted_text(&self) -> Option<&str> {
        self.deleted.as_deref()
    }
}

impl HasLength for Segment {
    fn len(&self) -> usize {
        self.len
    }
}

impl SplitableSpanHelpers for Segment {
    fn truncate_h(&mut self, at: usize) -> Self {
        let rem_deleted = self.deleted.as_mut().map(|d| {
            let byte_split = chars::to_byte_idx(d.as_str(), at);
            d.split_off(byte_split)
        });

        let remainder = Segment {
            kind: self.kind,
            version: self.version,
            len: self.len - at,
            deleted: rem_deleted,
        };
        self.len = at;
        remainder
    }
}

impl MergableSpan for Segment {
    fn can_append(&self, other: &Self) -> bool {
        self.kind == other.kind && self.version == other.version
    }

    fn append(&mut self, other: Self) {
        self.len += other.len;
        if let Some(d) = &mut self.deleted {
            d.push_str(other.deleted.as_ref().unwrap().as_str());
        }
    }
}
