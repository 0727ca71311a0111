//! The tracker owns the version history and the attribution ledger, and is
//! the only public entry point for submitting new text.

use std::error::Error;
use std::fmt::{Display, Formatter, Write as _};

use rle::HasLength;
use str_indices::chars;

use crate::diff;
use crate::merge::fold_segments;
use crate::segment::{SegKind, Segment};

/// Internal consistency violation: after folding a version's diff, live spans
/// of the old ledger were left unconsumed. This signals a defect in the merge
/// engine, or a diff whose offsets don't match the ledger's text - never a
/// problem with the submitted input. A tracker that returned this must not be
/// reused; its ledger state is unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedSegments;

impl Display for MalformedSegments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("malformed segments: old ledger not fully consumed")
    }
}

impl Error for MalformedSegments {}

/// One submitted snapshot: the full document text plus whatever payload the
/// caller wants attributed to spans this version touched. The payload is
/// opaque to the tracker.
#[derive(Debug, Clone)]
pub struct Version<P> {
    text: String,
    payload: Option<P>,
}

impl<P> Version<P> {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }
}

/// A segment of the current ledger with its text materialized, as returned by
/// [`Tracker::segments`]. For Same / Insert segments `text` is a slice of the
/// latest version's text; for Delete segments it's the retained removed text,
/// which contributes nothing to the current document.
#[derive(Debug)]
pub struct SegmentRef<'a, P> {
    pub kind: SegKind,
    /// Span length in chars.
    pub len: usize,
    /// Ordinal of the owning version.
    pub version: usize,
    pub text: &'a str,
    pub payload: Option<&'a P>,
}

/// Tracks a document across a strictly linear sequence of versions.
///
/// Every submission is diffed against the previous version and folded into
/// the ledger: an ordered, non-overlapping segment sequence attributing each
/// span of the current text (and each historically removed run, at its
/// original position) to the version which last confirmed, introduced or
/// removed it.
///
/// ```
/// use redline::Tracker;
///
/// let mut tracker = Tracker::new();
/// tracker.submit("text body", Some(1)).unwrap();
/// tracker.submit("text 1 body", Some(2)).unwrap();
/// assert_eq!(tracker.trace(), "SAME:text :1,INSERT:1 :2,SAME:body:1");
/// ```
#[derive(Debug)]
pub struct Tracker<P> {
    versions: Vec<Version<P>>,

    /// Non-overlapping, contiguous segments over the current text plus its
    /// removed history, in position order.
    ledger: Vec<Segment>,
}

impl<P> Default for Tracker<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Tracker<P> {
    pub fn new() -> Self {
        Tracker { versions: Vec::new(), ledger: Vec::new() }
    }

    /// Append a version and refold the ledger.
    ///
    /// Any text is valid input, including the empty string and text identical
    /// to the previous submission. The error is purely an internal
    /// consistency signal; see [`MalformedSegments`].
    pub fn submit(&mut self, text: &str, payload: Option<P>) -> Result<(), MalformedSegments> {
        let ordinal = self.versions.len();
        if ordinal == 0 {
            // First submission ever. Nothing to diff against - the whole text
            // (if there is any) is one Same span owned by this version.
            let len = chars::count(text);
            if len > 0 {
                self.ledger.push(Segment::same(0, len));
            }
        } else {
            let prev = self.versions[ordinal - 1].text.as_str();
            let incoming = diff::version_segments(prev, text, ordinal);
            let old = std::mem::take(&mut self.ledger);
            self.ledger = fold_segments(old, incoming)?;
        }
        self.versions.push(Version { text: text.to_owned(), payload });
        Ok(())
    }

    /// All submitted versions, in submission order. Append-only.
    pub fn versions(&self) -> &[Version<P>] {
        &self.versions
    }

    /// The current segments with their text materialized, recomputed from the
    /// latest version's text on every call.
    pub fn segments(&self) -> Vec<SegmentRef<'_, P>> {
        let mut rest = self.versions.last().map_or("", |v| v.text.as_str());
        let mut out = Vec::with_capacity(self.ledger.len());
        for seg in &self.ledger {
            let text = match seg.kind {
                SegKind::Delete => seg.deleted_text().unwrap_or(""),
                _ => {
                    // Consume the next `len` chars of the latest text. This
                    // slicing being exact is the reconstruction invariant;
                    // dbg_check() verifies it.
                    let bytes = chars::to_byte_idx(rest, seg.len);
                    let (head, tail) = rest.split_at(bytes);
                    rest = tail;
                    head
                }
            };
            out.push(SegmentRef {
                kind: seg.kind,
                len: seg.len,
                version: seg.version,
                text,
                payload: self.versions[seg.version].payload.as_ref(),
            });
        }
        out
    }

    /// Diagnostic serialization: comma-joined `KIND:text:payload` entries,
    /// with Delete segments rendering their retained removed text and a
    /// missing payload rendering as the empty string. There is deliberately
    /// no outer bracketing or escaping - this matches the historical trace
    /// format exactly, and it's a debugging aid, not a stable wire format.
    pub fn trace(&self) -> String
    where
        P: Display,
    {
        let mut out = String::new();
        for (i, seg) in self.segments().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write!(out, "{}:{}:", seg.kind, seg.text).unwrap();
            if let Some(payload) = seg.payload {
                write!(out, "{payload}").unwrap();
            }
        }
        out
    }

    /// Check the ledger invariants. This is exported for testing - you
    /// shouldn't have any reason to call it, and it panics on violation
    /// rather than returning an error.
    pub fn dbg_check(&self) {
        let latest = self.versions.last().map_or("", |v| v.text.as_str());

        let live_len: usize = self
            .ledger
            .iter()
            .filter(|s| s.kind != SegKind::Delete)
            .map(|s| s.len())
            .sum();
        assert_eq!(live_len, chars::count(latest));

        for seg in &self.ledger {
            assert!(seg.len > 0, "zero length segment in ledger");
            assert!(seg.version < self.versions.len());
            match seg.kind {
                SegKind::Delete => {
                    let removed = seg.deleted_text().expect("delete segment without text");
                    assert_eq!(chars::count(removed), seg.len);
                }
                _ => assert!(seg.deleted.is_none()),
            }
        }

        // Materializing the non-delete segments must reproduce the latest
        // text exactly.
        let rebuilt: String = self
            .segments()
            .iter()
            .filter(|s| s.kind != SegKind::Delete)
            .map(|s| s.text)
            .collect();
        assert_eq!(rebuilt, latest);
    }
}
