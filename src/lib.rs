//! Redline tracks how a text document evolves across a strictly linear
//! sequence of versions, attributing every contiguous span of the current
//! text to the version - and caller-supplied payload - which last confirmed,
//! introduced or removed it. It's the bookkeeping behind redline / change
//! tracking displays over a document's history.
//!
//! The crate is built around two pieces:
//!
//! 1. The [`Tracker`]: an append-only version history plus a *ledger* - an
//!    ordered, non-overlapping sequence of [`Segment`]s covering the current
//!    text and, at their original positions, every run of text that was ever
//!    removed.
//! 2. The merge engine, which folds each new version's diff into the ledger.
//!    Unchanged spans keep their original owner, inserted spans get the new
//!    version, and deleted spans collapse to zero width but keep their text
//!    forever.
//!
//! Diffing itself is delegated to the [`similar`] crate, wrapped by the
//! adapter in [`diff`].
//!
//! ## Example
//!
//! ```
//! use redline::{SegKind, Tracker};
//!
//! let mut tracker = Tracker::new();
//! tracker.submit("text body", Some("alice")).unwrap();
//! tracker.submit("text 1 body", Some("bob")).unwrap();
//!
//! let segments = tracker.segments();
//! assert_eq!(segments.len(), 3);
//! assert_eq!(segments[1].kind, SegKind::Insert);
//! assert_eq!(segments[1].text, "1 ");
//! assert_eq!(segments[1].payload, Some(&"bob"));
//!
//! assert_eq!(tracker.trace(), "SAME:text :alice,INSERT:1 :bob,SAME:body:alice");
//! ```
//!
//! Deletions stay visible in the ledger with their text intact:
//!
//! ```
//! use redline::Tracker;
//!
//! let mut tracker = Tracker::new();
//! tracker.submit("text", Some(1)).unwrap();
//! tracker.submit("", Some(2)).unwrap();
//! assert_eq!(tracker.trace(), "DELETE:text:2");
//! ```
//!
//! ## Markup
//!
//! Diffing raw HTML tends to tear tags apart. [`CollapseHtml`] swaps each
//! tag or entity for a single stable placeholder character first, so the
//! diff treats a tag as one indivisible unit:
//!
//! ```
//! use redline::{CollapseHtml, Tracker};
//!
//! let mut collapser = CollapseHtml::new();
//! let mut tracker = Tracker::new();
//! tracker.submit(&collapser.collapse("<b>text</b>"), Some(1)).unwrap();
//! tracker.submit(&collapser.collapse("<b>test</b>"), Some(2)).unwrap();
//!
//! let trace = collapser.expand(&tracker.trace());
//! assert_eq!(trace, "SAME:<b>te:1,DELETE:x:2,INSERT:s:2,SAME:t</b>:1");
//! ```
//!
//! Trackers are single-threaded and synchronous. Submitting is the only
//! mutating operation; independent trackers share no state.

pub mod diff;
pub mod html;
mod merge;
pub mod segment;
pub mod tracker;

pub use html::CollapseHtml;
pub use segment::{SegKind, Segment};
pub use tracker::{MalformedSegments, SegmentRef, Tracker, Version};
