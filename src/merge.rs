//! The merge engine. Folds one version's diff segments into the existing
//! ledger, producing the next ledger.
//!
//! The ledger and the incoming segments are walked in lockstep. Old Delete
//! segments are pure history - they take up no space in the coordinate space
//! the diff measured - so they're drained straight through before any length
//! comparison happens. Everything else is a three-way comparison between the
//! head incoming segment and the head old segment: equal lengths consume
//! both, a shorter incoming segment splits the old one, and a longer one
//! consumes the old segment whole and retries with what's left.

use rle::{HasLength, SplitableSpan};

use crate::segment::{SegKind, Segment};
use crate::tracker::MalformedSegments;

/// Fold `incoming` (the new version's diff, in order) over `old` (the
/// current ledger, in order) into the next ledger.
pub(crate) fn fold_segments(
    old: Vec<Segment>,
    incoming: Vec<Segment>,
) -> Result<Vec<Segment>, MalformedSegments> {
    let mut out = Vec::with_capacity(old.len() + incoming.len());
    let mut rest = old.into_iter();
    let mut head = rest.next();

    for mut v in incoming {
        match v.kind {
            SegKind::Insert => {
                drain_deletes(&mut head, &mut rest, &mut out);
                // Inserted text is always novel. It has no footprint in the
                // old coordinate space, so the old head stays where it is.
                out.push(v);
            }
            SegKind::Same => {
                while v.len() > 0 {
                    drain_deletes(&mut head, &mut rest, &mut out);
                    let Some(o_len) = head.as_ref().map(|o| o.len()) else {
                        // Old ledger exhausted. Keep the unmatched remainder
                        // as-is rather than comparing against nothing.
                        out.push(v);
                        break;
                    };
                    if v.len() < o_len {
                        // The diff boundary falls inside the old segment.
                        // Split it; both halves keep their type and owner.
                        let confirmed = head.as_mut().unwrap().truncate_keeping_right(v.len());
                        out.push(confirmed);
                        break;
                    } else {
                        // The old segment is confirmed unchanged wholesale.
                        out.push(head.take().unwrap());
                        head = rest.next();
                        if v.len() == o_len {
                            break;
                        }
                        v.truncate_keeping_right(o_len);
                    }
                }
            }
            SegKind::Delete => {
                while v.len() > 0 {
                    drain_deletes(&mut head, &mut rest, &mut out);
                    let Some(o_len) = head.as_ref().map(|o| o.len()) else {
                        out.push(v);
                        break;
                    };
                    if v.len() < o_len {
                        // Only a prefix of the old segment was removed. The
                        // delete takes its place; the rest stays live.
                        head.as_mut().unwrap().truncate_keeping_right(v.len());
                        out.push(v);
                        break;
                    } else if v.len() == o_len {
                        head = rest.next();
                        out.push(v);
                        break;
                    } else {
                        // The deletion spans several old segments. Emit one
                        // delete chunk per old segment, slicing off the
                        // matching prefix of the removed text, so the old
                        // attribution boundaries stay visible in history.
                        let chunk = v.truncate_keeping_right(o_len);
                        out.push(chunk);
                        head = rest.next();
                    }
                }
            }
        }
    }

    // Old deletes past the end of the new content are history we keep.
    drain_deletes(&mut head, &mut rest, &mut out);

    // A live old span the fold never consumed means the diff and the ledger
    // disagree about the previous text. Refuse to drop history silently.
    if head.is_some() {
        return Err(MalformedSegments);
    }
    Ok(out)
}

fn drain_deletes(
    head: &mut Option<Segment>,
    rest: &mut std::vec::IntoIter<Segment>,
    out: &mut Vec<Segment>,
) {
    while head.as_ref().map_or(false, |o| o.kind == SegKind::Delete) {
        out.push(head.take().unwrap());
        *head = rest.next();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_confirms_old_segment() {
        let old = vec![Segment::same(0, 4)];
        let next = fold_segments(old, vec![Segment::same(1, 4)]).unwrap();
        assert_eq!(next, vec![Segment::same(0, 4)]);
    }

    #[test]
    fn same_splits_old_segment() {
        // A shorter Same run splits the old span; both halves keep owner 0.
        let old = vec![Segment::same(0, 6)];
        let next = fold_segments(old, vec![
            Segment::same(1, 2),
            Segment::insert(1, 1),
            Segment::same(1, 4),
        ]).unwrap();
        assert_eq!(next, vec![
            Segment::same(0, 2),
            Segment::insert(1, 1),
            Segment::same(0, 4),
        ]);
    }

    #[test]
    fn same_spans_multiple_old_segments() {
        let old = vec![Segment::same(0, 2), Segment::insert(1, 3)];
        let next = fold_segments(old, vec![Segment::same(2, 5)]).unwrap();
        assert_eq!(next, vec![Segment::same(0, 2), Segment::insert(1, 3)]);
    }

    #[test]
    fn insert_leaves_old_head_in_place() {
        let old = vec![Segment::same(0, 3)];
        let next = fold_segments(old, vec![
            Segment::insert(1, 2),
            Segment::same(1, 3),
        ]).unwrap();
        assert_eq!(next, vec![Segment::insert(1, 2), Segment::same(0, 3)]);
    }

    #[test]
    fn delete_replaces_old_segment() {
        let old = vec![Segment::same(0, 4)];
        let next = fold_segments(old, vec![Segment::delete(1, "text")]).unwrap();
        assert_eq!(next, vec![Segment::delete(1, "text")]);
    }

    #[test]
    fn delete_splits_old_segment() {
        let old = vec![Segment::same(0, 4)];
        let next = fold_segments(old, vec![
            Segment::delete(1, "ab"),
            Segment::same(1, 2),
        ]).unwrap();
        assert_eq!(next, vec![Segment::delete(1, "ab"), Segment::same(0, 2)]);
    }

    #[test]
    fn delete_spanning_old_segments_stays_chunked() {
        // One deletion covering two old inserts keeps two delete segments,
        // each carrying the matching slice of removed text.
        let old = vec![
            Segment::same(0, 4),
            Segment::insert(1, 2),
            Segment::insert(2, 2),
        ];
        let next = fold_segments(old, vec![
            Segment::same(3, 4),
            Segment::delete(3, " 1 2"),
        ]).unwrap();
        assert_eq!(next, vec![
            Segment::same(0, 4),
            Segment::delete(3, " 1"),
            Segment::delete(3, " 2"),
        ]);
    }

    #[test]
    fn old_deletes_drain_first() {
        // Zero-width history never takes part in length comparisons.
        let old = vec![
            Segment::same(0, 2),
            Segment::delete(1, "xx"),
            Segment::same(0, 2),
        ];
        let next = fold_segments(old.clone(), vec![Segment::same(2, 4)]).unwrap();
        assert_eq!(next, old);
    }

    #[test]
    fn trailing_old_deletes_are_kept() {
        let old = vec![Segment::same(0, 1), Segment::delete(1, "b")];
        let next = fold_segments(old, vec![Segment::same(2, 1)]).unwrap();
        assert_eq!(next, vec![Segment::same(0, 1), Segment::delete(1, "b")]);
    }

    #[test]
    fn incoming_past_old_end_is_appended() {
        let next = fold_segments(vec![], vec![Segment::insert(1, 4)]).unwrap();
        assert_eq!(next, vec![Segment::insert(1, 4)]);

        let next = fold_segments(vec![Segment::same(0, 1)], vec![
            Segment::same(1, 1),
            Segment::insert(1, 2),
        ]).unwrap();
        assert_eq!(next, vec![Segment::same(0, 1), Segment::insert(1, 2)]);
    }

    #[test]
    fn unconsumed_live_span_is_malformed() {
        let old = vec![Segment::same(0, 4)];
        assert_eq!(
            fold_segments(old, vec![Segment::same(1, 2)]),
            Err(MalformedSegments)
        );
    }
}
