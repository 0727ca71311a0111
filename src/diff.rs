//! Adapter around the diff engine. Turns an (old text, new text) pair into
//! ordered [`Segment`]s tagged with the submitting version.
//!
//! The raw character diff comes from [`similar`]. Its output is correct but
//! can be noisy - scattered single-char equalities inside what a reader would
//! call one edit - so we run a semantic cleanup pass over it before emitting
//! segments: any equality no longer than the edits on both sides of it gets
//! folded into one coherent delete + insert pair.

use rle::AppendRle;
use similar::utils::TextDiffRemapper;
use similar::{ChangeTag, TextDiff};
use str_indices::chars;

use crate::segment::Segment;

/// Diff `old` against `new`, returning the ordered version segments owned by
/// `version`.
///
/// The returned list satisfies: concatenating Same + Delete spans reproduces
/// `old`, and Same + Insert spans reproduce `new`. Any diff engine meeting
/// that contract could be substituted here.
pub fn version_segments(old: &str, new: &str, version: usize) -> Vec<Segment> {
    let diff = TextDiff::from_chars(old, new);
    let remapper = TextDiffRemapper::from_text_diff(&diff, old, new);

    let pieces = collect_pieces(diff.ops().iter().flat_map(move |x| remapper.iter_slices(x)));
    let pieces = cleanup_semantic(pieces);

    let mut segments: Vec<Segment> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match piece {
            Piece::Equal(text) => {
                segments.push_rle(Segment::same(version, chars::count(&text)));
            }
            Piece::Edit(edit) => {
                // Deletes before inserts, so a replacement reads as one
                // removed run followed by its replacement.
                if !edit.del.is_empty() {
                    segments.push_rle(Segment::delete(version, &edit.del));
                }
                if !edit.ins.is_empty() {
                    segments.push_rle(Segment::insert(version, chars::count(&edit.ins)));
                }
            }
        }
    }
    segments
}

/// A run of removed and/or inserted text at one position.
#[derive(Debug, Default, PartialEq, Eq)]
struct Edit {
    del: String,
    ins: String,
}

impl Edit {
    /// The larger of the two edit lengths, in chars. This is what an interior
    /// equality competes against during cleanup.
    fn weight(&self) -> usize {
        chars::count(&self.del).max(chars::count(&self.ins))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Piece {
    Equal(String),
    Edit(Edit),
}

/// Gather raw (tag, slice) pairs into an alternating Equal / Edit sequence.
/// Adjacent fragments of the same flavour are concatenated as we go.
fn collect_pieces<'a, I: Iterator<Item = (ChangeTag, &'a str)>>(iter: I) -> Vec<Piece> {
    let mut pieces: Vec<Piece> = Vec::new();
    for (tag, text) in iter {
        if text.is_empty() {
            continue;
        }
        match tag {
            ChangeTag::Equal => {
                if !matches!(pieces.last(), Some(Piece::Equal(_))) {
                    pieces.push(Piece::Equal(String::new()));
                }
                let Some(Piece::Equal(run)) = pieces.last_mut() else { unreachable!() };
                run.push_str(text);
            }
            ChangeTag::Delete | ChangeTag::Insert => {
                if !matches!(pieces.last(), Some(Piece::Edit(_))) {
                    pieces.push(Piece::Edit(Edit::default()));
                }
                let Some(Piece::Edit(edit)) = pieces.last_mut() else { unreachable!() };
                if tag == ChangeTag::Delete {
                    edit.del.push_str(text);
                } else {
                    edit.ins.push_str(text);
                }
            }
        }
    }
    pieces
}

/// The semantic cleanup pass. An interior equality which is no longer than
/// the edits flanking it is demoted into those edits: the equality text is
/// appended to both the combined delete and the combined insert, which keeps
/// the old-text and new-text reconstruction contract intact while merging
/// fragmentary edits into coherent spans.
fn cleanup_semantic(mut pieces: Vec<Piece>) -> Vec<Piece> {
    let mut i = 1;
    while i + 1 < pieces.len() {
        let fold = match (&pieces[i - 1], &pieces[i], &pieces[i + 1]) {
            (Piece::Edit(before), Piece::Equal(eq), Piece::Edit(after)) => {
                let eq_len = chars::count(eq);
                eq_len <= before.weight() && eq_len <= after.weight()
            }
            _ => false,
        };

        if fold {
            let after = pieces.remove(i + 1);
            let eq = pieces.remove(i);
            let (Piece::Edit(after), Piece::Equal(eq)) = (after, eq) else { unreachable!() };
            let Piece::Edit(before) = &mut pieces[i - 1] else { unreachable!() };

            before.del.push_str(&eq);
            before.del.push_str(&after.del);
            before.ins.push_str(&eq);
            before.ins.push_str(&after.ins);

            // The merged edit may now flank an earlier equality. Step back
            // and re-examine it.
            i = i.saturating_sub(2).max(1);
        } else {
            i += 1;
        }
    }
    pieces
}

#[cfg(test)]
mod test {
    use rle::HasLength;

    use crate::segment::SegKind;

    use super::*;

    /// Every segment list must replay both sides of the diff.
    fn check_contract(old: &str, new: &str) {
        let segments = version_segments(old, new, 0);
        let old_len: usize = segments
            .iter()
            .filter(|s| s.kind != SegKind::Insert)
            .map(|s| s.len())
            .sum();
        let new_len: usize = segments
            .iter()
            .filter(|s| s.kind != SegKind::Delete)
            .map(|s| s.len())
            .sum();
        assert_eq!(old_len, chars::count(old));
        assert_eq!(new_len, chars::count(new));

        // Delete segments carry exactly as much text as their length claims.
        for seg in &segments {
            if let Some(removed) = seg.deleted_text() {
                assert_eq!(chars::count(removed), seg.len());
            }
        }
    }

    #[test]
    fn simple_insert() {
        let segs = version_segments("text body", "text 1 body", 1);
        assert_eq!(segs, vec![
            Segment::same(1, 5),
            Segment::insert(1, 2),
            Segment::same(1, 4),
        ]);
    }

    #[test]
    fn replace_one_char() {
        let segs = version_segments("text 1 body", "text 2 body", 2);
        assert_eq!(segs, vec![
            Segment::same(2, 5),
            Segment::delete(2, "1"),
            Segment::insert(2, 1),
            Segment::same(2, 5),
        ]);
    }

    #[test]
    fn to_and_from_empty() {
        assert_eq!(version_segments("text", "", 1), vec![Segment::delete(1, "text")]);
        assert_eq!(version_segments("", "text", 1), vec![Segment::insert(1, 4)]);
        assert_eq!(version_segments("", "", 1), vec![]);
    }

    #[test]
    fn identical_text_is_one_same_run() {
        assert_eq!(version_segments("text body", "text body", 4), vec![Segment::same(4, 9)]);
    }

    #[test]
    fn contract_holds() {
        check_contract("text body", "text 1 body");
        check_contract("the quick brown fox", "the slow brown ox");
        check_contract("", "abc");
        check_contract("abc", "");
        check_contract("가b각", "가각");
        check_contract("aaa bbb ccc", "ccc bbb aaa");
    }

    #[test]
    fn cleanup_folds_small_equality() {
        let pieces = vec![
            Piece::Edit(Edit { del: "ab".into(), ins: String::new() }),
            Piece::Equal("cd".into()),
            Piece::Edit(Edit { del: String::new(), ins: "12".into() }),
        ];
        let cleaned = cleanup_semantic(pieces);
        assert_eq!(cleaned, vec![
            Piece::Edit(Edit { del: "abcd".into(), ins: "cd12".into() }),
        ]);
    }

    #[test]
    fn cleanup_keeps_large_equality() {
        let pieces = vec![
            Piece::Edit(Edit { del: "a".into(), ins: String::new() }),
            Piece::Equal("a long stable middle".into()),
            Piece::Edit(Edit { del: String::new(), ins: "b".into() }),
        ];
        let cleaned = cleanup_semantic(pieces);
        assert_eq!(cleaned.len(), 3);
    }
}
