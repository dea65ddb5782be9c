// Chunk: docs/chunks/mark_vector - Position-tracking document core

//! Seeded random edit sequences checked against a naive offset model.
//!
//! The model keeps every mark's offset in a plain struct and applies the
//! insert/remove rules one mark at a time. The mark vector must agree with it
//! after every step, including after removals that are immediately undone.

mod common;

use common::init_tracing;
use lite_edit_document::{Bias, Document, MarkChain, MarkId, MarkVector};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
struct ModelMark {
    id: MarkId,
    offset: usize,
    backward: bool,
    compatible: bool,
    sticky: bool,
}

impl ModelMark {
    fn insert(&mut self, at: usize, len: usize) {
        let moves = self.offset > at || (self.offset == at && !self.backward && !self.sticky);
        if moves {
            self.offset += len;
        }
    }

    fn remove(&mut self, at: usize, len: usize) {
        if self.offset > at + len {
            self.offset -= len;
        } else if self.offset > at {
            self.offset = at;
        }
        if at == 0 && self.compatible && self.offset == 0 {
            self.sticky = true;
        }
    }
}

fn check(marks: &MarkVector, model: &[ModelMark], seed: u64, step: usize) {
    for mark in model {
        assert_eq!(
            marks.offset(mark.id).unwrap(),
            mark.offset,
            "seed {} step {}: {:?}",
            seed,
            step,
            mark
        );
    }
    assert_eq!(marks.live_mark_count(), model.len(), "seed {} step {}", seed, step);
}

fn run(seed: u64, steps: usize) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut marks = MarkVector::with_compaction_min(8);
    let mut model: Vec<ModelMark> = Vec::new();
    let mut doc_len = 50usize;

    for step in 0..steps {
        match rng.gen_range(0..10) {
            0 | 1 => {
                let offset = rng.gen_range(0..=doc_len);
                let (id, backward, compatible) = match rng.gen_range(0..3) {
                    0 => (marks.insert_mark(offset, Bias::Forward).unwrap(), false, false),
                    1 => (marks.insert_mark(offset, Bias::Backward).unwrap(), true, false),
                    _ => (marks.insert_compatible_mark(offset).unwrap(), false, true),
                };
                model.push(ModelMark {
                    id,
                    offset,
                    backward,
                    compatible,
                    sticky: compatible && offset == 0,
                });
            }
            2 => {
                if !model.is_empty() {
                    let victim = model.swap_remove(rng.gen_range(0..model.len()));
                    marks.dispose(victim.id).unwrap();
                    assert!(marks.offset(victim.id).is_err());
                }
            }
            3..=5 => {
                let at = rng.gen_range(0..=doc_len);
                let len = rng.gen_range(1..8);
                marks.notify_insert(at, len).unwrap();
                model.iter_mut().for_each(|m| m.insert(at, len));
                doc_len += len;
            }
            6..=8 => {
                if doc_len == 0 {
                    continue;
                }
                let at = rng.gen_range(0..doc_len);
                let len = rng.gen_range(1..=(doc_len - at).min(8));
                let before = model.clone();
                let restores = marks.notify_remove(at, len).unwrap();
                model.iter_mut().for_each(|m| m.remove(at, len));
                doc_len -= len;

                if rng.gen_bool(0.3) {
                    check(&marks, &model, seed, step);
                    marks.notify_insert(at, len).unwrap();
                    marks.restore_marks(at, len, &restores).unwrap();
                    model = before;
                    doc_len += len;
                }
            }
            _ => {
                marks.check_integrity().unwrap();
            }
        }
        check(&marks, &model, seed, step);
    }
    marks.check_integrity().unwrap();
}

#[test]
fn random_edits_match_model() {
    init_tracing();
    for seed in [3, 11, 99, 2024] {
        run(seed, 5_000);
    }
}

#[test]
fn chain_stays_ordered_under_edits() {
    init_tracing();
    let mut rng = SmallRng::seed_from_u64(17);
    let mut marks = MarkVector::new();
    let mut chain = MarkChain::default();
    let mut doc_len = 200usize;

    for _ in 0..3_000 {
        match rng.gen_range(0..5) {
            0 => {
                let pos = rng.gen_range(0..=doc_len);
                chain.toggle_mark(&mut marks, pos).unwrap();
            }
            1 => {
                let pos = rng.gen_range(0..=doc_len);
                let bias = if rng.gen_bool(0.5) {
                    Bias::Forward
                } else {
                    Bias::Backward
                };
                chain
                    .add_mark_with(&mut marks, pos, bias, rng.gen_bool(0.5))
                    .unwrap();
            }
            2 => {
                let at = rng.gen_range(0..=doc_len);
                let len = rng.gen_range(1..10);
                marks.notify_insert(at, len).unwrap();
                doc_len += len;
            }
            3 if doc_len > 0 => {
                let at = rng.gen_range(0..doc_len);
                let len = rng.gen_range(1..=(doc_len - at).min(10));
                let restores = marks.notify_remove(at, len).unwrap();
                chain.normalize(&marks).unwrap();
                if rng.gen_bool(0.3) {
                    marks.notify_insert(at, len).unwrap();
                    marks.restore_marks(at, len, &restores).unwrap();
                    chain.normalize(&marks).unwrap();
                } else {
                    doc_len -= len;
                }
            }
            _ => {
                let pos = rng.gen_range(0..=doc_len);
                let offsets = chain.offsets(&marks).unwrap();
                assert_eq!(chain.is_mark(&marks, pos).unwrap(), offsets.contains(&pos));
            }
        }
        let offsets = chain.offsets(&marks).unwrap();
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]), "{:?}", offsets);
        assert_eq!(offsets.len(), chain.len());

        // Within one offset, nodes that stay put on an insert come first.
        let ranks: Vec<(usize, bool)> = chain
            .iter()
            .zip(&offsets)
            .map(|(entry, offset)| (*offset, marks.bias(entry.mark).unwrap() == Bias::Forward))
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "{:?}", ranks);
    }
    assert_eq!(marks.live_mark_count(), chain.len());
}

#[test]
fn undo_everything_restores_initial_marks() {
    init_tracing();
    let mut rng = SmallRng::seed_from_u64(5);
    let mut doc = Document::from_str(&"line of text\n".repeat(8));
    let initial: Vec<(MarkId, usize)> = (0..40)
        .map(|_| {
            let offset = rng.gen_range(0..=doc.len());
            let bias = if rng.gen_bool(0.5) {
                Bias::Forward
            } else {
                Bias::Backward
            };
            (doc.create_mark(offset, bias).unwrap(), offset)
        })
        .collect();
    let initial_text = doc.text();

    let mut edits = 0;
    for _ in 0..60 {
        if rng.gen_bool(0.5) && !doc.is_empty() {
            let at = rng.gen_range(0..doc.len());
            let len = rng.gen_range(1..=(doc.len() - at).min(15));
            doc.remove(at, len).unwrap();
        } else {
            let at = rng.gen_range(0..=doc.len());
            let text = if rng.gen_bool(0.3) { "a\nb" } else { "xyz" };
            doc.insert_string(at, text).unwrap();
        }
        edits += 1;
        doc.check_integrity().unwrap();
    }
    let edited_text = doc.text();
    let edited: Vec<usize> = initial
        .iter()
        .map(|(mark, _)| doc.mark_offset(*mark).unwrap())
        .collect();
    let edited_lines = doc.line_count();

    for _ in 0..edits {
        assert!(doc.undo().unwrap());
        doc.check_integrity().unwrap();
    }
    assert_eq!(doc.text(), initial_text);
    for (mark, offset) in &initial {
        assert_eq!(doc.mark_offset(*mark).unwrap(), *offset);
    }
    assert_eq!(doc.line_count(), 9);

    while doc.redo().unwrap() {
        doc.check_integrity().unwrap();
    }
    assert_eq!(doc.text(), edited_text);
    assert_eq!(doc.line_count(), edited_lines);
    for ((mark, _), offset) in initial.iter().zip(edited) {
        assert_eq!(doc.mark_offset(*mark).unwrap(), offset);
    }
}
