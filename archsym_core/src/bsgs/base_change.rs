//! Base change by conjugation and base point transposition.

use log::{debug, trace};

use crate::bsgs::{Bsgs, SchreierGeneratorQueue};
use crate::error::{Error, Result};
use crate::perm::{Perm, PermSet};
use crate::schreier::SchreierStructure;

impl Bsgs {
    /// Make `prefix` the prefix of the base, preserving the group.
    ///
    /// Walks the prefix left to right, accumulating a conjugating
    /// permutation. A target point already in the current level's
    /// fundamental orbit extends the conjugator by the corresponding
    /// transversal; otherwise the point is inserted as a redundant base
    /// point and transposed into place.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if a prefix point lies outside `1..=degree`.
    pub fn base_change(&mut self, prefix: &[usize]) -> Result<()> {
        for &point in prefix {
            if point < 1 || point > self.degree() {
                return Err(Error::OutOfRange {
                    point,
                    degree: self.degree(),
                });
            }
        }

        debug!("changing base {:?} to prefix {prefix:?}", self.base());

        let mut conj = Perm::identity(self.degree());
        let mut conj_inv = Perm::identity(self.degree());

        for (i, &prefix_point) in prefix.iter().enumerate() {
            let target = conj_inv.apply(prefix_point);

            if i >= self.base_size() {
                self.insert_redundant_base_point(target, i);
                trace!("appended {target} to base: {:?}", self.base());
                continue;
            }

            if self.base_point(i) == target {
                continue;
            }

            if self.schreier_structure(i).contains(target) {
                // extend the conjugator so that it maps the base points up
                // to position i onto the prefix
                let transversal = self
                    .schreier_structure(i)
                    .transversal(target)
                    .expect("orbit point has a transversal");

                conj = &transversal * &conj;
                conj_inv = conj.inverse();
            } else {
                let j = self.insert_redundant_base_point(target, i);
                self.transpose_base_point(j, i);
                trace!("base after transposition: {:?}", self.base());
            }
        }

        self.conjugate(&conj);

        debug_assert!(prefix.iter().zip(self.base()).all(|(a, b)| a == b));
        Ok(())
    }

    /// Exchange base points `i` and `i + 1`, rebuilding both levels.
    ///
    /// Level `i` is recomputed directly; level `i + 1` is grown by drawing
    /// level-`i` Schreier generators until its fundamental orbit reaches the
    /// size forced by the order invariant
    /// `|O_i| * |O_{i+1}| = |O_i'| * |O_{i+1}'|`.
    pub fn swap_base_points(&mut self, i: usize) {
        assert!(i + 1 < self.base_size(), "swap position inside the base");

        let sgi = self.stabilizers(i).clone();
        let oi = self.orbit(i);
        let oi1 = self.orbit(i + 1);

        self.base.swap(i, i + 1);

        self.update_schreier_structure(i, sgi);

        let mut sgi1 = self.strong_generators_stabilizing(i + 1);
        self.update_schreier_structure(i + 1, sgi1.clone());

        let target_size = (oi.len() * oi1.len()) / self.orbit(i).len();
        trace!("target size of swapped orbit is {target_size}");

        if self.orbit(i + 1).len() < target_size {
            let mut queue = SchreierGeneratorQueue::new();
            queue.update(self.stabilizers(i), &self.orbit(i), self.schreier_structure(i));

            while let Some(perm) = queue.next() {
                let beta = self.base_point(i + 1);

                if !self.schreier_structure(i + 1).contains(perm.apply(beta)) {
                    sgi1.push(perm);
                    self.update_schreier_structure(i + 1, sgi1.clone());

                    if self.orbit(i + 1).len() >= target_size {
                        break;
                    }
                }
            }
        }

        assert!(
            self.orbit(i + 1).len() >= target_size,
            "orbit size invariant restored by base swap"
        );

        self.strong_generators.extend(&sgi1);
        self.strong_generators.make_unique();
    }

    // Insert bp as a redundant base point at the first admissible position
    // after i_min: right before the first level whose stabilizers already
    // fix it, or at the end of the base.
    pub(crate) fn insert_redundant_base_point(&mut self, bp: usize, i_min: usize) -> usize {
        let mut i = (i_min + 1).min(self.base_size());

        while i < self.base_size() {
            if self.base_point(i) == bp {
                return i;
            }

            let stabilized = self.stabilizers(i - 1).iter().all(|s| s.apply(bp) == bp);
            if stabilized {
                break;
            }

            i += 1;
        }

        let reuse_stabilizers = i < self.base_size();

        let labels = if reuse_stabilizers {
            self.stabilizers(i - 1).clone()
        } else {
            let mut labels = PermSet::new();
            for r#gen in &self.strong_generators {
                if r#gen.stabilizes(self.base[..i].iter().copied()) {
                    labels.push(r#gen.clone());
                }
            }
            labels
        };

        self.extend_base_at(bp, i);
        self.insert_schreier_structure(i, labels);

        i
    }

    // Swap base points downwards until the point at position i sits at j.
    pub(crate) fn transpose_base_point(&mut self, mut i: usize, j: usize) {
        while i > j {
            self.swap_base_points(i - 1);
            i -= 1;
        }
    }

    // Replace the group data by its conjugate under conj: base points map
    // through conj, strong generators become ~conj * g * conj, every level
    // is recomputed.
    pub(crate) fn conjugate(&mut self, conj: &Perm) {
        let conj_inv = conj.inverse();

        for b in &mut self.base {
            *b = conj.apply(*b);
        }

        self.strong_generators = self
            .strong_generators
            .iter()
            .map(|sg| &(&conj_inv * sg) * conj)
            .collect();

        for i in 0..self.base_size() {
            let labels = self.strong_generators_stabilizing(i);
            self.update_schreier_structure(i, labels);
        }
    }
}
