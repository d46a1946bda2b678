mod base_change;
mod reduce_gens;
mod schreier_sims;
mod solve;

pub(crate) use schreier_sims::SchreierGeneratorQueue;

use crate::error::{Error, Result};
use crate::math::Order;
use crate::orbits;
use crate::perm::{Perm, PermSet};
use crate::schreier::{SchreierStructure, TransversalVariant, Transversals};

/// How a BSGS is constructed from a generating set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Construction {
    /// Deterministic Schreier-Sims.
    #[default]
    Deterministic,
    /// Randomized Schreier-Sims over product replacement. Monte Carlo, the
    /// confidence is controlled by [`BsgsOptions::random_w`].
    Random,
    /// The solvable-group construction. Fails with `NotSolvable` if the
    /// generators do not generate a solvable group.
    Solve,
}

#[derive(Clone, Debug)]
pub struct BsgsOptions {
    pub construction: Construction,
    pub transversals: TransversalVariant,
    /// Consecutive trivially-stripping random elements required before the
    /// random construction accepts the chain.
    pub random_w: usize,
    /// Product-replacement warm-up rounds.
    pub random_iterations: usize,
    /// Hard cap on random construction attempts, exceeded means
    /// `SchreierSimsDivergence`.
    pub random_attempt_cap: usize,
    /// Fixed seed for the random construction; `None` seeds from entropy.
    pub random_seed: Option<u64>,
}

impl Default for BsgsOptions {
    fn default() -> BsgsOptions {
        BsgsOptions {
            construction: Construction::Deterministic,
            transversals: TransversalVariant::Explicit,
            random_w: 10,
            random_iterations: 20,
            random_attempt_cap: 100_000,
            random_seed: None,
        }
    }
}

/// Base and strong generating set.
///
/// Owns the base points, the strong generators and one Schreier structure
/// per base point; the structures hold their level's stabilizer generators
/// by value and refer to them by index, so no ownership cycles arise.
///
/// Invariants between public operations: no two base points are equal, the
/// strong generators contain no identity, level `i`'s structure is rooted at
/// base point `i` and covers its fundamental orbit, and the group order is
/// the product of the fundamental orbit sizes.
#[derive(Clone, Debug)]
pub struct Bsgs {
    degree: usize,
    base: Vec<usize>,
    strong_generators: PermSet,
    schreier_structures: Vec<Transversals>,
    variant: TransversalVariant,
}

impl Bsgs {
    /// Construct a BSGS for the group generated by `generators` using the
    /// method selected in `options`.
    ///
    /// # Errors
    ///
    /// `DegreeMismatch` if the generators' degree differs from `degree`,
    /// plus the construction-specific errors of [`Construction`].
    pub fn new(degree: usize, generators: PermSet, options: &BsgsOptions) -> Result<Bsgs> {
        if !generators.is_empty() && generators.degree() != degree {
            return Err(Error::DegreeMismatch {
                expected: degree,
                got: generators.degree(),
            });
        }

        let mut bsgs = Bsgs::trivial(degree, options.transversals);

        match options.construction {
            Construction::Deterministic => {
                schreier_sims::schreier_sims(&mut bsgs, generators);
            }
            Construction::Random => {
                schreier_sims::schreier_sims_random(&mut bsgs, generators, options)?;
            }
            Construction::Solve => {
                solve::solve(&mut bsgs, &generators)?;
            }
        }

        Ok(bsgs)
    }

    /// The BSGS of the trivial group at the given degree.
    #[must_use]
    pub fn trivial(degree: usize, variant: TransversalVariant) -> Bsgs {
        assert!(degree >= 1);

        Bsgs {
            degree,
            base: Vec::new(),
            strong_generators: PermSet::new(),
            schreier_structures: Vec::new(),
            variant,
        }
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    #[must_use]
    pub fn base(&self) -> &[usize] {
        &self.base
    }

    #[must_use]
    pub fn base_point(&self, i: usize) -> usize {
        self.base[i]
    }

    #[must_use]
    pub fn base_size(&self) -> usize {
        self.base.len()
    }

    #[must_use]
    pub fn strong_generators(&self) -> &PermSet {
        &self.strong_generators
    }

    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.base.is_empty()
    }

    /// The fundamental orbit at level `i`, root first.
    #[must_use]
    pub fn orbit(&self, i: usize) -> Vec<usize> {
        self.schreier_structures[i].nodes()
    }

    /// The transversal at level `i` mapping the level's base point to `x`.
    #[must_use]
    pub fn transversal(&self, i: usize, x: usize) -> Option<Perm> {
        self.schreier_structures[i].transversal(x)
    }

    /// All transversals of level `i`, in orbit order.
    #[must_use]
    pub fn transversals(&self, i: usize) -> Vec<Perm> {
        self.orbit(i)
            .into_iter()
            .map(|x| {
                self.schreier_structures[i]
                    .transversal(x)
                    .expect("orbit points have transversals")
            })
            .collect()
    }

    /// The level-`i` stabilizer generators as stored in the level's
    /// Schreier structure.
    #[must_use]
    pub fn stabilizers(&self, i: usize) -> &PermSet {
        self.schreier_structures[i].labels()
    }

    pub(crate) fn schreier_structure(&self, i: usize) -> &Transversals {
        &self.schreier_structures[i]
    }

    /// Factor `perm` through the transversals along the base. Returns the
    /// residue and the first level at which stripping stopped
    /// (`base_size() + 1` if it ran through every level).
    #[must_use]
    pub fn strip(&self, perm: &Perm) -> (Perm, usize) {
        assert_eq!(perm.degree(), self.degree, "stripped permutation has group degree");

        let mut residue = perm.clone();

        for (i, &beta) in self.base.iter().enumerate() {
            let image = residue.apply(beta);

            let Some(u) = self.schreier_structures[i].transversal(image) else {
                return (residue, i + 1);
            };

            residue = &residue * &u.inverse();
        }

        (residue, self.base.len() + 1)
    }

    #[must_use]
    pub fn strips_completely(&self, perm: &Perm) -> bool {
        let (residue, level) = self.strip(perm);
        level == self.base_size() + 1 && residue.is_identity()
    }

    /// Membership test for the generated group.
    #[must_use]
    pub fn contains(&self, perm: &Perm) -> bool {
        self.strips_completely(perm)
    }

    /// The group order, the product of the fundamental orbit sizes.
    #[must_use]
    pub fn order(&self) -> Order {
        self.schreier_structures
            .iter()
            .map(|st| Order::from(st.nodes().len()))
            .product()
    }

    // The subset of the strong generators fixing the first `i` base points.
    pub(crate) fn strong_generators_stabilizing(&self, i: usize) -> PermSet {
        self.strong_generators
            .iter()
            .filter(|r#gen| r#gen.stabilizes(self.base[..i].iter().copied()))
            .cloned()
            .collect()
    }

    pub(crate) fn extend_base(&mut self, point: usize) {
        self.extend_base_at(point, self.base.len());
    }

    pub(crate) fn extend_base_at(&mut self, point: usize, i: usize) {
        debug_assert!(!self.base.contains(&point), "base points are distinct");
        self.base.insert(i, point);
    }

    // Recompute level i's structure from the given stabilizer generators,
    // appending a new level if i is one past the end.
    pub(crate) fn update_schreier_structure(&mut self, i: usize, labels: PermSet) {
        let st = orbits::schreier_structure(self.variant, self.degree, self.base[i], labels);

        if i == self.schreier_structures.len() {
            self.schreier_structures.push(st);
        } else {
            self.schreier_structures[i] = st;
        }
    }

    // Insert a structure for a freshly inserted base point, shifting deeper
    // levels down.
    pub(crate) fn insert_schreier_structure(&mut self, i: usize, labels: PermSet) {
        let st = orbits::schreier_structure(self.variant, self.degree, self.base[i], labels);
        self.schreier_structures.insert(i, st);
    }

    pub(crate) fn set_strong_generators(&mut self, generators: PermSet) {
        self.strong_generators = generators;
    }

    // Collect the final strong generating set out of the per-level
    // stabilizer generators.
    pub(crate) fn collect_strong_generators(&mut self) {
        let mut generators = PermSet::new();

        for st in &self.schreier_structures {
            generators.extend(st.labels());
        }

        generators.make_unique();
        self.strong_generators = generators;
    }
}
