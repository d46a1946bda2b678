//! Schreier-Sims construction, deterministic and randomized.

use fxhash::FxHashMap;
use log::{debug, trace};

use crate::bsgs::{Bsgs, BsgsOptions};
use crate::error::{Error, Result};
use crate::perm::{Perm, PermSet};
use crate::pr_randomizer::PrRandomizer;
use crate::schreier::{SchreierStructure, Transversals};

/// Lazy sequence of Schreier generators `u_beta * g * ~u_{g(beta)}` over the
/// cartesian product of a fundamental orbit and its stabilizer generators,
/// with trivial results skipped.
///
/// The queue snapshots orbit, generators and transversals at `update` time;
/// after `invalidate` the next `update` re-snapshots and restarts, otherwise
/// iteration resumes where it left off.
pub(crate) struct SchreierGeneratorQueue {
    gens: Vec<Perm>,
    orbit: Vec<usize>,
    transversals: FxHashMap<usize, Perm>,
    beta_idx: usize,
    gen_idx: usize,
    valid: bool,
}

impl SchreierGeneratorQueue {
    pub(crate) fn new() -> SchreierGeneratorQueue {
        SchreierGeneratorQueue {
            gens: Vec::new(),
            orbit: Vec::new(),
            transversals: FxHashMap::default(),
            beta_idx: 0,
            gen_idx: 0,
            valid: false,
        }
    }

    pub(crate) fn update(&mut self, gens: &PermSet, orbit: &[usize], st: &Transversals) {
        if self.valid {
            return;
        }

        self.gens = gens.iter().cloned().collect();
        self.orbit = orbit.to_vec();
        self.transversals = orbit
            .iter()
            .map(|&x| {
                (
                    x,
                    st.transversal(x).expect("orbit points have transversals"),
                )
            })
            .collect();
        self.beta_idx = 0;
        self.gen_idx = 0;
        self.valid = true;
    }

    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
    }

    pub(crate) fn next(&mut self) -> Option<Perm> {
        if self.gens.is_empty() {
            return None;
        }

        loop {
            if self.beta_idx >= self.orbit.len() {
                return None;
            }

            let beta = self.orbit[self.beta_idx];
            let r#gen = &self.gens[self.gen_idx];

            let u_beta = &self.transversals[&beta];
            let u_image = &self.transversals[&r#gen.apply(beta)];
            let schreier_generator = &(u_beta * r#gen) * &u_image.inverse();

            self.gen_idx += 1;
            if self.gen_idx == self.gens.len() {
                self.gen_idx = 0;
                self.beta_idx += 1;
            }

            if !schreier_generator.is_identity() {
                return Some(schreier_generator);
            }
        }
    }
}

// Drop identity generators, make sure no generator fixes the whole base
// (extending the base where necessary) and compute the initial per-level
// stabilizer sets, orbits and Schreier structures.
fn schreier_sims_init(
    bsgs: &mut Bsgs,
    generators: PermSet,
) -> (Vec<PermSet>, Vec<Vec<usize>>) {
    let mut kept = PermSet::new();
    for r#gen in &generators {
        if !r#gen.is_identity() {
            kept.push(r#gen.clone());
        }
    }
    bsgs.set_strong_generators(kept);

    let gens: Vec<Perm> = bsgs.strong_generators().iter().cloned().collect();
    for r#gen in &gens {
        if r#gen.stabilizes(bsgs.base().iter().copied()) {
            let point = (1..=bsgs.degree())
                .find(|&p| r#gen.apply(p) != p)
                .expect("non-identity generators move a point");
            bsgs.extend_base(point);
        }
    }

    let mut strong_generators = Vec::with_capacity(bsgs.base_size());
    let mut fundamental_orbits = Vec::with_capacity(bsgs.base_size());

    for i in 0..bsgs.base_size() {
        let si = bsgs.strong_generators_stabilizing(i);
        bsgs.update_schreier_structure(i, si.clone());
        strong_generators.push(si);
        fundamental_orbits.push(bsgs.orbit(i));
    }

    debug!(
        "schreier sims init: base {:?}, {} generators",
        bsgs.base(),
        bsgs.strong_generators().len()
    );

    (strong_generators, fundamental_orbits)
}

// Append a base point moved by residue; residue fixes every current base
// point here, so its support is disjoint from the base.
fn extend_base_for_residue(bsgs: &mut Bsgs, residue: &Perm) {
    let point = (1..=bsgs.degree())
        .find(|&p| !bsgs.base().contains(&p) && residue.apply(p) != p)
        .expect("non-identity residue moves a point outside the base");

    trace!("adjoining base point {point}");
    bsgs.extend_base(point);
}

/// Deterministic Schreier-Sims: climb levels from the deepest up, draining
/// each level's Schreier generator queue, extending the strong generators
/// with non-trivial strip residues.
pub(crate) fn schreier_sims(bsgs: &mut Bsgs, generators: PermSet) {
    let (mut strong_generators, mut fundamental_orbits) = schreier_sims_init(bsgs, generators);

    let mut queues: Vec<SchreierGeneratorQueue> = (0..bsgs.base_size())
        .map(|_| SchreierGeneratorQueue::new())
        .collect();

    let mut i = bsgs.base_size();

    'level: while i >= 1 {
        queues[i - 1].update(
            &strong_generators[i - 1],
            &fundamental_orbits[i - 1],
            bsgs.schreier_structure(i - 1),
        );

        while let Some(schreier_generator) = queues[i - 1].next() {
            let (residue, strip_level) = bsgs.strip(&schreier_generator);

            if strip_level <= bsgs.base_size() || !residue.is_identity() {
                trace!("residue {residue} at level {strip_level}");

                if strip_level == bsgs.base_size() + 1 {
                    extend_base_for_residue(bsgs, &residue);
                    strong_generators.push(PermSet::new());
                    fundamental_orbits.push(Vec::new());
                    queues.push(SchreierGeneratorQueue::new());
                }

                for j in i..strip_level {
                    strong_generators[j].push(residue.clone());
                    bsgs.update_schreier_structure(j, strong_generators[j].clone());
                    fundamental_orbits[j] = bsgs.orbit(j);
                    queues[j].invalidate();
                }

                i = strip_level;
                continue 'level;
            }
        }

        i -= 1;
    }

    bsgs.collect_strong_generators();

    debug!(
        "schreier sims done: base {:?}, order {}",
        bsgs.base(),
        bsgs.order()
    );
}

/// Randomized Schreier-Sims: strip consecutive product-replacement elements
/// until `random_w` of them in a row strip to the identity.
pub(crate) fn schreier_sims_random(
    bsgs: &mut Bsgs,
    generators: PermSet,
    options: &BsgsOptions,
) -> Result<()> {
    let (mut strong_generators, mut fundamental_orbits) = schreier_sims_init(bsgs, generators);

    if bsgs.base_size() == 0 {
        bsgs.collect_strong_generators();
        return Ok(());
    }

    let rng = match options.random_seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let mut pr = PrRandomizer::with_rng(bsgs.strong_generators(), rng, options.random_iterations);

    let mut consecutive = 0;
    let mut attempts = 0;

    while consecutive < options.random_w {
        attempts += 1;
        if attempts > options.random_attempt_cap {
            return Err(Error::SchreierSimsDivergence {
                attempts: options.random_attempt_cap,
            });
        }

        let element = pr.next();
        let (residue, strip_level) = bsgs.strip(&element);

        if strip_level <= bsgs.base_size() || !residue.is_identity() {
            trace!("random element {element} leaves residue {residue} at level {strip_level}");

            if strip_level == bsgs.base_size() + 1 {
                extend_base_for_residue(bsgs, &residue);
                strong_generators.push(PermSet::new());
                fundamental_orbits.push(Vec::new());
            }

            // the first fundamental orbit is complete from initialization,
            // residues always strip through at least one level
            debug_assert!(strip_level >= 2);

            for j in 1..strip_level {
                strong_generators[j].push(residue.clone());
                bsgs.update_schreier_structure(j, strong_generators[j].clone());
                fundamental_orbits[j] = bsgs.orbit(j);
            }

            consecutive = 0;
        } else {
            consecutive += 1;
        }
    }

    bsgs.collect_strong_generators();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SchreierGeneratorQueue;
    use crate::bsgs::{Bsgs, BsgsOptions, Construction};
    use crate::orbits;
    use crate::perm::{Perm, PermSet};
    use crate::schreier::TransversalVariant;

    #[test_log::test]
    fn base_and_strong_generators_for_five_point_group() {
        let generators = PermSet::from_perms([
            Perm::from_cycles(5, &[vec![1, 2, 4, 3]]).unwrap(),
            Perm::from_cycles(5, &[vec![1, 2, 5, 4]]).unwrap(),
        ])
        .unwrap();

        let bsgs = Bsgs::new(5, generators, &BsgsOptions::default()).unwrap();

        assert_eq!(bsgs.base()[..2], [1, 2]);
        assert_eq!(bsgs.order().to_u64(), 20);

        // every strong generator is a group member
        for r#gen in bsgs.strong_generators() {
            assert!(bsgs.contains(r#gen));
        }
    }

    #[test_log::test]
    fn queue_yields_stabilizing_generators() {
        let labels = PermSet::from_perms([
            Perm::from_cycles(4, &[vec![1, 2, 3, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 3]]).unwrap(),
        ])
        .unwrap();

        let st = orbits::schreier_structure(TransversalVariant::Explicit, 4, 1, labels.clone());
        let orbit = vec![1, 2, 3, 4];

        let mut queue = SchreierGeneratorQueue::new();
        queue.update(&labels, &orbit, &st);

        let mut count = 0;
        while let Some(sg) = queue.next() {
            // Schreier generators stabilize the root
            assert_eq!(sg.apply(1), 1);
            assert!(!sg.is_identity());
            count += 1;
        }

        assert!(count > 0);
        assert!(count <= orbit.len() * labels.len());
    }

    #[test_log::test]
    fn queue_resumes_unless_invalidated() {
        let labels =
            PermSet::from_perms([Perm::from_cycles(3, &[vec![1, 2, 3]]).unwrap()]).unwrap();
        let st = orbits::schreier_structure(TransversalVariant::Explicit, 3, 1, labels.clone());
        let orbit = vec![1, 2, 3];

        let mut queue = SchreierGeneratorQueue::new();
        queue.update(&labels, &orbit, &st);

        let first = queue.next();

        // a second update without invalidation must not restart the walk
        queue.update(&labels, &orbit, &st);
        let second = queue.next();
        assert!(first.is_some() || second.is_none());

        queue.invalidate();
        queue.update(&labels, &orbit, &st);
        let restarted = queue.next();
        assert_eq!(first.is_some(), restarted.is_some());
    }

    #[test_log::test]
    fn random_construction_handles_larger_groups() {
        // S_5 from its canonical generators
        let generators = PermSet::from_perms([
            Perm::from_cycles(5, &[vec![1, 2]]).unwrap(),
            Perm::from_cycles(5, &[vec![1, 2, 3, 4, 5]]).unwrap(),
        ])
        .unwrap();

        let options = BsgsOptions {
            construction: Construction::Random,
            random_seed: Some(99),
            random_w: 15,
            ..BsgsOptions::default()
        };

        let bsgs = Bsgs::new(5, generators, &options).unwrap();

        assert_eq!(bsgs.order().to_u64(), 120);
    }
}
