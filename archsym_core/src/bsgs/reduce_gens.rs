//! Removal of redundant strong generators.

use fxhash::FxHashSet;
use log::{debug, trace};

use crate::bsgs::Bsgs;
use crate::perm::Perm;

impl Bsgs {
    /// Drop strong generators that are redundant for every fundamental
    /// orbit.
    ///
    /// Walks the stabilizer chain from the deepest level up; a generator
    /// appearing at level `i` but not at level `i + 1` may go if the
    /// remaining level-`i` stabilizers still span the level's fundamental
    /// orbit. Schreier structures are redetermined from the surviving set.
    pub fn reduce_generators(&mut self) {
        if self.base_size() == 0 {
            return;
        }

        debug!(
            "reducing {} strong generators over base {:?}",
            self.strong_generators.len(),
            self.base()
        );

        let mut strong_generator_set: FxHashSet<Perm> =
            self.strong_generators.iter().cloned().collect();

        let mut stabilizer_set: FxHashSet<Perm> = FxHashSet::default();

        for i in (0..self.base_size()).rev() {
            let stabilizer_set_next: FxHashSet<Perm> = self
                .stabilizers(i)
                .iter()
                .filter(|p| strong_generator_set.contains(*p))
                .cloned()
                .collect();

            // generators entering the chain exactly at level i
            let stabilizer_intersection: Vec<Perm> = stabilizer_set_next
                .iter()
                .filter(|p| !stabilizer_set.contains(p) && strong_generator_set.contains(*p))
                .cloned()
                .collect();

            stabilizer_set = stabilizer_set_next;

            if stabilizer_intersection.len() < 2 {
                continue;
            }

            for candidate in stabilizer_intersection {
                if !stabilizer_set.contains(&candidate) {
                    continue;
                }

                let mut orbit_gens = stabilizer_set.clone();
                orbit_gens.remove(&candidate);

                if self.produces_orbit(self.base_point(i), &orbit_gens, &self.orbit(i)) {
                    trace!("removing redundant strong generator {candidate}");
                    strong_generator_set.remove(&candidate);
                    stabilizer_set.remove(&candidate);
                }
            }
        }

        self.strong_generators = self
            .strong_generators
            .iter()
            .filter(|p| strong_generator_set.contains(*p))
            .cloned()
            .collect();
        self.strong_generators.make_unique();

        for i in 0..self.base_size() {
            let labels = self.strong_generators_stabilizing(i);
            self.update_schreier_structure(i, labels);
        }
    }

    // Whether the orbit of root under the given generators equals
    // orbit_ref; bails out early if a point outside orbit_ref is reached.
    fn produces_orbit(
        &self,
        root: usize,
        generators: &FxHashSet<Perm>,
        orbit_ref: &[usize],
    ) -> bool {
        let mut in_orbit_ref = vec![false; self.degree() + 1];
        for &x in orbit_ref {
            in_orbit_ref[x] = true;
        }

        if !in_orbit_ref[root] {
            return false;
        }

        let mut in_orbit = vec![false; self.degree() + 1];
        in_orbit[root] = true;

        let mut queue = vec![root];
        let mut remaining = orbit_ref.len() - 1;

        if remaining == 0 {
            return true;
        }

        while let Some(x) = queue.pop() {
            for r#gen in generators {
                let y = r#gen.apply(x);

                if !in_orbit_ref[y] {
                    return false;
                }

                if !in_orbit[y] {
                    in_orbit[y] = true;
                    queue.push(y);

                    remaining -= 1;
                    if remaining == 0 {
                        return true;
                    }
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use crate::bsgs::{Bsgs, BsgsOptions};
    use crate::perm::{Perm, PermSet};

    #[test]
    fn reduction_preserves_order_and_membership() {
        // S_4 with a deliberately redundant generating set
        let generators = PermSet::from_perms([
            Perm::from_cycles(4, &[vec![1, 2]]).unwrap(),
            Perm::from_cycles(4, &[vec![2, 3]]).unwrap(),
            Perm::from_cycles(4, &[vec![3, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 2, 3, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 3]]).unwrap(),
            Perm::from_cycles(4, &[vec![2, 4]]).unwrap(),
        ])
        .unwrap();

        let mut bsgs = Bsgs::new(4, generators, &BsgsOptions::default()).unwrap();
        let generators_before = bsgs.strong_generators().len();

        bsgs.reduce_generators();

        assert_eq!(bsgs.order().to_u64(), 24);
        assert!(bsgs.strong_generators().len() <= generators_before);

        assert!(bsgs.contains(&Perm::from_cycles(4, &[vec![1, 4]]).unwrap()));
        assert!(bsgs.contains(&Perm::from_cycles(4, &[vec![1, 4, 2]]).unwrap()));
    }

    #[test]
    fn reduction_of_trivial_group_is_a_no_op() {
        let mut bsgs = Bsgs::new(3, PermSet::new(), &BsgsOptions::default()).unwrap();
        bsgs.reduce_generators();

        assert_eq!(bsgs.order().to_u64(), 1);
    }

    #[test]
    fn fundamental_orbits_survive_reduction() {
        let generators = PermSet::from_perms([
            Perm::from_cycles(6, &[vec![1, 2, 3, 4, 5, 6]]).unwrap(),
            Perm::from_cycles(6, &[vec![2, 6], vec![3, 5]]).unwrap(),
        ])
        .unwrap();

        let mut bsgs = Bsgs::new(6, generators, &BsgsOptions::default()).unwrap();
        let orbits_before: Vec<Vec<usize>> =
            (0..bsgs.base_size()).map(|i| bsgs.orbit(i)).collect();
        let order_before = bsgs.order();

        bsgs.reduce_generators();

        assert_eq!(bsgs.order(), order_before);
        for (i, orbit) in orbits_before.iter().enumerate() {
            let mut sorted_before = orbit.clone();
            sorted_before.sort_unstable();
            let mut sorted_after = bsgs.orbit(i);
            sorted_after.sort_unstable();
            assert_eq!(sorted_before, sorted_after);
        }
    }
}
