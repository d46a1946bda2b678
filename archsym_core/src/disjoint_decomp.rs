//! Direct-product (disjoint) decomposition of a permutation group.

use fxhash::FxHashSet;
use log::{debug, trace};

use crate::bsgs::BsgsOptions;
use crate::perm::{Perm, PermSet};
use crate::perm_group::PermGroup;

impl PermGroup {
    /// Decompose into a direct product of groups acting on disjoint point
    /// sets, recursively splitting the orbit partition wherever every
    /// generator restricts to a group member on both sides.
    ///
    /// With `use_dependency_classes`, orbits whose restrictions constrain
    /// each other are merged up front, which prunes bipartitions that can
    /// never split. The dependency test enumerates all group elements and is
    /// meant for small groups.
    ///
    /// Factors keep the full degree, acting trivially outside their support.
    /// A group with a single (merged) orbit decomposes into itself.
    #[must_use]
    pub fn disjoint_decomposition(&self, use_dependency_classes: bool) -> Vec<PermGroup> {
        // fixed points belong to no factor
        let mut classes: Vec<Vec<usize>> = self
            .orbits()
            .into_iter()
            .filter(|orbit| orbit.len() > 1)
            .collect();

        if classes.len() <= 1 {
            return vec![self.clone()];
        }

        if use_dependency_classes {
            classes = self.merge_dependent_orbits(classes);
            debug!("{} dependency classes", classes.len());

            if classes.len() <= 1 {
                return vec![self.clone()];
            }
        }

        self.disjoint_decomposition_recursive(&classes)
    }

    fn disjoint_decomposition_recursive(&self, classes: &[Vec<usize>]) -> Vec<PermGroup> {
        let n_classes = classes.len();

        if n_classes <= 1 {
            return vec![self.clone()];
        }

        assert!(n_classes < 64, "orbit class count fits the bipartition mask");

        // enumerate bipartitions; the top class always stays on side one,
        // which halves the walk
        for mask in 1_u64..(1 << (n_classes - 1)) {
            let mut side1 = Vec::new();
            let mut side2 = Vec::new();

            for (i, class) in classes.iter().enumerate() {
                if mask & (1 << i) == 0 {
                    side1.push(class.clone());
                } else {
                    side2.push(class.clone());
                }
            }

            let points1: Vec<usize> = side1.iter().flatten().copied().collect();
            let points2: Vec<usize> = side2.iter().flatten().copied().collect();

            trace!("considering orbit bipartition {points1:?} / {points2:?}");

            let mut restricted1 = PermSet::new();
            let mut restricted2 = PermSet::new();
            let mut splits = true;

            for r#gen in self.generators() {
                let r1 = r#gen.restricted(&points1).expect("generators preserve orbits");
                let r2 = r#gen.restricted(&points2).expect("generators preserve orbits");

                if !self.is_element(&r1) || !self.is_element(&r2) {
                    splits = false;
                    break;
                }

                restricted1.push(r1);
                restricted2.push(r2);
            }

            if !splits {
                continue;
            }

            restricted1.make_unique();
            restricted2.make_unique();

            let group1 =
                PermGroup::from_generators(self.degree(), restricted1, &BsgsOptions::default())
                    .expect("restricted generators are valid");
            let group2 =
                PermGroup::from_generators(self.degree(), restricted2, &BsgsOptions::default())
                    .expect("restricted generators are valid");

            let mut decomposition = group1.disjoint_decomposition_recursive(&side1);
            decomposition.extend(group2.disjoint_decomposition_recursive(&side2));

            debug!("split into {} factors", decomposition.len());
            return decomposition;
        }

        vec![self.clone()]
    }

    // Greedily merge orbits that are pairwise dependent with the first
    // unprocessed orbit.
    fn merge_dependent_orbits(&self, orbits: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
        let mut merged: Vec<Vec<usize>> = Vec::new();
        let mut processed = vec![false; orbits.len()];

        for i in 0..orbits.len() {
            if processed[i] {
                continue;
            }
            processed[i] = true;

            let mut class = orbits[i].clone();

            for j in i + 1..orbits.len() {
                if processed[j] {
                    continue;
                }

                if self.orbits_dependent(&orbits[i], &orbits[j]) {
                    trace!("orbits {:?} and {:?} are dependent", orbits[i], orbits[j]);
                    class.extend(orbits[j].iter().copied());
                    processed[j] = true;
                }
            }

            class.sort_unstable();
            merged.push(class);
        }

        merged
    }

    // Two orbits are dependent iff restricting the stabilizer of one to the
    // other loses elements compared to restricting the whole group.
    fn orbits_dependent(&self, orbit1: &[usize], orbit2: &[usize]) -> bool {
        let mut restricted_stabilizers: FxHashSet<Perm> = FxHashSet::default();
        let mut restricted_elements: FxHashSet<Perm> = FxHashSet::default();

        for element in self.iter() {
            let restricted = element.restricted(orbit1).expect("orbits are invariant");

            if restricted.is_identity() {
                continue;
            }

            if element.stabilizes(orbit2.iter().copied()) {
                restricted_stabilizers.insert(restricted.clone());
            }

            restricted_elements.insert(restricted);
        }

        restricted_stabilizers.len() < restricted_elements.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::bsgs::BsgsOptions;
    use crate::perm::{Perm, PermSet};
    use crate::perm_group::PermGroup;

    fn group(degree: usize, cycles: &[&[Vec<usize>]]) -> PermGroup {
        let generators = PermSet::from_perms(
            cycles.iter().map(|c| Perm::from_cycles(degree, c).unwrap()),
        )
        .unwrap();

        PermGroup::from_generators(degree, generators, &BsgsOptions::default()).unwrap()
    }

    #[test]
    fn independent_orbits_split() {
        let g = group(4, &[&[vec![1, 2]], &[vec![3, 4]]]);

        for use_classes in [false, true] {
            let factors = g.disjoint_decomposition(use_classes);

            assert_eq!(factors.len(), 2);
            assert!(factors.iter().all(|f| f.order().to_u64() == 2));

            // factors multiply back to the group order
            let product: u64 = factors.iter().map(|f| f.order().to_u64()).product();
            assert_eq!(product, g.order().to_u64());
        }
    }

    #[test]
    fn diagonal_action_does_not_split() {
        // single generator moving both orbits in lockstep
        let g = group(4, &[&[vec![1, 2], vec![3, 4]]]);

        for use_classes in [false, true] {
            let factors = g.disjoint_decomposition(use_classes);

            assert_eq!(factors.len(), 1);
            assert_eq!(factors[0].order().to_u64(), 2);
        }
    }

    #[test]
    fn transitive_group_is_its_own_decomposition() {
        let g = PermGroup::symmetric(4);

        let factors = g.disjoint_decomposition(false);
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].order().to_u64(), 24);
    }

    #[test]
    fn three_factor_decomposition() {
        let g = group(
            6,
            &[&[vec![1, 2]], &[vec![3, 4]], &[vec![5, 6]]],
        );

        let factors = g.disjoint_decomposition(true);

        assert_eq!(factors.len(), 3);
        let product: u64 = factors.iter().map(|f| f.order().to_u64()).product();
        assert_eq!(product, 8);
    }

    #[test]
    fn factors_act_on_disjoint_supports() {
        let g = group(5, &[&[vec![1, 2, 3]], &[vec![4, 5]]]);

        let factors = g.disjoint_decomposition(false);
        assert_eq!(factors.len(), 2);

        let mut supports: Vec<Vec<usize>> = factors
            .iter()
            .map(|f| {
                f.orbits()
                    .into_iter()
                    .filter(|o| o.len() > 1)
                    .flatten()
                    .collect()
            })
            .collect();
        supports.sort();

        assert_eq!(supports, vec![vec![1, 2, 3], vec![4, 5]]);
    }
}
