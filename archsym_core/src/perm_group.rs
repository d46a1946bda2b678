use std::fmt::{self, Debug};

use crate::bsgs::{Bsgs, BsgsOptions};
use crate::error::Result;
use crate::math::Order;
use crate::orbits;
use crate::perm::{Perm, PermSet};

/// A finite permutation group over a BSGS. Immutable after construction.
#[derive(Clone)]
pub struct PermGroup {
    bsgs: Bsgs,
}

impl PermGroup {
    /// The group generated by `generators` on `1..=degree`.
    ///
    /// # Errors
    ///
    /// `DegreeMismatch` if the generators' degree differs from `degree`,
    /// plus the construction errors of the selected [`BsgsOptions`].
    pub fn from_generators(
        degree: usize,
        generators: PermSet,
        options: &BsgsOptions,
    ) -> Result<PermGroup> {
        Ok(PermGroup {
            bsgs: Bsgs::new(degree, generators, options)?,
        })
    }

    #[must_use]
    pub fn from_bsgs(bsgs: Bsgs) -> PermGroup {
        PermGroup { bsgs }
    }

    /// The trivial group at the given degree.
    #[must_use]
    pub fn trivial(degree: usize) -> PermGroup {
        PermGroup {
            bsgs: Bsgs::trivial(degree, crate::schreier::TransversalVariant::Explicit),
        }
    }

    /// The full symmetric group on `degree` points.
    #[must_use]
    pub fn symmetric(degree: usize) -> PermGroup {
        assert!(degree >= 1);

        if degree == 1 {
            return PermGroup::trivial(1);
        }

        let generators = PermSet::from_perms([
            Perm::from_cycles(degree, &[vec![1, 2]]).expect("valid transposition"),
            Perm::from_cycles(degree, &[(1..=degree).collect()]).expect("valid full cycle"),
        ])
        .expect("generators share the degree");

        PermGroup::from_generators(degree, generators, &BsgsOptions::default())
            .expect("canonical generators are valid")
    }

    /// The cyclic group generated by the full cycle on `degree` points.
    #[must_use]
    pub fn cyclic(degree: usize) -> PermGroup {
        assert!(degree >= 1);

        if degree == 1 {
            return PermGroup::trivial(1);
        }

        let generators = PermSet::from_perms([
            Perm::from_cycles(degree, &[(1..=degree).collect()]).expect("valid full cycle"),
        ])
        .expect("single generator");

        PermGroup::from_generators(degree, generators, &BsgsOptions::default())
            .expect("canonical generators are valid")
    }

    /// The alternating group on `degree >= 3` points, generated by the
    /// 3-cycles `(1 2 i)`.
    #[must_use]
    pub fn alternating(degree: usize) -> PermGroup {
        assert!(degree >= 3);

        let generators = PermSet::from_perms(
            (3..=degree).map(|i| {
                Perm::from_cycles(degree, &[vec![1, 2, i]]).expect("valid 3-cycle")
            }),
        )
        .expect("generators share the degree");

        PermGroup::from_generators(degree, generators, &BsgsOptions::default())
            .expect("canonical generators are valid")
    }

    /// The dihedral group of the given (even, `>= 6`) order, acting on
    /// `order / 2` points as the symmetries of the regular polygon.
    #[must_use]
    pub fn dihedral(order: usize) -> PermGroup {
        assert!(order >= 6 && order % 2 == 0, "dihedral groups have even order >= 6");

        let points = order / 2;

        let rotation =
            Perm::from_cycles(points, &[(1..=points).collect()]).expect("valid rotation");

        // the reflection fixing point 1
        let mut reflection_images = vec![0; points];
        reflection_images[0] = 1;
        for i in 2..=points {
            reflection_images[i - 1] = points + 2 - i;
        }
        let reflection = Perm::from_images(reflection_images).expect("valid reflection");

        let generators =
            PermSet::from_perms([rotation, reflection]).expect("generators share the degree");

        PermGroup::from_generators(points, generators, &BsgsOptions::default())
            .expect("canonical generators are valid")
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.bsgs.degree()
    }

    #[must_use]
    pub fn order(&self) -> Order {
        self.bsgs.order()
    }

    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.bsgs.is_trivial()
    }

    #[must_use]
    pub fn bsgs(&self) -> &Bsgs {
        &self.bsgs
    }

    /// The strong generating set.
    #[must_use]
    pub fn generators(&self) -> &PermSet {
        self.bsgs.strong_generators()
    }

    /// Membership test by stripping.
    #[must_use]
    pub fn is_element(&self, perm: &Perm) -> bool {
        self.bsgs.contains(perm)
    }

    /// A uniformly random element, drawn by choosing one random transversal
    /// per base level.
    pub fn random_element(&self, rng: &mut fastrand::Rng) -> Perm {
        let mut result = Perm::identity(self.degree());

        for i in 0..self.bsgs.base_size() {
            let orbit = self.bsgs.orbit(i);
            let point = orbit[rng.usize(0..orbit.len())];

            let u = self
                .bsgs
                .transversal(i, point)
                .expect("orbit points have transversals");
            result = &result * &u;
        }

        result
    }

    #[must_use]
    pub fn is_transitive(&self) -> bool {
        orbits::orbit_of(1, self.degree(), self.generators()).len() == self.degree()
    }

    /// The orbit partition of `1..=degree`.
    #[must_use]
    pub fn orbits(&self) -> Vec<Vec<usize>> {
        orbits::orbit_partition(self.degree(), self.generators())
    }

    /// Iterate over all group elements, each exactly once. The cursor steps
    /// through the cartesian product of per-level transversals and never
    /// mutates the group; a fresh call to `iter` restarts.
    #[must_use]
    pub fn iter(&self) -> Elements {
        Elements::new(self)
    }

    /// The direct product, children acting on consecutive point ranges.
    ///
    /// # Errors
    ///
    /// Construction errors of the selected [`BsgsOptions`].
    pub fn direct_product<'a>(
        groups: impl IntoIterator<Item = &'a PermGroup>,
        options: &BsgsOptions,
    ) -> Result<PermGroup> {
        let groups: Vec<&PermGroup> = groups.into_iter().collect();
        let degree: usize = groups.iter().map(|g| g.degree()).sum();
        assert!(degree >= 1, "direct product of no groups is undefined");

        let mut generators = PermSet::new();
        let mut offset = 0;

        for group in groups {
            for r#gen in group.generators() {
                let mut images: Vec<usize> = (1..=degree).collect();
                for j in 1..=group.degree() {
                    images[offset + j - 1] = offset + r#gen.apply(j);
                }
                generators.push(Perm::from_images(images).expect("shifted bijection"));
            }
            offset += group.degree();
        }

        PermGroup::from_generators(degree, generators, options)
    }

    /// The wreath product `proto ≀ outer`: one copy of `proto` per outer
    /// point, permuted by `outer`.
    ///
    /// # Errors
    ///
    /// Construction errors of the selected [`BsgsOptions`].
    pub fn wreath_product(
        proto: &PermGroup,
        outer: &PermGroup,
        options: &BsgsOptions,
    ) -> Result<PermGroup> {
        let block = proto.degree();
        let degree = block * outer.degree();

        let mut generators = PermSet::new();

        // per-block copies of the proto generators
        for b in 0..outer.degree() {
            for r#gen in proto.generators() {
                let mut images: Vec<usize> = (1..=degree).collect();
                for j in 1..=block {
                    images[b * block + j - 1] = b * block + r#gen.apply(j);
                }
                generators.push(Perm::from_images(images).expect("shifted bijection"));
            }
        }

        // outer generators permuting whole blocks, preserving intra-block
        // order
        for r#gen in outer.generators() {
            let mut images: Vec<usize> = (1..=degree).collect();
            for b in 0..outer.degree() {
                let target = r#gen.apply(b + 1) - 1;
                for j in 1..=block {
                    images[b * block + j - 1] = target * block + j;
                }
            }
            generators.push(Perm::from_images(images).expect("block bijection"));
        }

        PermGroup::from_generators(degree, generators, options)
    }
}

impl Debug for PermGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PermGroup(degree {}, order {}, generators {:?})",
            self.degree(),
            self.order(),
            self.generators()
        )
    }
}

impl<'a> IntoIterator for &'a PermGroup {
    type Item = Perm;
    type IntoIter = Elements;

    fn into_iter(self) -> Elements {
        self.iter()
    }
}

/// Finite cursor over all elements of a [`PermGroup`].
pub struct Elements {
    degree: usize,
    transversals: Vec<Vec<Perm>>,
    state: Vec<usize>,
    done: bool,
}

impl Elements {
    fn new(group: &PermGroup) -> Elements {
        let transversals: Vec<Vec<Perm>> = (0..group.bsgs.base_size())
            .map(|i| group.bsgs.transversals(i))
            .collect();

        Elements {
            degree: group.degree(),
            state: vec![0; transversals.len()],
            transversals,
            done: false,
        }
    }
}

impl Iterator for Elements {
    type Item = Perm;

    fn next(&mut self) -> Option<Perm> {
        if self.done {
            return None;
        }

        let mut result = Perm::identity(self.degree);
        for (level, &index) in self.state.iter().enumerate() {
            result = &result * &self.transversals[level][index];
        }

        // odometer step, first level fastest
        let mut advanced = false;
        for level in 0..self.state.len() {
            self.state[level] += 1;
            if self.state[level] < self.transversals[level].len() {
                advanced = true;
                break;
            }
            self.state[level] = 0;
        }

        if !advanced {
            self.done = true;
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use fxhash::FxHashSet;

    use super::PermGroup;
    use crate::bsgs::BsgsOptions;
    use crate::perm::{Perm, PermSet};

    fn factorial(n: u64) -> u64 {
        (1..=n).product()
    }

    #[test]
    fn factory_orders() {
        for n in 1..=7 {
            assert_eq!(PermGroup::symmetric(n).order().to_u64(), factorial(n as u64));
            assert_eq!(PermGroup::cyclic(n).order().to_u64(), n as u64);
        }

        for n in 3..=7 {
            assert_eq!(
                PermGroup::alternating(n).order().to_u64(),
                factorial(n as u64) / 2
            );
        }

        for order in [6, 8, 10, 12] {
            assert_eq!(PermGroup::dihedral(order).order().to_u64(), order as u64);
        }
    }

    #[test]
    fn dihedral_eight_matches_the_square_symmetries() {
        let d8 = PermGroup::dihedral(8);

        assert_eq!(d8.degree(), 4);
        assert!(d8.is_element(&Perm::from_cycles(4, &[vec![2, 4]]).unwrap()));
        assert!(d8.is_element(&Perm::from_cycles(4, &[vec![1, 2], vec![3, 4]]).unwrap()));
        assert!(!d8.is_element(&Perm::from_cycles(4, &[vec![1, 2]]).unwrap()));
    }

    #[test]
    fn alternating_membership() {
        let a4 = PermGroup::alternating(4);

        let members = [
            Perm::identity(4),
            Perm::from_cycles(4, &[vec![2, 3, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 2], vec![3, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 3, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 4, 2]]).unwrap(),
        ];
        let non_members = [
            Perm::from_cycles(4, &[vec![3, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 2]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 2, 3, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 4, 3, 2]]).unwrap(),
        ];

        for perm in &members {
            assert!(a4.is_element(perm));
        }
        for perm in &non_members {
            assert!(!a4.is_element(perm));
        }
    }

    #[test]
    fn iteration_yields_every_element_exactly_once() {
        let a4 = PermGroup::alternating(4);

        let elements: Vec<Perm> = a4.iter().collect();
        assert_eq!(elements.len(), 12);

        let unique: FxHashSet<Perm> = elements.iter().cloned().collect();
        assert_eq!(unique.len(), 12);

        for element in &elements {
            assert!(a4.is_element(element));
        }
    }

    #[test]
    fn iterating_the_trivial_group_yields_the_identity() {
        let trivial = PermGroup::trivial(4);

        let elements: Vec<Perm> = trivial.iter().collect();
        assert_eq!(elements.len(), 1);
        assert!(elements[0].is_identity());
    }

    #[test]
    fn the_d8_scenario_enumerates_correctly() {
        let generators = PermSet::from_perms([
            Perm::from_cycles(4, &[vec![2, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 2], vec![3, 4]]).unwrap(),
        ])
        .unwrap();

        let group = PermGroup::from_generators(4, generators, &BsgsOptions::default()).unwrap();

        assert_eq!(group.order().to_u64(), 8);

        let expected = [
            Perm::identity(4),
            Perm::from_cycles(4, &[vec![1, 2, 3, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 3], vec![2, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 4, 3, 2]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 4], vec![2, 3]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 2], vec![3, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 3]]).unwrap(),
            Perm::from_cycles(4, &[vec![2, 4]]).unwrap(),
        ];

        let elements: FxHashSet<Perm> = group.iter().collect();
        assert_eq!(elements.len(), 8);
        for perm in &expected {
            assert!(elements.contains(perm));
        }

        assert!(!group.is_element(&Perm::from_cycles(4, &[vec![1, 3, 2, 4]]).unwrap()));
    }

    #[test]
    fn random_elements_are_members_and_roughly_uniform() {
        use fxhash::FxHashMap;

        let d8 = PermGroup::dihedral(8);
        let mut rng = fastrand::Rng::with_seed(23);

        let runs = 10_000;
        let mut counts: FxHashMap<Perm, usize> = FxHashMap::default();

        for _ in 0..runs {
            let element = d8.random_element(&mut rng);
            assert!(d8.is_element(&element));
            *counts.entry(element).or_default() += 1;
        }

        assert_eq!(counts.len(), 8);

        let expected = runs / 8;
        for &count in counts.values() {
            // uniform within +-20%
            assert!(count >= expected * 4 / 5 && count <= expected * 6 / 5);
        }
    }

    #[test]
    fn transitivity_and_orbits() {
        assert!(PermGroup::cyclic(5).is_transitive());
        assert!(!PermGroup::trivial(3).is_transitive());

        let two_blocks = PermGroup::direct_product(
            [&PermGroup::cyclic(2), &PermGroup::cyclic(2)],
            &BsgsOptions::default(),
        )
        .unwrap();

        assert!(!two_blocks.is_transitive());
        assert_eq!(two_blocks.orbits(), vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn direct_product_multiplies_orders() {
        let product = PermGroup::direct_product(
            [&PermGroup::symmetric(3), &PermGroup::cyclic(4)],
            &BsgsOptions::default(),
        )
        .unwrap();

        assert_eq!(product.degree(), 7);
        assert_eq!(product.order().to_u64(), 24);

        assert!(product.is_element(&Perm::from_cycles(7, &[vec![1, 2], vec![4, 5, 6, 7]]).unwrap()));
        assert!(!product.is_element(&Perm::from_cycles(7, &[vec![3, 4]]).unwrap()));
    }

    #[test]
    fn wreath_product_order() {
        // C2 wr C2 is the dihedral group of order 8
        let c2 = PermGroup::cyclic(2);
        let wreath = PermGroup::wreath_product(&c2, &c2, &BsgsOptions::default()).unwrap();

        assert_eq!(wreath.degree(), 4);
        assert_eq!(wreath.order().to_u64(), 8);

        // S3 wr C4 on 12 points
        let wreath = PermGroup::wreath_product(
            &PermGroup::symmetric(3),
            &PermGroup::cyclic(4),
            &BsgsOptions::default(),
        )
        .unwrap();

        assert_eq!(wreath.degree(), 12);
        assert_eq!(wreath.order().to_u64(), 6_u64.pow(4) * 4);
    }
}
