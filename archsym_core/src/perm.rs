use std::{
    fmt::{self, Debug, Display},
    hash::{Hash, Hasher},
    ops::{Index, Mul, MulAssign},
};

use fxhash::FxHashSet;
use itertools::Itertools;

use crate::error::{Error, Result};

/// A permutation of `{1..=n}`.
///
/// Composition follows the right-action convention everywhere:
/// `(p * q).apply(i) == q.apply(p.apply(i))`, i.e. the left factor acts
/// first. Mixing degrees in a composition is a programmer error and panics.
#[derive(Clone)]
pub struct Perm {
    // images[i] is the image of point i + 1
    images: Vec<usize>,
}

impl Perm {
    /// The identity permutation of the given degree.
    #[must_use]
    pub fn identity(degree: usize) -> Perm {
        assert!(degree >= 1, "permutation degree must be at least 1");

        Perm {
            images: (1..=degree).collect(),
        }
    }

    /// Create a permutation from an explicit image vector, where `images[i]`
    /// is the image of point `i + 1`.
    ///
    /// # Errors
    ///
    /// `InvalidImage` if the vector is not a bijection on `1..=images.len()`.
    pub fn from_images(images: Vec<usize>) -> Result<Perm> {
        let degree = images.len();

        if degree == 0
            || images.iter().any(|&image| image < 1 || image > degree)
            || !images.iter().all_unique()
        {
            return Err(Error::InvalidImage { degree });
        }

        Ok(Perm { images })
    }

    /// Create a permutation of degree `degree` from a list of cycles,
    /// interpreted as their left-to-right product.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if a cycle mentions a point outside `1..=degree` or
    /// repeats a point within a single cycle.
    pub fn from_cycles(degree: usize, cycles: &[Vec<usize>]) -> Result<Perm> {
        let mut result = Perm::identity(degree);

        for cycle in cycles {
            let mut in_cycle = vec![false; degree];
            let mut images: Vec<usize> = (1..=degree).collect();

            for &point in cycle {
                if point < 1 || point > degree || in_cycle[point - 1] {
                    return Err(Error::OutOfRange { point, degree });
                }
                in_cycle[point - 1] = true;
            }

            if cycle.len() > 1 {
                for window in cycle.windows(2) {
                    images[window[0] - 1] = window[1];
                }
                images[cycle[cycle.len() - 1] - 1] = cycle[0];
            }

            result *= &Perm { images };
        }

        Ok(result)
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.images.len()
    }

    /// The image of `point`, which must lie in `1..=degree`.
    #[must_use]
    pub fn apply(&self, point: usize) -> usize {
        assert!(
            point >= 1 && point <= self.degree(),
            "point {point} outside 1..={}",
            self.degree()
        );

        self.images[point - 1]
    }

    #[must_use]
    pub fn images(&self) -> &[usize] {
        &self.images
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.images.iter().enumerate().all(|(i, &v)| v == i + 1)
    }

    #[must_use]
    pub fn inverse(&self) -> Perm {
        let mut images = vec![0; self.degree()];

        for (i, &v) in self.images.iter().enumerate() {
            images[v - 1] = i + 1;
        }

        Perm { images }
    }

    /// The permutation agreeing with `self` on `set` and fixing everything
    /// else.
    ///
    /// # Errors
    ///
    /// `NotClosed` if `set` is not invariant under `self`.
    pub fn restricted(&self, set: &[usize]) -> Result<Perm> {
        let members: FxHashSet<usize> = set.iter().copied().collect();

        let mut images: Vec<usize> = (1..=self.degree()).collect();

        for &point in set {
            let image = self.apply(point);
            if !members.contains(&image) {
                return Err(Error::NotClosed);
            }
            images[point - 1] = image;
        }

        Ok(Perm { images })
    }

    /// Whether every point in `points` is fixed.
    pub fn stabilizes(&self, points: impl IntoIterator<Item = usize>) -> bool {
        points.into_iter().all(|p| self.apply(p) == p)
    }

    /// The largest moved point, or `None` for the identity.
    #[must_use]
    pub fn largest_moved_point(&self) -> Option<usize> {
        (1..=self.degree()).rev().find(|&p| self.apply(p) != p)
    }

    /// Cycle decomposition, fixed points omitted. Each cycle starts at its
    /// smallest point, cycles are ordered by that point.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<usize>> {
        let mut covered = vec![false; self.degree()];
        let mut cycles = vec![];

        for start in 1..=self.degree() {
            if covered[start - 1] {
                continue;
            }

            covered[start - 1] = true;
            let mut cycle = vec![start];
            let mut current = self.apply(start);

            while current != start {
                covered[current - 1] = true;
                cycle.push(current);
                current = self.apply(current);
            }

            if cycle.len() > 1 {
                cycles.push(cycle);
            }
        }

        cycles
    }

    // Images with trailing fixed points removed; the canonical form behind
    // equality and hashing, so permutations of different degree with the same
    // action compare and hash equal.
    fn trimmed(&self) -> &[usize] {
        let mut images: &[usize] = &self.images;

        while let Some((&last, rest)) = images.split_last() {
            if last != images.len() {
                break;
            }
            images = rest;
        }

        images
    }

    // Reduce the degree to new_degree; every point above it must be fixed.
    pub(crate) fn truncated(&self, new_degree: usize) -> Perm {
        assert!(new_degree >= 1);
        assert!(
            self.images[new_degree..].iter().enumerate().all(|(i, &v)| v == new_degree + i + 1),
            "cannot truncate away moved points"
        );

        Perm {
            images: self.images[..new_degree].to_vec(),
        }
    }

    // Embed into a larger degree, fixing all new points.
    pub(crate) fn extended(&self, new_degree: usize) -> Perm {
        assert!(new_degree >= self.degree());

        let mut images = self.images.clone();
        images.extend(self.degree() + 1..=new_degree);

        Perm { images }
    }
}

impl PartialEq for Perm {
    fn eq(&self, other: &Self) -> bool {
        self.trimmed() == other.trimmed()
    }
}

impl Eq for Perm {}

impl Hash for Perm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // hash only the non-fixed support, in point order
        for (i, &image) in self.images.iter().enumerate() {
            if image != i + 1 {
                (i + 1, image).hash(state);
            }
        }
    }
}

impl Mul<&Perm> for &Perm {
    type Output = Perm;

    fn mul(self, rhs: &Perm) -> Perm {
        assert_eq!(
            self.degree(),
            rhs.degree(),
            "mixed-degree composition is not supported"
        );

        Perm {
            images: self.images.iter().map(|&v| rhs.images[v - 1]).collect(),
        }
    }
}

impl MulAssign<&Perm> for Perm {
    fn mul_assign(&mut self, rhs: &Perm) {
        assert_eq!(
            self.degree(),
            rhs.degree(),
            "mixed-degree composition is not supported"
        );

        for v in &mut self.images {
            *v = rhs.images[*v - 1];
        }
    }
}

impl Index<usize> for Perm {
    type Output = usize;

    fn index(&self, point: usize) -> &usize {
        &self.images[point - 1]
    }
}

impl Display for Perm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cycles = self.cycles();

        if cycles.is_empty() {
            return f.write_str("()");
        }

        for cycle in cycles {
            f.write_str("(")?;
            for (i, point) in cycle.iter().enumerate() {
                write!(f, "{}{point}", if i == 0 { "" } else { " " })?;
            }
            f.write_str(")")?;
        }

        Ok(())
    }
}

impl Debug for Perm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// An ordered collection of same-degree permutations, duplicates allowed
/// until [`PermSet::make_unique`] is called.
#[derive(Clone, Default)]
pub struct PermSet {
    perms: Vec<Perm>,
}

impl PermSet {
    #[must_use]
    pub fn new() -> PermSet {
        PermSet { perms: Vec::new() }
    }

    /// Build a set from a list of permutations.
    ///
    /// # Errors
    ///
    /// `DegreeMismatch` if the degrees disagree.
    pub fn from_perms(perms: impl IntoIterator<Item = Perm>) -> Result<PermSet> {
        let mut set = PermSet::new();
        for perm in perms {
            set.insert(perm)?;
        }
        Ok(set)
    }

    /// Append a permutation.
    ///
    /// # Errors
    ///
    /// `DegreeMismatch` if its degree differs from the set's.
    pub fn insert(&mut self, perm: Perm) -> Result<()> {
        if let Some(first) = self.perms.first() {
            if first.degree() != perm.degree() {
                return Err(Error::DegreeMismatch {
                    expected: first.degree(),
                    got: perm.degree(),
                });
            }
        }

        self.perms.push(perm);
        Ok(())
    }

    // Internal append for call sites where equal degrees are an invariant.
    pub(crate) fn push(&mut self, perm: Perm) {
        self.assert_degree(perm.degree());
        self.perms.push(perm);
    }

    /// The common degree. The degree of an empty set is undefined and
    /// asking for it is a programmer error.
    #[must_use]
    pub fn degree(&self) -> usize {
        assert!(!self.is_empty(), "degree of empty permutation set not defined");
        self.perms[0].degree()
    }

    pub fn assert_degree(&self, degree: usize) {
        assert!(
            self.is_empty() || self.degree() == degree,
            "permutation set degree {} does not match {degree}",
            self.degree()
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.perms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.perms.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Perm> {
        self.perms.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Perm] {
        &self.perms
    }

    pub fn clear(&mut self) {
        self.perms.clear();
    }

    pub fn extend(&mut self, other: &PermSet) {
        for perm in other {
            self.push(perm.clone());
        }
    }

    /// Remove duplicates, keeping first occurrences in order.
    pub fn make_unique(&mut self) {
        let mut seen = FxHashSet::default();
        self.perms.retain(|perm| seen.insert(perm.clone()));
    }

    /// Shrink the common degree to the largest moved point across the set.
    pub fn minimize_degree(&mut self) {
        if self.is_empty() {
            return;
        }

        let max_moved = self
            .perms
            .iter()
            .filter_map(Perm::largest_moved_point)
            .max()
            .unwrap_or(1);

        for perm in &mut self.perms {
            *perm = perm.truncated(max_moved);
        }
    }
}

impl Index<usize> for PermSet {
    type Output = Perm;

    fn index(&self, i: usize) -> &Perm {
        &self.perms[i]
    }
}

impl<'a> IntoIterator for &'a PermSet {
    type Item = &'a Perm;
    type IntoIter = std::slice::Iter<'a, Perm>;

    fn into_iter(self) -> Self::IntoIter {
        self.perms.iter()
    }
}

impl FromIterator<Perm> for PermSet {
    /// Collect permutations of a common degree; mixed degrees panic, use
    /// [`PermSet::from_perms`] at trust boundaries.
    fn from_iter<T: IntoIterator<Item = Perm>>(iter: T) -> PermSet {
        let mut set = PermSet::new();
        for perm in iter {
            set.push(perm);
        }
        set
    }
}

impl Debug for PermSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, perm) in self.perms.iter().enumerate() {
            write!(f, "{}{perm}", if i == 0 { "" } else { ", " })?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use std::hash::{BuildHasher, RandomState};

    use super::{Perm, PermSet};
    use crate::error::Error;

    #[test]
    fn image_constructor_validates() {
        assert!(Perm::from_images(vec![2, 3, 1]).is_ok());
        assert!(matches!(
            Perm::from_images(vec![2, 2, 1]),
            Err(Error::InvalidImage { degree: 3 })
        ));
        assert!(matches!(
            Perm::from_images(vec![1, 2, 4]),
            Err(Error::InvalidImage { degree: 3 })
        ));
        assert!(Perm::from_images(vec![]).is_err());
    }

    #[test]
    fn cycle_constructor_validates() {
        assert!(Perm::from_cycles(4, &[vec![1, 2, 3, 4]]).is_ok());
        assert!(matches!(
            Perm::from_cycles(4, &[vec![1, 5]]),
            Err(Error::OutOfRange { point: 5, degree: 4 })
        ));
        assert!(Perm::from_cycles(4, &[vec![1, 2, 1]]).is_err());
    }

    #[test]
    fn right_action_composition() {
        let p = Perm::from_cycles(4, &[vec![1, 2]]).unwrap();
        let q = Perm::from_cycles(4, &[vec![2, 3]]).unwrap();

        let pq = &p * &q;

        // p acts first: 1 -> 2 -> 3
        assert_eq!(pq.apply(1), 3);
        assert_eq!(pq.apply(2), 1);
        assert_eq!(pq.apply(3), 2);

        for i in 1..=4 {
            assert_eq!(pq.apply(i), q.apply(p.apply(i)));
        }
    }

    #[test]
    fn inverse_roundtrip() {
        let p = Perm::from_cycles(5, &[vec![1, 3, 5], vec![2, 4]]).unwrap();

        assert!((&p * &p.inverse()).is_identity());
        for i in 1..=5 {
            assert_eq!(p.inverse().apply(p.apply(i)), i);
        }
    }

    #[test]
    fn non_disjoint_cycles_compose_left_to_right() {
        // (1 2)(2 3) composed left to right maps 1 -> 3
        let p = Perm::from_cycles(3, &[vec![1, 2], vec![2, 3]]).unwrap();

        assert_eq!(p.apply(1), 3);
        assert_eq!(p.apply(2), 1);
        assert_eq!(p.apply(3), 2);
    }

    #[test]
    fn restriction_requires_closure() {
        let p = Perm::from_cycles(4, &[vec![1, 2], vec![3, 4]]).unwrap();

        let r = p.restricted(&[1, 2]).unwrap();
        assert_eq!(r.apply(1), 2);
        assert_eq!(r.apply(3), 3);

        assert!(matches!(
            Perm::from_cycles(4, &[vec![1, 3]]).unwrap().restricted(&[1, 2]),
            Err(Error::NotClosed)
        ));
    }

    #[test]
    fn stabilizes_points() {
        let p = Perm::from_cycles(4, &[vec![1, 2]]).unwrap();

        assert!(p.stabilizes([3, 4]));
        assert!(!p.stabilizes([1, 3]));
    }

    #[test]
    fn equality_and_hash_ignore_trailing_fixed_points() {
        let narrow = Perm::from_cycles(2, &[vec![1, 2]]).unwrap();
        let wide = Perm::from_cycles(6, &[vec![1, 2]]).unwrap();

        assert_eq!(narrow, wide);

        let hasher = RandomState::new();
        assert_eq!(hasher.hash_one(&narrow), hasher.hash_one(&wide));

        assert_ne!(narrow, Perm::from_cycles(2, &[]).unwrap());
    }

    #[test]
    fn displays_cycle_notation() {
        assert_eq!(format!("{}", Perm::identity(3)), "()");
        assert_eq!(
            format!("{}", Perm::from_cycles(4, &[vec![1, 2], vec![3, 4]]).unwrap()),
            "(1 2)(3 4)"
        );
    }

    #[test]
    fn perm_set_checks_degrees() {
        let mut set = PermSet::new();
        set.insert(Perm::identity(3)).unwrap();

        assert!(matches!(
            set.insert(Perm::identity(4)),
            Err(Error::DegreeMismatch { expected: 3, got: 4 })
        ));
    }

    #[test]
    fn make_unique_is_stable() {
        let a = Perm::from_cycles(3, &[vec![1, 2]]).unwrap();
        let b = Perm::from_cycles(3, &[vec![1, 3]]).unwrap();

        let mut set =
            PermSet::from_perms([a.clone(), b.clone(), a.clone(), b.clone()]).unwrap();
        set.make_unique();

        assert_eq!(set.len(), 2);
        assert_eq!(set[0], a);
        assert_eq!(set[1], b);
    }

    #[test]
    fn minimize_degree_trims_to_largest_moved_point() {
        let mut set = PermSet::from_perms([
            Perm::from_cycles(10, &[vec![1, 2]]).unwrap(),
            Perm::from_cycles(10, &[vec![3, 4]]).unwrap(),
        ])
        .unwrap();

        set.minimize_degree();

        assert_eq!(set.degree(), 4);
        assert_eq!(set[0], Perm::from_cycles(4, &[vec![1, 2]]).unwrap());
    }
}
