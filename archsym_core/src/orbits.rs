//! Orbit enumeration over a generator set.

use std::collections::VecDeque;

use crate::perm::PermSet;
use crate::schreier::{SchreierStructure, TransversalVariant, Transversals};

/// Build a Schreier structure covering the orbit of `root` under `labels` by
/// breadth-first search. `O(|orbit| * |labels|)` label applications.
#[must_use]
pub fn schreier_structure(
    variant: TransversalVariant,
    degree: usize,
    root: usize,
    labels: PermSet,
) -> Transversals {
    let mut st = Transversals::new(variant, degree);

    st.create_root(root);
    st.create_labels(labels.clone());

    let mut queue = VecDeque::from([root]);

    while let Some(x) = queue.pop_front() {
        for (label, r#gen) in labels.iter().enumerate() {
            let y = r#gen.apply(x);

            if !st.contains(y) {
                st.create_edge(y, x, label);
                queue.push_back(y);
            }
        }
    }

    st
}

/// The orbit of `x` under `generators`, in discovery order starting at `x`.
#[must_use]
pub fn orbit_of(x: usize, degree: usize, generators: &PermSet) -> Vec<usize> {
    generators.assert_degree(degree);

    let mut in_orbit = vec![false; degree + 1];
    in_orbit[x] = true;

    let mut orbit = vec![x];
    let mut queue = VecDeque::from([x]);

    while let Some(point) = queue.pop_front() {
        for r#gen in generators {
            let image = r#gen.apply(point);

            if !in_orbit[image] {
                in_orbit[image] = true;
                orbit.push(image);
                queue.push_back(image);
            }
        }
    }

    orbit
}

/// Partition `1..=degree` into orbits, ordered by smallest contained point.
#[must_use]
pub fn orbit_partition(degree: usize, generators: &PermSet) -> Vec<Vec<usize>> {
    let mut covered = vec![false; degree + 1];
    let mut partition = vec![];

    for x in 1..=degree {
        if covered[x] {
            continue;
        }

        let orbit = orbit_of(x, degree, generators);
        for &point in &orbit {
            covered[point] = true;
        }

        partition.push(orbit);
    }

    partition
}
