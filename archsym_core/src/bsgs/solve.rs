//! BSGS construction for solvable groups via adjoined normalizing
//! generators.

use log::{debug, trace};

use crate::bsgs::Bsgs;
use crate::error::{Error, Result};
use crate::perm::{Perm, PermSet};
use crate::schreier::SchreierStructure;

// ~g * ~h * g * h
fn commutator(g: &Perm, h: &Perm) -> Perm {
    &(&(&g.inverse() * &h.inverse()) * g) * h
}

enum Closure {
    Success,
    Conjugates(Perm, Perm),
}

/// Build a BSGS under the assertion that `generators` generate a solvable
/// group.
///
/// Each generator that does not yet strip completely is pushed through the
/// S-normal-closure procedure; failures retry with a commutator of the
/// offending conjugate pair, up to `ceil(5/2 * log3(degree))` times.
///
/// # Errors
///
/// `NotSolvable` when the commutator budget is exhausted, which happens
/// exactly when the generated group is not solvable.
pub(crate) fn solve(bsgs: &mut Bsgs, generators: &PermSet) -> Result<()> {
    let iterations =
        (2.5 * (bsgs.degree() as f64).ln() / 3.0_f64.ln()).ceil().max(1.0) as usize;

    debug!("solving BSGS, at most {iterations} commutator steps per generator");

    for r#gen in generators {
        if r#gen.is_identity() {
            continue;
        }

        while !bsgs.strips_completely(r#gen) {
            let mut w = r#gen.clone();
            let mut success = false;

            for _ in 0..iterations {
                match s_normal_closure(bsgs, generators, &w) {
                    Closure::Success => {
                        success = true;
                        break;
                    }
                    Closure::Conjugates(u, v) => {
                        trace!("retrying with commutator of {u} and {v}");
                        w = commutator(&u, &v);
                    }
                }
            }

            if !success {
                return Err(Error::NotSolvable);
            }
        }
    }

    bsgs.collect_strong_generators();
    Ok(())
}

// Extend the BSGS by the S-normal closure of w. Returns the offending
// conjugate pair if a commutator falls outside the original group, which
// certifies that this attempt cannot succeed.
fn s_normal_closure(bsgs: &mut Bsgs, generators: &PermSet, w: &Perm) -> Closure {
    let original = bsgs.clone();

    let mut queue1 = vec![w.clone()];
    let mut queue2: Vec<Perm> = Vec::new();

    let mut i = 0;
    while i < queue1.len() {
        let g = queue1[i].clone();
        i += 1;

        if bsgs.strips_completely(&g) {
            continue;
        }

        for h in &queue2 {
            if !original.strips_completely(&commutator(&g, h)) {
                return Closure::Conjugates(g, h.clone());
            }
        }

        adjoin_normalizing_generator(bsgs, &g);
        queue2.push(g.clone());

        for r#gen in generators {
            queue1.push(&(&r#gen.inverse() * &g) * r#gen);
        }
    }

    Closure::Success
}

// Adjoin a generator normalizing the current group, appending base points
// from its support until it strips to the identity.
fn adjoin_normalizing_generator(bsgs: &mut Bsgs, r#gen: &Perm) {
    let mut i = 0;
    let mut h = r#gen.clone();

    while !h.is_identity() {
        if i >= bsgs.base_size() {
            let point = (1..=bsgs.degree())
                .find(|&p| h.apply(p) != p && !bsgs.base().contains(&p))
                .expect("non-identity permutation moves a point outside the base");

            bsgs.extend_base(point);
            bsgs.update_schreier_structure(i, PermSet::new());
        }

        let beta = bsgs.base_point(i);

        let mut h_m = h.clone();
        let mut power = 1;
        while !bsgs.schreier_structure(i).contains(h_m.apply(beta)) {
            h_m = &h_m * &h;
            power += 1;
        }

        let u = bsgs
            .schreier_structure(i)
            .transversal(h_m.apply(beta))
            .expect("orbit point has a transversal");

        if power > 1 {
            // h fixes the earlier base points but can still enlarge their
            // fundamental orbits, so it joins every level down to here
            for j in 0..=i {
                let mut labels = bsgs.stabilizers(j).clone();
                labels.push(h.clone());
                bsgs.update_schreier_structure(j, labels);
            }
        }

        h = &h_m * &u.inverse();
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use crate::bsgs::{Bsgs, BsgsOptions, Construction};
    use crate::perm::{Perm, PermSet};

    fn solve_options() -> BsgsOptions {
        BsgsOptions {
            construction: Construction::Solve,
            ..BsgsOptions::default()
        }
    }

    #[test]
    fn solves_dihedral_group() {
        let generators = PermSet::from_perms([
            Perm::from_cycles(4, &[vec![2, 4]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 2], vec![3, 4]]).unwrap(),
        ])
        .unwrap();

        let bsgs = Bsgs::new(4, generators, &solve_options()).unwrap();

        assert_eq!(bsgs.order().to_u64(), 8);
        assert!(bsgs.contains(&Perm::from_cycles(4, &[vec![1, 3]]).unwrap()));
        assert!(!bsgs.contains(&Perm::from_cycles(4, &[vec![1, 2]]).unwrap()));
    }

    #[test]
    fn solves_symmetric_group_on_four_points() {
        // S_4 is solvable
        let generators = PermSet::from_perms([
            Perm::from_cycles(4, &[vec![1, 2]]).unwrap(),
            Perm::from_cycles(4, &[vec![1, 2, 3, 4]]).unwrap(),
        ])
        .unwrap();

        let bsgs = Bsgs::new(4, generators, &solve_options()).unwrap();

        assert_eq!(bsgs.order().to_u64(), 24);
    }

    #[test]
    fn solves_abelian_group_with_several_generators() {
        let generators = PermSet::from_perms([
            Perm::from_cycles(7, &[vec![1, 2, 3]]).unwrap(),
            Perm::from_cycles(7, &[vec![4, 5]]).unwrap(),
            Perm::from_cycles(7, &[vec![6, 7]]).unwrap(),
        ])
        .unwrap();

        let bsgs = Bsgs::new(7, generators, &solve_options()).unwrap();

        assert_eq!(bsgs.order().to_u64(), 12);
        assert!(bsgs.contains(&Perm::from_cycles(7, &[vec![1, 3, 2], vec![4, 5]]).unwrap()));
        assert!(!bsgs.contains(&Perm::from_cycles(7, &[vec![1, 2]]).unwrap()));
    }
}
