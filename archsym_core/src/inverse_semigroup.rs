//! Membership in an inverse semigroup of partial permutations.

use std::collections::VecDeque;

use fxhash::{FxHashMap, FxHashSet};
use log::debug;

use crate::bsgs::BsgsOptions;
use crate::eemp::{self, OrbitGraph};
use crate::partial_perm::PartialPerm;
use crate::perm::PermSet;
use crate::perm_group::PermGroup;

// Per strongly connected image class: the representative element index, a
// trace from the representative to every member, and the group of
// permutations the semigroup induces on the representative image set.
struct SccRepr {
    repr: usize,
    traces: FxHashMap<usize, PartialPerm>,
    group: PermGroup,
}

/// The inverse semigroup generated by a set of partial permutations
/// (closed under inversion), supporting membership tests via the action
/// component of the full domain.
pub struct PartialPermInverseSemigroup {
    generators: Vec<PartialPerm>,
    ac_im: Vec<Vec<usize>>,
    ac_im_index: FxHashMap<Vec<usize>, usize>,
    ac_dom_set: FxHashSet<Vec<usize>>,
    // inverted traces of the domain component, one per reachable domain
    r_class_representatives: Vec<PartialPerm>,
    scc_of: Vec<usize>,
    scc_representatives: Vec<SccRepr>,
}

impl PartialPermInverseSemigroup {
    /// Build the membership structure. The generator list is closed under
    /// inversion first, the generated object is the inverse semigroup.
    #[must_use]
    pub fn new(generators: &[PartialPerm]) -> PartialPermInverseSemigroup {
        let mut closed: Vec<PartialPerm> = generators.to_vec();
        for r#gen in generators {
            let inverse = r#gen.inverse();
            if !closed.contains(&inverse) {
                closed.push(inverse);
            }
        }

        if closed.is_empty() {
            return PartialPermInverseSemigroup {
                generators: closed,
                ac_im: Vec::new(),
                ac_im_index: FxHashMap::default(),
                ac_dom_set: FxHashSet::default(),
                r_class_representatives: Vec::new(),
                scc_of: Vec::new(),
                scc_representatives: Vec::new(),
            };
        }

        let dom_max = closed.iter().map(PartialPerm::dom_max).max().unwrap_or(0);
        let dom: Vec<usize> = (1..=dom_max).collect();

        let (ac_im, _, og_im) = eemp::action_component(&dom, &closed);

        let ac_im_index: FxHashMap<Vec<usize>, usize> = ac_im
            .iter()
            .enumerate()
            .map(|(i, im)| (im.clone(), i))
            .collect();

        let inverses: Vec<PartialPerm> = closed.iter().map(PartialPerm::inverse).collect();
        let (ac_dom, st_dom, _) = eemp::action_component(&dom, &inverses);

        let ac_dom_set: FxHashSet<Vec<usize>> = ac_dom.iter().cloned().collect();

        // one representative per reachable domain, carrying it to an image
        // class
        let r_class_representatives: Vec<PartialPerm> = (0..ac_dom.len())
            .map(|k| eemp::schreier_trace(k, &st_dom, &inverses).inverse())
            .collect();

        let sccs = eemp::strongly_connected_components(&og_im);
        let mut scc_of = vec![0; ac_im.len()];
        for (c, members) in sccs.iter().enumerate() {
            for &i in members {
                scc_of[i] = c;
            }
        }

        let scc_representatives = sccs
            .iter()
            .map(|members| scc_representative(members, &ac_im, &og_im, &closed))
            .collect();

        debug!(
            "inverse semigroup structure: {} image classes in {} components",
            ac_im.len(),
            sccs.len()
        );

        PartialPermInverseSemigroup {
            generators: closed,
            ac_im,
            ac_im_index,
            ac_dom_set,
            r_class_representatives,
            scc_of,
            scc_representatives,
        }
    }

    /// The generating set, closed under inversion.
    #[must_use]
    pub fn generators(&self) -> &[PartialPerm] {
        &self.generators
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Whether `pperm` lies in the generated inverse semigroup.
    ///
    /// Fails fast when the image or domain is not an action-component
    /// element; otherwise conjugates into the image class representative
    /// and tests the induced permutation against the class group.
    #[must_use]
    pub fn is_element(&self, pperm: &PartialPerm) -> bool {
        if self.generators.is_empty() {
            return false;
        }

        let Some(&i) = self.ac_im_index.get(pperm.im()) else {
            return false;
        };

        if !self.ac_dom_set.contains(pperm.dom()) {
            return false;
        }

        let class = &self.scc_representatives[self.scc_of[i]];
        let repr_im = &self.ac_im[class.repr];

        if repr_im.is_empty() {
            // the empty image class contains exactly the nowhere-defined
            // partial permutation
            return true;
        }

        let to_class_member = class.traces[&i].inverse();

        for candidate in &self.r_class_representatives {
            if candidate.dom() != pperm.dom() {
                continue;
            }

            let Some(&m) = self.ac_im_index.get(candidate.im()) else {
                continue;
            };
            if self.scc_of[m] != self.scc_of[i] {
                continue;
            }

            // candidate mapped onto the representative image set
            let class_candidate = candidate * &class.traces[&m].inverse();

            let conjugated = &(&class_candidate.inverse() * pperm) * &to_class_member;

            if let Some(induced) = conjugated.restricted_perm_on(repr_im) {
                if induced.is_identity() || class.group.is_element(&induced) {
                    return true;
                }
            }
        }

        false
    }
}

// Root the class at its smallest member, trace every member from it and
// build the group generated by the in-class Schreier generators.
fn scc_representative(
    members: &[usize],
    ac_im: &[Vec<usize>],
    og_im: &OrbitGraph,
    generators: &[PartialPerm],
) -> SccRepr {
    let repr = members[0];
    let in_class: FxHashSet<usize> = members.iter().copied().collect();

    let dom_max = generators.iter().map(PartialPerm::dom_max).max().unwrap_or(0);

    let mut traces: FxHashMap<usize, PartialPerm> = FxHashMap::default();
    traces.insert(repr, PartialPerm::identity(dom_max));

    let mut queue = VecDeque::from([repr]);
    while let Some(v) = queue.pop_front() {
        for (j, r#gen) in generators.iter().enumerate() {
            let t = og_im.data[j][v];

            if in_class.contains(&t) && !traces.contains_key(&t) {
                let trace = &traces[&v] * r#gen;
                traces.insert(t, trace);
                queue.push_back(t);
            }
        }
    }

    let repr_im = &ac_im[repr];

    let mut schreier_generators = PermSet::new();
    if !repr_im.is_empty() {
        for &v in members {
            for (j, r#gen) in generators.iter().enumerate() {
                let t = og_im.data[j][v];
                if !in_class.contains(&t) {
                    continue;
                }

                let closing = &(&traces[&v] * r#gen) * &traces[&t].inverse();
                let induced = closing
                    .restricted_perm_on(repr_im)
                    .expect("in-class steps permute the representative image");

                if !induced.is_identity() {
                    schreier_generators.push(induced);
                }
            }
        }
        schreier_generators.make_unique();
    }

    let degree = repr_im.len().max(1);
    let group = PermGroup::from_generators(degree, schreier_generators, &BsgsOptions::default())
        .expect("class generators share the class degree");

    SccRepr {
        repr,
        traces,
        group,
    }
}
